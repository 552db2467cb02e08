use std::sync::Arc;

use super::common::*;

use crate::matching::connections::{
    ConnectionError, ConnectionService, ConnectionTarget, MutualCheck,
};
use crate::matching::domain::{CandidateSource, Decision, MutualMatchStatus, PairKey, UserId};
use crate::matching::repository::MutualMatchStore;

type Service = ConnectionService<MemoryBackend, MemoryBackend, MemoryChats>;

fn service() -> (Service, MemoryBackend, MemoryChats) {
    let backend = MemoryBackend::default();
    let chats = MemoryChats::default();
    let service = ConnectionService::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(chats.clone()),
    );
    (service, backend, chats)
}

fn target(id: &str) -> ConnectionTarget {
    ConnectionTarget::real(uid(id))
}

#[test]
fn one_sided_accept_is_not_mutual() {
    let (service, backend, chats) = service();

    let outcome = service
        .accept(&uid("alice"), &target("bob"))
        .expect("accept succeeds");

    assert_eq!(outcome.decision, Decision::Accepted);
    assert!(!outcome.mutual);
    assert!(!outcome.newly_connected);
    assert!(!service.is_mutual(&uid("alice"), &uid("bob")).expect("check"));
    assert!(backend.mutual_records().is_empty());
    assert!(chats.calls().is_empty());
}

#[test]
fn second_accept_creates_one_mutual_match_and_channel() {
    let (service, backend, chats) = service();

    service
        .accept(&uid("alice"), &target("bob"))
        .expect("alice accepts");
    let outcome = service
        .accept(&uid("bob"), &target("alice"))
        .expect("bob accepts");

    assert!(outcome.mutual);
    assert!(outcome.newly_connected);
    assert_eq!(
        outcome.channel.map(|channel| channel.0),
        Some("alice_bob".to_string())
    );
    assert!(service.is_mutual(&uid("alice"), &uid("bob")).expect("check"));

    let records = backend.mutual_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pair(), &PairKey::new(&uid("bob"), &uid("alice")));
    assert_eq!(records[0].status, MutualMatchStatus::Active);
    assert_eq!(chats.calls().len(), 1);
}

#[test]
fn repeated_mutual_checks_have_no_extra_side_effects() {
    let (service, backend, chats) = service();
    service.accept(&uid("alice"), &target("bob")).expect("accept");
    service.accept(&uid("bob"), &target("alice")).expect("accept");

    let first = service
        .confirm_mutual(&uid("alice"), &uid("bob"))
        .expect("first re-check");
    let second = service
        .confirm_mutual(&uid("bob"), &uid("alice"))
        .expect("second re-check");

    assert!(matches!(first, MutualCheck::AlreadyConfirmed(_)));
    assert!(matches!(second, MutualCheck::AlreadyConfirmed(_)));
    assert_eq!(backend.mutual_records().len(), 1);
    assert_eq!(backend.mutual_writes(), 1);
    assert_eq!(chats.calls().len(), 1);

    let again = service
        .accept(&uid("alice"), &target("bob"))
        .expect("accept again");
    assert!(again.mutual);
    assert!(!again.newly_connected);
    assert_eq!(chats.calls().len(), 1);
}

#[test]
fn latest_decision_wins_without_duplicates() {
    let (service, backend, _) = service();
    let alice = uid("alice");

    service.accept(&alice, &target("bob")).expect("accept");
    service.reject(&alice, &target("bob")).expect("reject");
    assert_eq!(
        service.decision(&alice, &uid("bob")).expect("decision"),
        Decision::Rejected
    );

    service.accept(&alice, &target("bob")).expect("accept again");
    assert_eq!(
        service.decision(&alice, &uid("bob")).expect("decision"),
        Decision::Accepted
    );

    let stored = backend.stored_decision(&alice).expect("record exists");
    assert_eq!(stored.accepted_matches.len(), 1);
    assert!(stored.rejected_matches.is_empty());
}

#[test]
fn rejection_blocks_mutuality() {
    let (service, backend, chats) = service();
    service.accept(&uid("alice"), &target("bob")).expect("accept");
    service.reject(&uid("bob"), &target("alice")).expect("reject");

    assert!(!service.is_mutual(&uid("alice"), &uid("bob")).expect("check"));
    assert_eq!(
        service
            .confirm_mutual(&uid("alice"), &uid("bob"))
            .expect("check"),
        MutualCheck::NotMutual
    );
    assert!(backend.mutual_records().is_empty());
    assert!(chats.calls().is_empty());
}

#[test]
fn undecided_is_the_default() {
    let (service, _, _) = service();
    assert_eq!(
        service
            .decision(&uid("alice"), &uid("bob"))
            .expect("decision"),
        Decision::Undecided
    );
}

#[test]
fn sample_targets_are_simulated_without_writes() {
    let (service, backend, chats) = service();
    let sample = ConnectionTarget::classify(UserId::from("sample-user-2"));
    assert_eq!(sample.source, CandidateSource::Sample);

    let outcome = service.accept(&uid("alice"), &sample).expect("accept");
    assert!(outcome.simulated);
    assert!(outcome.mutual);
    assert!(backend.stored_decision(&uid("alice")).is_none());
    assert!(backend.mutual_records().is_empty());
    assert!(chats.calls().is_empty());

    let outcome = service.reject(&uid("alice"), &sample).expect("reject");
    assert!(outcome.simulated);
    assert_eq!(outcome.decision, Decision::Rejected);
    assert!(backend.stored_decision(&uid("alice")).is_none());
}

#[test]
fn blank_or_self_targets_are_usage_errors() {
    let (service, _, _) = service();

    for (actor, target_id) in [("", "bob"), ("alice", "  "), ("alice", "alice")] {
        match service.accept(&uid(actor), &target(target_id)) {
            Err(ConnectionError::InvalidDecisionTransition(_)) => {}
            other => panic!("expected usage error for {actor:?}->{target_id:?}, got {other:?}"),
        }
    }
}

#[test]
fn mutual_matches_lists_reciprocated_accepts() {
    let (service, _, _) = service();
    let alice = uid("alice");
    service.accept(&alice, &target("bob")).expect("accept");
    service.accept(&alice, &target("carol")).expect("accept");
    service.accept(&alice, &target("dave")).expect("accept");
    service.accept(&uid("bob"), &target("alice")).expect("accept");
    service.accept(&uid("dave"), &target("alice")).expect("accept");
    service.reject(&uid("carol"), &target("alice")).expect("reject");

    assert_eq!(
        service.mutual_matches(&alice).expect("list"),
        vec![uid("bob"), uid("dave")]
    );
    assert!(service.mutual_matches(&uid("erin")).expect("list").is_empty());
}

#[test]
fn deactivation_keeps_membership() {
    let (service, backend, _) = service();
    service.accept(&uid("alice"), &target("bob")).expect("accept");
    service.accept(&uid("bob"), &target("alice")).expect("accept");

    let record = service
        .deactivate(&uid("bob"), &uid("alice"))
        .expect("deactivate")
        .expect("record exists");
    assert_eq!(record.status, MutualMatchStatus::Inactive);
    assert_eq!(record.pair(), &PairKey::new(&uid("alice"), &uid("bob")));
    assert_eq!(backend.mutual_records()[0].status, MutualMatchStatus::Inactive);

    assert!(service
        .deactivate(&uid("alice"), &uid("zed"))
        .expect("no-op")
        .is_none());
}

#[test]
fn provisioning_failure_surfaces_and_leaves_no_record() {
    let backend = MemoryBackend::default();
    let service = ConnectionService::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(OfflineChats),
    );
    service
        .accept(&uid("alice"), &ConnectionTarget::real(uid("bob")))
        .expect("accept");

    match service.accept(&uid("bob"), &ConnectionTarget::real(uid("alice"))) {
        Err(ConnectionError::Provisioning(_)) => {}
        other => panic!("expected provisioning error, got {other:?}"),
    }
    assert!(backend.mutual_records().is_empty());
}

#[test]
fn store_outage_propagates() {
    let backend = Arc::new(UnavailableBackend);
    let service = ConnectionService::new(backend.clone(), backend, Arc::new(MemoryChats::default()));

    match service.accept(&uid("alice"), &ConnectionTarget::real(uid("bob"))) {
        Err(ConnectionError::StoreUnavailable(_)) => {}
        other => panic!("expected store error, got {other:?}"),
    }
}

#[test]
fn losing_a_creation_race_keeps_the_first_record() {
    let backend = MemoryBackend::default();
    let service = ConnectionService::new(
        Arc::new(backend.clone()),
        Arc::new(StaleMutualReads {
            inner: backend.clone(),
        }),
        Arc::new(MemoryChats::default()),
    );
    service.accept(&uid("alice"), &target("bob")).expect("accept");
    let first = service
        .accept(&uid("bob"), &target("alice"))
        .expect("accept");
    assert!(first.newly_connected);

    let mut record = backend.mutual_records()[0].clone();
    let created_at = record.created_at;
    record.deactivate(chrono::Utc::now());
    backend.put_mutual_match(record).expect("deactivate");

    let again = service
        .confirm_mutual(&uid("alice"), &uid("bob"))
        .expect("re-check");
    match again {
        MutualCheck::AlreadyConfirmed(existing) => {
            assert_eq!(existing.status, MutualMatchStatus::Inactive);
            assert_eq!(existing.created_at, created_at);
        }
        other => panic!("expected the stored record, got {other:?}"),
    }

    let records = backend.mutual_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, MutualMatchStatus::Inactive);
    assert_eq!(records[0].created_at, created_at);
}
