use crate::infra::{parse_policy, InMemoryChatProvisioner, InMemoryStore};
use clap::Args;
use skill_swap::config::AppConfig;
use skill_swap::error::AppError;
use skill_swap::matching::reputation::honor_rating;
use skill_swap::matching::{
    CandidateSource, ConnectionOutcome, MatchFeed, MatchingError, MatchmakingService, PolicyKind,
    Profile, ProfileStore, UserId,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Seeded user who browses for matches
    #[arg(long, default_value = "maya")]
    pub(crate) user: String,
    /// Scoring policy used for discovery (strict or lenient)
    #[arg(long, value_parser = parse_policy, default_value = "strict")]
    pub(crate) policy: PolicyKind,
    /// Skip the newcomer walkthrough that shows the sample fallback
    #[arg(long)]
    pub(crate) skip_newcomer: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Requesting user id
    pub(crate) requester: String,
    /// Candidate user id
    pub(crate) candidate: String,
    /// Scoring policy (strict or lenient)
    #[arg(long, value_parser = parse_policy, default_value = "strict")]
    pub(crate) policy: PolicyKind,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        user,
        policy,
        skip_newcomer,
    } = args;

    let config = AppConfig::load()?;
    let store = Arc::new(InMemoryStore::seeded().map_err(MatchingError::from)?);
    let chats = Arc::new(InMemoryChatProvisioner::default());
    let service = MatchmakingService::new(store.clone(), chats.clone(), config.matching.clone());

    println!("Skill swap matchmaking demo");
    let user = UserId(user);
    let feed = service.discover(&user, policy)?;
    render_feed(&feed);

    let top = feed
        .candidates
        .iter()
        .find(|candidate| candidate.source == CandidateSource::Real);
    if let Some(top) = top {
        println!("\nConnection walkthrough");
        let first = service.accept(&user, top.candidate_id.clone())?;
        render_outcome(&first);
        let second = service.accept(&top.candidate_id, user.clone())?;
        render_outcome(&second);
        println!(
            "- {} now has {} mutual match(es); {} chat channel(s) open",
            user,
            service.mutual_matches(&user)?.len(),
            chats.channels().len()
        );
        println!(
            "- stored mutual match records: {}",
            store.mutual_count().map_err(MatchingError::from)?
        );

        println!("\nReputation after the first session");
        for stars in [5, 4, 5] {
            let rated = store
                .record_rating(&top.candidate_id, stars, config.matching.honor_multiplier)
                .map_err(MatchingError::from)?;
            if let Some(profile) = rated {
                println!(
                    "- {} rated {} star(s) -> honor {} ({:?})",
                    profile.label(),
                    stars,
                    profile.honor_score,
                    honor_rating(profile.honor_score)
                );
            }
        }
    }

    if skip_newcomer {
        return Ok(());
    }

    println!("\nNewcomer without a profile");
    let newcomer = UserId::from("newcomer");
    let feed = service.discover(&newcomer, PolicyKind::Lenient)?;
    render_feed(&feed);
    if let Some(sample) = feed.candidates.first() {
        let outcome = service.accept(&newcomer, sample.candidate_id.clone())?;
        render_outcome(&outcome);
    }

    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        requester,
        candidate,
        policy,
    } = args;

    let config = AppConfig::load()?;
    let store = InMemoryStore::seeded().map_err(MatchingError::from)?;
    let requester = load_profile(&store, UserId(requester))?;
    let candidate = load_profile(&store, UserId(candidate))?;
    let scorer = policy.build(&config.matching.scoring);

    println!(
        "{} policy: {} -> {}",
        policy.label(),
        requester.label(),
        candidate.label()
    );
    for (from, to) in [(&requester, &candidate), (&candidate, &requester)] {
        let score = scorer.score(from, to);
        println!(
            "- {} viewing {}: score {} (compatibility {}), {}",
            from.user_id,
            to.user_id,
            score,
            scorer.compatibility(from, to),
            if scorer.admits(score) {
                "listed"
            } else {
                "filtered out"
            }
        );
        let reason = scorer.reason(from, to);
        if !reason.is_empty() {
            println!("  {}", reason);
        }
    }

    Ok(())
}

fn load_profile(store: &InMemoryStore, user_id: UserId) -> Result<Profile, AppError> {
    store
        .profile(&user_id)
        .map_err(MatchingError::from)?
        .ok_or_else(|| MatchingError::ProfileNotFound(user_id).into())
}

fn render_feed(feed: &MatchFeed) {
    println!(
        "- {} matches for {} ({:?} feed, {} policy)",
        feed.candidates.len(),
        feed.user_id,
        feed.origin,
        feed.policy.label()
    );
    for (index, candidate) in feed.candidates.iter().enumerate() {
        println!(
            "  {}. {} ({}) score {} | honor {:?} | {:?}",
            index + 1,
            candidate.display_name,
            candidate.candidate_id,
            candidate.score,
            candidate.honor_rating,
            candidate.source
        );
        println!("     {}", candidate.reason);
    }
}

fn render_outcome(outcome: &ConnectionOutcome) {
    let mut line = format!(
        "- {} {:?} {}",
        outcome.actor, outcome.decision, outcome.target
    );
    if outcome.simulated {
        line.push_str(" (simulated)");
    }
    if outcome.mutual {
        line.push_str(" -> mutual");
    }
    if let Some(channel) = &outcome.channel {
        line.push_str(&format!(", chat {}", channel.0));
    }
    println!("{line}");
}
