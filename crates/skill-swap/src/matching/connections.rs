use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::domain::{
    CandidateSource, ChannelId, ConnectionDecision, Decision, MutualMatch, PairKey, UserId,
};
use super::repository::{
    ChatProvisioner, DecisionStore, MutualMatchStore, ProvisioningError, StoreError,
};

/// The user an accept or reject action is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub user_id: UserId,
    pub source: CandidateSource,
}

impl ConnectionTarget {
    pub fn real(user_id: UserId) -> Self {
        Self {
            user_id,
            source: CandidateSource::Real,
        }
    }

    /// Classifies a bare id from the API boundary by its reserved prefix.
    pub fn classify(user_id: UserId) -> Self {
        let source = CandidateSource::of(&user_id);
        Self { user_id, source }
    }
}

/// Result of the idempotent mutuality check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutualCheck {
    NotMutual,
    /// First detection: the record was written and a channel requested.
    Created {
        record: MutualMatch,
        channel: ChannelId,
    },
    AlreadyConfirmed(MutualMatch),
}

impl MutualCheck {
    pub fn is_mutual(&self) -> bool {
        !matches!(self, MutualCheck::NotMutual)
    }
}

/// What an accept or reject action produced, shaped for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionOutcome {
    pub actor: UserId,
    pub target: UserId,
    pub decision: Decision,
    pub mutual: bool,
    /// True only on the action that first confirmed the pair.
    pub newly_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelId>,
    /// Set for sample targets; nothing was persisted.
    pub simulated: bool,
}

/// Records accept/reject decisions and promotes two-way acceptance into a mutual match.
pub struct ConnectionService<D, M, C> {
    decisions: Arc<D>,
    mutuals: Arc<M>,
    chats: Arc<C>,
}

impl<D, M, C> ConnectionService<D, M, C>
where
    D: DecisionStore + 'static,
    M: MutualMatchStore + 'static,
    C: ChatProvisioner + 'static,
{
    pub fn new(decisions: Arc<D>, mutuals: Arc<M>, chats: Arc<C>) -> Self {
        Self {
            decisions,
            mutuals,
            chats,
        }
    }

    pub fn accept(
        &self,
        actor: &UserId,
        target: &ConnectionTarget,
    ) -> Result<ConnectionOutcome, ConnectionError> {
        validate(actor, &target.user_id)?;

        if target.source == CandidateSource::Sample {
            info!(actor = %actor, target = %target.user_id, "simulated accept for sample candidate");
            return Ok(ConnectionOutcome {
                actor: actor.clone(),
                target: target.user_id.clone(),
                decision: Decision::Accepted,
                mutual: true,
                newly_connected: false,
                channel: None,
                simulated: true,
            });
        }

        let mut record = self.load(actor)?;
        record.accept(target.user_id.clone());
        self.decisions.put_decision(record)?;
        debug!(actor = %actor, target = %target.user_id, "accept recorded");

        let check = self.confirm_mutual(actor, &target.user_id)?;
        let (newly_connected, channel) = match &check {
            MutualCheck::Created { channel, .. } => (true, Some(channel.clone())),
            MutualCheck::NotMutual | MutualCheck::AlreadyConfirmed(_) => (false, None),
        };

        Ok(ConnectionOutcome {
            actor: actor.clone(),
            target: target.user_id.clone(),
            decision: Decision::Accepted,
            mutual: check.is_mutual(),
            newly_connected,
            channel,
            simulated: false,
        })
    }

    pub fn reject(
        &self,
        actor: &UserId,
        target: &ConnectionTarget,
    ) -> Result<ConnectionOutcome, ConnectionError> {
        validate(actor, &target.user_id)?;

        if target.source == CandidateSource::Sample {
            info!(actor = %actor, target = %target.user_id, "simulated reject for sample candidate");
            return Ok(ConnectionOutcome {
                actor: actor.clone(),
                target: target.user_id.clone(),
                decision: Decision::Rejected,
                mutual: false,
                newly_connected: false,
                channel: None,
                simulated: true,
            });
        }

        let mut record = self.load(actor)?;
        record.reject(target.user_id.clone());
        self.decisions.put_decision(record)?;
        debug!(actor = %actor, target = %target.user_id, "reject recorded");

        Ok(ConnectionOutcome {
            actor: actor.clone(),
            target: target.user_id.clone(),
            decision: Decision::Rejected,
            mutual: false,
            newly_connected: false,
            channel: None,
            simulated: false,
        })
    }

    /// Current state of the directed edge `actor -> target`.
    pub fn decision(&self, actor: &UserId, target: &UserId) -> Result<Decision, ConnectionError> {
        Ok(self
            .decisions
            .decision(actor)?
            .map(|record| record.decision_for(target))
            .unwrap_or(Decision::Undecided))
    }

    pub fn is_mutual(&self, a: &UserId, b: &UserId) -> Result<bool, ConnectionError> {
        Ok(self.decision(a, b)? == Decision::Accepted && self.decision(b, a)? == Decision::Accepted)
    }

    /// Creates the mutual match and its chat channel on first detection only.
    ///
    /// The channel is requested before the record is written, so a failed write can be
    /// retried without losing the channel; `ensure_channel` is idempotent.
    pub fn confirm_mutual(&self, a: &UserId, b: &UserId) -> Result<MutualCheck, ConnectionError> {
        if !self.is_mutual(a, b)? {
            return Ok(MutualCheck::NotMutual);
        }

        let pair = PairKey::new(a, b);
        if let Some(existing) = self.mutuals.mutual_match(&pair)? {
            debug!(pair = %pair, "mutual match already recorded");
            return Ok(MutualCheck::AlreadyConfirmed(existing));
        }

        let channel = self.chats.ensure_channel(&pair)?;
        let record = MutualMatch::new(pair.clone(), Utc::now());
        if let Some(existing) = self.mutuals.create_mutual_match(record.clone())? {
            debug!(pair = %pair, "mutual match recorded concurrently");
            return Ok(MutualCheck::AlreadyConfirmed(existing));
        }
        info!(pair = %pair, channel = %channel.0, "mutual match created");

        Ok(MutualCheck::Created { record, channel })
    }

    /// Users that `user_id` accepted and who accepted back.
    pub fn mutual_matches(&self, user_id: &UserId) -> Result<Vec<UserId>, ConnectionError> {
        let Some(record) = self.decisions.decision(user_id)? else {
            return Ok(Vec::new());
        };

        let mut mutual = Vec::new();
        for other in record.accepted_matches {
            if self.decision(&other, user_id)? == Decision::Accepted {
                mutual.push(other);
            }
        }
        Ok(mutual)
    }

    /// Marks an existing mutual match inactive. Membership is untouched.
    pub fn deactivate(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<MutualMatch>, ConnectionError> {
        let pair = PairKey::new(a, b);
        let Some(mut record) = self.mutuals.mutual_match(&pair)? else {
            return Ok(None);
        };
        record.deactivate(Utc::now());
        self.mutuals.put_mutual_match(record.clone())?;
        info!(pair = %pair, "mutual match deactivated");
        Ok(Some(record))
    }

    fn load(&self, actor: &UserId) -> Result<ConnectionDecision, StoreError> {
        Ok(self
            .decisions
            .decision(actor)?
            .unwrap_or_else(|| ConnectionDecision::empty(actor.clone())))
    }
}

fn validate(actor: &UserId, target: &UserId) -> Result<(), ConnectionError> {
    if actor.is_blank() {
        return Err(ConnectionError::InvalidDecisionTransition(
            "actor id is required".to_string(),
        ));
    }
    if target.is_blank() {
        return Err(ConnectionError::InvalidDecisionTransition(
            "target id is required".to_string(),
        ));
    }
    if actor == target {
        return Err(ConnectionError::InvalidDecisionTransition(
            "users cannot decide on themselves".to_string(),
        ));
    }
    Ok(())
}

/// Error raised by the connection state machine.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid decision: {0}")]
    InvalidDecisionTransition(String),
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
}
