//! Eligibility gates: the pure admit/deny decision for one redemption.
//!
//! The engine resolves every fact first (participant, their event, the action,
//! its day, whether a live redemption exists) and then asks [`evaluate`]. The
//! gates run in a fixed order and the first failing gate wins:
//!
//! 1. event consistency
//! 2. payment
//! 3. duplicate
//! 4. temporal
//!
//! Existence of participant, action and verifier is established before any
//! of this runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::model::{Event, EventAction, EventDay, Participant, PaymentStatus};
use crate::types::EventId;

/// What to do when an action's event day cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemporalGatePolicy {
    /// Skip the temporal gate and allow the redemption.
    #[default]
    FailOpen,
    /// Deny the redemption.
    FailClosed,
}

/// Everything the gates look at.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityFacts<'a> {
    pub participant: &'a Participant,
    /// The event the participant is registered for.
    pub event: &'a Event,
    pub action: &'a EventAction,
    /// `None` when the action's day could not be resolved.
    pub event_day: Option<&'a EventDay>,
    /// A live redemption already exists for (participant, action).
    pub already_redeemed: bool,
    /// Current date in the deployment's local offset.
    pub today: NaiveDate,
    pub temporal_policy: TemporalGatePolicy,
}

/// Why a redemption was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("action does not belong to participant's event")]
    EventMismatch {
        participant_event: EventId,
        action_event: EventId,
    },

    #[error("participant payment status is '{status}'")]
    PaymentRequired { status: PaymentStatus },

    #[error("already verified for action: {action_name}")]
    AlreadyVerified { action_name: String },

    #[error("verification not allowed before event day: {date}")]
    EventNotStarted { date: NaiveDate },

    #[error("event day for action could not be resolved")]
    EventDayUnresolved,
}

impl Denial {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EventMismatch { .. } => ErrorKind::EventMismatch,
            Self::PaymentRequired { .. } => ErrorKind::PaymentRequired,
            Self::AlreadyVerified { .. } => ErrorKind::AlreadyVerified,
            Self::EventNotStarted { .. } => ErrorKind::EventNotStarted,
            Self::EventDayUnresolved => ErrorKind::EventNotFound,
        }
    }
}

/// Run every gate in order.
///
/// Event consistency must stay ahead of the payment and duplicate gates: a
/// cross-event scan is reported as a mismatch whatever the others would say.
pub fn evaluate(facts: &EligibilityFacts<'_>) -> Result<(), Denial> {
    check_event_consistency(facts.participant, facts.action)?;
    check_payment(facts.participant, facts.event)?;
    check_duplicate(facts.already_redeemed, facts.action)?;
    check_temporal(facts.event_day, facts.today, facts.temporal_policy)
}

/// The action must belong to the participant's event.
pub fn check_event_consistency(
    participant: &Participant,
    action: &EventAction,
) -> Result<(), Denial> {
    if action.event_id != participant.event_id {
        return Err(Denial::EventMismatch {
            participant_event: participant.event_id,
            action_event: action.event_id,
        });
    }
    Ok(())
}

/// Paid events admit only participants whose payment is confirmed.
pub fn check_payment(participant: &Participant, event: &Event) -> Result<(), Denial> {
    if event.is_paid() && participant.payment_status != PaymentStatus::Paid {
        return Err(Denial::PaymentRequired {
            status: participant.payment_status,
        });
    }
    Ok(())
}

pub fn check_duplicate(already_redeemed: bool, action: &EventAction) -> Result<(), Denial> {
    if already_redeemed {
        return Err(Denial::AlreadyVerified {
            action_name: action.name.clone(),
        });
    }
    Ok(())
}

/// Redemption opens at the start of the action's day.
pub fn check_temporal(
    event_day: Option<&EventDay>,
    today: NaiveDate,
    policy: TemporalGatePolicy,
) -> Result<(), Denial> {
    match (event_day, policy) {
        (Some(day), _) if today < day.date => Err(Denial::EventNotStarted { date: day.date }),
        (Some(_), _) => Ok(()),
        (None, TemporalGatePolicy::FailOpen) => Ok(()),
        (None, TemporalGatePolicy::FailClosed) => Err(Denial::EventDayUnresolved),
    }
}
