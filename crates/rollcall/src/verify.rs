//! Redemption: resolve, evaluate, record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rollcall_core::{
    evaluate, resolve_credential, ActionId, ActionLog, Denial, EligibilityFacts, EventAction,
    Participant, ParticipantId, RedemptionId, TemporalGatePolicy, User, UserId,
};
use rollcall_store::InsertResult;

use crate::engine::VerificationEngine;
use crate::error::{Result, VerificationError};

/// A successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub success: bool,
    pub message: String,
    pub redemption_id: RedemptionId,
    pub participant_name: String,
    pub action_name: String,
    pub timestamp: DateTime<Utc>,
    pub record: ActionLog,
}

impl VerificationEngine {
    /// Redeem a scanned credential against an action code.
    ///
    /// Existence is checked participant first, then action, then verifier.
    /// Eligibility gates follow; the store has the final word on duplicates.
    pub async fn verify(
        &self,
        credential: &str,
        action_code: &str,
        verifier_id: &UserId,
    ) -> Result<VerifyOutcome> {
        if credential.trim().is_empty() {
            return Err(VerificationError::invalid_input("QR code is required"));
        }
        if action_code.trim().is_empty() {
            return Err(VerificationError::invalid_input("action code is required"));
        }

        let participant_id = resolve_credential(credential)?;

        let (participant, action) = tokio::join!(
            self.load_participant(&participant_id),
            self.resolve_action(action_code),
        );
        let participant = participant?;
        let action = action?;
        let verifier = self.load_verifier(verifier_id).await?;

        self.check_eligibility(&participant, &action).await?;
        self.record(&participant, &action, &verifier).await
    }

    /// Dry run of [`verify`](Self::verify) by ids. Records nothing.
    ///
    /// Returns `Ok(true)` when a redemption would be admitted now; every
    /// refusal comes back as the same typed error `verify` would return.
    pub async fn can_verify(
        &self,
        participant_id: &ParticipantId,
        action_id: &ActionId,
    ) -> Result<bool> {
        let (participant, action) = tokio::join!(
            self.load_participant(participant_id),
            self.load_action(action_id),
        );
        let participant = participant?;
        let action = action?;

        self.check_eligibility(&participant, &action).await?;
        Ok(true)
    }

    /// Gather the facts and run every gate.
    async fn check_eligibility(&self, participant: &Participant, action: &EventAction) -> Result<()> {
        let (event, event_day, already_redeemed) = tokio::join!(
            self.load_event(&participant.event_id),
            self.stores.events.get_event_day(&action.event_day_id),
            self.stores
                .logs
                .has_live_redemption(&participant.id, &action.id),
        );
        let event = event?;
        let event_day = event_day?;
        let already_redeemed = already_redeemed?;

        if event_day.is_none() && self.config.temporal_gate == TemporalGatePolicy::FailOpen {
            tracing::warn!(
                action_id = %action.id,
                event_day_id = %action.event_day_id,
                "event day not found, skipping temporal gate"
            );
        }

        let facts = EligibilityFacts {
            participant,
            event: &event,
            action,
            event_day: event_day.as_ref(),
            already_redeemed,
            today: self.local_date(self.now()),
            temporal_policy: self.config.temporal_gate,
        };

        evaluate(&facts).map_err(|denial| {
            tracing::debug!(
                participant_id = %participant.id,
                action_id = %action.id,
                reason = %denial,
                "redemption denied"
            );
            VerificationError::from(denial)
        })
    }

    /// Write the redemption. The store's claim check is authoritative.
    async fn record(
        &self,
        participant: &Participant,
        action: &EventAction,
        verifier: &User,
    ) -> Result<VerifyOutcome> {
        let log = ActionLog::new(participant.id, action.id, verifier.id, self.now());

        match self.stores.logs.insert_action_log(&log).await? {
            InsertResult::Inserted => {
                tracing::info!(
                    redemption_id = %log.id,
                    participant_id = %participant.id,
                    action_id = %action.id,
                    verifier_id = %verifier.id,
                    "redemption recorded"
                );
                Ok(VerifyOutcome {
                    success: true,
                    message: format!(
                        "Successfully verified {} for participant {}",
                        action.name, participant.name
                    ),
                    redemption_id: log.id,
                    participant_name: participant.name.clone(),
                    action_name: action.name.clone(),
                    timestamp: log.verified_at,
                    record: log,
                })
            }
            InsertResult::AlreadyExists { existing } => {
                tracing::warn!(
                    participant_id = %participant.id,
                    action_id = %action.id,
                    existing = %existing,
                    "lost redemption race"
                );
                Err(Denial::AlreadyVerified {
                    action_name: action.name.clone(),
                }
                .into())
            }
        }
    }
}
