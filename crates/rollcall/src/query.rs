//! Read side: history, filtered listings and per-event statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rollcall_core::{
    ActionId, EventId, Page, PageRequest, ParticipantId, RedemptionRecord, UserId,
};
use rollcall_store::{ActionLogFilter, EventSummary};

use crate::engine::VerificationEngine;
use crate::error::{Result, VerificationError};

/// Listing filters plus raw paging input. Paging is normalised, never rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFilters {
    pub page: i64,
    pub page_size: i64,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub action_id: Option<ActionId>,
    pub verifier_id: Option<UserId>,
    #[serde(default)]
    pub include_revoked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTally {
    pub action_id: ActionId,
    /// `None` if the action record is gone.
    pub action_name: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierTally {
    pub verifier_id: UserId,
    pub email: Option<String>,
    pub count: u64,
}

/// Statistics over an event's live redemptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub event_id: EventId,
    pub event_title: String,
    pub total_verifications: u64,
    pub unique_participants: u64,
    pub total_participants: u64,
    /// Redemptions per registered participant. Zero with no participants.
    pub verification_rate: f64,
    pub most_verified_action: Option<ActionTally>,
    pub top_verifier: Option<VerifierTally>,
    pub last_verification: Option<DateTime<Utc>>,
    pub today_verifications: u64,
    /// Mean over the days that had at least one redemption.
    pub average_daily_verifications: f64,
}

impl VerificationEngine {
    /// Every redemption of a participant, newest first, revoked ones included.
    pub async fn history_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<RedemptionRecord>> {
        self.load_participant(participant_id).await?;
        Ok(self
            .stores
            .logs
            .list_by_participant(participant_id)
            .await?)
    }

    /// One page of an event's redemptions, newest first.
    pub async fn list_for_event(
        &self,
        event_id: &EventId,
        filters: &VerificationFilters,
    ) -> Result<Page<RedemptionRecord>> {
        if let (Some(from), Some(to)) = (filters.date_from, filters.date_to) {
            if from > to {
                return Err(VerificationError::invalid_input(
                    "date_from must not be after date_to",
                ));
            }
        }
        self.load_event(event_id).await?;

        let request = PageRequest::new(filters.page, filters.page_size);
        let filter = ActionLogFilter {
            date_from: filters.date_from,
            date_to: filters.date_to,
            action_id: filters.action_id,
            verifier_id: filters.verifier_id,
            include_revoked: filters.include_revoked,
        };
        let (records, total) = self
            .stores
            .logs
            .list_by_event(event_id, &filter, request.offset(), request.limit())
            .await?;

        Ok(Page::new(records, total, request))
    }

    pub async fn stats_for_event(&self, event_id: &EventId) -> Result<EventStats> {
        let event = self.load_event(event_id).await?;

        let (total_participants, summary) = tokio::join!(
            self.stores.participants.count_participants(event_id),
            self.stores.logs.event_summary(event_id, self.offset),
        );
        let total_participants = total_participants?;
        let summary = summary?;

        let most_verified_action = match summary.by_action.first() {
            Some(&(action_id, count)) => Some(ActionTally {
                action_id,
                action_name: self
                    .stores
                    .events
                    .get_action(&action_id)
                    .await?
                    .map(|a| a.name),
                count,
            }),
            None => None,
        };
        let top_verifier = match summary.by_verifier.first() {
            Some(&(verifier_id, count)) => Some(VerifierTally {
                verifier_id,
                email: self
                    .stores
                    .users
                    .get_user(&verifier_id)
                    .await?
                    .map(|u| u.email),
                count,
            }),
            None => None,
        };

        let today = self.local_date(self.now());
        let today_verifications = summary
            .by_day
            .iter()
            .find(|(day, _)| *day == today)
            .map_or(0, |(_, count)| *count);

        Ok(EventStats {
            event_id: event.id,
            event_title: event.title,
            total_verifications: summary.total,
            unique_participants: summary.unique_participants,
            total_participants,
            verification_rate: ratio(summary.total, total_participants),
            most_verified_action,
            top_verifier,
            last_verification: summary.last_verified_at,
            today_verifications,
            average_daily_verifications: average_daily(&summary),
        })
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

fn average_daily(summary: &EventSummary) -> f64 {
    ratio(summary.total, summary.by_day.len() as u64)
}
