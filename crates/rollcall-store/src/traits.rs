//! Store traits: the collaborator interfaces the engine depends on.
//!
//! The engine is storage-agnostic. Implementations include SQLite (primary)
//! and in-memory (for tests). One backend usually implements all four traits.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use rollcall_core::{
    ActionId, ActionLog, Event, EventAction, EventDay, EventDayId, EventId, Participant,
    ParticipantId, PaymentStatus, RedemptionId, RedemptionRecord, Revocation, User, UserId,
};

use crate::error::Result;

/// Result of inserting a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// The redemption was recorded and now holds the (participant, action) claim.
    Inserted,
    /// A live redemption already holds the claim. Nothing was written.
    AlreadyExists {
        /// The redemption holding the claim.
        existing: RedemptionId,
    },
}

/// Result of appending a revocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeResult {
    /// The revocation was appended and the claim released.
    Revoked,
    /// The redemption was already revoked (idempotent, not an error).
    AlreadyRevoked {
        /// The revocation on record.
        existing: Revocation,
    },
}

/// Optional filters for event listings. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLogFilter {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub action_id: Option<ActionId>,
    pub verifier_id: Option<UserId>,
    /// Include revoked redemptions in results and totals.
    pub include_revoked: bool,
}

impl ActionLogFilter {
    /// Whether a record passes every filter.
    pub fn matches(&self, record: &RedemptionRecord) -> bool {
        let log = &record.log;
        self.date_from.map_or(true, |from| log.verified_at >= from)
            && self.date_to.map_or(true, |to| log.verified_at <= to)
            && self.action_id.map_or(true, |id| log.action_id == id)
            && self.verifier_id.map_or(true, |id| log.verified_by == id)
            && (self.include_revoked || !record.is_revoked())
    }
}

/// Group-by tallies over the live redemptions of one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSummary {
    pub total: u64,
    pub unique_participants: u64,
    /// Redemptions per action, highest count first, ties by action id.
    pub by_action: Vec<(ActionId, u64)>,
    /// Redemptions per verifier, highest count first, ties by user id.
    pub by_verifier: Vec<(UserId, u64)>,
    /// Redemptions per local calendar day, oldest first.
    pub by_day: Vec<(NaiveDate, u64)>,
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl EventSummary {
    pub(crate) fn sort(&mut self) {
        self.by_action
            .sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        self.by_verifier
            .sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        self.by_day.sort_by_key(|(day, _)| *day);
    }
}

/// Participant persistence.
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Register a participant. Email is unique per event.
    async fn insert_participant(&self, participant: &Participant) -> Result<()>;

    async fn get_participant(&self, id: &ParticipantId) -> Result<Option<Participant>>;

    /// Registration-time dedup lookup.
    async fn get_participant_by_email(
        &self,
        email: &str,
        event_id: &EventId,
    ) -> Result<Option<Participant>>;

    async fn count_participants(&self, event_id: &EventId) -> Result<u64>;

    /// Payment confirmation hook. Fails with `NotFound` for unknown ids.
    async fn update_payment_status(&self, id: &ParticipantId, status: PaymentStatus)
        -> Result<()>;
}

/// Events, days and actions.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Slug is unique.
    async fn insert_event(&self, event: &Event) -> Result<()>;

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>>;

    async fn get_event_by_slug(&self, slug: &str) -> Result<Option<Event>>;

    /// Day number is unique within the event.
    async fn insert_event_day(&self, day: &EventDay) -> Result<()>;

    async fn get_event_day(&self, id: &EventDayId) -> Result<Option<EventDay>>;

    /// Code is globally unique.
    async fn insert_action(&self, action: &EventAction) -> Result<()>;

    async fn get_action(&self, id: &ActionId) -> Result<Option<EventAction>>;

    /// Exact, case-sensitive code match.
    async fn get_action_by_code(&self, code: &str) -> Result<Option<EventAction>>;
}

/// Staff accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Email is unique.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// Redemption records and their revocations.
///
/// # Design Notes
///
/// - **Append-only**: logs and revocations are never updated or deleted.
/// - **Claims**: each live redemption holds the (participant, action) claim.
///   `insert_action_log` takes the claim atomically with the insert and
///   reports `AlreadyExists` if someone else holds it. This check is the
///   authoritative at-most-once guard.
/// - **Revocation**: `insert_revocation` appends the marker and releases the
///   claim atomically, so the pair can be redeemed again.
#[async_trait]
pub trait ActionLogStore: Send + Sync {
    /// Whether a live redemption holds the claim for this pair.
    async fn has_live_redemption(
        &self,
        participant_id: &ParticipantId,
        action_id: &ActionId,
    ) -> Result<bool>;

    /// Insert a redemption and take its claim in one atomic step.
    async fn insert_action_log(&self, log: &ActionLog) -> Result<InsertResult>;

    async fn get_action_log(&self, id: &RedemptionId) -> Result<Option<RedemptionRecord>>;

    /// Every redemption of a participant, newest first, revoked ones included.
    async fn list_by_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<RedemptionRecord>>;

    /// Redemptions of an event's participants, newest first.
    ///
    /// Returns the requested window and the total number of matches.
    async fn list_by_event(
        &self,
        event_id: &EventId,
        filter: &ActionLogFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<RedemptionRecord>, u64)>;

    /// Tallies over live redemptions. Days are bucketed in `offset`.
    async fn event_summary(&self, event_id: &EventId, offset: FixedOffset)
        -> Result<EventSummary>;

    /// Append a revocation and release the claim in one atomic step.
    ///
    /// Fails with `NotFound` if the redemption does not exist.
    async fn insert_revocation(&self, revocation: &Revocation) -> Result<RevokeResult>;

    async fn get_revocation(&self, redemption_id: &RedemptionId) -> Result<Option<Revocation>>;
}

/// Convenience bound for backends that implement every store trait.
pub trait Store: ParticipantStore + EventStore + UserStore + ActionLogStore {}

impl<S: ParticipantStore + EventStore + UserStore + ActionLogStore + ?Sized> Store for S {}
