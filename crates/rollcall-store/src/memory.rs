//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate};

use rollcall_core::{
    ActionId, ActionLog, Event, EventAction, EventDay, EventDayId, EventId, Participant,
    ParticipantId, PaymentStatus, RedemptionId, RedemptionRecord, Revocation, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::traits::{
    ActionLogFilter, ActionLogStore, EventStore, EventSummary, InsertResult, ParticipantStore,
    RevokeResult, UserStore,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; every
/// write that must be atomic happens under a single write guard.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    days: HashMap<EventDayId, EventDay>,
    actions: HashMap<ActionId, EventAction>,
    participants: HashMap<ParticipantId, Participant>,

    /// Redemptions indexed by ID.
    logs: HashMap<RedemptionId, ActionLog>,

    /// Claim index: (participant, action) -> live redemption.
    claims: HashMap<(ParticipantId, ActionId), RedemptionId>,

    /// Revocations indexed by the redemption they revoke.
    revocations: HashMap<RedemptionId, Revocation>,
}

impl MemoryStoreInner {
    fn record(&self, log: &ActionLog) -> RedemptionRecord {
        RedemptionRecord {
            log: log.clone(),
            revocation: self.revocations.get(&log.id).cloned(),
        }
    }

    /// Records of one event's participants, newest first.
    fn event_records(&self, event_id: &EventId) -> Vec<RedemptionRecord> {
        let mut records: Vec<RedemptionRecord> = self
            .logs
            .values()
            .filter(|log| {
                self.participants
                    .get(&log.participant_id)
                    .is_some_and(|p| p.event_id == *event_id)
            })
            .map(|log| self.record(log))
            .collect();
        sort_newest_first(&mut records);
        records
    }
}

fn sort_newest_first(records: &mut [RedemptionRecord]) {
    records.sort_by(|a, b| {
        b.log
            .verified_at
            .cmp(&a.log.verified_at)
            .then_with(|| b.log.id.cmp(&a.log.id))
    });
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParticipantStore for MemoryStore {
    async fn insert_participant(&self, participant: &Participant) -> Result<()> {
        let mut inner = self.write()?;
        if inner.participants.contains_key(&participant.id) {
            return Err(StoreError::conflict("participant", participant.id));
        }
        let duplicate_email = inner
            .participants
            .values()
            .any(|p| p.event_id == participant.event_id && p.email == participant.email);
        if duplicate_email {
            return Err(StoreError::conflict("participant", &participant.email));
        }
        inner.participants.insert(participant.id, participant.clone());
        Ok(())
    }

    async fn get_participant(&self, id: &ParticipantId) -> Result<Option<Participant>> {
        Ok(self.read()?.participants.get(id).cloned())
    }

    async fn get_participant_by_email(
        &self,
        email: &str,
        event_id: &EventId,
    ) -> Result<Option<Participant>> {
        let inner = self.read()?;
        Ok(inner
            .participants
            .values()
            .find(|p| p.event_id == *event_id && p.email == email)
            .cloned())
    }

    async fn count_participants(&self, event_id: &EventId) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner
            .participants
            .values()
            .filter(|p| p.event_id == *event_id)
            .count() as u64)
    }

    async fn update_payment_status(
        &self,
        id: &ParticipantId,
        status: PaymentStatus,
    ) -> Result<()> {
        let mut inner = self.write()?;
        let participant = inner
            .participants
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("participant", id))?;
        participant.payment_status = status;
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let mut inner = self.write()?;
        if inner.events.contains_key(&event.id) {
            return Err(StoreError::conflict("event", event.id));
        }
        if inner.events.values().any(|e| e.slug == event.slug) {
            return Err(StoreError::conflict("event", &event.slug));
        }
        inner.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>> {
        Ok(self.read()?.events.get(id).cloned())
    }

    async fn get_event_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let inner = self.read()?;
        Ok(inner.events.values().find(|e| e.slug == slug).cloned())
    }

    async fn insert_event_day(&self, day: &EventDay) -> Result<()> {
        let mut inner = self.write()?;
        if inner.days.contains_key(&day.id) {
            return Err(StoreError::conflict("event day", day.id));
        }
        let duplicate_number = inner
            .days
            .values()
            .any(|d| d.event_id == day.event_id && d.day_number == day.day_number);
        if duplicate_number {
            return Err(StoreError::conflict(
                "event day",
                format!("{}#{}", day.event_id, day.day_number),
            ));
        }
        inner.days.insert(day.id, day.clone());
        Ok(())
    }

    async fn get_event_day(&self, id: &EventDayId) -> Result<Option<EventDay>> {
        Ok(self.read()?.days.get(id).cloned())
    }

    async fn insert_action(&self, action: &EventAction) -> Result<()> {
        let mut inner = self.write()?;
        if inner.actions.contains_key(&action.id) {
            return Err(StoreError::conflict("action", action.id));
        }
        if inner.actions.values().any(|a| a.code == action.code) {
            return Err(StoreError::conflict("action", &action.code));
        }
        inner.actions.insert(action.id, action.clone());
        Ok(())
    }

    async fn get_action(&self, id: &ActionId) -> Result<Option<EventAction>> {
        Ok(self.read()?.actions.get(id).cloned())
    }

    async fn get_action_by_code(&self, code: &str) -> Result<Option<EventAction>> {
        let inner = self.read()?;
        Ok(inner.actions.values().find(|a| a.code == code).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut inner = self.write()?;
        if inner.users.contains_key(&user.id) {
            return Err(StoreError::conflict("user", user.id));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::conflict("user", &user.email));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.read()?;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl ActionLogStore for MemoryStore {
    async fn has_live_redemption(
        &self,
        participant_id: &ParticipantId,
        action_id: &ActionId,
    ) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner.claims.contains_key(&(*participant_id, *action_id)))
    }

    async fn insert_action_log(&self, log: &ActionLog) -> Result<InsertResult> {
        let mut inner = self.write()?;

        if inner.logs.contains_key(&log.id) {
            return Err(StoreError::conflict("redemption", log.id));
        }

        // Claim check and insert happen under the same guard.
        let key = (log.participant_id, log.action_id);
        if let Some(&existing) = inner.claims.get(&key) {
            return Ok(InsertResult::AlreadyExists { existing });
        }

        inner.logs.insert(log.id, log.clone());
        inner.claims.insert(key, log.id);

        Ok(InsertResult::Inserted)
    }

    async fn get_action_log(&self, id: &RedemptionId) -> Result<Option<RedemptionRecord>> {
        let inner = self.read()?;
        Ok(inner.logs.get(id).map(|log| inner.record(log)))
    }

    async fn list_by_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<RedemptionRecord>> {
        let inner = self.read()?;
        let mut records: Vec<RedemptionRecord> = inner
            .logs
            .values()
            .filter(|log| log.participant_id == *participant_id)
            .map(|log| inner.record(log))
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn list_by_event(
        &self,
        event_id: &EventId,
        filter: &ActionLogFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<RedemptionRecord>, u64)> {
        let inner = self.read()?;
        let matching: Vec<RedemptionRecord> = inner
            .event_records(event_id)
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        let total = matching.len() as u64;
        let window = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        Ok((window, total))
    }

    async fn event_summary(
        &self,
        event_id: &EventId,
        offset: FixedOffset,
    ) -> Result<EventSummary> {
        let inner = self.read()?;
        let live: Vec<RedemptionRecord> = inner
            .event_records(event_id)
            .into_iter()
            .filter(|r| !r.is_revoked())
            .collect();

        let mut participants = HashSet::new();
        let mut by_action: HashMap<ActionId, u64> = HashMap::new();
        let mut by_verifier: HashMap<UserId, u64> = HashMap::new();
        let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();

        for record in &live {
            let log = &record.log;
            participants.insert(log.participant_id);
            *by_action.entry(log.action_id).or_default() += 1;
            *by_verifier.entry(log.verified_by).or_default() += 1;
            let day = log.verified_at.with_timezone(&offset).date_naive();
            *by_day.entry(day).or_default() += 1;
        }

        let mut summary = EventSummary {
            total: live.len() as u64,
            unique_participants: participants.len() as u64,
            by_action: by_action.into_iter().collect(),
            by_verifier: by_verifier.into_iter().collect(),
            by_day: by_day.into_iter().collect(),
            // Newest first, so the head is the latest.
            last_verified_at: live.first().map(|r| r.log.verified_at),
        };
        summary.sort();
        Ok(summary)
    }

    async fn insert_revocation(&self, revocation: &Revocation) -> Result<RevokeResult> {
        let mut inner = self.write()?;

        let log = inner
            .logs
            .get(&revocation.redemption_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("redemption", revocation.redemption_id))?;

        if let Some(existing) = inner.revocations.get(&log.id) {
            return Ok(RevokeResult::AlreadyRevoked {
                existing: existing.clone(),
            });
        }

        inner.revocations.insert(log.id, revocation.clone());
        let key = (log.participant_id, log.action_id);
        if inner.claims.get(&key) == Some(&log.id) {
            inner.claims.remove(&key);
        }

        Ok(RevokeResult::Revoked)
    }

    async fn get_revocation(&self, redemption_id: &RedemptionId) -> Result<Option<Revocation>> {
        Ok(self.read()?.revocations.get(redemption_id).cloned())
    }
}
