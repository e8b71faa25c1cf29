//! The engine: dependency wiring and the lookups shared by every operation.
//!
//! Operations live in sibling modules as further `impl VerificationEngine`
//! blocks: [`verify`](crate::verify), [`query`](crate::query) and
//! [`revocation`](crate::revocation).

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound, Utc};

use rollcall_core::{ErrorKind, Event, EventId, Participant, ParticipantId, User, UserId};
use rollcall_store::{ActionLogStore, EventStore, ParticipantStore, Store, UserStore};

use crate::config::{ConfigError, EngineConfig};
use crate::error::{Result, VerificationError};

/// The four collaborator stores the engine is built from.
#[derive(Clone)]
pub struct Stores {
    pub participants: Arc<dyn ParticipantStore>,
    pub events: Arc<dyn EventStore>,
    pub users: Arc<dyn UserStore>,
    pub logs: Arc<dyn ActionLogStore>,
}

impl Stores {
    /// Use one backend for every role.
    pub fn from_shared<S: Store + 'static>(store: Arc<S>) -> Self {
        Self {
            participants: store.clone(),
            events: store.clone(),
            users: store.clone(),
            logs: store,
        }
    }
}

/// Decides and records redemptions, and serves the read and undo paths.
///
/// Holds no per-request state; share it behind an `Arc` and call it from as
/// many tasks as needed.
pub struct VerificationEngine {
    pub(crate) stores: Stores,
    pub(crate) config: EngineConfig,
    pub(crate) offset: FixedOffset,
}

impl VerificationEngine {
    /// Create a new engine. Fails if the configuration is invalid.
    pub fn new(stores: Stores, config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        let offset = config.offset()?;
        Ok(Self {
            stores,
            config,
            offset,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Current time at the millisecond precision the stores keep.
    pub(crate) fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    /// The venue's calendar date for `now`.
    pub(crate) fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    pub(crate) async fn load_participant(&self, id: &ParticipantId) -> Result<Participant> {
        self.stores
            .participants
            .get_participant(id)
            .await?
            .ok_or_else(|| {
                VerificationError::new(
                    ErrorKind::ParticipantNotFound,
                    format!("participant not found: {}", id),
                )
            })
    }

    pub(crate) async fn load_event(&self, id: &EventId) -> Result<Event> {
        self.stores.events.get_event(id).await?.ok_or_else(|| {
            VerificationError::new(ErrorKind::EventNotFound, format!("event not found: {}", id))
        })
    }

    /// A verifier must resolve to a known user.
    pub(crate) async fn load_verifier(&self, id: &UserId) -> Result<User> {
        self.stores.users.get_user(id).await?.ok_or_else(|| {
            VerificationError::new(
                ErrorKind::VerifierNotFound,
                format!("verifier not found: {}", id),
            )
        })
    }
}
