//! Records the verification engine reads and writes.
//!
//! Participants, events, days, actions and users are owned by collaborators;
//! the engine only ever appends [`ActionLog`] and [`Revocation`] records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{
    ActionId, EventDayId, EventId, ParticipantId, RedemptionId, RevocationId, UserId,
};

/// Payment state of a participant's ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Pending,
    Paid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [Self::Unpaid, Self::Pending, Self::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(CoreError::UnknownPaymentStatus(other.to_string())),
        }
    }
}

/// Role of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Organizer,
    #[default]
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Organizer => "organizer",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "organizer" => Ok(Self::Organizer),
            "staff" => Ok(Self::Staff),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// An event that participants register for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    /// Unique URL-safe handle.
    pub slug: String,
    /// Ticket price in minor currency units. Zero means a free event.
    pub ticket_price: u64,
    pub is_active: bool,
}

impl Event {
    /// Whether redemption requires a confirmed payment.
    pub fn is_paid(&self) -> bool {
        self.ticket_price > 0
    }
}

/// One calendar day of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDay {
    pub id: EventDayId,
    pub event_id: EventId,
    /// 1-based, unique within the event.
    pub day_number: u32,
    pub label: String,
    pub date: NaiveDate,
}

/// A redeemable checkpoint scoped to one event day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAction {
    pub id: ActionId,
    pub event_id: EventId,
    pub event_day_id: EventDayId,
    pub name: String,
    /// Globally unique code typed or scanned by staff.
    pub code: String,
    pub is_active: bool,
}

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub event_id: EventId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub division: Option<String>,
    pub payment_status: PaymentStatus,
}

/// A staff, organizer or admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A redemption: one participant completed one action.
///
/// Immutable once written. A revocation never edits this record; it is
/// expressed as a separate [`Revocation`] that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    pub id: RedemptionId,
    pub participant_id: ParticipantId,
    pub action_id: ActionId,
    pub verified_by: UserId,
    pub verified_at: DateTime<Utc>,
}

impl ActionLog {
    /// Build a fresh record stamped at `now`.
    pub fn new(
        participant_id: ParticipantId,
        action_id: ActionId,
        verified_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RedemptionId::new_v4(),
            participant_id,
            action_id,
            verified_by,
            verified_at: now,
        }
    }
}

/// Compensating marker appended when an admin reverts a redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    pub id: RevocationId,
    pub redemption_id: RedemptionId,
    pub revoked_by: UserId,
    pub revoked_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// A redemption as seen by readers: the log plus its revocation, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub log: ActionLog,
    pub revocation: Option<Revocation>,
}

impl RedemptionRecord {
    pub fn is_revoked(&self) -> bool {
        self.revocation.is_some()
    }
}
