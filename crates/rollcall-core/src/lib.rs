//! # Rollcall Core
//!
//! Pure primitives for Rollcall: identifiers, records, credential decoding,
//! and the eligibility gates that decide whether a redemption is allowed.
//!
//! This crate contains no I/O, no storage, no clocks. Everything here is a
//! function of its inputs.
//!
//! ## Key Types
//!
//! - [`Participant`], [`Event`], [`EventDay`], [`EventAction`], [`User`] - collaborator records
//! - [`ActionLog`] - an immutable redemption record
//! - [`Revocation`] - the compensating marker for a reverted redemption
//! - [`ErrorKind`] - the stable failure classification
//!
//! ## Eligibility
//!
//! See [`eligibility::evaluate`] for the gate order.

pub mod credential;
pub mod eligibility;
pub mod error;
pub mod model;
pub mod pagination;
pub mod types;

pub use credential::resolve_credential;
pub use eligibility::{evaluate, Denial, EligibilityFacts, TemporalGatePolicy};
pub use error::{CoreError, CredentialError, ErrorKind, StatusCategory};
pub use model::{
    ActionLog, Event, EventAction, EventDay, Participant, PaymentStatus, RedemptionRecord,
    Revocation, Role, User,
};
pub use pagination::{total_pages, Page, PageRequest};
pub use types::{
    ActionId, EventDayId, EventId, ParticipantId, RedemptionId, RevocationId, UserId,
};
