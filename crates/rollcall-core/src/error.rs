//! Error types for Rollcall Core.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while decoding core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown payment status: {0}")]
    UnknownPaymentStatus(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Errors raised while decoding a scanned credential.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential is empty")]
    Empty,

    #[error("credential does not contain a participant identifier: {0}")]
    Unrecognized(String),
}

/// Stable failure classification shared by every engine operation.
///
/// Callers branch on the kind, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    InvalidCredential,
    ParticipantNotFound,
    ActionNotFound,
    ActionInactive,
    VerifierNotFound,
    PaymentRequired,
    AlreadyVerified,
    EventNotFound,
    EventMismatch,
    EventNotStarted,
    RedemptionNotFound,
    PersistenceError,
    PermissionDenied,
    NotImplemented,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::ParticipantNotFound => "PARTICIPANT_NOT_FOUND",
            Self::ActionNotFound => "ACTION_NOT_FOUND",
            Self::ActionInactive => "ACTION_INACTIVE",
            Self::VerifierNotFound => "VERIFIER_NOT_FOUND",
            Self::PaymentRequired => "PAYMENT_REQUIRED",
            Self::AlreadyVerified => "ALREADY_VERIFIED",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::EventMismatch => "EVENT_MISMATCH",
            Self::EventNotStarted => "EVENT_NOT_STARTED",
            Self::RedemptionNotFound => "REDEMPTION_NOT_FOUND",
            Self::PersistenceError => "PERSISTENCE_ERROR",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NotImplemented => "NOT_IMPLEMENTED",
        }
    }

    /// Transport status category for this kind.
    pub fn status(&self) -> StatusCategory {
        match self {
            Self::InvalidInput | Self::InvalidCredential => StatusCategory::Validation,
            Self::ParticipantNotFound
            | Self::ActionNotFound
            | Self::EventNotFound
            | Self::RedemptionNotFound => StatusCategory::NotFound,
            Self::VerifierNotFound => StatusCategory::Unauthorized,
            Self::PaymentRequired | Self::AlreadyVerified | Self::ActionInactive => {
                StatusCategory::Conflict
            }
            Self::EventMismatch | Self::EventNotStarted | Self::PermissionDenied => {
                StatusCategory::Forbidden
            }
            Self::NotImplemented => StatusCategory::NotImplemented,
            Self::PersistenceError => StatusCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-agnostic status buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Unauthorized,
    NotImplemented,
    Internal,
}

impl StatusCategory {
    /// The HTTP status code a web transport should use.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
            Self::NotImplemented => 501,
        }
    }
}
