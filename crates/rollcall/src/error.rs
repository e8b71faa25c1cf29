//! Error type for engine operations.

use std::error::Error as StdError;

use rollcall_core::{CredentialError, Denial, ErrorKind, StatusCategory};
use rollcall_store::StoreError;
use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failed engine operation.
///
/// Every failure carries a stable [`ErrorKind`]; callers branch on the kind
/// and show the message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct VerificationError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl VerificationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Transport-neutral status class for this failure.
    pub fn status(&self) -> StatusCategory {
        self.kind.status()
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }
}

impl From<StoreError> for VerificationError {
    fn from(err: StoreError) -> Self {
        Self::new(ErrorKind::PersistenceError, "storage operation failed").with_source(err)
    }
}

impl From<Denial> for VerificationError {
    fn from(denial: Denial) -> Self {
        Self::new(denial.kind(), denial.to_string()).with_source(denial)
    }
}

impl From<CredentialError> for VerificationError {
    fn from(err: CredentialError) -> Self {
        Self::new(ErrorKind::InvalidCredential, "invalid QR code").with_source(err)
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, VerificationError>;
