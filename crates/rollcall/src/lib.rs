//! # Rollcall
//!
//! Credential redemption for events: staff scan a participant's QR
//! credential against a named action ("Day 1 check-in", "Lunch") and the
//! engine decides whether the redemption is allowed and records it once.
//!
//! ## Overview
//!
//! - **Verify**: resolve the credential and action, run the eligibility gates,
//!   record the redemption.
//! - **Query**: participant history, filtered event listings, event statistics.
//! - **Revert**: an admin appends a revocation; the pair becomes redeemable again.
//!
//! ## Key Concepts
//!
//! - **Redemption**: an immutable [`ActionLog`](core::ActionLog). Never edited.
//! - **At most once**: one live redemption per (participant, action), enforced
//!   by the store.
//! - **Revocation**: a compensating record, not a delete.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rollcall::{EngineConfig, Stores, VerificationEngine};
//! use rollcall::core::UserId;
//!
//! async fn example(verifier: UserId) {
//!     let config = EngineConfig::from_toml_file("rollcall.toml").unwrap();
//!     let store = Arc::new(config.open_store().unwrap());
//!     let engine = VerificationEngine::new(Stores::from_shared(store), config).unwrap();
//!
//!     let outcome = engine
//!         .verify("uploads/qrcodes/3f2a8c1e-0b7d-4c55-9a61-2d0e8f4b7c11.png", "LUNCH-D1", &verifier)
//!         .await
//!         .unwrap();
//!     println!("{}", outcome.message);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `rollcall::core` - ids, records, eligibility gates, error kinds
//! - `rollcall::store` - store traits and the SQLite / in-memory backends

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod query;
pub mod registry;
pub mod revocation;
pub mod verify;

pub use rollcall_core as core;
pub use rollcall_store as store;

pub use config::{ConfigError, EngineConfig, LoggingConfig, StoreConfig};
pub use engine::{Stores, VerificationEngine};
pub use error::{Result, VerificationError};
pub use logging::{init_logging, LogFormat};
pub use query::{ActionTally, EventStats, VerificationFilters, VerifierTally};
pub use verify::VerifyOutcome;

pub use rollcall_core::{ErrorKind, Page, RedemptionRecord, Revocation, StatusCategory};
