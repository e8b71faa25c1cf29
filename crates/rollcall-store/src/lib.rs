//! # Rollcall Store
//!
//! Storage abstraction for Rollcall. Provides trait-based interfaces for the
//! collaborator records the engine reads and the redemption log it appends
//! to, with SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`ParticipantStore`], [`EventStore`], [`UserStore`] - collaborator lookups
//! - [`ActionLogStore`] - the append-only redemption log and its revocations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting a redemption
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rollcall_store::{ActionLogStore, InsertResult, SqliteStore};
//! use rollcall_core::{ActionId, ActionLog, ParticipantId, UserId};
//!
//! async fn example() {
//!     let store = SqliteStore::open("rollcall.db").unwrap();
//!
//!     let log = ActionLog::new(
//!         ParticipantId::new_v4(),
//!         ActionId::new_v4(),
//!         UserId::new_v4(),
//!         chrono::Utc::now(),
//!     );
//!     match store.insert_action_log(&log).await.unwrap() {
//!         InsertResult::Inserted => {}
//!         InsertResult::AlreadyExists { existing } => println!("held by {existing}"),
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **At most once**: a (participant, action) pair has at most one live redemption
//! - **Append-only**: redemptions are never edited; revocations are separate records
//! - **Re-redeemable**: revoking a redemption releases its claim

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    ActionLogFilter, ActionLogStore, EventStore, EventSummary, InsertResult, ParticipantStore,
    RevokeResult, Store, UserStore,
};
