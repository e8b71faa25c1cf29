//! Shared setup for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rollcall::store::{MemoryStore, SqliteStore, Store};
use rollcall::{EngineConfig, ErrorKind, Stores, VerificationEngine, VerificationError};
use rollcall_testkit::EventFixture;

pub fn engine_over<S: Store + 'static>(store: Arc<S>) -> VerificationEngine {
    engine_with(store, EngineConfig::default())
}

pub fn engine_with<S: Store + 'static>(store: Arc<S>, config: EngineConfig) -> VerificationEngine {
    VerificationEngine::new(Stores::from_shared(store), config).unwrap()
}

/// Seed `fixture` into a fresh memory store and build an engine over it.
pub async fn memory_engine(fixture: &EventFixture) -> (Arc<MemoryStore>, VerificationEngine) {
    let store = Arc::new(fixture.in_memory().await.unwrap());
    let engine = engine_over(store.clone());
    (store, engine)
}

pub async fn sqlite_engine(fixture: &EventFixture) -> (Arc<SqliteStore>, VerificationEngine) {
    let store = Arc::new(SqliteStore::open_memory().unwrap());
    fixture.seed(store.as_ref()).await.unwrap();
    let engine = engine_over(store.clone());
    (store, engine)
}

#[track_caller]
pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, VerificationError>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("expected {kind}, got Ok({value:?})"),
        Err(err) => assert_eq!(err.kind(), kind, "unexpected error: {err}"),
    }
}
