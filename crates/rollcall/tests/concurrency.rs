//! Same-pair races: exactly one redemption wins on every backend.

mod common;

use std::sync::Arc;

use rollcall::store::{ActionLogStore, MemoryStore, SqliteStore};
use rollcall::{ErrorKind, VerificationEngine};
use rollcall_testkit::EventFixture;

use common::{engine_over, memory_engine, sqlite_engine};

const CONTENDERS: usize = 16;

/// Fire `CONTENDERS` concurrent verifies for the same pair.
async fn race(engine: Arc<VerificationEngine>, fixture: &EventFixture) -> (usize, usize) {
    let mut handles = Vec::with_capacity(CONTENDERS);
    for _ in 0..CONTENDERS {
        let engine = Arc::clone(&engine);
        let credential = fixture.credential();
        let code = fixture.action.code.clone();
        let staff = fixture.staff.id;
        handles.push(tokio::spawn(async move {
            engine.verify(&credential, &code, &staff).await
        }));
    }

    let (mut won, mut duplicate) = (0, 0);
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(err) if err.kind() == ErrorKind::AlreadyVerified => duplicate += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
    (won, duplicate)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_store_single_winner() {
    let fixture = EventFixture::paid();
    let (store, engine) = memory_engine(&fixture).await;

    let (won, duplicate) = race(Arc::new(engine), &fixture).await;
    assert_eq!(won, 1);
    assert_eq!(duplicate, CONTENDERS - 1);

    let history = store.list_by_participant(&fixture.participant.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_store_single_winner() {
    let fixture = EventFixture::paid();
    let (store, engine) = sqlite_engine(&fixture).await;

    let (won, duplicate) = race(Arc::new(engine), &fixture).await;
    assert_eq!(won, 1);
    assert_eq!(duplicate, CONTENDERS - 1);

    let history = store.list_by_participant(&fixture.participant.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_file_store_single_winner() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = EventFixture::paid();
    let store = Arc::new(SqliteStore::open(dir.path().join("rollcall.db")).unwrap());
    fixture.seed(store.as_ref()).await.unwrap();

    let (won, _) = race(Arc::new(engine_over(store)), &fixture).await;
    assert_eq!(won, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_pairs_all_succeed() {
    let fixture = EventFixture::free();
    let store = Arc::new(MemoryStore::new());
    fixture.seed(store.as_ref()).await.unwrap();

    let mut participants = Vec::new();
    for _ in 0..8 {
        participants.push(
            fixture
                .add_participant(store.as_ref(), rollcall::core::PaymentStatus::Unpaid)
                .await
                .unwrap(),
        );
    }
    let engine = Arc::new(engine_over(store));

    let mut handles = Vec::new();
    for participant in participants {
        let engine = Arc::clone(&engine);
        let code = fixture.action.code.clone();
        let staff = fixture.staff.id;
        handles.push(tokio::spawn(async move {
            engine
                .verify(&participant.id.to_string(), &code, &staff)
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
}
