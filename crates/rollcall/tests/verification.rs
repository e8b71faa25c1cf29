//! End-to-end redemption scenarios.

mod common;

use std::sync::Arc;

use proptest::prelude::*;
use rollcall::core::{
    ActionId, EventAction, EventDayId, ParticipantId, PaymentStatus, TemporalGatePolicy, UserId,
};
use rollcall::store::{EventStore, MemoryStore};
use rollcall::{EngineConfig, ErrorKind};
use rollcall_testkit::{EventFixture, ScenarioParams};

use common::{assert_kind, engine_over, engine_with, memory_engine};

#[tokio::test]
async fn test_paid_participant_redeems_once() -> anyhow::Result<()> {
    let fixture = EventFixture::paid();
    let (_store, engine) = memory_engine(&fixture).await;

    let outcome = engine
        .verify(&fixture.credential(), &fixture.action.code, &fixture.staff.id)
        .await?;
    assert!(outcome.success);
    assert_eq!(
        outcome.message,
        "Successfully verified Day 1 check-in for participant Ana Lima"
    );
    assert_eq!(outcome.participant_name, "Ana Lima");
    assert_eq!(outcome.action_name, "Day 1 check-in");
    assert_eq!(outcome.record.participant_id, fixture.participant.id);
    assert_eq!(outcome.record.verified_by, fixture.staff.id);
    assert_eq!(outcome.timestamp, outcome.record.verified_at);

    let again = engine
        .verify(&fixture.credential(), &fixture.action.code, &fixture.staff.id)
        .await;
    assert_kind(again, ErrorKind::AlreadyVerified);

    let history = engine.history_for_participant(&fixture.participant.id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].log.id, outcome.redemption_id);
    Ok(())
}

#[tokio::test]
async fn test_free_event_ignores_payment() -> anyhow::Result<()> {
    let fixture = EventFixture::free();
    assert_eq!(fixture.participant.payment_status, PaymentStatus::Unpaid);
    let (_store, engine) = memory_engine(&fixture).await;

    let outcome = engine
        .verify(&fixture.credential(), &fixture.action.code, &fixture.staff.id)
        .await?;
    assert!(outcome.success);
    Ok(())
}

#[tokio::test]
async fn test_bare_credential_accepted() -> anyhow::Result<()> {
    let fixture = EventFixture::free();
    let (_store, engine) = memory_engine(&fixture).await;

    let bare = format!("  {}\n", fixture.participant.id);
    engine
        .verify(&bare, &fixture.action.code, &fixture.staff.id)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_unpaid_participant_of_paid_event_denied() {
    for status in [PaymentStatus::Unpaid, PaymentStatus::Pending] {
        let fixture = EventFixture::builder()
            .ticket_price(50_000)
            .payment_status(status)
            .day_offset(-1)
            .build();
        let (_store, engine) = memory_engine(&fixture).await;

        let result = engine
            .verify(&fixture.credential(), &fixture.action.code, &fixture.staff.id)
            .await;
        assert_kind(result, ErrorKind::PaymentRequired);
    }
}

#[tokio::test]
async fn test_cross_event_action_denied_before_other_gates() {
    // Participant is unpaid in a paid event and the other action's day is in
    // the future; the mismatch still wins.
    let home = EventFixture::builder()
        .ticket_price(50_000)
        .payment_status(PaymentStatus::Unpaid)
        .build();
    let away = EventFixture::builder().day_offset(5).build();

    let store = Arc::new(MemoryStore::new());
    home.seed(store.as_ref()).await.unwrap();
    away.seed(store.as_ref()).await.unwrap();
    let engine = engine_over(store);

    let result = engine
        .verify(&home.credential(), &away.action.code, &home.staff.id)
        .await;
    assert_kind(result, ErrorKind::EventMismatch);
}

#[tokio::test]
async fn test_temporal_gate() -> anyhow::Result<()> {
    // Two days out so a midnight rollover mid-test still leaves it in the future.
    let future = EventFixture::builder().day_offset(2).build();
    let (_store, engine) = memory_engine(&future).await;
    let result = engine
        .verify(&future.credential(), &future.action.code, &future.staff.id)
        .await;
    assert_kind(result, ErrorKind::EventNotStarted);

    let today = EventFixture::builder().day_offset(0).build();
    let (_store, engine) = memory_engine(&today).await;
    engine
        .verify(&today.credential(), &today.action.code, &today.staff.id)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_existence_failures() {
    let fixture = EventFixture::free();
    let (_store, engine) = memory_engine(&fixture).await;
    let credential = fixture.credential();
    let code = fixture.action.code.as_str();
    let staff = fixture.staff.id;

    assert_kind(engine.verify("", code, &staff).await, ErrorKind::InvalidInput);
    assert_kind(
        engine.verify(&credential, "  ", &staff).await,
        ErrorKind::InvalidInput,
    );
    assert_kind(
        engine.verify("not a badge", code, &staff).await,
        ErrorKind::InvalidCredential,
    );
    assert_kind(
        engine
            .verify(&ParticipantId::new_v4().to_string(), code, &staff)
            .await,
        ErrorKind::ParticipantNotFound,
    );
    assert_kind(
        engine.verify(&credential, "NO-SUCH-CODE", &staff).await,
        ErrorKind::ActionNotFound,
    );
    assert_kind(
        engine.verify(&credential, &code.to_lowercase(), &staff).await,
        ErrorKind::ActionNotFound,
    );
    assert_kind(
        engine.verify(&credential, code, &UserId::new_v4()).await,
        ErrorKind::VerifierNotFound,
    );
}

#[tokio::test]
async fn test_participant_checked_before_action() {
    let fixture = EventFixture::free();
    let (_store, engine) = memory_engine(&fixture).await;

    let result = engine
        .verify(
            &ParticipantId::new_v4().to_string(),
            "NO-SUCH-CODE",
            &UserId::new_v4(),
        )
        .await;
    assert_kind(result, ErrorKind::ParticipantNotFound);
}

#[tokio::test]
async fn test_inactive_action_denied() {
    let fixture = EventFixture::builder().day_offset(-1).inactive_action().build();
    let (_store, engine) = memory_engine(&fixture).await;

    let result = engine
        .verify(&fixture.credential(), &fixture.action.code, &fixture.staff.id)
        .await;
    assert_kind(result, ErrorKind::ActionInactive);
    assert_kind(
        engine
            .can_verify(&fixture.participant.id, &fixture.action.id)
            .await,
        ErrorKind::ActionInactive,
    );
}

/// An action whose day record is missing.
async fn orphan_action(store: &MemoryStore, fixture: &EventFixture) -> EventAction {
    let action = EventAction {
        id: ActionId::new_v4(),
        event_id: fixture.event.id,
        event_day_id: EventDayId::new_v4(),
        name: "Orphan".into(),
        code: format!("ORPHAN-{}", fixture.event.slug),
        is_active: true,
    };
    store.insert_action(&action).await.unwrap();
    action
}

#[tokio::test]
async fn test_missing_event_day_follows_policy() -> anyhow::Result<()> {
    let fixture = EventFixture::free();
    let store = Arc::new(fixture.in_memory().await?);
    let action = orphan_action(&store, &fixture).await;

    let closed = engine_with(
        store.clone(),
        EngineConfig {
            temporal_gate: TemporalGatePolicy::FailClosed,
            ..Default::default()
        },
    );
    assert_kind(
        closed
            .verify(&fixture.credential(), &action.code, &fixture.staff.id)
            .await,
        ErrorKind::EventNotFound,
    );

    let open = engine_over(store);
    open.verify(&fixture.credential(), &action.code, &fixture.staff.id)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_can_verify_is_a_dry_run() -> anyhow::Result<()> {
    let fixture = EventFixture::paid();
    let (_store, engine) = memory_engine(&fixture).await;

    assert!(engine
        .can_verify(&fixture.participant.id, &fixture.action.id)
        .await?);
    assert!(engine
        .can_verify(&fixture.participant.id, &fixture.action.id)
        .await?);
    assert!(engine
        .history_for_participant(&fixture.participant.id)
        .await?
        .is_empty());

    engine
        .verify(&fixture.credential(), &fixture.action.code, &fixture.staff.id)
        .await?;
    assert_kind(
        engine
            .can_verify(&fixture.participant.id, &fixture.action.id)
            .await,
        ErrorKind::AlreadyVerified,
    );
    assert_kind(
        engine
            .can_verify(&fixture.participant.id, &ActionId::new_v4())
            .await,
        ErrorKind::ActionNotFound,
    );
    Ok(())
}

#[tokio::test]
async fn test_same_participant_other_action_allowed() -> anyhow::Result<()> {
    let fixture = EventFixture::free();
    let (store, engine) = memory_engine(&fixture).await;
    let lunch = fixture.add_action(store.as_ref(), "Lunch").await?;

    engine
        .verify(&fixture.credential(), &fixture.action.code, &fixture.staff.id)
        .await?;
    engine
        .verify(&fixture.credential(), &lunch.code, &fixture.staff.id)
        .await?;

    let history = engine.history_for_participant(&fixture.participant.id).await?;
    assert_eq!(history.len(), 2);
    assert!(history[0].log.verified_at >= history[1].log.verified_at);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_gates_match_model(params: ScenarioParams) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let fixture = EventFixture::builder()
            .ticket_price(params.ticket_price)
            .payment_status(params.payment_status)
            .day_offset(params.day_offset)
            .build();

        let result = runtime.block_on(async {
            let (_store, engine) = memory_engine(&fixture).await;
            engine
                .verify(&fixture.credential(), &fixture.action.code, &fixture.staff.id)
                .await
        });

        if params.admissible() {
            prop_assert!(result.is_ok());
        } else {
            let kind = result.unwrap_err().kind();
            let expected = if params.ticket_price > 0 && params.payment_status != PaymentStatus::Paid {
                ErrorKind::PaymentRequired
            } else {
                ErrorKind::EventNotStarted
            };
            prop_assert_eq!(kind, expected);
        }
    }
}
