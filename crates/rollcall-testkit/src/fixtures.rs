//! Test fixtures and helpers.
//!
//! An [`EventFixture`] is one event with one day, one action, one participant,
//! a staff verifier and an admin. Every name that must be unique (slug, code,
//! emails) carries a random suffix, so many fixtures can share one store.

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use rollcall_core::{
    ActionId, Event, EventAction, EventDay, EventDayId, EventId, Participant, ParticipantId,
    PaymentStatus, Role, User, UserId,
};
use rollcall_store::{MemoryStore, Result, Store};

/// Knobs for an [`EventFixture`].
#[derive(Debug, Clone)]
pub struct EventFixtureBuilder {
    ticket_price: u64,
    payment_status: PaymentStatus,
    day_offset: i64,
    action_active: bool,
}

impl Default for EventFixtureBuilder {
    /// Free event, unpaid participant, day is today, active action.
    fn default() -> Self {
        Self {
            ticket_price: 0,
            payment_status: PaymentStatus::Unpaid,
            day_offset: 0,
            action_active: true,
        }
    }
}

impl EventFixtureBuilder {
    pub fn ticket_price(mut self, price: u64) -> Self {
        self.ticket_price = price;
        self
    }

    pub fn payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = status;
        self
    }

    /// Place the event day `days` from today (UTC). Negative is in the past.
    pub fn day_offset(mut self, days: i64) -> Self {
        self.day_offset = days;
        self
    }

    pub fn inactive_action(mut self) -> Self {
        self.action_active = false;
        self
    }

    pub fn build(self) -> EventFixture {
        let tag = Uuid::new_v4().simple().to_string();
        let tag = &tag[..8];

        let event = Event {
            id: EventId::new_v4(),
            title: format!("Event {}", tag),
            slug: format!("event-{}", tag),
            ticket_price: self.ticket_price,
            is_active: true,
        };
        let day = EventDay {
            id: EventDayId::new_v4(),
            event_id: event.id,
            day_number: 1,
            label: "Day 1".to_string(),
            date: today() + Duration::days(self.day_offset),
        };
        let action = EventAction {
            id: ActionId::new_v4(),
            event_id: event.id,
            event_day_id: day.id,
            name: "Day 1 check-in".to_string(),
            code: format!("CHECKIN-{}", tag.to_uppercase()),
            is_active: self.action_active,
        };
        let participant = Participant {
            id: ParticipantId::new_v4(),
            event_id: event.id,
            name: "Ana Lima".to_string(),
            email: format!("ana-{}@example.com", tag),
            phone: Some("+1 555 0100".to_string()),
            division: Some("Engineering".to_string()),
            payment_status: self.payment_status,
        };
        let staff = User {
            id: UserId::new_v4(),
            email: format!("staff-{}@example.com", tag),
            role: Role::Staff,
        };
        let admin = User {
            id: UserId::new_v4(),
            email: format!("admin-{}@example.com", tag),
            role: Role::Admin,
        };

        EventFixture {
            event,
            day,
            action,
            participant,
            staff,
            admin,
        }
    }
}

/// One seeded event scenario.
#[derive(Debug, Clone)]
pub struct EventFixture {
    pub event: Event,
    pub day: EventDay,
    pub action: EventAction,
    pub participant: Participant,
    pub staff: User,
    pub admin: User,
}

impl EventFixture {
    pub fn builder() -> EventFixtureBuilder {
        EventFixtureBuilder::default()
    }

    /// Paid event, paid participant, day already started.
    pub fn paid() -> Self {
        Self::builder()
            .ticket_price(150_000)
            .payment_status(PaymentStatus::Paid)
            .day_offset(-1)
            .build()
    }

    /// Free event, unpaid participant, day already started.
    pub fn free() -> Self {
        Self::builder().day_offset(-1).build()
    }

    /// Write every record to `store`.
    pub async fn seed<S: Store + ?Sized>(&self, store: &S) -> Result<()> {
        store.insert_event(&self.event).await?;
        store.insert_event_day(&self.day).await?;
        store.insert_action(&self.action).await?;
        store.insert_participant(&self.participant).await?;
        store.insert_user(&self.staff).await?;
        store.insert_user(&self.admin).await?;
        Ok(())
    }

    /// Seed a fresh [`MemoryStore`].
    pub async fn in_memory(&self) -> Result<MemoryStore> {
        let store = MemoryStore::new();
        self.seed(&store).await?;
        Ok(store)
    }

    /// The participant's credential as a QR image path.
    pub fn credential(&self) -> String {
        format!("uploads/qrcodes/{}.png", self.participant.id)
    }

    /// Register another participant for the same event.
    pub async fn add_participant<S: Store + ?Sized>(
        &self,
        store: &S,
        status: PaymentStatus,
    ) -> Result<Participant> {
        let id = ParticipantId::new_v4();
        let participant = Participant {
            id,
            event_id: self.event.id,
            name: format!("Guest {}", &id.to_string()[..8]),
            email: format!("guest-{}@example.com", id),
            phone: None,
            division: None,
            payment_status: status,
        };
        store.insert_participant(&participant).await?;
        Ok(participant)
    }

    /// Add another active action on the same day.
    pub async fn add_action<S: Store + ?Sized>(&self, store: &S, name: &str) -> Result<EventAction> {
        let id = ActionId::new_v4();
        let action = EventAction {
            id,
            event_id: self.event.id,
            event_day_id: self.day.id,
            name: name.to_string(),
            code: format!("ACT-{}", id.as_uuid().simple()),
            is_active: true,
        };
        store.insert_action(&action).await?;
        Ok(action)
    }

    /// Add another staff verifier.
    pub async fn add_staff<S: Store + ?Sized>(&self, store: &S) -> Result<User> {
        let user = User {
            id: UserId::new_v4(),
            email: format!("staff-{}@example.com", Uuid::new_v4().simple()),
            role: Role::Staff,
        };
        store.insert_user(&user).await?;
        Ok(user)
    }
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
