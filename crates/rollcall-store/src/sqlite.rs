//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend for Rollcall. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use rollcall_core::{
    ActionId, ActionLog, Event, EventAction, EventDay, EventDayId, EventId, Participant,
    ParticipantId, PaymentStatus, RedemptionId, RedemptionRecord, Revocation, RevocationId, Role,
    User, UserId,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    ActionLogFilter, ActionLogStore, EventStore, EventSummary, InsertResult, ParticipantStore,
    RevokeResult, UserStore,
};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "opened sqlite store");
        Self::init(conn)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection on the blocking pool.
    async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }
}

// Column codecs

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn get_id<T: From<Uuid>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map(T::from)
        .map_err(|e| conversion_error(idx, Type::Text, e))
}

fn get_opt_id<T: From<Uuid>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => Uuid::parse_str(&text)
            .map(|u| Some(T::from(u)))
            .map_err(|e| conversion_error(idx, Type::Text, e)),
        None => Ok(None),
    }
}

fn get_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    from_millis(millis).ok_or_else(|| {
        conversion_error(
            idx,
            Type::Integer,
            StoreError::InvalidData(format!("timestamp out of range: {}", millis)),
        )
    })
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| conversion_error(idx, Type::Text, e))
}

fn to_sql_i64(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| StoreError::InvalidData(format!("{} too large: {}", what, value)))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Map a uniqueness violation on a seeding insert to `Conflict`.
fn seed_insert(result: rusqlite::Result<usize>, entity: &'static str, key: String) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(StoreError::conflict(entity, key)),
        Err(e) => Err(e.into()),
    }
}

// Row mappers

const USER_COLUMNS: &str = "user_id, email, role";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(2)?;
    Ok(User {
        id: get_id(row, 0)?,
        email: row.get(1)?,
        role: role
            .parse::<Role>()
            .map_err(|e| conversion_error(2, Type::Text, e))?,
    })
}

const EVENT_COLUMNS: &str = "event_id, title, slug, ticket_price, is_active";

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    let price: i64 = row.get(3)?;
    Ok(Event {
        id: get_id(row, 0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        ticket_price: u64::try_from(price).map_err(|e| conversion_error(3, Type::Integer, e))?,
        is_active: row.get(4)?,
    })
}

const DAY_COLUMNS: &str = "event_day_id, event_id, day_number, label, date";

fn row_to_day(row: &Row<'_>) -> rusqlite::Result<EventDay> {
    Ok(EventDay {
        id: get_id(row, 0)?,
        event_id: get_id(row, 1)?,
        day_number: row.get(2)?,
        label: row.get(3)?,
        date: get_date(row, 4)?,
    })
}

const ACTION_COLUMNS: &str = "action_id, event_id, event_day_id, name, code, is_active";

fn row_to_action(row: &Row<'_>) -> rusqlite::Result<EventAction> {
    Ok(EventAction {
        id: get_id(row, 0)?,
        event_id: get_id(row, 1)?,
        event_day_id: get_id(row, 2)?,
        name: row.get(3)?,
        code: row.get(4)?,
        is_active: row.get(5)?,
    })
}

const PARTICIPANT_COLUMNS: &str =
    "participant_id, event_id, name, email, phone, division, payment_status";

fn row_to_participant(row: &Row<'_>) -> rusqlite::Result<Participant> {
    let status: String = row.get(6)?;
    Ok(Participant {
        id: get_id(row, 0)?,
        event_id: get_id(row, 1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        division: row.get(5)?,
        payment_status: status
            .parse::<PaymentStatus>()
            .map_err(|e| conversion_error(6, Type::Text, e))?,
    })
}

/// Log columns joined with the optional revocation.
const RECORD_SELECT: &str = "SELECT l.redemption_id, l.participant_id, l.action_id, \
     l.verified_by, l.verified_at, r.revocation_id, r.revoked_by, r.revoked_at, r.reason \
     FROM action_logs l \
     LEFT JOIN revocations r ON r.redemption_id = l.redemption_id";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<RedemptionRecord> {
    let log = ActionLog {
        id: get_id(row, 0)?,
        participant_id: get_id(row, 1)?,
        action_id: get_id(row, 2)?,
        verified_by: get_id(row, 3)?,
        verified_at: get_time(row, 4)?,
    };
    let revocation = match get_opt_id::<RevocationId>(row, 5)? {
        Some(id) => Some(Revocation {
            id,
            redemption_id: log.id,
            revoked_by: get_id(row, 6)?,
            revoked_at: get_time(row, 7)?,
            reason: row.get(8)?,
        }),
        None => None,
    };
    Ok(RedemptionRecord { log, revocation })
}

fn row_to_revocation(row: &Row<'_>) -> rusqlite::Result<Revocation> {
    Ok(Revocation {
        id: get_id(row, 0)?,
        redemption_id: get_id(row, 1)?,
        revoked_by: get_id(row, 2)?,
        revoked_at: get_time(row, 3)?,
        reason: row.get(4)?,
    })
}

fn query_revocation(conn: &Connection, redemption_id: &str) -> Result<Option<Revocation>> {
    Ok(conn
        .query_row(
            "SELECT revocation_id, redemption_id, revoked_by, revoked_at, reason
             FROM revocations WHERE redemption_id = ?1",
            params![redemption_id],
            row_to_revocation,
        )
        .optional()?)
}

/// Shared predicate for event listings. Parameters:
/// ?1 event, ?2 from, ?3 to, ?4 action, ?5 verifier, ?6 include revoked.
const EVENT_FILTER: &str = "JOIN participants p ON p.participant_id = l.participant_id \
     WHERE p.event_id = ?1 \
       AND (?2 IS NULL OR l.verified_at >= ?2) \
       AND (?3 IS NULL OR l.verified_at <= ?3) \
       AND (?4 IS NULL OR l.action_id = ?4) \
       AND (?5 IS NULL OR l.verified_by = ?5) \
       AND (?6 OR r.revocation_id IS NULL)";

/// Live redemptions of one event. ?1 is the event.
const LIVE_EVENT_LOGS: &str = "FROM action_logs l \
     JOIN participants p ON p.participant_id = l.participant_id \
     LEFT JOIN revocations r ON r.redemption_id = l.redemption_id \
     WHERE p.event_id = ?1 AND r.revocation_id IS NULL";

#[async_trait]
impl ParticipantStore for SqliteStore {
    async fn insert_participant(&self, participant: &Participant) -> Result<()> {
        let p = participant.clone();
        self.call(move |conn| {
            let result = conn.execute(
                &format!(
                    "INSERT INTO participants ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    PARTICIPANT_COLUMNS
                ),
                params![
                    p.id.to_string(),
                    p.event_id.to_string(),
                    p.name,
                    p.email,
                    p.phone,
                    p.division,
                    p.payment_status.as_str(),
                ],
            );
            seed_insert(result, "participant", p.email.clone())
        })
        .await
    }

    async fn get_participant(&self, id: &ParticipantId) -> Result<Option<Participant>> {
        let id = id.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {} FROM participants WHERE participant_id = ?1",
                        PARTICIPANT_COLUMNS
                    ),
                    params![id],
                    row_to_participant,
                )
                .optional()?)
        })
        .await
    }

    async fn get_participant_by_email(
        &self,
        email: &str,
        event_id: &EventId,
    ) -> Result<Option<Participant>> {
        let email = email.to_string();
        let event_id = event_id.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {} FROM participants WHERE event_id = ?1 AND email = ?2",
                        PARTICIPANT_COLUMNS
                    ),
                    params![event_id, email],
                    row_to_participant,
                )
                .optional()?)
        })
        .await
    }

    async fn count_participants(&self, event_id: &EventId) -> Result<u64> {
        let event_id = event_id.to_string();
        self.call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM participants WHERE event_id = ?1",
                params![event_id],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn update_payment_status(
        &self,
        id: &ParticipantId,
        status: PaymentStatus,
    ) -> Result<()> {
        let id = id.to_string();
        self.call(move |conn| {
            let changed = conn.execute(
                "UPDATE participants SET payment_status = ?2 WHERE participant_id = ?1",
                params![id, status.as_str()],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found("participant", id));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let e = event.clone();
        self.call(move |conn| {
            let price = to_sql_i64(e.ticket_price, "ticket price")?;
            let result = conn.execute(
                &format!("INSERT INTO events ({}) VALUES (?1, ?2, ?3, ?4, ?5)", EVENT_COLUMNS),
                params![e.id.to_string(), e.title, e.slug, price, e.is_active],
            );
            seed_insert(result, "event", e.slug.clone())
        })
        .await
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>> {
        let id = id.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM events WHERE event_id = ?1", EVENT_COLUMNS),
                    params![id],
                    row_to_event,
                )
                .optional()?)
        })
        .await
    }

    async fn get_event_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let slug = slug.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM events WHERE slug = ?1", EVENT_COLUMNS),
                    params![slug],
                    row_to_event,
                )
                .optional()?)
        })
        .await
    }

    async fn insert_event_day(&self, day: &EventDay) -> Result<()> {
        let d = day.clone();
        self.call(move |conn| {
            let result = conn.execute(
                &format!("INSERT INTO event_days ({}) VALUES (?1, ?2, ?3, ?4, ?5)", DAY_COLUMNS),
                params![
                    d.id.to_string(),
                    d.event_id.to_string(),
                    d.day_number,
                    d.label,
                    d.date.format("%Y-%m-%d").to_string(),
                ],
            );
            seed_insert(result, "event day", format!("{}#{}", d.event_id, d.day_number))
        })
        .await
    }

    async fn get_event_day(&self, id: &EventDayId) -> Result<Option<EventDay>> {
        let id = id.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM event_days WHERE event_day_id = ?1", DAY_COLUMNS),
                    params![id],
                    row_to_day,
                )
                .optional()?)
        })
        .await
    }

    async fn insert_action(&self, action: &EventAction) -> Result<()> {
        let a = action.clone();
        self.call(move |conn| {
            let result = conn.execute(
                &format!(
                    "INSERT INTO event_actions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    ACTION_COLUMNS
                ),
                params![
                    a.id.to_string(),
                    a.event_id.to_string(),
                    a.event_day_id.to_string(),
                    a.name,
                    a.code,
                    a.is_active,
                ],
            );
            seed_insert(result, "action", a.code.clone())
        })
        .await
    }

    async fn get_action(&self, id: &ActionId) -> Result<Option<EventAction>> {
        let id = id.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM event_actions WHERE action_id = ?1", ACTION_COLUMNS),
                    params![id],
                    row_to_action,
                )
                .optional()?)
        })
        .await
    }

    async fn get_action_by_code(&self, code: &str) -> Result<Option<EventAction>> {
        let code = code.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM event_actions WHERE code = ?1", ACTION_COLUMNS),
                    params![code],
                    row_to_action,
                )
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let u = user.clone();
        self.call(move |conn| {
            let result = conn.execute(
                &format!("INSERT INTO users ({}) VALUES (?1, ?2, ?3)", USER_COLUMNS),
                params![u.id.to_string(), u.email, u.role.as_str()],
            );
            seed_insert(result, "user", u.email.clone())
        })
        .await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let id = id.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS),
                    params![id],
                    row_to_user,
                )
                .optional()?)
        })
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                    params![email],
                    row_to_user,
                )
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl ActionLogStore for SqliteStore {
    async fn has_live_redemption(
        &self,
        participant_id: &ParticipantId,
        action_id: &ActionId,
    ) -> Result<bool> {
        let participant_id = participant_id.to_string();
        let action_id = action_id.to_string();
        self.call(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM redemption_claims WHERE participant_id = ?1 AND action_id = ?2",
                    params![participant_id, action_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn insert_action_log(&self, log: &ActionLog) -> Result<InsertResult> {
        let log = log.clone();
        self.call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let participant_id = log.participant_id.to_string();
            let action_id = log.action_id.to_string();

            // Claim check and insert share the write transaction.
            let existing: Option<RedemptionId> = tx
                .query_row(
                    "SELECT redemption_id FROM redemption_claims
                     WHERE participant_id = ?1 AND action_id = ?2",
                    params![participant_id, action_id],
                    |row| get_id(row, 0),
                )
                .optional()?;

            if let Some(existing) = existing {
                return Ok(InsertResult::AlreadyExists { existing });
            }

            let inserted = tx.execute(
                "INSERT INTO action_logs (
                    redemption_id, participant_id, action_id, verified_by, verified_at
                ) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    log.id.to_string(),
                    participant_id,
                    action_id,
                    log.verified_by.to_string(),
                    log.verified_at.timestamp_millis(),
                ],
            );
            seed_insert(inserted, "redemption", log.id.to_string())?;

            let claimed = tx.execute(
                "INSERT INTO redemption_claims (participant_id, action_id, redemption_id)
                 VALUES (?1, ?2, ?3)",
                params![participant_id, action_id, log.id.to_string()],
            );
            match claimed {
                Ok(_) => {}
                // Another connection won the claim; dropping tx rolls back the log.
                Err(e) if is_unique_violation(&e) => {
                    let existing: RedemptionId = tx.query_row(
                        "SELECT redemption_id FROM redemption_claims
                         WHERE participant_id = ?1 AND action_id = ?2",
                        params![participant_id, action_id],
                        |row| get_id(row, 0),
                    )?;
                    return Ok(InsertResult::AlreadyExists { existing });
                }
                Err(e) => return Err(e.into()),
            }

            tx.commit()?;
            Ok(InsertResult::Inserted)
        })
        .await
    }

    async fn get_action_log(&self, id: &RedemptionId) -> Result<Option<RedemptionRecord>> {
        let id = id.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!("{} WHERE l.redemption_id = ?1", RECORD_SELECT),
                    params![id],
                    row_to_record,
                )
                .optional()?)
        })
        .await
    }

    async fn list_by_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<RedemptionRecord>> {
        let participant_id = participant_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE l.participant_id = ?1
                 ORDER BY l.verified_at DESC, l.redemption_id DESC",
                RECORD_SELECT
            ))?;
            let records = stmt
                .query_map(params![participant_id], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
    }

    async fn list_by_event(
        &self,
        event_id: &EventId,
        filter: &ActionLogFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<RedemptionRecord>, u64)> {
        let event_id = event_id.to_string();
        let filter = filter.clone();
        self.call(move |conn| {
            let from = filter.date_from.map(|t| t.timestamp_millis());
            let to = filter.date_to.map(|t| t.timestamp_millis());
            let action = filter.action_id.map(|id| id.to_string());
            let verifier = filter.verifier_id.map(|id| id.to_string());
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);

            let total: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM action_logs l
                     LEFT JOIN revocations r ON r.redemption_id = l.redemption_id {}",
                    EVENT_FILTER
                ),
                params![event_id, from, to, action, verifier, filter.include_revoked],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "{} {} ORDER BY l.verified_at DESC, l.redemption_id DESC LIMIT ?7 OFFSET ?8",
                RECORD_SELECT, EVENT_FILTER
            ))?;
            let records = stmt
                .query_map(
                    params![
                        event_id,
                        from,
                        to,
                        action,
                        verifier,
                        filter.include_revoked,
                        limit,
                        offset
                    ],
                    row_to_record,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((records, total.max(0) as u64))
        })
        .await
    }

    async fn event_summary(
        &self,
        event_id: &EventId,
        offset: FixedOffset,
    ) -> Result<EventSummary> {
        let event_id = event_id.to_string();
        self.call(move |conn| {
            let (total, unique, last): (i64, i64, Option<i64>) = conn.query_row(
                &format!(
                    "SELECT COUNT(*), COUNT(DISTINCT l.participant_id), MAX(l.verified_at) {}",
                    LIVE_EVENT_LOGS
                ),
                params![event_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT l.action_id, COUNT(*) {} GROUP BY l.action_id",
                LIVE_EVENT_LOGS
            ))?;
            let by_action = stmt
                .query_map(params![event_id], |row| {
                    Ok((get_id::<ActionId>(row, 0)?, row.get::<_, i64>(1)?.max(0) as u64))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(&format!(
                "SELECT l.verified_by, COUNT(*) {} GROUP BY l.verified_by",
                LIVE_EVENT_LOGS
            ))?;
            let by_verifier = stmt
                .query_map(params![event_id], |row| {
                    Ok((get_id::<UserId>(row, 0)?, row.get::<_, i64>(1)?.max(0) as u64))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            // Bucket by local calendar day: shift epoch seconds by the offset.
            let mut stmt = conn.prepare(&format!(
                "SELECT date(l.verified_at / 1000 + ?2, 'unixepoch') AS day, COUNT(*) {}
                 GROUP BY day",
                LIVE_EVENT_LOGS
            ))?;
            let by_day = stmt
                .query_map(params![event_id, offset.local_minus_utc()], |row| {
                    Ok((get_date(row, 0)?, row.get::<_, i64>(1)?.max(0) as u64))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let last_verified_at = match last {
                Some(ms) => Some(from_millis(ms).ok_or_else(|| {
                    StoreError::InvalidData(format!("timestamp out of range: {}", ms))
                })?),
                None => None,
            };

            let mut summary = EventSummary {
                total: total.max(0) as u64,
                unique_participants: unique.max(0) as u64,
                by_action,
                by_verifier,
                by_day,
                last_verified_at,
            };
            summary.sort();
            Ok(summary)
        })
        .await
    }

    async fn insert_revocation(&self, revocation: &Revocation) -> Result<RevokeResult> {
        let revocation = revocation.clone();
        self.call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let redemption_id = revocation.redemption_id.to_string();

            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM action_logs WHERE redemption_id = ?1",
                    params![redemption_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::not_found("redemption", redemption_id));
            }

            if let Some(existing) = query_revocation(&tx, &redemption_id)? {
                return Ok(RevokeResult::AlreadyRevoked { existing });
            }

            tx.execute(
                "INSERT INTO revocations (
                    revocation_id, redemption_id, revoked_by, revoked_at, reason
                ) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    revocation.id.to_string(),
                    redemption_id,
                    revocation.revoked_by.to_string(),
                    revocation.revoked_at.timestamp_millis(),
                    revocation.reason,
                ],
            )?;
            tx.execute(
                "DELETE FROM redemption_claims WHERE redemption_id = ?1",
                params![redemption_id],
            )?;

            tx.commit()?;
            Ok(RevokeResult::Revoked)
        })
        .await
    }

    async fn get_revocation(&self, redemption_id: &RedemptionId) -> Result<Option<Revocation>> {
        let redemption_id = redemption_id.to_string();
        self.call(move |conn| query_revocation(conn, &redemption_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    struct Seed {
        event: Event,
        action: EventAction,
        participant: Participant,
        staff: User,
    }

    async fn seed(store: &SqliteStore) -> Seed {
        let event = Event {
            id: EventId::new_v4(),
            title: "Tech Summit".into(),
            slug: "tech-summit".into(),
            ticket_price: 150_000,
            is_active: true,
        };
        let day = EventDay {
            id: EventDayId::new_v4(),
            event_id: event.id,
            day_number: 1,
            label: "Day 1".into(),
            date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
        };
        let action = EventAction {
            id: ActionId::new_v4(),
            event_id: event.id,
            event_day_id: day.id,
            name: "Lunch".into(),
            code: "LUNCH-D1".into(),
            is_active: true,
        };
        let participant = Participant {
            id: ParticipantId::new_v4(),
            event_id: event.id,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: Some("+100".into()),
            division: None,
            payment_status: PaymentStatus::Paid,
        };
        let staff = User {
            id: UserId::new_v4(),
            email: "staff@example.com".into(),
            role: Role::Staff,
        };
        store.insert_event(&event).await.unwrap();
        store.insert_event_day(&day).await.unwrap();
        store.insert_action(&action).await.unwrap();
        store.insert_participant(&participant).await.unwrap();
        store.insert_user(&staff).await.unwrap();
        Seed {
            event,
            action,
            participant,
            staff,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_seed_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let seed = seed(&store).await;

        assert_eq!(
            store.get_event(&seed.event.id).await.unwrap(),
            Some(seed.event.clone())
        );
        assert_eq!(
            store.get_event_by_slug("tech-summit").await.unwrap(),
            Some(seed.event.clone())
        );
        assert_eq!(
            store.get_action_by_code("LUNCH-D1").await.unwrap(),
            Some(seed.action.clone())
        );
        assert!(store.get_action_by_code("lunch-d1").await.unwrap().is_none());
        assert_eq!(
            store.get_participant(&seed.participant.id).await.unwrap(),
            Some(seed.participant.clone())
        );
        assert_eq!(
            store.get_user_by_email("staff@example.com").await.unwrap(),
            Some(seed.staff.clone())
        );
        assert_eq!(store.count_participants(&seed.event.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let store = SqliteStore::open_memory().unwrap();
        let seed = seed(&store).await;
        let clash = EventAction {
            id: ActionId::new_v4(),
            ..seed.action.clone()
        };
        let err = store.insert_action(&clash).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let store = SqliteStore::open_memory().unwrap();
        let seed = seed(&store).await;
        let first = ActionLog::new(seed.participant.id, seed.action.id, seed.staff.id, at(9));
        let second = ActionLog::new(seed.participant.id, seed.action.id, seed.staff.id, at(10));

        assert_eq!(
            store.insert_action_log(&first).await.unwrap(),
            InsertResult::Inserted
        );
        assert_eq!(
            store.insert_action_log(&second).await.unwrap(),
            InsertResult::AlreadyExists { existing: first.id }
        );

        let record = store.get_action_log(&first.id).await.unwrap().unwrap();
        assert_eq!(record.log, first);
        assert!(store.get_action_log(&second.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revocation_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let seed = seed(&store).await;
        let log = ActionLog::new(seed.participant.id, seed.action.id, seed.staff.id, at(9));
        store.insert_action_log(&log).await.unwrap();

        let revocation = Revocation {
            id: RevocationId::new_v4(),
            redemption_id: log.id,
            revoked_by: seed.staff.id,
            revoked_at: at(10),
            reason: Some("double scan".into()),
        };
        assert_eq!(
            store.insert_revocation(&revocation).await.unwrap(),
            RevokeResult::Revoked
        );
        assert_eq!(
            store.insert_revocation(&revocation).await.unwrap(),
            RevokeResult::AlreadyRevoked {
                existing: revocation.clone()
            }
        );
        assert!(!store
            .has_live_redemption(&seed.participant.id, &seed.action.id)
            .await
            .unwrap());

        let record = store.get_action_log(&log.id).await.unwrap().unwrap();
        assert_eq!(record.revocation, Some(revocation.clone()));
        assert_eq!(
            store.get_revocation(&log.id).await.unwrap(),
            Some(revocation)
        );

        let missing = Revocation {
            id: RevocationId::new_v4(),
            redemption_id: RedemptionId::new_v4(),
            revoked_by: seed.staff.id,
            revoked_at: at(10),
            reason: None,
        };
        assert!(matches!(
            store.insert_revocation(&missing).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_and_summary() {
        let store = SqliteStore::open_memory().unwrap();
        let seed = seed(&store).await;

        let mut logs = Vec::new();
        for i in 0..3u32 {
            let p = Participant {
                id: ParticipantId::new_v4(),
                email: format!("p{i}@example.com"),
                ..seed.participant.clone()
            };
            store.insert_participant(&p).await.unwrap();
            let log = ActionLog::new(p.id, seed.action.id, seed.staff.id, at(20 + i));
            store.insert_action_log(&log).await.unwrap();
            logs.push(log);
        }
        store
            .insert_revocation(&Revocation {
                id: RevocationId::new_v4(),
                redemption_id: logs[0].id,
                revoked_by: seed.staff.id,
                revoked_at: at(23),
                reason: None,
            })
            .await
            .unwrap();

        let (records, total) = store
            .list_by_event(&seed.event.id, &ActionLogFilter::default(), 0, 20)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(records[0].log.id, logs[2].id);

        let with_revoked = ActionLogFilter {
            include_revoked: true,
            ..Default::default()
        };
        let (records, total) = store
            .list_by_event(&seed.event.id, &with_revoked, 2, 1)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_revoked());

        // From 21:00 UTC on it is already the next day at UTC+3.
        let summary = store
            .event_summary(&seed.event.id, FixedOffset::east_opt(3 * 3600).unwrap())
            .await
            .unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.unique_participants, 2);
        assert_eq!(summary.by_action, vec![(seed.action.id, 2)]);
        assert_eq!(summary.last_verified_at, Some(logs[2].verified_at));
        assert_eq!(
            summary.by_day,
            vec![(NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(), 2)]
        );
    }

    #[tokio::test]
    async fn test_payment_status_update() {
        let store = SqliteStore::open_memory().unwrap();
        let seed = seed(&store).await;
        store
            .update_payment_status(&seed.participant.id, PaymentStatus::Pending)
            .await
            .unwrap();
        let p = store.get_participant(&seed.participant.id).await.unwrap().unwrap();
        assert_eq!(p.payment_status, PaymentStatus::Pending);

        let err = store
            .update_payment_status(&ParticipantId::new_v4(), PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rollcall.db");

        let (seed, log) = {
            let store = SqliteStore::open(&path).unwrap();
            let seed = seed(&store).await;
            let log = ActionLog::new(
                seed.participant.id,
                seed.action.id,
                seed.staff.id,
                at(9) + Duration::milliseconds(123),
            );
            store.insert_action_log(&log).await.unwrap();
            (seed, log)
        };

        let store = SqliteStore::open(&path).unwrap();
        let history = store.list_by_participant(&seed.participant.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].log, log);
    }
}
