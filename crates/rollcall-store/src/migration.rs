//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT MAX(version) FROM schema_migrations",
            [],
            |row| row.get::<_, Option<u32>>(0),
        )
        .optional()?
        .flatten()
        .unwrap_or(0);

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, Utc::now().timestamp_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
///
/// Ids are hyphenated UUID text, timestamps are Unix ms, dates are ISO text.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE users (
            user_id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL                 -- admin | organizer | staff
        );

        CREATE TABLE events (
            event_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            ticket_price INTEGER NOT NULL DEFAULT 0,   -- minor units, 0 = free
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE event_days (
            event_day_id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL REFERENCES events(event_id),
            day_number INTEGER NOT NULL,
            label TEXT NOT NULL,
            date TEXT NOT NULL,                -- YYYY-MM-DD
            UNIQUE(event_id, day_number)
        );

        CREATE TABLE event_actions (
            action_id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL REFERENCES events(event_id),
            event_day_id TEXT NOT NULL REFERENCES event_days(event_day_id),
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE participants (
            participant_id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL REFERENCES events(event_id),
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            division TEXT,
            payment_status TEXT NOT NULL DEFAULT 'unpaid',
            UNIQUE(event_id, email)
        );

        -- Redemptions: append-only
        CREATE TABLE action_logs (
            redemption_id TEXT PRIMARY KEY,
            participant_id TEXT NOT NULL REFERENCES participants(participant_id),
            action_id TEXT NOT NULL REFERENCES event_actions(action_id),
            verified_by TEXT NOT NULL REFERENCES users(user_id),
            verified_at INTEGER NOT NULL
        );

        -- At most one live redemption per (participant, action)
        CREATE TABLE redemption_claims (
            participant_id TEXT NOT NULL,
            action_id TEXT NOT NULL,
            redemption_id TEXT NOT NULL UNIQUE REFERENCES action_logs(redemption_id),
            PRIMARY KEY (participant_id, action_id)
        );

        -- Compensating markers: append-only, one per redemption
        CREATE TABLE revocations (
            revocation_id TEXT PRIMARY KEY,
            redemption_id TEXT NOT NULL UNIQUE REFERENCES action_logs(redemption_id),
            revoked_by TEXT NOT NULL REFERENCES users(user_id),
            revoked_at INTEGER NOT NULL,
            reason TEXT
        );

        CREATE TRIGGER action_logs_no_update BEFORE UPDATE ON action_logs
        BEGIN
            SELECT RAISE(ABORT, 'action_logs are immutable');
        END;

        CREATE TRIGGER action_logs_no_delete BEFORE DELETE ON action_logs
        BEGIN
            SELECT RAISE(ABORT, 'action_logs are immutable');
        END;

        CREATE TRIGGER revocations_no_update BEFORE UPDATE ON revocations
        BEGIN
            SELECT RAISE(ABORT, 'revocations are immutable');
        END;

        CREATE INDEX idx_participants_event ON participants(event_id);
        CREATE INDEX idx_action_logs_participant ON action_logs(participant_id, verified_at);
        CREATE INDEX idx_action_logs_action ON action_logs(action_id);
        CREATE INDEX idx_action_logs_verified_at ON action_logs(verified_at);
        "#,
    )?;

    Ok(())
}
