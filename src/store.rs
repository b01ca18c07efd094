// 🗄️ Store - SQLite persistence for payout bank accounts
// Validates before every write, invalidates instead of deleting, and keeps an
// append-only event log of what happened to each account.

use crate::config::RuntimeContext;
use crate::entities::{AccountNumber, BankAccountInstance};
use crate::error::StoreError;
use crate::registry::BankAccountRegistry;
use crate::validation::validate_against;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type StoreResult<T> = Result<T, StoreError>;

pub const ENTITY_TYPE: &str = "bank_account";

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> StoreResult<()> {
    // WAL for crash recovery (in-memory databases silently keep "memory")
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bank_accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_uuid TEXT UNIQUE NOT NULL,
            user_id TEXT NOT NULL,
            type_code TEXT NOT NULL,
            bank_code TEXT,
            branch_code TEXT,
            account_number TEXT NOT NULL,
            account_number_fingerprint TEXT NOT NULL,
            account_type TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            invalidated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bank_accounts_user ON bank_accounts(user_id, invalidated_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bank_accounts_fingerprint ON bank_accounts(account_number_fingerprint)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

/// SHA-256 of the account number, for duplicate detection without comparing secrets
pub fn fingerprint(account_number: &AccountNumber) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account_number.expose().as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// WRITES
// ============================================================================

/// Validate and insert a new account, invalidating the user's previous ones
///
/// Nothing is written when the type code is unknown, a field is invalid, or the
/// account is already invalidated.
pub fn create_bank_account(
    conn: &mut Connection,
    registry: &BankAccountRegistry,
    account: &BankAccountInstance,
    context: RuntimeContext,
) -> StoreResult<BankAccountInstance> {
    if !account.is_alive() {
        return Err(StoreError::Invalidated(account.id.clone()));
    }

    let rule = registry.lookup(&account.type_code)?;
    validate_against(rule, account, context).map_err(StoreError::Invalid)?;

    let tx = conn.transaction()?;
    let now = Utc::now();

    let superseded: Vec<String> = {
        let mut stmt = tx.prepare(
            "SELECT account_uuid FROM bank_accounts
             WHERE user_id = ?1 AND invalidated_at IS NULL",
        )?;
        let ids = stmt
            .query_map(params![account.user_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        ids
    };

    tx.execute(
        "UPDATE bank_accounts SET invalidated_at = ?1
         WHERE user_id = ?2 AND invalidated_at IS NULL",
        params![now.to_rfc3339(), account.user_id],
    )?;

    for old_id in &superseded {
        insert_event(
            &tx,
            &Event::new(
                "bank_account_invalidated",
                ENTITY_TYPE,
                old_id,
                serde_json::json!({ "superseded_by": account.id }),
                &account.user_id,
            ),
        )?;
    }

    tx.execute(
        "INSERT INTO bank_accounts (
            account_uuid, user_id, type_code, bank_code, branch_code,
            account_number, account_number_fingerprint, account_type,
            created_at, updated_at, invalidated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            account.id,
            account.user_id,
            account.type_code,
            account.bank_code,
            account.branch_code,
            account.account_number.expose(),
            fingerprint(&account.account_number),
            account.account_type,
            account.created_at.to_rfc3339(),
            account.updated_at.to_rfc3339(),
            account.invalidated_at.map(|t| t.to_rfc3339()),
        ],
    )?;

    insert_event(
        &tx,
        &Event::new(
            "bank_account_created",
            ENTITY_TYPE,
            &account.id,
            serde_json::json!({
                "type_code": account.type_code,
                "last_four": account.account_number_last_four(),
            }),
            &account.user_id,
        ),
    )?;

    tx.commit()?;

    tracing::info!(
        account_id = %account.id,
        user_id = %account.user_id,
        type_code = %account.type_code,
        superseded = superseded.len(),
        "bank account created"
    );

    Ok(account.clone())
}

/// Re-validate and save the editable fields of an existing account
///
/// Only the owning user may edit, and only while the account is still live.
pub fn update_bank_account(
    conn: &mut Connection,
    registry: &BankAccountRegistry,
    account: &BankAccountInstance,
    context: RuntimeContext,
) -> StoreResult<()> {
    let stored = get_bank_account(conn, &account.id)?
        .ok_or_else(|| StoreError::NotFound(account.id.clone()))?;

    if stored.user_id != account.user_id {
        return Err(StoreError::NotOwner {
            account_id: stored.id,
            user_id: account.user_id.clone(),
        });
    }

    if !stored.is_alive() {
        return Err(StoreError::Invalidated(stored.id));
    }

    if stored.type_code != account.type_code {
        return Err(StoreError::TypeCodeChanged {
            from: stored.type_code,
            to: account.type_code.clone(),
        });
    }

    let rule = registry.lookup(&account.type_code)?;
    validate_against(rule, account, context).map_err(StoreError::Invalid)?;

    let tx = conn.transaction()?;

    tx.execute(
        "UPDATE bank_accounts SET
            bank_code = ?1, branch_code = ?2, account_number = ?3,
            account_number_fingerprint = ?4, account_type = ?5, updated_at = ?6
         WHERE account_uuid = ?7",
        params![
            account.bank_code,
            account.branch_code,
            account.account_number.expose(),
            fingerprint(&account.account_number),
            account.account_type,
            account.updated_at.to_rfc3339(),
            account.id,
        ],
    )?;

    insert_event(
        &tx,
        &Event::new(
            "bank_account_updated",
            ENTITY_TYPE,
            &account.id,
            serde_json::json!({ "last_four": account.account_number_last_four() }),
            &account.user_id,
        ),
    )?;

    tx.commit()?;

    tracing::info!(account_id = %account.id, "bank account updated");
    Ok(())
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> StoreResult<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

// ============================================================================
// READS
// ============================================================================

const ACCOUNT_COLUMNS: &str = "account_uuid, user_id, type_code, bank_code, branch_code,
    account_number, account_type, created_at, updated_at, invalidated_at";

fn parse_time(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<BankAccountInstance> {
    let account_number: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    let invalidated_at: Option<String> = row.get(9)?;

    Ok(BankAccountInstance {
        id: row.get(0)?,
        user_id: row.get(1)?,
        type_code: row.get(2)?,
        bank_code: row.get(3)?,
        branch_code: row.get(4)?,
        account_number: AccountNumber::new(account_number),
        account_type: row.get(6)?,
        created_at: parse_time(7, &created_at)?,
        updated_at: parse_time(8, &updated_at)?,
        invalidated_at: invalidated_at.map(|t| parse_time(9, &t)).transpose()?,
    })
}

pub fn get_bank_account(conn: &Connection, id: &str) -> StoreResult<Option<BankAccountInstance>> {
    let sql = format!("SELECT {} FROM bank_accounts WHERE account_uuid = ?1", ACCOUNT_COLUMNS);
    let account = conn
        .query_row(&sql, params![id], account_from_row)
        .optional()?;
    Ok(account)
}

/// The user's current payout account, if any
pub fn get_alive_bank_account_for_user(
    conn: &Connection,
    user_id: &str,
) -> StoreResult<Option<BankAccountInstance>> {
    let sql = format!(
        "SELECT {} FROM bank_accounts
         WHERE user_id = ?1 AND invalidated_at IS NULL
         ORDER BY id DESC LIMIT 1",
        ACCOUNT_COLUMNS
    );
    let account = conn
        .query_row(&sql, params![user_id], account_from_row)
        .optional()?;
    Ok(account)
}

/// Every account the user ever registered, oldest first
pub fn get_bank_accounts_for_user(conn: &Connection, user_id: &str) -> StoreResult<Vec<BankAccountInstance>> {
    let sql = format!(
        "SELECT {} FROM bank_accounts WHERE user_id = ?1 ORDER BY id ASC",
        ACCOUNT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let accounts = stmt
        .query_map(params![user_id], account_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(accounts)
}

/// Other users whose live account has the same account number
pub fn other_users_with_account_number(
    conn: &Connection,
    account_number: &AccountNumber,
    user_id: &str,
) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT user_id FROM bank_accounts
         WHERE account_number_fingerprint = ?1 AND user_id != ?2 AND invalidated_at IS NULL
         ORDER BY user_id",
    )?;
    let users = stmt
        .query_map(params![fingerprint(account_number), user_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(users)
}

/// Get events for a specific entity
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> StoreResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_time(1, &timestamp)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// TESTS
// ============================================================================
