//! Incidence record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the record-store primitives the reconciliation engine and the
//!   matrix projector build on.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `UNIQUE(target_key, date)` backs every write path; no API here can
//!   create a second record for the same key.
//! - `insert_if_absent` resolves existence and insertion in one SQL
//!   statement, so concurrent callers cannot race between check and write.

use crate::model::incidence::{Incidence, NewIncidence};
use crate::model::state::StateCode;
use crate::repo::{ensure_schema, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const INCIDENCE_COLUMNS: &str = "id,
    target_key,
    display_name,
    date,
    state,
    area_code,
    created_at,
    updated_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Record-store contract for attendance incidences.
///
/// The engine's conflict handling is built from two atomic halves instead of
/// a find-then-write sequence: `insert_if_absent` (create) and
/// `overwrite_state` (update). Either is a single SQL statement keyed on
/// `(target_key, date)`.
pub trait IncidenceStore {
    /// Looks up the record for one `(target, date)` cell.
    fn find_by_key(&self, target_key: &str, date: NaiveDate) -> RepoResult<Option<Incidence>>;

    /// Inserts the record unless the cell is already occupied.
    ///
    /// Returns `Some(record)` with the freshly created row, or `None` when
    /// a record for the key already existed (which is left untouched).
    fn insert_if_absent(&self, new: &NewIncidence) -> RepoResult<Option<Incidence>>;

    /// Overwrites the state of an existing cell.
    ///
    /// Returns `false` when no record exists for the key.
    fn overwrite_state(
        &self,
        target_key: &str,
        date: NaiveDate,
        state: &StateCode,
    ) -> RepoResult<bool>;

    /// Counts records owned by `area_code` within the inclusive date range.
    fn count_existing(&self, area_code: &str, start: NaiveDate, end: NaiveDate)
        -> RepoResult<u64>;

    /// Fetches all records for the given target keys within the inclusive
    /// date range, ordered by `(target_key, date)`.
    fn list_for_targets(
        &self,
        target_keys: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Incidence>>;
}

/// SQLite-backed incidence store.
pub struct SqliteIncidenceStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIncidenceStore<'conn> {
    /// Builds a store after verifying the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "incidences",
            &[
                "id",
                "target_key",
                "display_name",
                "date",
                "state",
                "area_code",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl IncidenceStore for SqliteIncidenceStore<'_> {
    fn find_by_key(&self, target_key: &str, date: NaiveDate) -> RepoResult<Option<Incidence>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INCIDENCE_COLUMNS} FROM incidences
             WHERE target_key = ?1 AND date = ?2;"
        ))?;

        let mut rows = stmt.query(params![target_key, date_to_db(date)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_incidence_row(row)?));
        }

        Ok(None)
    }

    fn insert_if_absent(&self, new: &NewIncidence) -> RepoResult<Option<Incidence>> {
        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO incidences (target_key, display_name, date, state, area_code)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(target_key, date) DO NOTHING
             RETURNING {INCIDENCE_COLUMNS};"
        ))?;

        let mut rows = stmt.query(params![
            new.target_key.as_str(),
            new.display_name.as_str(),
            date_to_db(new.date),
            new.state.as_str(),
            new.area_code.as_str(),
        ])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(parse_incidence_row(row)?));
        }

        Ok(None)
    }

    fn overwrite_state(
        &self,
        target_key: &str,
        date: NaiveDate,
        state: &StateCode,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE incidences
             SET
                state = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE target_key = ?2 AND date = ?3;",
            params![state.as_str(), target_key, date_to_db(date)],
        )?;

        Ok(changed > 0)
    }

    fn count_existing(
        &self,
        area_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM incidences
             WHERE area_code = ?1 AND date BETWEEN ?2 AND ?3;",
            params![area_code, date_to_db(start), date_to_db(end)],
            |row| row.get(0),
        )?;

        Ok(count as u64)
    }

    fn list_for_targets(
        &self,
        target_keys: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Incidence>> {
        if target_keys.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; target_keys.len()].join(", ");
        let sql = format!(
            "SELECT {INCIDENCE_COLUMNS} FROM incidences
             WHERE date BETWEEN ? AND ?
               AND target_key IN ({placeholders})
             ORDER BY target_key ASC, date ASC;"
        );

        let mut bind_values: Vec<Value> = Vec::with_capacity(target_keys.len() + 2);
        bind_values.push(Value::Text(date_to_db(start)));
        bind_values.push(Value::Text(date_to_db(end)));
        for key in target_keys {
            bind_values.push(Value::Text(key.clone()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_incidence_row(row)?);
        }

        Ok(records)
    }
}

fn parse_incidence_row(row: &Row<'_>) -> RepoResult<Incidence> {
    let date_text: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date value `{date_text}` in incidences.date"))
    })?;

    Ok(Incidence {
        id: row.get("id")?,
        target_key: row.get("target_key")?,
        display_name: row.get("display_name")?,
        date,
        state: StateCode::new(row.get::<_, String>("state")?),
        area_code: row.get("area_code")?,
        created_at_ms: row.get("created_at")?,
        updated_at_ms: row.get("updated_at")?,
    })
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
