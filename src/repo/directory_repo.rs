//! Directory lookups: area tree and active worker rosters.
//!
//! # Responsibility
//! - Provide the roster/area contracts the population resolver and matrix
//!   projector consume.
//! - Keep ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - Rosters contain only active workers, ordered `display_name ASC, id ASC`.
//! - `child_areas` descends exactly one level and never returns the parent
//!   itself, so a self-referencing parent link cannot loop.

use crate::model::area::Area;
use crate::model::worker::WorkerRef;
use crate::repo::{ensure_schema, RepoResult};
use rusqlite::{Connection, OptionalExtension, Row};

/// Roster contract: who is currently active in an area.
pub trait RosterLookup {
    fn active_workers_for_area(&self, area_code: &str) -> RepoResult<Vec<WorkerRef>>;
}

/// Area-tree contract.
pub trait AreaLookup {
    fn area(&self, code: &str) -> RepoResult<Option<Area>>;

    /// Direct children of `code`: areas whose `parent_code` equals it.
    fn child_areas(&self, code: &str) -> RepoResult<Vec<Area>>;
}

/// SQLite-backed directory over the `areas` and `workers` tables.
pub struct SqliteDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectory<'conn> {
    /// Builds a directory after verifying the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, "areas", &["code", "name", "parent_code"])?;
        ensure_schema(
            conn,
            "workers",
            &["id", "ci", "display_name", "email", "area_code", "is_active"],
        )?;
        Ok(Self { conn })
    }
}

impl RosterLookup for SqliteDirectory<'_> {
    fn active_workers_for_area(&self, area_code: &str) -> RepoResult<Vec<WorkerRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ci, display_name, email, area_code
             FROM workers
             WHERE area_code = ?1 AND is_active = 1
             ORDER BY display_name ASC, id ASC;",
        )?;

        let mut rows = stmt.query([area_code])?;
        let mut workers = Vec::new();
        while let Some(row) = rows.next()? {
            workers.push(parse_worker_row(row)?);
        }

        Ok(workers)
    }
}

impl AreaLookup for SqliteDirectory<'_> {
    fn area(&self, code: &str) -> RepoResult<Option<Area>> {
        let area = self
            .conn
            .query_row(
                "SELECT code, name, parent_code FROM areas WHERE code = ?1;",
                [code],
                parse_area_row,
            )
            .optional()?;

        Ok(area)
    }

    fn child_areas(&self, code: &str) -> RepoResult<Vec<Area>> {
        let mut stmt = self.conn.prepare(
            "SELECT code, name, parent_code
             FROM areas
             WHERE parent_code = ?1 AND code <> ?1
             ORDER BY code ASC;",
        )?;

        let mut rows = stmt.query([code])?;
        let mut areas = Vec::new();
        while let Some(row) = rows.next()? {
            areas.push(parse_area_row(row)?);
        }

        Ok(areas)
    }
}

fn parse_worker_row(row: &Row<'_>) -> Result<WorkerRef, rusqlite::Error> {
    Ok(WorkerRef {
        id: row.get("id")?,
        ci: row.get("ci")?,
        display_name: row.get("display_name")?,
        email: row.get("email")?,
        area_code: row.get("area_code")?,
    })
}

fn parse_area_row(row: &Row<'_>) -> Result<Area, rusqlite::Error> {
    let parent_code: Option<String> = row.get("parent_code")?;
    Ok(Area::new(
        row.get::<_, String>("code")?,
        row.get::<_, String>("name")?,
        parent_code,
    ))
}
