use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rusqlite::{params, Connection};

use crate::scraper::ErrorLog;
use crate::table::{ResultTable, IDENTIFIER, RECORD_KEY};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS runs (
            id            TEXT PRIMARY KEY,
            selector_set  TEXT NOT NULL,
            started_at    TEXT NOT NULL,
            finished_at   TEXT NOT NULL,
            found         INTEGER NOT NULL,
            not_found     INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lookups (
            id          INTEGER PRIMARY KEY,
            run_id      TEXT NOT NULL REFERENCES runs(id),
            record_key  TEXT NOT NULL,
            identifier  TEXT,
            status      TEXT NOT NULL CHECK(status IN ('found','not_found')),
            message     TEXT,
            data        TEXT,
            UNIQUE(run_id, record_key)
        );
        CREATE INDEX IF NOT EXISTS idx_lookups_key ON lookups(record_key);
        ",
    )?;
    Ok(())
}

pub struct RunRecord<'a> {
    pub id: &'a str,
    pub selector_set: &'a str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub fn new_run_id(started_at: DateTime<Utc>) -> String {
    started_at.format("run-%Y%m%dT%H%M%S%.3f").to_string()
}

/// Store one finished batch: found rows as JSON objects, not-found rows with their message.
pub fn save_run(
    conn: &mut Connection,
    run: &RunRecord,
    table: &ResultTable,
    errors: &ErrorLog,
) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO runs (id, selector_set, started_at, finished_at, found, not_found)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run.id,
            run.selector_set,
            run.started_at.to_rfc3339(),
            run.finished_at.to_rfc3339(),
            table.len(),
            errors.len(),
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO lookups (run_id, record_key, identifier, status, message, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (i, row) in table.rows().enumerate() {
            let data: IndexMap<&str, Option<&str>> = table
                .columns()
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(Option::as_deref))
                .collect();
            stmt.execute(params![
                run.id,
                table.get(i, RECORD_KEY),
                table.get(i, IDENTIFIER),
                "found",
                Option::<String>::None,
                serde_json::to_string(&data)?,
            ])?;
        }
        for (record_key, message) in errors {
            stmt.execute(params![
                run.id,
                record_key,
                Option::<String>::None,
                "not_found",
                message,
                Option::<String>::None,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

pub struct Stats {
    pub runs: usize,
    pub lookups: usize,
    pub found: usize,
    pub not_found: usize,
    pub distinct_keys: usize,
    pub last_run: Option<String>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let runs: usize = conn.query_row("SELECT COUNT(*) FROM runs", [], |r| r.get(0))?;
    let lookups: usize = conn.query_row("SELECT COUNT(*) FROM lookups", [], |r| r.get(0))?;
    let found: usize = conn.query_row(
        "SELECT COUNT(*) FROM lookups WHERE status = 'found'",
        [],
        |r| r.get(0),
    )?;
    let distinct_keys: usize =
        conn.query_row("SELECT COUNT(DISTINCT record_key) FROM lookups", [], |r| r.get(0))?;
    let last_run: Option<String> =
        conn.query_row("SELECT MAX(finished_at) FROM runs", [], |r| r.get(0))?;
    Ok(Stats {
        runs,
        lookups,
        found,
        not_found: lookups - found,
        distinct_keys,
        last_run,
    })
}
