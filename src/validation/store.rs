use super::record::{DomainRecord, PersonKey};
use super::Estado;
use crate::error::{LedgerError, Result};
use crate::layout::SacramentKind;
use crate::pipeline::TupleSink;
use crate::types::{PageMeta, TupleCandidate};
use chrono::Utc;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS pages (
    page_id TEXT PRIMARY KEY,
    book_id INTEGER NOT NULL,
    sacrament TEXT NOT NULL,
    columns INTEGER NOT NULL,
    processed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tuples (
    id INTEGER PRIMARY KEY,
    page_id TEXT NOT NULL REFERENCES pages(page_id),
    row_number INTEGER NOT NULL,
    extracted TEXT NOT NULL,
    cells TEXT NOT NULL,
    quality REAL NOT NULL,
    estado TEXT NOT NULL DEFAULT 'pending',
    institution_id INTEGER,
    reviewer_id INTEGER,
    reviewed_at TEXT,
    UNIQUE (page_id, row_number)
);

CREATE INDEX IF NOT EXISTS idx_tuples_page_estado ON tuples(page_id, estado);

CREATE TABLE IF NOT EXISTS persons (
    id INTEGER PRIMARY KEY,
    given_names TEXT NOT NULL,
    paternal_surname TEXT NOT NULL,
    maternal_surname TEXT NOT NULL,
    birth_date TEXT NOT NULL,
    baptism_date TEXT NOT NULL,
    birth_place TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (given_names, paternal_surname, maternal_surname, birth_date, baptism_date)
);

CREATE TABLE IF NOT EXISTS sacraments (
    id INTEGER PRIMARY KEY,
    person_id INTEGER NOT NULL REFERENCES persons(id),
    tuple_id INTEGER NOT NULL UNIQUE REFERENCES tuples(id),
    institution_id INTEGER NOT NULL,
    book_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    sacrament_date TEXT NOT NULL,
    details TEXT NOT NULL,
    reviewer_id INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
";

/// A tuple as persisted, with its page context.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTuple {
    pub id: i64,
    pub page_id: String,
    pub row_number: usize,
    /// Cells as produced by the pipeline.
    pub extracted: Vec<String>,
    /// Current cells; differ from `extracted` once corrected.
    pub cells: Vec<String>,
    pub quality: f32,
    pub estado: Estado,
    pub book_id: i64,
    pub sacrament: SacramentKind,
    pub columns: usize,
}

/// SQLite-backed store of pages, tuples, persons and sacraments.
///
/// Identity columns are the only id generators. All access goes through one
/// mutex-guarded connection; state transitions additionally run inside an
/// IMMEDIATE transaction so other processes sharing the file serialize too.
pub struct LedgerStore {
    conn: Mutex<Connection>,
}

impl LedgerStore {
    /// Open or create a database file with full schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside an IMMEDIATE transaction; commits on `Ok`, rolls back
    /// on `Err`.
    pub(crate) fn immediate<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub fn tuple(&self, tuple_id: i64) -> Result<StoredTuple> {
        self.read(|conn| load_tuple(conn, tuple_id))
    }

    /// Tuples of a page in row order.
    pub fn page_tuples(&self, page_id: &str) -> Result<Vec<StoredTuple>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!("{TUPLE_SELECT} WHERE t.page_id = ? ORDER BY t.row_number"))?;
            let raw = stmt
                .query_map(params![page_id], RawTuple::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            raw.into_iter().map(RawTuple::decode).collect()
        })
    }

    pub fn person_count(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM persons")
    }

    pub fn sacrament_count(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM sacraments")
    }

    fn count(&self, sql: &str) -> Result<usize> {
        self.read(|conn| Ok(conn.query_row(sql, [], |row| row.get::<_, i64>(0))? as usize))
    }

    /// Tuple counts per estado, `None` for an unknown page.
    pub(crate) fn estado_counts(&self, page_id: &str) -> Result<Option<Vec<(Estado, usize)>>> {
        self.read(|conn| {
            let known = conn
                .query_row("SELECT 1 FROM pages WHERE page_id = ?", params![page_id], |_| Ok(()))
                .optional()?;
            if known.is_none() {
                return Ok(None);
            }
            let mut stmt =
                conn.prepare("SELECT estado, COUNT(*) FROM tuples WHERE page_id = ? GROUP BY estado")?;
            let counts = stmt
                .query_map(params![page_id], |row| {
                    Ok((row.get::<_, Estado>(0)?, row.get::<_, i64>(1)? as usize))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Some(counts))
        })
    }
}

// ── Transaction steps used by the validation machine ──────────────────────

const TUPLE_SELECT: &str = "SELECT t.id, t.page_id, t.row_number, t.extracted, t.cells, t.quality, t.estado,
        p.book_id, p.sacrament, p.columns
 FROM tuples t JOIN pages p ON p.page_id = t.page_id";

struct RawTuple {
    id: i64,
    page_id: String,
    row_number: i64,
    extracted: String,
    cells: String,
    quality: f64,
    estado: Estado,
    book_id: i64,
    sacrament: String,
    columns: i64,
}

impl RawTuple {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            page_id: row.get(1)?,
            row_number: row.get(2)?,
            extracted: row.get(3)?,
            cells: row.get(4)?,
            quality: row.get(5)?,
            estado: row.get(6)?,
            book_id: row.get(7)?,
            sacrament: row.get(8)?,
            columns: row.get(9)?,
        })
    }

    fn decode(self) -> Result<StoredTuple> {
        let sacrament = self
            .sacrament
            .parse()
            .map_err(LedgerError::InvalidInput)?;
        Ok(StoredTuple {
            id: self.id,
            page_id: self.page_id,
            row_number: self.row_number as usize,
            extracted: serde_json::from_str(&self.extracted)?,
            cells: serde_json::from_str(&self.cells)?,
            quality: self.quality as f32,
            estado: self.estado,
            book_id: self.book_id,
            sacrament,
            columns: self.columns as usize,
        })
    }
}

pub(crate) fn load_tuple(conn: &Connection, tuple_id: i64) -> Result<StoredTuple> {
    conn.query_row(
        &format!("{TUPLE_SELECT} WHERE t.id = ?"),
        params![tuple_id],
        RawTuple::from_row,
    )
    .optional()?
    .ok_or(LedgerError::TupleNotFound(tuple_id))?
    .decode()
}

pub(crate) fn find_person(conn: &Connection, key: &PersonKey) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM persons
             WHERE given_names = ?1 AND paternal_surname = ?2 AND maternal_surname = ?3
               AND birth_date = ?4 AND baptism_date = ?5",
            params![
                key.given_names,
                key.paternal_surname,
                key.maternal_surname,
                key.birth_date,
                key.baptism_date
            ],
            |row| row.get(0),
        )
        .optional()?)
}

/// Insert the Person/Sacrament pair of a reviewed tuple. Returns both ids.
pub(crate) fn insert_records(
    conn: &Connection,
    tuple: &StoredTuple,
    record: &DomainRecord,
    institution_id: i64,
    reviewer_id: i64,
) -> Result<(i64, i64)> {
    let now = Utc::now().to_rfc3339();
    let key = &record.person;
    conn.execute(
        "INSERT INTO persons (given_names, paternal_surname, maternal_surname, birth_date,
                              baptism_date, birth_place, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            key.given_names,
            key.paternal_surname,
            key.maternal_surname,
            key.birth_date,
            key.baptism_date,
            record.birth_place,
            now
        ],
    )?;
    let person_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO sacraments (person_id, tuple_id, institution_id, book_id, kind,
                                 sacrament_date, details, reviewer_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            person_id,
            tuple.id,
            institution_id,
            tuple.book_id,
            tuple.sacrament.as_str(),
            record.sacrament_date,
            serde_json::to_string(&record.details)?,
            reviewer_id,
            now
        ],
    )?;
    Ok((person_id, conn.last_insert_rowid()))
}

/// Move a pending tuple to `estado`. False when it was no longer pending.
pub(crate) fn finish_tuple(
    conn: &Connection,
    tuple_id: i64,
    estado: Estado,
    cells: &[String],
    institution_id: Option<i64>,
    reviewer_id: i64,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE tuples SET estado = ?1, cells = ?2, institution_id = ?3, reviewer_id = ?4,
                           reviewed_at = ?5
         WHERE id = ?6 AND estado = 'pending'",
        params![
            estado,
            serde_json::to_string(cells)?,
            institution_id,
            reviewer_id,
            Utc::now().to_rfc3339(),
            tuple_id
        ],
    )?;
    Ok(changed == 1)
}

pub(crate) fn next_pending_row(conn: &Connection, page_id: &str) -> Result<Option<usize>> {
    let row: Option<i64> = conn.query_row(
        "SELECT MIN(row_number) FROM tuples WHERE page_id = ? AND estado = 'pending'",
        params![page_id],
        |row| row.get(0),
    )?;
    Ok(row.map(|r| r as usize))
}

/// Back to `pending` for every tuple of the page, dropping the records the
/// page created. Returns the number of tuples that changed state.
pub(crate) fn reset_page(conn: &Connection, page_id: &str) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT s.person_id FROM sacraments s
         JOIN tuples t ON t.id = s.tuple_id WHERE t.page_id = ?",
    )?;
    let person_ids = stmt
        .query_map(params![page_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    drop(stmt);
    let sacraments = conn.execute(
        "DELETE FROM sacraments WHERE tuple_id IN (SELECT id FROM tuples WHERE page_id = ?)",
        params![page_id],
    )?;
    let mut persons = 0;
    for id in person_ids {
        persons += conn.execute(
            "DELETE FROM persons WHERE id = ?1
               AND NOT EXISTS (SELECT 1 FROM sacraments WHERE person_id = ?1)",
            params![id],
        )?;
    }
    let reset = conn.execute(
        "UPDATE tuples SET estado = 'pending', cells = extracted, institution_id = NULL,
                           reviewer_id = NULL, reviewed_at = NULL
         WHERE page_id = ? AND estado != 'pending'",
        params![page_id],
    )?;
    debug!(
        "LedgerStore::reset_page page={page_id} tuples={reset} sacraments={sacraments} persons={persons}"
    );
    Ok(reset)
}

impl TupleSink for LedgerStore {
    fn replace_pending(&self, page: &PageMeta, tuples: &[TupleCandidate]) -> Result<usize> {
        self.immediate(|tx| {
            tx.execute(
                "INSERT INTO pages (page_id, book_id, sacrament, columns, processed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(page_id) DO UPDATE SET
                    book_id = excluded.book_id, sacrament = excluded.sacrament,
                    columns = excluded.columns, processed_at = excluded.processed_at",
                params![
                    page.page_id,
                    page.book_id,
                    page.sacrament.as_str(),
                    page.columns as i64,
                    Utc::now().to_rfc3339()
                ],
            )?;
            let dropped = tx.execute(
                "DELETE FROM tuples WHERE page_id = ? AND estado = 'pending'",
                params![page.page_id],
            )?;
            let mut stored = 0;
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO tuples (page_id, row_number, extracted, cells, quality)
                 VALUES (?1, ?2, ?3, ?3, ?4)",
            )?;
            for t in tuples {
                let cells = serde_json::to_string(&t.texts())?;
                stored += insert.execute(params![
                    page.page_id,
                    t.row_number as i64,
                    cells,
                    t.overall_quality as f64
                ])?;
            }
            debug!(
                "LedgerStore::replace_pending page={} dropped={} stored={}",
                page.page_id, dropped, stored
            );
            Ok(stored)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::CellOutcome;
    use crate::types::CellValue;

    fn candidate(row: usize, texts: &[&str]) -> TupleCandidate {
        TupleCandidate::new(
            row,
            texts
                .iter()
                .map(|t| CellValue {
                    text: t.to_string(),
                    confidence: 0.5,
                    outcome: CellOutcome::Recognized,
                    variant: None,
                })
                .collect(),
        )
    }

    fn meta() -> PageMeta {
        PageMeta {
            page_id: "book1-p1".into(),
            book_id: 1,
            sacrament: SacramentKind::Baptism,
            columns: 2,
        }
    }

    #[test]
    fn resubmission_replaces_pending_tuples() {
        let store = LedgerStore::open_in_memory().unwrap();
        let page = meta();
        assert_eq!(
            store
                .replace_pending(&page, &[candidate(1, &["A", "1"]), candidate(2, &["B", "2"])])
                .unwrap(),
            2
        );
        assert_eq!(store.replace_pending(&page, &[candidate(1, &["A2", "1"])]).unwrap(), 1);
        let tuples = store.page_tuples(&page.page_id).unwrap();
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].cells, vec!["A2", "1"]);
        assert_eq!(tuples[0].estado, Estado::Pending);
        assert_eq!(tuples[0].sacrament, SacramentKind::Baptism);
    }

    #[test]
    fn unknown_tuple_is_not_found() {
        let store = LedgerStore::open_in_memory().unwrap();
        assert!(matches!(store.tuple(42), Err(LedgerError::TupleNotFound(42))));
    }

    #[test]
    fn file_store_persists_between_opens() {
        let path = std::env::temp_dir().join(format!("ledger-store-{}.sqlite", std::process::id()));
        {
            let store = LedgerStore::open(&path).unwrap();
            store.replace_pending(&meta(), &[candidate(1, &["A", "1"])]).unwrap();
        }
        let store = LedgerStore::open(&path).unwrap();
        assert_eq!(store.page_tuples("book1-p1").unwrap().len(), 1);
        drop(store);
        for suffix in ["", "-wal", "-shm"] {
            std::fs::remove_file(format!("{}{suffix}", path.display())).ok();
        }
    }
}
