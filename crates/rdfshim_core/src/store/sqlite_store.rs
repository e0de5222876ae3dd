//! SQLite-backed statement store.
//!
//! # Responsibility
//! - Persist structured statements in the `statements` table.
//! - Answer pattern matches with a lazily paged cursor.
//!
//! # Invariants
//! - Results are ordered by insertion id and fetched `batch_size` rows at a
//!   time; no page is requested after the cursor is dropped.
//! - A row that fails to decode is reported after every earlier row of its
//!   page has been yielded.
//! - Stored and matched resources must be IRIs (`scheme:rest`) or blank
//!   nodes (`_:x`).
//! - One match yields only structured or only raw triples, chosen by
//!   `SqliteMatchOptions::raw_rows`.

use crate::config::{SqliteStoreConfig, StoreLocation};
use crate::db::{open_db, open_db_in_memory};
use crate::model::term::{Literal, Resource, Term};
use crate::model::triple::{RawTriple, Statement, Triple};
use crate::store::{StoreError, StoreResult, TripleIter, TripleStore};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Rows fetched per page when the caller does not set `batch_size`.
pub const DEFAULT_BATCH_SIZE: u32 = 256;

const OBJECT_KIND_RESOURCE: &str = "resource";
const OBJECT_KIND_LITERAL: &str = "literal";

const STATEMENT_SELECT_SQL: &str = "SELECT
    id,
    subject,
    predicate,
    object,
    object_kind,
    datatype,
    language
FROM statements";

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(_:\S+|[A-Za-z][A-Za-z0-9+.\-]*:[^\s<>"{}|\\^`]*)$"#)
        .expect("valid identifier regex")
});

/// Per-call options for [`SqliteTripleStore::match_pattern`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteMatchOptions {
    /// Treat the object matcher as a literal value instead of an identifier.
    pub object_literal: bool,
    /// Yield pre-stringified raw tuples instead of structured statements.
    pub raw_rows: bool,
    /// Rows fetched per page; `None` uses [`DEFAULT_BATCH_SIZE`].
    pub batch_size: Option<u32>,
}

/// Statement store over one owned SQLite connection.
///
/// `Send` but not `Sync`: share it across threads behind a `Mutex`, or give
/// each thread its own store on the same database file.
pub struct SqliteTripleStore {
    conn: Connection,
}

impl SqliteTripleStore {
    /// Inserts one statement. Returns `false` when it was already present.
    pub fn insert(&mut self, statement: &Statement) -> StoreResult<bool> {
        insert_statement(&self.conn, statement)
    }

    /// Inserts statements in one transaction; returns how many were new.
    pub fn insert_all<'a>(
        &mut self,
        statements: impl IntoIterator<Item = &'a Statement>,
    ) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for statement in statements {
            if insert_statement(&tx, statement)? {
                inserted += 1;
            }
        }
        tx.commit()?;

        info!("event=store_load module=store status=ok inserted={inserted}");
        Ok(inserted)
    }

    /// Whether exactly this statement (literal datatype and language
    /// included) is stored.
    pub fn contains(&self, statement: &Statement) -> StoreResult<bool> {
        let key = StatementKey::from_statement(statement);
        let exists = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM statements
                WHERE subject = ?1
                  AND predicate = ?2
                  AND object = ?3
                  AND object_kind = ?4
                  AND IFNULL(datatype, '') = IFNULL(?5, '')
                  AND IFNULL(language, '') = IFNULL(?6, '')
            );",
            params![
                key.subject,
                key.predicate,
                key.object,
                key.object_kind,
                key.datatype,
                key.language,
            ],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(exists == 1)
    }

    /// Deletes one statement. Returns `false` when it was not stored.
    pub fn remove(&mut self, statement: &Statement) -> StoreResult<bool> {
        let key = StatementKey::from_statement(statement);
        let changed = self.conn.execute(
            "DELETE FROM statements
             WHERE subject = ?1
               AND predicate = ?2
               AND object = ?3
               AND object_kind = ?4
               AND IFNULL(datatype, '') = IFNULL(?5, '')
               AND IFNULL(language, '') = IFNULL(?6, '');",
            params![
                key.subject,
                key.predicate,
                key.object,
                key.object_kind,
                key.datatype,
                key.language,
            ],
        )?;

        debug!("event=store_remove module=store status=ok removed={}", changed > 0);
        Ok(changed > 0)
    }

    /// Deletes every statement; returns how many were removed.
    pub fn clear(&mut self) -> StoreResult<usize> {
        let removed = self.conn.execute("DELETE FROM statements;", [])?;
        info!("event=store_clear module=store status=ok removed={removed}");
        Ok(removed)
    }

    /// Number of stored statements.
    pub fn len(&self) -> StoreResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM statements;", [], |row| {
                row.get::<_, i64>(0)
            })?;
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative statement count {count}")))
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl TripleStore for SqliteTripleStore {
    type Init = SqliteStoreConfig;
    type Matcher = String;
    type Options = SqliteMatchOptions;

    fn open(init: Self::Init) -> StoreResult<Self> {
        let conn = match &init.location {
            StoreLocation::File(path) => open_db(path, init.busy_timeout_ms)?,
            StoreLocation::Memory => open_db_in_memory()?,
        };
        Ok(Self { conn })
    }

    fn match_pattern(
        &self,
        subject: Option<&String>,
        predicate: Option<&String>,
        object: Option<&String>,
        options: &SqliteMatchOptions,
    ) -> StoreResult<TripleIter<'_>> {
        let mut sql = format!("{STATEMENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(subject) = subject {
            require_identifier("subject", subject)?;
            sql.push_str(" AND subject = ?");
            bind_values.push(Value::Text(subject.clone()));
        }

        if let Some(predicate) = predicate {
            require_identifier("predicate", predicate)?;
            sql.push_str(" AND predicate = ?");
            bind_values.push(Value::Text(predicate.clone()));
        }

        if let Some(object) = object {
            let kind = if options.object_literal {
                OBJECT_KIND_LITERAL
            } else {
                require_identifier("object", object)?;
                OBJECT_KIND_RESOURCE
            };
            sql.push_str(" AND object = ? AND object_kind = ?");
            bind_values.push(Value::Text(object.clone()));
            bind_values.push(Value::Text(kind.to_string()));
        }

        sql.push_str(" AND id > ? ORDER BY id ASC LIMIT ?;");

        let batch_size = options.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1);
        debug!(
            "event=pattern_match module=store status=start subject_bound={} predicate_bound={} object_bound={} object_literal={} raw_rows={} batch_size={}",
            subject.is_some(),
            predicate.is_some(),
            object.is_some(),
            options.object_literal,
            options.raw_rows,
            batch_size
        );

        Ok(Box::new(StatementCursor {
            conn: &self.conn,
            sql,
            bind_values,
            last_id: 0,
            batch_size,
            raw_rows: options.raw_rows,
            buffered: VecDeque::new(),
            pending_error: None,
            exhausted: false,
        }))
    }
}

/// Keyset-paged cursor over matching statement rows.
///
/// Not a snapshot: each page is a fresh query, so rows committed between
/// pages through another connection show up in later pages.
struct StatementCursor<'conn> {
    conn: &'conn Connection,
    sql: String,
    bind_values: Vec<Value>,
    last_id: i64,
    batch_size: u32,
    raw_rows: bool,
    buffered: VecDeque<StatementRow>,
    pending_error: Option<StoreError>,
    exhausted: bool,
}

impl StatementCursor<'_> {
    /// Buffers the next page. A row decode failure is parked in
    /// `pending_error` so the rows before it are still yielded.
    fn fetch_page(&mut self) -> StoreResult<()> {
        let conn = self.conn;
        let mut stmt = conn.prepare_cached(&self.sql)?;
        let page_values = self
            .bind_values
            .iter()
            .cloned()
            .chain([
                Value::Integer(self.last_id),
                Value::Integer(i64::from(self.batch_size)),
            ]);
        let mut rows = stmt.query(params_from_iter(page_values))?;

        let mut fetched: u32 = 0;
        loop {
            let parsed = match rows.next() {
                Ok(Some(row)) => StatementRow::from_row(row),
                Ok(None) => break,
                Err(err) => Err(err),
            };
            match parsed {
                Ok(parsed) => {
                    self.last_id = parsed.id;
                    self.buffered.push_back(parsed);
                    fetched += 1;
                }
                Err(err) => {
                    self.pending_error = Some(err.into());
                    self.exhausted = true;
                    return Ok(());
                }
            }
        }

        if fetched < self.batch_size {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl Iterator for StatementCursor<'_> {
    type Item = StoreResult<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffered.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }

        match self.buffered.pop_front() {
            Some(row) => Some(row.into_triple(self.raw_rows)),
            None => self.pending_error.take().map(Err),
        }
    }
}

struct StatementRow {
    id: i64,
    subject: String,
    predicate: String,
    object: String,
    object_kind: String,
    datatype: Option<String>,
    language: Option<String>,
}

impl StatementRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            subject: row.get("subject")?,
            predicate: row.get("predicate")?,
            object: row.get("object")?,
            object_kind: row.get("object_kind")?,
            datatype: row.get("datatype")?,
            language: row.get("language")?,
        })
    }

    fn into_triple(self, raw_rows: bool) -> StoreResult<Triple> {
        if raw_rows {
            return Ok(Triple::Raw(RawTriple::new(
                self.subject,
                self.predicate,
                self.object,
            )));
        }

        let object = match self.object_kind.as_str() {
            OBJECT_KIND_RESOURCE => Term::Resource(Resource::from_identifier(&self.object)),
            OBJECT_KIND_LITERAL => Term::Literal(Literal {
                value: self.object,
                datatype: self.datatype,
                language: self.language,
            }),
            other => {
                return Err(StoreError::InvalidData(format!(
                    "invalid object kind `{other}` in statements.object_kind (id {})",
                    self.id
                )));
            }
        };

        Ok(Triple::Structured(Statement {
            subject: Resource::from_identifier(&self.subject),
            predicate: Resource::from_identifier(&self.predicate),
            object,
        }))
    }
}

/// Column values identifying one statement row.
struct StatementKey<'a> {
    subject: String,
    predicate: String,
    object: String,
    object_kind: &'static str,
    datatype: Option<&'a str>,
    language: Option<&'a str>,
}

impl<'a> StatementKey<'a> {
    fn from_statement(statement: &'a Statement) -> Self {
        let (object, object_kind, datatype, language) = match &statement.object {
            Term::Resource(resource) => (resource.to_string(), OBJECT_KIND_RESOURCE, None, None),
            Term::Literal(literal) => (
                literal.value.clone(),
                OBJECT_KIND_LITERAL,
                literal.datatype.as_deref(),
                literal.language.as_deref(),
            ),
        };

        Self {
            subject: statement.subject.to_string(),
            predicate: statement.predicate.to_string(),
            object,
            object_kind,
            datatype,
            language,
        }
    }

    /// Rejects resources that no matcher could select later.
    fn validate(&self) -> StoreResult<()> {
        require_stored_identifier("subject", &self.subject)?;
        require_stored_identifier("predicate", &self.predicate)?;
        if self.object_kind == OBJECT_KIND_RESOURCE {
            require_stored_identifier("object", &self.object)?;
        }
        Ok(())
    }
}

fn insert_statement(conn: &Connection, statement: &Statement) -> StoreResult<bool> {
    let key = StatementKey::from_statement(statement);
    key.validate()?;

    let changed = conn.execute(
        "INSERT OR IGNORE INTO statements (
            subject,
            predicate,
            object,
            object_kind,
            datatype,
            language
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            key.subject,
            key.predicate,
            key.object,
            key.object_kind,
            key.datatype,
            key.language,
        ],
    )?;

    Ok(changed > 0)
}

fn require_stored_identifier(position: &'static str, value: &str) -> StoreResult<()> {
    if IDENTIFIER_RE.is_match(value) {
        return Ok(());
    }
    Err(StoreError::InvalidData(format!(
        "{position} `{value}` is not an IRI or blank node identifier"
    )))
}

fn require_identifier(position: &'static str, value: &str) -> StoreResult<()> {
    if IDENTIFIER_RE.is_match(value) {
        return Ok(());
    }
    Err(StoreError::InvalidMatcher {
        position,
        value: value.to_string(),
    })
}
