//! SQLite-backed document store
//!
//! Each collection is a table of JSON documents keyed by `_id`. Filters and
//! sorts run on `json_extract` expressions, with expression indexes covering
//! the two hot paths: messages by topic and date, topics by list and
//! activity.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, anyhow};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use rusqlite_migration::{M, Migrations};
use serde_json::Value;

use super::traits::{Collection, Direction, DocumentStore, Filter, Query};
use crate::error::{ArchiveError, Result};
use crate::models::Document;

/// Database migrations
///
/// Each migration is applied in order. The user_version pragma tracks which
/// migrations have been applied.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // Migration 1: Initial schema
        M::up(
            r#"
            CREATE TABLE lists (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            CREATE TABLE topics (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            -- Paginated topic listing: filter by list, newest activity first
            CREATE INDEX idx_topics_source_end
                ON topics(json_extract(doc, '$.source'), json_extract(doc, '$.end') DESC);

            CREATE INDEX idx_topics_end
                ON topics(json_extract(doc, '$.end') DESC);

            CREATE TABLE messages (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            -- Messages of a topic in date order
            CREATE INDEX idx_messages_subject_date
                ON messages(json_extract(doc, '$.subjectToken'), json_extract(doc, '$.date'));

            -- Dedup ledger: existence of the row is the record
            CREATE TABLE processed (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );
            "#,
        ),
    ])
}

/// SQLite-based document store
pub struct SqliteDocumentStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) a document store at the given path
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        // WAL lets readers proceed during writes; NORMAL sync is safe with WAL
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run database migrations")?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock().unwrap();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(ArchiveError::Transport(anyhow!("document store is closed"))),
        }
    }
}

/// SQL expression selecting a top-level field of the stored document
///
/// Field names are inlined (so expression indexes apply) and therefore
/// restricted to `[A-Za-z0-9_]`.
fn field_expr(field: &str) -> Result<String> {
    if field == "_id" {
        return Ok("id".to_string());
    }
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ArchiveError::validation(format!(
            "Unsupported field name in query: '{field}'"
        )));
    }
    Ok(format!("json_extract(doc, '$.{field}')"))
}

/// Convert a JSON filter value to the value `json_extract` yields for it
fn sql_value(value: &Value) -> Option<SqlValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        other => Some(SqlValue::Text(other.to_string())),
    }
}

/// Build a WHERE clause and its parameters for a filter
fn where_clause(filter: &Filter) -> Result<(String, Vec<SqlValue>)> {
    if filter.conditions().is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut clauses = Vec::with_capacity(filter.conditions().len());
    let mut params = Vec::new();
    for (field, value) in filter.conditions() {
        let expr = field_expr(field)?;
        match sql_value(value) {
            Some(v) => {
                clauses.push(format!("{expr} = ?"));
                params.push(v);
            }
            None => clauses.push(format!("{expr} IS NULL")),
        }
    }

    Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
}

fn decode(collection: Collection, id: &str, raw: &str) -> Result<Document> {
    serde_json::from_str(raw)
        .with_context(|| format!("Malformed document {id} in {collection}"))
        .map_err(ArchiveError::Transport)
}

impl DocumentStore for SqliteDocumentStore {
    fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>> {
        let (where_sql, mut params) = where_clause(&query.filter)?;

        // rowid is insertion order; upserts keep it, so ties stay stable
        let order_sql = match &query.sort {
            Some(sort) => {
                let dir = match sort.direction {
                    Direction::Ascending => "ASC",
                    Direction::Descending => "DESC",
                };
                format!(" ORDER BY {} {dir}, rowid ASC", field_expr(&sort.field)?)
            }
            None => " ORDER BY rowid ASC".to_string(),
        };

        let limit = query
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let offset = i64::try_from(query.skip).unwrap_or(i64::MAX);
        params.push(SqlValue::Integer(limit));
        params.push(SqlValue::Integer(offset));

        let sql = format!(
            "SELECT id, doc FROM {}{where_sql}{order_sql} LIMIT ? OFFSET ?",
            collection.name()
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.iter()
                .map(|(id, raw)| decode(collection, id, raw))
                .collect()
        })
    }

    fn upsert(&self, collection: Collection, id: &str, mut doc: Document) -> Result<()> {
        doc.insert("_id".to_string(), Value::String(id.to_string()));
        let raw = serde_json::to_string(&doc)?;

        // ON CONFLICT DO UPDATE keeps the rowid (and so the natural order)
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET doc = excluded.doc",
            collection.name()
        );

        self.with_conn(|conn| {
            conn.execute(&sql, rusqlite::params![id, raw])?;
            Ok(())
        })
    }

    fn count(&self, collection: Collection, filter: &Filter) -> Result<usize> {
        let (where_sql, params) = where_clause(filter)?;
        let sql = format!("SELECT COUNT(*) FROM {}{where_sql}", collection.name());

        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    fn close(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap().take();
        match conn {
            Some(conn) => {
                log::info!("[STORE] Closing document store");
                conn.close().map_err(|(_, e)| ArchiveError::from(e))
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self.conn.lock().map(|c| c.is_some()).unwrap_or(false);
        f.debug_struct("SqliteDocumentStore")
            .field("open", &open)
            .finish()
    }
}
