mod schema;

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_THEME: &str = "Matcha";
pub const DEFAULT_HOTKEY: &str = "Alt+Shift+P";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub snippet_type: String,
    pub description: String,
    pub content: String,
    pub extension: Option<String>,
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnippet<'a> {
    pub name: &'a str,
    pub snippet_type: &'a str,
    pub description: &'a str,
    pub content: &'a str,
    pub extension: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    pub version: String,
    pub last_updated: String,
}

pub struct Database {
    conn: Mutex<Connection>,
}

const SNIPPET_COLUMNS: &str = "
    id,
    name,
    type,
    description,
    content,
    extension,
    archived
";

// Legacy flag semantics: NULL predates the archived column and means
// not-archived.
const NOT_ARCHIVED: &str = "(archived = 'N' OR archived IS NULL)";

impl Database {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Opens the vault database, creating the file and its parent directory
    /// when absent, and brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            info!("creating vault database at {}", path.display());
        }
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<(), DbError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        conn.execute_batch(schema::CREATE_SNIPPETS_TABLE)?;
        conn.execute_batch(schema::CREATE_HOTKEYS_TABLE)?;
        conn.execute_batch(schema::CREATE_DEFAULT_THEME_TABLE)?;
        conn.execute_batch(schema::CREATE_RELEASE_TABLE)?;
        conn.execute_batch(schema::CREATE_INDEX_TYPE)?;

        // Columns added after the first released schema; older vaults lack
        // them.
        ensure_column(conn, "snippets", "extension", "TEXT")?;
        ensure_column(conn, "snippets", "archived", "TEXT")?;

        conn.execute(
            "INSERT OR IGNORE INTO default_theme (id, theme) VALUES (1, ?1)",
            params![DEFAULT_THEME],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO hotkeys (id, hotkey) VALUES (1, ?1)",
            params![DEFAULT_HOTKEY],
        )?;

        Ok(())
    }

    pub fn list_snippets(
        &self,
        snippet_type: Option<&str>,
        archived: bool,
    ) -> Result<Vec<Snippet>, DbError> {
        let conn = self.conn()?;
        let archive_clause = if archived { "archived = 'Y'" } else { NOT_ARCHIVED };

        let rows = if let Some(snippet_type) = snippet_type {
            let mut stmt = conn.prepare(&format!(
                "
                SELECT {SNIPPET_COLUMNS}
                FROM snippets
                WHERE type = ?1 AND {archive_clause}
                ORDER BY id
                "
            ))?;
            let rows = stmt.query_map(params![snippet_type], snippet_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = conn.prepare(&format!(
                "
                SELECT {SNIPPET_COLUMNS}
                FROM snippets
                WHERE {archive_clause}
                ORDER BY id
                "
            ))?;
            let rows = stmt.query_map([], snippet_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        Ok(rows)
    }

    /// Distinct snippet types for the given archive state, sorted
    /// case-insensitively.
    pub fn snippet_types(&self, archived: bool) -> Result<Vec<String>, DbError> {
        let conn = self.conn()?;
        let archive_clause = if archived { "archived = 'Y'" } else { NOT_ARCHIVED };
        let mut stmt = conn.prepare(&format!(
            "
            SELECT type
            FROM snippets
            WHERE {archive_clause}
            GROUP BY type
            ORDER BY type COLLATE NOCASE
            "
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn insert_snippet(&self, snippet: &NewSnippet<'_>) -> Result<Snippet, DbError> {
        let conn = self.conn()?;
        conn.execute(
            "
            INSERT INTO snippets (name, type, description, content, extension)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                snippet.name,
                snippet.snippet_type,
                snippet.description,
                snippet.content,
                snippet.extension,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(self.get_snippet_internal(&conn, id)?)
    }

    pub fn get_snippet(&self, id: i64) -> Result<Option<Snippet>, DbError> {
        let conn = self.conn()?;
        self.get_snippet_internal(&conn, id)
            .optional()
            .map_err(DbError::from)
    }

    fn get_snippet_internal(&self, conn: &Connection, id: i64) -> Result<Snippet, rusqlite::Error> {
        conn.query_row(
            &format!("SELECT {SNIPPET_COLUMNS} FROM snippets WHERE id = ?1"),
            params![id],
            snippet_from_row,
        )
    }

    /// Full-row replace of every field except the id; the archive flag keeps
    /// its current value.
    pub fn update_snippet(
        &self,
        id: i64,
        snippet: &NewSnippet<'_>,
    ) -> Result<Option<Snippet>, DbError> {
        let conn = self.conn()?;
        conn.execute(
            "
            UPDATE snippets
            SET name = ?1, type = ?2, description = ?3, content = ?4, extension = ?5
            WHERE id = ?6
            ",
            params![
                snippet.name,
                snippet.snippet_type,
                snippet.description,
                snippet.content,
                snippet.extension,
                id,
            ],
        )?;
        self.get_snippet_internal(&conn, id)
            .optional()
            .map_err(DbError::from)
    }

    pub fn delete_snippet(&self, id: i64) -> Result<Option<Snippet>, DbError> {
        let conn = self.conn()?;
        let snippet = self
            .get_snippet_internal(&conn, id)
            .optional()
            .map_err(DbError::from)?;
        if snippet.is_none() {
            return Ok(None);
        }
        conn.execute("DELETE FROM snippets WHERE id = ?1", params![id])?;
        Ok(snippet)
    }

    /// Flags every non-archived snippet of the given type as archived and
    /// returns how many rows changed. The condition is scoped to the type so
    /// legacy NULL rows of other types are left alone.
    pub fn archive_type(&self, snippet_type: &str) -> Result<usize, DbError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            &format!("UPDATE snippets SET archived = 'Y' WHERE type = ?1 AND {NOT_ARCHIVED}"),
            params![snippet_type],
        )?;
        Ok(changed)
    }

    pub fn hotkey(&self) -> Result<String, DbError> {
        let conn = self.conn()?;
        conn.query_row("SELECT hotkey FROM hotkeys WHERE id = 1", [], |row| {
            row.get(0)
        })
        .map_err(DbError::from)
    }

    pub fn set_hotkey(&self, hotkey: &str) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE hotkeys SET hotkey = ?1 WHERE id = 1",
            params![hotkey],
        )?;
        Ok(())
    }

    pub fn default_theme(&self) -> Result<String, DbError> {
        let conn = self.conn()?;
        conn.query_row("SELECT theme FROM default_theme WHERE id = 1", [], |row| {
            row.get(0)
        })
        .map_err(DbError::from)
    }

    pub fn set_default_theme(&self, theme: &str) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE default_theme SET theme = ?1 WHERE id = 1",
            params![theme],
        )?;
        Ok(())
    }

    pub fn release_record(&self) -> Result<Option<ReleaseRecord>, DbError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT release, lst_updt_ts FROM release LIMIT 1",
            [],
            |row| {
                Ok(ReleaseRecord {
                    version: row.get(0)?,
                    last_updated: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(DbError::from)
    }

    pub fn set_release_record(&self, version: &str, date: &str) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM release", [])?;
        conn.execute(
            "INSERT INTO release (release, lst_updt_ts) VALUES (?1, ?2)",
            params![version, date],
        )?;
        Ok(())
    }
}

fn snippet_from_row(row: &Row<'_>) -> Result<Snippet, rusqlite::Error> {
    Ok(Snippet {
        id: row.get(0)?,
        name: row.get(1)?,
        snippet_type: row.get(2)?,
        description: row.get(3)?,
        content: row.get(4)?,
        extension: row.get(5)?,
        archived: row.get::<_, Option<String>>(6)?.as_deref() == Some("Y"),
    })
}

fn ensure_column(
    conn: &Connection,
    table: &str,
    column: &str,
    column_type: &str,
) -> Result<(), DbError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for row in rows {
        if row? == column {
            return Ok(());
        }
    }

    info!("adding missing column {column} to {table}");
    conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {column_type}"))?;
    Ok(())
}
