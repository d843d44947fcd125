use super::{DocumentBackend, GameDocument};
use crate::error::GameResult;
use rusqlite::{params, Connection, OptionalExtension};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS game_document (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    body        TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);
";

/// Persists the document as one JSON row in an SQLite database.
pub struct SqliteBackend {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl SqliteBackend {
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        let backend = Self {
            conn,
            path: Some(path.to_string()),
        };
        backend.migrate()?;
        Ok(backend)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let backend = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        backend.migrate()?;
        Ok(backend)
    }

    fn migrate(&self) -> GameResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

impl DocumentBackend for SqliteBackend {
    fn load(&mut self) -> GameResult<Option<GameDocument>> {
        let body: Option<String> = self
            .conn
            .query_row("SELECT body FROM game_document WHERE id = 1", [], |r| r.get(0))
            .optional()?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn persist(&mut self, doc: &GameDocument) -> GameResult<()> {
        let body = serde_json::to_string(doc)?;
        self.conn.execute(
            "INSERT INTO game_document (id, body, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![body, crate::types::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.clone().unwrap_or_else(|| ":memory:".into())
    }
}
