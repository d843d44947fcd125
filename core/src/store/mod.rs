//! Single-document persistence layer.
//!
//! RULE: Only the store touches the persisted document.
//! Gameplay code mutates the document through `GameStore::transact`,
//! which runs against a draft copy and commits only on success.
//!
//! The document lives in memory behind one Mutex. It is loaded once at
//! open and persisted after every committed mutation. Storage failures
//! are logged and never propagated: a failed load yields an empty
//! document, a failed persist leaves the in-memory state authoritative.

mod admin;
mod auction;
mod business;
mod json_file;
mod leaderboard;
mod scenario;
mod sqlite;
mod user;

pub use admin::{AdminSettings, BusinessAnalytics, ScenarioTemplate, StoreStatistics};
pub use auction::{Auction, AuctionStatus, Bid};
pub use business::{Business, BusinessStatus, EmploymentMode};
pub use json_file::JsonFileBackend;
pub use leaderboard::{LeaderboardEntry, LEADERBOARD_CAPACITY};
pub use scenario::ScenarioResult;
pub use sqlite::SqliteBackend;
pub use user::User;

use crate::{
    error::GameResult,
    types::{AuctionId, BusinessId, ScenarioResultId, UserId},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

/// The whole persisted game state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameDocument {
    #[serde(default)]
    pub users:          BTreeMap<UserId, User>,
    #[serde(default)]
    pub businesses:     BTreeMap<BusinessId, Business>,
    #[serde(default)]
    pub scenarios:      BTreeMap<ScenarioResultId, ScenarioResult>,
    #[serde(default)]
    pub leaderboard:    Vec<LeaderboardEntry>,
    #[serde(default)]
    pub auctions:       BTreeMap<AuctionId, Auction>,
    #[serde(default)]
    pub admin_settings: AdminSettings,
}

impl GameDocument {
    /// Set each record's id from its map key. Documents may store records
    /// without their own id; the key is authoritative.
    pub fn restore_keys(&mut self) {
        for (id, user) in &mut self.users {
            user.user_id.clone_from(id);
        }
        for (id, business) in &mut self.businesses {
            business.business_id.clone_from(id);
        }
        for (id, result) in &mut self.scenarios {
            result.result_id.clone_from(id);
        }
        for (id, auction) in &mut self.auctions {
            auction.auction_id.clone_from(id);
        }
    }
}

/// Where the document is loaded from and persisted to.
pub trait DocumentBackend: Send {
    /// Read the stored document. `Ok(None)` means nothing stored yet.
    fn load(&mut self) -> GameResult<Option<GameDocument>>;

    fn persist(&mut self, doc: &GameDocument) -> GameResult<()>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}

struct StoreInner {
    doc:     GameDocument,
    backend: Box<dyn DocumentBackend>,
}

pub struct GameStore {
    inner: Mutex<StoreInner>,
}

impl GameStore {
    /// Open a store persisted as a pretty-printed JSON file.
    pub fn open_json(path: &str) -> GameResult<Self> {
        Ok(Self::with_backend(Box::new(JsonFileBackend::new(path))))
    }

    /// Open a store persisted in an SQLite database file.
    pub fn open_sqlite(path: &str) -> GameResult<Self> {
        Ok(Self::with_backend(Box::new(SqliteBackend::open(path)?)))
    }

    /// Open an in-memory SQLite store (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        Ok(Self::with_backend(Box::new(SqliteBackend::in_memory()?)))
    }

    /// Load the document from `backend`, initializing an empty one when
    /// nothing is stored or the stored copy cannot be read.
    pub fn with_backend(mut backend: Box<dyn DocumentBackend>) -> Self {
        let doc = match backend.load() {
            Ok(Some(mut doc)) => {
                doc.restore_keys();
                log::debug!("store: loaded document from {}", backend.describe());
                doc
            }
            Ok(None) => {
                let doc = GameDocument::default();
                if let Err(e) = backend.persist(&doc) {
                    log::warn!("store: cannot initialize {}: {e}", backend.describe());
                }
                log::info!("store: initialized empty document at {}", backend.describe());
                doc
            }
            Err(e) => {
                log::warn!(
                    "store: cannot read {}: {e}; starting from an empty document",
                    backend.describe()
                );
                GameDocument::default()
            }
        };
        Self {
            inner: Mutex::new(StoreInner { doc, backend }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A panic while holding the lock cannot leave a half-written
        // document: mutations only touch a draft.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the whole document.
    pub fn read(&self) -> GameDocument {
        self.lock().doc.clone()
    }

    /// Run a read-only query against the current document.
    pub fn view<T>(&self, f: impl FnOnce(&GameDocument) -> T) -> T {
        f(&self.lock().doc)
    }

    /// Replace the whole document and persist it.
    pub fn write(&self, doc: GameDocument) {
        let mut inner = self.lock();
        inner.doc = doc;
        Self::persist_locked(&mut inner);
    }

    /// Run a mutation against a draft of the document. The draft replaces
    /// the live document only when `f` returns Ok; an Err leaves no trace.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut GameDocument) -> GameResult<T>,
    ) -> GameResult<T> {
        let mut inner = self.lock();
        let mut draft = inner.doc.clone();
        let out = f(&mut draft)?;
        inner.doc = draft;
        Self::persist_locked(&mut inner);
        Ok(out)
    }

    fn persist_locked(inner: &mut StoreInner) {
        let StoreInner { doc, backend } = inner;
        match backend.persist(doc) {
            Ok(()) => log::debug!("store: persisted to {}", backend.describe()),
            Err(e) => log::warn!("store: cannot write {}: {e}", backend.describe()),
        }
    }
}
