//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use chrono::{DateTime, Utc};
use native_db::*;
use slotqa_core::{
    apply_item_update, apply_section_status, records::require_text, Catalog, CategoryId,
    Checklist, ChecklistRecord, ChecklistStatus, Game, GameId, ItemId, ItemUpdate, NewGame,
};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredGame>().unwrap();
    models.define::<StoredChecklistItem>().unwrap();
    models.define::<StoredBug>().unwrap();
    models.define::<StoredFunctionalTest>().unwrap();
    models.define::<StoredRegressionTest>().unwrap();
    models.define::<StoredUser>().unwrap();
    models.define::<StoredSession>().unwrap();
    models.define::<StoredSequence>().unwrap();
    models
});

/// Database store for QA tracking data.
///
/// Opening the store is the one-time initialization step; there is no lazy
/// setup on first query.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        info!(path = %path.as_ref().display(), "opened database");
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Hand out the next ID of a sequence.
    pub(crate) fn allocate_id(&self, sequence: &str) -> Result<u64> {
        let rw = self.db.rw_transaction()?;
        let current: Option<StoredSequence> = rw.get().primary(sequence.to_string())?;
        let id = current.map(|s| s.next).unwrap_or(1);
        rw.upsert(StoredSequence {
            name: sequence.to_string(),
            next: id + 1,
        })?;
        rw.commit()?;
        Ok(id)
    }

    /// Create a game and store its generated checklist.
    ///
    /// The checklist is generated before anything is written, so an unknown
    /// package leaves the database untouched.
    pub fn create_game(
        &self,
        catalog: &Catalog,
        new: &NewGame,
        now: DateTime<Utc>,
    ) -> Result<(Game, Checklist)> {
        let now = stored_time(now);
        let name = require_text("name", &new.name)?;
        let checklist = catalog.generate_checklist(new.package_id.as_str())?;

        let game = Game {
            id: GameId::new(self.allocate_id("games")?),
            name,
            package_id: new.package_id.clone(),
            created_at: now,
        };

        let rw = self.db.rw_transaction()?;
        rw.insert(StoredGame::from_game(&game))?;
        for record in checklist.flatten(game.id) {
            rw.insert(StoredChecklistItem::from_record(&record))?;
        }
        rw.commit()?;

        info!(game = %game.id, package = %game.package_id, items = checklist.len(), "created game");
        Ok((game, checklist))
    }

    /// Load a game by ID.
    pub fn game(&self, id: GameId) -> Result<Game> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredGame> = r.get().primary(id.raw())?;
        stored
            .map(|s| s.to_game())
            .ok_or_else(|| Error::not_found("Game", id.raw()))
    }

    /// Load all games, oldest first.
    pub fn games(&self) -> Result<Vec<Game>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredGame>()?;
        let iter = scan.all()?;
        let games: std::result::Result<Vec<StoredGame>, _> = iter.collect();
        let games = games.map_err(|e| Error::Database(e.to_string()))?;
        Ok(games.into_iter().map(|g| g.to_game()).collect())
    }

    /// Rename a game. The package stays fixed.
    pub fn rename_game(&self, id: GameId, name: &str) -> Result<Game> {
        let name = require_text("name", name)?;
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredGame> = rw.get().primary(id.raw())?;
        let mut stored = stored.ok_or_else(|| Error::not_found("Game", id.raw()))?;
        stored.name = name;
        rw.upsert(stored.clone())?;
        rw.commit()?;
        Ok(stored.to_game())
    }

    /// Delete a game together with its checklist, bugs and tests.
    pub fn delete_game(&self, id: GameId) -> Result<()> {
        // Make sure the game exists before collecting dependents
        self.game(id)?;

        let items = self.checklist_rows(id)?;
        let bugs = self.stored_bugs(id)?;
        let functional = self.stored_functional_tests(id)?;
        let regression = self.stored_regression_tests(id)?;

        let rw = self.db.rw_transaction()?;
        let (item_count, bug_count) = (items.len(), bugs.len());
        let test_count = functional.len() + regression.len();
        for item in items {
            rw.remove(item)?;
        }
        for bug in bugs {
            rw.remove(bug)?;
        }
        for test in functional {
            rw.remove(test)?;
        }
        for test in regression {
            rw.remove(test)?;
        }
        if let Some(game) = rw.get().primary::<StoredGame>(id.raw())? {
            rw.remove(game)?;
        }
        rw.commit()?;

        info!(
            game = %id,
            items = item_count,
            bugs = bug_count,
            tests = test_count,
            "deleted game"
        );
        Ok(())
    }

    /// Stored checklist rows of a game, in no particular order.
    pub(crate) fn checklist_rows(&self, id: GameId) -> Result<Vec<StoredChecklistItem>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredChecklistItem>(StoredChecklistItemKey::game_id)?;
        let iter = scan.start_with(id.raw())?;
        let rows: std::result::Result<Vec<StoredChecklistItem>, _> = iter.collect();
        rows.map_err(|e| Error::Database(e.to_string()))
    }

    /// Load the nested checklist of a game.
    pub fn checklist(&self, id: GameId) -> Result<Checklist> {
        self.game(id)?;
        let rows = self.checklist_rows(id)?;
        Checklist::from_records(rows.iter().map(|r| r.to_record())).map_err(Error::corrupt)
    }

    /// Write checklist rows. Each row overwrites the stored one (last write wins).
    pub fn save_checklist_records(&self, records: &[ChecklistRecord]) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        for record in records {
            rw.upsert(StoredChecklistItem::from_record(record))?;
        }
        rw.commit()?;
        Ok(())
    }

    /// Apply an item update and persist it.
    ///
    /// Returns the checklist as re-read from the database after the write.
    pub fn update_checklist_item(
        &self,
        id: GameId,
        category: &CategoryId,
        item: &ItemId,
        update: &ItemUpdate,
    ) -> Result<Checklist> {
        let current = self.checklist(id)?;
        let updated = apply_item_update(&current, category, item, update)?;
        let changed: Vec<ChecklistRecord> = updated
            .flatten(id)
            .into_iter()
            .filter(|r| &r.category_id == category && &r.item_id == item)
            .collect();
        self.save_checklist_records(&changed)?;
        debug!(game = %id, %category, %item, "updated checklist item");
        self.checklist(id)
    }

    /// Set every item of one section to `status` and persist it.
    pub fn update_section_status(
        &self,
        id: GameId,
        category: &CategoryId,
        status: ChecklistStatus,
    ) -> Result<Checklist> {
        let current = self.checklist(id)?;
        let updated = apply_section_status(&current, category, status)?;
        let changed: Vec<ChecklistRecord> = updated
            .flatten(id)
            .into_iter()
            .filter(|r| &r.category_id == category)
            .collect();
        self.save_checklist_records(&changed)?;
        debug!(game = %id, %category, %status, "updated checklist section");
        self.checklist(id)
    }
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}
