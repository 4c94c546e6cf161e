//! Game and checklist models for database storage.

use super::{from_millis, to_millis};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use slotqa_core::{CategoryId, ChecklistRecord, Game, GameId, ItemId, PackageId};

/// Stored game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredGame {
    /// Primary key - game ID.
    #[primary_key]
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Catalog package the checklist was generated from.
    pub package_id: String,
    /// Creation time (Unix ms).
    pub created_at: i64,
}

impl StoredGame {
    /// Create from a Game.
    pub fn from_game(game: &Game) -> Self {
        Self {
            id: game.id.raw(),
            name: game.name.clone(),
            package_id: game.package_id.as_str().to_string(),
            created_at: to_millis(game.created_at),
        }
    }

    /// Convert to a Game.
    pub fn to_game(&self) -> Game {
        Game {
            id: GameId::new(self.id),
            name: self.name.clone(),
            package_id: PackageId::new(self.package_id.clone()),
            created_at: from_millis(self.created_at),
        }
    }
}

/// Stored checklist item, one row per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredChecklistItem {
    /// Primary key - composite of game ID and item ID.
    #[primary_key]
    pub key: String,
    /// Owning game.
    #[secondary_key]
    pub game_id: u64,
    /// Section key.
    pub category_id: String,
    /// Section index within the checklist.
    pub section_order: u32,
    /// Item index within the section.
    pub position: u32,
    /// Item ID, unique within the game.
    pub item_id: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Section label.
    pub category: String,
    /// Status wire name.
    pub status: String,
    /// Evidence reference.
    pub evidence: Option<String>,
    /// Severity wire name.
    pub severity: Option<String>,
}

impl StoredChecklistItem {
    /// Primary key for an item of a game.
    pub fn make_key(game_id: GameId, item_id: &ItemId) -> String {
        format!("{}/{}", game_id.raw(), item_id)
    }

    /// Create from a checklist record.
    pub fn from_record(record: &ChecklistRecord) -> Self {
        Self {
            key: Self::make_key(record.game_id, &record.item_id),
            game_id: record.game_id.raw(),
            category_id: record.category_id.as_str().to_string(),
            section_order: record.section_order,
            position: record.position,
            item_id: record.item_id.as_str().to_string(),
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            status: record.status.clone(),
            evidence: record.evidence.clone(),
            severity: record.severity.clone(),
        }
    }

    /// Convert to a checklist record.
    pub fn to_record(&self) -> ChecklistRecord {
        ChecklistRecord {
            game_id: GameId::new(self.game_id),
            category_id: CategoryId::new(self.category_id.clone()),
            section_order: self.section_order,
            position: self.position,
            item_id: ItemId::new(self.item_id.clone()),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            status: self.status.clone(),
            evidence: self.evidence.clone(),
            severity: self.severity.clone(),
        }
    }
}

/// Stored ID sequence, one row per record kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 8, version = 1)]
#[native_db]
pub struct StoredSequence {
    /// Primary key - sequence name ("games", "bugs", ...).
    #[primary_key]
    pub name: String,
    /// Next ID to hand out.
    pub next: u64,
}
