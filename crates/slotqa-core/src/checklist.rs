//! Checklist data shape
//!
//! A checklist is an ordered map from section key to an ordered list of items.
//! Section order and item order are display order. Persistence stores the
//! checklist as flat [`ChecklistRecord`] rows; [`Checklist::flatten`] and
//! [`Checklist::from_records`] convert between the two shapes.

use crate::{CategoryId, Error, GameId, ItemId, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

wire_enum! {
    /// Verification state of a checklist item
    ChecklistStatus {
        Unchecked => "unchecked",
        Checking => "checking",
        Done => "done",
        Failed => "failed",
        NeedRework => "need-rework",
    }
}

wire_enum! {
    /// Impact tag, independent of completion status
    Severity {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

/// A single QA verification item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Unique within the owning game
    pub id: ItemId,
    pub title: String,
    pub description: String,
    /// Section display label ("Paytable")
    pub category: String,
    /// Required; an item without a status is rejected rather than counted
    pub status: ChecklistStatus,
    /// URL or free-text reference proving the check
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl ChecklistItem {
    /// New unchecked item without evidence or severity
    pub fn new(
        id: impl Into<ItemId>,
        category: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            status: ChecklistStatus::Unchecked,
            evidence: None,
            severity: None,
        }
    }
}

/// Sections of checklist items keyed by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checklist {
    sections: IndexMap<CategoryId, Vec<ChecklistItem>>,
}

impl Checklist {
    /// Create an empty checklist
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section. Items of an existing section are replaced in place.
    pub(crate) fn push_section(&mut self, category: CategoryId, items: Vec<ChecklistItem>) {
        self.sections.insert(category, items);
    }

    pub(crate) fn section_mut(&mut self, category: &CategoryId) -> Option<&mut Vec<ChecklistItem>> {
        self.sections.get_mut(category)
    }

    /// Items of one section
    pub fn section(&self, category: &CategoryId) -> Option<&[ChecklistItem]> {
        self.sections.get(category).map(Vec::as_slice)
    }

    /// Sections in display order
    pub fn sections(&self) -> impl Iterator<Item = (&CategoryId, &[ChecklistItem])> {
        self.sections.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Section keys in display order
    pub fn category_ids(&self) -> impl Iterator<Item = &CategoryId> {
        self.sections.keys()
    }

    /// Look up one item
    pub fn item(&self, category: &CategoryId, item: &ItemId) -> Option<&ChecklistItem> {
        self.section(category)?.iter().find(|i| &i.id == item)
    }

    /// All items across sections, in display order
    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.sections.values().flatten()
    }

    /// Number of sections
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total number of items
    pub fn len(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    /// True when there are no items at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into persistence rows tagged with the owning game
    pub fn flatten(&self, game_id: GameId) -> Vec<ChecklistRecord> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(section_order, (category_id, items))| {
                items
                    .iter()
                    .enumerate()
                    .map(move |(position, item)| {
                        ChecklistRecord::from_item(
                            game_id,
                            category_id,
                            section_order as u32,
                            position as u32,
                            item,
                        )
                    })
            })
            .collect()
    }

    /// Rebuild the nested shape from persistence rows
    ///
    /// Rows may arrive in any order; they are sorted by section order and
    /// position. Unknown status or severity strings and duplicate item ids
    /// fail with [`Error::Validation`].
    pub fn from_records(records: impl IntoIterator<Item = ChecklistRecord>) -> Result<Self> {
        let mut records: Vec<ChecklistRecord> = records.into_iter().collect();
        records.sort_by_key(|r| (r.section_order, r.position));

        let mut seen = HashSet::new();
        let mut checklist = Checklist::new();
        for record in records {
            if !seen.insert(record.item_id.clone()) {
                return Err(Error::Validation(format!(
                    "duplicate checklist item '{}'",
                    record.item_id
                )));
            }
            let category_id = record.category_id.clone();
            let item = record.into_item()?;
            checklist.sections.entry(category_id).or_default().push(item);
        }
        Ok(checklist)
    }
}

/// Flat persistence form of one checklist item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistRecord {
    pub game_id: GameId,
    pub category_id: CategoryId,
    /// Index of the section within the checklist
    pub section_order: u32,
    /// Index of the item within its section
    pub position: u32,
    pub item_id: ItemId,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Raw status string as stored
    pub status: String,
    pub evidence: Option<String>,
    /// Raw severity string as stored
    pub severity: Option<String>,
}

impl ChecklistRecord {
    /// Build a row from a nested item
    pub fn from_item(
        game_id: GameId,
        category_id: &CategoryId,
        section_order: u32,
        position: u32,
        item: &ChecklistItem,
    ) -> Self {
        Self {
            game_id,
            category_id: category_id.clone(),
            section_order,
            position,
            item_id: item.id.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            status: item.status.as_str().to_string(),
            evidence: item.evidence.clone(),
            severity: item.severity.map(|s| s.as_str().to_string()),
        }
    }

    /// Parse the row back into an item
    pub fn into_item(self) -> Result<ChecklistItem> {
        if self.status.is_empty() {
            return Err(Error::Validation(format!(
                "checklist item '{}' has no status",
                self.item_id
            )));
        }
        let status = self.status.parse::<ChecklistStatus>()?;
        let severity = self
            .severity
            .as_deref()
            .map(str::parse::<Severity>)
            .transpose()?;
        Ok(ChecklistItem {
            id: self.item_id,
            title: self.title,
            description: self.description,
            category: self.category,
            status,
            evidence: self.evidence,
            severity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Checklist {
        let mut checklist = Checklist::new();
        checklist.push_section(
            CategoryId::new("reels"),
            vec![
                ChecklistItem::new("reels-01", "Reels & Symbols", "Grid renders", ""),
                ChecklistItem::new("reels-02", "Reels & Symbols", "Reels stop", ""),
            ],
        );
        checklist.push_section(
            CategoryId::new("paytable"),
            vec![ChecklistItem::new("paytable-01", "Paytable", "Lines listed", "")],
        );
        checklist
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(ChecklistStatus::NeedRework.as_str(), "need-rework");
        assert_eq!(
            "need-rework".parse::<ChecklistStatus>().unwrap(),
            ChecklistStatus::NeedRework
        );
        assert_eq!(ChecklistStatus::ALL.len(), 5);
    }

    #[test]
    fn test_unknown_status_is_validation_error() {
        let err = "finished".parse::<ChecklistStatus>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_counts_and_lookup() {
        let checklist = sample();
        assert_eq!(checklist.len(), 3);
        assert_eq!(checklist.section_count(), 2);
        let item = checklist
            .item(&CategoryId::new("reels"), &ItemId::new("reels-02"))
            .unwrap();
        assert_eq!(item.title, "Reels stop");
        assert!(checklist
            .item(&CategoryId::new("paytable"), &ItemId::new("reels-02"))
            .is_none());
    }

    #[test]
    fn test_flatten_and_rebuild_preserves_order() {
        let mut checklist = sample();
        checklist.section_mut(&CategoryId::new("reels")).unwrap()[1].status =
            ChecklistStatus::Failed;
        checklist.section_mut(&CategoryId::new("reels")).unwrap()[1].severity =
            Some(Severity::High);

        let mut records = checklist.flatten(GameId::new(9));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.game_id == GameId::new(9)));

        // Storage hands rows back in arbitrary order
        records.reverse();
        let rebuilt = Checklist::from_records(records).unwrap();
        assert_eq!(rebuilt, checklist);
        let keys: Vec<_> = rebuilt.category_ids().map(|c| c.as_str()).collect();
        assert_eq!(keys, vec!["reels", "paytable"]);
    }

    #[test]
    fn test_rebuild_rejects_missing_status() {
        let mut records = sample().flatten(GameId::new(1));
        records[0].status = String::new();
        let err = Checklist::from_records(records).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_rebuild_rejects_bad_severity() {
        let mut records = sample().flatten(GameId::new(1));
        records[2].severity = Some("urgent".to_string());
        assert!(matches!(
            Checklist::from_records(records),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_rebuild_rejects_duplicate_items() {
        let mut records = sample().flatten(GameId::new(1));
        records[1].item_id = ItemId::new("reels-01");
        assert!(Checklist::from_records(records).is_err());
    }

    #[test]
    fn test_json_item_without_status_rejected() {
        let json = r#"{
            "paytable": [
                {"id": "paytable-01", "title": "Lines listed", "description": "",
                 "category": "Paytable", "status": "done"},
                {"id": "paytable-02", "title": "Payouts match", "description": "",
                 "category": "Paytable"}
            ]
        }"#;
        let err = serde_json::from_str::<Checklist>(json).unwrap_err();
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn test_json_shape_is_category_map() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["paytable"][0]["status"], "unchecked");
        assert_eq!(json["reels"][1]["id"], "reels-02");
    }
}
