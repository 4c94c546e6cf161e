//! Targeted checklist updates
//!
//! Updates never modify the input snapshot: the item (or section) is located
//! first, and only then is a new checklist produced. A bad category or item id
//! is an error rather than a silent no-op. Status transitions are unrestricted.

use crate::{CategoryId, Checklist, ChecklistItem, ChecklistStatus, Error, ItemId, Result, Severity};
use serde::{Deserialize, Deserializer, Serialize};

/// Partial update of one checklist item
///
/// `None` leaves a field untouched. For `evidence` and `severity`,
/// `Some(None)` clears the field; in JSON this is an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChecklistStatus>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub evidence: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub severity: Option<Option<Severity>>,
}

/// Maps a present field (even `null`) to `Some`
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ItemUpdate {
    /// Update that only sets the status
    pub fn status(status: ChecklistStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Set evidence; blank text clears it
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(Some(evidence.into()));
        self
    }

    /// Set or clear severity
    pub fn with_severity(mut self, severity: Option<Severity>) -> Self {
        self.severity = Some(severity);
        self
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.evidence.is_none() && self.severity.is_none()
    }

    /// Merge into a copy of `item`
    pub fn apply_to(&self, item: &ChecklistItem) -> ChecklistItem {
        let mut merged = item.clone();
        if let Some(status) = self.status {
            merged.status = status;
        }
        if let Some(evidence) = &self.evidence {
            merged.evidence = evidence
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string);
        }
        if let Some(severity) = self.severity {
            merged.severity = severity;
        }
        merged
    }
}

fn locate(checklist: &Checklist, category: &CategoryId, item: &ItemId) -> Result<usize> {
    let section = checklist
        .section(category)
        .ok_or_else(|| Error::CategoryNotFound(category.to_string()))?;
    section
        .iter()
        .position(|i| &i.id == item)
        .ok_or_else(|| Error::ItemNotFound {
            category: category.to_string(),
            item: item.to_string(),
        })
}

/// Return a new checklist with one item merged with `update`
pub fn apply_item_update(
    checklist: &Checklist,
    category: &CategoryId,
    item: &ItemId,
    update: &ItemUpdate,
) -> Result<Checklist> {
    let index = locate(checklist, category, item)?;
    let mut next = checklist.clone();
    if let Some(section) = next.section_mut(category) {
        let merged = update.apply_to(&section[index]);
        section[index] = merged;
    }
    Ok(next)
}

/// Return a new checklist with every item of one section set to `status`
pub fn apply_section_status(
    checklist: &Checklist,
    category: &CategoryId,
    status: ChecklistStatus,
) -> Result<Checklist> {
    if checklist.section(category).is_none() {
        return Err(Error::CategoryNotFound(category.to_string()));
    }
    let mut next = checklist.clone();
    if let Some(section) = next.section_mut(category) {
        for item in section.iter_mut() {
            item.status = status;
        }
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute_stats, Catalog};

    fn package2() -> Checklist {
        Catalog::builtin()
            .unwrap()
            .generate_checklist("package2")
            .unwrap()
    }

    #[test]
    fn test_update_replaces_only_target_item() {
        let checklist = package2();
        let category = CategoryId::new("betting");
        let item = ItemId::new("betting-03");
        let update = ItemUpdate::status(ChecklistStatus::Failed)
            .with_evidence("https://tracker.example/run/17")
            .with_severity(Some(Severity::Critical));

        let updated = apply_item_update(&checklist, &category, &item, &update).unwrap();
        let changed = updated.item(&category, &item).unwrap();
        assert_eq!(changed.status, ChecklistStatus::Failed);
        assert_eq!(changed.evidence.as_deref(), Some("https://tracker.example/run/17"));
        assert_eq!(changed.severity, Some(Severity::Critical));
        assert_eq!(changed.title, checklist.item(&category, &item).unwrap().title);

        let differing: Vec<_> = checklist
            .items()
            .zip(updated.items())
            .filter(|(a, b)| a != b)
            .map(|(a, _)| a.id.clone())
            .collect();
        assert_eq!(differing, vec![item]);
    }

    #[test]
    fn test_unknown_item_is_not_found_and_input_untouched() {
        let checklist = package2();
        let snapshot = checklist.clone();
        let err = apply_item_update(
            &checklist,
            &CategoryId::new("paytable"),
            &ItemId::new("paytable-99"),
            &ItemUpdate::status(ChecklistStatus::Done),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ItemNotFound { .. }));
        assert!(err.is_not_found());
        assert_eq!(checklist, snapshot);
    }

    #[test]
    fn test_unknown_category_is_not_found() {
        let checklist = package2();
        let err = apply_item_update(
            &checklist,
            &CategoryId::new("audio"),
            &ItemId::new("paytable-01"),
            &ItemUpdate::status(ChecklistStatus::Done),
        )
        .unwrap_err();
        assert!(matches!(err, Error::CategoryNotFound(_)));
    }

    #[test]
    fn test_item_in_other_section_is_not_found() {
        let checklist = package2();
        let result = apply_item_update(
            &checklist,
            &CategoryId::new("bonus"),
            &ItemId::new("paytable-01"),
            &ItemUpdate::status(ChecklistStatus::Done),
        );
        assert!(matches!(result, Err(Error::ItemNotFound { .. })));
    }

    #[test]
    fn test_transitions_are_unrestricted() {
        let category = CategoryId::new("reels");
        let item = ItemId::new("reels-01");
        let mut checklist = package2();
        for status in [
            ChecklistStatus::Done,
            ChecklistStatus::NeedRework,
            ChecklistStatus::Done,
            ChecklistStatus::Unchecked,
            ChecklistStatus::Checking,
            ChecklistStatus::NeedRework,
        ] {
            checklist =
                apply_item_update(&checklist, &category, &item, &ItemUpdate::status(status))
                    .unwrap();
        }
        assert_eq!(
            checklist.item(&category, &item).unwrap().status,
            ChecklistStatus::NeedRework
        );
    }

    #[test]
    fn test_blank_evidence_and_null_severity_clear() {
        let category = CategoryId::new("math");
        let item = ItemId::new("math-02");
        let checklist = apply_item_update(
            &package2(),
            &category,
            &item,
            &ItemUpdate::default()
                .with_evidence("report.pdf")
                .with_severity(Some(Severity::Low)),
        )
        .unwrap();

        let cleared = apply_item_update(
            &checklist,
            &category,
            &item,
            &ItemUpdate::default().with_evidence("   ").with_severity(None),
        )
        .unwrap();
        let cleared = cleared.item(&category, &item).unwrap();
        assert!(cleared.evidence.is_none());
        assert!(cleared.severity.is_none());
    }

    #[test]
    fn test_json_absent_vs_null() {
        let update: ItemUpdate = serde_json::from_str(r#"{"status":"done"}"#).unwrap();
        assert_eq!(update, ItemUpdate::status(ChecklistStatus::Done));

        let update: ItemUpdate =
            serde_json::from_str(r#"{"evidence":null,"severity":"high"}"#).unwrap();
        assert_eq!(update.evidence, Some(None));
        assert_eq!(update.severity, Some(Some(Severity::High)));
        assert!(update.status.is_none());

        assert!(serde_json::from_str::<ItemUpdate>(r#"{"status":"closed"}"#).is_err());
        assert!(serde_json::from_str::<ItemUpdate>(r#"{"title":"x"}"#).is_err());
        assert!(serde_json::from_str::<ItemUpdate>("{}").unwrap().is_empty());
    }

    #[test]
    fn test_section_status_bulk_update() {
        let checklist = package2();
        let category = CategoryId::new("gameplay");
        let updated = apply_section_status(&checklist, &category, ChecklistStatus::Done).unwrap();
        let stats = compute_stats(&updated);
        assert_eq!(stats.per_category[&category].percent, 100);
        assert_eq!(stats.done, 7);

        let err = apply_section_status(&checklist, &CategoryId::new("nope"), ChecklistStatus::Done)
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
