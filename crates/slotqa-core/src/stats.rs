//! Completion statistics

use crate::{CategoryId, Checklist, ChecklistItem, ChecklistStatus};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Completion of one section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionStats {
    pub done: usize,
    pub total: usize,
    /// `done / total` rounded to the nearest integer, 0 for an empty section
    pub percent: u8,
}

/// Completion of a whole checklist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistStats {
    /// Per section, in checklist order
    pub per_category: IndexMap<CategoryId, SectionStats>,
    /// Item count for each of the five statuses, zero counts included
    pub per_status: IndexMap<ChecklistStatus, usize>,
    pub done: usize,
    pub total: usize,
    pub overall_percent: u8,
}

impl ChecklistStats {
    /// Count for one status
    pub fn count(&self, status: ChecklistStatus) -> usize {
        self.per_status.get(&status).copied().unwrap_or(0)
    }
}

/// Integer percentage rounded half up; 0 when `total` is 0
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((done * 200 + total) / (total * 2)) as u8
}

/// Stats for a single section's items
pub fn section_stats(items: &[ChecklistItem]) -> SectionStats {
    let done = items
        .iter()
        .filter(|i| i.status == ChecklistStatus::Done)
        .count();
    SectionStats {
        done,
        total: items.len(),
        percent: percent(done, items.len()),
    }
}

/// Stats for a whole checklist
pub fn compute_stats(checklist: &Checklist) -> ChecklistStats {
    let mut per_status: IndexMap<ChecklistStatus, usize> =
        ChecklistStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for item in checklist.items() {
        *per_status.entry(item.status).or_insert(0) += 1;
    }

    let per_category: IndexMap<CategoryId, SectionStats> = checklist
        .sections()
        .map(|(category, items)| (category.clone(), section_stats(items)))
        .collect();

    let done: usize = per_category.values().map(|s| s.done).sum();
    let total: usize = per_category.values().map(|s| s.total).sum();

    ChecklistStats {
        per_category,
        per_status,
        done,
        total,
        overall_percent: percent(done, total),
    }
}
