//! SlotQA Core - Checklist engine for slot game QA
//!
//! This crate holds the domain of the QA tracker, with no I/O:
//! - Package catalog (`Catalog`, `GamePackage`) loaded from embedded RON
//! - Checklist template generation from a package descriptor
//! - Completion statistics per section, per status and overall
//! - Targeted item updates that never partially mutate a snapshot
//! - Flat record types for games, bugs, tests, users and sessions
//!
//! ## Checklist Lifecycle
//!
//! ```
//! use slotqa_core::{apply_item_update, compute_stats, Catalog, ChecklistStatus, ItemUpdate};
//!
//! let catalog = Catalog::builtin().unwrap();
//! let checklist = catalog.generate_checklist("package2").unwrap();
//! let paytable = "paytable".into();
//! let first = checklist.section(&paytable).unwrap()[0].id.clone();
//!
//! let updated = apply_item_update(
//!     &checklist,
//!     &paytable,
//!     &first,
//!     &ItemUpdate::status(ChecklistStatus::Done),
//! )
//! .unwrap();
//! assert_eq!(compute_stats(&updated).per_category[&paytable].done, 1);
//! ```

#[macro_use]
mod wire;

mod catalog;
mod checklist;
mod error;
mod identity;
mod mutate;
mod package;
pub mod records;
mod stats;
pub mod template;

pub use catalog::Catalog;
pub use checklist::{Checklist, ChecklistItem, ChecklistRecord, ChecklistStatus, Severity};
pub use error::{Error, Result};
pub use identity::{CategoryId, GameId, ItemId, PackageId};
pub use mutate::{apply_item_update, apply_section_status, ItemUpdate};
pub use package::{GamePackage, PackageSummary, ReelLayout, Symbol, SymbolKind, Volatility};
pub use records::{
    BugStatus, Bug, BugUpdate, FunctionalTest, FunctionalTestUpdate, Game, GameRename, NewBug,
    NewFunctionalTest, NewGame, NewRegressionTest, NewUser, RegressionTest, RegressionTestUpdate,
    Role, Session, TestStatus, User,
};
pub use stats::{compute_stats, percent, section_stats, ChecklistStats, SectionStats};
pub use template::generate_checklist;
