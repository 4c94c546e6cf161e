//! SlotQA DB - Database layer using native_db
//!
//! Provides persistent storage for:
//! - Games and their checklists (one row per item, ordered by section and position)
//! - Bug reports, functional tests and regression runs per game
//! - User accounts and login sessions

mod accounts;
mod error;
mod models;
mod queries;
mod store;

pub use error::{Error, Result};
pub use store::Store;
