//! Bug and test models for database storage.

use super::{from_millis, to_millis};
use crate::error::{Error, Result};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use slotqa_core::{Bug, FunctionalTest, GameId, RegressionTest};

/// Stored bug report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredBug {
    /// Primary key - bug ID.
    #[primary_key]
    pub id: u64,
    /// Owning game.
    #[secondary_key]
    pub game_id: u64,
    pub title: String,
    pub description: String,
    /// Severity wire name.
    pub severity: String,
    /// Status wire name.
    pub status: String,
    pub reporter: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StoredBug {
    /// Create from a Bug.
    pub fn from_bug(bug: &Bug) -> Self {
        Self {
            id: bug.id,
            game_id: bug.game_id.raw(),
            title: bug.title.clone(),
            description: bug.description.clone(),
            severity: bug.severity.as_str().to_string(),
            status: bug.status.as_str().to_string(),
            reporter: bug.reporter.clone(),
            created_at: to_millis(bug.created_at),
            updated_at: to_millis(bug.updated_at),
        }
    }

    /// Convert to a Bug, validating the enum columns.
    pub fn to_bug(&self) -> Result<Bug> {
        Ok(Bug {
            id: self.id,
            game_id: GameId::new(self.game_id),
            title: self.title.clone(),
            description: self.description.clone(),
            severity: self.severity.parse().map_err(Error::corrupt)?,
            status: self.status.parse().map_err(Error::corrupt)?,
            reporter: self.reporter.clone(),
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

/// Stored functional test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredFunctionalTest {
    /// Primary key - test ID.
    #[primary_key]
    pub id: u64,
    /// Owning game.
    #[secondary_key]
    pub game_id: u64,
    pub name: String,
    pub steps: String,
    pub expected: String,
    pub actual: Option<String>,
    /// Status wire name.
    pub status: String,
    pub tester: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StoredFunctionalTest {
    /// Create from a FunctionalTest.
    pub fn from_test(test: &FunctionalTest) -> Self {
        Self {
            id: test.id,
            game_id: test.game_id.raw(),
            name: test.name.clone(),
            steps: test.steps.clone(),
            expected: test.expected.clone(),
            actual: test.actual.clone(),
            status: test.status.as_str().to_string(),
            tester: test.tester.clone(),
            created_at: to_millis(test.created_at),
            updated_at: to_millis(test.updated_at),
        }
    }

    /// Convert to a FunctionalTest.
    pub fn to_test(&self) -> Result<FunctionalTest> {
        Ok(FunctionalTest {
            id: self.id,
            game_id: GameId::new(self.game_id),
            name: self.name.clone(),
            steps: self.steps.clone(),
            expected: self.expected.clone(),
            actual: self.actual.clone(),
            status: self.status.parse().map_err(Error::corrupt)?,
            tester: self.tester.clone(),
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

/// Stored regression test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 5, version = 1)]
#[native_db]
pub struct StoredRegressionTest {
    /// Primary key - test ID.
    #[primary_key]
    pub id: u64,
    /// Owning game.
    #[secondary_key]
    pub game_id: u64,
    pub name: String,
    pub build_version: String,
    /// Status wire name.
    pub status: String,
    pub notes: Option<String>,
    pub tester: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StoredRegressionTest {
    /// Create from a RegressionTest.
    pub fn from_test(test: &RegressionTest) -> Self {
        Self {
            id: test.id,
            game_id: test.game_id.raw(),
            name: test.name.clone(),
            build_version: test.build_version.clone(),
            status: test.status.as_str().to_string(),
            notes: test.notes.clone(),
            tester: test.tester.clone(),
            created_at: to_millis(test.created_at),
            updated_at: to_millis(test.updated_at),
        }
    }

    /// Convert to a RegressionTest.
    pub fn to_test(&self) -> Result<RegressionTest> {
        Ok(RegressionTest {
            id: self.id,
            game_id: GameId::new(self.game_id),
            name: self.name.clone(),
            build_version: self.build_version.clone(),
            status: self.status.parse().map_err(Error::corrupt)?,
            notes: self.notes.clone(),
            tester: self.tester.clone(),
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}
