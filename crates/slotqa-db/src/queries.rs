//! Bug and test queries for the database.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use chrono::{DateTime, Utc};
use slotqa_core::{
    records::require_text, Bug, BugStatus, BugUpdate, FunctionalTest, FunctionalTestUpdate,
    GameId, NewBug, NewFunctionalTest, NewRegressionTest, RegressionTest, RegressionTestUpdate,
    TestStatus,
};
use tracing::info;

impl Store {
    pub(crate) fn stored_bugs(&self, game: GameId) -> Result<Vec<StoredBug>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredBug>(StoredBugKey::game_id)?;
        let iter = scan.start_with(game.raw())?;
        let bugs: std::result::Result<Vec<StoredBug>, _> = iter.collect();
        bugs.map_err(|e| Error::Database(e.to_string()))
    }

    pub(crate) fn stored_functional_tests(&self, game: GameId) -> Result<Vec<StoredFunctionalTest>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredFunctionalTest>(StoredFunctionalTestKey::game_id)?;
        let iter = scan.start_with(game.raw())?;
        let tests: std::result::Result<Vec<StoredFunctionalTest>, _> = iter.collect();
        tests.map_err(|e| Error::Database(e.to_string()))
    }

    pub(crate) fn stored_regression_tests(&self, game: GameId) -> Result<Vec<StoredRegressionTest>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredRegressionTest>(StoredRegressionTestKey::game_id)?;
        let iter = scan.start_with(game.raw())?;
        let tests: std::result::Result<Vec<StoredRegressionTest>, _> = iter.collect();
        tests.map_err(|e| Error::Database(e.to_string()))
    }

    // Bugs

    /// Report a bug against a game.
    pub fn create_bug(
        &self,
        game: GameId,
        new: &NewBug,
        reporter: &str,
        now: DateTime<Utc>,
    ) -> Result<Bug> {
        let now = stored_time(now);
        self.game(game)?;
        let title = require_text("title", &new.title)?;
        let bug = Bug {
            id: self.allocate_id("bugs")?,
            game_id: game,
            title,
            description: new.description.clone(),
            severity: new.severity,
            status: BugStatus::Open,
            reporter: reporter.to_string(),
            created_at: now,
            updated_at: now,
        };

        let rw = self.db.rw_transaction()?;
        rw.insert(StoredBug::from_bug(&bug))?;
        rw.commit()?;
        info!(game = %game, bug = bug.id, severity = %bug.severity, "reported bug");
        Ok(bug)
    }

    /// Load a bug by ID.
    pub fn bug(&self, id: u64) -> Result<Bug> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredBug> = r.get().primary(id)?;
        stored
            .ok_or_else(|| Error::not_found("Bug", id))?
            .to_bug()
    }

    /// Bugs of a game in ID order, optionally filtered by status.
    pub fn bugs(&self, game: GameId, status: Option<BugStatus>) -> Result<Vec<Bug>> {
        self.game(game)?;
        let mut bugs = self
            .stored_bugs(game)?
            .iter()
            .map(|b| b.to_bug())
            .collect::<Result<Vec<_>>>()?;
        bugs.retain(|b| status.map_or(true, |s| b.status == s));
        bugs.sort_by_key(|b| b.id);
        Ok(bugs)
    }

    /// Apply a partial update to a bug.
    pub fn update_bug(&self, id: u64, update: &BugUpdate, now: DateTime<Utc>) -> Result<Bug> {
        let now = stored_time(now);
        let mut bug = self.bug(id)?;
        update.apply(&mut bug, now)?;
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredBug::from_bug(&bug))?;
        rw.commit()?;
        Ok(bug)
    }

    /// Delete a bug.
    pub fn delete_bug(&self, id: u64) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredBug> = rw.get().primary(id)?;
        rw.remove(stored.ok_or_else(|| Error::not_found("Bug", id))?)?;
        rw.commit()?;
        Ok(())
    }

    // Functional tests

    /// Add a functional test case to a game.
    pub fn create_functional_test(
        &self,
        game: GameId,
        new: &NewFunctionalTest,
        tester: &str,
        now: DateTime<Utc>,
    ) -> Result<FunctionalTest> {
        let now = stored_time(now);
        self.game(game)?;
        let name = require_text("name", &new.name)?;
        let test = FunctionalTest {
            id: self.allocate_id("functional_tests")?,
            game_id: game,
            name,
            steps: new.steps.clone(),
            expected: new.expected.clone(),
            actual: None,
            status: TestStatus::NotRun,
            tester: tester.to_string(),
            created_at: now,
            updated_at: now,
        };

        let rw = self.db.rw_transaction()?;
        rw.insert(StoredFunctionalTest::from_test(&test))?;
        rw.commit()?;
        info!(game = %game, test = test.id, "added functional test");
        Ok(test)
    }

    /// Load a functional test by ID.
    pub fn functional_test(&self, id: u64) -> Result<FunctionalTest> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredFunctionalTest> = r.get().primary(id)?;
        stored
            .ok_or_else(|| Error::not_found("Functional test", id))?
            .to_test()
    }

    /// Functional tests of a game in ID order, optionally filtered by status.
    pub fn functional_tests(
        &self,
        game: GameId,
        status: Option<TestStatus>,
    ) -> Result<Vec<FunctionalTest>> {
        self.game(game)?;
        let mut tests = self
            .stored_functional_tests(game)?
            .iter()
            .map(|t| t.to_test())
            .collect::<Result<Vec<_>>>()?;
        tests.retain(|t| status.map_or(true, |s| t.status == s));
        tests.sort_by_key(|t| t.id);
        Ok(tests)
    }

    /// Apply a partial update to a functional test.
    pub fn update_functional_test(
        &self,
        id: u64,
        update: &FunctionalTestUpdate,
        now: DateTime<Utc>,
    ) -> Result<FunctionalTest> {
        let now = stored_time(now);
        let mut test = self.functional_test(id)?;
        update.apply(&mut test, now)?;
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredFunctionalTest::from_test(&test))?;
        rw.commit()?;
        Ok(test)
    }

    /// Delete a functional test.
    pub fn delete_functional_test(&self, id: u64) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredFunctionalTest> = rw.get().primary(id)?;
        rw.remove(stored.ok_or_else(|| Error::not_found("Functional test", id))?)?;
        rw.commit()?;
        Ok(())
    }

    // Regression tests

    /// Record a regression run for a game.
    pub fn create_regression_test(
        &self,
        game: GameId,
        new: &NewRegressionTest,
        tester: &str,
        now: DateTime<Utc>,
    ) -> Result<RegressionTest> {
        let now = stored_time(now);
        self.game(game)?;
        let name = require_text("name", &new.name)?;
        let build_version = require_text("build_version", &new.build_version)?;
        let test = RegressionTest {
            id: self.allocate_id("regression_tests")?,
            game_id: game,
            name,
            build_version,
            status: TestStatus::NotRun,
            notes: new.notes.clone().filter(|n| !n.trim().is_empty()),
            tester: tester.to_string(),
            created_at: now,
            updated_at: now,
        };

        let rw = self.db.rw_transaction()?;
        rw.insert(StoredRegressionTest::from_test(&test))?;
        rw.commit()?;
        info!(game = %game, test = test.id, build = %test.build_version, "added regression test");
        Ok(test)
    }

    /// Load a regression test by ID.
    pub fn regression_test(&self, id: u64) -> Result<RegressionTest> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredRegressionTest> = r.get().primary(id)?;
        stored
            .ok_or_else(|| Error::not_found("Regression test", id))?
            .to_test()
    }

    /// Regression tests of a game in ID order, optionally filtered by status.
    pub fn regression_tests(
        &self,
        game: GameId,
        status: Option<TestStatus>,
    ) -> Result<Vec<RegressionTest>> {
        self.game(game)?;
        let mut tests = self
            .stored_regression_tests(game)?
            .iter()
            .map(|t| t.to_test())
            .collect::<Result<Vec<_>>>()?;
        tests.retain(|t| status.map_or(true, |s| t.status == s));
        tests.sort_by_key(|t| t.id);
        Ok(tests)
    }

    /// Apply a partial update to a regression test.
    pub fn update_regression_test(
        &self,
        id: u64,
        update: &RegressionTestUpdate,
        now: DateTime<Utc>,
    ) -> Result<RegressionTest> {
        let now = stored_time(now);
        let mut test = self.regression_test(id)?;
        update.apply(&mut test, now)?;
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredRegressionTest::from_test(&test))?;
        rw.commit()?;
        Ok(test)
    }

    /// Delete a regression test.
    pub fn delete_regression_test(&self, id: u64) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredRegressionTest> = rw.get().primary(id)?;
        rw.remove(stored.ok_or_else(|| Error::not_found("Regression test", id))?)?;
        rw.commit()?;
        Ok(())
    }
}
