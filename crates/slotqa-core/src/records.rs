//! Flat records: games, bugs, tests, users and sessions

use crate::{Error, GameId, PackageId, Result, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A game under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    /// Fixed at creation; the checklist was generated from it
    pub package_id: PackageId,
    pub created_at: DateTime<Utc>,
}

/// Body of a game creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewGame {
    pub name: String,
    pub package_id: PackageId,
}

/// Body of a game rename request; the package cannot change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameRename {
    pub name: String,
}

/// Trimmed, non-empty text or a validation error naming the field
pub fn require_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

wire_enum! {
    /// Lifecycle of a reported bug
    BugStatus {
        Open => "open",
        InProgress => "in-progress",
        Resolved => "resolved",
        Closed => "closed",
        Reopened => "reopened",
    }
}

wire_enum! {
    /// Outcome of a functional or regression test
    TestStatus {
        NotRun => "not-run",
        Passed => "passed",
        Failed => "failed",
        Blocked => "blocked",
    }
}

fn default_severity() -> Severity {
    Severity::Medium
}

/// A reported defect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bug {
    pub id: u64,
    pub game_id: GameId,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: BugStatus,
    pub reporter: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a bug report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBug {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

/// Partial bug update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BugUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub status: Option<BugStatus>,
}

impl BugUpdate {
    /// Merge into `bug`, stamping `updated_at`
    pub fn apply(&self, bug: &mut Bug, now: DateTime<Utc>) -> Result<()> {
        if let Some(title) = &self.title {
            bug.title = require_text("title", title)?;
        }
        if let Some(description) = &self.description {
            bug.description = description.clone();
        }
        if let Some(severity) = self.severity {
            bug.severity = severity;
        }
        if let Some(status) = self.status {
            bug.status = status;
        }
        bug.updated_at = now;
        Ok(())
    }
}

/// A scripted functional test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalTest {
    pub id: u64,
    pub game_id: GameId,
    pub name: String,
    pub steps: String,
    pub expected: String,
    pub actual: Option<String>,
    pub status: TestStatus,
    pub tester: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a functional test creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewFunctionalTest {
    pub name: String,
    #[serde(default)]
    pub steps: String,
    #[serde(default)]
    pub expected: String,
}

/// Partial functional test update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionalTestUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
    #[serde(default)]
    pub status: Option<TestStatus>,
}

impl FunctionalTestUpdate {
    /// Merge into `test`, stamping `updated_at`
    pub fn apply(&self, test: &mut FunctionalTest, now: DateTime<Utc>) -> Result<()> {
        if let Some(name) = &self.name {
            test.name = require_text("name", name)?;
        }
        if let Some(steps) = &self.steps {
            test.steps = steps.clone();
        }
        if let Some(expected) = &self.expected {
            test.expected = expected.clone();
        }
        if let Some(actual) = &self.actual {
            test.actual = Some(actual.clone()).filter(|a| !a.trim().is_empty());
        }
        if let Some(status) = self.status {
            test.status = status;
        }
        test.updated_at = now;
        Ok(())
    }
}

/// A regression run of one case against a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTest {
    pub id: u64,
    pub game_id: GameId,
    pub name: String,
    pub build_version: String,
    pub status: TestStatus,
    pub notes: Option<String>,
    pub tester: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a regression test creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRegressionTest {
    pub name: String,
    pub build_version: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial regression test update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegressionTestUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub build_version: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<TestStatus>,
}

impl RegressionTestUpdate {
    /// Merge into `test`, stamping `updated_at`
    pub fn apply(&self, test: &mut RegressionTest, now: DateTime<Utc>) -> Result<()> {
        if let Some(name) = &self.name {
            test.name = require_text("name", name)?;
        }
        if let Some(build) = &self.build_version {
            test.build_version = require_text("build_version", build)?;
        }
        if let Some(notes) = &self.notes {
            test.notes = Some(notes.clone()).filter(|n| !n.trim().is_empty());
        }
        if let Some(status) = self.status {
            test.status = status;
        }
        test.updated_at = now;
        Ok(())
    }
}

wire_enum! {
    /// Account role
    Role {
        Admin => "admin",
        Lead => "lead",
        Tester => "tester",
    }
}

impl Role {
    /// Create and remove accounts
    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Delete games, bugs and test records
    pub fn can_delete(&self) -> bool {
        matches!(self, Role::Admin | Role::Lead)
    }
}

/// An account, without credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Body of an account creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    /// Username rules: 3..=32 chars of `[a-z0-9_.-]`; password at least 8 chars
    pub fn validate(&self) -> Result<()> {
        let name = &self.username;
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'));
        if !(3..=32).contains(&name.len()) || !valid_chars {
            return Err(Error::Validation(format!("invalid username '{}'", name)));
        }
        if self.password.chars().count() < 8 {
            return Err(Error::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// A signed-in browser session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// True once `now` has reached the expiry
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bug() -> Bug {
        let now = Utc::now();
        Bug {
            id: 1,
            game_id: GameId::new(1),
            title: "Reel 3 desync".to_string(),
            description: String::new(),
            severity: Severity::High,
            status: BugStatus::Open,
            reporter: "ana".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_bug_update_merges_fields() {
        let mut bug = bug();
        let later = bug.created_at + Duration::minutes(5);
        let update = BugUpdate {
            status: Some(BugStatus::InProgress),
            severity: Some(Severity::Critical),
            ..BugUpdate::default()
        };
        update.apply(&mut bug, later).unwrap();
        assert_eq!(bug.status, BugStatus::InProgress);
        assert_eq!(bug.severity, Severity::Critical);
        assert_eq!(bug.title, "Reel 3 desync");
        assert_eq!(bug.updated_at, later);
    }

    #[test]
    fn test_bug_update_rejects_blank_title() {
        let mut bug = bug();
        let update = BugUpdate {
            title: Some("  ".to_string()),
            ..BugUpdate::default()
        };
        assert!(matches!(
            update.apply(&mut bug, Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_new_bug_defaults() {
        let new: NewBug = serde_json::from_str(r#"{"title":"Crash on spin"}"#).unwrap();
        assert_eq!(new.severity, Severity::Medium);
        assert!(new.description.is_empty());
        assert!(serde_json::from_str::<NewBug>(r#"{"title":"x","status":"open"}"#).is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(BugStatus::InProgress.as_str(), "in-progress");
        assert_eq!("not-run".parse::<TestStatus>().unwrap(), TestStatus::NotRun);
        assert_eq!(
            serde_json::to_string(&TestStatus::Blocked).unwrap(),
            "\"blocked\""
        );
    }

    #[test]
    fn test_rename_cannot_carry_package() {
        let result =
            serde_json::from_str::<GameRename>(r#"{"name":"New","package_id":"package1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_manage_users());
        assert!(!Role::Lead.can_manage_users());
        assert!(Role::Lead.can_delete());
        assert!(!Role::Tester.can_delete());
    }

    #[test]
    fn test_new_user_validation() {
        let mut user = NewUser {
            username: "qa.lead".to_string(),
            display_name: None,
            password: "correct horse".to_string(),
            role: Role::Lead,
        };
        assert!(user.validate().is_ok());
        user.username = "QA Lead".to_string();
        assert!(user.validate().is_err());
        user.username = "qa".to_string();
        assert!(user.validate().is_err());
        user.username = "qa-lead".to_string();
        user.password = "short".to_string();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            username: "ana".to_string(),
            expires_at: now + Duration::hours(1),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::hours(2)));
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("name", "  Lucky  ").unwrap(), "Lucky");
        assert!(require_text("name", "").is_err());
    }
}
