//! Account models for database storage.

use super::{from_millis, to_millis};
use crate::error::{Error, Result};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use slotqa_core::{Session, User};

/// Stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 6, version = 1)]
#[native_db]
pub struct StoredUser {
    /// Primary key - username.
    #[primary_key]
    pub username: String,
    pub display_name: String,
    /// Role wire name.
    pub role: String,
    /// Hex salt.
    pub salt: String,
    /// Hex SHA-256 of salt and password.
    pub password_hash: String,
    pub created_at: i64,
}

impl StoredUser {
    /// Convert to a User (credentials are dropped).
    pub fn to_user(&self) -> Result<User> {
        Ok(User {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role.parse().map_err(Error::corrupt)?,
            created_at: from_millis(self.created_at),
        })
    }
}

/// Stored login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 7, version = 1)]
#[native_db]
pub struct StoredSession {
    /// Primary key - opaque token.
    #[primary_key]
    pub token: String,
    /// Session owner.
    #[secondary_key]
    pub username: String,
    /// Expiry (Unix ms).
    pub expires_at: i64,
}

impl StoredSession {
    /// Create from a Session.
    pub fn from_session(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            username: session.username.clone(),
            expires_at: to_millis(session.expires_at),
        }
    }

    /// Convert to a Session.
    pub fn to_session(&self) -> Session {
        Session {
            token: self.token.clone(),
            username: self.username.clone(),
            expires_at: from_millis(self.expires_at),
        }
    }
}
