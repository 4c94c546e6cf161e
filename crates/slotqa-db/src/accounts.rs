//! User accounts and login sessions.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use slotqa_core::{NewUser, Role, Session, User};
use tracing::{info, warn};

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl Store {
    /// Create a user account.
    pub fn create_user(&self, new: &NewUser, now: DateTime<Utc>) -> Result<User> {
        new.validate()?;

        let salt = random_hex(16);
        let stored = StoredUser {
            username: new.username.clone(),
            display_name: new
                .display_name
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| new.username.clone()),
            role: new.role.as_str().to_string(),
            password_hash: hash_password(&salt, &new.password),
            salt,
            created_at: to_millis(now),
        };

        let rw = self.db.rw_transaction()?;
        let existing: Option<StoredUser> = rw.get().primary(new.username.clone())?;
        if existing.is_some() {
            return Err(Error::DuplicateKey(format!("user '{}'", new.username)));
        }
        rw.insert(stored.clone())?;
        rw.commit()?;

        info!(username = %new.username, role = %new.role, "created user");
        stored.to_user()
    }

    /// Load a user by name.
    pub fn user(&self, username: &str) -> Result<User> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredUser> = r.get().primary(username.to_string())?;
        stored
            .ok_or_else(|| Error::not_found("User", username))?
            .to_user()
    }

    /// All users, ordered by name.
    pub fn users(&self) -> Result<Vec<User>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredUser>()?;
        let iter = scan.all()?;
        let users: std::result::Result<Vec<StoredUser>, _> = iter.collect();
        let users = users.map_err(|e| Error::Database(e.to_string()))?;
        users.iter().map(|u| u.to_user()).collect()
    }

    /// Delete a user and every session they hold.
    pub fn delete_user(&self, username: &str) -> Result<()> {
        let sessions = self.stored_sessions(username)?;

        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredUser> = rw.get().primary(username.to_string())?;
        rw.remove(stored.ok_or_else(|| Error::not_found("User", username))?)?;
        for session in sessions {
            rw.remove(session)?;
        }
        rw.commit()?;
        info!(%username, "deleted user");
        Ok(())
    }

    /// Check a username and password pair.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<User> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredUser> = r.get().primary(username.to_string())?;
        match stored {
            Some(user) if hash_password(&user.salt, password) == user.password_hash => {
                user.to_user()
            }
            _ => {
                warn!(%username, "rejected login");
                Err(Error::Unauthorized("invalid username or password".to_string()))
            }
        }
    }

    /// Create the bootstrap admin when the user table is empty.
    ///
    /// Returns true if an account was created.
    pub fn ensure_admin(&self, username: &str, password: &str, now: DateTime<Utc>) -> Result<bool> {
        if !self.users()?.is_empty() {
            return Ok(false);
        }
        let new = NewUser {
            username: username.to_string(),
            display_name: Some("Administrator".to_string()),
            password: password.to_string(),
            role: Role::Admin,
        };
        self.create_user(&new, now)?;
        Ok(true)
    }

    fn stored_sessions(&self, username: &str) -> Result<Vec<StoredSession>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredSession>(StoredSessionKey::username)?;
        let iter = scan.start_with(username.to_string())?;
        let sessions: std::result::Result<Vec<StoredSession>, _> = iter.collect();
        let sessions = sessions.map_err(|e| Error::Database(e.to_string()))?;
        // start_with is a prefix match
        Ok(sessions
            .into_iter()
            .filter(|s| s.username == username)
            .collect())
    }

    /// Open a session for a user.
    pub fn create_session(&self, username: &str, ttl: Duration, now: DateTime<Utc>) -> Result<Session> {
        let now = stored_time(now);
        self.user(username)?;
        let session = Session {
            token: random_hex(32),
            username: username.to_string(),
            expires_at: now + ttl,
        };
        let rw = self.db.rw_transaction()?;
        rw.insert(StoredSession::from_session(&session))?;
        rw.commit()?;
        Ok(session)
    }

    /// Look up a live session. Expired sessions are removed and reported as absent.
    pub fn session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredSession> = r.get().primary(token.to_string())?;
        drop(r);

        let Some(stored) = stored else {
            return Ok(None);
        };
        let session = stored.to_session();
        if session.is_expired(now) {
            self.delete_session(token)?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// End a session. Unknown tokens are ignored.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredSession> = rw.get().primary(token.to_string())?;
        if let Some(stored) = stored {
            rw.remove(stored)?;
        }
        rw.commit()?;
        Ok(())
    }
}
