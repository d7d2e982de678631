//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, UserId};

use crate::UserRole;

/// A back-office or customer account.
///
/// `password_hash` is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to create an account (the password is already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: String,
    pub address: String,
}

/// Partial account update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChanges {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn normalize_username(raw: &str) -> DomainResult<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username cannot be empty"));
    }
    Ok(username.to_string())
}

/// E-mails compare case-insensitively, so they are stored lowercased.
pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(DomainError::validation(format!("'{}' is not a valid e-mail", raw.trim()))),
    }
}

impl User {
    pub fn create(id: UserId, new: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        if new.password_hash.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        Ok(Self {
            id,
            username: normalize_username(&new.username)?,
            email: normalize_email(&new.email)?,
            password_hash: new.password_hash,
            role: new.role,
            phone: new.phone.trim().to_string(),
            address: new.address.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply `changes`. On error `self` is unchanged.
    pub fn revise(&mut self, changes: UserChanges, now: DateTime<Utc>) -> DomainResult<()> {
        let username = match changes.username {
            Some(raw) => normalize_username(&raw)?,
            None => self.username.clone(),
        };
        let email = match changes.email {
            Some(raw) => normalize_email(&raw)?,
            None => self.email.clone(),
        };

        self.username = username;
        self.email = email;
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(phone) = changes.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(address) = changes.address {
            self.address = address.trim().to_string();
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}
