use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, Entity, LoginLogId, UserId};

use crate::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginStatus {
    Success,
    Failed,
}

impl LoginStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for LoginStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::validation(format!("unknown login status '{other}'"))),
        }
    }
}

/// One login attempt. `user_id` is absent when the e-mail matched no account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginLog {
    pub id: LoginLogId,
    pub user_id: Option<UserId>,
    pub role: Option<UserRole>,
    pub ip: String,
    pub user_agent: String,
    pub status: LoginStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl LoginLog {
    pub fn record(
        user: Option<(UserId, UserRole)>,
        ip: impl Into<String>,
        user_agent: impl Into<String>,
        status: LoginStatus,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LoginLogId::new(),
            user_id: user.map(|(id, _)| id),
            role: user.map(|(_, role)| role),
            ip: ip.into(),
            user_agent: user_agent.into(),
            status,
            message: message.into(),
            created_at: now,
        }
    }
}

impl Entity for LoginLog {
    type Id = LoginLogId;

    fn id(&self) -> LoginLogId {
        self.id
    }
}
