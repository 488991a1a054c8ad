use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BlogError;

pub const ADMIN_ROLE: &str = "admin";
pub const ADMIN_USER_ID: &str = "1";

/// How the configured admin password is checked.
#[derive(Clone)]
pub enum PasswordCheck {
    /// Exact string comparison.
    Plain(String),
    /// bcrypt hash as produced by `setup_cli admin hash-password`.
    Bcrypt(String),
}

impl PasswordCheck {
    fn matches(&self, candidate: &str) -> bool {
        match self {
            PasswordCheck::Plain(expected) => expected == candidate,
            PasswordCheck::Bcrypt(hash) => bcrypt::verify(candidate, hash).unwrap_or(false),
        }
    }
}

/// The single administrator allowed into the management area.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub name: String,
    pub password: PasswordCheck,
}

/// What the session cookie carries for a logged-in administrator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at && self.role == ADMIN_ROLE
    }
}

/// Present, unexpired and carrying the admin role.
pub fn is_session_valid(claims: Option<&SessionClaims>) -> bool {
    claims.map_or(false, |c| c.is_valid_at(Utc::now()))
}

#[derive(Clone)]
pub struct AccessGate {
    credentials: AdminCredentials,
    session_ttl: Duration,
}

impl AccessGate {
    pub fn new(credentials: AdminCredentials, session_ttl: Duration) -> Self {
        AccessGate {
            credentials,
            session_ttl,
        }
    }

    /// Checks the submitted pair against the configured administrator. Every
    /// failure, including a missing field, yields the same error.
    pub fn authenticate(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<SessionClaims, BlogError> {
        let (email, password) = match (email, password) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
            _ => return Err(BlogError::InvalidCredentials),
        };

        let email_ok = email == self.credentials.email;
        let password_ok = self.credentials.password.matches(password);
        if !(email_ok & password_ok) {
            return Err(BlogError::InvalidCredentials);
        }

        let issued_at = Utc::now();
        Ok(SessionClaims {
            sub: ADMIN_USER_ID.to_string(),
            email: self.credentials.email.clone(),
            name: self.credentials.name.clone(),
            role: ADMIN_ROLE.to_string(),
            issued_at,
            expires_at: issued_at + self.session_ttl,
        })
    }
}
