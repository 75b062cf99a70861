//! Registration and login payloads.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// Body of `POST /api/auth/register`.
///
/// The email stays a plain string here so the server can answer a malformed
/// address with a validation message rather than a decode failure.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A user as other components may see it. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Successful register/login response: the identity plus a bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_is_flat() {
        let now = Utc::now();
        let response = AuthResponse {
            user: PublicUser {
                id: UserId::new(3),
                username: "alice".to_owned(),
                email: Email::parse("alice@example.com").unwrap(),
                created_at: now,
                updated_at: now,
            },
            token: "abc.def.ghi".to_owned(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["token"], "abc.def.ghi");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let req = LoginRequest {
            email: "alice@example.com".to_owned(),
            password: "hunter22-hunter22".to_owned(),
        };
        let out = format!("{req:?}");
        assert!(out.contains("alice@example.com"));
        assert!(!out.contains("hunter22"));
    }
}
