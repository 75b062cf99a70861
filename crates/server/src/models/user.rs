//! User domain types.
//!
//! The password hash only ever travels inside these types. Everything that
//! leaves the server uses `waymark_core::PublicUser`.

use core::fmt;

use waymark_core::{Email, PublicUser};

/// A validated registration, ready to persist.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Email,
    pub password_hash: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// A user together with the stored password hash, for login only.
#[derive(Clone)]
pub struct StoredCredentials {
    pub user: PublicUser,
    pub password_hash: String,
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}
