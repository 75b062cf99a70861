//! The signed-in session and where it is persisted.
//!
//! A [`Session`] is the identity returned by register/login together with its
//! bearer token. It is passed explicitly to every API call that needs one.
//!
//! [`SessionStore`] keeps the most recent session in a small JSON file under a
//! single named entry:
//!
//! ```json
//! {"user": {"id": 1, "username": "alice", "email": "alice@example.com", "token": "..."}}
//! ```
//!
//! Lifecycle: loaded at start-up, written whenever the session changes,
//! removed on logout.

use core::fmt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use waymark_core::{ApiFailure, AuthResponse, ErrorKind, PublicUser};

/// An authenticated identity and the token that proves it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            user: response.user,
            token: response.token,
        }
    }
}

/// On-disk layout: one entry, named `user`.
#[derive(Serialize, Deserialize)]
struct SessionFile {
    user: Session,
}

/// Errors reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The file could not be read, written, or removed.
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not hold a session.
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<SessionStoreError> for ApiFailure {
    fn from(err: SessionStoreError) -> Self {
        Self::new(ErrorKind::Internal, err.to_string())
    }
}

/// File-backed session persistence.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Io` if the file exists but cannot be read,
    /// or `SessionStoreError::Corrupt` if it does not parse.
    pub async fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        let file: SessionFile =
            serde_json::from_slice(&bytes).map_err(|source| SessionStoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        debug!(user_id = %file.user.user.id, "Session restored");
        Ok(Some(file.user))
    }

    /// Persist `session`, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Io` if the file cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let json = serde_json::to_vec_pretty(&SessionFile {
            user: session.clone(),
        })
        .map_err(|source| SessionStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| self.io_error(source))
    }

    /// Remove the persisted session. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Io` if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), SessionStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> SessionStoreError {
        SessionStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
