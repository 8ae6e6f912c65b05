//! Process-wide session store.
//!
//! Holds the logged-in user and the token pair. Every request reads the
//! access token from here; the store is cleared on logout or when a 401
//! cannot be recovered. With a file path configured, each change is written
//! through to disk so the next run starts logged in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lectern_core::model::{AuthResponse, User};
use lectern_core::{LecternError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Credentials of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The user.
    pub user: User,
    /// Bearer token.
    pub access: String,
    /// Token used to obtain a new access token.
    pub refresh: String,
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Self {
            user: auth.user,
            access: auth.access,
            refresh: auth.refresh,
        }
    }
}

/// Shared, optionally file-backed session slot.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// A store that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a file-backed store, loading any session saved at `path`.
    ///
    /// # Errors
    ///
    /// Returns `LecternError::SessionFileCorrupted` if the file exists but
    /// does not hold a session.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let session = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Some(
                serde_json::from_str::<Session>(&contents)
                    .map_err(|e| LecternError::session_corrupted(&path, e.to_string()))?,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), logged_in = session.is_some(), "Opened session store");
        Ok(Self {
            inner: Arc::new(RwLock::new(session)),
            path: Some(path),
        })
    }

    /// The file backing this store, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A copy of the current session.
    pub async fn get(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// The logged-in user.
    pub async fn user(&self) -> Option<User> {
        self.inner.read().await.as_ref().map(|s| s.user.clone())
    }

    /// The current access token.
    pub async fn access_token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|s| s.access.clone())
    }

    /// The current refresh token.
    pub async fn refresh_token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|s| s.refresh.clone())
    }

    /// Stores a new session.
    pub async fn set(&self, session: Session) -> Result<()> {
        let mut guard = self.inner.write().await;
        self.persist(Some(&session)).await?;
        *guard = Some(session);
        Ok(())
    }

    /// Replaces the access token after a refresh.
    ///
    /// Does nothing when no session is stored. The new token is kept in
    /// memory even if writing the session file fails.
    pub async fn update_access(&self, access: String) {
        let mut guard = self.inner.write().await;
        let Some(session) = guard.as_mut() else {
            return;
        };
        session.access = access;
        let snapshot = session.clone();
        if let Err(e) = self.persist(Some(&snapshot)).await {
            warn!(error = %e, "Failed to save refreshed token, keeping it in memory");
        }
    }

    /// Forgets the session and removes the session file.
    pub async fn clear(&self) -> Result<()> {
        let mut guard = self.inner.write().await;
        *guard = None;
        self.persist(None).await
    }

    async fn persist(&self, session: Option<&Session>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match session {
            Some(session) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let json = serde_json::to_string_pretty(session)?;
                tokio::fs::write(path, json).await?;
            }
            None => match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}
