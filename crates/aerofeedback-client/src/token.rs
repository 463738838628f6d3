//! Session token persistence
//!
//! The backend issues a bearer token at login. It lives under a single
//! `token` key and is re-read on every authenticated call, so a logout or
//! a login in another process takes effect immediately.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Storage for the session token
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Read the current token, if any
    async fn load(&self) -> ClientResult<Option<String>>;

    /// Replace the current token
    async fn store(&self, token: &str) -> ClientResult<()>;

    /// Forget the current token
    async fn clear(&self) -> ClientResult<()>;
}

/// Token store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> ClientResult<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn store(&self, token: &str) -> ClientResult<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        *self.token.write().await = None;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default)]
    token: Option<String>,
}

/// Token store backed by a small JSON file (`{"token": "..."}`)
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the token in the platform config directory
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn in_config_dir() -> ClientResult<Self> {
        Self::default_path().map(Self::new).ok_or_else(|| {
            ClientError::TokenStore("Could not determine a configuration directory".to_string())
        })
    }

    /// Default token file location, e.g. `~/.config/aerofeedback/session.json`
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "AeroFeedback", "aerofeedback")
            .map(|dirs| dirs.config_dir().join("session.json"))
    }

    /// Path of the token file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, action: &str, err: impl std::fmt::Display) -> ClientError {
        ClientError::TokenStore(format!(
            "Failed to {action} {}: {err}",
            self.path.display()
        ))
    }

    async fn write(&self, contents: &TokenFile) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("create directory for", e))?;
        }

        let body = serde_json::to_vec_pretty(contents)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| self.storage_error("open", e))?;

        // `mode` only applies to new files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.storage_error("restrict permissions on", e))?;
        }

        file.write_all(&body)
            .await
            .map_err(|e| self.storage_error("write", e))?;
        file.flush()
            .await
            .map_err(|e| self.storage_error("write", e))?;

        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> ClientResult<Option<String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error("read", e)),
        };

        match serde_json::from_str::<TokenFile>(&contents) {
            Ok(file) => Ok(file.token.filter(|token| !token.is_empty())),
            Err(e) => {
                // An unreadable session is a logged-out session; the next login overwrites it
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
                Ok(None)
            }
        }
    }

    async fn store(&self, token: &str) -> ClientResult<()> {
        debug!(path = %self.path.display(), "Storing session token");
        self.write(&TokenFile {
            token: Some(token.to_string()),
        })
        .await
    }

    async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared session token");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("remove", e)),
        }
    }
}
