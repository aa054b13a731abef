use crate::models::User;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SESSION_KEY: &str = "root";
pub const SESSION_VERSION: u32 = 1;

/// Signed-in user state that survives restarts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub current_user: Option<User>,
    pub token: Option<String>,
}

impl Session {
    pub fn signed_in(user: User, token: Option<String>) -> Self {
        Self {
            current_user: Some(user),
            token,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Persisted {
    key: String,
    version: u32,
    #[serde(flatten)]
    session: Session,
}

/// Session stored as a JSON file
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rehydrate the stored session. Missing, unreadable or outdated state
    /// yields a signed-out session.
    pub async fn load(&self) -> Result<Session> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session at {}", self.path.display());
                return Ok(Session::default());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read session from {}", self.path.display())
                })
            }
        };

        match serde_json::from_str::<Persisted>(&raw) {
            Ok(p) if p.key == SESSION_KEY && p.version == SESSION_VERSION => Ok(p.session),
            Ok(p) => {
                warn!(
                    "Discarding session {}@{} (expected {}@{})",
                    p.key, p.version, SESSION_KEY, SESSION_VERSION
                );
                Ok(Session::default())
            }
            Err(e) => {
                warn!("Discarding unreadable session: {}", e);
                Ok(Session::default())
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        let persisted = Persisted {
            key: SESSION_KEY.to_string(),
            version: SESSION_VERSION,
            session: session.clone(),
        };
        let json = serde_json::to_string_pretty(&persisted)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;
        info!("💾 Saved session to {}", self.path.display());
        Ok(())
    }

    /// Store the user returned by a profile update, keeping the token
    pub async fn update_user(&self, user: User) -> Result<Session> {
        let mut session = self.load().await?;
        session.current_user = Some(user);
        self.save(&session).await?;
        Ok(session)
    }

    /// Forget the signed-in user
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }
}
