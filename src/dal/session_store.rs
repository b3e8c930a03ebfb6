use std::fs;
use std::path::PathBuf;

use chrono::{Duration, Utc};

use crate::dal::checkpoint_store::StoreError;
use crate::domain::session::{SavedSession, SessionCookie};

/// How long a saved session stays reusable before re-authentication.
pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Single-slot store for the authentication cookie bundle. A record past
/// the freshness window is treated as absent, not as an error.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// Overwrite the slot with the given cookies, stamped now.
    pub fn save(&self, cookies: Vec<SessionCookie>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let session = SavedSession {
            saved_at: Utc::now(),
            cookies,
        };
        fs::write(&self.path, serde_json::to_string_pretty(&session)?)?;
        log::info!("Saved session cookies to {}", self.path.display());
        Ok(())
    }

    /// Return the stored cookies while the record is fresh. Missing,
    /// unreadable and expired records all read as absent; the caller falls
    /// back to interactive login.
    pub fn load(&self) -> Option<Vec<SessionCookie>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => {
                log::info!("No saved session found at {}", self.path.display());
                return None;
            }
        };

        let session: SavedSession = match serde_json::from_str(&text) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Saved session is unreadable, treating as absent: {}", e);
                return None;
            }
        };

        if Utc::now() - session.saved_at > Duration::hours(FRESHNESS_WINDOW_HOURS) {
            log::info!("Saved session is expired");
            return None;
        }

        Some(session.cookies)
    }

    /// Delete the stored record. Absence is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
