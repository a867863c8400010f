//! Session and credential management.
//!
//! Tokens returned by the auth endpoints are persisted as JSON in the user's
//! data directory so subsequent invocations can reuse the session. The store
//! is the single owner of that file; a 401 anywhere tears it down.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::{Error, Result};

const SESSION_FILE: &str = "session.json";

/// Tokens issued on login/register, mirrored to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login payload for `POST /auth/signin`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// The authenticated user as reported by the auth endpoints.
///
/// The auth service exposes the raw document id as `_id`, unlike the rest of
/// the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthTokens {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AuthData {
    user: AuthUser,
    tokens: AuthTokens,
}

/// On-disk session store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the user's data directory.
    pub fn default_store() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "sprintsync").ok_or_else(|| {
            Error::InvalidConfig("cannot determine a home directory for session storage".into())
        })?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Load the persisted session, if any. A corrupt file is treated as no
    /// session rather than an error.
    pub fn load(&self) -> Option<StoredSession> {
        let contents = std::fs::read_to_string(self.path()).ok()?;
        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(path = %self.path().display(), %err, "discarding unreadable session file");
                None
            }
        }
    }

    pub fn save(&self, session: &StoredSession) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(self.path(), json)?;
        Ok(())
    }

    /// Remove the persisted session. Missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Auth intents: login, register, logout, current user.
///
/// Owns the pairing between the API client's in-memory bearer token and the
/// on-disk session store, keeping the two in step.
pub struct Session {
    api: ApiClient,
    store: SessionStore,
}

impl Session {
    pub fn new(api: ApiClient, store: SessionStore) -> Self {
        Self { api, store }
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<AuthUser> {
        let data: AuthData = self.api.post("/auth/signin", credentials).await?;
        self.adopt(&data)?;
        Ok(data.user)
    }

    pub async fn register(&mut self, account: &NewAccount) -> Result<AuthUser> {
        let data: AuthData = self.api.post("/auth/register", account).await?;
        self.adopt(&data)?;
        Ok(data.user)
    }

    /// End the session. Local credentials are cleared even when the server
    /// call fails; the server-side failure is still reported.
    pub async fn logout(&mut self) -> Result<()> {
        let result = self.api.post_empty("/auth/logout").await;
        self.api.clear_token();
        self.store.clear()?;
        result
    }

    /// Validate the stored session against `GET /auth/me`.
    pub async fn current_user(&self) -> Result<AuthUser> {
        if self.api.token().is_none() {
            return Err(Error::NotLoggedIn);
        }
        self.api.get("/auth/me", &[]).await
    }

    fn adopt(&mut self, data: &AuthData) -> Result<()> {
        let session = StoredSession {
            access_token: data.tokens.access_token.clone(),
            refresh_token: data.tokens.refresh_token.clone(),
        };
        self.store.save(&session)?;
        self.api.set_token(session.access_token);
        Ok(())
    }
}
