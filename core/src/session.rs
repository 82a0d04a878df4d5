//! Session token store.
//!
//! # Design
//! A session is either a full access/refresh pair or nothing. The store API
//! only ever accepts a complete `TokenPair` and clears both slots together, so
//! a half-valid session cannot be represented, persisted, or sent.
//!
//! Stores use `&self` with interior mutability: the client, its middlewares
//! and the views all hold the same `Rc<dyn SessionStore>` on one thread.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SessionError;

/// Access and refresh credentials issued by the backend.
///
/// Deserializes from login and register responses (`{"access": .., "refresh": ..}`);
/// any other fields in those bodies are ignored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Persisted session state read by every outgoing request.
pub trait SessionStore {
    fn tokens(&self) -> Option<TokenPair>;

    fn set(&self, tokens: TokenPair) -> Result<(), SessionError>;

    fn clear(&self) -> Result<(), SessionError>;

    fn access_token(&self) -> Option<String> {
        self.tokens().map(|t| t.access)
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens().map(|t| t.refresh)
    }

    fn is_authenticated(&self) -> bool {
        self.tokens().is_some()
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    tokens: RefCell<Option<TokenPair>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RefCell::new(Some(tokens)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn tokens(&self) -> Option<TokenPair> {
        self.tokens.borrow().clone()
    }

    fn set(&self, tokens: TokenPair) -> Result<(), SessionError> {
        *self.tokens.borrow_mut() = Some(tokens);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.tokens.borrow_mut().take();
        Ok(())
    }
}

/// On-disk layout: two string slots under fixed key names.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl StoredSlots {
    fn into_pair(self) -> Option<TokenPair> {
        match (self.access_token, self.refresh_token) {
            (Some(access), Some(refresh)) => Some(TokenPair { access, refresh }),
            _ => None,
        }
    }
}

/// Durable store backed by a small JSON file.
///
/// The file is read once at open and rewritten on every change through a
/// staging file, so a reader never sees a half-written session. A file with
/// only one of the two slots, or one that does not parse, is treated as no
/// session at all.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    cached: RefCell<Option<TokenPair>>,
}

impl FileSessionStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let cached = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<StoredSlots>(&raw) {
                Ok(slots) => slots.into_pair(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                    None
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            cached: RefCell::new(cached),
        })
    }

    /// `<data dir>/farm/session.json`, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("farm"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("session.json")
    }

    /// Sibling file that a new session is written to before replacing the real one.
    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

impl SessionStore for FileSessionStore {
    fn tokens(&self) -> Option<TokenPair> {
        self.cached.borrow().clone()
    }

    fn set(&self, tokens: TokenPair) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let slots = StoredSlots {
            access_token: Some(tokens.access.clone()),
            refresh_token: Some(tokens.refresh.clone()),
        };
        let staging = self.staging_path();
        fs::write(&staging, serde_json::to_vec_pretty(&slots)?)?;
        fs::rename(&staging, &self.path)?;
        *self.cached.borrow_mut() = Some(tokens);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.cached.borrow_mut().take();
        Ok(())
    }
}
