use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use deckhand_config::AUTH_SCHEME;
use std::sync::{Arc, RwLock};

/// Builds the `Authorization` value for a username/password pair.
pub fn basic_token(username: &str, password: &str) -> String {
    let raw = format!("{username}:{password}");
    format!("{AUTH_SCHEME} {}", STANDARD.encode(raw))
}

/// Holds the token of the current session. Written on login, cleared on logout.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, token: String) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token);
    }

    pub fn clear(&self) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn is_logged(&self) -> bool {
        self.get().is_some_and(|t| !t.is_empty())
    }
}
