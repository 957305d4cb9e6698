//! Observable session state and token persistence

use crate::config::StorageKeys;
use crate::storage::TokenStorage;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Snapshot of the session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<Value>,
    pub authenticated: bool,
    pub loading: bool,
}

/// Holds the session state and mirrors tokens into a [`TokenStorage`].
///
/// Every mutation publishes a complete [`SessionState`] on a watch channel, so
/// observers never see a half-cleared session.
pub struct TokenStore {
    state: watch::Sender<SessionState>,
    storage: Arc<dyn TokenStorage>,
    keys: StorageKeys,
}

impl TokenStore {
    /// Create a store, restoring tokens from `storage`.
    ///
    /// The session starts loading and unauthenticated.
    pub fn new(storage: Arc<dyn TokenStorage>, keys: StorageKeys) -> Self {
        let access_token = read_slot(storage.as_ref(), &keys.access);
        let refresh_token = read_slot(storage.as_ref(), &keys.refresh);
        debug!(
            backend = storage.name(),
            has_access_token = access_token.is_some(),
            has_refresh_token = refresh_token.is_some(),
            "restored session tokens"
        );

        let (state, _) = watch::channel(SessionState {
            access_token,
            refresh_token,
            user: None,
            authenticated: false,
            loading: true,
        });

        Self {
            state,
            storage,
            keys,
        }
    }

    /// Current state
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state published from now on
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.borrow().refresh_token.clone()
    }

    /// Overwrite both tokens, persisting present values and removing absent ones
    pub fn set_tokens(&self, access: Option<&str>, refresh: Option<&str>) {
        self.state.send_modify(|state| {
            state.access_token = access.map(str::to_owned);
            state.refresh_token = refresh.map(str::to_owned);
        });
        self.persist(&self.keys.access, access);
        self.persist(&self.keys.refresh, refresh);
    }

    /// Reset tokens, user and authenticated flag, and remove both storage slots
    pub fn clear_auth(&self) {
        self.state.send_modify(|state| {
            state.access_token = None;
            state.refresh_token = None;
            state.user = None;
            state.authenticated = false;
        });
        self.persist(&self.keys.access, None);
        self.persist(&self.keys.refresh, None);
    }

    pub fn set_user(&self, user: Option<Value>) {
        self.state.send_modify(|state| state.user = user);
    }

    /// Record a fetched user and mark the session authenticated
    pub fn authenticate(&self, user: Value) {
        self.state.send_modify(|state| {
            state.user = Some(user);
            state.authenticated = true;
        });
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.state.send_if_modified(|state| {
            std::mem::replace(&mut state.authenticated, authenticated) != authenticated
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.state
            .send_if_modified(|state| std::mem::replace(&mut state.loading, loading) != loading);
    }

    /// Wait until `loading` is false.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub async fn wait_until_loaded(&self, timeout: Duration) -> bool {
        let mut receiver = self.subscribe();
        matches!(
            tokio::time::timeout(timeout, receiver.wait_for(|state| !state.loading)).await,
            Ok(Ok(_))
        )
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        };
        if let Err(err) = result {
            warn!(
                backend = self.storage.name(),
                key,
                error = %err,
                "failed to persist session token"
            );
        }
    }
}

fn read_slot(storage: &dyn TokenStorage, key: &str) -> Option<String> {
    storage.get(key).unwrap_or_else(|err| {
        warn!(backend = storage.name(), key, error = %err, "failed to read session token");
        None
    })
}
