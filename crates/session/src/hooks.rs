//! Lifecycle callbacks
//!
//! Applications react to session events through these hooks instead of
//! polling state. Every hook is optional.

use crate::error::SessionError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type ErrorCallback = Arc<dyn Fn(&str, &SessionError) + Send + Sync>;
pub type UserCallback = Arc<dyn Fn(&Value) + Send + Sync>;
pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

/// Optional callbacks invoked by the session manager
#[derive(Clone, Default)]
pub struct SessionHooks {
    pub on_error: Option<ErrorCallback>,
    pub on_login: Option<UserCallback>,
    pub on_logout: Option<EventCallback>,
    pub on_session_expired: Option<EventCallback>,
    pub on_fetch_user: Option<UserCallback>,
}

impl SessionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with a display message and the error when login fails
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&str, &SessionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_login(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_login = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_logout(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_logout = Some(Arc::new(f));
        self
    }

    /// Replaces the default expiry handling (clear and redirect to login)
    #[must_use]
    pub fn on_session_expired(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_fetch_user(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_fetch_user = Some(Arc::new(f));
        self
    }

    pub(crate) fn error(&self, message: &str, error: &SessionError) {
        if let Some(callback) = &self.on_error {
            callback(message, error);
        }
    }

    pub(crate) fn login(&self, user: &Value) {
        if let Some(callback) = &self.on_login {
            callback(user);
        }
    }

    pub(crate) fn logout(&self) {
        if let Some(callback) = &self.on_logout {
            callback();
        }
    }

    pub(crate) fn fetch_user(&self, user: &Value) {
        if let Some(callback) = &self.on_fetch_user {
            callback(user);
        }
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_error", &self.on_error.is_some())
            .field("on_login", &self.on_login.is_some())
            .field("on_logout", &self.on_logout.is_some())
            .field("on_session_expired", &self.on_session_expired.is_some())
            .field("on_fetch_user", &self.on_fetch_user.is_some())
            .finish()
    }
}
