//! Plugin installation and session lookup
//!
//! [`create_auth`] bundles configuration and collaborators into an
//! [`AuthPlugin`]. Installing it into an [`App`] builds the session, registers
//! the interceptors on the HTTP client and the guard on the router, and makes
//! the session available to [`use_auth`].

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::guard::NavigationGuard;
use crate::hooks::SessionHooks;
use crate::interceptor::AuthInterceptor;
use crate::manager::SessionManager;
use crate::router::Router;
use crate::storage::{MemoryStorage, TokenStorage};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tollgate_http::HttpClient;

/// Application context that installed plugins provide values into
#[derive(Default)]
pub struct App {
    provides: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `value` available to [`App::inject`], replacing any previous value
    /// of the same type
    pub fn provide<T: Any + Send + Sync>(&self, value: T) {
        self.provides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn inject<T: Any + Send + Sync + Clone>(&self) -> Option<T> {
        self.provides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }
}

/// Everything needed to build a session
#[derive(Clone, Default)]
pub struct AuthOptions {
    pub config: SessionConfig,
    pub hooks: SessionHooks,
    pub http: Option<HttpClient>,
    pub router: Option<Arc<dyn Router>>,
    pub storage: Option<Arc<dyn TokenStorage>>,
}

impl AuthOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: SessionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn http(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    #[must_use]
    pub fn router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// Token persistence; defaults to [`MemoryStorage`]
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }
}

/// An installable authentication plugin
#[derive(Clone)]
pub struct AuthPlugin {
    options: AuthOptions,
}

/// Create an installable plugin from `options`
pub fn create_auth(options: AuthOptions) -> AuthPlugin {
    AuthPlugin { options }
}

impl AuthPlugin {
    /// Build the session and wire it into `app`.
    ///
    /// The HTTP client and router become owned by this session: its
    /// interceptors and guard are registered on them, so installing a second
    /// session over the same client makes both attach whichever bearer the
    /// last-registered interceptor holds. Give each installation its own.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingCollaborator`] when no HTTP client or
    /// no router was supplied.
    pub fn install(&self, app: &App) -> Result<SessionManager> {
        let http = self
            .options
            .http
            .clone()
            .ok_or(SessionError::MissingCollaborator("http"))?;
        let router = self
            .options
            .router
            .clone()
            .ok_or(SessionError::MissingCollaborator("router"))?;
        let storage = self
            .options
            .storage
            .clone()
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let session = SessionManager::new(
            self.options.config.clone(),
            self.options.hooks.clone(),
            http.clone(),
            router.clone(),
            storage,
        );

        Arc::new(AuthInterceptor::new(&session)).register(&http);
        router.before_each(Arc::new(NavigationGuard::new(&session)));
        app.provide(session.clone());

        if self.options.config.auto_initialize {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let session = session.clone();
                    handle.spawn(async move { session.initialize().await });
                }
                Err(_) => debug!("no tokio runtime; call initialize() to restore the session"),
            }
        }

        info!("auth plugin installed");
        Ok(session)
    }
}

/// The session installed into `app`
///
/// # Errors
///
/// Returns [`SessionError::NotInstalled`] before [`AuthPlugin::install`] ran.
pub fn use_auth(app: &App) -> Result<SessionManager> {
    app.inject::<SessionManager>()
        .ok_or(SessionError::NotInstalled)
}
