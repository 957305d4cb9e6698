//! Session manager: login, logout, user fetch and token refresh

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::hooks::SessionHooks;
use crate::router::{NavigationTarget, Router};
use crate::storage::TokenStorage;
use crate::store::{SessionState, TokenStore};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tollgate_http::{ApiRequest, HttpClient};

/// Query marker attached when navigating to the login view after logout
pub const LOGOUT_QUERY: &str = "logout";

/// Query marker attached when navigating to the login view after expiry
pub const EXPIRED_QUERY: &str = "expired";

/// Message reported when a failed login carries no server-provided reason
pub const DEFAULT_LOGIN_ERROR: &str = "Login failed";

/// Base backoff between refresh attempts; attempt `n` waits `n` times this
const REFRESH_BACKOFF: Duration = Duration::from_millis(1000);

type RefreshFlight = Shared<BoxFuture<'static, Result<String>>>;

/// Outcome of [`SessionManager::login`]
#[derive(Debug, Clone)]
pub enum LoginResult {
    Success { user: Value },
    Failure { error: SessionError, message: String },
}

impl LoginResult {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Handle to one authentication session.
///
/// Cheap to clone; clones share state. The interceptors and the navigation
/// guard hold a [`WeakSession`] so that the HTTP client and router, which the
/// session itself owns, do not keep it alive.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

/// Non-owning handle to a [`SessionManager`]
#[derive(Clone)]
pub struct WeakSession {
    inner: Weak<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    hooks: SessionHooks,
    store: TokenStore,
    http: HttpClient,
    router: Arc<dyn Router>,
    refresh_flight: Mutex<Option<RefreshFlight>>,
}

impl WeakSession {
    pub fn upgrade(&self) -> Option<SessionManager> {
        self.inner.upgrade().map(|inner| SessionManager { inner })
    }
}

impl SessionManager {
    /// Build a session over its collaborators.
    ///
    /// This does not register interceptors or the navigation guard; the
    /// plugin's `install` does that.
    pub fn new(
        config: SessionConfig,
        hooks: SessionHooks,
        http: HttpClient,
        router: Arc<dyn Router>,
        storage: Arc<dyn TokenStorage>,
    ) -> Self {
        let store = TokenStore::new(storage, config.storage_keys.clone());
        Self {
            inner: Arc::new(SessionInner {
                config,
                hooks,
                store,
                http,
                router,
                refresh_flight: Mutex::new(None),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    pub fn router(&self) -> &Arc<dyn Router> {
        &self.inner.router
    }

    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    pub fn state(&self) -> SessionState {
        self.inner.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.store.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.store.snapshot().authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.inner.store.snapshot().loading
    }

    pub fn user(&self) -> Option<Value> {
        self.inner.store.snapshot().user
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.store.access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.store.refresh_token()
    }

    /// Overwrite the current user without a network call
    pub fn set_user(&self, user: Option<Value>) {
        self.inner.store.set_user(user);
    }

    /// Overwrite both tokens without a network call
    pub fn set_tokens(&self, access: Option<&str>, refresh: Option<&str>) {
        self.inner.store.set_tokens(access, refresh);
    }

    pub fn clear_auth(&self) {
        debug!("clearing session");
        self.inner.store.clear_auth();
    }

    /// Restore the session from stored tokens.
    ///
    /// A stored token that no longer yields a user clears the session; the
    /// failure is logged, never returned.
    pub async fn initialize(&self) {
        self.inner.store.set_loading(true);

        if self.access_token().is_some() {
            if let Err(err) = self.fetch_user().await {
                warn!(error = %err, "stored session could not be restored");
                self.clear_auth();
            }
        } else {
            debug!("no stored access token; starting signed out");
        }

        self.inner.store.set_loading(false);
    }

    /// Exchange credentials for tokens and load the user.
    ///
    /// Failures are reported through the returned [`LoginResult`] and the
    /// `on_error` hook, never as an `Err`.
    pub async fn login<C: Serialize + ?Sized>(&self, credentials: &C) -> LoginResult {
        self.inner.store.set_loading(true);
        let result = self.try_login(credentials).await;
        self.inner.store.set_loading(false);

        match result {
            Ok(user) => {
                info!("login succeeded");
                self.inner.hooks.login(&user);
                LoginResult::Success { user }
            }
            Err(error) => {
                let message = error.user_message(DEFAULT_LOGIN_ERROR);
                warn!(error = %error, %message, "login failed");
                self.inner.hooks.error(&message, &error);
                LoginResult::Failure { error, message }
            }
        }
    }

    async fn try_login<C: Serialize + ?Sized>(&self, credentials: &C) -> Result<Value> {
        let config = &self.inner.config;
        let request = ApiRequest::post(&config.endpoints.login).json(credentials)?;
        let body = self.inner.http.send(request).await?.into_body();

        let access = extract_token(&body, &config.access_token_fields())
            .ok_or_else(|| SessionError::MissingToken(config.token_key.clone()))?;
        let refresh = extract_token(&body, &config.refresh_token_fields());
        self.set_tokens(Some(&access), refresh.as_deref());

        self.fetch_user().await
    }

    /// Sign out: drop authentication, go to the login view, clear tokens.
    ///
    /// Never fails; navigation errors are logged.
    pub async fn logout(&self) {
        self.inner.store.set_authenticated(false);

        let target = NavigationTarget::named(&self.inner.config.login_route_name)
            .with_query(LOGOUT_QUERY, "true");
        if let Err(err) = self.inner.router.navigate(target).await {
            warn!(error = %err, "navigation to login failed during logout");
        }

        self.clear_auth();
        info!("logged out");
        self.inner.hooks.logout();
    }

    /// Load the current user; on failure the session is cleared and the
    /// error returned
    pub async fn fetch_user(&self) -> Result<Value> {
        self.inner.store.set_loading(true);

        let request = ApiRequest::get(&self.inner.config.endpoints.user);
        let result = match self.inner.http.send(request).await {
            Ok(response) => {
                let user = response.into_body();
                self.inner.store.authenticate(user.clone());
                self.inner.hooks.fetch_user(&user);
                Ok(user)
            }
            Err(err) => {
                debug!(error = %err, "fetching user failed");
                self.clear_auth();
                Err(err.into())
            }
        };

        self.inner.store.set_loading(false);
        result
    }

    /// Obtain a new access token with the refresh token.
    ///
    /// Concurrent callers share a single in-flight refresh; whoever arrives
    /// while one is running waits for its outcome instead of starting another.
    /// The refresh runs as its own task, so it completes and leaves the slot
    /// even when every caller stops waiting.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let flight = {
            let mut slot = self
                .inner
                .refresh_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(flight) = slot.as_ref() {
                debug!("joining in-flight token refresh");
                flight.clone()
            } else {
                let flight = self.start_refresh_flight();
                *slot = Some(flight.clone());
                flight
            }
        };

        flight.await
    }

    /// Spawn a refresh task; called with the flight slot locked, so the task
    /// cannot clear the slot before it is filled
    fn start_refresh_flight(&self) -> RefreshFlight {
        let session = self.clone();
        let task = tokio::spawn(async move {
            let result = session.run_refresh().await;
            session.end_refresh_flight();
            result
        });

        let weak = self.downgrade();
        async move {
            task.await.unwrap_or_else(|err| {
                // A panicked or aborted task never cleared its own slot
                if let Some(session) = weak.upgrade() {
                    session.end_refresh_flight();
                }
                Err(SessionError::RefreshAborted(err.to_string()))
            })
        }
        .boxed()
        .shared()
    }

    fn end_refresh_flight(&self) {
        *self
            .inner
            .refresh_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn run_refresh(&self) -> Result<String> {
        if self.refresh_token().is_none() {
            warn!("token refresh requested without a refresh token");
            self.clear_auth();
            return Err(SessionError::NoRefreshToken);
        }

        let max_attempts = self.inner.config.max_retries.max(1);
        let mut last_error = SessionError::NoRefreshToken;
        let mut last_sent = None;

        for attempt in 1..=max_attempts {
            // Re-read each time: a login during the backoff replaces the token
            let Some(refresh) = self.refresh_token() else {
                debug!(attempt, "refresh token cleared during refresh");
                return Err(SessionError::NoRefreshToken);
            };

            match self.request_access_token(&refresh).await {
                Ok(access) => {
                    if self.refresh_token().as_deref() != Some(refresh.as_str()) {
                        debug!(attempt, "session changed during refresh; keeping newer tokens");
                        return self.access_token().ok_or(SessionError::NoRefreshToken);
                    }
                    self.set_tokens(Some(&access), Some(&refresh));
                    info!(attempt, "access token refreshed");
                    return Ok(access);
                }
                Err(err) => {
                    warn!(attempt, max_attempts, error = %err, "token refresh attempt failed");
                    last_error = err;
                    last_sent = Some(refresh);
                    if attempt < max_attempts {
                        tokio::time::sleep(REFRESH_BACKOFF * attempt).await;
                    }
                }
            }
        }

        if self.refresh_token() == last_sent {
            self.clear_auth();
        } else {
            debug!("session changed during refresh; not clearing newer tokens");
        }
        Err(last_error)
    }

    async fn request_access_token(&self, refresh: &str) -> Result<String> {
        let config = &self.inner.config;
        let mut body = Map::new();
        body.insert(
            config.refresh_token_key.clone(),
            Value::String(refresh.to_string()),
        );

        let request = ApiRequest::post(&config.endpoints.refresh)
            .json(&body)?
            .skip_auth_refresh();
        let response = self.inner.http.send(request).await?.into_body();

        extract_token(&response, &config.access_token_fields())
            .ok_or_else(|| SessionError::MissingToken(config.token_key.clone()))
    }

    /// Handle a session that can no longer be refreshed.
    ///
    /// Runs the `on_session_expired` hook when one is configured; otherwise
    /// clears the session and navigates to the login view with an expiry
    /// marker.
    pub async fn expire_session(&self) {
        if let Some(callback) = &self.inner.hooks.on_session_expired {
            callback();
            return;
        }

        info!("session expired");
        self.clear_auth();
        // The outcome is settled; a guard must not wait on an in-flight fetch
        self.inner.store.set_loading(false);
        let target = NavigationTarget::named(&self.inner.config.login_route_name)
            .with_query(EXPIRED_QUERY, "true");
        if let Err(err) = self.inner.router.navigate(target).await {
            warn!(error = %err, "navigation to login failed after session expiry");
        }
    }
}

/// First non-empty string among `fields` in a token response
pub(crate) fn extract_token(body: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .find(|token| !token.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{NavigationHook, RouteRef, RouterError};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tollgate_http::{ApiResponse, ClientError, StatusCode, Transport};

    mock! {
        pub Router {}

        #[async_trait]
        impl Router for Router {
            async fn navigate(
                &self,
                target: NavigationTarget,
            ) -> std::result::Result<(), RouterError>;
            fn before_each(&self, hook: Arc<dyn NavigationHook>);
        }
    }

    /// Fails every call, counting attempts
    struct DownTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for DownTransport {
        async fn send(
            &self,
            _request: &ApiRequest,
        ) -> std::result::Result<ApiResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::from_status(
                StatusCode::SERVICE_UNAVAILABLE,
                "down".into(),
                None,
            ))
        }
    }

    fn session(router: MockRouter, storage: &MemoryStorage, hooks: SessionHooks) -> SessionManager {
        let transport = Arc::new(DownTransport {
            calls: AtomicUsize::new(0),
        });
        SessionManager::new(
            SessionConfig::default(),
            hooks,
            HttpClient::new(transport),
            Arc::new(router),
            Arc::new(storage.clone()),
        )
    }

    #[test]
    fn test_extract_token_fallbacks() {
        let config = SessionConfig::default();
        let fields = config.access_token_fields();

        assert_eq!(
            extract_token(&json!({"token": "T", "access": "A"}), &fields).as_deref(),
            Some("T")
        );
        assert_eq!(
            extract_token(&json!({"access": "A"}), &fields).as_deref(),
            Some("A")
        );
        assert_eq!(
            extract_token(&json!({"token": "", "access": "A"}), &fields).as_deref(),
            Some("A")
        );
        assert_eq!(extract_token(&json!({"access": 5}), &fields), None);
        assert_eq!(extract_token(&Value::Null, &fields), None);

        let refresh_fields = config.refresh_token_fields();
        assert_eq!(
            extract_token(&json!({"refresh_token": "R"}), &refresh_fields).as_deref(),
            Some("R")
        );
    }

    #[tokio::test]
    async fn test_logout_navigates_then_clears() {
        let mut router = MockRouter::new();
        router
            .expect_navigate()
            .withf(|target| {
                target.to == RouteRef::Name("login".into())
                    && target.query.get(LOGOUT_QUERY).map(String::as_str) == Some("true")
                    && !target.replace
            })
            .times(1)
            .returning(|_| Ok(()));

        let logouts = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let logouts = logouts.clone();
            SessionHooks::new().on_logout(move || {
                logouts.fetch_add(1, Ordering::SeqCst);
            })
        };
        let storage = MemoryStorage::new();
        let session = session(router, &storage, hooks);
        session.set_tokens(Some("a1"), Some("r1"));
        session.store().authenticate(json!({"id": 1}));

        session.logout().await;

        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
        assert!(storage.is_empty());
        assert_eq!(logouts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logout_swallows_navigation_failure() {
        let mut router = MockRouter::new();
        router
            .expect_navigate()
            .returning(|_| Err(RouterError::Navigation("window closed".into())));

        let storage = MemoryStorage::with_entries([("access_token", "a1")]);
        let session = session(router, &storage, SessionHooks::new());

        session.logout().await;
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_default_expiry_redirects_with_marker() {
        let mut router = MockRouter::new();
        router
            .expect_navigate()
            .withf(|target| target.query.get(EXPIRED_QUERY).map(String::as_str) == Some("true"))
            .times(1)
            .returning(|_| Ok(()));

        let storage =
            MemoryStorage::with_entries([("access_token", "a1"), ("refresh_token", "r1")]);
        let session = session(router, &storage, SessionHooks::new());

        session.expire_session().await;
        assert!(session.refresh_token().is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_expiry_hook_replaces_default() {
        let router = MockRouter::new();
        let expired = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let expired = expired.clone();
            SessionHooks::new().on_session_expired(move || {
                expired.fetch_add(1, Ordering::SeqCst);
            })
        };
        let storage = MemoryStorage::with_entries([("access_token", "a1")]);
        let session = session(router, &storage, hooks);

        session.expire_session().await;
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        // The hook owns the reaction; nothing was cleared for it
        assert_eq!(session.access_token().as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_refresh_without_token_clears_immediately() {
        let storage = MemoryStorage::with_entries([("access_token", "a1")]);
        let session = session(MockRouter::new(), &storage, SessionHooks::new());

        let err = session.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, SessionError::NoRefreshToken));
        assert!(session.access_token().is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_without_token_skips_fetch() {
        let session = session(MockRouter::new(), &MemoryStorage::new(), SessionHooks::new());
        assert!(session.is_loading());

        session.initialize().await;

        let state = session.state();
        assert!(!state.loading);
        assert!(!state.authenticated);
    }

    #[tokio::test]
    async fn test_initialize_with_bad_token_clears() {
        let storage = MemoryStorage::with_entries([("access_token", "stale")]);
        let session = session(MockRouter::new(), &storage, SessionHooks::new());

        session.initialize().await;

        let state = session.state();
        assert!(!state.loading);
        assert!(!state.authenticated);
        assert!(state.access_token.is_none());
        assert!(storage.is_empty());
    }

    /// Refresh endpoint that can be taken down; answers `fresh-<refresh>`
    struct FlakyRefresh {
        down: AtomicBool,
        latency: Duration,
        sent: Mutex<Vec<Value>>,
    }

    impl FlakyRefresh {
        fn new(down: bool) -> Arc<Self> {
            Self::slow(down, Duration::ZERO)
        }

        fn slow(down: bool, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                down: AtomicBool::new(down),
                latency,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<Value> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FlakyRefresh {
        async fn send(
            &self,
            request: &ApiRequest,
        ) -> std::result::Result<ApiResponse, ClientError> {
            let body = request.body.clone().unwrap_or(Value::Null);
            self.sent.lock().unwrap().push(body.clone());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.down.load(Ordering::SeqCst) {
                return Err(ClientError::Transport("connection refused".into()));
            }
            let refresh = body["refresh"].as_str().unwrap_or_default();
            Ok(ApiResponse::new(
                StatusCode::OK,
                Some(json!({"access": format!("fresh-{refresh}")})),
            ))
        }
    }

    fn signed_in() -> MemoryStorage {
        MemoryStorage::with_entries([("access_token", "a1"), ("refresh_token", "r1")])
    }

    fn flaky_session(transport: Arc<FlakyRefresh>, storage: &MemoryStorage) -> SessionManager {
        SessionManager::new(
            SessionConfig::default(),
            SessionHooks::new(),
            HttpClient::new(transport),
            Arc::new(MockRouter::new()),
            Arc::new(storage.clone()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_refresh_uses_newer_refresh_token() {
        let transport = FlakyRefresh::new(true);
        let storage = signed_in();
        let session = flaky_session(transport.clone(), &storage);

        // Give up while the first attempt's backoff is running
        let waited =
            tokio::time::timeout(Duration::from_millis(500), session.refresh_access_token()).await;
        assert!(waited.is_err());

        session.set_tokens(Some("a2"), Some("r2"));
        transport.down.store(false, Ordering::SeqCst);

        let token = session.refresh_access_token().await.unwrap();

        assert_eq!(token, "fresh-r2");
        assert_eq!(transport.sent(), [json!({"refresh": "r1"}), json!({"refresh": "r2"})]);
        assert_eq!(session.refresh_token().as_deref(), Some("r2"));
        assert_eq!(storage.peek("refresh_token").as_deref(), Some("r2"));
        assert_eq!(storage.peek("access_token").as_deref(), Some("fresh-r2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_refresh_finishes_and_frees_the_slot() {
        let transport = FlakyRefresh::new(true);
        let storage = signed_in();
        let session = flaky_session(transport.clone(), &storage);

        let waited =
            tokio::time::timeout(Duration::from_millis(500), session.refresh_access_token()).await;
        assert!(waited.is_err());
        transport.down.store(false, Ordering::SeqCst);

        // Nobody is waiting, yet the refresh still completes
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(session.access_token().as_deref(), Some("fresh-r1"));
        assert!(session.inner.refresh_flight.lock().unwrap().is_none());

        // The next refresh is a new flight rather than the finished one
        session.refresh_access_token().await.unwrap();
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_tokens_replaced_meanwhile() {
        let transport = FlakyRefresh::slow(true, Duration::from_secs(1));
        let storage = signed_in();
        let session = SessionManager::new(
            SessionConfig {
                max_retries: 1,
                ..SessionConfig::default()
            },
            SessionHooks::new(),
            HttpClient::new(transport),
            Arc::new(MockRouter::new()),
            Arc::new(storage.clone()),
        );

        let refresh = tokio::spawn({
            let session = session.clone();
            async move { session.refresh_access_token().await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.set_tokens(Some("a2"), Some("r2"));

        assert!(refresh.await.unwrap().is_err());
        assert_eq!(session.access_token().as_deref(), Some("a2"));
        assert_eq!(storage.peek("refresh_token").as_deref(), Some("r2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_refresh_result_does_not_overwrite_newer_tokens() {
        let transport = FlakyRefresh::slow(false, Duration::from_secs(1));
        let storage = signed_in();
        let session = flaky_session(transport, &storage);

        let refresh = tokio::spawn({
            let session = session.clone();
            async move { session.refresh_access_token().await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.set_tokens(Some("a2"), Some("r2"));

        assert_eq!(refresh.await.unwrap().unwrap(), "a2");
        assert_eq!(storage.peek("access_token").as_deref(), Some("a2"));
        assert_eq!(storage.peek("refresh_token").as_deref(), Some("r2"));
    }

    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn send(
            &self,
            _request: &ApiRequest,
        ) -> std::result::Result<ApiResponse, ClientError> {
            panic!("transport exploded");
        }
    }

    #[tokio::test]
    async fn test_panicked_refresh_reports_and_frees_the_slot() {
        let session = SessionManager::new(
            SessionConfig::default(),
            SessionHooks::new(),
            HttpClient::new(Arc::new(PanickingTransport)),
            Arc::new(MockRouter::new()),
            Arc::new(signed_in()),
        );

        let err = session.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, SessionError::RefreshAborted(_)));
        assert!(session.inner.refresh_flight.lock().unwrap().is_none());
        // Nothing ran to completion, so the tokens are untouched
        assert_eq!(session.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn test_set_user_overwrites_without_authenticating() {
        let session = session(MockRouter::new(), &MemoryStorage::new(), SessionHooks::new());

        session.set_user(Some(json!({"id": 7})));
        assert_eq!(session.user().unwrap()["id"], 7);
        assert!(!session.is_authenticated());

        session.set_user(None);
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_weak_session_does_not_keep_alive() {
        let session = session(MockRouter::new(), &MemoryStorage::new(), SessionHooks::new());
        let weak = session.downgrade();
        assert!(weak.upgrade().is_some());
        drop(session);
        assert!(weak.upgrade().is_none());
    }
}
