//! Router seam and an in-memory history router
//!
//! The session only needs two things from a router: a way to navigate and a
//! way to register a hook that runs before every transition. [`HistoryRouter`]
//! implements both over a static route table and an in-memory history stack.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;

/// Maximum guard redirects followed by one navigation
const MAX_REDIRECTS: usize = 10;

pub type Query = BTreeMap<String, String>;
pub type RouteMeta = BTreeMap<String, Value>;

/// Router errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("No route matches {0}")]
    NotFound(String),

    #[error("Navigation to {0} exceeded the redirect limit")]
    RedirectLoop(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

/// Where to navigate: a named route or a path (which may carry a query string)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRef {
    Name(String),
    Path(String),
}

/// A navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub to: RouteRef,
    pub query: Query,
    /// Replace the current history entry instead of pushing a new one
    pub replace: bool,
}

impl NavigationTarget {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            to: RouteRef::Name(name.into()),
            query: Query::new(),
            replace: false,
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self {
            to: RouteRef::Path(path.into()),
            query: Query::new(),
            replace: false,
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query_map(mut self, query: Query) -> Self {
        self.query.extend(query);
        self
    }

    #[must_use]
    pub const fn replace(mut self) -> Self {
        self.replace = true;
        self
    }
}

/// A resolved route: the target of a transition as guards see it
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLocation {
    pub name: Option<String>,
    pub path: String,
    pub query: Query,
    /// Meta of every matched record, outermost first
    pub matched: Vec<RouteMeta>,
}

impl RouteLocation {
    /// Path plus query string
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{query}", self.path)
    }

    /// Whether any matched record sets `key` to `true`
    pub fn meta_flag(&self, key: &str) -> bool {
        self.matched
            .iter()
            .any(|meta| meta.get(key).and_then(Value::as_bool) == Some(true))
    }
}

/// What a guard decided about a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Proceed,
    Redirect(NavigationTarget),
}

/// Hook run before every route transition
#[async_trait]
pub trait NavigationHook: Send + Sync {
    async fn before_each(&self, to: &RouteLocation, from: Option<&RouteLocation>)
    -> GuardOutcome;
}

/// The router collaborator
#[async_trait]
pub trait Router: Send + Sync {
    /// Navigate, running registered hooks first
    async fn navigate(&self, target: NavigationTarget) -> Result<(), RouterError>;

    /// Register a hook to run before every transition
    fn before_each(&self, hook: Arc<dyn NavigationHook>);
}

/// A route table entry; children paths are relative to their parent
#[derive(Debug, Clone, Default)]
pub struct RouteRecord {
    pub name: Option<String>,
    pub path: String,
    pub meta: RouteMeta,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }
}

/// A history entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub location: RouteLocation,
}

#[derive(Debug, Clone)]
struct FlatRoute {
    name: Option<String>,
    path: String,
    matched: Vec<RouteMeta>,
}

/// In-memory router with a history stack
pub struct HistoryRouter {
    routes: Vec<FlatRoute>,
    history: Mutex<Vec<HistoryEntry>>,
    hooks: RwLock<Vec<Arc<dyn NavigationHook>>>,
}

impl HistoryRouter {
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        let mut flat = Vec::new();
        flatten(&routes, "", &[], &mut flat);
        Self {
            routes: flat,
            history: Mutex::new(Vec::new()),
            hooks: RwLock::new(Vec::new()),
        }
    }

    /// Current location, `None` before the first navigation
    pub fn current(&self) -> Option<RouteLocation> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|entry| entry.location.clone())
    }

    /// The whole history stack, oldest first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve a target against the route table without navigating
    pub fn resolve(&self, target: &NavigationTarget) -> Result<RouteLocation, RouterError> {
        let (route, mut query) = match &target.to {
            RouteRef::Name(name) => {
                let route = self
                    .routes
                    .iter()
                    .find(|r| r.name.as_deref() == Some(name.as_str()))
                    .ok_or_else(|| RouterError::NotFound(format!("route named `{name}`")))?;
                (route, Query::new())
            }
            RouteRef::Path(raw) => {
                let (path, query) = split_query(raw);
                let path = normalize(path);
                let route = self
                    .routes
                    .iter()
                    .find(|r| r.path == path)
                    .ok_or_else(|| RouterError::NotFound(path.clone()))?;
                (route, query)
            }
        };
        query.extend(target.query.clone());

        Ok(RouteLocation {
            name: route.name.clone(),
            path: route.path.clone(),
            query,
            matched: route.matched.clone(),
        })
    }

    fn commit(&self, location: RouteLocation, replace: bool) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = HistoryEntry { location };
        if replace && !history.is_empty() {
            let last = history.len() - 1;
            history[last] = entry;
        } else {
            history.push(entry);
        }
    }
}

#[async_trait]
impl Router for HistoryRouter {
    async fn navigate(&self, target: NavigationTarget) -> Result<(), RouterError> {
        let mut target = target;
        for _ in 0..MAX_REDIRECTS {
            let to = self.resolve(&target)?;
            let from = self.current();
            let hooks = self
                .hooks
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();

            let mut outcome = GuardOutcome::Proceed;
            for hook in &hooks {
                outcome = hook.before_each(&to, from.as_ref()).await;
                if outcome != GuardOutcome::Proceed {
                    break;
                }
            }

            match outcome {
                GuardOutcome::Proceed => {
                    debug!(
                        path = %to.full_path(),
                        replace = target.replace,
                        "navigation committed"
                    );
                    self.commit(to, target.replace);
                    return Ok(());
                }
                GuardOutcome::Redirect(next) => {
                    debug!(from = %to.full_path(), to = ?next.to, "navigation redirected");
                    target = next;
                }
            }
        }

        Err(RouterError::RedirectLoop(format!("{:?}", target.to)))
    }

    fn before_each(&self, hook: Arc<dyn NavigationHook>) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }
}

fn flatten(records: &[RouteRecord], base: &str, parents: &[RouteMeta], out: &mut Vec<FlatRoute>) {
    for record in records {
        let path = if record.path.starts_with('/') {
            normalize(&record.path)
        } else {
            normalize(&format!("{base}/{}", record.path))
        };
        let mut matched = parents.to_vec();
        matched.push(record.meta.clone());

        out.push(FlatRoute {
            name: record.name.clone(),
            path: path.clone(),
            matched: matched.clone(),
        });
        flatten(&record.children, &path, &matched, out);
    }
}

fn split_query(raw: &str) -> (&str, Query) {
    match raw.split_once('?') {
        Some((path, query)) => (
            path,
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        ),
        None => (raw, Query::new()),
    }
}

/// Collapse duplicate slashes and drop a trailing slash (except for the root)
fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> Vec<RouteRecord> {
        vec![
            RouteRecord::new("/").name("home"),
            RouteRecord::new("/login").name("login").meta("public", true),
            RouteRecord::new("/admin")
                .name("admin")
                .meta("auth", true)
                .child(RouteRecord::new("users").name("admin-users")),
        ]
    }

    struct RedirectTo(&'static str);

    #[async_trait]
    impl NavigationHook for RedirectTo {
        async fn before_each(
            &self,
            to: &RouteLocation,
            _from: Option<&RouteLocation>,
        ) -> GuardOutcome {
            if to.path == self.0 {
                GuardOutcome::Proceed
            } else {
                GuardOutcome::Redirect(NavigationTarget::path(self.0))
            }
        }
    }

    struct AlwaysRedirect;

    #[async_trait]
    impl NavigationHook for AlwaysRedirect {
        async fn before_each(
            &self,
            to: &RouteLocation,
            _from: Option<&RouteLocation>,
        ) -> GuardOutcome {
            GuardOutcome::Redirect(NavigationTarget::path(to.path.clone()))
        }
    }

    #[test]
    fn test_resolve_nested_route_inherits_meta() {
        let router = HistoryRouter::new(routes());
        let location = router
            .resolve(&NavigationTarget::path("/admin/users/?tab=active"))
            .unwrap();

        assert_eq!(location.name.as_deref(), Some("admin-users"));
        assert_eq!(location.path, "/admin/users");
        assert_eq!(location.query.get("tab").map(String::as_str), Some("active"));
        assert_eq!(location.matched.len(), 2);
        assert!(location.meta_flag("auth"));
        assert!(!location.meta_flag("public"));
    }

    #[test]
    fn test_resolve_by_name_merges_query() {
        let router = HistoryRouter::new(routes());
        let location = router
            .resolve(&NavigationTarget::named("login").with_query("redirect", "/admin?x=1&y=2"))
            .unwrap();
        assert_eq!(location.path, "/login");
        assert_eq!(location.full_path(), "/login?redirect=%2Fadmin%3Fx%3D1%26y%3D2");
    }

    #[test]
    fn test_unknown_route() {
        let router = HistoryRouter::new(routes());
        assert!(matches!(
            router.resolve(&NavigationTarget::named("nope")),
            Err(RouterError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_push_and_replace() {
        let router = HistoryRouter::new(routes());
        router.navigate(NavigationTarget::path("/")).await.unwrap();
        router.navigate(NavigationTarget::path("/admin")).await.unwrap();
        router
            .navigate(NavigationTarget::path("/login").replace())
            .await
            .unwrap();

        let history: Vec<String> = router
            .history()
            .into_iter()
            .map(|entry| entry.location.path)
            .collect();
        assert_eq!(history, ["/", "/login"]);
    }

    #[tokio::test]
    async fn test_hook_redirect_is_followed() {
        let router = HistoryRouter::new(routes());
        router.before_each(Arc::new(RedirectTo("/login")));

        router.navigate(NavigationTarget::path("/admin")).await.unwrap();
        assert_eq!(router.current().unwrap().path, "/login");
        assert_eq!(router.history().len(), 1);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_an_error() {
        let router = HistoryRouter::new(routes());
        router.before_each(Arc::new(AlwaysRedirect));

        let result = router.navigate(NavigationTarget::path("/")).await;
        assert!(matches!(result, Err(RouterError::RedirectLoop(_))));
        assert!(router.current().is_none());
    }
}
