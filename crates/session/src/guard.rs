//! Navigation guard
//!
//! Decides, before each transition, whether the target route may be shown to
//! the current session. Decisions wait for the session to finish loading so a
//! restored session is not bounced to the login view while its user is still
//! being fetched.

use crate::manager::{LOGOUT_QUERY, SessionManager, WeakSession};
use crate::router::{GuardOutcome, NavigationHook, NavigationTarget, RouteLocation};
use async_trait::async_trait;

/// Query parameter carrying the originally requested path
pub const REDIRECT_QUERY: &str = "redirect";

pub struct NavigationGuard {
    session: WeakSession,
}

impl NavigationGuard {
    pub fn new(session: &SessionManager) -> Self {
        Self {
            session: session.downgrade(),
        }
    }

    /// Classify `to` and decide
    pub async fn check(&self, to: &RouteLocation) -> GuardOutcome {
        let Some(session) = self.session.upgrade() else {
            return GuardOutcome::Proceed;
        };
        let config = session.config();

        if session.is_loading()
            && !session
                .store()
                .wait_until_loaded(config.guard_timeout())
                .await
        {
            warn!(
                path = %to.path,
                timeout_ms = config.guard_timeout_ms,
                "session still loading; continuing navigation"
            );
        }

        if to.query.contains_key(LOGOUT_QUERY) {
            let mut query = to.query.clone();
            query.remove(LOGOUT_QUERY);
            return GuardOutcome::Redirect(
                NavigationTarget::path(to.path.clone())
                    .with_query_map(query)
                    .replace(),
            );
        }

        let authenticated = session.is_authenticated();
        let is_login_page = to.name.as_deref().is_some_and(|name| {
            name == config.login_route_name || name == config.reset_password_route_name
        });

        if is_login_page && authenticated {
            let destination = to
                .query
                .get(REDIRECT_QUERY)
                .cloned()
                .unwrap_or_else(|| config.default_redirect.clone());
            return GuardOutcome::Redirect(NavigationTarget::path(destination).replace());
        }

        if to.meta_flag(&config.public_meta_key) {
            return GuardOutcome::Proceed;
        }

        if to.meta_flag(&config.auth_meta_key) && !authenticated {
            debug!(path = %to.full_path(), "unauthenticated navigation to protected route");
            return GuardOutcome::Redirect(
                NavigationTarget::named(&config.login_route_name)
                    .with_query(REDIRECT_QUERY, to.full_path()),
            );
        }

        GuardOutcome::Proceed
    }
}

#[async_trait]
impl NavigationHook for NavigationGuard {
    async fn before_each(
        &self,
        to: &RouteLocation,
        _from: Option<&RouteLocation>,
    ) -> GuardOutcome {
        self.check(to).await
    }
}
