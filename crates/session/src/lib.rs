//! Session-token authentication for API clients
//!
//! Tollgate keeps an access token and a refresh token, attaches the access
//! token to outgoing requests, transparently refreshes and replays requests
//! rejected with 401, and guards navigation to protected routes.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tollgate_http::HttpClient;
//! use tollgate_session::router::{HistoryRouter, RouteRecord};
//! use tollgate_session::{App, AuthOptions, create_auth, use_auth};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let router = Arc::new(HistoryRouter::new(vec![
//!     RouteRecord::new("/login").name("login").meta("public", true),
//!     RouteRecord::new("/dashboard").meta("auth", true),
//! ]));
//! let app = App::new();
//! create_auth(
//!     AuthOptions::new()
//!         .http(HttpClient::with_base_url("https://api.example.com")?)
//!         .router(router),
//! )
//! .install(&app)?;
//!
//! let session = use_auth(&app)?;
//! let result = session
//!     .login(&serde_json::json!({"username": "ana", "password": "secret"}))
//!     .await;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod guard;
pub mod hooks;
pub mod interceptor;
pub mod manager;
pub mod plugin;
pub mod router;
pub mod storage;
pub mod store;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use guard::NavigationGuard;
pub use hooks::SessionHooks;
pub use interceptor::AuthInterceptor;
pub use manager::{LoginResult, SessionManager, WeakSession};
pub use plugin::{App, AuthOptions, AuthPlugin, create_auth, use_auth};
pub use storage::{FileStorage, MemoryStorage, StorageError, TokenStorage};
pub use store::{SessionState, TokenStore};
