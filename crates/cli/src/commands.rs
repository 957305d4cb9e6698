//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tollgate_http::{ApiRequest, HttpClient, ReqwestTransport};
use tollgate_session::router::{HistoryRouter, RouteRecord};
use tollgate_session::{
    App, AuthOptions, FileStorage, LoginResult, SessionManager, create_auth, use_auth,
};
use tracing::info;

use crate::config::{CliConfig, TOKENS_FILE};

#[derive(Subcommand)]
pub enum Commands {
    /// Exchange credentials for tokens and store them
    Login {
        #[arg(long)]
        username: String,

        #[arg(long, env = "TOLLGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored tokens
    Logout,

    /// Show the user behind the stored tokens
    Whoami,

    /// Authenticated GET; refreshes the access token on 401
    Get {
        /// Path relative to the base URL
        path: String,
    },
}

impl Commands {
    pub async fn execute(self, config: CliConfig, data_dir: PathBuf) -> Result<()> {
        let session = connect(&config, &data_dir)?;

        match self {
            Self::Login { username, password } => login(&session, &username, &password).await,
            Self::Logout => {
                // Nothing to restore before signing out; keeps the guard from waiting
                session.store().set_loading(false);
                session.logout().await;
                println!("Logged out");
                Ok(())
            }
            Self::Whoami => whoami(&session).await,
            Self::Get { path } => get(&session, &path).await,
        }
    }
}

/// Build a session over the configured API, persisting tokens under
/// `data_dir`
fn connect(config: &CliConfig, data_dir: &Path) -> Result<SessionManager> {
    let Some(base_url) = config.base_url.as_deref() else {
        bail!("No API base URL; pass --base-url or set TOLLGATE_BASE_URL");
    };

    let mut transport = ReqwestTransport::builder().base_url(base_url);
    if let Some(timeout) = config.request_timeout {
        transport = transport.timeout(timeout);
    }
    let http = HttpClient::new(Arc::new(transport.build()?));

    // A terminal has no pages; the router only anchors guard and logout
    // navigation
    let router = Arc::new(HistoryRouter::new(vec![
        RouteRecord::new("/").name("home"),
        RouteRecord::new("/login")
            .name(config.session.login_route_name.clone())
            .meta(config.session.public_meta_key.clone(), true),
    ]));

    let storage = FileStorage::new(data_dir.join(TOKENS_FILE));
    info!(path = %storage.path().display(), "using token file");

    let app = App::new();
    create_auth(
        AuthOptions::new()
            .config(config.session.clone())
            .http(http)
            .router(router)
            .storage(Arc::new(storage)),
    )
    .install(&app)?;

    Ok(use_auth(&app)?)
}

async fn login(session: &SessionManager, username: &str, password: &str) -> Result<()> {
    let credentials = json!({ "username": username, "password": password });

    match session.login(&credentials).await {
        LoginResult::Success { user } => {
            println!("Logged in");
            print_json(&user)
        }
        LoginResult::Failure { message, .. } => bail!("{message}"),
    }
}

async fn whoami(session: &SessionManager) -> Result<()> {
    session.initialize().await;

    match session.user() {
        Some(user) if session.is_authenticated() => print_json(&user),
        _ => bail!("Not logged in"),
    }
}

async fn get(session: &SessionManager, path: &str) -> Result<()> {
    let response = session
        .http()
        .send(ApiRequest::get(path))
        .await
        .with_context(|| format!("GET {path} failed"))?;

    print_json(&response.into_body())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
