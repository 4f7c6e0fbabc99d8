//! portald - terminal-style multi-user chat daemon.
//!
//! Clients connect over WebSocket or plain TCP, present a login token and
//! then exchange lines that are either chat messages (global, portal-scoped
//! or direct) or server commands.

mod auth;
mod config;
mod error;
mod handlers;
mod http;
mod metrics;
mod network;
mod render;
mod state;
mod telemetry;

use crate::auth::{AuthProvider, HmacTokenAuth, MemoryUserDirectory};
use crate::config::{Config, LogFormat, LoggingConfig};
use crate::handlers::Registry;
use crate::network::Gateway;
use crate::state::Matrix;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Set to run without `auth.secret`, with a secret generated per process.
const ALLOW_EPHEMERAL_SECRET_ENV: &str = "PORTALD_ALLOW_EPHEMERAL_SECRET";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!(path = %config_path, error = %e, "Failed to load config");
            return Err(e.into());
        }
    };

    init_tracing(&config.logging);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s). See error messages above.",
            errors.len()
        ));
    }

    info!(server = %config.server.name, "Starting portald");

    // SECURITY: tokens signed with a per-process secret stop working on restart,
    // so running without a configured secret must be asked for explicitly.
    let secret = match config.auth.secret {
        Some(ref secret) => secret.clone(),
        None if std::env::var(ALLOW_EPHEMERAL_SECRET_ENV).is_ok() => {
            warn!(
                "Running with a generated auth.secret (allowed via {}); tokens will not survive a restart",
                ALLOW_EPHEMERAL_SECRET_ENV
            );
            config::generated_secret()
        }
        None => {
            error!("FATAL: auth.secret is not set!");
            error!("  The secret signs the tokens clients use to connect.");
            error!("");
            error!("  To fix, set a strong secret in config.toml:");
            error!("    [auth]");
            error!("    secret = \"<random-32-char-string>\"");
            error!("");
            error!("  For testing only, set {}=1 to bypass this check.", ALLOW_EPHEMERAL_SECRET_ENV);
            return Err(anyhow::anyhow!(
                "Refusing to start without auth.secret. See error messages above."
            ));
        }
    };

    // Initialize Prometheus metrics
    metrics::init();

    let tokens = Arc::new(HmacTokenAuth::new(&secret));
    let directory = Arc::new(MemoryUserDirectory::seeded(&config.auth.users));
    if directory.is_empty() {
        info!("No seeded accounts; /login creates them on first use");
    } else {
        info!(accounts = directory.len(), "User directory loaded");
    }

    let matrix = Arc::new(Matrix::new(&config));
    info!(motd_lines = matrix.motd.len(), "Shared state initialized");

    // Start HTTP server for /metrics and /login
    if config.server.metrics_port != 0 {
        let port = config.server.metrics_port;
        let login = http::LoginState {
            directory,
            tokens: Arc::clone(&tokens),
            max_name_length: config.limits.max_name_length,
        };
        tokio::spawn(async move {
            http::run_http_server(port, login).await;
        });
        info!(port, "HTTP server started");
    }

    // Create command handler registry
    let registry = Arc::new(Registry::new());
    info!(commands = registry.names().len(), "Command registry built");

    let auth: Arc<dyn AuthProvider> = tokens;
    let gateway = Gateway::bind(&config, Arc::clone(&matrix), registry, auth).await?;

    tokio::select! {
        result = gateway.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            let uptime = chrono::Utc::now() - matrix.server_info.started;
            info!(
                connected = ?matrix.sessions.usernames(),
                uptime_secs = uptime.num_seconds(),
                "Shutting down"
            );
        }
    }

    Ok(())
}

/// Initialize tracing. `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
