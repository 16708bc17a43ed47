//! `AccessLedger` - read-only file gateway with per-user access audit mail.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use accessledger::{AppState, build_router};
use accessledger_core::{AuditPipeline, Config, PermissionTable, SmtpNotifier};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable overriding the configuration file path.
const CONFIG_ENV: &str = "ACCESSLEDGER_CONFIG";
/// Environment variable overriding the permission table path.
const USERS_ENV: &str = "ACCESSLEDGER_USERS";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "accessledger=info,accessledger_core=info,accessledger_smtp=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AccessLedger");

    let users_path = path_from_env(USERS_ENV, "users.json");
    let users = PermissionTable::load(&users_path)
        .with_context(|| format!("failed to load users from {}", users_path.display()))?;
    info!("loaded {} allowed users", users.len());

    let config_path = path_from_env(CONFIG_ENV, "config.json");
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;
    info!("using config {config:?}");

    let notifier = SmtpNotifier::from_config(&config.smtp).context("invalid SMTP settings")?;
    info!("audit mail goes through {}", notifier.relay());
    let audit = AuditPipeline::new(notifier, &config.audit);

    let address = config.server.bind_address();
    let state = Arc::new(AppState {
        config: Arc::new(config),
        users: Arc::new(users),
        audit,
    });

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("listening on {address}");

    axum::serve(listener, build_router(state)).await?;

    info!("server exited");
    Ok(())
}

fn path_from_env(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var).map_or_else(|| PathBuf::from(default), PathBuf::from)
}
