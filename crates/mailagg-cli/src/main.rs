use std::sync::Arc;

use clap::Parser;
use mailagg_delivery::Dispatcher;
use mailagg_imap::RealImapTransport;
use mailagg_scheduler::{Fetcher, Scheduler};
use mailagg_store::{SettingsPatch, Store};
use mailagg_vault::CredentialVault;
use mailagg_web::AppState;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mailagg", about = "Self-hosted IMAP aggregator and notifier")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Seed mutable store settings from environment config. `poll_interval_seconds`
/// and `api_token` stay environment-authoritative and are reasserted on every
/// boot. The Telegram/webhook fields are only written once, while the
/// settings row is still at its migration-seeded defaults (no admin has
/// touched `PATCH /settings` yet) — after that the environment is not
/// re-read for them, so an admin rotating those values through the API keeps
/// them across restarts.
async fn seed_settings_from_env(store: &Store, config: &mailagg_config::Settings) -> anyhow::Result<()> {
    let current = store.get_settings().await?;
    let first_boot = current.telegram_bot_token.is_none()
        && current.telegram_chat_id.is_none()
        && current.webhook_url.is_none();

    store
        .patch_settings(SettingsPatch {
            telegram_bot_token: first_boot.then(|| {
                config
                    .telegram_bot_token
                    .as_ref()
                    .map(|s| secrecy::ExposeSecret::expose_secret(s).clone())
            }),
            telegram_chat_id: first_boot.then(|| config.telegram_chat_id.clone()),
            poll_interval_seconds: Some(config.poll_interval_seconds as i64),
            webhook_url: first_boot.then(|| config.webhook_url.clone()),
            api_token: config.api_token.clone().map(Some),
            ..Default::default()
        })
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "mailagg starting");

    let config = mailagg_config::load()?;

    let store = Arc::new(Store::connect(&config.database_url).await?);
    seed_settings_from_env(&store, &config).await?;

    let vault = Arc::new(CredentialVault::new(config.encryption_key));
    let dispatcher = Arc::new(Dispatcher::new());
    let transport: Arc<dyn mailagg_imap::ImapTransport> = Arc::new(RealImapTransport);

    let fetcher = Arc::new(Fetcher::new(
        Arc::clone(&store),
        Arc::clone(&vault),
        dispatcher,
        transport,
    ));
    let scheduler = Arc::new(Scheduler::new(Arc::clone(&store), fetcher));
    scheduler.start().await?;

    let bind = config.bind;
    let port = config.port;

    let auth = Arc::new(
        mailagg_web::auth::AuthState::new(
            store.pool().clone(),
            config.admin_username,
            &config.admin_password,
            config.jwt_secret,
            config.admin_reset_token,
        )
        .await?,
    );

    let state = AppState {
        store: Arc::clone(&store),
        scheduler: Arc::clone(&scheduler),
        vault,
        auth,
    };

    tokio::select! {
        result = mailagg_web::serve(state, &bind, port) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, stopping poll loops");
            let grace = tokio::time::Duration::from_secs(30);
            if tokio::time::timeout(grace, scheduler.shutdown()).await.is_err() {
                tracing::warn!("scheduler shutdown exceeded grace period");
            }
        }
    }

    Ok(())
}
