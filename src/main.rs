//! VPN subscription bot
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Teloxide for the Telegram bot and Stars payments
//! - Reqwest for the 3x-ui panel api
//! - Tokio for async runtime

mod entity;
mod error;
mod migration;
mod plugins;
mod prelude;
mod state;
mod sv;
#[cfg(test)]
mod testing;
mod utils;
mod vpn;

use std::{collections::HashSet, env, sync::Arc};

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::App,
  prelude::*,
  state::{AppState, Config},
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vpn_bot=debug,sea_orm=warn".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let admins: HashSet<i64> = env::var("ADMIN_IDS")
    .unwrap_or_default()
    .split(',')
    .filter(|s| !s.trim().is_empty())
    .map(|id| id.trim().parse().context("Invalid Admin ID format"))
    .collect::<anyhow::Result<_>>()?;

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:vpn.db?mode=rwc".into());
  let token = env::var("TELOXIDE_TOKEN").context("TELOXIDE_TOKEN not set")?;
  let config = Config::from_env()?;

  info!("Starting VPN bot v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(&db_url, &token, admins, config).await?);

  let running = App::new()
    .register(plugins::sync::Synchronizer)
    .register(plugins::telegram::Plugin)
    .run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
  info!("Shutting down...");
  running.shutdown(SHUTDOWN_TIMEOUT).await;

  Ok(())
}
