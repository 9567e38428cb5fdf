use std::{collections::HashSet, env};

use teloxide::Bot;
use tokio_util::sync::CancellationToken;

use crate::{
  migration::Migrator,
  prelude::*,
  sv,
  vpn::{PanelClient, Provisioner, ServerLoad},
};

#[derive(Debug, Clone)]
pub struct Config {
  /// tariff handed out on first contact
  pub trial_tariff_id: i32,
  /// server trials are provisioned on
  pub trial_server_id: Uuid,
  pub sync_interval: Duration,
  pub panel_timeout: Duration,
  pub inbound_id: i64,
  pub currency: String,
  /// lets users refund their own payments
  pub payment_debug: bool,
  pub payments_chat_id: Option<i64>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      trial_tariff_id: 1,
      trial_server_id: Uuid::nil(),
      sync_interval: Duration::from_secs(60),
      panel_timeout: Duration::from_secs(10),
      inbound_id: 1,
      currency: String::from("XTR"),
      payment_debug: false,
      payments_chat_id: None,
    }
  }
}

fn var(key: &str) -> Option<String> {
  env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let default = Self::default();

    let duration = |key: &str, default: Duration| -> anyhow::Result<Duration> {
      match var(key) {
        Some(v) => humantime::parse_duration(&v)
          .with_context(|| format!("Invalid {key}: {v}")),
        None => Ok(default),
      }
    };

    Ok(Self {
      trial_tariff_id: var("TRIAL_TARIFF_ID")
        .context("TRIAL_TARIFF_ID not set")?
        .parse()
        .context("Invalid TRIAL_TARIFF_ID")?,
      trial_server_id: var("TRIAL_SERVER_ID")
        .context("TRIAL_SERVER_ID not set")?
        .parse()
        .context("Invalid TRIAL_SERVER_ID")?,
      sync_interval: duration("SYNC_INTERVAL", default.sync_interval)?,
      panel_timeout: duration("PANEL_TIMEOUT", default.panel_timeout)?,
      inbound_id: match var("PANEL_INBOUND_ID") {
        Some(v) => v.parse().context("Invalid PANEL_INBOUND_ID")?,
        None => default.inbound_id,
      },
      currency: var("PAYMENT_CURRENCY").unwrap_or(default.currency),
      payment_debug: var("PAYMENT_DEBUG")
        .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes")),
      payments_chat_id: match var("PAYMENTS_CHAT_ID") {
        Some(v) => Some(v.parse().context("Invalid PAYMENTS_CHAT_ID")?),
        None => None,
      },
    })
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub link: sv::Link<'a>,
  pub tariff: sv::Tariff<'a>,
  pub server: sv::Server<'a>,
  pub transaction: sv::Transaction<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub bot: Bot,
  pub admins: HashSet<i64>,
  pub panel: PanelClient,
  pub load: ServerLoad,
  pub config: Config,
  pub shutdown: CancellationToken,
}

impl AppState {
  pub async fn new(
    db_url: &str,
    bot_token: &str,
    admins: HashSet<i64>,
    config: Config,
  ) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(db_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let panel = PanelClient::new(config.panel_timeout)
      .context("Failed to build panel http client")?;

    Ok(Self {
      db,
      bot: Bot::new(bot_token),
      admins,
      panel,
      load: ServerLoad::new(),
      config,
      shutdown: CancellationToken::new(),
    })
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      link: sv::Link::new(&self.db),
      tariff: sv::Tariff::new(&self.db),
      server: sv::Server::new(&self.db),
      transaction: sv::Transaction::new(&self.db),
    }
  }

  pub fn vpn(&self) -> Provisioner<'_> {
    Provisioner::new(&self.db, &self.panel, &self.load, &self.config)
  }
}
