pub mod sync;
pub mod telegram;

use std::{sync::Arc, time::Duration};

use futures::future;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::state::AppState;

const RESTART_DELAY: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  /// Runs until `app.shutdown` is cancelled. Returning earlier counts as a
  /// crash and the plugin is restarted.
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
}

/// Supervisors of running plugins.
pub struct Running {
  app: Arc<AppState>,
  handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  pub fn run(self, app: Arc<AppState>) -> Running {
    let handles = self
      .plugins
      .into_iter()
      .map(|plugin| {
        let name = plugin.name();
        (name, tokio::spawn(supervise(plugin, app.clone())))
      })
      .collect();

    Running { app, handles }
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>) {
  let name = plugin.name();
  let shutdown = app.shutdown.clone();
  info!("SYSTEM: Service `{name}` initialized");

  loop {
    let handle = tokio::spawn({
      let app = app.clone();
      let plugin = plugin.clone();
      async move { plugin.start(app).await }
    });

    match handle.await {
      Ok(Ok(())) if shutdown.is_cancelled() => {
        info!("Service `{name}` shutdown.");
        break;
      }
      Ok(Ok(())) => warn!("Service `{name}` stopped unexpectedly (Ok)."),
      Ok(Err(err)) => error!("Service `{name}` crashed with error: {err:#}."),
      Err(join_err) if join_err.is_cancelled() => {
        info!("Service `{name}` cancelled.");
        break;
      }
      Err(_) => error!("Service `{name}` PANICKED!"),
    }

    tokio::select! {
      _ = shutdown.cancelled() => break,
      _ = sleep(RESTART_DELAY) => {}
    }
    info!("SYSTEM: Restarting service `{name}`...");
  }
}

impl Running {
  /// Signals every plugin to stop and waits up to `timeout` for them.
  /// Plugins still running after that are abandoned.
  pub async fn shutdown(self, timeout: Duration) {
    self.app.shutdown.cancel();

    let mut handles = self.handles;
    let all = future::join_all(handles.iter_mut().map(|(_, handle)| handle));
    if tokio::time::timeout(timeout, all).await.is_ok() {
      info!("SYSTEM: All services stopped");
      return;
    }

    for (name, _) in handles.iter().filter(|(_, h)| !h.is_finished()) {
      warn!(
        "SYSTEM: Service `{name}` did not stop within {}, abandoning",
        humantime::format_duration(timeout)
      );
    }
  }
}
