//! Periodic refresh of per-server member counts.

use std::sync::Arc;

use super::Plugin;
use crate::{
  entity::vpn_server,
  prelude::*,
  state::AppState,
  sv,
  vpn::{PanelClient, ServerLoad, Session},
};

pub struct Synchronizer;

#[async_trait]
impl Plugin for Synchronizer {
  fn name(&self) -> &'static str {
    "synchronizer"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let interval = app.config.sync_interval;
    info!(
      "Syncing VPN servers every {}",
      humantime::format_duration(interval)
    );

    loop {
      match sync_once(&app.db, &app.panel, &app.load).await {
        Ok(synced) => debug!("Synced {synced} VPN servers"),
        Err(err) => error!("Load VPN servers failed: {err}"),
      }

      tokio::select! {
        _ = app.shutdown.cancelled() => return Ok(()),
        _ = time::sleep(interval) => {}
      }
    }
  }
}

/// Refreshes the member count of every server, in the database and in
/// `load`. Returns how many servers answered; unreachable ones keep their
/// previous counts. Servers deleted from the database leave `load`.
pub async fn sync_once(
  db: &DatabaseConnection,
  panel: &PanelClient,
  load: &ServerLoad,
) -> Result<usize> {
  let servers = sv::Server::new(db).all().await?;
  let known: Vec<_> = servers.iter().map(|server| server.id).collect();
  load.retain(&known);

  let session = Session::new(panel, db);

  let mut synced = 0;
  for mut server in servers {
    match sync_server(db, &session, &mut server).await {
      Ok(members) => {
        load.add_or_update(server.id, members);
        synced += 1;
      }
      Err(err) => {
        error!("Sync VPN server {} ({}) failed: {err}", server.id, server.url)
      }
    }
  }

  Ok(synced)
}

async fn sync_server(
  db: &DatabaseConnection,
  session: &Session<'_>,
  server: &mut vpn_server::Model,
) -> Result<i64> {
  let inbounds = session.inbounds(server).await?;
  let members = inbounds.first().map(|inbound| inbound.members()).unwrap_or(0);

  let members = i32::try_from(members).unwrap_or(i32::MAX);
  sv::Server::new(db).set_members_count(server.id, members).await?;
  trace!("VPN server {} has {members} members", server.id);

  Ok(i64::from(members))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    plugins::App,
    state::Config,
    testing::{MockPanel, create_server, setup_test_db, test_app},
  };

  fn panel() -> PanelClient {
    PanelClient::new(Duration::from_secs(5)).unwrap()
  }

  async fn stored_members(db: &DatabaseConnection, id: Uuid) -> i32 {
    sv::Server::new(db).by_id(id).await.unwrap().members_count
  }

  #[tokio::test]
  async fn records_first_inbound_members() {
    let db = setup_test_db().await;
    let mock = MockPanel::start().await;
    mock.set_members(7);
    let server = create_server(&db, &mock.url).await;
    let load = ServerLoad::new();

    let synced = sync_once(&db, &panel(), &load).await.unwrap();

    assert_eq!(synced, 1);
    assert_eq!(load.snapshot(), vec![(server.id, 7)]);
    assert_eq!(stored_members(&db, server.id).await, 7);
  }

  #[tokio::test]
  async fn repeated_sync_is_stable() {
    let db = setup_test_db().await;
    let mock = MockPanel::start().await;
    mock.set_members(3);
    let server = create_server(&db, &mock.url).await;
    let load = ServerLoad::new();
    let panel = panel();

    sync_once(&db, &panel, &load).await.unwrap();
    let first = load.snapshot();
    let stored = stored_members(&db, server.id).await;
    sync_once(&db, &panel, &load).await.unwrap();

    assert_eq!(load.snapshot(), first);
    assert_eq!(load.free_server(), Some((server.id, 3)));
    assert_eq!(stored, 3);
    assert_eq!(stored_members(&db, server.id).await, stored);
    assert_eq!(mock.list_calls(), 2);
  }

  #[tokio::test]
  async fn failing_server_does_not_block_others() {
    let db = setup_test_db().await;
    let healthy = MockPanel::start().await;
    healthy.set_members(2);
    let broken = MockPanel::start().await;
    broken.garble();

    let bad = create_server(&db, &broken.url).await;
    let good = create_server(&db, &healthy.url).await;
    let load = ServerLoad::new();

    let synced = sync_once(&db, &panel(), &load).await.unwrap();

    assert_eq!(synced, 1);
    assert_eq!(load.snapshot(), vec![(good.id, 2)]);
    assert_eq!(stored_members(&db, bad.id).await, 0);
  }

  #[tokio::test]
  async fn deleted_server_leaves_load_table() {
    let db = setup_test_db().await;
    let mock = MockPanel::start().await;
    let gone = create_server(&db, &mock.url).await;
    let kept = create_server(&db, &mock.url).await;
    let load = ServerLoad::new();
    let panel = panel();

    sync_once(&db, &panel, &load).await.unwrap();
    assert_eq!(load.snapshot().len(), 2);

    vpn_server::Entity::delete_by_id(gone.id).exec(&db).await.unwrap();
    sync_once(&db, &panel, &load).await.unwrap();

    assert_eq!(load.snapshot(), vec![(kept.id, 0)]);
    assert_eq!(load.free_server(), Some((kept.id, 0)));
  }

  #[tokio::test]
  async fn sync_relogs_expired_session() {
    let db = setup_test_db().await;
    let mock = MockPanel::start().await;
    mock.expire_next(1);
    mock.set_members(1);
    let server = create_server(&db, &mock.url).await;
    let load = ServerLoad::new();

    sync_once(&db, &panel(), &load).await.unwrap();

    assert_eq!(mock.logins(), 1);
    assert_eq!(load.free_server(), Some((server.id, 1)));
    let stored = sv::Server::new(&db).by_id(server.id).await.unwrap();
    assert!(stored.cookies.is_some());
  }

  #[tokio::test]
  async fn synchronizer_stops_on_shutdown() {
    let db = setup_test_db().await;
    let mock = MockPanel::start().await;
    mock.set_members(4);
    let server = create_server(&db, &mock.url).await;

    let config = Config {
      sync_interval: Duration::from_secs(3600),
      ..Config::default()
    };
    let app = Arc::new(test_app(db, config));
    let running = App::new().register(Synchronizer).run(app.clone());

    for _ in 0..200 {
      if !app.load.snapshot().is_empty() {
        break;
      }
      time::sleep(Duration::from_millis(10)).await;
    }

    let started = time::Instant::now();
    running.shutdown(Duration::from_secs(5)).await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(app.shutdown.is_cancelled());
    assert_eq!(app.load.snapshot(), vec![(server.id, 4)]);
    assert_eq!(mock.list_calls(), 1);
  }
}
