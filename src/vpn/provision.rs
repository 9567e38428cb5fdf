//! Provisioning workflow: create a panel client for a user, or push the
//! expiry of an existing one.
//!
//! Local writes are committed one by one. A panel client created right
//! before a failing link insert stays on the panel without a local record.

use crate::{
  entity::{UserStatus, user_link},
  prelude::*,
  state::Config,
  sv::{self, link::NewLink},
  vpn::{
    ServerLoad, Session,
    link::connection_string,
    panel::{ClientSettings, PanelClient},
  },
};

/// `start` moved forward by a positive number of `days`.
fn expiry_after(start: DateTime, days: i64) -> Result<DateTime> {
  if days <= 0 {
    let reason = format!("non-positive duration: {days} days");
    return Err(Error::InvalidArgs(reason));
  }

  TimeDelta::try_days(days)
    .and_then(|delta| start.checked_add_signed(delta))
    .ok_or_else(|| Error::InvalidArgs(format!("{days} days is out of range")))
}

/// Expiry after buying `days` more: paid time that is left is never lost.
pub fn extended_expiry(
  current: DateTime,
  now: DateTime,
  days: i64,
) -> Result<DateTime> {
  expiry_after(current.max(now), days)
}

pub struct Provisioner<'a> {
  db: &'a DatabaseConnection,
  panel: &'a PanelClient,
  load: &'a ServerLoad,
  config: &'a Config,
}

impl<'a> Provisioner<'a> {
  pub fn new(
    db: &'a DatabaseConnection,
    panel: &'a PanelClient,
    load: &'a ServerLoad,
    config: &'a Config,
  ) -> Self {
    Self { db, panel, load, config }
  }

  fn session(&self) -> Session<'a> {
    Session::new(self.panel, self.db)
  }

  /// Initial provisioning of a user that never had a client.
  pub async fn create_client(
    &self,
    tariff_id: i32,
    user_id: i64,
    server_id: Uuid,
  ) -> Result<user_link::Model> {
    self.try_create(tariff_id, user_id, server_id).await.map_err(|err| {
      error!(
        "Create client failed \
        (server: {server_id}, tariff: {tariff_id}, user: {user_id}): {err}"
      );
      err.create()
    })
  }

  async fn try_create(
    &self,
    tariff_id: i32,
    user_id: i64,
    server_id: Uuid,
  ) -> Result<user_link::Model> {
    let mut server = sv::Server::new(self.db).by_id(server_id).await?;

    let tariff = sv::Tariff::new(self.db).by_id(tariff_id).await?;
    let expires_at =
      expiry_after(Utc::now().naive_utc(), i64::from(tariff.days))?;

    let users = sv::User::new(self.db);
    let user = users.get_or_create(user_id).await?;
    if user.status != UserStatus::New {
      return Err(Error::AlreadyProvisioned(user_id));
    }

    let settings = ClientSettings::new(
      Uuid::new_v4(),
      Uuid::new_v4(),
      user_id,
      expires_at,
    );
    self
      .session()
      .add_client(&mut server, &settings, self.config.inbound_id)
      .await?;

    let link = connection_string(&server, settings.id, user_id);
    debug!("Add client {} (tg_id: {user_id}) with link: {link}", settings.id);

    let link = sv::Link::new(self.db)
      .create(NewLink {
        user_id,
        server_id: server.id,
        link,
        client_id: settings.id,
        client_sub_id: settings.sub_id,
        expires_at,
      })
      .await
      .inspect_err(|err| {
        error!(
          "Client {} exists on VPN server {} but its link was not saved: {err}",
          settings.id, server.id
        )
      })?;

    let status =
      if tariff.price == 0 { UserStatus::Trial } else { UserStatus::Paid };
    if let Err(err) = users.set_status(user_id, status).await {
      error!("Update user {user_id} status failed: {err}");
    }

    info!(
      "Provisioned user {user_id} on VPN server {} until {expires_at}",
      server.id
    );
    Ok(link)
  }

  /// Extends the existing client of `user_id` by `days`.
  pub async fn renew(
    &self,
    user_id: i64,
    days: i64,
  ) -> Result<user_link::Model> {
    self.try_renew(user_id, days).await.map_err(|err| {
      error!("Renew client of user {user_id} by {days} days failed: {err}");
      err.update()
    })
  }

  async fn try_renew(
    &self,
    user_id: i64,
    days: i64,
  ) -> Result<user_link::Model> {
    let links = sv::Link::new(self.db);
    let link =
      links.by_user(user_id).await?.ok_or(Error::LinkNotFound(user_id))?;
    let mut server = sv::Server::new(self.db).by_id(link.server_id).await?;

    let expires_at =
      extended_expiry(link.expires_at, Utc::now().naive_utc(), days)?;
    let settings = ClientSettings::new(
      link.client_id,
      link.client_sub_id,
      user_id,
      expires_at,
    );

    self
      .session()
      .update_client(&mut server, &settings, self.config.inbound_id)
      .await?;

    let link = links.set_expiry(user_id, expires_at).await?;
    info!("Renewed client of user {user_id} until {expires_at}");
    Ok(link)
  }

  /// Link of `user_id`, provisioning a trial on the default server first if
  /// there is none yet.
  pub async fn get_or_create_link(
    &self,
    user_id: i64,
  ) -> Result<user_link::Model> {
    let existing = sv::Link::new(self.db)
      .by_user(user_id)
      .await
      .map_err(Error::create)?;

    match existing {
      Some(link) => Ok(link),
      None => {
        trace!("User {user_id} has no vpn link, creating trial");
        self
          .create_client(
            self.config.trial_tariff_id,
            user_id,
            self.config.trial_server_id,
          )
          .await
      }
    }
  }

  /// Applies a paid tariff: renews the existing client, or provisions a new
  /// one on the least loaded server.
  pub async fn purchase(
    &self,
    user_id: i64,
    tariff_id: i32,
  ) -> Result<user_link::Model> {
    let existing = sv::Link::new(self.db)
      .by_user(user_id)
      .await
      .map_err(Error::update)?;

    if existing.is_some() {
      let tariff = sv::Tariff::new(self.db)
        .by_id(tariff_id)
        .await
        .map_err(Error::update)?;
      return self.renew(user_id, i64::from(tariff.days)).await;
    }

    let Some((server_id, members)) = self.load.free_server() else {
      error!("No free VPN server for user {user_id} (tariff: {tariff_id})");
      return Err(Error::NoFreeServer.create());
    };
    debug!(
      "Picked VPN server {server_id} with {members} members for user {user_id}"
    );

    self.create_client(tariff_id, user_id, server_id).await
  }
}
