//! Lazy re-authentication around panel calls.
//!
//! Every panel operation goes through [`Session::call`]: an expired session
//! triggers one login, the fresh cookies are persisted, and the operation is
//! retried once. A second rejection surfaces as a plain status failure.

use std::future::Future;

use crate::{
  entity::vpn_server,
  prelude::*,
  sv,
  vpn::panel::{ClientSettings, Cookies, Inbound, PanelClient},
};

const MAX_ATTEMPTS: usize = 2;

pub struct Session<'a> {
  panel: &'a PanelClient,
  servers: sv::Server<'a>,
}

impl<'a> Session<'a> {
  pub fn new(panel: &'a PanelClient, db: &'a DatabaseConnection) -> Self {
    Self { panel, servers: sv::Server::new(db) }
  }

  /// Runs `op` against `server`, logging in again when the panel rejects
  /// the stored cookies. `server` ends up holding the cookies in use.
  pub async fn call<T, F, Fut>(
    &self,
    server: &mut vpn_server::Model,
    op: F,
  ) -> Result<T, Panel>
  where
    F: Fn(vpn_server::Model) -> Fut,
    Fut: Future<Output = Result<T, Panel>>,
  {
    let mut attempt = 1;
    loop {
      match op(server.clone()).await {
        Err(Panel::Unauthorized(status)) if attempt < MAX_ATTEMPTS => {
          info!(
            "Session of VPN server {} expired ({status}), logging in",
            server.url
          );
          self.refresh(server).await?;
          attempt += 1;
        }
        Err(Panel::Unauthorized(status)) => return Err(Panel::Status(status)),
        res => return res,
      }
    }
  }

  async fn refresh(&self, server: &mut vpn_server::Model) -> Result<(), Panel> {
    let cookies: Cookies =
      self.panel.login(&server.url, &server.login, &server.password).await?;

    if let Err(err) = self.servers.update_cookies(server.id, &cookies).await {
      error!("Update VPN server {} cookies failed: {err}", server.id);
    }
    server.cookies = json::to_value(&cookies).ok();

    Ok(())
  }

  pub async fn add_client(
    &self,
    server: &mut vpn_server::Model,
    settings: &ClientSettings,
    inbound_id: i64,
  ) -> Result<(), Panel> {
    let panel = self.panel;
    self
      .call(server, move |server| async move {
        panel.add_client(&server, settings, inbound_id).await
      })
      .await
  }

  pub async fn update_client(
    &self,
    server: &mut vpn_server::Model,
    settings: &ClientSettings,
    inbound_id: i64,
  ) -> Result<(), Panel> {
    let panel = self.panel;
    self
      .call(server, move |server| async move {
        panel.update_client(&server, settings, inbound_id).await
      })
      .await
  }

  pub async fn inbounds(
    &self,
    server: &mut vpn_server::Model,
  ) -> Result<Vec<Inbound>, Panel> {
    let panel = self.panel;
    self
      .call(server, move |server| async move { panel.inbounds(&server).await })
      .await
  }
}
