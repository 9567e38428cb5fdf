//! HTTP client for a single 3x-ui style panel instance

use json::Value;
use reqwest::{Client, Method, StatusCode, header};
use serde::{
  Deserialize, Serialize,
  de::{DeserializeOwned, IgnoredAny},
};

use crate::{entity::vpn_server, prelude::*};

const DEFAULT_FLOW: &str = "xtls-rprx-vision";

pub type Cookies = HashMap<String, String>;

/// One client entry as the panel expects it inside `settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
  pub id: Uuid,
  pub alter_id: i32,
  pub email: String,
  pub limit_ip: i32,
  #[serde(rename = "totalGB")]
  pub total_gb: i64,
  /// unix millis
  pub expiry_time: i64,
  pub enable: bool,
  pub tg_id: String,
  pub sub_id: Uuid,
  pub reset: i32,
  pub flow: String,
}

impl ClientSettings {
  pub fn new(
    id: Uuid,
    sub_id: Uuid,
    tg_user_id: i64,
    expires_at: DateTime,
  ) -> Self {
    Self {
      id,
      alter_id: 0,
      email: tg_user_id.to_string(),
      limit_ip: 0,
      total_gb: 0,
      expiry_time: expires_at.and_utc().timestamp_millis(),
      enable: true,
      tg_id: tg_user_id.to_string(),
      sub_id,
      reset: 0,
      flow: DEFAULT_FLOW.into(),
    }
  }
}

#[derive(Serialize)]
struct ClientsSettings<'a> {
  clients: [&'a ClientSettings; 1],
}

#[derive(Serialize)]
struct Credentials<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Debug, Deserialize)]
struct Reply<T> {
  #[serde(default)]
  success: bool,
  #[serde(default)]
  msg: String,
  obj: Option<T>,
}

/// Inbound as listed by the panel. Only the number of client stats is
/// used, so their contents are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
  #[serde(default)]
  client_stats: Option<Vec<IgnoredAny>>,
}

impl Inbound {
  pub fn members(&self) -> usize {
    self.client_stats.as_ref().map_or(0, Vec::len)
  }
}

/// Stateless panel client: every call carries the cookies of `server`.
#[derive(Debug, Clone)]
pub struct PanelClient {
  http: Client,
}

impl PanelClient {
  pub fn new(timeout: Duration) -> Result<Self, Panel> {
    let http = Client::builder()
      .timeout(timeout)
      // panels usually run on self-signed certificates
      .danger_accept_invalid_certs(true)
      .build()?;
    Ok(Self { http })
  }

  pub async fn login(
    &self,
    base_url: &str,
    username: &str,
    password: &str,
  ) -> Result<Cookies, Panel> {
    let url = format!("{}/login", base_url.trim_end_matches('/'));
    let resp = self
      .http
      .post(&url)
      .json(&Credentials { username, password })
      .send()
      .await
      .inspect_err(|err| error!("Login request to {url} failed: {err}"))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Panel::Status(status));
    }

    let cookies: Cookies = resp
      .cookies()
      .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
      .collect();

    let body = resp.text().await?;
    if let Ok(reply) = json::from_str::<Reply<Value>>(&body)
      && !reply.success
    {
      return Err(Panel::Rejected(reply.msg));
    }
    if cookies.is_empty() {
      return Err(Panel::Rejected("login returned no session cookie".into()));
    }

    Ok(cookies)
  }

  pub async fn add_client(
    &self,
    server: &vpn_server::Model,
    settings: &ClientSettings,
    inbound_id: i64,
  ) -> Result<(), Panel> {
    let body = client_body(settings, inbound_id)?;
    self
      .call::<Value>(
        server,
        Method::POST,
        "/panel/api/inbounds/addClient",
        Some(body),
      )
      .await?;

    debug!(
      "Added client {} (tg_id: {}) to VPN server {}",
      settings.id, settings.tg_id, server.id
    );
    Ok(())
  }

  pub async fn update_client(
    &self,
    server: &vpn_server::Model,
    settings: &ClientSettings,
    inbound_id: i64,
  ) -> Result<(), Panel> {
    let body = client_body(settings, inbound_id)?;
    let route = format!("/panel/api/inbounds/updateClient/{}", settings.id);
    self.call::<Value>(server, Method::POST, &route, Some(body)).await?;

    debug!(
      "Updated client {} (tg_id: {}) settings on VPN server {}",
      settings.id, settings.tg_id, server.id
    );
    Ok(())
  }

  pub async fn inbounds(
    &self,
    server: &vpn_server::Model,
  ) -> Result<Vec<Inbound>, Panel> {
    let inbounds = self
      .call::<Vec<Inbound>>(
        server,
        Method::GET,
        "/panel/api/inbounds/list",
        None,
      )
      .await?;
    Ok(inbounds.unwrap_or_default())
  }

  async fn call<T: DeserializeOwned>(
    &self,
    server: &vpn_server::Model,
    method: Method,
    route: &str,
    body: Option<Value>,
  ) -> Result<Option<T>, Panel> {
    let url = format!("{}{route}", server.url.trim_end_matches('/'));

    let mut req = self.http.request(method, &url);
    if let Some(cookie) = server.cookie_header() {
      req = req.header(header::COOKIE, cookie);
    }
    if let Some(body) = body {
      req = req.json(&body);
    }

    let resp = req.send().await.inspect_err(|err| {
      if err.is_timeout() {
        error!("Timeout on request to {url}: {err}");
      } else {
        error!("Request to {url} failed: {err}");
      }
    })?;

    let status = resp.status();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
      return Err(Panel::Unauthorized(status));
    }
    if !status.is_success() {
      return Err(Panel::Status(status));
    }

    let body = resp.text().await?;
    let reply: Reply<T> = json::from_str(&body).map_err(|err| {
      error!("Got non-json response from {url}: {body}");
      Panel::Malformed { reason: err.to_string(), body: body.clone() }
    })?;

    if !reply.success {
      error!("Panel {url} rejected request: {}", reply.msg);
      return Err(Panel::Rejected(reply.msg));
    }

    Ok(reply.obj)
  }
}

fn client_body(
  settings: &ClientSettings,
  inbound_id: i64,
) -> Result<Value, Panel> {
  let settings = json::to_string(&ClientsSettings { clients: [settings] })
    .map_err(|err| Panel::Malformed {
      reason: err.to_string(),
      body: String::new(),
    })?;
  Ok(json::json!({ "id": inbound_id, "settings": settings }))
}
