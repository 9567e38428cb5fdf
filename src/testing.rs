//! Test fixtures: in-memory database and a fake panel

use std::{
  collections::HashSet,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use axum::{
  Json, Router,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, Uri, header},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use json::{Value, json};
use sea_orm::{ConnectionTrait, DbBackend, Schema};

use teloxide::Bot;
use tokio_util::sync::CancellationToken;

use crate::{
  entity::*,
  prelude::*,
  state::{AppState, Config},
  sv::{self, server::NewServer},
  vpn::{PanelClient, ServerLoad},
};

pub async fn setup_test_db() -> DatabaseConnection {
  let db = Database::connect("sqlite::memory:").await.unwrap();
  let schema = Schema::new(DbBackend::Sqlite);

  let stmts = [
    schema.create_table_from_entity(user::Entity),
    schema.create_table_from_entity(vpn_server::Entity),
    schema.create_table_from_entity(tariff::Entity),
    schema.create_table_from_entity(user_link::Entity),
    schema.create_table_from_entity(transaction::Entity),
  ];
  for stmt in stmts {
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();
  }

  db
}

/// App state around `db`. The bot is never contacted.
pub fn test_app(db: DatabaseConnection, config: Config) -> AppState {
  AppState {
    db,
    bot: Bot::new("0:test"),
    admins: HashSet::new(),
    panel: PanelClient::new(Duration::from_secs(5)).unwrap(),
    load: ServerLoad::new(),
    config,
    shutdown: CancellationToken::new(),
  }
}

fn new_server(url: &str) -> NewServer {
  NewServer {
    url: url.into(),
    login: "admin".into(),
    password: "admin".into(),
    network: Some("tcp".into()),
    security: Some("reality".into()),
    pbk: Some("pubkey".into()),
    fp: Some("chrome".into()),
    sni: Some("example.com".into()),
    sid: Some("ab12".into()),
    spx: Some("/".into()),
    flow: Some("xtls-rprx-vision".into()),
    port: Some(443),
  }
}

pub async fn create_server(
  db: &DatabaseConnection,
  url: &str,
) -> vpn_server::Model {
  sv::Server::new(db).create(new_server(url)).await.unwrap()
}

/// Unsaved server pointing at `url`.
pub fn test_server(url: &str) -> vpn_server::Model {
  let new = new_server(url);
  vpn_server::Model {
    id: Uuid::new_v4(),
    url: new.url,
    login: new.login,
    password: new.password,
    cookies: None,
    network: new.network,
    security: new.security,
    pbk: new.pbk,
    fp: new.fp,
    sni: new.sni,
    sid: new.sid,
    spx: new.spx,
    flow: new.flow,
    port: new.port,
    members_count: 0,
    created_at: Utc::now().naive_utc(),
  }
}

#[derive(Default)]
struct Script {
  logins: AtomicUsize,
  add_calls: AtomicUsize,
  update_calls: AtomicUsize,
  list_calls: AtomicUsize,
  members: AtomicUsize,
  expire: AtomicUsize,
  deny_login: AtomicBool,
  garble: AtomicBool,
  reject: Mutex<Option<String>>,
  last_cookie: Mutex<Option<String>>,
  last_settings: Mutex<Option<Value>>,
  last_updated: Mutex<Option<String>>,
}

/// Fake panel bound to an ephemeral local port.
pub struct MockPanel {
  pub url: String,
  script: Arc<Script>,
}

impl MockPanel {
  pub async fn start() -> Self {
    let script = Arc::new(Script::default());

    let router = Router::new()
      .route("/login", post(login))
      .route("/panel/api/inbounds/addClient", post(add_client))
      .route("/panel/api/inbounds/updateClient/{id}", post(update_client))
      .route("/panel/api/inbounds/list", get(list))
      .with_state(script.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let _ = axum::serve(listener, router).await;
    });

    Self { url: format!("http://{addr}"), script }
  }

  /// Answer the next `n` api calls with 401.
  pub fn expire_next(&self, n: usize) {
    self.script.expire.store(n, Ordering::SeqCst);
  }

  pub fn reject(&self, msg: &str) {
    *self.script.reject.lock().unwrap() = Some(msg.into());
  }

  pub fn garble(&self) {
    self.script.garble.store(true, Ordering::SeqCst);
  }

  pub fn deny_login(&self) {
    self.script.deny_login.store(true, Ordering::SeqCst);
  }

  pub fn set_members(&self, n: usize) {
    self.script.members.store(n, Ordering::SeqCst);
  }

  pub fn logins(&self) -> usize {
    self.script.logins.load(Ordering::SeqCst)
  }

  pub fn add_calls(&self) -> usize {
    self.script.add_calls.load(Ordering::SeqCst)
  }

  pub fn update_calls(&self) -> usize {
    self.script.update_calls.load(Ordering::SeqCst)
  }

  pub fn list_calls(&self) -> usize {
    self.script.list_calls.load(Ordering::SeqCst)
  }

  pub fn last_cookie(&self) -> Option<String> {
    self.script.last_cookie.lock().unwrap().clone()
  }

  /// First client of the last add/update request.
  pub fn last_settings(&self) -> Option<Value> {
    self.script.last_settings.lock().unwrap().clone()
  }

  pub fn last_updated(&self) -> Option<String> {
    self.script.last_updated.lock().unwrap().clone()
  }
}

fn ok(obj: Value) -> Response {
  Json(json!({ "success": true, "msg": "", "obj": obj })).into_response()
}

/// Shared gatekeeping of api routes; `None` means serve normally.
fn gate(script: &Script, headers: &HeaderMap) -> Option<Response> {
  *script.last_cookie.lock().unwrap() = headers
    .get(header::COOKIE)
    .and_then(|v| v.to_str().ok())
    .map(String::from);

  let expired = script
    .expire
    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
    .is_ok();
  if expired {
    return Some(StatusCode::UNAUTHORIZED.into_response());
  }
  if script.garble.load(Ordering::SeqCst) {
    return Some("<html>login</html>".into_response());
  }
  if let Some(msg) = script.reject.lock().unwrap().clone() {
    return Some(Json(json!({ "success": false, "msg": msg })).into_response());
  }
  None
}

fn record_settings(script: &Script, body: &Value) {
  let settings = body["settings"]
    .as_str()
    .and_then(|s| json::from_str::<Value>(s).ok())
    .map(|s| s["clients"][0].clone());
  *script.last_settings.lock().unwrap() = settings;
}

async fn login(State(script): State<Arc<Script>>) -> Response {
  if script.deny_login.load(Ordering::SeqCst) {
    let msg = "Wrong username or password";
    return Json(json!({ "success": false, "msg": msg })).into_response();
  }

  let n = script.logins.fetch_add(1, Ordering::SeqCst) + 1;
  let cookie = format!("3x-ui=session-{n}; Path=/; HttpOnly");
  ([(header::SET_COOKIE, cookie)], Json(json!({ "success": true, "msg": "" })))
    .into_response()
}

async fn add_client(
  State(script): State<Arc<Script>>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Response {
  script.add_calls.fetch_add(1, Ordering::SeqCst);
  if let Some(resp) = gate(&script, &headers) {
    return resp;
  }
  record_settings(&script, &body);
  ok(Value::Null)
}

async fn update_client(
  State(script): State<Arc<Script>>,
  Path(id): Path<String>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Response {
  script.update_calls.fetch_add(1, Ordering::SeqCst);
  if let Some(resp) = gate(&script, &headers) {
    return resp;
  }
  record_settings(&script, &body);
  *script.last_updated.lock().unwrap() = Some(id);
  ok(Value::Null)
}

async fn list(
  State(script): State<Arc<Script>>,
  headers: HeaderMap,
) -> Response {
  script.list_calls.fetch_add(1, Ordering::SeqCst);
  if let Some(resp) = gate(&script, &headers) {
    return resp;
  }

  let stats: Vec<Value> = (0..script.members.load(Ordering::SeqCst))
    .map(|i| {
      json!({ "email": i.to_string(), "enable": true, "up": 0, "down": 0 })
    })
    .collect();

  ok(json!([
    { "id": 1, "remark": "main", "clientStats": stats },
    { "id": 2, "remark": "spare", "clientStats": null },
  ]))
}

/// Fake Bot API that records the chats of `sendMessage` calls and fails
/// every request.
pub struct FakeTelegram {
  url: String,
  chats: Arc<Mutex<Vec<i64>>>,
}

impl FakeTelegram {
  pub async fn start() -> Self {
    let chats = Arc::new(Mutex::new(Vec::new()));

    let router = Router::new().fallback(bot_api).with_state(chats.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let _ = axum::serve(listener, router).await;
    });

    Self { url: format!("http://{addr}"), chats }
  }

  pub fn bot(&self) -> Bot {
    Bot::new("0:test").set_api_url(self.url.parse().unwrap())
  }

  pub fn sent_to(&self, chat_id: i64) -> usize {
    self.chats.lock().unwrap().iter().filter(|&&id| id == chat_id).count()
  }
}

async fn bot_api(
  State(chats): State<Arc<Mutex<Vec<i64>>>>,
  uri: Uri,
  body: String,
) -> Response {
  if uri.path().to_ascii_lowercase().ends_with("/sendmessage")
    && let Ok(body) = json::from_str::<Value>(&body)
    && let Some(chat_id) = body["chat_id"].as_i64()
  {
    chats.lock().unwrap().push(chat_id);
  }

  Json(json!({
    "ok": false,
    "error_code": 400,
    "description": "Bad Request: chat not found",
  }))
  .into_response()
}
