//! `vless://` connection strings handed out to users

use std::{fmt::Write, net::Ipv4Addr};

use reqwest::Url;

use crate::{entity::vpn_server, prelude::*};

/// IPv4 literal of the panel base url.
///
/// Panels addressed by hostname yield `None`; the link then carries an empty
/// host segment.
pub fn server_ip(base_url: &str) -> Option<Ipv4Addr> {
  Url::parse(base_url).ok()?.host_str()?.parse().ok()
}

pub fn connection_string(
  server: &vpn_server::Model,
  client_id: Uuid,
  tg_user_id: i64,
) -> String {
  let ip = match server_ip(&server.url) {
    Some(ip) => ip.to_string(),
    None => {
      warn!("VPN server {} has no IPv4 in url {}", server.id, server.url);
      String::new()
    }
  };
  let port = server.port.map(|port| port.to_string()).unwrap_or_default();

  let params = [
    ("type", &server.network),
    ("security", &server.security),
    ("pbk", &server.pbk),
    ("fp", &server.fp),
    ("sni", &server.sni),
    ("sid", &server.sid),
    ("spx", &server.spx),
    ("flow", &server.flow),
  ];

  let mut link = format!("vless://{client_id}@{ip}:{port}?");
  for (i, (key, value)) in params.iter().enumerate() {
    if i > 0 {
      link.push('&');
    }
    let _ = write!(link, "{key}={}", value.as_deref().unwrap_or_default());
  }
  let _ = write!(link, "#{tg_user_id}");

  link
}

#[cfg(test)]
mod tests {
  use super::*;

  fn server(url: &str) -> vpn_server::Model {
    vpn_server::Model {
      id: Uuid::new_v4(),
      url: url.into(),
      login: "admin".into(),
      password: "admin".into(),
      cookies: None,
      network: Some("tcp".into()),
      security: Some("reality".into()),
      pbk: Some("pubkey".into()),
      fp: Some("chrome".into()),
      sni: Some("example.com".into()),
      sid: Some("ab12".into()),
      spx: Some("/".into()),
      flow: Some("xtls-rprx-vision".into()),
      port: Some(443),
      members_count: 0,
      created_at: Utc::now().naive_utc(),
    }
  }

  #[test]
  fn extracts_ipv4_from_base_url() {
    assert_eq!(
      server_ip("https://203.0.113.7:2053/panel"),
      Some(Ipv4Addr::new(203, 0, 113, 7))
    );
    assert_eq!(server_ip("https://vpn.example.com:2053"), None);
    assert_eq!(server_ip("not a url"), None);
  }

  #[test]
  fn link_parses_back_to_server_address() {
    let client = Uuid::new_v4();
    let server = server("https://203.0.113.7:2053");
    let link = connection_string(&server, client, 42);

    let url = Url::parse(&link).unwrap();
    assert_eq!(url.scheme(), "vless");
    assert_eq!(url.username(), client.to_string());
    assert_eq!(url.host_str(), Some("203.0.113.7"));
    assert_eq!(url.port(), Some(443));
    assert_eq!(url.fragment(), Some("42"));
  }

  #[test]
  fn link_carries_protocol_params_in_order() {
    let client = Uuid::nil();
    let server = server("https://203.0.113.7:2053");
    let link = connection_string(&server, client, 7);

    assert_eq!(
      link,
      "vless://00000000-0000-0000-0000-000000000000@203.0.113.7:443\
       ?type=tcp&security=reality&pbk=pubkey&fp=chrome&sni=example.com\
       &sid=ab12&spx=/&flow=xtls-rprx-vision#7"
    );
  }

  #[test]
  fn hostname_panel_leaves_host_empty() {
    let nil = Uuid::nil();
    let server = server("https://vpn.example.com");
    let link = connection_string(&server, nil, 1);

    assert!(link.starts_with(&format!("vless://{nil}@:443?")));
  }
}
