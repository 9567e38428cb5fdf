use json::Value;

use crate::{entity::vpn_server, prelude::*};

/// Connection parameters of a new panel instance.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct NewServer {
  pub url: String,
  pub login: String,
  pub password: String,
  pub network: Option<String>,
  pub security: Option<String>,
  pub pbk: Option<String>,
  pub fp: Option<String>,
  pub sni: Option<String>,
  pub sid: Option<String>,
  pub spx: Option<String>,
  pub flow: Option<String>,
  pub port: Option<i32>,
}

pub struct Server<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Server<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  #[cfg(test)]
  pub async fn create(&self, new: NewServer) -> Result<vpn_server::Model> {
    let server = vpn_server::ActiveModel {
      id: Set(Uuid::new_v4()),
      url: Set(new.url),
      login: Set(new.login),
      password: Set(new.password),
      cookies: Set(None),
      network: Set(new.network),
      security: Set(new.security),
      pbk: Set(new.pbk),
      fp: Set(new.fp),
      sni: Set(new.sni),
      sid: Set(new.sid),
      spx: Set(new.spx),
      flow: Set(new.flow),
      port: Set(new.port),
      members_count: Set(0),
      created_at: Set(Utc::now().naive_utc()),
    };

    Ok(server.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: Uuid) -> Result<vpn_server::Model> {
    vpn_server::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::ServerNotFound(id))
  }

  pub async fn all(&self) -> Result<Vec<vpn_server::Model>> {
    let servers = vpn_server::Entity::find()
      .order_by_asc(vpn_server::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(servers)
  }

  pub async fn update_cookies(
    &self,
    id: Uuid,
    cookies: &HashMap<String, String>,
  ) -> Result<()> {
    let cookies = json::to_value(cookies).unwrap_or(Value::Null);
    self.update(id, vpn_server::ActiveModel {
      cookies: Set(Some(cookies)),
      ..Default::default()
    })
    .await
  }

  pub async fn set_members_count(&self, id: Uuid, count: i32) -> Result<()> {
    self.update(id, vpn_server::ActiveModel {
      members_count: Set(count),
      ..Default::default()
    })
    .await
  }

  async fn update(
    &self,
    id: Uuid,
    values: vpn_server::ActiveModel,
  ) -> Result<()> {
    let res = vpn_server::Entity::update_many()
      .set(values)
      .filter(vpn_server::Column::Id.eq(id))
      .exec(self.db)
      .await?;

    if res.rows_affected == 0 {
      return Err(Error::ServerNotFound(id));
    }
    Ok(())
  }
}
