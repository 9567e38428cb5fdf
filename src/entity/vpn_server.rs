//! One row per physical panel instance

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vpn_servers")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  /// panel base url, e.g. `https://203.0.113.7:2053/secret`
  pub url: String,
  pub login: String,
  pub password: String,
  /// session cookies as a flat `name -> value` json object
  pub cookies: Option<Json>,
  #[sea_orm(column_name = "type")]
  pub network: Option<String>,
  pub security: Option<String>,
  pub pbk: Option<String>,
  pub fp: Option<String>,
  pub sni: Option<String>,
  pub sid: Option<String>,
  pub spx: Option<String>,
  pub flow: Option<String>,
  pub port: Option<i32>,
  pub members_count: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::user_link::Entity")]
  Links,
}

impl Related<super::user_link::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Links.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  /// `Cookie` header value built from the stored session cookies.
  pub fn cookie_header(&self) -> Option<String> {
    let Some(Json::Object(cookies)) = &self.cookies else {
      return None;
    };

    let header = cookies
      .iter()
      .filter_map(|(name, value)| Some(format!("{name}={}", value.as_str()?)))
      .collect::<Vec<_>>()
      .join("; ");

    (!header.is_empty()).then_some(header)
  }
}
