//! UserLink entity - the provisioned vpn client of a user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_links")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  pub server_id: Uuid,
  pub link: String,
  /// client id on the panel
  pub client_id: Uuid,
  /// subscription id on the panel
  pub client_sub_id: Uuid,
  pub expires_at: DateTime,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::UserId",
    to = "super::user::Column::TgUserId"
  )]
  User,
  #[sea_orm(
    belongs_to = "super::vpn_server::Entity",
    from = "Column::ServerId",
    to = "super::vpn_server::Column::Id"
  )]
  Server,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::vpn_server::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Server.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
