//! User entity - Telegram users of the bot

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UserStatus {
  #[default]
  #[sea_orm(string_value = "new")]
  New,
  #[sea_orm(string_value = "trial")]
  Trial,
  #[sea_orm(string_value = "free")]
  Free,
  #[sea_orm(string_value = "paid")]
  Paid,
  #[sea_orm(string_value = "not paid")]
  NotPaid,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub tg_user_id: i64,
  pub status: UserStatus,
  pub reg_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_one = "super::user_link::Entity")]
  Link,
  #[sea_orm(has_many = "super::transaction::Entity")]
  Transactions,
}

impl Related<super::user_link::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Link.def()
  }
}

impl Related<super::transaction::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Transactions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
