//! Transaction entity - one row per completed payment

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
pub enum TransactionStatus {
  #[default]
  #[sea_orm(string_value = "paid")]
  Paid,
  #[sea_orm(string_value = "refund")]
  Refund,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub user_id: i64,
  pub tariff_id: i32,
  pub status: TransactionStatus,
  pub total_amount: i32,
  pub currency: String,
  #[sea_orm(unique)]
  pub payment_charge_id: String,
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
    belongs_to = "super::tariff::Entity",
    from = "Column::TariffId",
    to = "super::tariff::Column::Id"
  )]
  Tariff,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::tariff::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Tariff.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
