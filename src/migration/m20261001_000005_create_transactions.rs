use sea_orm_migration::prelude::*;

use super::{
  m20261001_000001_create_users::Users,
  m20261001_000003_create_tariffs::Tariffs,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Transactions::Table)
          .if_not_exists()
          .col(ColumnDef::new(Transactions::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(Transactions::UserId).big_integer().not_null())
          .col(ColumnDef::new(Transactions::TariffId).integer().not_null())
          .col(
            ColumnDef::new(Transactions::Status)
              .string()
              .not_null()
              .default("paid"),
          )
          .col(ColumnDef::new(Transactions::TotalAmount).integer().not_null())
          .col(
            ColumnDef::new(Transactions::Currency)
              .string()
              .not_null()
              .default("XTR"),
          )
          .col(
            ColumnDef::new(Transactions::PaymentChargeId)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Transactions::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_transactions_user")
              .from(Transactions::Table, Transactions::UserId)
              .to(Users::Table, Users::TgUserId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_transactions_tariff")
              .from(Transactions::Table, Transactions::TariffId)
              .to(Tariffs::Table, Tariffs::Id),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Transactions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Transactions {
  Table,
  Id,
  UserId,
  TariffId,
  Status,
  TotalAmount,
  Currency,
  PaymentChargeId,
  CreatedAt,
}
