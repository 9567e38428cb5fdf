use sea_orm_migration::prelude::*;

use super::{
  m20261001_000001_create_users::Users,
  m20261001_000002_create_vpn_servers::VpnServers,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(UserLinks::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(UserLinks::UserId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(UserLinks::ServerId).uuid().not_null())
          .col(ColumnDef::new(UserLinks::Link).string().not_null())
          .col(ColumnDef::new(UserLinks::ClientId).uuid().not_null())
          .col(ColumnDef::new(UserLinks::ClientSubId).uuid().not_null())
          .col(ColumnDef::new(UserLinks::ExpiresAt).date_time().not_null())
          .col(ColumnDef::new(UserLinks::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_links_user")
              .from(UserLinks::Table, UserLinks::UserId)
              .to(Users::Table, Users::TgUserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_links_server")
              .from(UserLinks::Table, UserLinks::ServerId)
              .to(VpnServers::Table, VpnServers::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_user_links_server")
          .table(UserLinks::Table)
          .col(UserLinks::ServerId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(UserLinks::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum UserLinks {
  Table,
  UserId,
  ServerId,
  Link,
  ClientId,
  ClientSubId,
  ExpiresAt,
  CreatedAt,
}
