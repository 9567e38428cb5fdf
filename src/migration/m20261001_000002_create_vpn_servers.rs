use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(VpnServers::Table)
          .if_not_exists()
          .col(ColumnDef::new(VpnServers::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(VpnServers::Url).string().not_null())
          .col(ColumnDef::new(VpnServers::Login).string().not_null())
          .col(ColumnDef::new(VpnServers::Password).string().not_null())
          .col(ColumnDef::new(VpnServers::Cookies).json().null())
          .col(ColumnDef::new(VpnServers::Type).string().null())
          .col(ColumnDef::new(VpnServers::Security).string().null())
          .col(ColumnDef::new(VpnServers::Pbk).string().null())
          .col(ColumnDef::new(VpnServers::Fp).string().null())
          .col(ColumnDef::new(VpnServers::Sni).string().null())
          .col(ColumnDef::new(VpnServers::Sid).string().null())
          .col(ColumnDef::new(VpnServers::Spx).string().null())
          .col(ColumnDef::new(VpnServers::Flow).string().null())
          .col(ColumnDef::new(VpnServers::Port).integer().null())
          .col(
            ColumnDef::new(VpnServers::MembersCount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(VpnServers::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(VpnServers::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum VpnServers {
  Table,
  Id,
  Url,
  Login,
  Password,
  Cookies,
  Type,
  Security,
  Pbk,
  Fp,
  Sni,
  Sid,
  Spx,
  Flow,
  Port,
  MembersCount,
  CreatedAt,
}
