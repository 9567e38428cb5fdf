//! Database migrations using SeaORM

use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_vpn_servers;
mod m20261001_000003_create_tariffs;
mod m20261001_000004_create_user_links;
mod m20261001_000005_create_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20261001_000001_create_users::Migration),
      Box::new(m20261001_000002_create_vpn_servers::Migration),
      Box::new(m20261001_000003_create_tariffs::Migration),
      Box::new(m20261001_000004_create_user_links::Migration),
      Box::new(m20261001_000005_create_transactions::Migration),
    ]
  }
}

#[cfg(test)]
mod tests {
  use sea_orm::{Database, EntityTrait};

  use super::*;
  use crate::{entity::user_link, sv};

  #[tokio::test]
  async fn migrations_match_entities() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let new = sv::server::NewServer {
      url: "http://10.0.0.1:2053".into(),
      ..Default::default()
    };
    let server = sv::Server::new(&db).create(new).await.unwrap();
    sv::User::new(&db).get_or_create(1).await.unwrap();
    sv::Tariff::new(&db).create(0, 3).await.unwrap();

    assert!(user_link::Entity::find().all(&db).await.unwrap().is_empty());
    assert_eq!(sv::Server::new(&db).all().await.unwrap(), vec![server]);

    Migrator::down(&db, None).await.unwrap();
  }
}
