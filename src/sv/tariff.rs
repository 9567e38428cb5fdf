use crate::{entity::tariff, prelude::*};

pub struct Tariff<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Tariff<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  #[cfg(test)]
  pub async fn create(&self, price: i32, days: i32) -> Result<tariff::Model> {
    let tariff = tariff::ActiveModel {
      price: Set(price),
      days: Set(days),
      is_active: Set(true),
      created_at: Set(Utc::now().naive_utc()),
      ..Default::default()
    };

    Ok(tariff.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: i32) -> Result<tariff::Model> {
    tariff::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::TariffNotFound(id))
  }

  /// Tariffs offered in the buy menu, shortest first.
  pub async fn active(&self) -> Result<Vec<tariff::Model>> {
    let tariffs = tariff::Entity::find()
      .filter(tariff::Column::IsActive.eq(true))
      .order_by_asc(tariff::Column::Days)
      .all(self.db)
      .await?;
    Ok(tariffs)
  }
}
