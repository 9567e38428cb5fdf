use crate::{
  entity::{TransactionStatus, transaction},
  prelude::*,
};

/// A completed payment as reported by Telegram.
#[derive(Debug, Clone)]
pub struct Payment {
  pub user_id: i64,
  pub tariff_id: i32,
  pub total_amount: i32,
  pub currency: String,
  pub charge_id: String,
}

pub struct Transaction<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Transaction<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Fails with [`Error::Conflict`] when the charge id was already recorded.
  pub async fn create(&self, payment: Payment) -> Result<transaction::Model> {
    let transaction = transaction::ActiveModel {
      id: Set(Uuid::new_v4()),
      user_id: Set(payment.user_id),
      tariff_id: Set(payment.tariff_id),
      status: Set(TransactionStatus::Paid),
      total_amount: Set(payment.total_amount),
      currency: Set(payment.currency),
      payment_charge_id: Set(payment.charge_id),
      created_at: Set(Utc::now().naive_utc()),
    };

    Ok(transaction.insert(self.db).await?)
  }

  pub async fn by_charge_id(
    &self,
    charge_id: &str,
  ) -> Result<Option<transaction::Model>> {
    let transaction = transaction::Entity::find()
      .filter(transaction::Column::PaymentChargeId.eq(charge_id))
      .one(self.db)
      .await?;
    Ok(transaction)
  }

  pub async fn mark_refund(
    &self,
    charge_id: &str,
  ) -> Result<transaction::Model> {
    let transaction = self
      .by_charge_id(charge_id)
      .await?
      .ok_or_else(|| Error::TransactionNotFound(charge_id.to_string()))?;

    let transaction = transaction::ActiveModel {
      status: Set(TransactionStatus::Refund),
      ..transaction.into()
    }
    .update(self.db)
    .await?;

    Ok(transaction)
  }
}
