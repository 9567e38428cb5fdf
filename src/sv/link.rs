use crate::{entity::user_link, prelude::*};

/// Everything needed to record a freshly provisioned client.
#[derive(Debug, Clone)]
pub struct NewLink {
  pub user_id: i64,
  pub server_id: Uuid,
  pub link: String,
  pub client_id: Uuid,
  pub client_sub_id: Uuid,
  pub expires_at: DateTime,
}

pub struct Link<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Link<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, new: NewLink) -> Result<user_link::Model> {
    let link = user_link::ActiveModel {
      user_id: Set(new.user_id),
      server_id: Set(new.server_id),
      link: Set(new.link),
      client_id: Set(new.client_id),
      client_sub_id: Set(new.client_sub_id),
      expires_at: Set(new.expires_at),
      created_at: Set(Utc::now().naive_utc()),
    };

    Ok(link.insert(self.db).await?)
  }

  pub async fn by_user(
    &self,
    user_id: i64,
  ) -> Result<Option<user_link::Model>> {
    Ok(user_link::Entity::find_by_id(user_id).one(self.db).await?)
  }

  pub async fn set_expiry(
    &self,
    user_id: i64,
    expires_at: DateTime,
  ) -> Result<user_link::Model> {
    let txn = self.db.begin().await?;

    let link = user_link::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::LinkNotFound(user_id))?;

    let link =
      user_link::ActiveModel { expires_at: Set(expires_at), ..link.into() }
        .update(&txn)
        .await?;

    txn.commit().await?;
    Ok(link)
  }
}
