use crate::{
  entity::{UserStatus, user},
  prelude::*,
};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn get_or_create(&self, tg_user_id: i64) -> Result<user::Model> {
    if let Some(user) = self.by_id(tg_user_id).await? {
      return Ok(user);
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      tg_user_id: Set(tg_user_id),
      status: Set(UserStatus::New),
      reg_date: Set(now),
    };

    match user.insert(self.db).await.map_err(Error::from) {
      Ok(user) => {
        debug!("Created new user {tg_user_id}");
        Ok(user)
      }
      // lost a race against a concurrent insert
      Err(Error::Conflict(_)) => {
        trace!("User {tg_user_id} already exists");
        self.by_id(tg_user_id).await?.ok_or(Error::UserNotFound(tg_user_id))
      }
      Err(err) => Err(err),
    }
  }

  pub async fn by_id(&self, tg_user_id: i64) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(tg_user_id).one(self.db).await?)
  }

  pub async fn set_status(
    &self,
    tg_user_id: i64,
    status: UserStatus,
  ) -> Result<()> {
    let user = user::Entity::find_by_id(tg_user_id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound(tg_user_id))?;

    user::ActiveModel { status: Set(status), ..user.into() }
      .update(self.db)
      .await?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::setup_test_db;

  #[tokio::test]
  async fn get_or_create_is_idempotent() {
    let db = setup_test_db().await;
    let sv = User::new(&db);

    let first = sv.get_or_create(10).await.unwrap();
    sv.set_status(10, UserStatus::Trial).await.unwrap();
    let second = sv.get_or_create(10).await.unwrap();

    assert_eq!(first.status, UserStatus::New);
    assert_eq!(second.status, UserStatus::Trial);
    assert_eq!(second.reg_date, first.reg_date);
    assert_eq!(user::Entity::find().all(&db).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn unknown_user_status_fails() {
    let db = setup_test_db().await;

    let err = User::new(&db).set_status(5, UserStatus::Paid).await.unwrap_err();
    assert!(matches!(err, Error::UserNotFound(5)));
  }
}
