//! Error types for the vpn bot

use reqwest::StatusCode;
use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

/// Failures talking to a remote panel instance.
#[derive(Debug, thiserror::Error)]
pub enum Panel {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("unexpected status {0}")]
  Status(StatusCode),

  /// Session cookie rejected. Only ever seen inside the session wrapper.
  #[error("session expired ({0})")]
  Unauthorized(StatusCode),

  #[error("malformed response ({reason}): {body}")]
  Malformed { reason: String, body: String },

  #[error("panel rejected request: {0}")]
  Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(DbErr),

  #[error("Constraint violation: {0}")]
  Conflict(String),

  #[error("VPN server {0} not found")]
  ServerNotFound(Uuid),

  #[error("Tariff {0} not found")]
  TariffNotFound(i32),

  #[error("User {0} not found")]
  UserNotFound(i64),

  #[error("User {0} has no vpn link")]
  LinkNotFound(i64),

  #[error("Transaction {0} not found")]
  TransactionNotFound(String),

  #[error("Panel error: {0}")]
  Panel(#[from] Panel),

  #[error("User {0} already has a vpn client")]
  AlreadyProvisioned(i64),

  #[error("No free vpn server")]
  NoFreeServer,

  #[error("Client creation failed: {0}")]
  ClientCreate(#[source] Box<Error>),

  #[error("Client update failed: {0}")]
  ClientUpdate(#[source] Box<Error>),

  #[error("Invalid arguments: {0}")]
  InvalidArgs(String),
}

impl From<DbErr> for Error {
  fn from(err: DbErr) -> Self {
    match err.sql_err() {
      Some(SqlErr::UniqueConstraintViolation(msg)) => Error::Conflict(msg),
      _ => Error::Database(err),
    }
  }
}

impl Error {
  pub fn create(self) -> Self {
    match self {
      err @ Error::ClientCreate(_) => err,
      err => Error::ClientCreate(Box::new(err)),
    }
  }

  pub fn update(self) -> Self {
    match self {
      err @ Error::ClientUpdate(_) => err,
      err => Error::ClientUpdate(Box::new(err)),
    }
  }

  /// Innermost cause of a workflow error.
  #[cfg(test)]
  pub fn cause(&self) -> &Error {
    match self {
      Error::ClientCreate(inner) | Error::ClientUpdate(inner) => inner.cause(),
      err => err,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
