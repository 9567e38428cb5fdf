pub use std::{collections::HashMap, time::Duration};

pub use anyhow::Context;
pub use async_trait::async_trait;
pub use chrono::{NaiveDateTime as DateTime, TimeDelta, Utc};
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait,
  QueryFilter, QueryOrder, Set, TransactionTrait,
};
pub use sea_orm_migration::MigratorTrait;
pub use tokio::time;
pub use tracing::{debug, error, info, trace, warn};
pub use uuid::Uuid;

pub use crate::error::{Error, Panel, Result};
pub(crate) use crate::utils;
