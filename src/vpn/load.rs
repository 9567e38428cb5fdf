//! In-memory view of how many clients every panel carries.
//!
//! Written by the synchronizer, read by provisioning. Counts may be up to one
//! sync interval stale.

use std::sync::RwLock;

use crate::prelude::*;

#[derive(Debug, Default)]
pub struct ServerLoad {
  // insertion order breaks ties in `free_server`
  members: RwLock<Vec<(Uuid, i64)>>,
}

impl ServerLoad {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_or_update(&self, server_id: Uuid, count: i64) {
    let mut members =
      self.members.write().unwrap_or_else(|err| err.into_inner());

    match members.iter_mut().find(|(id, _)| *id == server_id) {
      Some((_, current)) => *current = count,
      None => members.push((server_id, count)),
    }
  }

  /// Forgets servers that are no longer in `known`.
  pub fn retain(&self, known: &[Uuid]) {
    let mut members =
      self.members.write().unwrap_or_else(|err| err.into_inner());

    members.retain(|(id, _)| known.contains(id));
  }

  /// Least loaded server and its member count, `None` while nothing is known.
  pub fn free_server(&self) -> Option<(Uuid, i64)> {
    let members = self.members.read().unwrap_or_else(|err| err.into_inner());

    members.iter().fold(None, |best, &(id, count)| match best {
      Some((_, min)) if min <= count => best,
      _ => Some((id, count)),
    })
  }

  pub fn snapshot(&self) -> Vec<(Uuid, i64)> {
    self.members.read().unwrap_or_else(|err| err.into_inner()).clone()
  }
}
