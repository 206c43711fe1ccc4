//! Admin permission checks.
//!
//! Two sources: the static ADMIN_IDS list (first entry is the super
//! admin) and the persisted per-user role, so admins can be promoted at
//! runtime without a restart.

use std::sync::Arc;

use anyhow::Result;

use crate::database::models::UserRole;
use crate::database::UserRepo;

#[derive(Clone)]
pub struct Permissions {
    admin_ids: Vec<u64>,
    users: Arc<UserRepo>,
}

impl Permissions {
    pub fn new(admin_ids: Vec<u64>, users: Arc<UserRepo>) -> Self {
        Self { admin_ids, users }
    }

    pub fn is_super_admin(&self, user_id: u64) -> bool {
        self.admin_ids.first() == Some(&user_id)
    }

    /// Configured or promoted admins. A lookup failure only falls back to
    /// the static list, so configured admins keep access during outages.
    pub async fn is_admin(&self, user_id: u64) -> bool {
        if self.admin_ids.contains(&user_id) {
            return true;
        }
        self.role_is_admin(user_id).await.unwrap_or(false)
    }

    async fn role_is_admin(&self, user_id: u64) -> Result<bool> {
        Ok(self
            .users
            .find(user_id)
            .await?
            .map(|u| u.role == UserRole::Admin)
            .unwrap_or(false))
    }
}
