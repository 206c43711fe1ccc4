//! Maintenance mode.
//!
//! Persisted as a singleton document; a copy is cached in-process so the
//! pipeline gate never touches the database on the hot path. Mutations
//! write through and refresh the cache.

use anyhow::Result;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::Collection;
use parking_lot::RwLock;

use crate::database::models::MaintenanceDoc;
use crate::database::Database;

pub struct Maintenance {
    collection: Collection<MaintenanceDoc>,
    cached: RwLock<MaintenanceDoc>,
}

impl Maintenance {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("maintenance"),
            cached: RwLock::new(MaintenanceDoc::default()),
        }
    }

    /// Load persisted state into the cache. Called once at startup so a
    /// restart does not silently drop maintenance mode.
    pub async fn load(&self) -> Result<()> {
        if let Some(state) = self
            .collection
            .find_one(doc! { "_id": MaintenanceDoc::key() })
            .await?
        {
            *self.cached.write() = state;
        }
        Ok(())
    }

    /// Whether maintenance is in effect right now.
    pub fn active(&self, now: DateTime<Utc>) -> bool {
        self.cached.read().active_at(now)
    }

    pub fn current(&self) -> MaintenanceDoc {
        self.cached.read().clone()
    }

    pub async fn set_enabled(&self, enabled: bool, message: Option<&str>) -> Result<()> {
        let mut state = self.current();
        state.enabled = enabled;
        if let Some(m) = message {
            state.message = Some(m.to_string());
        }
        self.save(state).await
    }

    pub async fn schedule(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
        let mut state = self.current();
        state.scheduled_start = Some(start);
        state.scheduled_end = Some(end);
        self.save(state).await
    }

    pub async fn cancel_schedule(&self) -> Result<()> {
        let mut state = self.current();
        state.scheduled_start = None;
        state.scheduled_end = None;
        self.save(state).await
    }

    async fn save(&self, mut state: MaintenanceDoc) -> Result<()> {
        state.id = MaintenanceDoc::key();
        state.updated_at = Some(Utc::now());
        self.collection
            .replace_one(doc! { "_id": MaintenanceDoc::key() }, &state)
            .upsert(true)
            .await?;
        *self.cached.write() = state;
        Ok(())
    }
}
