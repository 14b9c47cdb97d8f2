use super::KeyValueStore;
use crate::core::{Entity, EntityPatch, Result, SyncError};
use chrono::Utc;
use log::warn;
use std::sync::Arc;

/// Key the overlay list is stored under unless configured otherwise.
pub const DEFAULT_OVERLAY_KEY: &str = "rm-local-characters";

/// Ordered list of user-owned records, persisted as one JSON array under a
/// single key and rewritten wholesale on every mutation.
///
/// An absent blob is an empty overlay. A blob that exists but does not
/// decode is an error, never an empty list.
#[derive(Clone)]
pub struct OverlayStore {
    medium: Arc<dyn KeyValueStore>,
    key: String,
    counter_key: String,
}

impl OverlayStore {
    pub fn new(medium: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(medium, DEFAULT_OVERLAY_KEY)
    }

    pub fn with_key(medium: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let counter_key = format!("{}.next-id", key);
        Self {
            medium,
            key,
            counter_key,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn read_all(&self) -> Result<Vec<Entity>> {
        let Some(raw) = self.medium.get(&self.key)? else {
            return Ok(Vec::new());
        };
        let decoded: Option<Vec<Entity>> = serde_json::from_str(&raw).map_err(|e| {
            SyncError::OverlayCorrupt(format!("Failed to decode overlay '{}': {}", self.key, e))
        })?;
        Ok(decoded.unwrap_or_default())
    }

    /// Best-effort read for display-only callers: a corrupt overlay is
    /// logged and reported as empty. Never use this where data integrity
    /// matters.
    pub fn read_all_lenient(&self) -> Vec<Entity> {
        self.read_all().unwrap_or_else(|err| {
            warn!(
                "overlay read failed, showing no local records: key='{}' error='{}'",
                self.key, err
            );
            Vec::new()
        })
    }

    pub fn write_all(&self, entities: &[Entity]) -> Result<()> {
        let encoded = serde_json::to_string(entities).map_err(|e| {
            SyncError::OverlayWrite(format!("Failed to encode overlay '{}': {}", self.key, e))
        })?;
        self.medium.set(&self.key, &encoded)
    }

    pub fn find(&self, id: i64) -> Result<Option<Entity>> {
        Ok(self.read_all()?.into_iter().find(|entity| entity.id == id))
    }

    /// Prepend `entity` to the overlay.
    pub fn add(&self, entity: Entity) -> Result<()> {
        let mut entities = self.read_all()?;
        entities.insert(0, entity);
        self.write_all(&entities)
    }

    /// Merge `patch` over the record with `id` and stamp `updatedAt`.
    ///
    /// Returns the updated record, or `None` without writing when `id` is
    /// not in the overlay.
    pub fn update(&self, id: i64, patch: &EntityPatch) -> Result<Option<Entity>> {
        let mut entities = self.read_all()?;
        let Some(entity) = entities.iter_mut().find(|entity| entity.id == id) else {
            return Ok(None);
        };
        patch.apply_to(entity);
        entity.updated_at = Some(Utc::now());
        let updated = entity.clone();
        self.write_all(&entities)?;
        Ok(Some(updated))
    }

    /// Drop the record with `id`. Returns whether anything was removed;
    /// nothing is written when it was absent.
    pub fn remove(&self, id: i64) -> Result<bool> {
        let mut entities = self.read_all()?;
        let before = entities.len();
        entities.retain(|entity| entity.id != id);
        if entities.len() == before {
            return Ok(false);
        }
        self.write_all(&entities)?;
        Ok(true)
    }

    /// Issue a fresh negative identifier.
    ///
    /// The last issued id is persisted next to the overlay, so ids are never
    /// reused after deletions and never equal an id present in `current`.
    pub fn allocate_local_id(&self, current: &[Entity]) -> Result<i64> {
        let last_issued = match self.medium.get(&self.counter_key)? {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                SyncError::OverlayCorrupt(format!(
                    "Failed to decode id counter '{}': {}",
                    self.counter_key, e
                ))
            })?,
            None => 0,
        };
        let smallest_live = current.iter().map(|entity| entity.id).min().unwrap_or(0);
        let next = last_issued.min(smallest_live).min(0) - 1;
        self.medium.set(&self.counter_key, &next.to_string())?;
        Ok(next)
    }
}
