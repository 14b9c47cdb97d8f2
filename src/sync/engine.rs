use super::view::{ViewHandle, ViewState};
use crate::config::SyncConfig;
use crate::core::{CatalogPage, Entity, EntityDraft, EntityPatch, Result, SyncError};
use crate::remote::{CatalogClient, HttpCatalogClient};
use crate::storage::{FileKeyValueStore, OverlayStore};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{Instrument, Level, event, info_span};

/// Reconciles the remote catalog with the local overlay and publishes the
/// merged result as a [`ViewState`].
///
/// Remote failures during `load` degrade to an overlay-only view. Overlay
/// failures are never masked: a corrupt overlay fails every operation that
/// has to read it.
pub struct SyncEngine {
    client: Arc<dyn CatalogClient>,
    overlay: OverlayStore,
    view: ViewHandle,
    /// Serialises overlay read-modify-write cycles.
    writer: Mutex<()>,
}

impl SyncEngine {
    pub fn new(client: Arc<dyn CatalogClient>, overlay: OverlayStore) -> Self {
        Self {
            client,
            overlay,
            view: ViewHandle::new(),
            writer: Mutex::new(()),
        }
    }

    /// HTTP catalog client plus a file-backed overlay in `config.data_dir`.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        config.validate().map_err(SyncError::Config)?;
        let client = HttpCatalogClient::from_config(config)?;
        let medium = Arc::new(FileKeyValueStore::new(&config.data_dir));
        let overlay = OverlayStore::with_key(medium, config.storage_key.clone());
        Ok(Self::new(Arc::new(client), overlay))
    }

    pub fn overlay(&self) -> &OverlayStore {
        &self.overlay
    }

    pub fn view(&self) -> ViewState {
        self.view.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    /// Fetch remote page `page` filtered by `query`, merge it with the
    /// overlay and publish the result.
    ///
    /// `page`, `query` and `loading = true` are visible before the remote
    /// call resolves; `loading` is cleared again before this returns, error
    /// or not.
    pub async fn load(&self, page: u32, query: &str) -> Result<()> {
        if page < 1 {
            return Err(SyncError::InvalidArgument(format!(
                "page must be >= 1, got {}",
                page
            )));
        }

        let span = info_span!("sync.load", page, query = %query);
        async {
            let generation = self.view.begin(page, query);
            match self.resolve(page, query).await {
                Ok((characters, total)) => {
                    let count = characters.len();
                    if self.view.publish(generation, characters, total) {
                        event!(Level::DEBUG, count, total, "view published");
                    } else {
                        event!(Level::DEBUG, generation, "superseded load discarded");
                    }
                    Ok(())
                }
                Err(err) => {
                    self.view.settle(generation);
                    event!(Level::ERROR, error = %err, "load failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn resolve(&self, page: u32, query: &str) -> Result<(Vec<Entity>, u64)> {
        let name_filter = (!query.is_empty()).then_some(query);
        match self.client.fetch_page(page, name_filter).await {
            Ok(response) => {
                let remote = CatalogPage::from(response);
                let locals = self.overlay.read_all()?;
                let total = remote.count.saturating_add(locals.len() as u64);
                Ok((merge(locals, remote.results), total))
            }
            Err(err) => {
                event!(
                    Level::WARN,
                    error = %err,
                    "remote catalog unavailable, serving overlay only"
                );
                let locals = self.overlay.read_all()?;
                let total = locals.len() as u64;
                Ok((locals, total))
            }
        }
    }

    /// Look `id` up in the overlay first, then in the remote catalog.
    ///
    /// Remote errors propagate; there is no fallback for a direct lookup.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Entity>> {
        if let Some(local) = self.overlay.find(id)? {
            return Ok(Some(local));
        }
        self.client
            .fetch_by_id(id)
            .instrument(info_span!("sync.fetch_by_id", id))
            .await
    }

    /// Create an overlay record from `draft` under a fresh negative id, then
    /// reload the last requested page.
    pub async fn add_local_character(&self, draft: EntityDraft) -> Result<Entity> {
        let created = {
            let _writer = self.writer.lock().await;
            let mut locals = self.overlay.read_all()?;
            let id = self.overlay.allocate_local_id(&locals)?;
            let mut entity = draft.into_entity(id);
            entity.mark_local(Utc::now());
            locals.insert(0, entity.clone());
            self.overlay.write_all(&locals)?;
            entity
        };
        event!(Level::INFO, id = created.id, name = %created.name, "local character created");

        self.reload().await?;
        Ok(created)
    }

    /// Apply `patch` to the record with `id`.
    ///
    /// An overlay record is patched in place. A record known only to the
    /// remote catalog is copied into the overlay with the patch applied,
    /// masking the remote version from then on. An id found nowhere is left
    /// alone. Returns the edited record, if any.
    ///
    /// The writer lock is not held during the remote lookup.
    pub async fn edit_local_character(
        &self,
        id: i64,
        patch: EntityPatch,
    ) -> Result<Option<Entity>> {
        let updated = {
            let _writer = self.writer.lock().await;
            self.overlay.update(id, &patch)?
        };
        let edited = match updated {
            Some(updated) => Some(updated),
            None => match self.client.fetch_by_id(id).await? {
                Some(remote) => Some(self.mask_remote(id, remote, &patch).await?),
                None => None,
            },
        };
        if edited.is_none() {
            event!(Level::DEBUG, id, "edit target not found, nothing written");
        }

        self.reload().await?;
        Ok(edited)
    }

    async fn mask_remote(
        &self,
        id: i64,
        mut entity: Entity,
        patch: &EntityPatch,
    ) -> Result<Entity> {
        let _writer = self.writer.lock().await;
        // Another edit may have masked the record while the lookup was in flight.
        if let Some(updated) = self.overlay.update(id, patch)? {
            return Ok(updated);
        }
        patch.apply_to(&mut entity);
        entity.id = id;
        entity.mark_local(Utc::now());
        self.overlay.add(entity.clone())?;
        event!(Level::INFO, id, "remote character masked by local edit");
        Ok(entity)
    }

    /// Remove the overlay record with `id`, then reload. Ids that only exist
    /// remotely are unaffected. Returns whether an overlay record was removed.
    pub async fn delete_local(&self, id: i64) -> Result<bool> {
        let removed = {
            let _writer = self.writer.lock().await;
            self.overlay.remove(id)?
        };
        event!(Level::INFO, id, removed, "local delete");

        self.reload().await?;
        Ok(removed)
    }

    async fn reload(&self) -> Result<()> {
        let (page, query) = self.view.last_request();
        self.load(page, &query).await
    }
}

/// Overlay records first, in overlay order, then remote records whose id
/// no overlay record (or earlier remote record) already claims.
pub fn merge(overlay: Vec<Entity>, remote: Vec<Entity>) -> Vec<Entity> {
    let mut seen: HashSet<i64> = overlay.iter().map(|entity| entity.id).collect();
    let mut merged = overlay;
    merged.extend(remote.into_iter().filter(|entity| seen.insert(entity.id)));
    merged
}
