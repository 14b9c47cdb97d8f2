#![allow(dead_code)]

use async_trait::async_trait;
use catalog_overlay::{
    CatalogClient, DEFAULT_OVERLAY_KEY, Entity, Gender, MemoryKeyValueStore, OverlayStore,
    PageInfo, PageResponse, Result, Status, SyncEngine, SyncError,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

/// Holds the next `fetch_page` call until released.
pub struct Gate {
    pub entered: Notify,
    release: Semaphore,
}

impl Gate {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }

    pub fn release(&self) {
        self.release.add_permits(1);
    }
}

/// In-memory catalog whose answers are scripted per test.
#[derive(Default)]
pub struct ScriptedCatalog {
    pages: Mutex<HashMap<u32, Option<PageResponse>>>,
    entities: Mutex<HashMap<i64, Option<Entity>>>,
    fail_pages: AtomicBool,
    fail_lookups: AtomicBool,
    gate: Mutex<Option<Arc<Gate>>>,
    lookup_gate: Mutex<Option<Arc<Gate>>>,
    page_calls: Mutex<Vec<(u32, Option<String>)>>,
    lookup_calls: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_page(&self, page: u32, response: Option<PageResponse>) {
        self.pages.lock().unwrap().insert(page, response);
    }

    pub fn set_entity(&self, entity: Entity) {
        self.entities.lock().unwrap().insert(entity.id, Some(entity));
    }

    /// Make `fetch_by_id(id)` answer with an empty body.
    pub fn set_empty_entity(&self, id: i64) {
        self.entities.lock().unwrap().insert(id, None);
    }

    pub fn fail_pages(&self, fail: bool) {
        self.fail_pages.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Hold the next page fetch until the returned gate is released.
    pub fn hold_next_page(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold the next `fetch_by_id` call until the returned gate is released.
    pub fn hold_next_lookup(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::new());
        *self.lookup_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn page_calls(&self) -> Vec<(u32, Option<String>)> {
        self.page_calls.lock().unwrap().clone()
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn fetch_page(
        &self,
        page: u32,
        name_filter: Option<&str>,
    ) -> Result<Option<PageResponse>> {
        self.page_calls
            .lock()
            .unwrap()
            .push((page, name_filter.map(str::to_string)));

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            let permit = gate.release.acquire().await.unwrap();
            permit.forget();
        }

        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteFetch("connection refused".to_string()));
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&page)
            .cloned()
            .unwrap_or_else(|| Some(page_of(0, Vec::new()))))
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<Entity>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.lookup_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            let permit = gate.release.acquire().await.unwrap();
            permit.forget();
        }

        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteFetch("connection reset".to_string()));
        }
        match self.entities.lock().unwrap().get(&id) {
            Some(entity) => Ok(entity.clone()),
            None => Err(SyncError::NotFound(id)),
        }
    }
}

pub fn page_of(count: u64, results: Vec<Entity>) -> PageResponse {
    PageResponse {
        info: Some(PageInfo {
            count,
            pages: count.div_ceil(20),
            next: None,
            prev: None,
        }),
        results: Some(results),
    }
}

pub fn rick() -> Entity {
    serde_json::from_value(json!({
        "id": 1,
        "name": "Rick Sanchez",
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Male",
        "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
        "created": "2017-11-04T18:48:46.250Z"
    }))
    .unwrap()
}

pub fn morty() -> Entity {
    serde_json::from_value(json!({
        "id": 2,
        "name": "Morty Smith",
        "status": "Alive",
        "species": "Human",
        "gender": "Male",
        "image": "https://rickandmortyapi.com/api/character/avatar/2.jpeg"
    }))
    .unwrap()
}

pub fn personagem_local() -> Entity {
    let entity: Entity = serde_json::from_value(json!({
        "id": -1,
        "name": "Personagem Local",
        "status": "Alive",
        "species": "Human",
        "gender": "Male",
        "image": "local-image.jpg",
        "_local": true,
        "_updatedAt": "2025-09-26T10:00:00.000Z"
    }))
    .unwrap();
    assert_eq!(entity.status, Status::Alive);
    assert_eq!(entity.gender, Gender::Male);
    entity
}

pub struct Harness {
    pub catalog: Arc<ScriptedCatalog>,
    pub medium: Arc<MemoryKeyValueStore>,
    pub engine: Arc<SyncEngine>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_medium(MemoryKeyValueStore::new())
    }

    pub fn with_overlay(entities: &[Entity]) -> Self {
        let raw = serde_json::to_string(entities).unwrap();
        Self::with_medium(MemoryKeyValueStore::new().with_value(DEFAULT_OVERLAY_KEY, raw))
    }

    pub fn with_corrupt_overlay() -> Self {
        Self::with_medium(MemoryKeyValueStore::new().with_value(DEFAULT_OVERLAY_KEY, "[{\"id\":"))
    }

    fn with_medium(medium: MemoryKeyValueStore) -> Self {
        let catalog = ScriptedCatalog::new();
        let medium = Arc::new(medium);
        let engine = Arc::new(SyncEngine::new(
            catalog.clone(),
            OverlayStore::new(medium.clone()),
        ));
        Self {
            catalog,
            medium,
            engine,
        }
    }

    pub fn overlay(&self) -> Vec<Entity> {
        self.engine.overlay().read_all().unwrap()
    }

    pub fn view_ids(&self) -> Vec<i64> {
        self.engine.view().characters.iter().map(|e| e.id).collect()
    }
}
