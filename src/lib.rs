// ============================================================================
// catalog_overlay Library
// ============================================================================

//! Local-overlay synchronisation for a remotely paginated, read-only
//! catalog.
//!
//! A [`SyncEngine`] merges each remote page with a durable overlay of
//! user-created and user-edited records, publishes the merged view through
//! a watch channel and falls back to the overlay alone when the catalog is
//! unreachable.
//!
//! ```no_run
//! use catalog_overlay::{EntityDraft, SyncConfig, SyncEngine};
//!
//! # async fn demo() -> catalog_overlay::Result<()> {
//! let engine = SyncEngine::from_config(&SyncConfig::new().data_dir("/tmp/overlay"))?;
//! engine.load(1, "rick").await?;
//! println!("{} characters", engine.view().total);
//!
//! let created = engine.add_local_character(EntityDraft::new("Local Rick")).await?;
//! assert!(created.id < 0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod remote;
pub mod storage;
pub mod sync;

pub use config::SyncConfig;
pub use core::{
    CatalogPage, Entity, EntityDraft, EntityPatch, Gender, LocationRef, PageInfo, PageResponse,
    Result, Status, SyncError,
};
pub use remote::{CatalogClient, HttpCatalogClient};
pub use storage::{
    DEFAULT_OVERLAY_KEY, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, OverlayStore,
};
pub use sync::{SyncEngine, ViewState, merge};
