pub mod error;
pub mod types;

pub use error::{Result, SyncError};
pub use types::{
    CatalogPage, Entity, EntityDraft, EntityPatch, Gender, LocationRef, PageInfo, PageResponse,
    Status,
};
