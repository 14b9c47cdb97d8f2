pub mod engine;
pub mod memory;
pub mod overlay;
pub mod persistence;

pub use engine::KeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use overlay::{DEFAULT_OVERLAY_KEY, OverlayStore};
pub use persistence::FileKeyValueStore;
