pub mod engine;
pub mod view;

pub use engine::{SyncEngine, merge};
pub use view::{ViewHandle, ViewState};
