use crate::core::Result;

/// Key-value string medium the overlay is persisted in.
///
/// Implementations must make `set` atomic: a concurrent or later `get`
/// observes either the previous value or the new one, never a mix.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
