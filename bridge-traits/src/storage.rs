//! Key-Value Settings Storage
//!
//! Persistent string/bool storage for small JSON blobs (archive, session,
//! preferences). This is the platform analog of browser local storage; the
//! desktop bridge backs it with SQLite.

use crate::error::Result;
use async_trait::async_trait;

/// Key-value preference and blob storage.
///
/// Values are stored per fixed string key and survive process restarts.
/// Writers replace the whole value; there is no partial update.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember_mode(store: &dyn SettingsStore) -> bridge_traits::error::Result<()> {
///     store.set_bool("demo_mode", true).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value.
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value, `None` if the key was never written.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value.
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value.
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
