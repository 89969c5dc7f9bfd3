//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value store
//! - `AudioSink` using `cpal` with a dedicated render thread
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{CpalAudioSink, ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new();
//!     let settings = SqliteSettingsStore::new("sungnews.db".into()).await?;
//!     let sink = CpalAudioSink::new(1.4)?;
//!     // Hand these to the core service configuration.
//!     Ok(())
//! }
//! ```

mod audio;
mod http;
mod settings;

pub use audio::CpalAudioSink;
pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
