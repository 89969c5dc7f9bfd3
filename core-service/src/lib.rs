//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings
//! store, audio sink, clock) and the narration provider into the shared
//! narration core. Desktop apps typically enable the `desktop-shims` feature
//! and call [`bootstrap_desktop`]; other hosts build a
//! [`CoreDependencies`] bundle from their own adapters.

pub mod error;
pub mod service;

pub use error::{CoreError, Result};
pub use service::{
    ConversionOutcome, CoreDependencies, NarrationService, ToggleOutcome, WavExport,
};

// The narrators ship with the façade so hosts can construct either against
// their own bridges.
pub use provider_gemini::{GeminiNarrator, MockNarrator};

#[cfg(feature = "desktop-shims")]
use bridge_desktop::{CpalAudioSink, ReqwestHttpClient, SqliteSettingsStore};
#[cfg(feature = "desktop-shims")]
use bridge_traits::{
    audio::AudioSink,
    http::HttpClient,
    narration::NarrationProvider,
    storage::SettingsStore,
    time::{Clock, SystemClock},
};
#[cfg(feature = "desktop-shims")]
use core_runtime::config::CoreConfig;
#[cfg(feature = "desktop-shims")]
use std::path::PathBuf;
#[cfg(feature = "desktop-shims")]
use std::sync::Arc;

/// Convenience bootstrapper for desktop hosts.
///
/// Builds the reqwest HTTP client, SQLite settings store, cpal audio sink,
/// and the Gemini narrator — or the demo-mode [`MockNarrator`] when no API
/// key is provided — then restores the last editing session.
///
/// ```ignore
/// use core_service::bootstrap_desktop;
/// use core_runtime::config::CoreConfig;
///
/// # async fn example() -> core_service::Result<()> {
/// let service = bootstrap_desktop(
///     "sungnews.db".into(),
///     std::env::var("GEMINI_API_KEY").ok(),
///     CoreConfig::default(),
/// )
/// .await?;
/// service.convert("Markets rallied today...").await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(
    db_path: PathBuf,
    api_key: Option<String>,
    config: CoreConfig,
) -> Result<NarrationService> {
    let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

    let provider: Arc<dyn NarrationProvider> = match api_key {
        Some(key) if !key.is_empty() => Arc::new(GeminiNarrator::new(
            http_client,
            key,
            config.narration.clone(),
        )),
        _ => Arc::new(MockNarrator::new()),
    };

    let settings_store: Arc<dyn SettingsStore> = Arc::new(
        SqliteSettingsStore::new(db_path)
            .await
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?,
    );

    let audio_sink: Arc<dyn AudioSink> = Arc::new(
        CpalAudioSink::new(config.playback.gain)
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?,
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let service = NarrationService::new(
        CoreDependencies::new(provider, audio_sink, settings_store, clock),
        config,
    )?;
    service.restore_session().await?;
    Ok(service)
}
