//! Demo-mode narrator
//!
//! Stands in for the real backend when no API key is configured: lyrics are
//! canned around the article text and synthesis reports no audio available,
//! which downstream treats as a terminal non-error state.

use async_trait::async_trait;
use bridge_traits::narration::{NarrationProvider, Result};
use std::time::Duration;
use tracing::debug;

/// Narrator that never talks to a backend.
pub struct MockNarrator {
    /// Simulated round-trip latency per call.
    latency: Duration,
}

impl MockNarrator {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(0),
        }
    }

    /// Simulate backend latency, useful for exercising loading states.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MockNarrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NarrationProvider for MockNarrator {
    async fn compose_lyrics(&self, article: &str) -> Result<String> {
        self.simulate_round_trip().await;
        debug!("demo mode: returning canned lyrics");
        Ok(format!(
            "[Eolssu!] Gather round for the news of the day~\n\n{}\n\nJota! \
             What a story this one is!",
            article
        ))
    }

    async fn synthesize(&self, _lyrics: &str) -> Result<Option<String>> {
        self.simulate_round_trip().await;
        debug!("demo mode: no audio available");
        Ok(None)
    }
}
