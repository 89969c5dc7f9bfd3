//! Gemini API connector implementation
//!
//! Implements the `NarrationProvider` trait over the `generateContent` REST
//! endpoint: one text-model call composing sung-verse lyrics, one TTS-model
//! call returning inline base64 PCM.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::narration::{NarrationProvider, Result as NarrationResult};
use core_runtime::config::NarrationConfig;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{GeminiError, Result};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    PrebuiltVoiceConfig, SpeechConfig, VoiceConfig,
};

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Sampling temperature for lyrics composition.
const LYRICS_TEMPERATURE: f32 = 0.7;

/// Gemini narration connector.
///
/// # Features
///
/// - Lyrics composition via the configured text model
/// - Speech synthesis via the configured TTS model (prebuilt voice,
///   inline base64 PCM response)
/// - Two-attempt retry with exponential backoff, applied only to
///   backend-side (5xx) failures
/// - API-key authentication via request header
///
/// # Example
///
/// ```ignore
/// use provider_gemini::GeminiNarrator;
/// use bridge_traits::narration::NarrationProvider;
///
/// let narrator = GeminiNarrator::new(http_client, api_key, config);
/// let lyrics = narrator.compose_lyrics("Markets rallied today...").await?;
/// let audio = narrator.synthesize(&lyrics).await?;
/// ```
pub struct GeminiNarrator {
    /// HTTP client for API requests.
    http_client: Arc<dyn HttpClient>,

    /// API key sent with every request.
    api_key: String,

    /// Models, voice, and retry settings.
    config: NarrationConfig,
}

impl GeminiNarrator {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        config: NarrationConfig,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            config,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", GEMINI_API_BASE, model)
    }

    /// Execute a `generateContent` call with retry.
    ///
    /// Quota (429) and permission (403) failures are terminal immediately;
    /// 5xx responses are retried up to `max_attempts` with exponential
    /// backoff; other non-success statuses fail without retry. Transport
    /// errors are not retried — the caller decides whether to re-run the
    /// whole conversion.
    #[instrument(skip(self, body), fields(model = %model))]
    async fn generate(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model);
        let mut attempt = 0u32;

        loop {
            let request = HttpRequest::new(HttpMethod::Post, url.clone())
                .header("x-goog-api-key", self.api_key.clone())
                .json(body)?
                .timeout(self.config.request_timeout);

            let response = self.http_client.execute(request).await?;
            let status = response.status;

            if response.is_success() {
                debug!(status, "generateContent succeeded");
                return response
                    .json::<GenerateContentResponse>()
                    .map_err(|e| GeminiError::ParseError(e.to_string()));
            }

            let message = String::from_utf8_lossy(&response.body).to_string();
            match status {
                429 => return Err(GeminiError::QuotaExceeded),
                403 => return Err(GeminiError::PermissionDenied),
                500..=599 => {
                    attempt += 1;
                    if attempt >= self.config.max_attempts {
                        warn!(status, attempt, "generateContent failed after retries");
                        return Err(GeminiError::Backend {
                            status_code: status,
                            message,
                        });
                    }

                    let backoff = self.config.backoff_base * 2u32.pow(attempt - 1);
                    warn!(
                        status,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "generateContent failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                _ => {
                    warn!(status, "generateContent failed");
                    return Err(GeminiError::ApiError {
                        status_code: status,
                        message,
                    });
                }
            }
        }
    }

    async fn compose_lyrics_inner(&self, article: &str) -> Result<String> {
        info!(chars = article.len(), "composing sung-verse lyrics");

        let prompt = format!(
            "You are a master pansori singer. Turn the following news article \
             into a rousing sung-verse narrative. Weave in traditional \
             interjections (eolssu!, jota!), keep it satirical yet spirited, \
             and preserve the key facts.\n\nArticle: {}",
            article
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(LYRICS_TEMPERATURE),
                response_modalities: None,
                speech_config: None,
            }),
        };

        let response = self.generate(&self.config.lyrics_model, &body).await?;
        response
            .first_text()
            .ok_or_else(|| GeminiError::ParseError("no text in lyrics response".to_string()))
    }

    async fn synthesize_inner(&self, lyrics: &str) -> Result<String> {
        info!(chars = lyrics.len(), "synthesizing narration speech");

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(format!(
                    "Sing this with the full, forceful voice of a street singer: {}",
                    lyrics
                ))],
            }],
            generation_config: Some(GenerationConfig {
                temperature: None,
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.config.voice.clone(),
                        },
                    },
                }),
            }),
        };

        let response = self.generate(&self.config.speech_model, &body).await?;
        response
            .first_inline_data()
            .map(|data| data.data.clone())
            .ok_or_else(|| GeminiError::ParseError("no audio in speech response".to_string()))
    }
}

#[async_trait]
impl NarrationProvider for GeminiNarrator {
    async fn compose_lyrics(&self, article: &str) -> NarrationResult<String> {
        self.compose_lyrics_inner(article).await.map_err(Into::into)
    }

    async fn synthesize(&self, lyrics: &str) -> NarrationResult<Option<String>> {
        self.synthesize_inner(lyrics)
            .await
            .map(Some)
            .map_err(Into::into)
    }
}
