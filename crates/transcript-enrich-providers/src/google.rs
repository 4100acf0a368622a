// crates/transcript-enrich-providers/src/google.rs
// ============================================================================
// Module: Google Web Translator
// Description: Translator backed by the public Google web translation endpoint.
// Purpose: Resolve cache misses through the `translate_a/single` API.
// Dependencies: transcript-enrich-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! This provider issues one bounded GET request per translation against the
//! unauthenticated web endpoint (`client=gtx`), with automatic source
//! language detection and a fixed target language. The response is a nested
//! JSON array; the decoder concatenates the translated segments and reads the
//! detected language. Redirects are not followed and response bodies are
//! size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::Value;
use transcript_enrich_core::TranslateError;
use transcript_enrich_core::Translation;
use transcript_enrich_core::Translator;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the Google web translator.
///
/// # Invariants
/// - `max_response_bytes` is enforced as a hard upper bound on response bodies.
/// - `timeout_ms` applies to the full request lifecycle.
/// - Redirects are never followed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GoogleTranslatorConfig {
    /// Endpoint URL for the translation API.
    pub endpoint: String,
    /// Target language code for every translation.
    pub target_language: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for GoogleTranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            target_language: "en".to_string(),
            timeout_ms: 5_000,
            max_response_bytes: 1024 * 1024,
            user_agent: "transcript-enrich/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Translator Implementation
// ============================================================================

/// Translator backed by the public Google web translation endpoint.
///
/// # Invariants
/// - One `translate` call is one network round trip; nothing is batched.
/// - Source language is always auto-detected (`sl=auto`).
pub struct GoogleWebTranslator {
    /// Provider configuration, including limits.
    config: GoogleTranslatorConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl GoogleWebTranslator {
    /// Creates a new translator with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Transport`] when the HTTP client cannot be
    /// created.
    pub fn new(config: GoogleTranslatorConfig) -> Result<Self, TranslateError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| TranslateError::Transport("http client build failed".to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }
}

#[async_trait]
impl Translator for GoogleWebTranslator {
    async fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", self.config.target_language.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|err| TranslateError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Transport(format!("http status {status}")));
        }
        if let Some(expected) = response.content_length() {
            let limit = u64::try_from(self.config.max_response_bytes)
                .map_err(|_| TranslateError::Malformed("size limit exceeds u64".to_string()))?;
            if expected > limit {
                return Err(TranslateError::Malformed(
                    "response exceeds size limit".to_string(),
                ));
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| TranslateError::Transport(err.to_string()))?;
        if body.len() > self.config.max_response_bytes {
            return Err(TranslateError::Malformed("response exceeds size limit".to_string()));
        }

        let document: Value = serde_json::from_slice(&body)
            .map_err(|err| TranslateError::Malformed(format!("invalid json: {err}")))?;
        decode_translation(&document)
    }
}

// ============================================================================
// SECTION: Response Decoding
// ============================================================================

/// Decodes the endpoint's nested-array response document.
///
/// The first element holds translated segments as `[translated, source, ..]`
/// pairs; their translated parts concatenate into the full text. Segments
/// without a translated part are skipped. The third element is the detected
/// source language code.
///
/// # Errors
///
/// Returns [`TranslateError::Malformed`] when the document does not carry at
/// least one translated segment and a detected language.
pub fn decode_translation(document: &Value) -> Result<Translation, TranslateError> {
    let segments = document
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed("missing segment list".to_string()))?;

    let mut text = String::new();
    for segment in segments {
        if let Some(part) = segment.get(0).and_then(Value::as_str) {
            text.push_str(part);
        }
    }
    if text.is_empty() {
        return Err(TranslateError::Malformed("empty translation".to_string()));
    }

    let detected_language = document
        .get(2)
        .and_then(Value::as_str)
        .ok_or_else(|| TranslateError::Malformed("missing detected language".to_string()))?
        .to_string();

    Ok(Translation {
        text,
        detected_language,
    })
}
