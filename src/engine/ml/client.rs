//! Token-classification service client
//!
//! The model runtime is an external collaborator; this module owns the
//! boundary: an async [`TokenClassifier`] trait, an HTTP implementation,
//! and a bounded-retry wrapper with chunking for over-size documents. An
//! exhausted retry budget surfaces as an error the pipeline turns into
//! rule-only degradation — inference never takes a document down.

use super::merge::ClassifiedToken;
use crate::domain::MlError;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Retry and sizing policy for inference calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts per chunk (first try included)
    pub max_attempts: u32,
    /// Base backoff, doubled per attempt, with jitter
    pub base_backoff_ms: u64,
    /// Hard input ceiling per inference call; larger text is chunked
    pub max_input_chars: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 200,
            max_input_chars: 10_000,
        }
    }
}

/// Abstract token-classification service
#[async_trait]
pub trait TokenClassifier: Send + Sync {
    /// Classify a text chunk into BIO-tagged tokens
    async fn classify(&self, text: &str) -> Result<Vec<ClassifiedToken>, MlError>;
}

/// HTTP implementation against a REST inference endpoint
///
/// Request: `POST {endpoint}` with `{"text": "..."}`.
/// Response: JSON array of `{word, tag, score, start, end}`.
pub struct HttpTokenClassifier {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

impl HttpTokenClassifier {
    /// Build a client for an endpoint URL
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, MlError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| MlError::ConnectionFailed(format!("invalid endpoint: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MlError::ConnectionFailed(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl TokenClassifier for HttpTokenClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<ClassifiedToken>, MlError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MlError::Timeout(e.to_string())
                } else {
                    MlError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MlError::RequestRejected {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        response
            .json::<Vec<ClassifiedToken>>()
            .await
            .map_err(|e| MlError::InvalidResponse(e.to_string()))
    }
}

/// Classify a document with chunking and bounded retry
///
/// Over-size text is split at the last whitespace before the ceiling, each
/// chunk classified separately, and token offsets shifted back into
/// document coordinates.
pub async fn classify_with_retry(
    classifier: &dyn TokenClassifier,
    text: &str,
    policy: &RetryPolicy,
) -> Result<Vec<ClassifiedToken>, MlError> {
    let mut tokens = Vec::new();
    for (offset, chunk) in chunk_text(text, policy.max_input_chars) {
        let chunk_tokens = classify_chunk(classifier, chunk, policy).await?;
        tokens.extend(chunk_tokens.into_iter().map(|mut t| {
            t.start += offset;
            t.end += offset;
            t
        }));
    }
    Ok(tokens)
}

async fn classify_chunk(
    classifier: &dyn TokenClassifier,
    chunk: &str,
    policy: &RetryPolicy,
) -> Result<Vec<ClassifiedToken>, MlError> {
    let mut last_reason = String::new();
    for attempt in 0..policy.max_attempts {
        match classifier.classify(chunk).await {
            Ok(tokens) => return Ok(tokens),
            Err(e) if e.is_transient() && attempt + 1 < policy.max_attempts => {
                let backoff = policy.base_backoff_ms * 2u64.pow(attempt);
                let jitter = rand::thread_rng().gen_range(0..=policy.base_backoff_ms / 2);
                tracing::warn!(
                    attempt = attempt + 1,
                    backoff_ms = backoff + jitter,
                    error = %e,
                    "Transient inference failure; retrying"
                );
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
                last_reason = e.to_string();
            }
            Err(e) if e.is_transient() => {
                last_reason = e.to_string();
            }
            Err(e) => return Err(e),
        }
    }
    Err(MlError::RetriesExhausted {
        attempts: policy.max_attempts,
        reason: last_reason,
    })
}

/// Split text into (offset, chunk) pieces no longer than `max_chars` bytes,
/// breaking at the last whitespace before the limit where possible
fn chunk_text(text: &str, max_chars: usize) -> Vec<(usize, &str)> {
    if text.len() <= max_chars {
        return vec![(0, text)];
    }

    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < text.len() {
        let remaining = &text[offset..];
        if remaining.len() <= max_chars {
            chunks.push((offset, remaining));
            break;
        }

        let mut cut = max_chars;
        while cut > 0 && !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        let window = &remaining[..cut];
        // split after the last whitespace char, whatever its UTF-8 width
        let split = window
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(cut);

        chunks.push((offset, &remaining[..split]));
        offset += split;
    }
    chunks
}
