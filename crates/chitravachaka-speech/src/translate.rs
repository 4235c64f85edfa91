// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Translation collaborator.
//
// The shipped client calls Google's public `gtx` translate endpoint, which
// answers with a nested JSON array of translated segments.

use std::time::Duration;

use async_trait::async_trait;
use chitravachaka_core::Language;
use chitravachaka_core::error::ChitraError;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

const GTX_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Translates text between two languages.
#[async_trait]
pub trait Translator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ChitraError::Translation`] when the service is unreachable or
    /// answers with something that is not a translation.
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, ChitraError>;
}

/// Google Translate through the keyless `gtx` client endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ChitraError> {
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            ChitraError::Configuration(format!("failed to build HTTP client: {}", err))
        })?;
        Ok(Self {
            client,
            endpoint: GTX_ENDPOINT.to_string(),
        })
    }

    /// Send requests somewhere other than Google, e.g. a caching proxy.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<reqwest::Request, ChitraError> {
        self.client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source.code()),
                ("tl", target.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .build()
            .map_err(|err| ChitraError::Translation(format!("invalid request: {}", err)))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, ChitraError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let request = self.request(text, source, target)?;
        let response = self.client.execute(request).await.map_err(|err| {
            if err.is_timeout() {
                ChitraError::Translation(format!("request timed out: {}", err))
            } else {
                ChitraError::Translation(format!("connection failed: {}", err))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChitraError::Translation(format!(
                "service answered status {}",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ChitraError::Translation(format!("unreadable response: {}", err)))?;
        let translated = parse_gtx_response(&body)?;
        debug!(chars = translated.chars().count(), "Translation received");
        Ok(translated)
    }
}

/// Join the translated segments of a `gtx` response.
///
/// The first element of the top-level array lists segments; the first element
/// of each segment is its translation.
pub fn parse_gtx_response(body: &Value) -> Result<String, ChitraError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ChitraError::Translation("response has no translated segments".into()))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}
