// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry engine with fixed backoff for the speech-synthesis service.
//
// Errors are classified through `classify_error`: client errors (such as
// empty text) give up at once; everything else is retried until the attempt
// budget is spent, then surfaced as one terminal error.

use std::time::Duration;

use async_trait::async_trait;
use chitravachaka_core::error::ChitraError;
use chitravachaka_core::human_errors::classify_error;
use chitravachaka_core::{AppConfig, ErrorClass, Language};
use tracing::{debug, info, instrument, warn};

use crate::tts::{SpeechSynthesizer, empty_text_error};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(1500),
        }
    }
}

impl RetryConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.speech_attempts.max(1),
            backoff: Duration::from_millis(config.speech_backoff_ms),
        }
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Do not retry; the request itself is at fault.
    GiveUp(ErrorClass),
    /// Attempt budget spent.
    Exhausted,
}

/// Decide what to do after `attempt` (1-based) failed with `err`.
pub fn should_retry(err: &ChitraError, attempt: u32, config: &RetryConfig) -> RetryDecision {
    match classify_error(err) {
        ErrorClass::ClientError => {
            info!("client error, not retrying");
            RetryDecision::GiveUp(ErrorClass::ClientError)
        }
        ErrorClass::Transient | ErrorClass::ServerError => {
            if attempt >= config.max_attempts {
                warn!(attempt, max = config.max_attempts, "retry limit exhausted");
                RetryDecision::Exhausted
            } else {
                debug!(attempt, delay_ms = config.backoff.as_millis(), "scheduling retry");
                RetryDecision::RetryAfter(config.backoff)
            }
        }
    }
}

/// Wraps a synthesizer with the retry policy.
pub struct RetryingSynthesizer<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: SpeechSynthesizer> RetryingSynthesizer<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl<S: SpeechSynthesizer> SpeechSynthesizer for RetryingSynthesizer<S> {
    #[instrument(skip(self, text), fields(max_attempts = self.config.max_attempts))]
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ChitraError> {
        if text.trim().is_empty() {
            return Err(empty_text_error());
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match self.inner.synthesize(text, language).await {
                Ok(audio) => return Ok(audio),
                Err(err) => err,
            };
            warn!(attempt, error = %err, "Speech synthesis attempt failed");

            match should_retry(&err, attempt, &self.config) {
                RetryDecision::RetryAfter(delay) => tokio::time::sleep(delay).await,
                RetryDecision::GiveUp(_) => return Err(err),
                RetryDecision::Exhausted => {
                    return Err(ChitraError::SpeechSynthesis(format!(
                        "Failed to generate audio after {} attempts. This can be due to network \
                         issues or rate-limiting by the speech service. Please wait a moment \
                         and try again. Last error: {}",
                        attempt, err
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with `error`, then returns audio.
    struct FlakySynth {
        calls: AtomicU32,
        failures: u32,
        error: fn() -> ChitraError,
    }

    impl FlakySynth {
        fn new(failures: u32, error: fn() -> ChitraError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                error,
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FlakySynth {
        async fn synthesize(&self, _text: &str, _lang: Language) -> Result<Vec<u8>, ChitraError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err((self.error)())
            } else {
                Ok(vec![0xFF, 0xF3])
            }
        }
    }

    fn rate_limited() -> ChitraError {
        ChitraError::SpeechSynthesis("service answered status 429".into())
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn defaults_are_three_attempts_fixed_backoff() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff, Duration::from_millis(1500));
    }

    #[test]
    fn retry_respects_max() {
        let config = RetryConfig::default();
        let err = rate_limited();
        assert_eq!(
            should_retry(&err, 1, &config),
            RetryDecision::RetryAfter(Duration::from_millis(1500))
        );
        assert_eq!(
            should_retry(&err, 2, &config),
            RetryDecision::RetryAfter(Duration::from_millis(1500))
        );
        assert_eq!(should_retry(&err, 3, &config), RetryDecision::Exhausted);
    }

    #[test]
    fn empty_text_never_retries() {
        assert_eq!(
            should_retry(&empty_text_error(), 1, &RetryConfig::default()),
            RetryDecision::GiveUp(ErrorClass::ClientError)
        );
    }

    #[tokio::test]
    async fn recovers_within_budget() {
        let synth = RetryingSynthesizer::new(FlakySynth::new(2, rate_limited), fast());
        let audio = synth.synthesize("ಕನ್ನಡ", Language::Kannada).await.unwrap();
        assert_eq!(audio, vec![0xFF, 0xF3]);
        assert_eq!(synth.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_is_terminal_speech_error() {
        let synth = RetryingSynthesizer::new(FlakySynth::new(10, rate_limited), fast());
        let err = synth
            .synthesize("ಕನ್ನಡ", Language::Kannada)
            .await
            .unwrap_err();
        assert!(matches!(err, ChitraError::SpeechSynthesis(_)));
        assert!(err.to_string().contains("after 3 attempts"));
        assert_eq!(synth.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_calling_service() {
        let synth = RetryingSynthesizer::new(FlakySynth::new(0, rate_limited), fast());
        let err = synth.synthesize("  ", Language::Hindi).await.unwrap_err();
        assert!(err.to_string().contains("empty text"));
        assert_eq!(synth.inner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn config_follows_app_settings() {
        let app = AppConfig {
            speech_attempts: 5,
            speech_backoff_ms: 200,
            ..AppConfig::default()
        };
        let config = RetryConfig::from_app_config(&app);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff, Duration::from_millis(200));
    }
}
