// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition sweep: every enhancement variant against every layout/engine
// configuration.

use std::path::{Path, PathBuf};

use chitravachaka_core::{AttemptOutcome, FAILED_CONFIDENCE, RecognitionAttempt, RecognitionConfig};
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::scan::enhance::Variant;
use crate::scan::ocr::{DEFAULT_DPI, RecognitionEngine, RecognitionRequest, RecognizedToken};

/// Runs the variant × configuration matrix against one engine.
pub struct RecognitionSweep<'a> {
    engine: &'a dyn RecognitionEngine,
    language: String,
    wordlist: Option<PathBuf>,
    parallel: bool,
}

impl<'a> RecognitionSweep<'a> {
    pub fn new(engine: &'a dyn RecognitionEngine, language: impl Into<String>) -> Self {
        Self {
            engine,
            language: language.into(),
            wordlist: None,
            parallel: false,
        }
    }

    /// Bias recognition with a wordlist. Ignored unless the file exists when
    /// the sweep runs.
    pub fn with_wordlist(mut self, wordlist: Option<impl AsRef<Path>>) -> Self {
        self.wordlist = wordlist.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Spread attempts over the rayon pool. Results keep sweep order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The configuration matrix used for every variant.
    pub fn configs(&self) -> Vec<RecognitionConfig> {
        let wordlist = self.wordlist.as_deref().filter(|path| path.is_file());
        RecognitionConfig::matrix(wordlist)
    }

    /// Run every attempt. Always returns `variants.len() * configs().len()`
    /// attempts, ordered variant-major, then layout mode, then engine mode.
    #[instrument(skip_all, fields(variants = variants.len(), language = %self.language))]
    pub fn run(&self, variants: &[Variant]) -> Vec<RecognitionAttempt> {
        let configs = self.configs();
        let cells: Vec<(&Variant, &RecognitionConfig)> = variants
            .iter()
            .flat_map(|variant| configs.iter().map(move |config| (variant, config)))
            .collect();
        info!(
            attempts = cells.len(),
            wordlist = configs.first().is_some_and(|c| c.wordlist.is_some()),
            parallel = self.parallel,
            "Starting recognition sweep"
        );

        let attempts: Vec<RecognitionAttempt> = if self.parallel {
            cells
                .par_iter()
                .map(|&(variant, config)| self.attempt(variant, config))
                .collect()
        } else {
            cells
                .iter()
                .map(|&(variant, config)| self.attempt(variant, config))
                .collect()
        };

        let failed = attempts.iter().filter(|a| a.outcome.is_failed()).count();
        debug!(failed, "Recognition sweep complete");
        attempts
    }

    fn attempt(&self, variant: &Variant, config: &RecognitionConfig) -> RecognitionAttempt {
        let request = RecognitionRequest {
            language: &self.language,
            config,
            dpi: DEFAULT_DPI,
        };

        let outcome = match self.engine.recognize(&variant.image, &request) {
            Ok(tokens) => summarize_tokens(&tokens),
            Err(err) => {
                warn!(
                    variant = variant.label,
                    psm = config.layout.psm(),
                    oem = config.engine.oem(),
                    error = %err,
                    "Recognition attempt failed"
                );
                AttemptOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        RecognitionAttempt {
            variant: variant.label.to_string(),
            config: config.clone(),
            outcome,
        }
    }
}

/// Collapse engine tokens into one attempt outcome.
///
/// Confidence is the mean of the non-negative token confidences
/// ([`FAILED_CONFIDENCE`] when there are none). Text is the non-empty token
/// texts joined by single spaces.
pub fn summarize_tokens(tokens: &[RecognizedToken]) -> AttemptOutcome {
    let confidences: Vec<f64> = tokens
        .iter()
        .map(|t| t.confidence)
        .filter(|c| *c >= 0.0)
        .collect();
    let confidence = if confidences.is_empty() {
        FAILED_CONFIDENCE
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    let text = tokens
        .iter()
        .map(|t| t.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    AttemptOutcome::Recognized { confidence, text }
}
