// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Chitravachaka reading pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Confidence reported for an attempt that failed or produced no tokens.
pub const FAILED_CONFIDENCE: f64 = -1.0;

/// Page layout assumption handed to the recognition engine.
///
/// Maps onto Tesseract's page segmentation modes (`--psm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutMode {
    /// A single uniform block of text.
    UniformBlock,
    /// A single column of text of variable sizes.
    SingleColumn,
    /// Fully automatic page segmentation, no orientation detection.
    FullyAutomatic,
    /// As much text as possible in no particular order.
    SparseText,
}

impl LayoutMode {
    /// Sweep order.
    pub const ALL: [Self; 4] = [
        Self::UniformBlock,
        Self::SingleColumn,
        Self::FullyAutomatic,
        Self::SparseText,
    ];

    /// Tesseract `--psm` value.
    pub fn psm(&self) -> u8 {
        match self {
            Self::UniformBlock => 6,
            Self::SingleColumn => 4,
            Self::FullyAutomatic => 3,
            Self::SparseText => 12,
        }
    }
}

/// Recognition algorithm selection.
///
/// Maps onto Tesseract's OCR engine modes (`--oem`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineMode {
    /// LSTM with the legacy engine as fallback where the traineddata has it
    /// (Tesseract's default mode).
    NeuralWithLegacy,
    /// LSTM only.
    NeuralOnly,
}

impl EngineMode {
    /// Sweep order.
    pub const ALL: [Self; 2] = [Self::NeuralWithLegacy, Self::NeuralOnly];

    /// Tesseract `--oem` value.
    pub fn oem(&self) -> u8 {
        match self {
            Self::NeuralWithLegacy => 3,
            Self::NeuralOnly => 1,
        }
    }
}

/// One point of the recognition sweep matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub layout: LayoutMode,
    pub engine: EngineMode,
    /// Domain wordlist to bias recognition with, if one is available.
    pub wordlist: Option<PathBuf>,
}

impl RecognitionConfig {
    /// The fixed configuration matrix: layout modes outer, engine modes inner.
    pub fn matrix(wordlist: Option<&Path>) -> Vec<Self> {
        LayoutMode::ALL
            .iter()
            .flat_map(|&layout| {
                EngineMode::ALL.iter().map(move |&engine| Self {
                    layout,
                    engine,
                    wordlist: wordlist.map(Path::to_path_buf),
                })
            })
            .collect()
    }
}

/// Outcome of a single engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The engine ran. `confidence` is the mean token confidence, or
    /// [`FAILED_CONFIDENCE`] when no token carried one.
    Recognized { confidence: f64, text: String },
    /// The engine errored; the attempt carries the failure sentinel.
    Failed { reason: String },
}

impl AttemptOutcome {
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Recognized { confidence, .. } => *confidence,
            Self::Failed { .. } => FAILED_CONFIDENCE,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Recognized { text, .. } => text,
            Self::Failed { .. } => "",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One (variant, config) cell of the sweep and what the engine returned.
#[derive(Debug, Clone)]
pub struct RecognitionAttempt {
    /// Label of the preprocessed variant, for diagnostics.
    pub variant: String,
    pub config: RecognitionConfig,
    pub outcome: AttemptOutcome,
}

/// A scored transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub score: f64,
    pub text: String,
}

impl ScoredCandidate {
    /// Starting point for selection; anything non-empty beats it.
    pub fn floor() -> Self {
        Self {
            score: f64::NEG_INFINITY,
            text: String::new(),
        }
    }
}

/// Languages the reader produces text and audio in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Kannada,
    English,
    Hindi,
}

impl Language {
    /// ISO 639-1 code, as used by the translation and speech services.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Kannada => "kn",
            Self::English => "en",
            Self::Hindi => "hi",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Marker returned to the caller when no attempt produced text.
pub const NO_TEXT_FOUND: &str = "No text found";

/// Payload returned for one processed upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub image_url: String,
    pub text_kn: String,
    pub audio_kn: Option<String>,
    pub text_en: String,
    pub audio_en: Option<String>,
    pub text_hi: String,
    pub audio_hi: Option<String>,
    pub error: Option<String>,
}

impl ProcessResponse {
    /// Response for an upload in which no text was recognised.
    pub fn no_text(image_url: String) -> Self {
        Self {
            image_url,
            text_kn: String::new(),
            audio_kn: None,
            text_en: String::new(),
            audio_en: None,
            text_hi: String::new(),
            audio_hi: None,
            error: Some(NO_TEXT_FOUND.to_string()),
        }
    }
}

/// How the caller should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Bad input from the client; retrying the same request will not help.
    ClientError,
    /// Network blip or rate limit on a collaborator; safe to retry.
    Transient,
    /// Misconfiguration or internal fault.
    ServerError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_layout_major() {
        let matrix = RecognitionConfig::matrix(None);
        assert_eq!(matrix.len(), 8);
        assert_eq!(matrix[0].layout, LayoutMode::UniformBlock);
        assert_eq!(matrix[0].engine, EngineMode::NeuralWithLegacy);
        assert_eq!(matrix[1].layout, LayoutMode::UniformBlock);
        assert_eq!(matrix[1].engine, EngineMode::NeuralOnly);
        assert_eq!(matrix[7].layout, LayoutMode::SparseText);
        assert!(matrix.iter().all(|c| c.wordlist.is_none()));
    }

    #[test]
    fn matrix_carries_wordlist() {
        let matrix = RecognitionConfig::matrix(Some(Path::new("/tmp/words.txt")));
        assert!(
            matrix
                .iter()
                .all(|c| c.wordlist.as_deref() == Some(Path::new("/tmp/words.txt")))
        );
    }

    #[test]
    fn failed_outcome_has_sentinel() {
        let outcome = AttemptOutcome::Failed {
            reason: "boom".into(),
        };
        assert_eq!(outcome.confidence(), FAILED_CONFIDENCE);
        assert_eq!(outcome.text(), "");
        assert!(outcome.is_failed());
    }

    #[test]
    fn no_text_response_serializes_nulls() {
        let response = ProcessResponse::no_text("/static/uploads/a.jpg".into());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], NO_TEXT_FOUND);
        assert!(json["audio_kn"].is_null());
        assert_eq!(json["text_en"], "");
    }
}
