// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recognition pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language pack (default `kan`).
    pub language: String,
    /// Minimum working height in pixels; shorter scans are upscaled.
    pub min_height: u32,
    /// Explicit path to the `tesseract` executable. Searched for if unset.
    pub tesseract_cmd: Option<PathBuf>,
    /// Overrides `TESSDATA_PREFIX` for engine invocations.
    pub tessdata_dir: Option<PathBuf>,
    /// Frequency-annotated dictionary (`word count` per line).
    pub wordlist_source: PathBuf,
    /// Derived one-word-per-line list passed as `--user-words`.
    pub wordlist_path: PathBuf,
    /// Run the 32 sweep attempts on the rayon pool.
    pub parallel_sweep: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "kan".to_string(),
            min_height: 1200,
            tesseract_cmd: None,
            tessdata_dir: None,
            wordlist_source: PathBuf::from("kannada_wordList_with_freq.txt"),
            wordlist_path: PathBuf::from("kannada_words.txt"),
            parallel_sweep: false,
        }
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ocr: OcrSettings,
    /// Root of the served static tree (`uploads/` and `audio/` live here).
    pub static_dir: PathBuf,
    /// Attempts per speech-synthesis request before giving up.
    pub speech_attempts: u32,
    /// Fixed pause between speech-synthesis attempts, in milliseconds.
    pub speech_backoff_ms: u64,
    /// Per-request timeout for the translation and speech services, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ocr: OcrSettings::default(),
            static_dir: PathBuf::from("static"),
            speech_attempts: 3,
            speech_backoff_ms: 1500,
            http_timeout_secs: 30,
        }
    }
}
