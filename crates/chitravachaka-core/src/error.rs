// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Chitravachaka.

use thiserror::Error;

/// Top-level error type for all Chitravachaka operations.
#[derive(Debug, Error)]
pub enum ChitraError {
    // -- Setup errors --
    #[error("configuration error: {0}")]
    Configuration(String),

    // -- Input errors --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    // -- Recognition --
    #[error("recognition failed: {0}")]
    Recognition(String),

    // -- Collaborators --
    #[error("translation failed: {0}")]
    Translation(String),

    #[error("speech synthesis failed: {0}")]
    SpeechSynthesis(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ChitraError>;
