// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client-facing error mapping.
//
// Every failure surfaced to a caller is either a client error (bad upload),
// a transient collaborator failure, or a server fault. The speech client also
// uses the mapping to decide whether a failed request is worth retrying.

use crate::error::ChitraError;
use crate::types::ErrorClass;

/// A plain-language error with the HTTP status a boundary should answer with.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary shown to the reader.
    pub message: String,
    /// What to try next.
    pub suggestion: String,
    /// HTTP status code for the boundary.
    pub status: u16,
    pub class: ErrorClass,
}

/// Classify a `ChitraError` for the boundary and for retry decisions.
pub fn classify_error(err: &ChitraError) -> ErrorClass {
    match err {
        ChitraError::Decode(_) | ChitraError::InvalidUpload(_) => ErrorClass::ClientError,

        ChitraError::Translation(detail) | ChitraError::SpeechSynthesis(detail) => {
            classify_service_detail(detail)
        }

        ChitraError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::Interrupted => ErrorClass::Transient,
            _ => ErrorClass::ServerError,
        },

        ChitraError::Configuration(_)
        | ChitraError::Recognition(_)
        | ChitraError::Serialization(_) => ErrorClass::ServerError,
    }
}

/// Classify a collaborator error detail string.
fn classify_service_detail(detail: &str) -> ErrorClass {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection")
        || lower.contains("429")
        || lower.contains("rate limit")
        || lower.contains("status 5")
    {
        return ErrorClass::Transient;
    }

    if lower.contains("empty text") || lower.contains("unsupported language") {
        return ErrorClass::ClientError;
    }

    // Optimistic: retry first, give up later.
    ErrorClass::Transient
}

/// Convert a `ChitraError` into a `HumanError`.
pub fn humanize_error(err: &ChitraError) -> HumanError {
    let class = classify_error(err);
    match err {
        ChitraError::Decode(_) => HumanError {
            message: "We couldn't open this image.".into(),
            suggestion: "The file may be damaged. Try taking the photo again or saving it as JPEG or PNG.".into(),
            status: 400,
            class,
        },

        ChitraError::InvalidUpload(detail) => HumanError {
            message: "That upload isn't a usable image.".into(),
            suggestion: format!("Please choose a photo of the document. ({detail})"),
            status: 400,
            class,
        },

        ChitraError::Configuration(_) => HumanError {
            message: "The text reader isn't set up on this server.".into(),
            suggestion: "Tesseract and the Kannada language pack must be installed.".into(),
            status: 500,
            class,
        },

        ChitraError::Recognition(_) => HumanError {
            message: "Text recognition failed.".into(),
            suggestion: "Try again with a clearer, well-lit photo.".into(),
            status: 500,
            class,
        },

        ChitraError::Translation(_) => HumanError {
            message: "Translation is unavailable right now.".into(),
            suggestion: "Please wait a moment and try again.".into(),
            status: 502,
            class,
        },

        ChitraError::SpeechSynthesis(_) => HumanError {
            message: "We couldn't create the audio.".into(),
            suggestion: "The speech service may be rate-limiting us. Please wait a moment and try again.".into(),
            status: 502,
            class,
        },

        ChitraError::Io(_) | ChitraError::Serialization(_) => HumanError {
            message: "The server had a storage problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            status: 500,
            class,
        },
    }
}
