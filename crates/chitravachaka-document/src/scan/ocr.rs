// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) engine seam for Chitravachaka.
//
// The sweep talks to a `RecognitionEngine`; the shipped implementation drives
// the `tesseract` command-line tool. Each call encodes the bitmap as PNG,
// pipes it to `tesseract stdin stdout ... tsv`, and parses the word rows of
// the TSV report into tokens.
//
// # Engine Setup
//
// Tesseract 4 or later with the language pack for the target script, e.g.:
//
// ```sh
// apt install tesseract-ocr tesseract-ocr-kan
// ```
//
// `TESSDATA_PREFIX` (or `OcrSettings::tessdata_dir`) selects the directory
// holding `kan.traineddata` when it is not in the default location.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chitravachaka_core::RecognitionConfig;
use chitravachaka_core::error::ChitraError;
use image::{GrayImage, ImageFormat};
use tracing::{debug, instrument, trace};

/// Resolution hint passed with every page.
pub const DEFAULT_DPI: u32 = 300;

/// Everything the engine needs to know about one invocation besides pixels.
#[derive(Debug, Clone)]
pub struct RecognitionRequest<'a> {
    /// Tesseract language code, e.g. `kan`.
    pub language: &'a str,
    pub config: &'a RecognitionConfig,
    pub dpi: u32,
}

/// One word as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedToken {
    pub text: String,
    /// 0–100, or negative when the engine gives no confidence.
    pub confidence: f64,
}

/// A recognition backend.
///
/// Must be callable many times per process; the sweep invokes it 32 times per
/// page and possibly from several threads at once.
pub trait RecognitionEngine: Send + Sync {
    /// Recognise the words on a single-channel page.
    ///
    /// # Errors
    ///
    /// Returns [`ChitraError::Recognition`] if the engine could not run. The
    /// sweep absorbs this into a failed attempt.
    fn recognize(
        &self,
        image: &GrayImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<RecognizedToken>, ChitraError>;
}

/// Tesseract driven through its command-line interface.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractEngine {
    /// Use the executable at `command`.
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            tessdata_dir: None,
        }
    }

    /// Point the engine at a specific `tessdata` directory.
    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    fn build_command(&self, request: &RecognitionRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(request.language)
            .arg("--oem")
            .arg(request.config.engine.oem().to_string())
            .arg("--psm")
            .arg(request.config.layout.psm().to_string())
            .arg("--dpi")
            .arg(request.dpi.to_string());
        if let Some(wordlist) = &request.config.wordlist {
            cmd.arg("--user-words").arg(wordlist);
        }
        cmd.arg("tsv");

        if let Some(dir) = &self.tessdata_dir {
            cmd.env("TESSDATA_PREFIX", dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl RecognitionEngine for TesseractEngine {
    #[instrument(skip_all, fields(
        psm = request.config.layout.psm(),
        oem = request.config.engine.oem(),
        width = image.width(),
        height = image.height(),
    ))]
    fn recognize(
        &self,
        image: &GrayImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<RecognizedToken>, ChitraError> {
        let png = encode_png(image)?;

        let mut child = self.build_command(request).spawn().map_err(|err| {
            ChitraError::Recognition(format!(
                "failed to launch {}: {}",
                self.command.display(),
                err
            ))
        })?;

        // Tesseract reads the whole image before writing anything, so the
        // write cannot deadlock against a full stdout pipe. A failed write is
        // held until the child is reaped: an early exit (missing language
        // data) closes stdin and the reason is on stderr.
        let streamed = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };

        let output = child.wait_with_output().map_err(|err| {
            ChitraError::Recognition(format!("tesseract did not finish: {}", err))
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if let Err(err) = streamed {
            return Err(ChitraError::Recognition(if stderr.is_empty() {
                format!("failed to stream page to tesseract: {}", err)
            } else {
                format!("tesseract exited with {}: {}", output.status, stderr)
            }));
        }
        if !output.status.success() {
            return Err(ChitraError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status, stderr
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let tokens = parse_tsv(&tsv);
        debug!(tokens = tokens.len(), "Tesseract pass complete");
        Ok(tokens)
    }
}

fn encode_png(image: &GrayImage) -> Result<Vec<u8>, ChitraError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|err| ChitraError::Recognition(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Word level in Tesseract's TSV hierarchy (page, block, paragraph, line, word).
const TSV_WORD_LEVEL: &str = "5";
const TSV_CONF_COLUMN: usize = 10;
const TSV_TEXT_COLUMN: usize = 11;

/// Extract word rows from a Tesseract TSV report.
///
/// Rows that are not word level, or whose confidence cannot be parsed, are
/// skipped.
pub fn parse_tsv(tsv: &str) -> Vec<RecognizedToken> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.first() != Some(&TSV_WORD_LEVEL) {
                return None;
            }
            let confidence = columns.get(TSV_CONF_COLUMN)?.trim().parse::<f64>().ok()?;
            let text = columns.get(TSV_TEXT_COLUMN).copied().unwrap_or_default();
            trace!(confidence, text, "TSV word");
            Some(RecognizedToken {
                text: text.to_string(),
                confidence,
            })
        })
        .collect()
}
