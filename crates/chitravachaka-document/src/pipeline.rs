// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end text extraction: normalise, enhance, sweep, select.

use std::path::PathBuf;

use chitravachaka_core::error::ChitraError;
use chitravachaka_core::{OcrSettings, RecognitionAttempt};
use tracing::{info, instrument};

use crate::bootstrap;
use crate::image::normalizer::{ImageInput, ImageNormalizer};
use crate::scan::enhance::ScanEnhancer;
use crate::scan::ocr::{RecognitionEngine, TesseractEngine};
use crate::scan::select::select_best;
use crate::scan::sweep::RecognitionSweep;

/// The full result of reading one page.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Best transcription, trimmed. Empty when nothing was read.
    pub text: String,
    /// Score of the winning attempt (negative infinity when `text` is empty).
    pub score: f64,
    /// Every attempt in sweep order.
    pub attempts: Vec<RecognitionAttempt>,
}

/// Reads printed text from document photographs.
pub struct DocumentReader {
    normalizer: ImageNormalizer,
    enhancer: ScanEnhancer,
    engine: Box<dyn RecognitionEngine>,
    language: String,
    wordlist: Option<PathBuf>,
    parallel: bool,
}

impl DocumentReader {
    /// Bootstrap the engine and build a reader around the tesseract CLI.
    ///
    /// # Errors
    ///
    /// Returns [`ChitraError::Configuration`] if tesseract cannot be found.
    pub fn from_settings(settings: &OcrSettings) -> Result<Self, ChitraError> {
        let setup = bootstrap::bootstrap(settings)?;
        let mut engine = TesseractEngine::new(&setup.tesseract);
        if let Some(dir) = &settings.tessdata_dir {
            engine = engine.with_tessdata_dir(dir);
        }
        let mut reader = Self::with_engine(Box::new(engine), settings);
        reader.wordlist = setup.wordlist.clone();
        Ok(reader)
    }

    /// Build a reader around any engine. No bootstrap is performed; the
    /// wordlist from `settings` is used if it exists when a page is read.
    pub fn with_engine(engine: Box<dyn RecognitionEngine>, settings: &OcrSettings) -> Self {
        Self {
            normalizer: ImageNormalizer::new(settings.min_height),
            enhancer: ScanEnhancer::new(),
            engine,
            language: settings.language.clone(),
            wordlist: Some(settings.wordlist_path.clone()),
            parallel: settings.parallel_sweep,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Read one page, keeping every attempt for inspection.
    ///
    /// # Errors
    ///
    /// Only decoding can fail. Engine failures are absorbed per attempt.
    #[instrument(skip_all, fields(language = %self.language))]
    pub fn extract(&self, input: impl Into<ImageInput>) -> Result<Extraction, ChitraError> {
        let page = self.normalizer.normalize(input.into())?;
        let variants = self.enhancer.variants(&page);

        let attempts = RecognitionSweep::new(self.engine.as_ref(), self.language.as_str())
            .with_wordlist(self.wordlist.as_ref())
            .parallel(self.parallel)
            .run(&variants);

        let best = select_best(attempts.iter().map(|a| &a.outcome));
        info!(
            chars = best.text.chars().count(),
            score = best.score,
            "Text extraction complete"
        );

        Ok(Extraction {
            text: best.text,
            score: best.score,
            attempts,
        })
    }

    /// Read one page and return only the best transcription.
    pub fn extract_text(&self, input: impl Into<ImageInput>) -> Result<String, ChitraError> {
        Ok(self.extract(input)?.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chitravachaka_core::FAILED_CONFIDENCE;
    use image::{GrayImage, Luma};

    use crate::scan::ocr::{RecognitionRequest, RecognizedToken};

    /// Answers from a fixed script indexed by call number; `None` entries
    /// fail. Calls past the end of the script read nothing.
    struct ScriptedEngine {
        calls: AtomicUsize,
        script: Vec<Option<Vec<RecognizedToken>>>,
        sizes: Mutex<Vec<(u32, u32)>>,
    }

    impl ScriptedEngine {
        fn new(script: Vec<Option<Vec<RecognizedToken>>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script,
                sizes: Mutex::new(Vec::new()),
            })
        }
    }

    impl RecognitionEngine for Arc<ScriptedEngine> {
        fn recognize(
            &self,
            image: &GrayImage,
            _request: &RecognitionRequest<'_>,
        ) -> Result<Vec<RecognizedToken>, ChitraError> {
            self.sizes
                .lock()
                .unwrap()
                .push((image.width(), image.height()));
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.get(call) {
                Some(Some(tokens)) => Ok(tokens.clone()),
                Some(None) => Err(ChitraError::Recognition("engine crashed".into())),
                None => Ok(Vec::new()),
            }
        }
    }

    fn word(text: &str, confidence: f64) -> Option<Vec<RecognizedToken>> {
        Some(vec![RecognizedToken {
            text: text.to_string(),
            confidence,
        }])
    }

    fn small_settings() -> OcrSettings {
        OcrSettings {
            min_height: 48,
            wordlist_path: PathBuf::from("/nonexistent/words.txt"),
            ..OcrSettings::default()
        }
    }

    fn reader_for(engine: &Arc<ScriptedEngine>) -> DocumentReader {
        DocumentReader::with_engine(Box::new(Arc::clone(engine)), &small_settings())
    }

    #[test]
    fn blank_page_reads_as_empty() {
        let engine = ScriptedEngine::new(Vec::new());
        let blank = GrayImage::from_pixel(32, 24, Luma([255]));

        let extraction = reader_for(&engine).extract(blank).unwrap();
        assert_eq!(extraction.text, "");
        assert_eq!(extraction.score, f64::NEG_INFINITY);
        assert_eq!(extraction.attempts.len(), 32);
    }

    #[test]
    fn every_attempt_sees_the_upscaled_page() {
        let engine = ScriptedEngine::new(Vec::new());
        reader_for(&engine)
            .extract(GrayImage::from_pixel(32, 24, Luma([255])))
            .unwrap();

        let seen = engine.sizes.lock().unwrap();
        assert_eq!(seen.len(), 32);
        assert!(seen.iter().all(|&size| size == (64, 48)));
    }

    #[test]
    fn failing_attempt_does_not_change_the_winner() {
        let mut script: Vec<_> = (0..32).map(|_| word("", 0.0)).collect();
        script[3] = word("ಕನ್ನಡ ಪಠ್ಯ", 71.0);
        script[20] = word("ಕನ್ನಡ", 40.0);
        let baseline = ScriptedEngine::new(script.clone());
        script[11] = None;
        let flaky = ScriptedEngine::new(script);

        let page = GrayImage::from_pixel(32, 24, Luma([200]));
        let a = reader_for(&baseline).extract(page.clone()).unwrap();
        let b = reader_for(&flaky).extract(page).unwrap();

        assert_eq!(a.text, "ಕನ್ನಡ ಪಠ್ಯ");
        assert_eq!(b.text, a.text);
        assert_eq!(b.score, a.score);
        assert!(b.attempts[11].outcome.is_failed());
        assert_eq!(b.attempts[11].outcome.confidence(), FAILED_CONFIDENCE);
    }

    #[test]
    fn extract_text_returns_trimmed_best() {
        let engine = ScriptedEngine::new(vec![word("  ಭಾಷೆ  ", 65.0)]);
        let text = reader_for(&engine)
            .extract_text(GrayImage::from_pixel(16, 16, Luma([128])))
            .unwrap();
        assert_eq!(text, "ಭಾಷೆ");
    }

    #[test]
    fn undecodable_bytes_fail_the_request() {
        let engine = ScriptedEngine::new(Vec::new());
        let err = reader_for(&engine).extract(vec![0u8, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, ChitraError::Decode(_)));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }
}
