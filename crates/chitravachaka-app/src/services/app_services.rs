// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: turns one uploaded photograph into text, two
// translations and three audio files.
//
// Recognition is CPU-bound and runs on the blocking pool. Translation and
// speech then fan out: Kannada speech starts at once, while English and Hindi
// each translate first and speak second. The three chains are joined once.

use std::sync::Arc;

use chitravachaka_core::error::{ChitraError, Result};
use chitravachaka_core::{AppConfig, Language, ProcessResponse};
use chitravachaka_document::DocumentReader;
use chitravachaka_speech::{
    GoogleTranslator, GoogleTts, RetryConfig, RetryingSynthesizer, SpeechSynthesizer, Translator,
};
use tracing::{info, instrument};

use super::data_dir::StaticTree;

/// Shared processing services. Cheap to clone.
#[derive(Clone)]
pub struct ProcessingService {
    reader: Arc<DocumentReader>,
    translator: Arc<dyn Translator>,
    speech: Arc<dyn SpeechSynthesizer>,
    tree: StaticTree,
}

impl ProcessingService {
    /// Wire up the production collaborators from `config`.
    ///
    /// Bootstraps the recognition engine, so this fails with a configuration
    /// error when tesseract is missing.
    pub fn init(config: &AppConfig) -> Result<Self> {
        let reader = DocumentReader::from_settings(&config.ocr)?;
        let timeout = std::time::Duration::from_secs(config.http_timeout_secs);
        let translator = GoogleTranslator::new(timeout)?;
        let speech = RetryingSynthesizer::new(
            GoogleTts::new(timeout)?,
            RetryConfig::from_app_config(config),
        );
        let tree = StaticTree::open(&config.static_dir)?;

        info!(static_dir = %config.static_dir.display(), "processing services initialised");
        Ok(Self::new(
            reader,
            Arc::new(translator),
            Arc::new(speech),
            tree,
        ))
    }

    pub fn new(
        reader: DocumentReader,
        translator: Arc<dyn Translator>,
        speech: Arc<dyn SpeechSynthesizer>,
        tree: StaticTree,
    ) -> Self {
        Self {
            reader: Arc::new(reader),
            translator,
            speech,
            tree,
        }
    }

    // -- Recognition ---------------------------------------------------------

    /// Best transcription of an image, computed on the blocking pool.
    pub async fn recognize(&self, image: Vec<u8>) -> Result<String> {
        let reader = Arc::clone(&self.reader);
        tokio::task::spawn_blocking(move || reader.extract_text(image))
            .await
            .map_err(|err| ChitraError::Recognition(format!("recognition task failed: {}", err)))?
    }

    // -- Full pipeline -------------------------------------------------------

    /// Validate, store, read, translate and speak one upload.
    ///
    /// # Errors
    ///
    /// [`ChitraError::InvalidUpload`] for a non-image or empty upload,
    /// [`ChitraError::Decode`] for an unreadable image, and the terminal
    /// translation or speech error if a collaborator gives up.
    #[instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn process_upload(&self, content_type: &str, body: Vec<u8>) -> Result<ProcessResponse> {
        validate_upload(content_type, &body)?;

        let (_, image_url) = self.tree.store_upload(&body).await?;
        let text_kn = self.recognize(body).await?;

        if text_kn.trim().is_empty() {
            info!(image_url = %image_url, "no text found");
            return Ok(ProcessResponse::no_text(image_url));
        }

        let (audio_kn, english, hindi) = tokio::join!(
            self.speak(&text_kn, Language::Kannada),
            self.translate_and_speak(&text_kn, Language::English),
            self.translate_and_speak(&text_kn, Language::Hindi),
        );
        let audio_kn = audio_kn?;
        let (text_en, audio_en) = english?;
        let (text_hi, audio_hi) = hindi?;

        info!(image_url = %image_url, "upload processed");
        Ok(ProcessResponse {
            image_url,
            text_kn,
            audio_kn: Some(audio_kn),
            text_en,
            audio_en: Some(audio_en),
            text_hi,
            audio_hi: Some(audio_hi),
            error: None,
        })
    }

    async fn speak(&self, text: &str, language: Language) -> Result<String> {
        let audio = self.speech.synthesize(text, language).await?;
        self.tree.store_audio(language, &audio).await
    }

    async fn translate_and_speak(&self, text_kn: &str, target: Language) -> Result<(String, String)> {
        let translated = self
            .translator
            .translate(text_kn, Language::Kannada, target)
            .await?;
        let audio_url = self.speak(&translated, target).await?;
        Ok((translated, audio_url))
    }
}

/// Reject uploads that are not images or carry no bytes.
pub fn validate_upload(content_type: &str, body: &[u8]) -> Result<()> {
    if !content_type.starts_with("image/") {
        return Err(ChitraError::InvalidUpload("File must be an image".into()));
    }
    if body.is_empty() {
        return Err(ChitraError::InvalidUpload("Empty file".into()));
    }
    Ok(())
}
