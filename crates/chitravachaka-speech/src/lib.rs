// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chitravachaka speech: translation and text-to-speech collaborators that run
// after recognition, plus the retry policy guarding the speech service.

pub mod retry;
pub mod translate;
pub mod tts;

pub use retry::{RetryConfig, RetryingSynthesizer};
pub use translate::{GoogleTranslator, Translator};
pub use tts::{GoogleTts, SpeechSynthesizer};
