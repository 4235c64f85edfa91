// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Speech synthesis collaborator.
//
// The shipped client uses Google Translate's `translate_tts` endpoint. It only
// accepts short strings, so text is split at word boundaries into chunks of at
// most 100 characters and the returned MP3 segments are concatenated. MP3
// frames are self-delimiting, so the joined stream plays back in order.

use std::time::Duration;

use async_trait::async_trait;
use chitravachaka_core::Language;
use chitravachaka_core::error::ChitraError;
use reqwest::Client;
use tracing::{debug, instrument};

const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Longest string `translate_tts` accepts in one request, in characters.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Turns text into MP3 audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ChitraError::SpeechSynthesis`] when the text is empty or the
    /// service fails.
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ChitraError>;
}

/// Error for blank input. Classified as a client error, so it is never retried.
pub fn empty_text_error() -> ChitraError {
    ChitraError::SpeechSynthesis("empty text: nothing to speak".into())
}

/// Google Translate text-to-speech.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: Client,
    endpoint: String,
}

impl GoogleTts {
    pub fn new(timeout: Duration) -> Result<Self, ChitraError> {
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            ChitraError::Configuration(format!("failed to build HTTP client: {}", err))
        })?;
        Ok(Self {
            client,
            endpoint: TTS_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request(
        &self,
        chunk: &str,
        language: Language,
        index: usize,
        total: usize,
    ) -> Result<reqwest::Request, ChitraError> {
        let index = index.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();
        self.client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language.code()),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", index.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .build()
            .map_err(|err| ChitraError::SpeechSynthesis(format!("invalid request: {}", err)))
    }

    async fn fetch_chunk(&self, request: reqwest::Request) -> Result<Vec<u8>, ChitraError> {
        let response = self.client.execute(request).await.map_err(|err| {
            if err.is_timeout() {
                ChitraError::SpeechSynthesis(format!("request timed out: {}", err))
            } else {
                ChitraError::SpeechSynthesis(format!("connection failed: {}", err))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChitraError::SpeechSynthesis(format!(
                "service answered status {}",
                status.as_u16()
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|err| ChitraError::SpeechSynthesis(format!("connection dropped: {}", err)))?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ChitraError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(empty_text_error());
        }

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let request = self.request(chunk, language, index, chunks.len())?;
            audio.extend(self.fetch_chunk(request).await?);
        }
        debug!(chunks = chunks.len(), bytes = audio.len(), "Speech synthesised");
        Ok(audio)
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Breaks fall between words; a single word longer than `max_chars` is cut
/// at character boundaries. Blank text yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("  ನಮಸ್ಕಾರ   ಕರ್ನಾಟಕ ", 100), vec!["ನಮಸ್ಕಾರ ಕರ್ನಾಟಕ"]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text(" \n\t ", 100).is_empty());
    }

    #[test]
    fn chunks_break_between_words() {
        let chunks = chunk_text("aaaa bbbb cccc dddd", 9);
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn chunk_limit_counts_characters() {
        // 40 three-byte characters per word; two words plus a space is 81.
        let word = "ಕ".repeat(40);
        let text = format!("{word} {word} {word}");
        let chunks = chunk_text(&text, MAX_CHUNK_CHARS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 81);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CHUNK_CHARS));
    }

    #[test]
    fn overlong_word_is_cut() {
        let chunks = chunk_text("ab abcdefghij cd", 4);
        assert_eq!(chunks, vec!["ab", "abcd", "efgh", "ij", "cd"]);
    }

    #[test]
    fn request_reports_chunk_position() {
        let tts = GoogleTts::new(Duration::from_secs(5)).unwrap();
        let request = tts.request("ಕನ್ನಡ", Language::Kannada, 1, 3).unwrap();
        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("tl".into(), "kn".into())));
        assert!(pairs.contains(&("idx".into(), "1".into())));
        assert!(pairs.contains(&("total".into(), "3".into())));
        assert!(pairs.contains(&("textlen".into(), "5".into())));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_request() {
        let tts = GoogleTts::new(Duration::from_secs(5))
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/unreachable");
        let err = tts.synthesize("   ", Language::English).await.unwrap_err();
        assert!(err.to_string().contains("empty text"));
    }
}
