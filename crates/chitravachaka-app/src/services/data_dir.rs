// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk locations: the per-user data directory holding `config.json`, and
// the static tree where uploads and generated audio are kept.

use std::path::{Path, PathBuf};

use chitravachaka_core::error::Result;
use chitravachaka_core::{AppConfig, Language};
use tracing::{debug, warn};
use uuid::Uuid;

const CONFIG_FILE: &str = "config.json";

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> PathBuf {
    let dir = dirs_fallback().join("chitravachaka");
    if let Err(err) = std::fs::create_dir_all(&dir) {
        warn!(path = %dir.display(), error = %err, "could not create data directory");
    }
    dir
}

fn dirs_fallback() -> PathBuf {
    // XDG data dir, then home
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}

/// Default config location inside the data directory.
pub fn config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}

/// Load settings from `path`, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_config(path: &Path) -> AppConfig {
    let Ok(data) = std::fs::read_to_string(path) else {
        debug!(path = %path.display(), "no config file, using defaults");
        return AppConfig::default();
    };
    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring malformed config");
            AppConfig::default()
        }
    }
}

pub fn persist_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// The served static tree: `uploads/` for images, `audio/` for speech.
///
/// Stored files are addressed by URL paths under `/static/`.
#[derive(Debug, Clone)]
pub struct StaticTree {
    root: PathBuf,
}

impl StaticTree {
    /// Open the tree at `root`, creating both subdirectories.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let tree = Self { root: root.into() };
        std::fs::create_dir_all(tree.uploads_dir())?;
        std::fs::create_dir_all(tree.audio_dir())?;
        Ok(tree)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    /// Save an uploaded image under a fresh name. Returns the file path and
    /// its URL.
    pub async fn store_upload(&self, data: &[u8]) -> Result<(PathBuf, String)> {
        let name = format!("{}.jpg", Uuid::new_v4().simple());
        let path = self.uploads_dir().join(&name);
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), bytes = data.len(), "upload stored");
        Ok((path, format!("/static/uploads/{name}")))
    }

    /// Save synthesised speech for `language`. Returns its URL.
    pub async fn store_audio(&self, language: Language, audio: &[u8]) -> Result<String> {
        let name = format!("{}_{}.mp3", Uuid::new_v4().simple(), language.code());
        let path = self.audio_dir().join(&name);
        tokio::fs::write(&path, audio).await?;
        debug!(path = %path.display(), bytes = audio.len(), "audio stored");
        Ok(format!("/static/audio/{name}"))
    }

    /// Map a `/static/...` URL back to its file.
    #[cfg(test)]
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix("/static/")?;
        if relative.split('/').any(|part| part == ".." || part.is_empty()) {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = AppConfig::default();
        config.ocr.parallel_sweep = true;
        config.speech_attempts = 4;

        persist_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn missing_or_malformed_config_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(load_config(&path), AppConfig::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[tokio::test]
    async fn uploads_and_audio_get_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let tree = StaticTree::open(dir.path().join("static")).unwrap();

        let (path, url) = tree.store_upload(b"jpeg").await.unwrap();
        assert!(url.starts_with("/static/uploads/") && url.ends_with(".jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg");
        assert_eq!(tree.resolve(&url), Some(path));

        let first = tree.store_audio(Language::Hindi, b"mp3").await.unwrap();
        let second = tree.store_audio(Language::Hindi, b"mp3").await.unwrap();
        assert!(first.starts_with("/static/audio/") && first.ends_with("_hi.mp3"));
        assert_ne!(first, second);
    }

    #[test]
    fn resolve_refuses_escapes() {
        let dir = tempfile::tempdir().unwrap();
        let tree = StaticTree::open(dir.path()).unwrap();
        assert_eq!(tree.resolve("/static/../etc/passwd"), None);
        assert_eq!(tree.resolve("/elsewhere/a.mp3"), None);
    }
}
