// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-time engine setup: find the tesseract executable and derive the domain
// wordlist from the frequency dictionary.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chitravachaka_core::OcrSettings;
use chitravachaka_core::error::ChitraError;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Install locations checked before searching `PATH`.
const KNOWN_INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// Resolved engine setup, shared for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSetup {
    pub tesseract: PathBuf,
    /// Derived wordlist, when one exists on disk.
    pub wordlist: Option<PathBuf>,
}

static ENGINE_SETUP: OnceLock<EngineSetup> = OnceLock::new();

/// Prepare the engine once per process.
///
/// Later calls return the first successful result without touching the
/// filesystem. A failed call leaves nothing cached, so it can be retried after
/// fixing the installation.
///
/// # Errors
///
/// Returns [`ChitraError::Configuration`] when tesseract cannot be found, and
/// [`ChitraError::Io`] when the wordlist cannot be written.
pub fn bootstrap(settings: &OcrSettings) -> Result<&'static EngineSetup, ChitraError> {
    if let Some(setup) = ENGINE_SETUP.get() {
        return Ok(setup);
    }
    let setup = prepare(settings)?;
    Ok(ENGINE_SETUP.get_or_init(|| setup))
}

/// The uncached body of [`bootstrap`].
#[instrument(skip_all)]
pub fn prepare(settings: &OcrSettings) -> Result<EngineSetup, ChitraError> {
    let tesseract = locate_tesseract(settings.tesseract_cmd.as_deref())?;
    info!(path = %tesseract.display(), "Tesseract configured");

    derive_wordlist(&settings.wordlist_source, &settings.wordlist_path)?;
    let wordlist = settings
        .wordlist_path
        .is_file()
        .then(|| settings.wordlist_path.clone());

    Ok(EngineSetup {
        tesseract,
        wordlist,
    })
}

/// Find the tesseract executable.
///
/// An explicit path wins; otherwise the known install locations are tried,
/// then every directory on `PATH`.
pub fn locate_tesseract(explicit: Option<&Path>) -> Result<PathBuf, ChitraError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ChitraError::Configuration(format!(
                "tesseract not found at configured path {}",
                path.display()
            )))
        };
    }

    if let Some(found) = KNOWN_INSTALL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
    {
        return Ok(found);
    }

    search_path("tesseract").ok_or_else(|| {
        ChitraError::Configuration(
            "Tesseract not found. Install Tesseract and ensure it's in PATH.".into(),
        )
    })
}

fn search_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let names: Vec<String> = if cfg!(windows) {
        vec![format!("{program}.exe"), program.to_string()]
    } else {
        vec![program.to_string()]
    };
    std::env::split_paths(&path_var)
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Write the first token of every non-blank line of `source` to `target`.
///
/// Does nothing when `target` already exists or `source` is missing. Returns
/// whether a file was written.
pub fn derive_wordlist(source: &Path, target: &Path) -> Result<bool, ChitraError> {
    if target.exists() {
        debug!(path = %target.display(), "Wordlist already present");
        return Ok(false);
    }
    if !source.is_file() {
        debug!(path = %source.display(), "No frequency dictionary; skipping wordlist");
        return Ok(false);
    }

    // Staged beside the target; only a complete list is renamed into place.
    let dir = target.parent().filter(|p| !p.as_os_str().is_empty());
    let staging = NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
    let reader = BufReader::new(File::open(source)?);
    let mut writer = BufWriter::new(staging);
    let mut words = 0usize;
    for line in reader.lines() {
        let line = line?;
        if let Some(word) = line.split_whitespace().next() {
            writeln!(writer, "{word}")?;
            words += 1;
        }
    }
    let staging = writer.into_inner().map_err(|err| err.into_error())?;
    staging.persist(target).map_err(|err| err.error)?;

    info!(path = %target.display(), words, "Created Tesseract wordlist");
    Ok(true)
}
