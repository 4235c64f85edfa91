// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chitravachaka: read printed Kannada from a photograph, translate it, and
// speak it.
//
// Entry point. Initialises logging, loads configuration, applies command-line
// overrides and dispatches the subcommand.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chitravachaka_core::AppConfig;
use chitravachaka_core::error::{ChitraError, Result};
use chitravachaka_core::human_errors::humanize_error;
use chitravachaka_document::DocumentReader;
use clap::{Parser, Subcommand};
use image::ImageFormat;
use tracing::{error, info};

use services::app_services::ProcessingService;
use services::data_dir;

#[derive(Parser, Debug)]
#[command(name = "chitravachaka")]
#[command(version, about = "Read, translate and speak photographed Kannada documents", long_about = None)]
struct Cli {
    /// Settings file (default: <data dir>/chitravachaka/config.json)
    #[arg(long, env = "CHITRAVACHAKA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Path to the tesseract executable
    #[arg(long, env = "TESSERACT_CMD", global = true)]
    tesseract_cmd: Option<PathBuf>,

    /// Directory holding the tesseract language data
    #[arg(long, env = "TESSDATA_PREFIX", global = true)]
    tessdata_dir: Option<PathBuf>,

    /// Root of the static tree for uploads and audio
    #[arg(long, env = "CHITRAVACHAKA_STATIC_DIR", global = true)]
    static_dir: Option<PathBuf>,

    /// Run recognition attempts in parallel
    #[arg(long, global = true)]
    parallel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read, translate and speak an image; prints the JSON result
    Process {
        /// Image file
        image: PathBuf,

        /// Override the MIME type guessed from the file extension
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Print only the recognised Kannada text
    Ocr {
        /// Image file
        image: PathBuf,
    },

    /// Locate tesseract, derive the wordlist and save the settings file
    Bootstrap,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            error!(error = %err, status = human.status, "command failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(data_dir::config_path);
    let config = effective_config(&cli, data_dir::load_config(&config_path));
    info!(config = %config_path.display(), "Chitravachaka starting");

    match cli.command {
        Commands::Process {
            image,
            content_type,
        } => {
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&image));
            let body = tokio::fs::read(&image).await?;
            let service = ProcessingService::init(&config)?;
            let response = service.process_upload(&content_type, body).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Ocr { image } => {
            let reader = DocumentReader::from_settings(&config.ocr)?;
            let text = tokio::task::spawn_blocking(move || reader.extract_text(image))
                .await
                .map_err(|err| {
                    ChitraError::Recognition(format!("recognition task failed: {}", err))
                })??;
            println!("{text}");
        }
        Commands::Bootstrap => {
            let setup = chitravachaka_document::bootstrap(&config.ocr)?;
            data_dir::persist_config(&config_path, &config)?;
            let report = serde_json::json!({
                "tesseract": setup.tesseract,
                "wordlist": setup.wordlist,
                "config": config_path,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Apply command-line and environment overrides on top of the settings file.
fn effective_config(cli: &Cli, mut config: AppConfig) -> AppConfig {
    if let Some(cmd) = &cli.tesseract_cmd {
        config.ocr.tesseract_cmd = Some(cmd.clone());
    }
    if let Some(dir) = &cli.tessdata_dir {
        config.ocr.tessdata_dir = Some(dir.clone());
    }
    if let Some(dir) = &cli.static_dir {
        config.static_dir = dir.clone();
    }
    if cli.parallel {
        config.ocr.parallel_sweep = true;
    }
    config
}

/// MIME type from the file extension; non-images map to a generic type and
/// are rejected by upload validation.
fn guess_content_type(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_file_settings() {
        let cli = Cli::parse_from([
            "chitravachaka",
            "--tesseract-cmd",
            "/opt/tess/bin/tesseract",
            "--static-dir",
            "/srv/static",
            "--parallel",
            "ocr",
            "page.jpg",
        ]);
        let config = effective_config(&cli, AppConfig::default());
        assert_eq!(
            config.ocr.tesseract_cmd.as_deref(),
            Some(Path::new("/opt/tess/bin/tesseract"))
        );
        assert_eq!(config.static_dir, PathBuf::from("/srv/static"));
        assert!(config.ocr.parallel_sweep);
        assert_eq!(config.ocr.language, "kan");
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(guess_content_type(Path::new("scan.JPG")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("scan.png")), "image/png");
        assert_eq!(
            guess_content_type(Path::new("notes.txt")),
            "application/octet-stream"
        );
    }
}
