//! fu-ls binary entry point.
//!
//! ```text
//! fu-ls [--config PATH] [serve]      LSP over stdin/stdout
//! fu-ls [--config PATH] check FILE.. print diagnostics, exit 1 if any
//! ```
//!
//! stdout carries the protocol in `serve` mode, so logs go to a file (or
//! stderr when no log file can be opened).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fu_config::FuConfig;
use fu_frontend::{CommandFrontEnd, FrontEnd};
use fu_lsp::{DiagnosticsBridge, DiagnosticsConfig, LanguageServer};
use fu_types::{DocumentId, TextDocument};

#[derive(Parser)]
#[command(name = "fu-ls", version)]
#[command(about = "Parse fu sources with an external front-end and report diagnostics")]
struct Cli {
    /// Config file (default: $FU_LS_CONFIG or ~/.fu/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the language server on stdin/stdout (default)
    Serve,
    /// Check files on disk and print their diagnostics (exit 1 if any)
    Check {
        /// Source files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.config.as_deref());

    let config = load_config(cli.config.as_deref())?;
    let diagnostics = config.diagnostics();
    let front_end = build_front_end(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let mut server = LanguageServer::new(front_end, &diagnostics);
            let exit = server
                .serve(tokio::io::stdin(), tokio::io::stdout())
                .await
                .context("Language server session failed")?;
            tracing::info!(?exit, "Language server stopped");
            Ok(ExitCode::from(exit.exit_code()))
        }
        Commands::Check { files } => {
            let mut stdout = io::stdout().lock();
            let count = check_files(front_end, &diagnostics, &files, &mut stdout)?;
            Ok(if count == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<FuConfig> {
    let loaded = match explicit {
        Some(path) => match FuConfig::load_from(path)? {
            Some(config) => Some(config),
            None => bail!("Config file not found: {}", path.display()),
        },
        None => FuConfig::load()?,
    };
    if loaded.is_none() {
        tracing::info!("No config file found; using defaults");
    }
    Ok(loaded.unwrap_or_default())
}

fn build_front_end(config: &FuConfig) -> Result<CommandFrontEnd> {
    let Some(frontend) = config.frontend.as_ref() else {
        bail!(
            "No front-end configured. Add a [frontend] section with `command` to {}",
            config_location().display()
        );
    };
    let front_end = CommandFrontEnd::new(frontend)?;
    Ok(front_end)
}

fn config_location() -> PathBuf {
    fu_config::config_path().unwrap_or_else(|| PathBuf::from("~/.fu/config.toml"))
}

/// Parse each file and write `path:line:col: error: message` lines to `out`.
/// Returns the number of diagnostics across the checked files.
fn check_files<F: FrontEnd>(
    front_end: F,
    config: &DiagnosticsConfig,
    files: &[PathBuf],
    out: &mut impl Write,
) -> Result<usize> {
    let mut bridge = DiagnosticsBridge::new(front_end, config.language_id.clone());

    for path in files {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let Some(language) = config.language_for_extension(extension) else {
            tracing::warn!(path = %path.display(), "Skipping file with unrecognized extension");
            continue;
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let absolute = std::path::absolute(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let id = DocumentId::from_path(&absolute)?;
        let document = TextDocument::new(id, language, text);

        bridge.refresh(&document);
        for diagnostic in bridge.diagnostics_for(document.id()) {
            writeln!(out, "{}", diagnostic.display_with_path(path))?;
        }
    }

    let snapshot = bridge.snapshot();
    let total = snapshot.total_count();
    tracing::info!(
        files = files.len(),
        failing = snapshot.files().len(),
        total,
        "Check finished"
    );
    Ok(total)
}

fn init_tracing(explicit_config: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file(explicit_config);

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file(explicit_config: Option<&Path>) -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates(explicit_config) {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => warnings.push(format!(
                "Failed to open log file {}: {e}",
                candidate.display()
            )),
        }
    }

    (None, warnings)
}

fn log_file_candidates(explicit_config: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: logs/ next to the config file, normally ~/.fu/logs/fu-ls.log
    let config_path = explicit_config
        .map(Path::to_path_buf)
        .or_else(fu_config::config_path);
    if let Some(config_dir) = config_path.as_deref().and_then(Path::parent)
        && !config_dir.as_os_str().is_empty()
    {
        candidates.push(config_dir.join("logs").join("fu-ls.log"));
    }

    // Fallback: ./.fu/logs/fu-ls.log
    candidates.push(PathBuf::from(".fu").join("logs").join("fu-ls.log"));

    candidates
}
