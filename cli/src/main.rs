//! typeshift - compiler-assisted TypeScript refactoring.
//!
//! The binary wires one [`ServerSession`] to the operation layer: parse
//! flags, load config, start the server in the project root, run a single
//! operation, render its outcome, stop the server. Logs go to a file
//! under `~/.typeshift/logs/` so stdout carries only the result (plain
//! text, or JSON with `--json`).

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use typeshift_ops::{
    ExtractKind, ExtractRequest, RenameRequest, extract, find_references, move_file,
    organize_imports, rename,
};
use typeshift_tsserver::{ServerSession, SessionConfig};
use typeshift_types::{Position, RefactorOutcome};

#[derive(Parser)]
#[command(name = "typeshift")]
#[command(about = "Compiler-assisted TypeScript refactoring", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root the compiler server indexes
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Config file (default: ~/.typeshift/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Compiler server executable, overriding the config file
    #[arg(long, global = true)]
    tsserver: Option<String>,

    /// Compute and report edits without writing anything
    #[arg(long, global = true)]
    preview: bool,

    /// Emit the outcome as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename a symbol everywhere the compiler can see it
    Rename(RenameArgs),

    /// Extract a span into a new function or constant
    Extract(ExtractArgs),

    /// Move a file, updating every import that referenced it
    #[command(name = "move")]
    MoveFile(MoveArgs),

    /// Sort, merge, and prune a file's imports
    Organize(OrganizeArgs),

    /// List every reference to a symbol
    References(ReferencesArgs),
}

#[derive(Args)]
struct RenameArgs {
    /// File declaring or using the symbol
    #[arg(long)]
    file: PathBuf,

    /// Symbol to rename
    #[arg(long)]
    symbol: String,

    /// Replacement name
    #[arg(long = "to")]
    new_name: String,

    /// Exact position (LINE:COL) when the first occurrence is not the target
    #[arg(long, value_parser = parse_position)]
    at: Option<Position>,
}

#[derive(Args)]
struct ExtractArgs {
    #[arg(long)]
    file: PathBuf,

    /// Span start, LINE:COL (1-indexed)
    #[arg(long, value_parser = parse_position)]
    start: Position,

    /// Span end, LINE:COL (half-open)
    #[arg(long, value_parser = parse_position)]
    end: Position,

    #[arg(long, value_enum, default_value_t = KindArg::Function)]
    kind: KindArg,

    /// Name for the extracted declaration (default: the server's placeholder)
    #[arg(long)]
    name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Function,
    Constant,
}

impl From<KindArg> for ExtractKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Function => ExtractKind::Function,
            KindArg::Constant => ExtractKind::Constant,
        }
    }
}

#[derive(Args)]
struct MoveArgs {
    from: PathBuf,
    to: PathBuf,
}

#[derive(Args)]
struct OrganizeArgs {
    file: PathBuf,
}

#[derive(Args)]
struct ReferencesArgs {
    #[arg(long)]
    file: PathBuf,

    #[arg(long)]
    symbol: String,

    /// Exact position (LINE:COL) when the first occurrence is not the target
    #[arg(long, value_parser = parse_position)]
    at: Option<Position>,
}

fn parse_position(value: &str) -> Result<Position, String> {
    let Some((line, offset)) = value.split_once(':') else {
        return Err(format!("expected LINE:COL, got '{value}'"));
    };
    let line: u32 = line.parse().map_err(|_| format!("invalid line '{line}'"))?;
    let offset: u32 = offset
        .parse()
        .map_err(|_| format!("invalid column '{offset}'"))?;
    if line == 0 || offset == 0 {
        return Err("positions are 1-indexed".to_string());
    }
    Ok(Position::new(line, offset))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("typeshift: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(command) = &cli.tsserver {
        config.command.clone_from(command);
    }
    let mut session = ServerSession::new(config);
    session.start(&cli.project).await?;

    let outcome = dispatch(&session, &cli).await;

    session.stop().await;
    render(&outcome, cli.json)?;
    Ok(outcome.success)
}

async fn dispatch(session: &ServerSession, cli: &Cli) -> RefactorOutcome {
    match &cli.command {
        Commands::Rename(args) => {
            rename(
                session,
                RenameRequest {
                    file: &args.file,
                    symbol: &args.symbol,
                    position: args.at,
                    new_name: &args.new_name,
                    preview: cli.preview,
                },
            )
            .await
        }
        Commands::Extract(args) => {
            extract(
                session,
                ExtractRequest {
                    file: &args.file,
                    start: args.start,
                    end: args.end,
                    kind: args.kind.into(),
                    new_name: args.name.as_deref(),
                    preview: cli.preview,
                },
            )
            .await
        }
        Commands::MoveFile(args) => move_file(session, &args.from, &args.to, cli.preview).await,
        Commands::Organize(args) => organize_imports(session, &args.file, cli.preview).await,
        Commands::References(args) => {
            find_references(session, &args.file, &args.symbol, args.at).await
        }
    }
}

fn render(outcome: &RefactorOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!("{}", outcome.message);
    for action in &outcome.next_actions {
        println!("next: {action}");
    }
    if let Some(preview) = &outcome.preview {
        println!();
        println!(
            "Preview only: {} file(s) would change ({}). Apply with:",
            preview.files_affected, preview.estimated_time
        );
        println!("  {}", preview.command);
    }
    Ok(())
}

/// Load the session config, tolerating a missing default file but not a
/// missing explicitly-requested one.
fn load_config(explicit: Option<&Path>) -> Result<SessionConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match typeshift_dir() {
            Some(dir) => dir.join("config.toml"),
            None => return Ok(SessionConfig::default()),
        },
    };

    if !path.exists() {
        if explicit.is_some() {
            bail!("config file {} does not exist", path.display());
        }
        return Ok(SessionConfig::default());
    }

    let text =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn typeshift_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".typeshift"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

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

    // No usable log file: prefer "no logs" over mixing log lines into the
    // result output on stdout.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let candidates = log_file_candidates();
    let mut warnings = Vec::new();

    for candidate in candidates {
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
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.typeshift/logs/typeshift.log
    if let Some(dir) = typeshift_dir() {
        candidates.push(dir.join("logs").join("typeshift.log"));
    }

    // Fallback: ./.typeshift/logs/typeshift.log (useful in constrained environments)
    candidates.push(PathBuf::from(".typeshift").join("logs").join("typeshift.log"));

    candidates
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("3:14").unwrap(), Position::new(3, 14));
        assert!(parse_position("3").is_err());
        assert!(parse_position("0:1").is_err());
        assert!(parse_position("a:b").is_err());
    }

    #[test]
    fn test_parse_extract_command() {
        let cli = Cli::parse_from([
            "typeshift", "extract", "--file", "src/a.ts", "--start", "2:14", "--end", "2:21",
            "--kind", "constant", "--name", "PI", "--preview",
        ]);
        assert!(cli.preview);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.start, Position::new(2, 14));
                assert_eq!(args.kind, KindArg::Constant);
                assert_eq!(args.name.as_deref(), Some("PI"));
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_load_config_missing_explicit_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_config_parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "command = \"node\"\nproject_load_timeout_ms = 10000\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.command, "node");
        assert_eq!(config.project_load_timeout_ms, 10_000);
        assert_eq!(config.discovery_timeout_ms, 5_000);
    }
}
