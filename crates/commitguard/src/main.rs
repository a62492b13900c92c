use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, error, info};

use commitguard_checks::builtin_registry;
use commitguard_core::{CheckRegistry, Git, RunPlan, Selection, list_checks, run_session};
use commitguard_types::{
    ConfigFile, DEFAULT_COMMIT_RANGE, DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT,
};

mod config;
mod console;

use config::{expand_env_vars, load_config_with_includes};
use console::ConsoleObserver;

#[derive(Parser, Debug)]
#[command(name = "commitguard")]
#[command(about = "Run compliance checks over a git commit range", long_about = None)]
struct Cli {
    /// Log level for stderr diagnostics. Falls back to RUST_LOG, then
    /// LOG_LEVEL, then warn.
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the selected checks and write a JUnit report.
    Check(Box<CheckArgs>),

    /// Print the names of all discoverable checks without running them.
    List(ListArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Commit range to check (defaults to config, else HEAD~1..HEAD).
    #[arg(short = 'c', long = "commits")]
    commits: Option<String>,

    /// JUnit XML output file (defaults to config, else compliance.xml).
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Do not write a JUnit report at all.
    #[arg(long, conflicts_with = "output")]
    no_report: bool,

    /// Do not write <Name>.txt files for failing checks.
    #[arg(short = 'n', long)]
    no_case_output: bool,

    /// Directory for per-check <Name>.txt files (defaults to the current directory).
    #[arg(long, conflicts_with = "no_case_output")]
    case_output_dir: Option<PathBuf>,

    /// Run only this check (case-insensitive, repeatable).
    #[arg(short = 'm', long = "module", action = clap::ArgAction::Append)]
    module: Vec<String>,

    /// Do not run this check (case-insensitive, repeatable).
    #[arg(short = 'e', long = "exclude-module", action = clap::ArgAction::Append)]
    exclude_module: Vec<String>,

    /// Merge results into a JUnit report from an earlier run.
    #[arg(short = 'j', long)]
    previous_run: Option<PathBuf>,

    /// Print GitHub Actions annotations for addressed failures.
    #[arg(long)]
    annotate: bool,

    /// Path to a config file. If omitted, uses ./commitguard.toml if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Any directory inside the repository to check.
    #[arg(long, default_value = ".")]
    repo: PathBuf,
}

#[derive(Parser, Debug)]
struct ListArgs {
    #[arg(long, value_enum, default_value_t = ListFormat::Text)]
    format: ListFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ListFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Serialize)]
struct ListedCheck {
    name: &'static str,
    path_hint: &'static str,
}

#[cfg(not(test))]
fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(exit_code(code)),
        Err(err) => {
            error!("internal error: {err:#}");
            eprintln!("error: {err:#}");
            std::process::ExitCode::from(1)
        }
    }
}

/// Failing-check counts above 255 cannot be expressed as a process status.
fn exit_code(failed: usize) -> u8 {
    u8::try_from(failed).unwrap_or(u8::MAX)
}

fn run_with_args<I, T>(args: I) -> Result<usize>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.log_level);

    let registry = builtin_registry();
    match cli.command {
        Commands::Check(args) => cmd_check(*args, &registry),
        Commands::List(args) => {
            cmd_list(args, &registry)?;
            Ok(0)
        }
    }
}

/// Initialize tracing on stderr: `--log-level`, else `RUST_LOG`, else
/// `LOG_LEVEL`, else warn.
fn init_logging(level: Option<LogLevel>) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = match level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
            .unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized");
}

fn cmd_list(args: ListArgs, registry: &CheckRegistry) -> Result<()> {
    match args.format {
        ListFormat::Text => {
            list_checks(registry, &mut std::io::stdout().lock()).context("write check list")?;
        }
        ListFormat::Json => {
            let listed: Vec<ListedCheck> = registry
                .discover()
                .iter()
                .map(|c| ListedCheck {
                    name: c.name,
                    path_hint: c.path_hint.as_str(),
                })
                .collect();
            let s = serde_json::to_string_pretty(&listed).context("render json")?;
            println!("{s}");
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, registry: &CheckRegistry) -> Result<usize> {
    let cfg = load_config(args.config.as_deref())?;
    let repo_root = Git::discover(&args.repo)
        .with_context(|| format!("locate git repository from '{}'", args.repo.display()))?;
    let annotate = args.annotate || cfg.defaults.annotate.unwrap_or(false);
    let plan = build_plan(args, cfg, repo_root);
    debug!("run plan: {plan:?}");

    let summary = run_session(&plan, registry, &mut ConsoleObserver::new(annotate))?;

    let n_fails = summary.exit_status();
    if n_fails > 0 {
        println!("{n_fails} checks failed");
    }
    if let Some(output) = &plan.output {
        println!("\nComplete results in {}", output.display());
    }
    Ok(n_fails)
}

/// Combines flags, config and built-in defaults, in that order of precedence.
fn build_plan(args: CheckArgs, cfg: ConfigFile, repo_root: PathBuf) -> RunPlan {
    let defaults = cfg.defaults;

    let output = if args.no_report {
        None
    } else {
        Some(
            args.output
                .or_else(|| defaults.output.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        )
    };

    let no_case_output = args.no_case_output || defaults.no_case_output.unwrap_or(false);
    let case_output_dir = if no_case_output {
        None
    } else {
        Some(
            args.case_output_dir
                .or_else(|| defaults.case_output_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(".")),
        )
    };

    let include = if args.module.is_empty() {
        cfg.checks.include
    } else {
        args.module
    };
    let exclude = if args.exclude_module.is_empty() {
        cfg.checks.exclude
    } else {
        args.exclude_module
    };

    RunPlan {
        repo_root,
        commit_range: args
            .commits
            .or(defaults.commits)
            .unwrap_or_else(|| DEFAULT_COMMIT_RANGE.to_string()),
        selection: Selection::new(include, exclude),
        previous_run: args.previous_run,
        output,
        case_output_dir,
    }
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
    let user_path = path.map(Path::to_path_buf).or_else(|| {
        let p = PathBuf::from(DEFAULT_CONFIG_FILE);
        if p.exists() { Some(p) } else { None }
    });

    let Some(path) = user_path else {
        debug!("No config file found, using built-in defaults");
        return Ok(ConfigFile::default());
    };

    info!("Loading config from: {}", path.display());
    load_config_with_includes(&path, expand_env_vars)
}
