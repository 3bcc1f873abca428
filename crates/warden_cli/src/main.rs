//! Warden CLI: incremental build cache validation from the command line.
//!
//! Provides `warden check` to decide whether a previous build can be reused,
//! `warden store` to put a freshly built binary into the cache, and
//! `warden clear-cache` to delete the cache.

#![warn(missing_docs)]

mod check;
mod clear;
mod pipeline;
mod store;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Warden: reuse compiler output when nothing changed.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Incremental build cache validator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `warden.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the cache for a build and restore the cached binary on a hit.
    Check(CheckArgs),
    /// Copy a freshly built binary into the cache.
    Store(StoreArgs),
    /// Delete `./.odin-cache`.
    ClearCache,
}

/// Inputs shared by `check` and `store`.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Path of the build output (the executable).
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory to search recursively for source files.
    #[arg(long)]
    pub src: Vec<PathBuf>,

    /// Individual source file.
    #[arg(long)]
    pub file: Vec<PathBuf>,

    /// File loaded by the front end on the side; ignored if it does not exist.
    #[arg(long)]
    pub loaded: Vec<PathBuf>,

    /// Target name used for the cached binary (overrides `warden.toml`).
    #[arg(short, long)]
    pub target: Option<String>,

    /// Subtarget name used for the cached binary (overrides `warden.toml`).
    #[arg(long)]
    pub subtarget: Option<String>,

    /// Compiler arguments the build is keyed on.
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Arguments for the `warden check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Build inputs.
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Output format for the decision.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `warden store` subcommand.
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Build inputs.
    #[command(flatten)]
    pub inputs: InputArgs,
}

/// Decision output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Check(ref args) => check::run(args, &global),
        Command::Store(ref args) => store::run(args, &global),
        Command::ClearCache => clear::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the flag-derived level.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(global)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn default_log_level(global: &GlobalArgs) -> &'static str {
    if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn inputs(cli: &Cli) -> &InputArgs {
        match &cli.command {
            Command::Check(args) => &args.inputs,
            Command::Store(args) => &args.inputs,
            Command::ClearCache => panic!("expected a command with inputs"),
        }
    }

    #[test]
    fn parse_check_minimal() {
        let cli = Cli::parse_from(["warden", "check", "--output", "bin/app"]);
        match cli.command {
            Command::Check(ref args) => {
                assert_eq!(args.inputs.output, PathBuf::from("bin/app"));
                assert!(args.inputs.src.is_empty());
                assert!(args.inputs.file.is_empty());
                assert!(args.inputs.loaded.is_empty());
                assert!(args.inputs.target.is_none());
                assert!(args.inputs.args.is_empty());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_check_requires_output() {
        assert!(Cli::try_parse_from(["warden", "check"]).is_err());
    }

    #[test]
    fn parse_check_with_inputs() {
        let cli = Cli::parse_from([
            "warden",
            "check",
            "-o",
            "app",
            "--src",
            "src",
            "--src",
            "vendor",
            "--file",
            "main.odin",
            "--loaded",
            "shader.glsl",
            "--target",
            "linux_amd64",
            "--subtarget",
            "android",
            "--format",
            "json",
        ]);
        let args = inputs(&cli);
        assert_eq!(args.src, vec![PathBuf::from("src"), PathBuf::from("vendor")]);
        assert_eq!(args.file, vec![PathBuf::from("main.odin")]);
        assert_eq!(args.loaded, vec![PathBuf::from("shader.glsl")]);
        assert_eq!(args.target.as_deref(), Some("linux_amd64"));
        assert_eq!(args.subtarget.as_deref(), Some("android"));
        match cli.command {
            Command::Check(ref args) => assert_eq!(args.format, ReportFormat::Json),
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_trailing_compiler_arguments() {
        let cli = Cli::parse_from([
            "warden", "check", "-o", "app", "--", "build", ".", "-o:speed",
        ]);
        assert_eq!(inputs(&cli).args, vec!["build", ".", "-o:speed"]);
    }

    #[test]
    fn parse_store() {
        let cli = Cli::parse_from(["warden", "store", "-o", "app", "--file", "a.odin"]);
        assert!(matches!(cli.command, Command::Store(_)));
        assert_eq!(inputs(&cli).file, vec![PathBuf::from("a.odin")]);
    }

    #[test]
    fn parse_clear_cache() {
        let cli = Cli::parse_from(["warden", "clear-cache"]);
        assert!(matches!(cli.command, Command::ClearCache));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["warden", "--quiet", "clear-cache"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["warden", "check", "-o", "app", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["warden", "--config", "/path/to/warden.toml", "clear-cache"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/warden.toml"));
    }

    #[test]
    fn log_level_follows_flags() {
        let mut global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: None,
        };
        assert_eq!(default_log_level(&global), "warn");
        global.quiet = true;
        assert_eq!(default_log_level(&global), "error");
        global.verbose = true;
        assert_eq!(default_log_level(&global), "debug");
    }
}
