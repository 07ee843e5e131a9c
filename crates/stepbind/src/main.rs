//! Command-line front end for stepbind.
//!
//! Reports which BDD frameworks a workspace uses, lists the step bindings it
//! declares, and resolves the steps of a feature file against them. Reports
//! go to stdout; logs go to stderr.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use stepbind::binding::Binding;
use stepbind::config::{LogLevel, StepbindConfig};
use stepbind::context::BindingContext;
use stepbind::error::StepbindError;
use stepbind::feature::load_feature_file;
use stepbind::logging::init_logging;
use stepbind::resolver::{ResolutionResult, StepResolution};

/// Cross-reference BDD step definitions and feature files.
#[derive(Parser, Debug)]
#[command(name = "stepbind", version, about)]
struct Args {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Minimum detection confidence, in [0, 1], for a provider to be active.
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Match steps case-insensitively.
    #[arg(long, global = true)]
    case_insensitive: bool,

    /// Log skipped files and dropped step definitions.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report which frameworks the workspace uses.
    Detect {
        /// Workspace roots (defaults to the current directory).
        roots: Vec<PathBuf>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the bindings of every active provider.
    Bindings {
        /// Workspace roots (defaults to the current directory).
        roots: Vec<PathBuf>,
        /// Print the bindings as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Resolve every step of a feature file.
    Resolve {
        /// Feature file to resolve.
        #[arg(long)]
        feature: PathBuf,
        /// Workspace roots (defaults to the current directory).
        roots: Vec<PathBuf>,
    },
}

fn main() {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            let fallback = StepbindConfig::default();
            init_logging(&fallback);
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "starting stepbind");

    if let Err(e) = run(config, args.command) {
        tracing::error!(error = %e, "stepbind failed");
        std::process::exit(1);
    }
}

fn build_config(args: &Args) -> Result<StepbindConfig, StepbindError> {
    StepbindConfig::from_env()?.apply_overrides(
        args.log_level,
        args.threshold,
        args.case_insensitive,
        args.debug,
    )
}

fn roots_or_cwd(roots: Vec<PathBuf>) -> io::Result<Vec<PathBuf>> {
    if roots.is_empty() {
        Ok(vec![std::env::current_dir()?])
    } else {
        Ok(roots)
    }
}

fn run(config: StepbindConfig, command: Command) -> Result<(), StepbindError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run_async(config, command))
}

async fn run_async(config: StepbindConfig, command: Command) -> Result<(), StepbindError> {
    let context = BindingContext::with_default_providers(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Detect { roots, json } => {
            let selection = context.refresh(&roots_or_cwd(roots)?).await;
            if json {
                serde_json::to_writer_pretty(&mut out, &*selection).map_err(io::Error::from)?;
                writeln!(out)?;
            } else {
                write!(out, "{selection}")?;
            }
        }
        Command::Bindings { roots, json } => {
            context.refresh(&roots_or_cwd(roots)?).await;
            let bindings = context.bindings();
            if json {
                let plain: Vec<&Binding> = bindings.iter().map(|binding| &**binding).collect();
                serde_json::to_writer_pretty(&mut out, &plain).map_err(io::Error::from)?;
                writeln!(out)?;
            } else {
                for binding in &bindings {
                    write_binding(&mut out, binding)?;
                }
            }
        }
        Command::Resolve { feature, roots } => {
            let model = load_feature_file(&feature)?;
            context.refresh(&roots_or_cwd(roots)?).await;
            for resolution in context.resolve_model(&model) {
                write_resolution(&mut out, &model.path, &resolution)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn write_binding(out: &mut impl Write, binding: &Binding) -> io::Result<()> {
    writeln!(
        out,
        "{}  {} {}  ({}, {})",
        binding.location,
        binding.keyword,
        binding.pattern_raw,
        binding.declaring_symbol,
        binding.provider
    )
}

fn write_resolution(
    out: &mut impl Write,
    feature: &Path,
    resolution: &StepResolution,
) -> io::Result<()> {
    let step = &resolution.step;
    writeln!(
        out,
        "{}:{}  [{}] {}",
        feature.display(),
        step.line.saturating_add(1),
        resolution.result.label(),
        step.full_text
    )?;
    match &resolution.result {
        ResolutionResult::Unmatched => Ok(()),
        ResolutionResult::Unique(binding) => {
            writeln!(out, "    -> {} {}", binding.location, binding.declaring_symbol)
        }
        ResolutionResult::Ambiguous(bindings) => {
            for binding in bindings {
                writeln!(out, "    ?? {} {}", binding.location, binding.declaring_symbol)?;
            }
            Ok(())
        }
    }
}
