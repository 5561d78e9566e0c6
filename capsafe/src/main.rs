#![forbid(unsafe_code)]

mod config;
mod model_file;
mod report;

use std::path::{Path, PathBuf};
use std::time::Instant;

use capsafe_core::{Verifier, lattice};
use capsafe_model::MarkerTrait;
use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::load_config;
use crate::model_file::load_model;
use crate::report::{CheckReport, render_human};

#[derive(Parser, Debug)]
#[command(name = "capsafe", version, about = "Capability-safety verifier for resolved program models")]
struct Cli {
    /// Use this config file instead of searching for `capsafe.toml`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Verify every compilation unit of a JSON program model
    Check {
        /// Program model produced by a front end
        model: PathBuf,

        /// Output format: `human` (diagnostics on stderr) or `json` (report on stdout)
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,

        /// Worker threads for per-unit verification (default: all cores)
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Show the marker lattice, honorary grants and policy in effect
    Markers {
        /// Directory to start the config search from
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

fn setup_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "warn,capsafe=debug,capsafe_core=debug",
            _ => "warn,capsafe=trace,capsafe_core=trace",
        })
    });

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.cmd {
        Cmd::Check {
            model,
            format,
            jobs,
        } => check(&model, cli.config.as_deref(), format, jobs),
        Cmd::Markers { dir } => markers(&dir, cli.config.as_deref()),
    }
}

fn search_start(path: &Path) -> PathBuf {
    let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if abs.is_file() {
        abs.parent().map(Path::to_path_buf).unwrap_or(abs)
    } else {
        abs
    }
}

fn check(model_path: &Path, config: Option<&Path>, format: Format, jobs: Option<usize>) -> miette::Result<()> {
    let started = Instant::now();
    let resolved = load_config(config, &search_start(model_path))?;
    let loaded = load_model(model_path)?;
    let program = loaded.program;
    tracing::info!(
        types = program.types().len(),
        units = program.units().len(),
        "loaded model"
    );

    let verifier = Verifier::new(resolved.registry);
    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(n) = jobs {
        pool = pool.num_threads(n.max(1));
    }
    let pool = pool.build().into_diagnostic()?;
    let results = pool.install(|| verifier.verify_program(&program));

    let report = CheckReport::new(
        model_path,
        resolved.config_path.as_deref(),
        program.units(),
        &loaded.sources,
        &results,
    );
    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            println!("{json}");
        }
        Format::Human => render_human(program.units(), &loaded.sources, &results),
    }
    tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "check finished");

    if report.ok {
        if format == Format::Human {
            eprintln!("ok: {} unit(s) verified", program.units().len());
        }
        Ok(())
    } else {
        Err(miette::miette!("{} problem(s) found", report.total))
    }
}

fn markers(dir: &Path, config: Option<&Path>) -> miette::Result<()> {
    let resolved = load_config(config, &search_start(dir))?;
    let registry = &resolved.registry;
    let policy = registry.policy();

    match &resolved.config_path {
        Some(p) => println!("config: {}", p.display()),
        None => println!("config: (defaults)"),
    }

    println!("\ntraits:");
    for t in MarkerTrait::ALL {
        let implied = lattice::implied_by(t);
        let mut line = format!("  {t}");
        if !implied.is_empty() {
            line.push_str(&format!(" => {implied}"));
        }
        println!("{line}");
    }

    println!("\nhonorary:");
    for (name, traits) in registry.honoraries().iter() {
        println!("  {name}: {traits}");
    }

    println!("\npolicy:");
    println!("  identity_root = {}", policy.identity_root);
    println!("  enum_base = {}", policy.enum_base);
    println!("  reserved_namespace = {}", policy.reserved_namespace);
    match policy.static_field_trait {
        Some(t) => println!("  static_field_trait = {t}"),
        None => println!("  static_field_trait = (off)"),
    }
    Ok(())
}
