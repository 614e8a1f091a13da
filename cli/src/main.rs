//! CNC CLI, the command-line entry point for the cluster network configurator.
//!
//! # Usage
//!
//! ```text
//! cnc
//! cnc --dry-run
//! cnc --log-level debug --api-url http://vlan-manager:8000/api
//! cnc --config cnc.yaml --sites-dir ./sites
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cluster_netcfg_core::allocator::http::HttpAllocator;
use cluster_netcfg_core::data::settings::{self, Settings};
use cluster_netcfg_core::data::scan_clusters;
use cluster_netcfg_core::report::render_summary;
use cluster_netcfg_core::store::fs::FsStore;
use cluster_netcfg_core::{ReconcileError, Reconciler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Reconcile cluster network configuration with the VLAN allocator.
#[derive(Parser, Debug)]
#[command(name = "cnc")]
#[command(version, about, long_about = None)]
struct Args {
    /// Decide and report without writing any artifact
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Log verbosity (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// VLAN allocator base URL
    #[arg(long, env = "CNC_API_URL")]
    api_url: Option<String>,

    /// Root of the sites tree
    #[arg(long)]
    sites_dir: Option<PathBuf>,

    /// YAML settings file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_level);

    match run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("cnc: {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn resolve_settings(args: &Args) -> Result<Settings, ReconcileError> {
    let mut s = match &args.config {
        Some(path) => settings::load(path)?,
        None => Settings::default(),
    };
    s = s.with_api_url_override(args.api_url.clone());
    if let Some(dir) = &args.sites_dir {
        s.sites_dir = dir.clone();
    }
    Ok(s)
}

fn run(args: Args) -> Result<i32, ReconcileError> {
    let settings = resolve_settings(&args)?;
    if args.dry_run {
        info!("running in dry-run mode");
    }

    info!(sites_dir = %settings.sites_dir.display(), "scanning for clusters");
    let clusters = scan_clusters(&settings.sites_dir, &settings.skip_mces)?;
    if clusters.is_empty() {
        warn!("no clusters found");
    } else {
        info!(count = clusters.len(), "found clusters");
    }

    let allocator = HttpAllocator::new(&settings)?;
    let mut store = FsStore::new();
    let report = Reconciler::new(settings.vrf.clone())
        .with_dry_run(args.dry_run)
        .run(&clusters, &allocator, &mut store);

    println!("{}", render_summary(&report));
    Ok(report.exit_code())
}
