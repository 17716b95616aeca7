//! zenshrink CLI - lossless PNG shrinking over a directory tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use zenshrink::{Effort, ErrorPolicy, OptimizeConfig, Registry, Walker};

/// Re-encode every PNG under a directory in its smallest lossless form.
///
/// Files are only replaced when the new encoding is strictly smaller.
#[derive(Parser, Debug)]
#[command(name = "zenshrink")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base directory to scan and optimize (may be relative)
    #[arg(short = 'D', long, value_name = "ROOT_DIR", default_value = ".")]
    dir: PathBuf,

    /// Encoder compression effort
    #[arg(long, value_enum, default_value = "max")]
    effort: EffortArg,

    /// Skip files that fail instead of stopping the run
    #[arg(long)]
    keep_going: bool,

    /// Show per-variant sizes
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EffortArg {
    /// Fastest encoding
    Fast,
    /// Default zlib level
    Balanced,
    /// Best compression (slowest)
    Max,
}

impl From<EffortArg> for Effort {
    fn from(arg: EffortArg) -> Self {
        match arg {
            EffortArg::Fast => Effort::Fast,
            EffortArg::Balanced => Effort::Balanced,
            EffortArg::Max => Effort::Max,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let root = std::path::absolute(&args.dir)
        .with_context(|| format!("cannot resolve {}", args.dir.display()))?;
    anyhow::ensure!(root.is_dir(), "{} is not a directory", root.display());

    let registry = Registry::with_defaults(OptimizeConfig::new().effort(args.effort.into()));
    let policy = if args.keep_going {
        ErrorPolicy::KeepGoing
    } else {
        ErrorPolicy::FailFast
    };

    let report = Walker::new(&root, &registry)
        .policy(policy)
        .run()
        .context("optimization run failed")?;

    println!(
        "Totally optimized files: {}, totally saved bytes: {}",
        report.files_modified(),
        report.bytes_saved()
    );
    if !report.failures.is_empty() {
        eprintln!("{} files failed:", report.failures.len());
        for err in &report.failures {
            eprintln!("  {err}");
        }
    }

    Ok(())
}
