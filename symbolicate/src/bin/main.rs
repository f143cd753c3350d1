//! Command-line demonstrator for the symbolication pipeline: reads a JSON crash report from a
//! file (or stdin) and prints the resolved frames as JSON.
//!
//! This binary is a thin wrapper around [`symbolic_crash::report`] — a consumer, not part of the
//! library surface.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use symbolic_crash::image_index::BinaryImage;
use symbolic_crash::report::{Frame, ReportSymbolicator, SymbolicateOptions};

#[derive(Parser)]
#[command(
    name = "symbolic-crash",
    about = "Symbolicate a native stack trace against on-disk dSYM bundles"
)]
struct Opt {
    /// Directory or `.app.dSYM` bundle to search for debug files. May be repeated.
    #[arg(short = 'd', long = "dsym-path", required = true)]
    dsym_paths: Vec<PathBuf>,

    /// Path to a JSON report `{binary_images: [...], frames: [...]}`. Reads stdin if omitted.
    report: Option<PathBuf>,

    /// Resolve the full inline chain for each frame instead of just the innermost one.
    #[arg(long)]
    inlined: bool,

    /// Leave mangled symbol names as-is instead of demangling them.
    #[arg(long)]
    no_demangle: bool,

    /// Propagate resolution errors instead of leaving the offending frame unsymbolicated.
    #[arg(long)]
    strict: bool,
}

#[derive(serde::Deserialize)]
struct Report {
    binary_images: Vec<BinaryImage>,
    frames: Vec<Frame>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opt = Opt::parse();

    let input = match &opt.report {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read report from stdin")?;
            buf
        }
    };

    let report: Report = serde_json::from_str(&input).context("malformed crash report json")?;

    let symbolicator = ReportSymbolicator::new(&opt.dsym_paths, &report.binary_images)
        .context("failed to build image index")?;

    let options = SymbolicateOptions {
        silent: !opt.strict,
        demangle: !opt.no_demangle,
        symbolize_inlined: opt.inlined,
    };

    let resolved = symbolicator
        .symbolize_backtrace(&report.frames, &options, None)
        .context("symbolication failed")?;

    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &resolved)?;
    println!();

    Ok(())
}
