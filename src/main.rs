//! pairshelf - index archive/preview pairs in a directory tree.
//!
//! Usage:
//!   pairshelf scan [PATH]     Scan a tree and show the paired index
//!   pairshelf export [PATH]   Export the paired index as JSON
//!   pairshelf thumbs [PATH]   Prerender thumbnails for every preview
//!   pairshelf --help          Show help

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pairshelf_core::{PairStrategy, ScanRequest, ScanResult};
use pairshelf_gallery::{GalleryConfig, ShelfRegistry};
use pairshelf_scan::ScanMonitor;
use pairshelf_thumbs::{RenderOptions, ThumbFormat, render_batch};

#[derive(Parser)]
#[command(
    name = "pairshelf",
    version,
    about = "Asset-pair indexer with scan and thumbnail caches",
    long_about = "pairshelf walks a directory tree, pairs archive files with \
                  their preview images by base name, and can prerender \
                  thumbnails for every preview it finds."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a tree and show the paired index
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum recursion depth (0 scans only the root; unlimited when omitted)
        #[arg(short, long)]
        depth: Option<u32>,

        /// Pairing strategy: first_match or best_match
        #[arg(short, long, default_value = "first_match")]
        strategy: String,

        /// Bypass the scan cache on read and write
        #[arg(short, long)]
        force_refresh: bool,

        /// Number of pairs to list
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,
    },

    /// Export the paired index as JSON
    Export {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum recursion depth (unlimited when omitted)
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Prerender thumbnails for every preview image under a tree
    Thumbs {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Thumbnail box size in pixels
        #[arg(short, long, default_value = "256")]
        size: u32,

        /// Output encoding: rgba, jpeg, or png
        #[arg(long, default_value = "rgba")]
        format: String,

        /// Encoder quality for lossy formats (1-100)
        #[arg(short, long, default_value = "85")]
        quality: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            path,
            depth,
            strategy,
            force_refresh,
            top,
        } => {
            let strategy = PairStrategy::from_str(&strategy)
                .map_err(|_| eyre!("Unknown strategy {strategy:?}, expected first_match or best_match"))?;
            let request = ScanRequest::new(path)
                .with_max_depth(depth)
                .with_strategy(strategy)
                .with_force_refresh(force_refresh);
            let result = run_scan(request, true).await?;
            print_index(&result, top);
        }
        Command::Export {
            path,
            depth,
            output,
        } => {
            let request = ScanRequest::new(path).with_max_depth(depth);
            let result = run_scan(request, false).await?;
            run_export(&result, output)?;
        }
        Command::Thumbs {
            path,
            size,
            format,
            quality,
        } => {
            run_thumbs(path, size, &format, quality).await?;
        }
    }

    Ok(())
}

/// Route `tracing` output to stderr, defaulting to warnings only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run one scan on the blocking pool with Ctrl-C cancellation wired in.
async fn run_scan(request: ScanRequest, show_progress: bool) -> Result<ScanResult> {
    let registry = Arc::new(ShelfRegistry::new(GalleryConfig::default()));

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, stopping scan...");
            signal_token.cancel();
        }
    });

    let result = tokio::task::spawn_blocking(move || {
        let cancel_fn = move || cancel.is_cancelled();
        let progress_fn = |percent: u8, message: &str| {
            eprintln!("[{percent:>3}%] {message}");
        };
        let mut monitor = ScanMonitor::none().with_cancel(&cancel_fn);
        if show_progress {
            monitor = monitor.with_progress(&progress_fn);
        }
        registry.scan(&request, monitor)
    })
    .await
    .context("Scan task failed")??;

    Ok(result)
}

/// Print the paired index as a text summary.
fn print_index(result: &ScanResult, top: usize) {
    let index = &result.index;

    println!();
    println!("{}", "─".repeat(70));
    println!(
        " {} pairs ({} with preview), {} unpaired archives, {} unpaired previews",
        index.pairs.len(),
        index.previewed_pairs(),
        index.unpaired_archives.len(),
        index.unpaired_previews.len()
    );
    println!(
        " {} files in {} directories ({} skipped), {:.2}s{}",
        index.total_files,
        result.stats.dirs_seen,
        result.stats.dirs_skipped,
        result.scan_duration.as_secs_f64(),
        if result.cache_hit { " (cached)" } else { "" }
    );
    println!("{}", "─".repeat(70));
    println!();

    for pair in index.pairs.iter().take(top) {
        match &pair.preview {
            Some(preview) => println!(
                "   {}  +  {}",
                pair.archive.display(),
                preview.display()
            ),
            None => println!("   {}  (no preview)", pair.archive.display()),
        }
    }
    let remaining = index.pairs.len().saturating_sub(top);
    if remaining > 0 {
        println!("   ... and {} more", remaining);
    }

    if !index.special_folders.is_empty() {
        println!();
        println!(" Special folders:");
        for folder in &index.special_folders {
            match &folder.preview {
                Some(preview) => println!("   {}  ({})", folder.path.display(), preview.display()),
                None => println!("   {}", folder.path.display()),
            }
        }
    }

    if !index.warnings.is_empty() {
        println!();
        println!(" {} warning(s) during scan", result.stats.warnings);
        for warning in index.warnings.iter().take(5) {
            println!("   {}: {}", warning.path.display(), warning.message);
        }
    }
}

/// Write the index as pretty JSON to a file or stdout.
fn run_export(result: &ScanResult, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(&*result.index)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Scan a tree, then render every preview it found in parallel.
async fn run_thumbs(path: PathBuf, size: u32, format: &str, quality: u8) -> Result<()> {
    let format = ThumbFormat::from_str(format)
        .map_err(|_| eyre!("Unknown format {format:?}, expected rgba, jpeg, or png"))?;
    let options = RenderOptions {
        format,
        quality,
        ..RenderOptions::default()
    };

    let result = run_scan(ScanRequest::new(path), true).await?;
    let index = &result.index;

    let mut specs: Vec<(PathBuf, u32, u32)> = Vec::new();
    for pair in &index.pairs {
        if let Some(preview) = &pair.preview {
            specs.push((preview.clone(), size, size));
        }
    }
    for preview in &index.unpaired_previews {
        specs.push((preview.clone(), size, size));
    }
    if specs.is_empty() {
        println!("No preview images found.");
        return Ok(());
    }

    eprintln!("Rendering {} thumbnails at {}x{}...", specs.len(), size, size);
    let started = Instant::now();
    let outcomes =
        tokio::task::spawn_blocking(move || render_batch(&specs, &options)).await?;
    let elapsed = started.elapsed();

    let mut rendered = 0usize;
    let mut failed = 0usize;
    let mut total_bytes = 0u64;
    for outcome in &outcomes {
        match outcome {
            Ok(thumb) => {
                rendered += 1;
                total_bytes += thumb.byte_len();
            }
            Err(err) => {
                failed += 1;
                eprintln!("   {err}");
            }
        }
    }

    println!();
    println!(
        " Rendered {} thumbnails ({}) in {:.2}s, {} failed",
        rendered,
        humansize::format_size(total_bytes, humansize::BINARY),
        elapsed.as_secs_f64(),
        failed
    );

    Ok(())
}
