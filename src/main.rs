use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cleansweep::catalog::{HttpCatalog, RateGate};
use cleansweep::db::models::TrackRecord;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cleansweep", version, about = "Find clean tracks where an explicit version exists")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan directories, look up each track, and record the decisions
    Scan {
        /// Directories to scan (defaults to config file music_dirs)
        paths: Vec<String>,

        /// Minimum milliseconds between catalog calls (overrides config)
        #[arg(short, long)]
        sleep: Option<u64>,
    },

    /// List clean tracks for which an explicit version exists
    Report {
        /// Number of results
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// Show library statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = cleansweep::config::AppConfig::load();

    // Resolve database path: CLI > config > XDG default
    let db_path = cli.db_path
        .or(config.db_path.clone())
        .unwrap_or_else(cleansweep::config::default_db_path);
    log::info!("Database: {}", db_path.display());

    let db = cleansweep::db::Database::open(&db_path)
        .context("Failed to open database")?;

    match cli.command {
        Commands::Scan { paths, sleep } => {
            // Resolve scan paths: CLI args > config music_dirs
            let scan_paths = if !paths.is_empty() {
                paths
            } else if !config.music_dirs.is_empty() {
                config.music_dirs.iter()
                    .map(|p| p.to_string_lossy().to_string())
                    .collect()
            } else {
                anyhow::bail!(
                    "No directories to scan. Pass paths as arguments or set music_dirs in config."
                );
            };

            let catalog = HttpCatalog::new(&config.catalog);
            let gate = RateGate::new(sleep.unwrap_or(config.catalog.rate_limit_ms));

            let result = cleansweep::scanner::scan(&db, &catalog, &gate, &scan_paths)
                .context("Scan failed")?;
            println!(
                "Scan complete: {} scanned: {} explicit, {} clean with explicit version, \
                 {} clean without, {} already known, {} missing ISRC, {} errors",
                result.scanned,
                result.explicit,
                result.clean_with_match,
                result.clean_no_match,
                result.cached,
                result.no_identifier,
                result.errors,
            );
            if result.clean_with_match > 0 {
                println!("Run `cleansweep report` to list the clean tracks.");
            }
        }

        Commands::Report { limit } => {
            let records = db.clean_with_explicit(limit)
                .context("Query failed")?;

            if records.is_empty() {
                println!("No clean tracks with a known explicit version.");
                return Ok(());
            }

            println!("{} clean tracks with an explicit version available:", records.len());
            println!();
            print_record_table(&records);
        }

        Commands::Stats => {
            let stats = db.stats().context("Failed to get stats")?;
            println!("Library Statistics");
            println!("==================");
            println!("Total tracks:        {}", stats.total_tracks);
            println!("Explicit:            {}", stats.explicit_tracks);
            println!("Clean, match found:  {}", stats.clean_with_match);
            println!("Clean, no match:     {}", stats.clean_no_match);
        }
    }

    Ok(())
}

/// Print a table of clean tracks with explicit counterparts.
fn print_record_table(records: &[TrackRecord]) {
    println!(
        "{:<25} {:<20} {:>4} {:<12} {:<12}  {}",
        "Song", "Artist", "Year", "Version", "ISRC", "File"
    );
    println!("{}", "-".repeat(110));

    for r in records {
        let title = truncate(r.title.as_deref().unwrap_or("?"), 25);
        let artist = truncate(r.artist.as_deref().unwrap_or("?"), 20);
        let version = truncate(r.recording_version.as_deref().unwrap_or(""), 12);
        let year = r.year.map(|y| y.to_string()).unwrap_or_else(|| "?".into());

        println!(
            "{:<25} {:<20} {:>4} {:<12} {:<12}  {}",
            title,
            artist,
            year,
            version,
            r.isrc,
            r.file_path.as_deref().unwrap_or(""),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        format!("{}...", &s[..max.saturating_sub(3)])
    } else {
        s.to_string()
    }
}
