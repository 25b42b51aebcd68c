pub mod metadata;

use crate::SUPPORTED_EXTENSIONS;
use crate::catalog::{Catalog, RateGate};
use crate::db::Database;
use crate::reconcile::{self, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Db(#[from] crate::db::DbError),
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub scanned: u64,
    pub cached: u64,
    pub explicit: u64,
    pub clean_with_match: u64,
    pub clean_no_match: u64,
    pub no_identifier: u64,
    pub errors: u64,
}

/// Walk the given directories and reconcile every supported audio file.
///
/// Per-file failures (unreadable tags, missing ISRC, failed lookups) are
/// logged and counted without stopping the run; a database error aborts,
/// since the store is what prevents duplicate lookups on the next run.
pub fn scan<C: Catalog>(
    db: &Database,
    catalog: &C,
    gate: &RateGate,
    paths: &[String],
) -> Result<ScanResult, ScanError> {
    // First pass: collect all audio file paths
    let mut audio_files: Vec<walkdir::DirEntry> = Vec::new();

    for path in paths {
        for entry in WalkDir::new(path).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_supported_file(entry.path()) {
                audio_files.push(entry);
            }
        }
    }

    let total = audio_files.len() as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) ({eta}) {msg}"
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.set_message("Scanning...");

    let mut result = ScanResult::default();

    for entry in &audio_files {
        let path = entry.path();
        result.scanned += 1;

        match process_file(db, catalog, gate, path)? {
            FileOutcome::Reconciled(Outcome::CachedSkip) => result.cached += 1,
            FileOutcome::Reconciled(Outcome::ResolvedExplicit) => result.explicit += 1,
            FileOutcome::Reconciled(Outcome::ResolvedCleanWithMatch) => {
                result.clean_with_match += 1
            }
            FileOutcome::Reconciled(Outcome::ResolvedCleanNoMatch) => {
                result.clean_no_match += 1
            }
            FileOutcome::NoIdentifier => result.no_identifier += 1,
            FileOutcome::Unreadable => result.errors += 1,
        }

        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "Done: {} explicit, {} clean with match, {} clean without, {} cached, {} no ISRC, {} errors",
        result.explicit,
        result.clean_with_match,
        result.clean_no_match,
        result.cached,
        result.no_identifier,
        result.errors,
    ));

    Ok(result)
}

enum FileOutcome {
    Reconciled(Outcome),
    NoIdentifier,
    Unreadable,
}

fn process_file<C: Catalog>(
    db: &Database,
    catalog: &C,
    gate: &RateGate,
    path: &Path,
) -> Result<FileOutcome, ScanError> {
    let tags = match metadata::read_tags(path) {
        Some(t) => t,
        None => return Ok(FileOutcome::Unreadable),
    };

    let isrc = match tags.isrc {
        Some(i) => i,
        None => {
            log::info!(
                "outcome=no-identifier path={} title={:?} artist={:?}",
                path.display(),
                tags.title.as_deref().unwrap_or("?"),
                tags.artist.as_deref().unwrap_or("?"),
            );
            return Ok(FileOutcome::NoIdentifier);
        }
    };

    let outcome = reconcile::reconcile(db, catalog, gate, &isrc, Some(path))?;
    Ok(FileOutcome::Reconciled(outcome))
}

/// Does this path have one of the supported audio extensions?
fn is_supported_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_file(Path::new("/music/song.flac")));
        assert!(is_supported_file(Path::new("/music/song.FLAC")));
        assert!(is_supported_file(Path::new("/music/song.mp3")));
        assert!(is_supported_file(Path::new("/music/song.opus")));
        assert!(!is_supported_file(Path::new("/music/cover.jpg")));
        assert!(!is_supported_file(Path::new("/music/song.wav")));
        assert!(!is_supported_file(Path::new("/music/noext")));
    }
}
