use std::path::Path;

use crate::catalog::{Catalog, CatalogEntry, RateGate};
use crate::db::models::{NewRecord, PutOutcome};
use crate::db::{Database, Result};

/// How a single identifier was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already in the store; nothing was looked up or written.
    CachedSkip,
    /// The track itself is the explicit version.
    ResolvedExplicit,
    /// Clean, and the catalog knows an explicit counterpart.
    ResolvedCleanWithMatch,
    /// Clean, no explicit counterpart found (or nothing known at all).
    ResolvedCleanNoMatch,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CachedSkip => "cached-skip",
            Self::ResolvedExplicit => "resolved-explicit",
            Self::ResolvedCleanWithMatch => "resolved-clean-with-match",
            Self::ResolvedCleanNoMatch => "resolved-clean-no-match",
        }
    }
}

/// Decide one identifier and persist the decision.
///
/// Store check first, then a direct catalog lookup, then a search for an
/// explicit counterpart (only for tracks the catalog says are not explicit).
/// Lookup and search failures degrade to the conservative default (clean, no
/// counterpart) rather than aborting; only a storage error propagates, since
/// without the store there is no dedup guarantee left to honor. The gate is
/// claimed immediately before each external call.
pub fn reconcile<C: Catalog>(
    db: &Database,
    catalog: &C,
    gate: &RateGate,
    isrc: &str,
    file_path: Option<&Path>,
) -> Result<Outcome> {
    if db.track_exists(isrc)? {
        log::info!("outcome=cached-skip isrc={isrc}");
        return Ok(Outcome::CachedSkip);
    }

    let file_path = file_path.map(|p| p.to_string_lossy().to_string());

    gate.wait();
    let (record, outcome) = match catalog.lookup_by_isrc(isrc) {
        // Nothing known: assume clean, assume no explicit counterpart.
        None => (NewRecord::unknown(isrc, file_path.as_deref()), Outcome::ResolvedCleanNoMatch),

        Some(entry) if entry.explicit == Some(true) => {
            // Already the explicit version; the counterpart question is moot
            // and the search is skipped.
            (
                record_from_entry(isrc, &entry, true, false, file_path),
                Outcome::ResolvedExplicit,
            )
        }

        Some(entry) => {
            gate.wait();
            let candidates = catalog.search_recordings(
                entry.title.as_deref().unwrap_or(""),
                entry.artist.as_deref().unwrap_or(""),
                entry.year,
            );
            // First explicit candidate wins; the remote's ordering stands.
            let found = candidates.iter().any(|c| c.explicit == Some(true));
            let outcome = if found {
                Outcome::ResolvedCleanWithMatch
            } else {
                Outcome::ResolvedCleanNoMatch
            };
            (record_from_entry(isrc, &entry, false, found, file_path), outcome)
        }
    };

    match db.put_track(&record)? {
        PutOutcome::Inserted => {}
        // Raced or re-entered: someone already decided this identifier.
        PutOutcome::DuplicateKey => {
            log::warn!("Record for {isrc} already present, keeping existing decision");
        }
    }

    log::info!("outcome={} isrc={isrc}", outcome.label());
    Ok(outcome)
}

fn record_from_entry(
    isrc: &str,
    entry: &CatalogEntry,
    is_explicit: bool,
    explicit_version_exists: bool,
    file_path: Option<String>,
) -> NewRecord {
    NewRecord {
        isrc: isrc.to_string(),
        is_explicit,
        explicit_version_exists,
        title: entry.title.clone(),
        artist: entry.artist.clone(),
        year: entry.year,
        recording_version: entry.version.clone(),
        file_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Scripted catalog that counts how often each operation runs.
    struct FakeCatalog {
        lookup_result: Option<CatalogEntry>,
        search_result: Vec<CatalogEntry>,
        lookups: Cell<usize>,
        searches: Cell<usize>,
    }

    impl FakeCatalog {
        fn new(lookup: Option<CatalogEntry>, search: Vec<CatalogEntry>) -> Self {
            Self {
                lookup_result: lookup,
                search_result: search,
                lookups: Cell::new(0),
                searches: Cell::new(0),
            }
        }
    }

    impl Catalog for FakeCatalog {
        fn lookup_by_isrc(&self, _isrc: &str) -> Option<CatalogEntry> {
            self.lookups.set(self.lookups.get() + 1);
            self.lookup_result.clone()
        }

        fn search_recordings(
            &self,
            _title: &str,
            _artist: &str,
            _year: Option<i32>,
        ) -> Vec<CatalogEntry> {
            self.searches.set(self.searches.get() + 1);
            self.search_result.clone()
        }
    }

    fn entry(explicit: Option<bool>) -> CatalogEntry {
        CatalogEntry {
            isrc: Some("US1234567890".to_string()),
            title: Some("Song".to_string()),
            artist: Some("Artist".to_string()),
            year: Some(2020),
            version: None,
            explicit,
        }
    }

    fn gate() -> RateGate {
        RateGate::new(0)
    }

    #[test]
    fn test_cached_skip_makes_no_external_calls() {
        let db = Database::open_in_memory().unwrap();
        let catalog = FakeCatalog::new(Some(entry(Some(true))), vec![]);

        let first = reconcile(&db, &catalog, &gate(), "US1234567890", None).unwrap();
        assert_eq!(first, Outcome::ResolvedExplicit);
        assert_eq!(catalog.lookups.get(), 1);

        let second = reconcile(&db, &catalog, &gate(), "US1234567890", None).unwrap();
        assert_eq!(second, Outcome::CachedSkip);
        assert_eq!(catalog.lookups.get(), 1);
        assert_eq!(catalog.searches.get(), 0);

        // Cache content untouched by the second run
        let rec = db.get_track("US1234567890").unwrap().unwrap();
        assert!(rec.is_explicit);
    }

    #[test]
    fn test_explicit_track_skips_search() {
        let db = Database::open_in_memory().unwrap();
        let catalog = FakeCatalog::new(
            Some(entry(Some(true))),
            vec![entry(Some(true))], // would match if ever consulted
        );

        let outcome = reconcile(&db, &catalog, &gate(), "US1234567890", None).unwrap();
        assert_eq!(outcome, Outcome::ResolvedExplicit);
        assert_eq!(catalog.searches.get(), 0);

        let rec = db.get_track("US1234567890").unwrap().unwrap();
        assert!(rec.is_explicit);
        assert!(!rec.explicit_version_exists);
    }

    #[test]
    fn test_lookup_not_found_defaults_clean_no_match() {
        let db = Database::open_in_memory().unwrap();
        let catalog = FakeCatalog::new(None, vec![]);

        let outcome = reconcile(&db, &catalog, &gate(), "US9990000000", None).unwrap();
        assert_eq!(outcome, Outcome::ResolvedCleanNoMatch);
        assert_eq!(catalog.searches.get(), 0);

        let rec = db.get_track("US9990000000").unwrap().unwrap();
        assert!(!rec.is_explicit);
        assert!(!rec.explicit_version_exists);
        assert!(rec.title.is_none());
        assert!(rec.artist.is_none());
        assert!(rec.year.is_none());
    }

    #[test]
    fn test_empty_search_defaults_no_match() {
        let db = Database::open_in_memory().unwrap();
        let catalog = FakeCatalog::new(Some(entry(Some(false))), vec![]);

        let outcome = reconcile(&db, &catalog, &gate(), "US1234567890", None).unwrap();
        assert_eq!(outcome, Outcome::ResolvedCleanNoMatch);
        assert_eq!(catalog.searches.get(), 1);

        let rec = db.get_track("US1234567890").unwrap().unwrap();
        assert!(!rec.explicit_version_exists);
    }

    #[test]
    fn test_unknown_explicit_flag_still_searches() {
        let db = Database::open_in_memory().unwrap();
        let catalog = FakeCatalog::new(Some(entry(None)), vec![entry(Some(true))]);

        let outcome = reconcile(&db, &catalog, &gate(), "US1234567890", None).unwrap();
        assert_eq!(outcome, Outcome::ResolvedCleanWithMatch);
        assert_eq!(catalog.searches.get(), 1);

        // Unknown collapses to clean in the persisted record
        let rec = db.get_track("US1234567890").unwrap().unwrap();
        assert!(!rec.is_explicit);
        assert!(rec.explicit_version_exists);
    }

    #[test]
    fn test_match_detection_positive_and_negative() {
        let db = Database::open_in_memory().unwrap();

        let with_match = FakeCatalog::new(
            Some(entry(Some(false))),
            vec![entry(Some(false)), entry(Some(true))],
        );
        let outcome = reconcile(&db, &with_match, &gate(), "US0000000001", None).unwrap();
        assert_eq!(outcome, Outcome::ResolvedCleanWithMatch);

        let no_match = FakeCatalog::new(
            Some(entry(Some(false))),
            vec![entry(Some(false)), entry(None)],
        );
        let outcome = reconcile(&db, &no_match, &gate(), "US0000000002", None).unwrap();
        assert_eq!(outcome, Outcome::ResolvedCleanNoMatch);
    }

    #[test]
    fn test_scenario_clean_with_explicit_counterpart() {
        let db = Database::open_in_memory().unwrap();
        let catalog = FakeCatalog::new(
            Some(CatalogEntry {
                isrc: Some("US123".to_string()),
                title: Some("Song".to_string()),
                artist: Some("Artist".to_string()),
                year: Some(2020),
                version: None,
                explicit: Some(false),
            }),
            vec![entry(Some(false)), entry(Some(true))],
        );

        let outcome =
            reconcile(&db, &catalog, &gate(), "US123", Some(Path::new("/m/song.flac"))).unwrap();
        assert_eq!(outcome, Outcome::ResolvedCleanWithMatch);

        let rec = db.get_track("US123").unwrap().unwrap();
        assert_eq!(rec.isrc, "US123");
        assert!(!rec.is_explicit);
        assert!(rec.explicit_version_exists);
        assert_eq!(rec.title.as_deref(), Some("Song"));
        assert_eq!(rec.artist.as_deref(), Some("Artist"));
        assert_eq!(rec.year, Some(2020));
        assert_eq!(rec.file_path.as_deref(), Some("/m/song.flac"));
    }

    #[test]
    fn test_scenario_unknown_identifier() {
        let db = Database::open_in_memory().unwrap();
        let catalog = FakeCatalog::new(None, vec![]);

        let outcome = reconcile(&db, &catalog, &gate(), "US999", None).unwrap();
        assert_eq!(outcome, Outcome::ResolvedCleanNoMatch);

        let rec = db.get_track("US999").unwrap().unwrap();
        assert_eq!(rec.isrc, "US999");
        assert!(!rec.is_explicit);
        assert!(!rec.explicit_version_exists);
        assert!(rec.title.is_none());
        assert!(rec.artist.is_none());
        assert!(rec.year.is_none());
    }
}
