/// Data for inserting a decided track (reconcile phase).
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub isrc: String,
    pub is_explicit: bool,
    pub explicit_version_exists: bool,

    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub recording_version: Option<String>,

    pub file_path: Option<String>,
}

impl NewRecord {
    /// Record for an identifier the catalog knows nothing about: assume clean,
    /// assume no explicit counterpart, carry no descriptive metadata.
    pub fn unknown(isrc: &str, file_path: Option<&str>) -> Self {
        Self {
            isrc: isrc.to_string(),
            is_explicit: false,
            explicit_version_exists: false,
            title: None,
            artist: None,
            year: None,
            recording_version: None,
            file_path: file_path.map(|p| p.to_string()),
        }
    }
}

/// A track row read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub isrc: String,
    pub is_explicit: bool,
    pub explicit_version_exists: bool,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub recording_version: Option<String>,
    pub file_path: Option<String>,
}

/// Outcome of an insert-only write. Duplicates are a normal result,
/// not an error, so batch code can branch without unwinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    DuplicateKey,
}

/// Library statistics.
#[derive(Debug)]
pub struct LibraryStats {
    pub total_tracks: i64,
    pub explicit_tracks: i64,
    pub clean_with_match: i64,
    pub clean_no_match: i64,
}
