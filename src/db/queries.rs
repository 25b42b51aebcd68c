use super::models::{LibraryStats, NewRecord, PutOutcome, TrackRecord};
use super::{Database, Result};
use rusqlite::params;

impl Database {
    /// Has this identifier already been decided? This gate is what keeps
    /// re-runs from touching the network.
    pub fn track_exists(&self, isrc: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tracks WHERE isrc = ?1",
            params![isrc],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Fetch a single record by identifier.
    pub fn get_track(&self, isrc: &str) -> Result<Option<TrackRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT isrc, is_explicit, explicit_version_exists,
                    title, artist, year, recording_version, file_path
             FROM tracks WHERE isrc = ?1",
        )?;

        let mut rows = stmt.query_map(params![isrc], row_to_record)?;
        match rows.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    /// Insert a decided record. Rows are written once and never updated;
    /// a primary-key collision reports `DuplicateKey` and leaves the
    /// existing row untouched.
    pub fn put_track(&self, r: &NewRecord) -> Result<PutOutcome> {
        let res = self.conn.execute(
            "INSERT INTO tracks (
                isrc, is_explicit, explicit_version_exists,
                title, artist, year, recording_version, file_path
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                r.isrc,
                r.is_explicit,
                r.explicit_version_exists,
                r.title,
                r.artist,
                r.year,
                r.recording_version,
                r.file_path,
            ],
        );

        match res {
            Ok(_) => Ok(PutOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ffi::ErrorCode::ConstraintViolation =>
            {
                Ok(PutOutcome::DuplicateKey)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The query the whole run exists to answer: clean tracks for which the
    /// catalog knows an explicit counterpart.
    pub fn clean_with_explicit(&self, limit: usize) -> Result<Vec<TrackRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT isrc, is_explicit, explicit_version_exists,
                    title, artist, year, recording_version, file_path
             FROM tracks
             WHERE is_explicit = 0 AND explicit_version_exists = 1
             ORDER BY artist, title
             LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Counts per outcome class.
    pub fn stats(&self) -> Result<LibraryStats> {
        let total_tracks: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;

        let explicit_tracks: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tracks WHERE is_explicit = 1",
            [],
            |row| row.get(0),
        )?;

        let clean_with_match: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tracks
             WHERE is_explicit = 0 AND explicit_version_exists = 1",
            [],
            |row| row.get(0),
        )?;

        let clean_no_match: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tracks
             WHERE is_explicit = 0 AND explicit_version_exists = 0",
            [],
            |row| row.get(0),
        )?;

        Ok(LibraryStats {
            total_tracks,
            explicit_tracks,
            clean_with_match,
            clean_no_match,
        })
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrackRecord> {
    Ok(TrackRecord {
        isrc: row.get(0)?,
        is_explicit: row.get(1)?,
        explicit_version_exists: row.get(2)?,
        title: row.get(3)?,
        artist: row.get(4)?,
        year: row.get(5)?,
        recording_version: row.get(6)?,
        file_path: row.get(7)?,
    })
}
