use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::config::CatalogConfig;

/// How many recordings to request on a direct identifier lookup.
const LOOKUP_PAGE_SIZE: u32 = 10;

/// How many recordings to request on a title/artist/year search.
const SEARCH_PAGE_SIZE: u32 = 100;

/// One recording as seen by the rest of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub isrc: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub version: Option<String>,
    /// None when the remote flag is absent or unparseable.
    pub explicit: Option<bool>,
}

/// Remote recording-catalog operations.
///
/// Implementations never fail: a lookup that errors out reports "not found"
/// and a search that errors out reports an empty candidate list, so one bad
/// response can't take down a batch. Fakes implement this in engine tests.
pub trait Catalog {
    /// Direct lookup by identifier. Absence is an expected outcome.
    fn lookup_by_isrc(&self, isrc: &str) -> Option<CatalogEntry>;

    /// Search recordings by title/artist/year. The returned order is the
    /// remote's own ranking; callers do no re-sorting.
    fn search_recordings(
        &self,
        title: &str,
        artist: &str,
        year: Option<i32>,
    ) -> Vec<CatalogEntry>;
}

/// Shared minimum-gap gate between consecutive external catalog calls.
///
/// One gate instance covers the whole run, so the gap holds across tracks
/// (and across workers, should the driver ever go parallel). A zero gap
/// disables waiting entirely.
pub struct RateGate {
    min_gap: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(min_gap_ms: u64) -> Self {
        Self {
            min_gap: Duration::from_millis(min_gap_ms),
            last_call: Mutex::new(None),
        }
    }

    /// Block until at least the configured gap has passed since the previous
    /// `wait` returned, then claim the slot.
    pub fn wait(&self) {
        if self.min_gap.is_zero() {
            return;
        }
        let mut last = self.last_call.lock().unwrap();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_gap {
                thread::sleep(self.min_gap - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

/// Recordings endpoint response (partial — we only need `recordings`).
#[derive(Debug, Deserialize)]
struct RecordingsResponse {
    recordings: Option<Vec<Recording>>,
}

/// A single recording entry. The API serves every field as a string,
/// including booleans ("True"/"False") and years.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Recording {
    isrc: Option<String>,
    #[serde(rename = "recordingTitle")]
    recording_title: Option<String>,
    #[serde(rename = "recordingArtistName")]
    recording_artist_name: Option<String>,
    #[serde(rename = "recordingYear")]
    recording_year: Option<String>,
    #[serde(rename = "recordingVersion")]
    recording_version: Option<String>,
    #[serde(rename = "isExplicit")]
    is_explicit: Option<String>,
}

/// Catalog client over the recordings HTTP API.
pub struct HttpCatalog {
    agent: ureq::Agent,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Self {
            agent: agent_config.new_agent(),
            base_url: config.base_url.clone(),
            auth_token: config.resolve_auth_token(),
        }
    }

    /// POST a search payload and parse the recordings list.
    fn post_recordings(&self, payload: &serde_json::Value) -> Result<Vec<Recording>> {
        let mut request = self.agent.post(&self.base_url);
        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", token.as_str());
        }

        let response: RecordingsResponse = request
            .send_json(payload)
            .context("HTTP request failed")?
            .body_mut()
            .read_json()
            .context("Failed to parse JSON response")?;

        Ok(response.recordings.unwrap_or_default())
    }
}

impl Catalog for HttpCatalog {
    fn lookup_by_isrc(&self, isrc: &str) -> Option<CatalogEntry> {
        let payload = json!({
            "searchFields": { "isrc": isrc },
            "start": 0,
            "number": LOOKUP_PAGE_SIZE,
            "showReleases": false,
        });

        match self.post_recordings(&payload) {
            Ok(recordings) => {
                if recordings.is_empty() {
                    log::debug!("Catalog has no entry for {isrc}");
                }
                recordings.into_iter().next().map(entry_from_recording)
            }
            Err(e) => {
                log::warn!("Catalog lookup failed for {isrc}: {e:#}");
                None
            }
        }
    }

    fn search_recordings(
        &self,
        title: &str,
        artist: &str,
        year: Option<i32>,
    ) -> Vec<CatalogEntry> {
        let year_field = year.map(|y| y.to_string()).unwrap_or_default();
        let payload = json!({
            "searchFields": {
                "recordingArtistName": { "value": artist },
                "recordingTitle": { "value": title },
                "releaseName": { "value": "" },
                "releaseYear": "",
                "recordingVersion": { "value": "" },
                "recordingYear": year_field,
                "recordingType": "",
            },
            "start": 0,
            "number": SEARCH_PAGE_SIZE,
            "showReleases": false,
        });

        match self.post_recordings(&payload) {
            Ok(recordings) => recordings.into_iter().map(entry_from_recording).collect(),
            Err(e) => {
                log::warn!("Catalog search failed for \"{title}\" by \"{artist}\": {e:#}");
                Vec::new()
            }
        }
    }
}

/// Convert a wire recording into a CatalogEntry.
fn entry_from_recording(r: Recording) -> CatalogEntry {
    CatalogEntry {
        isrc: r.isrc,
        title: r.recording_title,
        artist: r.recording_artist_name,
        year: r.recording_year.as_deref().and_then(parse_year),
        version: r.recording_version,
        explicit: r.is_explicit.as_deref().and_then(parse_explicit_flag),
    }
}

/// Parse the API's stringly-typed explicit flag ("True"/"False").
fn parse_explicit_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse a 4-digit year out of a string like "2020" or "2020-03-01".
fn parse_year(raw: &str) -> Option<i32> {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() == 4 { digits.parse().ok() } else { None }
}
