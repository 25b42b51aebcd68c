use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Tags extracted from audio file metadata. The ISRC is normalized and
/// validated; title/artist ride along for log messages only.
pub struct TagInfo {
    pub isrc: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

// ISRC layout: country (2 letters), registrant (3 alphanumerics),
// year + designation (7 digits). Stored without separators.
static ISRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{3}[0-9]{7}$").unwrap());

/// Read tags from an audio file. Returns None when the file can't be
/// opened or carries no tag at all.
pub fn read_tags(path: &Path) -> Option<TagInfo> {
    let tagged_file = match lofty::read_from_path(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("Could not read tags from {}: {}", path.display(), e);
            return None;
        }
    };

    // Try primary tag, then fall back
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())?;

    let isrc = tag
        .get_string(&ItemKey::Isrc)
        .and_then(normalize_isrc);

    Some(TagInfo {
        isrc,
        title: tag.title().map(|s| s.to_string()),
        artist: tag.artist().map(|s| s.to_string()),
    })
}

/// Normalize a raw ISRC tag value: strip separators, uppercase, validate.
/// Returns None for anything that isn't a well-formed 12-character code.
pub fn normalize_isrc(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '.'))
        .collect::<String>()
        .to_uppercase();

    if ISRC_RE.is_match(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain() {
        assert_eq!(normalize_isrc("USUM81700077"), Some("USUM81700077".into()));
    }

    #[test]
    fn test_normalize_separators_and_case() {
        assert_eq!(normalize_isrc("us-um8-17-00077"), Some("USUM81700077".into()));
        assert_eq!(normalize_isrc(" CAUM81700077 "), Some("CAUM81700077".into()));
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert_eq!(normalize_isrc(""), None);
        assert_eq!(normalize_isrc("error"), None);
        assert_eq!(normalize_isrc("USUM817000"), None); // too short
        assert_eq!(normalize_isrc("USUM817000777"), None); // too long
        assert_eq!(normalize_isrc("1SUM81700077"), None); // digit country code
    }
}
