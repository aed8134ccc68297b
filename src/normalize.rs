// Key Normalizer
// CAS numbers are compared as opaque strings once hyphens and spaces are gone

use once_cell::sync::Lazy;
use regex::Regex;

/// Candidate CAS pattern for bulk extraction: 5 to 10 ASCII digits after normalization
static CANDIDATE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5,10}$").expect("candidate key pattern is valid"));

/// Remove every hyphen and space from a CAS number.
///
/// No other transformation is applied: no case folding, no trimming of other
/// whitespace, no numeric canonicalization. "0000050-00-0" stays zero-padded.
pub fn normalize_cas(raw: &str) -> String {
    raw.chars().filter(|c| *c != '-' && *c != ' ').collect()
}

/// Normalize a cell that may be missing. Missing values normalize to "".
pub fn normalize_optional(raw: Option<&str>) -> String {
    raw.map(normalize_cas).unwrap_or_default()
}

/// Does an already-normalized value look like a CAS number worth looking up?
pub fn is_candidate_key(normalized: &str) -> bool {
    CANDIDATE_KEY.is_match(normalized)
}
