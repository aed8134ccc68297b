// Bulk Extractor - pull candidate CAS numbers out of an uploaded file
// CSV: every cell of every column; anything else: one candidate per line

use crate::error::LookupError;
use crate::normalize::{is_candidate_key, normalize_cas};
use crate::search::{search, Scope, SearchMatch};
use crate::store::DataStore;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Ordered, deduplicated candidate collector
#[derive(Debug, Default)]
struct Candidates {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl Candidates {
    fn offer(&mut self, raw: &str) {
        let normalized = normalize_cas(raw.trim());
        if is_candidate_key(&normalized) && self.seen.insert(normalized.clone()) {
            self.ordered.push(normalized);
        }
    }
}

/// Is this upload a CSV, judging by its name?
pub fn is_csv_name(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".csv")
}

/// Extract candidate keys, deduplicated, in first-seen order.
///
/// For CSV uploads the first row is the header and is not scanned. A CSV that
/// cannot be parsed, including one with an unterminated quoted field, is
/// `MalformedUpload`. The result may be empty.
pub fn extract_candidates(content: &str, file_name: &str) -> Result<Vec<String>, LookupError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut candidates = Candidates::default();

    if is_csv_name(file_name) {
        // The reader is lenient: an open quote swallows the rest of the file
        if has_unterminated_quote(content) {
            return Err(LookupError::MalformedUpload(
                "unterminated quoted field".to_string(),
            ));
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        for result in rdr.records() {
            let record = result.map_err(|e| LookupError::MalformedUpload(e.to_string()))?;
            for cell in record.iter().filter(|c| !c.trim().is_empty()) {
                candidates.offer(cell);
            }
        }
    } else {
        for line in content.lines() {
            let line = line.trim();
            if !line.is_empty() {
                candidates.offer(line);
            }
        }
    }

    debug!("Extracted {} candidate keys from {}", candidates.ordered.len(), file_name);
    Ok(candidates.ordered)
}

/// Escaped quotes are doubled, so well-formed CSV always has an even count
fn has_unterminated_quote(content: &str) -> bool {
    content.bytes().filter(|b| *b == b'"').count() % 2 == 1
}

/// Outcome of a bulk lookup
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    /// Concatenated matches, in candidate order
    pub results: Vec<SearchMatch>,
    /// Every candidate extracted from the file
    pub candidates: Vec<String>,
    /// Candidates that matched nothing in scope
    pub unmatched: Vec<String>,
}

/// Extract candidates from `content` and look each one up.
pub fn bulk_lookup(
    store: &DataStore,
    content: &str,
    file_name: &str,
    scope: Scope,
) -> Result<BulkOutcome, LookupError> {
    let candidates = extract_candidates(content, file_name)?;
    if candidates.is_empty() {
        return Err(LookupError::NoCandidates);
    }

    let mut results = Vec::new();
    let mut unmatched = Vec::new();
    for candidate in &candidates {
        let found = search(store, candidate, scope);
        if found.is_empty() {
            unmatched.push(candidate.clone());
        }
        results.extend(found);
    }

    if results.is_empty() {
        return Err(LookupError::NoBulkMatches);
    }

    Ok(BulkOutcome {
        results,
        candidates,
        unmatched,
    })
}
