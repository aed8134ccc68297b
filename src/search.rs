// Matcher - exact key equality after normalization, table scan order

use crate::error::LookupError;
use crate::normalize::normalize_cas;
use crate::store::DataStore;
use crate::table::{ReferenceRecord, TableKind};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SCOPE SELECTOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Only(TableKind),
}

impl Scope {
    pub fn includes(&self, kind: TableKind) -> bool {
        match self {
            Scope::All => true,
            Scope::Only(only) => *only == kind,
        }
    }

    /// Cycle all → pmnacc → tscainv → all (TUI toggle)
    pub fn next(&self) -> Self {
        match self {
            Scope::All => Scope::Only(TableKind::Pmnacc),
            Scope::Only(TableKind::Pmnacc) => Scope::Only(TableKind::Tscainv),
            Scope::Only(TableKind::Tscainv) => Scope::All,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Only(kind) => kind.code(),
        }
    }
}

impl FromStr for Scope {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Scope::All),
            "pmnacc" => Ok(Scope::Only(TableKind::Pmnacc)),
            "tscainv" => Ok(Scope::Only(TableKind::Tscainv)),
            _ => Err(LookupError::InvalidScope(s.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// MATCH RECORD
// ============================================================================

/// One matching row, enriched with its flag description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub source: &'static str,
    pub cas_number: Option<String>,
    pub chemical_name: Option<String>,
    pub flag: Option<String>,
    pub flag_description: Option<String>,
    pub activity: Option<String>,
}

impl SearchMatch {
    fn from_record(record: &ReferenceRecord, store: &DataStore) -> Self {
        SearchMatch {
            source: record.source.label(),
            cas_number: record.cas_number.clone(),
            chemical_name: record.chemical_name.clone(),
            flag: record.flag.clone(),
            flag_description: record
                .flag
                .as_deref()
                .and_then(|flags| store.flags().describe(flags)),
            activity: record.activity.clone(),
        }
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Every row in scope whose key equals `normalized_key`.
///
/// Tables are visited PMNACC then TSCAINV; rows keep file order. Absent tables
/// are skipped. An empty key matches nothing.
pub fn search(store: &DataStore, normalized_key: &str, scope: Scope) -> Vec<SearchMatch> {
    TableKind::ALL
        .iter()
        .filter(|kind| scope.includes(**kind))
        .filter_map(|kind| store.table(*kind))
        .flat_map(|table| table.scan(normalized_key))
        .map(|record| SearchMatch::from_record(record, store))
        .collect()
}

/// Single-key lookup from raw user input.
///
/// Blank input (or input that is nothing but hyphens and spaces) is
/// `EmptyQuery`; no rows is `NotFound`. Never an empty success.
pub fn lookup(store: &DataStore, raw_query: &str, scope: Scope) -> Result<Vec<SearchMatch>, LookupError> {
    let query = raw_query.trim();
    let normalized = normalize_cas(query);
    if normalized.is_empty() {
        return Err(LookupError::EmptyQuery);
    }

    let results = search(store, &normalized, scope);
    if results.is_empty() {
        return Err(LookupError::NotFound(query.to_string()));
    }

    Ok(results)
}
