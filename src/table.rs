// Reference Tables - PMNACC accession table + TSCA inventory
// CSV → in-memory records, keys normalized once at load time

use crate::normalize::normalize_cas;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;

// ============================================================================
// TABLE KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Pmnacc,
    Tscainv,
}

impl TableKind {
    /// Scan order for "all" searches
    pub const ALL: [TableKind; 2] = [TableKind::Pmnacc, TableKind::Tscainv];

    /// Source label carried on every match ("PMNACC" / "TSCAINV")
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Pmnacc => "PMNACC",
            TableKind::Tscainv => "TSCAINV",
        }
    }

    /// Scope selector value ("pmnacc" / "tscainv")
    pub fn code(&self) -> &'static str {
        match self {
            TableKind::Pmnacc => "pmnacc",
            TableKind::Tscainv => "tscainv",
        }
    }

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Pmnacc => "PMNACC Database",
            TableKind::Tscainv => "TSCA Inventory Database",
        }
    }

    /// File name shipped by EPA for the current snapshot
    pub fn default_file(&self) -> &'static str {
        match self {
            TableKind::Pmnacc => "PMNACC_012025.csv",
            TableKind::Tscainv => "TSCAINV_012025.csv",
        }
    }

    /// Columns holding a CAS / accession key; a row matches if any of them does
    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Pmnacc => &["ACCNO"],
            TableKind::Tscainv => &["casregno", "CASRN"],
        }
    }
}

// ============================================================================
// RAW ROWS (source-specific column contract)
// ============================================================================

/// PMNACC row. Every column is optional: empty cells and short rows are None
#[derive(Debug, Deserialize)]
struct PmnaccRow {
    #[serde(rename = "ACCNO")]
    accno: Option<String>,

    #[serde(rename = "GenericName")]
    generic_name: Option<String>,

    #[serde(rename = "FLAG")]
    flag: Option<String>,

    #[serde(rename = "ACTIVITY")]
    activity: Option<String>,
}

/// TSCAINV row. Keys stay strings so "50000" never turns into 50000.0
#[derive(Debug, Deserialize)]
struct TscainvRow {
    #[serde(rename = "casregno")]
    casregno: Option<String>,

    #[serde(rename = "CASRN")]
    casrn: Option<String>,

    #[serde(rename = "ChemName")]
    chem_name: Option<String>,

    #[serde(rename = "FLAG")]
    flag: Option<String>,

    #[serde(rename = "ACTIVITY")]
    activity: Option<String>,
}

impl From<PmnaccRow> for ReferenceRecord {
    fn from(row: PmnaccRow) -> Self {
        let keys = normalized_keys([row.accno.as_deref()]);
        ReferenceRecord {
            source: TableKind::Pmnacc,
            cas_number: row.accno,
            chemical_name: row.generic_name,
            flag: row.flag,
            activity: row.activity,
            keys,
        }
    }
}

impl From<TscainvRow> for ReferenceRecord {
    fn from(row: TscainvRow) -> Self {
        let keys = normalized_keys([row.casregno.as_deref(), row.casrn.as_deref()]);
        ReferenceRecord {
            source: TableKind::Tscainv,
            // CASRN is the display form when the file carries it
            cas_number: non_blank(row.casrn).or(non_blank(row.casregno)),
            chemical_name: row.chem_name,
            flag: row.flag,
            activity: row.activity,
            keys,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Normalized, non-empty keys. Empty keys never match anything
fn normalized_keys<'a>(cells: impl IntoIterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for cell in cells.into_iter().flatten() {
        let key = normalize_cas(cell);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

// ============================================================================
// REFERENCE RECORD
// ============================================================================

/// One row of a reference table. Immutable once loaded
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub source: TableKind,
    pub cas_number: Option<String>,
    pub chemical_name: Option<String>,
    pub flag: Option<String>,
    pub activity: Option<String>,
    keys: Vec<String>,
}

impl ReferenceRecord {
    /// Does any key column equal the (already normalized) query?
    pub fn matches(&self, normalized_key: &str) -> bool {
        !normalized_key.is_empty() && self.keys.iter().any(|k| k == normalized_key)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

// ============================================================================
// REFERENCE TABLE
// ============================================================================

/// A fully loaded table plus provenance (where it came from, what bytes, when)
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    kind: TableKind,
    records: Vec<ReferenceRecord>,
    origin: String,
    digest: String,
    loaded_at: DateTime<Utc>,
}

impl ReferenceTable {
    /// Parse raw CSV bytes for a table.
    ///
    /// Fails when the CSV is unreadable or when the header carries none of
    /// the table's key columns. Rows are kept in file order.
    pub fn parse(kind: TableKind, bytes: &[u8], origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = rdr
            .headers()
            .with_context(|| format!("Failed to read {} header from {}", kind.label(), origin))?
            .clone();

        let has_key_column = kind
            .key_columns()
            .iter()
            .any(|col| headers.iter().any(|h| h == *col));
        if !has_key_column {
            bail!(
                "{} from {} has none of the key columns {:?}",
                kind.label(),
                origin,
                kind.key_columns()
            );
        }

        let records = match kind {
            TableKind::Pmnacc => collect_rows::<PmnaccRow, _>(&mut rdr, kind, &origin)?,
            TableKind::Tscainv => collect_rows::<TscainvRow, _>(&mut rdr, kind, &origin)?,
        };

        Ok(ReferenceTable {
            kind,
            records,
            origin,
            digest: content_digest(bytes),
            loaded_at: Utc::now(),
        })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// SHA-256 of the loaded bytes, hex
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Every record matching the normalized key, in file order
    pub fn scan<'a>(&'a self, normalized_key: &'a str) -> impl Iterator<Item = &'a ReferenceRecord> + 'a {
        self.records.iter().filter(move |r| r.matches(normalized_key))
    }
}

/// Deserialize every remaining row through the source-specific row type
fn collect_rows<T, R>(
    rdr: &mut csv::Reader<R>,
    kind: TableKind,
    origin: &str,
) -> Result<Vec<ReferenceRecord>>
where
    T: DeserializeOwned + Into<ReferenceRecord>,
    R: Read,
{
    let mut records = Vec::new();
    for (i, result) in rdr.deserialize::<T>().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse {} row {} of {}", kind.label(), i + 1, origin)
        })?;
        records.push(row.into());
    }
    Ok(records)
}

pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PMNACC_CSV: &str = "\
ACCNO,GenericName,FLAG,ACTIVITY
12345,Substituted polyether,PMN; S,ACTIVE
67890,Alkyl ester,,INACTIVE
,Missing key,PMN,ACTIVE
";

    const TSCAINV_CSV: &str = "\
ID,casregno,CASRN,ChemName,FLAG,ACTIVITY
1,110203,110-20-3,\"Pentanal, 2-methyl-\",,ACTIVE
2,50000,50-00-0,Formaldehyde,XU,ACTIVE
3,7732185,,Water,,ACTIVE
";

    #[test]
    fn test_parse_pmnacc() {
        let table = ReferenceTable::parse(TableKind::Pmnacc, PMNACC_CSV.as_bytes(), "test").unwrap();

        assert_eq!(table.len(), 3);
        let first = &table.records()[0];
        assert_eq!(first.source, TableKind::Pmnacc);
        assert_eq!(first.cas_number.as_deref(), Some("12345"));
        assert_eq!(first.chemical_name.as_deref(), Some("Substituted polyether"));
        assert_eq!(first.flag.as_deref(), Some("PMN; S"));
        assert_eq!(first.activity.as_deref(), Some("ACTIVE"));

        // Empty cell → None
        assert_eq!(table.records()[1].flag, None);
        assert!(table.records()[2].keys().is_empty());
    }

    #[test]
    fn test_parse_tscainv_display_key() {
        let table = ReferenceTable::parse(TableKind::Tscainv, TSCAINV_CSV.as_bytes(), "test").unwrap();

        assert_eq!(table.len(), 3);
        // CASRN preferred for display
        assert_eq!(table.records()[0].cas_number.as_deref(), Some("110-20-3"));
        assert_eq!(table.records()[0].chemical_name.as_deref(), Some("Pentanal, 2-methyl-"));
        // Falls back to casregno when CASRN is empty
        assert_eq!(table.records()[2].cas_number.as_deref(), Some("7732185"));
        // Both columns normalize to the same key: stored once
        assert_eq!(table.records()[0].keys(), ["110203".to_string()]);
    }

    #[test]
    fn test_scan_any_key_column() {
        let csv = "casregno,CASRN,ChemName,FLAG,ACTIVITY\n111,64-17-5,Ethanol,,ACTIVE\n";
        let table = ReferenceTable::parse(TableKind::Tscainv, csv.as_bytes(), "test").unwrap();

        assert_eq!(table.scan("64175").count(), 1);
        assert_eq!(table.scan("111").count(), 1);
        assert_eq!(table.scan("999").count(), 0);
    }

    #[test]
    fn test_empty_keys_never_match() {
        let table = ReferenceTable::parse(TableKind::Pmnacc, PMNACC_CSV.as_bytes(), "test").unwrap();
        assert_eq!(table.scan("").count(), 0);
    }

    #[test]
    fn test_missing_key_columns_rejected() {
        let csv = "Name,FLAG\nWater,\n";
        let err = ReferenceTable::parse(TableKind::Tscainv, csv.as_bytes(), "bad.csv").unwrap_err();
        assert!(err.to_string().contains("key columns"));
    }

    #[test]
    fn test_only_one_key_column_is_enough() {
        let csv = "casregno,ChemName\n50000,Formaldehyde\n";
        let table = ReferenceTable::parse(TableKind::Tscainv, csv.as_bytes(), "test").unwrap();
        assert_eq!(table.scan("50000").count(), 1);
        assert_eq!(table.records()[0].flag, None);
    }

    #[test]
    fn test_short_rows_tolerated() {
        let csv = "ACCNO,GenericName,FLAG,ACTIVITY\n12345,Polymer\n";
        let table = ReferenceTable::parse(TableKind::Pmnacc, csv.as_bytes(), "test").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].activity, None);
    }

    #[test]
    fn test_bom_and_digest() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(PMNACC_CSV.as_bytes());
        let table = ReferenceTable::parse(TableKind::Pmnacc, &bytes, "bom.csv").unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.digest(), content_digest(PMNACC_CSV.as_bytes()));
        assert_eq!(table.digest().len(), 64);
        assert_eq!(table.origin(), "bom.csv");
    }
}
