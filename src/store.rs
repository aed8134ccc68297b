// Data Store - both reference tables + flag registry, owned for the process lifetime
// A table that fails to load is absent, never fatal

use crate::config::Config;
use crate::flags::FlagRegistry;
use crate::source::resolve;
use crate::table::{ReferenceTable, TableKind};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct DataStore {
    pmnacc: Option<ReferenceTable>,
    tscainv: Option<ReferenceTable>,
    flags: FlagRegistry,
}

impl DataStore {
    /// Empty store with the standard flag definitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: install (or replace) a loaded table
    pub fn with_table(mut self, table: ReferenceTable) -> Self {
        match table.kind() {
            TableKind::Pmnacc => self.pmnacc = Some(table),
            TableKind::Tscainv => self.tscainv = Some(table),
        }
        self
    }

    /// Builder pattern: swap the flag registry
    pub fn with_flags(mut self, flags: FlagRegistry) -> Self {
        self.flags = flags;
        self
    }

    /// Load every table from its configured sources.
    ///
    /// Never fails: a table whose sources are all unavailable, or whose bytes
    /// do not parse, is left absent and reported by [`DataStore::status`].
    pub fn load(config: &Config) -> Self {
        let mut store = DataStore::new();

        for kind in TableKind::ALL {
            match load_table(config, kind) {
                Ok(table) => {
                    info!(
                        "Loaded {} data: {} records from {} (sha256 {})",
                        kind.label(),
                        table.len(),
                        table.origin(),
                        &table.digest()[..12]
                    );
                    if table.is_empty() {
                        warn!("{} table has a header but no rows", kind.label());
                    }
                    store = store.with_table(table);
                }
                Err(e) => {
                    error!("Error loading {} data: {:#}", kind.label(), e);
                }
            }
        }

        if store.loaded_count() == 0 {
            warn!("No reference tables loaded; every search will come back empty");
        }

        store
    }

    pub fn table(&self, kind: TableKind) -> Option<&ReferenceTable> {
        match kind {
            TableKind::Pmnacc => self.pmnacc.as_ref(),
            TableKind::Tscainv => self.tscainv.as_ref(),
        }
    }

    pub fn flags(&self) -> &FlagRegistry {
        &self.flags
    }

    pub fn loaded_count(&self) -> usize {
        TableKind::ALL
            .iter()
            .filter(|k| self.table(**k).is_some())
            .count()
    }

    /// Both tables present
    pub fn is_fully_loaded(&self) -> bool {
        self.loaded_count() == TableKind::ALL.len()
    }

    pub fn total_records(&self) -> usize {
        TableKind::ALL
            .iter()
            .filter_map(|k| self.table(*k))
            .map(ReferenceTable::len)
            .sum()
    }

    pub fn status(&self) -> StoreStatus {
        let tables: Vec<TableStatus> = TableKind::ALL
            .iter()
            .map(|kind| TableStatus::of(*kind, self.table(*kind)))
            .collect();

        StoreStatus {
            status: if self.is_fully_loaded() {
                HealthState::Healthy
            } else {
                HealthState::Degraded
            },
            data_loaded: self.is_fully_loaded(),
            total_records: self.total_records(),
            tables,
        }
    }
}

fn load_table(config: &Config, kind: TableKind) -> Result<ReferenceTable> {
    let fetched = resolve(&config.fetchers(kind))
        .with_context(|| format!("No usable source for {}", kind.label()))?;
    ReferenceTable::parse(kind, &fetched.bytes, fetched.origin)
}

// ============================================================================
// STATUS REPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub status: HealthState,
    pub data_loaded: bool,
    pub total_records: usize,
    pub tables: Vec<TableStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatus {
    pub table: &'static str,
    pub name: &'static str,
    pub loaded: bool,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

impl TableStatus {
    fn of(kind: TableKind, table: Option<&ReferenceTable>) -> Self {
        TableStatus {
            table: kind.label(),
            name: kind.name(),
            loaded: table.is_some(),
            records: table.map(ReferenceTable::len).unwrap_or(0),
            origin: table.map(|t| t.origin().to_string()),
            digest: table.map(|t| t.digest().to_string()),
            loaded_at: table.map(ReferenceTable::loaded_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let pmnacc = write_fixture(&dir, "pmnacc.csv", "ACCNO,GenericName,FLAG,ACTIVITY\n12345,Polymer,PMN,ACTIVE\n");
        let tscainv = write_fixture(
            &dir,
            "tscainv.csv",
            "casregno,CASRN,ChemName,FLAG,ACTIVITY\n50000,50-00-0,Formaldehyde,,ACTIVE\n64175,64-17-5,Ethanol,,ACTIVE\n",
        );

        let store = DataStore::load(&Config::local(pmnacc, tscainv));

        assert!(store.is_fully_loaded());
        assert_eq!(store.total_records(), 3);

        let status = store.status();
        assert_eq!(status.status, HealthState::Healthy);
        assert!(status.data_loaded);
        assert_eq!(status.tables[0].table, "PMNACC");
        assert_eq!(status.tables[0].records, 1);
        assert_eq!(status.tables[1].records, 2);
        assert!(status.tables[1].origin.as_deref().unwrap().ends_with("tscainv.csv"));
    }

    #[test]
    fn test_one_table_missing_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let tscainv = write_fixture(&dir, "tscainv.csv", "casregno,ChemName\n50000,Formaldehyde\n");

        let store = DataStore::load(&Config::local(dir.path().join("absent.csv"), tscainv));

        assert!(store.table(TableKind::Pmnacc).is_none());
        assert!(store.table(TableKind::Tscainv).is_some());

        let status = store.status();
        assert_eq!(status.status, HealthState::Degraded);
        assert!(!status.data_loaded);
        assert!(!status.tables[0].loaded);
        assert_eq!(status.tables[0].records, 0);
        assert_eq!(status.tables[0].origin, None);
    }

    #[test]
    fn test_nothing_loaded_still_returns_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::load(&Config::local(dir.path().join("a.csv"), dir.path().join("b.csv")));

        assert_eq!(store.loaded_count(), 0);
        assert_eq!(store.status().total_records, 0);
    }

    #[test]
    fn test_bad_schema_leaves_table_absent() {
        let dir = tempfile::tempdir().unwrap();
        let pmnacc = write_fixture(&dir, "pmnacc.csv", "Foo,Bar\n1,2\n");
        let tscainv = write_fixture(&dir, "tscainv.csv", "casregno,ChemName\n50000,Formaldehyde\n");

        let store = DataStore::load(&Config::local(pmnacc, tscainv));

        assert!(store.table(TableKind::Pmnacc).is_none());
        assert_eq!(store.total_records(), 1);
    }

    #[test]
    fn test_header_only_table_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let pmnacc = write_fixture(&dir, "pmnacc.csv", "ACCNO,GenericName,FLAG,ACTIVITY\n");
        let tscainv = write_fixture(&dir, "tscainv.csv", "casregno,ChemName\n50000,Formaldehyde\n");

        let store = DataStore::load(&Config::local(pmnacc, tscainv));

        let table = store.table(TableKind::Pmnacc).unwrap();
        assert!(table.is_empty());
        assert!(store.is_fully_loaded());
        assert_eq!(store.total_records(), 1);
    }

    #[test]
    fn test_status_json_shape() {
        let store = DataStore::new();
        let json = serde_json::to_value(store.status()).unwrap();

        assert_eq!(json["status"], "degraded");
        assert_eq!(json["dataLoaded"], false);
        assert_eq!(json["totalRecords"], 0);
        assert_eq!(json["tables"][1]["table"], "TSCAINV");
        assert!(json["tables"][1].get("origin").is_none());
    }
}
