// Source configuration: local paths, shared remote documents, fetch timeout
// Read from flags, then environment, then .env (see load_dotenv)

use crate::source::{LocalFile, RemoteDocument, TableFetcher};
use crate::table::TableKind;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Local PMNACC CSV (always tried last)
    #[arg(long, env = "PMNACC_PATH", default_value = "PMNACC_012025.csv")]
    pub pmnacc_path: PathBuf,

    /// Local TSCA inventory CSV (always tried last)
    #[arg(long, env = "TSCAINV_PATH", default_value = "TSCAINV_012025.csv")]
    pub tscainv_path: PathBuf,

    /// Google Drive file id for PMNACC; enables the remote attempt
    #[arg(long, env = "PMNACC_DRIVE_ID")]
    pub pmnacc_drive_id: Option<String>,

    /// Google Drive file id for the TSCA inventory; enables the remote attempt
    #[arg(long, env = "TSCAINV_DRIVE_ID")]
    pub tscainv_drive_id: Option<String>,

    /// Timeout for a remote fetch, in seconds
    #[arg(long, env = "REMOTE_TIMEOUT_SECS", default_value_t = 30)]
    pub remote_timeout_secs: u64,

    /// Never attempt remote documents
    #[arg(long, env = "CAS_OFFLINE")]
    pub offline: bool,
}

impl Config {
    /// Local files only, no remote attempts
    pub fn local(pmnacc_path: impl Into<PathBuf>, tscainv_path: impl Into<PathBuf>) -> Self {
        Config {
            pmnacc_path: pmnacc_path.into(),
            tscainv_path: tscainv_path.into(),
            pmnacc_drive_id: None,
            tscainv_drive_id: None,
            remote_timeout_secs: 30,
            offline: true,
        }
    }

    pub fn local_path(&self, kind: TableKind) -> &PathBuf {
        match kind {
            TableKind::Pmnacc => &self.pmnacc_path,
            TableKind::Tscainv => &self.tscainv_path,
        }
    }

    /// Remote document id, if configured and not blank
    pub fn drive_id(&self, kind: TableKind) -> Option<&str> {
        let id = match kind {
            TableKind::Pmnacc => self.pmnacc_drive_id.as_deref(),
            TableKind::Tscainv => self.tscainv_drive_id.as_deref(),
        };
        id.map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    /// Fetch strategies for a table, in the order they should be tried
    pub fn fetchers(&self, kind: TableKind) -> Vec<Box<dyn TableFetcher>> {
        let mut fetchers: Vec<Box<dyn TableFetcher>> = Vec::new();

        if !self.offline {
            if let Some(id) = self.drive_id(kind) {
                fetchers.push(Box::new(RemoteDocument::google_drive(id, self.remote_timeout())));
            }
        }
        fetchers.push(Box::new(LocalFile::new(self.local_path(kind).clone())));

        fetchers
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            offline: false,
            ..Config::local(
                TableKind::Pmnacc.default_file(),
                TableKind::Tscainv.default_file(),
            )
        }
    }
}

/// Pick up a .env file if present. Missing file is fine
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}
