// CAS Lookup - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod source;
pub mod table;
pub mod normalize;
pub mod flags;
pub mod store;
pub mod search;
pub mod bulk;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorKind, LookupError};
pub use source::{resolve, Fetched, LocalFile, RemoteDocument, TableFetcher};
pub use table::{ReferenceRecord, ReferenceTable, TableKind};
pub use normalize::{is_candidate_key, normalize_cas, normalize_optional};
pub use flags::{FlagRegistry, FLAG_DEFINITIONS};
pub use store::{DataStore, HealthState, StoreStatus, TableStatus};
pub use search::{lookup, search, Scope, SearchMatch};
pub use bulk::{bulk_lookup, extract_candidates, BulkOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
