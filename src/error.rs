// Lookup errors surfaced to callers (CLI, TUI, HTTP)
// Loader / fetch plumbing stays on anyhow; these are the user-visible outcomes

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Please provide a CAS number")]
    EmptyQuery,

    #[error("No results found for CAS number: {0}")]
    NotFound(String),

    #[error("Unknown database '{0}' (expected all, pmnacc or tscainv)")]
    InvalidScope(String),

    #[error("No valid CAS numbers found in the uploaded file")]
    NoCandidates,

    #[error("No matching chemicals found for the CAS numbers in the uploaded file")]
    NoBulkMatches,

    #[error("Could not read uploaded file: {0}")]
    MalformedUpload(String),
}

/// Coarse classification used by the delivery layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input; the caller should fix the request
    Input,
    /// Request was fine, nothing matched
    NotFound,
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::NotFound(_) | LookupError::NoBulkMatches => ErrorKind::NotFound,
            LookupError::EmptyQuery
            | LookupError::InvalidScope(_)
            | LookupError::NoCandidates
            | LookupError::MalformedUpload(_) => ErrorKind::Input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(LookupError::EmptyQuery.kind(), ErrorKind::Input);
        assert_eq!(LookupError::NoCandidates.kind(), ErrorKind::Input);
        assert_eq!(LookupError::NotFound("1".into()).kind(), ErrorKind::NotFound);
        assert_eq!(LookupError::NoBulkMatches.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            LookupError::NotFound("110-20-3".into()).to_string(),
            "No results found for CAS number: 110-20-3"
        );
        assert_eq!(LookupError::EmptyQuery.to_string(), "Please provide a CAS number");
    }
}
