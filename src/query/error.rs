// ABOUTME: Error types for query resolution
// ABOUTME: Separates missing-target lookups from malformed clause lists

use crate::dtb::FormatError;
use thiserror::Error;

/// A well-formed clause names something the tree does not contain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Alias not present under `/aliases`
    #[error("clause {clause}: unknown alias '{alias}'")]
    UnknownAlias { clause: usize, alias: String },
    /// Alias exists but its target path is not in the tree
    #[error("clause {clause}: alias '{alias}' points to missing node {path}")]
    DanglingAlias {
        clause: usize,
        alias: String,
        path: String,
    },
    /// No node satisfies the selector
    #[error("clause {clause}: no node matches {selector}")]
    NoMatch { clause: usize, selector: String },
}

/// The clause list itself is malformed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Empty clause list
    #[error("no clauses given")]
    NoClauses,
    /// Property selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        selector: String,
        reason: &'static str,
    },
    /// Path pattern is not a valid regular expression
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    /// A clause populates more than one selector kind
    #[error("clause {clause}: only one of aliases, path or properties may be given")]
    ConflictingSelectors { clause: usize },
}

/// Any failure surfaced by the crate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;
