//! Detection error types.
//!
//! Detectors themselves never fail: malformed or irrelevant text simply
//! yields "not complete" or an empty shortlist. These errors only surface
//! when a table or detector is built from bad configuration.

use thiserror::Error;

/// Errors raised while building an alias table or detector.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The table has no items at all.
    #[error("alias table is empty")]
    Empty,

    /// An item declared no aliases.
    #[error("item '{item}' has no aliases")]
    NoAliases { item: String },

    /// An alias is blank after trimming.
    #[error("item '{item}' has a blank alias")]
    BlankAlias { item: String },

    /// Two items share a canonical id.
    #[error("duplicate item id '{item}'")]
    DuplicateItem { item: String },

    /// One alias resolves to two different items.
    #[error("alias '{alias}' is claimed by both '{first}' and '{second}'")]
    AmbiguousAlias {
        alias: String,
        first: String,
        second: String,
    },

    /// A letter range for the shortlist detector is not an ascending A-Z span.
    #[error("invalid candidate range {first}-{last}")]
    InvalidLetterRange { first: char, last: char },

    /// A detector pattern failed to compile.
    #[error("failed to compile detector pattern: {reason}")]
    Pattern { reason: String },
}

impl From<regex::Error> for DetectionError {
    fn from(e: regex::Error) -> Self {
        DetectionError::Pattern {
            reason: e.to_string(),
        }
    }
}
