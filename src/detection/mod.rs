//! Detection: decides from message text whether a collaborative task is done.
//!
//! Submodules:
//! - `alias_table`: canonical items and the aliases that name them
//! - `ranked_list`: ordinal/item pairs from numbered lists
//! - `mentions`: standalone item mentions without ordinals
//! - `completion`: numbered-or-unordered completion verdicts
//! - `shortlist`: candidate letters behind an explicit selection intent
//! - `scoring`: agreement of a finished ranking with a reference order
//! - `errors`: configuration-time errors
//!
//! Every detector is a pure function of its table and the message text: the
//! same input always gives the same verdict and nothing is mutated.

pub mod alias_table;
pub mod completion;
pub mod errors;
pub mod mentions;
pub mod ranked_list;
pub mod scoring;
pub mod shortlist;

// Re-exports for convenience
pub use alias_table::{AliasTable, Item};
pub use completion::{Assessment, Author, CompletionDetector, CompletionPolicy, MatchPath};
pub use errors::DetectionError;
pub use mentions::{mentioned_items, scan_mentions, Mention};
pub use ranked_list::{parse_ranked_items, RankedEntry, RankedSubmission, MAX_ORDINAL};
pub use scoring::agreement_score;
pub use shortlist::{ShortlistDetector, ShortlistRules};

/// Largest item table a ranking task can use: one per ordinal marker.
pub const MAX_RANKED_ITEMS: usize = MAX_ORDINAL as usize;
