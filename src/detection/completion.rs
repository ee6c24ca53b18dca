//! Completion detector for ranking tasks.
//!
//! A message completes the task when it carries a full numbered ranking
//! (ordinals exactly `1..=N`, `N` distinct items). When the caller permits
//! it, a message that merely names all `N` items as standalone mentions also
//! counts. Participants get that leniency; completion-service replies do not,
//! so a model listing the items while discussing them never ends a session.

use serde::{Deserialize, Serialize};

use super::alias_table::AliasTable;
use super::mentions::scan_mentions;
use super::ranked_list::parse_ranked_items;

// ─── Types ───────────────────────────────────────────────────────────────────

/// Who wrote the message being assessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    Participant,
    Assistant,
}

/// Per-task policy on the unordered fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Only a numbered list completes the task, whoever wrote it.
    NumberedOnly,
    /// Participants may also complete by naming every item.
    #[default]
    NumberedOrUnordered,
}

/// Which shape of message satisfied the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPath {
    Numbered,
    Unordered,
}

/// Outcome of assessing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    Incomplete,
    Complete {
        path: MatchPath,
        /// Items in submitted order (ordinal order, or first mention).
        ranking: Vec<String>,
    },
}

impl Assessment {
    pub fn is_complete(&self) -> bool {
        matches!(self, Assessment::Complete { .. })
    }
}

// ─── Detector ────────────────────────────────────────────────────────────────

/// Completion detector bound to one task's alias table.
#[derive(Debug, Clone)]
pub struct CompletionDetector {
    table: AliasTable,
    policy: CompletionPolicy,
}

impl CompletionDetector {
    pub fn new(table: AliasTable, policy: CompletionPolicy) -> Self {
        Self { table, policy }
    }

    /// Number of items a full answer must name.
    pub fn item_count(&self) -> usize {
        self.table.len()
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    /// Whether `text` is a full answer.
    ///
    /// With `permit_unordered` false only the numbered path is consulted.
    pub fn is_task_complete(&self, text: &str, permit_unordered: bool) -> bool {
        self.evaluate(text, permit_unordered).is_complete()
    }

    /// Assess a message, letting the task policy and the author decide
    /// whether the unordered path applies.
    pub fn assess(&self, text: &str, author: Author) -> Assessment {
        let permit_unordered = author == Author::Participant
            && self.policy == CompletionPolicy::NumberedOrUnordered;
        let assessment = self.evaluate(text, permit_unordered);
        tracing::debug!(
            ?author,
            permit_unordered,
            complete = assessment.is_complete(),
            "completion assessed"
        );
        assessment
    }

    fn evaluate(&self, text: &str, permit_unordered: bool) -> Assessment {
        let n = self.table.len();

        let submission = parse_ranked_items(text, &self.table);
        if submission.is_complete(n) {
            let ranking = submission.ranking(n).unwrap_or_else(|| {
                let mut seen = Vec::with_capacity(n);
                for entry in &submission.entries {
                    if !seen.contains(&entry.item) {
                        seen.push(entry.item.clone());
                    }
                }
                seen
            });
            return Assessment::Complete {
                path: MatchPath::Numbered,
                ranking,
            };
        }

        if permit_unordered {
            let mentions = scan_mentions(text, &self.table, n);
            if mentions.len() == n {
                return Assessment::Complete {
                    path: MatchPath::Unordered,
                    ranking: mentions.into_iter().map(|m| m.item).collect(),
                };
            }
        }

        Assessment::Incomplete
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
