//! Session value types.
//!
//! A `Session` is a plain value: the stage machine takes one by value and
//! hands back the next one, so there is no ambient per-user state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inference::types::ChatMessage;

// ─── Stage ───────────────────────────────────────────────────────────────────

/// Why a session stopped accepting input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A detector recognised a full answer.
    Completed,
    /// The participant confirmed a pending shortlist.
    ShortlistConfirmed,
    /// The time budget ran out.
    TimeExpired,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::Completed => "completed",
            TerminationReason::ShortlistConfirmed => "shortlist_confirmed",
            TerminationReason::TimeExpired => "time",
        }
    }
}

/// Lifecycle stage. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    AwaitingStart,
    Collecting,
    Terminated { reason: TerminationReason },
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::AwaitingStart => "awaiting_start",
            Stage::Collecting => "collecting",
            Stage::Terminated { .. } => "terminated",
        }
    }
}

/// What a finished session produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinalResult {
    /// Items in the participant's order, scored when a reference exists.
    Ranking {
        items: Vec<String>,
        score: Option<f64>,
    },
    /// Confirmed candidate letters.
    Shortlist { letters: Vec<char> },
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// `session-` followed by eight hex digits.
    pub id: String,
    pub task_key: String,
    pub bot_name: String,
    pub stage: Stage,
    /// Full history, system prompts included.
    pub messages: Vec<ChatMessage>,
    /// Step-wise items claimed so far, in claim order.
    pub claimed: Vec<String>,
    /// Letters awaiting confirmation.
    pub pending_shortlist: Option<Vec<char>>,
    pub result: Option<FinalResult>,
    pub started_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    /// Participant messages accepted so far.
    pub turns: u32,
}

impl Session {
    pub fn is_terminated(&self) -> bool {
        matches!(self.stage, Stage::Terminated { .. })
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        match self.stage {
            Stage::Terminated { reason } => Some(reason),
            _ => None,
        }
    }

    /// Time left on the budget, clamped at zero; `None` without a budget.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.deadline
            .map(|deadline| (deadline - now).max(chrono::Duration::zero()))
    }
}

/// A fresh session id: `session-` plus the first eight hex digits of a v4 UUID.
pub fn new_session_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("session-{}", &hex[..8])
}

// ─── Turn Input / Verdict ────────────────────────────────────────────────────

/// One event fed to the stage machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    /// Text typed by the participant.
    Participant(String),
    /// A reply produced by the completion service.
    Assistant(String),
    /// The participant accepted the pending shortlist.
    ConfirmShortlist,
    /// The participant withdrew the pending shortlist.
    CancelShortlist,
}

/// What the caller should do after a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The session was already over; nothing changed.
    Ignored { notice: String },
    /// The time budget ran out before this input was handled.
    Expired { notice: String },
    /// Still waiting for the start keyword.
    AwaitingStart { reply: String },
    /// The start gate opened.
    Started { reply: Option<String> },
    /// Ask the completion service for the next reply.
    Forward,
    /// Recorded; nothing further.
    Recorded,
    /// A step-wise item was accepted.
    Claimed { item: String, reply: String },
    /// The input was not acceptable.
    Rejected { reply: String },
    /// A shortlist was detected and awaits confirmation.
    ShortlistPending { letters: Vec<char>, reply: String },
    /// The session just ended.
    Completed {
        reason: TerminationReason,
        replies: Vec<String>,
    },
}

impl Verdict {
    /// Messages to show the participant for this turn.
    pub fn replies(&self) -> Vec<&str> {
        match self {
            Verdict::Ignored { notice } | Verdict::Expired { notice } => vec![notice.as_str()],
            Verdict::AwaitingStart { reply }
            | Verdict::Claimed { reply, .. }
            | Verdict::Rejected { reply }
            | Verdict::ShortlistPending { reply, .. } => vec![reply.as_str()],
            Verdict::Started { reply } => reply.iter().map(String::as_str).collect(),
            Verdict::Completed { replies, .. } => replies.iter().map(String::as_str).collect(),
            Verdict::Forward | Verdict::Recorded => Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Ignored { .. } => "ignored",
            Verdict::Expired { .. } => "expired",
            Verdict::AwaitingStart { .. } => "awaiting_start",
            Verdict::Started { .. } => "started",
            Verdict::Forward => "forward",
            Verdict::Recorded => "recorded",
            Verdict::Claimed { .. } => "claimed",
            Verdict::Rejected { .. } => "rejected",
            Verdict::ShortlistPending { .. } => "shortlist_pending",
            Verdict::Completed { .. } => "completed",
        }
    }
}
