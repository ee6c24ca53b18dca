//! Declarative task definitions.
//!
//! A task is one experiment condition: its item or candidate table, how a
//! session starts, what counts as done, its time budget, prompts and fixed
//! messages. Tasks come from the `tasks:` section of `_config/config.yaml`
//! and fall back to the built-in presets in [`super::presets`].

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::errors::ConfigError;
use super::messages::{Language, MessageOverrides};
use crate::detection::{CompletionPolicy, Item, ShortlistRules, MAX_RANKED_ITEMS};

// ─── Public Types ────────────────────────────────────────────────────────────

/// How the assistant is framed to the participant. Recorded with each
/// session; prompts carry the actual framing text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    #[default]
    Assistant,
    Partner,
    Social,
    Task,
}

/// What opens a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StartGate {
    /// The session starts collecting immediately.
    #[default]
    Immediate,
    /// The first message of any content opens it.
    AnyInput,
    /// Only this keyword (trimmed, case-insensitive) opens it.
    Keyword { keyword: String },
}

/// One item as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemSpec {
    pub id: String,
    /// Defaults to the id alone.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Step-wise replies for this item, rotated by claim count.
    #[serde(default)]
    pub replies: Vec<String>,
}

impl ItemSpec {
    pub fn to_item(&self) -> Item {
        let aliases = if self.aliases.is_empty() {
            vec![self.id.clone()]
        } else {
            self.aliases.clone()
        };
        Item {
            id: self.id.clone(),
            aliases,
        }
    }
}

/// What the participant must produce.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// Rank every item; a completion detector watches both sides.
    Ranking {
        items: Vec<ItemSpec>,
        #[serde(default)]
        policy: CompletionPolicy,
        #[serde(default)]
        expert_rank: Vec<String>,
    },
    /// Pick items one per turn from scripted prompts; no completion service.
    Stepwise {
        items: Vec<ItemSpec>,
        #[serde(default)]
        step_prompts: Vec<String>,
        #[serde(default)]
        expert_rank: Vec<String>,
    },
    /// Name final candidates by letter, then confirm.
    Shortlist {
        #[serde(default = "default_first_letter")]
        first: char,
        #[serde(default = "default_last_letter")]
        last: char,
        #[serde(default = "default_picks")]
        picks: usize,
        #[serde(default)]
        strong_intent: Option<Vec<String>>,
        #[serde(default)]
        weak_intent: Option<Vec<String>>,
        #[serde(default)]
        question_markers: Option<Vec<String>>,
    },
    /// Free discussion ended only by the time budget.
    OpenEnded,
}

fn default_first_letter() -> char {
    'A'
}
fn default_last_letter() -> char {
    'G'
}
fn default_picks() -> usize {
    2
}

/// A complete task definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskConfig {
    /// Name the log store files this task's messages under.
    pub bot_name: String,
    #[serde(default)]
    pub framing: Framing,
    #[serde(default)]
    pub language: Language,
    pub kind: TaskKind,
    #[serde(default)]
    pub start: StartGate,
    /// Reply sent when the start gate opens.
    #[serde(default)]
    pub opening: Option<String>,
    #[serde(default)]
    pub time_budget_secs: Option<u64>,
    #[serde(default)]
    pub system_prompts: Vec<String>,
    /// First assistant message, shown before any input.
    #[serde(default)]
    pub greeting: Option<String>,
    /// Extra system message sent with every completion request.
    #[serde(default)]
    pub response_policy: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub messages: MessageOverrides,
}

impl TaskConfig {
    /// Whether sessions of this task ever call the completion service.
    pub fn uses_completion_service(&self) -> bool {
        !matches!(self.kind, TaskKind::Stepwise { .. })
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self, key: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidTask {
            task: key.to_string(),
            reason,
        };

        if self.bot_name.trim().is_empty() {
            return Err(invalid("bot_name is empty".into()));
        }
        if let StartGate::Keyword { keyword } = &self.start {
            if keyword.trim().is_empty() {
                return Err(invalid("start keyword is empty".into()));
            }
        }
        if self.time_budget_secs == Some(0) {
            return Err(invalid("time_budget_secs must be positive".into()));
        }

        match &self.kind {
            TaskKind::Ranking {
                items, expert_rank, ..
            } => {
                if items.is_empty() || items.len() > MAX_RANKED_ITEMS {
                    return Err(invalid(format!(
                        "ranking tasks need 1..={MAX_RANKED_ITEMS} items, got {}",
                        items.len()
                    )));
                }
                check_expert_rank(items, expert_rank).map_err(invalid)?;
            }
            TaskKind::Stepwise {
                items, expert_rank, ..
            } => {
                if items.is_empty() {
                    return Err(invalid("step-wise tasks need at least one item".into()));
                }
                check_expert_rank(items, expert_rank).map_err(invalid)?;
            }
            TaskKind::Shortlist {
                first, last, picks, ..
            } => {
                if *picks < 2 {
                    return Err(invalid(format!("picks must be at least 2, got {picks}")));
                }
                let span = (*last as usize).saturating_sub(*first as usize) + 1;
                if first > last || *picks > span {
                    return Err(invalid(format!(
                        "cannot pick {picks} from candidates {first}-{last}"
                    )));
                }
            }
            TaskKind::OpenEnded => {}
        }
        Ok(())
    }
}

/// Phrase lists for a shortlist task, defaults filled in.
pub fn shortlist_rules(
    strong_intent: &Option<Vec<String>>,
    weak_intent: &Option<Vec<String>>,
    question_markers: &Option<Vec<String>>,
) -> ShortlistRules {
    let mut rules = ShortlistRules::default();
    if let Some(v) = strong_intent {
        rules.strong_intent = v.iter().map(|s| s.to_lowercase()).collect();
    }
    if let Some(v) = weak_intent {
        rules.weak_intent = v.iter().map(|s| s.to_lowercase()).collect();
    }
    if let Some(v) = question_markers {
        rules.question_markers = v.iter().map(|s| s.to_lowercase()).collect();
    }
    rules
}

fn check_expert_rank(items: &[ItemSpec], expert_rank: &[String]) -> Result<(), String> {
    if expert_rank.is_empty() {
        return Ok(());
    }
    if expert_rank.len() != items.len() {
        return Err(format!(
            "expert_rank lists {} items but the task has {}",
            expert_rank.len(),
            items.len()
        ));
    }
    for id in expert_rank {
        if !items.iter().any(|i| &i.id == id) {
            return Err(format!("expert_rank names unknown item '{id}'"));
        }
    }
    Ok(())
}

// ─── File Section ────────────────────────────────────────────────────────────

/// The `tasks:` section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasksConfig {
    #[serde(default)]
    pub active_task: Option<String>,
    #[serde(default)]
    pub tasks: HashMap<String, TaskConfig>,
}

impl TasksConfig {
    /// Look up a task by key: file definitions first, then presets.
    pub fn resolve(&self, key: &str) -> Result<TaskConfig, ConfigError> {
        let config = match self.tasks.get(key) {
            Some(task) => task.clone(),
            None => super::presets::builtin(key).ok_or_else(|| ConfigError::UnknownTask {
                key: key.to_string(),
            })?,
        };
        config.validate(key)?;
        Ok(config)
    }

    /// Every task key available, file and built-in, sorted.
    pub fn available(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.tasks.keys().cloned().collect();
        for key in super::presets::BUILTIN_KEYS {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        keys
    }
}

/// Parse the tasks section from already-interpolated YAML text.
pub fn parse_tasks_config(yaml: &str) -> Result<TasksConfig, ConfigError> {
    let config: TasksConfig = serde_yaml::from_str(yaml)?;
    for (key, task) in &config.tasks {
        task.validate(key)?;
    }
    Ok(config)
}

/// Load the tasks section from a config file.
pub fn load_tasks_config(path: &Path) -> Result<TasksConfig, ConfigError> {
    let text = crate::config::read_interpolated(path).map_err(|e| ConfigError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_tasks_config(&text)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
