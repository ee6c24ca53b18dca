//! Session stage machine.
//!
//! `TaskRuntime::advance` is the pure turn function
//! `(Session, TurnInput) -> (Session, Verdict)`. It never performs I/O and
//! never calls the completion service: when a reply is needed it returns
//! `Verdict::Forward`, and the caller feeds the reply back as
//! `TurnInput::Assistant`.
//!
//! Transitions:
//! - `AwaitingStart` → `Collecting` when the task's start gate opens.
//! - `Collecting` → `Terminated` exactly once: on a recognised full answer,
//!   a confirmed shortlist, or an exhausted time budget.
//! - `Terminated` absorbs every further input unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::types::{
    new_session_id, FinalResult, Session, Stage, TerminationReason, TurnInput, Verdict,
};
use crate::detection::{
    agreement_score, AliasTable, Assessment, Author, CompletionDetector, ShortlistDetector,
};
use crate::inference::types::{ChatMessage, SamplingOverrides};
use crate::tasks::config::shortlist_rules;
use crate::tasks::{ConfigError, StartGate, TaskConfig, TaskKind, TaskMessages};

/// Detector state compiled from a task's `kind`.
#[derive(Debug, Clone)]
enum TaskDetector {
    Ranking {
        detector: CompletionDetector,
        expert_rank: Vec<String>,
    },
    Stepwise {
        table: AliasTable,
        step_prompts: Vec<String>,
        replies: HashMap<String, Vec<String>>,
        expert_rank: Vec<String>,
    },
    Shortlist {
        detector: ShortlistDetector,
        picks: usize,
    },
    OpenEnded,
}

/// A validated task with its detectors built, ready to run sessions.
#[derive(Debug, Clone)]
pub struct TaskRuntime {
    key: String,
    config: TaskConfig,
    messages: TaskMessages,
    detector: TaskDetector,
}

impl TaskRuntime {
    pub fn new(key: &str, config: TaskConfig) -> Result<Self, ConfigError> {
        config.validate(key)?;

        let detector = match &config.kind {
            TaskKind::Ranking {
                items,
                policy,
                expert_rank,
            } => {
                let table = AliasTable::new(items.iter().map(|i| i.to_item()).collect())
                    .map_err(|e| ConfigError::from_detection(key, e))?;
                TaskDetector::Ranking {
                    detector: CompletionDetector::new(table, *policy),
                    expert_rank: expert_rank.clone(),
                }
            }
            TaskKind::Stepwise {
                items,
                step_prompts,
                expert_rank,
            } => {
                let table = AliasTable::new(items.iter().map(|i| i.to_item()).collect())
                    .map_err(|e| ConfigError::from_detection(key, e))?;
                let replies = items
                    .iter()
                    .filter(|i| !i.replies.is_empty())
                    .map(|i| (i.id.clone(), i.replies.clone()))
                    .collect();
                TaskDetector::Stepwise {
                    table,
                    step_prompts: step_prompts.clone(),
                    replies,
                    expert_rank: expert_rank.clone(),
                }
            }
            TaskKind::Shortlist {
                first,
                last,
                picks,
                strong_intent,
                weak_intent,
                question_markers,
            } => {
                let rules = shortlist_rules(strong_intent, weak_intent, question_markers);
                let detector = ShortlistDetector::new(*first, *last, *picks, rules)
                    .map_err(|e| ConfigError::from_detection(key, e))?;
                TaskDetector::Shortlist {
                    detector,
                    picks: *picks,
                }
            }
            TaskKind::OpenEnded => TaskDetector::OpenEnded,
        };

        let messages = TaskMessages::resolve(config.language, &config.messages);

        Ok(Self {
            key: key.to_string(),
            config,
            messages,
            detector,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn messages(&self) -> &TaskMessages {
        &self.messages
    }

    /// Sampling overrides for completion requests of this task.
    pub fn sampling(&self) -> SamplingOverrides {
        SamplingOverrides {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    // ─── Session Lifecycle ───────────────────────────────────────────────

    /// A new session with a fresh id.
    pub fn start_session(&self, now: DateTime<Utc>) -> Session {
        self.start_session_with_id(new_session_id(), now)
    }

    /// A new session: system prompts and greeting in history, stage set by
    /// the start gate, deadline set by the time budget.
    pub fn start_session_with_id(&self, id: String, now: DateTime<Utc>) -> Session {
        let mut messages: Vec<ChatMessage> = self
            .config
            .system_prompts
            .iter()
            .map(ChatMessage::system)
            .collect();
        if let Some(greeting) = &self.config.greeting {
            messages.push(ChatMessage::assistant(greeting));
        }

        let stage = match self.config.start {
            StartGate::Immediate => Stage::Collecting,
            StartGate::AnyInput | StartGate::Keyword { .. } => Stage::AwaitingStart,
        };

        let deadline = self
            .config
            .time_budget_secs
            .map(|secs| now + chrono::Duration::seconds(secs as i64));

        tracing::info!(
            session_id = %id,
            task = %self.key,
            framing = ?self.config.framing,
            stage = stage.label(),
            deadline = ?deadline,
            "session started"
        );

        Session {
            id,
            task_key: self.key.clone(),
            bot_name: self.config.bot_name.clone(),
            stage,
            messages,
            claimed: Vec::new(),
            pending_shortlist: None,
            result: None,
            started_at: now,
            deadline,
            turns: 0,
        }
    }

    /// History to send to the completion service: the stored conversation
    /// plus the task's response policy, which is never stored.
    pub fn request_messages(&self, session: &Session) -> Vec<ChatMessage> {
        let mut messages = session.messages.clone();
        if let Some(policy) = &self.config.response_policy {
            messages.push(ChatMessage::system(policy));
        }
        messages
    }

    /// Terminate on an exhausted time budget. Returns the `Expired` verdict
    /// only on the turn the budget trips.
    pub fn expire_if_due(
        &self,
        mut session: Session,
        now: DateTime<Utc>,
    ) -> (Session, Option<Verdict>) {
        let due = !session.is_terminated() && session.deadline.is_some_and(|d| now >= d);
        if !due {
            return (session, None);
        }
        self.terminate(&mut session, TerminationReason::TimeExpired);
        let notice = self.messages.time_up.clone();
        (session, Some(Verdict::Expired { notice }))
    }

    // ─── Turn Function ───────────────────────────────────────────────────

    /// Apply one input to a session.
    pub fn advance(
        &self,
        session: Session,
        input: TurnInput,
        now: DateTime<Utc>,
    ) -> (Session, Verdict) {
        if session.is_terminated() {
            let notice = self.messages.chat_ended.clone();
            return (session, Verdict::Ignored { notice });
        }

        let (mut session, expired) = self.expire_if_due(session, now);
        if let Some(verdict) = expired {
            return (session, verdict);
        }

        let verdict = match (session.stage, input) {
            (Stage::AwaitingStart, TurnInput::Participant(text)) => {
                self.open_gate(&mut session, text)
            }
            (Stage::AwaitingStart, TurnInput::Assistant(text)) => {
                session.messages.push(ChatMessage::assistant(text));
                Verdict::Recorded
            }
            (Stage::AwaitingStart, _) => Verdict::Rejected {
                reply: self.messages.no_pending_shortlist.clone(),
            },
            (Stage::Collecting, input) => self.collect(&mut session, input),
            (Stage::Terminated { .. }, _) => Verdict::Ignored {
                notice: self.messages.chat_ended.clone(),
            },
        };

        tracing::debug!(
            session_id = %session.id,
            stage = session.stage.label(),
            verdict = verdict.label(),
            "turn applied"
        );

        (session, verdict)
    }

    fn open_gate(&self, session: &mut Session, text: String) -> Verdict {
        let opens = match &self.config.start {
            StartGate::Immediate | StartGate::AnyInput => true,
            StartGate::Keyword { keyword } => {
                text.trim().to_lowercase() == keyword.trim().to_lowercase()
            }
        };
        session.messages.push(ChatMessage::user(text));
        session.turns += 1;

        if !opens {
            let reply = self.messages.start_prompt.clone();
            session.messages.push(ChatMessage::assistant(&reply));
            return Verdict::AwaitingStart { reply };
        }

        self.transition(session, Stage::Collecting);
        if let Some(opening) = &self.config.opening {
            session.messages.push(ChatMessage::assistant(opening));
        }
        Verdict::Started {
            reply: self.config.opening.clone(),
        }
    }

    fn collect(&self, session: &mut Session, input: TurnInput) -> Verdict {
        match input {
            TurnInput::Participant(text) => {
                session.messages.push(ChatMessage::user(&text));
                session.turns += 1;
                self.on_participant(session, &text)
            }
            TurnInput::Assistant(text) => {
                session.messages.push(ChatMessage::assistant(&text));
                self.on_assistant(session, &text)
            }
            TurnInput::ConfirmShortlist => self.confirm_shortlist(session),
            TurnInput::CancelShortlist => {
                if session.pending_shortlist.take().is_some() {
                    tracing::info!(session_id = %session.id, "pending shortlist cancelled");
                    Verdict::Forward
                } else {
                    Verdict::Rejected {
                        reply: self.messages.no_pending_shortlist.clone(),
                    }
                }
            }
        }
    }

    fn on_participant(&self, session: &mut Session, text: &str) -> Verdict {
        match &self.detector {
            TaskDetector::Ranking {
                detector,
                expert_rank,
            } => match detector.assess(text, Author::Participant) {
                Assessment::Complete { ranking, path } => {
                    tracing::info!(session_id = %session.id, ?path, "participant completed ranking");
                    let ack = self.messages.completion_ack.clone();
                    session.messages.push(ChatMessage::assistant(&ack));
                    session.result = Some(ranked_result(ranking, expert_rank));
                    self.terminate(session, TerminationReason::Completed);
                    Verdict::Completed {
                        reason: TerminationReason::Completed,
                        replies: vec![ack],
                    }
                }
                Assessment::Incomplete => Verdict::Forward,
            },
            TaskDetector::Stepwise {
                table,
                step_prompts,
                replies,
                expert_rank,
            } => self.claim_step(session, text, table, step_prompts, replies, expert_rank),
            TaskDetector::Shortlist { detector, picks } => {
                let letters = detector.detect(text);
                if letters.is_empty() {
                    return Verdict::Forward;
                }
                let preview: Vec<char> = letters.iter().copied().take(*picks).collect();
                let reply = self.messages.shortlist_pending_for(&preview);
                session.messages.push(ChatMessage::assistant(&reply));
                session.pending_shortlist = Some(letters.clone());
                tracing::info!(session_id = %session.id, ?letters, "shortlist pending confirmation");
                Verdict::ShortlistPending { letters, reply }
            }
            TaskDetector::OpenEnded => Verdict::Forward,
        }
    }

    fn on_assistant(&self, session: &mut Session, text: &str) -> Verdict {
        let TaskDetector::Ranking {
            detector,
            expert_rank,
        } = &self.detector
        else {
            return Verdict::Recorded;
        };

        match detector.assess(text, Author::Assistant) {
            Assessment::Complete { ranking, .. } => {
                tracing::info!(session_id = %session.id, "assistant reply carried a full ranking");
                session.result = Some(ranked_result(ranking, expert_rank));
                self.terminate(session, TerminationReason::Completed);
                Verdict::Completed {
                    reason: TerminationReason::Completed,
                    replies: Vec::new(),
                }
            }
            Assessment::Incomplete => Verdict::Recorded,
        }
    }

    fn claim_step(
        &self,
        session: &mut Session,
        text: &str,
        table: &AliasTable,
        step_prompts: &[String],
        replies: &HashMap<String, Vec<String>>,
        expert_rank: &[String],
    ) -> Verdict {
        let fresh = table
            .find_word(text)
            .filter(|item| !session.claimed.iter().any(|c| c == item))
            .map(str::to_string);

        let Some(item) = fresh else {
            let reply = self.messages.retry_selection.clone();
            session.messages.push(ChatMessage::assistant(&reply));
            return Verdict::Rejected { reply };
        };

        session.claimed.push(item.clone());
        let count = session.claimed.len();

        let reply = match replies.get(&item) {
            Some(options) => options[(count - 1) % options.len()].clone(),
            None => step_prompts
                .get(count - 1)
                .cloned()
                .unwrap_or_else(|| self.messages.step_ack_for(&item)),
        };
        session.messages.push(ChatMessage::assistant(&reply));
        tracing::info!(session_id = %session.id, item = %item, count, "item claimed");

        if count < table.len() {
            return Verdict::Claimed { item, reply };
        }

        let closing = self.messages.closing.clone();
        session.messages.push(ChatMessage::assistant(&closing));
        session.result = Some(ranked_result(session.claimed.clone(), expert_rank));
        self.terminate(session, TerminationReason::Completed);
        Verdict::Completed {
            reason: TerminationReason::Completed,
            replies: vec![reply, closing],
        }
    }

    fn confirm_shortlist(&self, session: &mut Session) -> Verdict {
        let picks = match &self.detector {
            TaskDetector::Shortlist { picks, .. } => *picks,
            _ => 0,
        };
        let Some(letters) = session.pending_shortlist.take().filter(|_| picks > 0) else {
            return Verdict::Rejected {
                reply: self.messages.no_pending_shortlist.clone(),
            };
        };

        let selected: Vec<char> = letters.into_iter().take(picks).collect();
        let reply = self.messages.shortlist_confirmed_for(&selected);
        session.messages.push(ChatMessage::assistant(&reply));
        session.result = Some(FinalResult::Shortlist { letters: selected });
        self.terminate(session, TerminationReason::ShortlistConfirmed);
        Verdict::Completed {
            reason: TerminationReason::ShortlistConfirmed,
            replies: vec![reply],
        }
    }

    // ─── Transitions ─────────────────────────────────────────────────────

    fn transition(&self, session: &mut Session, to: Stage) {
        tracing::info!(
            session_id = %session.id,
            task = %self.key,
            from = session.stage.label(),
            to = to.label(),
            "stage transition"
        );
        session.stage = to;
    }

    fn terminate(&self, session: &mut Session, reason: TerminationReason) {
        session.pending_shortlist = None;
        self.transition(session, Stage::Terminated { reason });
        tracing::info!(session_id = %session.id, reason = reason.as_str(), "session terminated");
    }
}

fn ranked_result(items: Vec<String>, expert_rank: &[String]) -> FinalResult {
    let score = if expert_rank.is_empty() {
        None
    } else {
        agreement_score(&items, expert_rank)
    };
    FinalResult::Ranking { items, score }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::types::Role;
    use crate::tasks::presets::builtin;
    use chrono::TimeZone;

    const NUMBERED: &str = "1. 淡水\n2. 信号镜\n3. 压缩饼干\n4. 塑料布\n5. 打火机\n\
                            6. 尼龙绳\n7. 急救包\n8. 渔网\n9. 匕首\n10. 鲨鱼驱赶剂";
    const UNORDERED: &str = "淡水、信号镜、压缩饼干、塑料布、打火机、尼龙绳、急救包、渔网、匕首、鲨鱼驱赶剂";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn runtime(key: &str) -> TaskRuntime {
        TaskRuntime::new(key, builtin(key).unwrap()).unwrap()
    }

    fn say(rt: &TaskRuntime, session: Session, text: &str) -> (Session, Verdict) {
        rt.advance(session, TurnInput::Participant(text.to_string()), t0())
    }

    // ─── Ranking ─────────────────────────────────────────────────────────

    #[test]
    fn test_new_ranking_session_starts_collecting_with_greeting() {
        let rt = runtime("island-ranking-social");
        let s = rt.start_session(t0());
        assert_eq!(s.stage, Stage::Collecting);
        assert_eq!(s.messages[0].role, Role::System);
        assert_eq!(s.messages.last().unwrap().role, Role::Assistant);
        assert_eq!(s.deadline, Some(t0() + chrono::Duration::seconds(300)));
    }

    #[test]
    fn test_participant_numbered_list_terminates() {
        let rt = runtime("island-ranking-social");
        let (s, v) = say(&rt, rt.start_session(t0()), NUMBERED);
        assert!(matches!(
            v,
            Verdict::Completed {
                reason: TerminationReason::Completed,
                ..
            }
        ));
        assert_eq!(v.replies(), vec![rt.messages().completion_ack.as_str()]);
        assert_eq!(s.termination_reason(), Some(TerminationReason::Completed));
        match s.result {
            Some(FinalResult::Ranking { ref items, score }) => {
                assert_eq!(items[0], "淡水");
                assert!(score.is_none());
            }
            ref other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_participant_unordered_terminates() {
        let rt = runtime("island-ranking-task");
        let (s, v) = say(&rt, rt.start_session(t0()), UNORDERED);
        assert!(matches!(v, Verdict::Completed { .. }));
        assert!(s.is_terminated());
    }

    #[test]
    fn test_partial_answer_forwards() {
        let rt = runtime("island-ranking-social");
        let (s, v) = say(&rt, rt.start_session(t0()), "我觉得淡水最重要");
        assert_eq!(v, Verdict::Forward);
        assert_eq!(s.stage, Stage::Collecting);
        assert_eq!(s.turns, 1);
    }

    #[test]
    fn test_assistant_unordered_does_not_terminate() {
        let rt = runtime("island-ranking-social");
        let s = rt.start_session(t0());
        let (s, v) = rt.advance(s, TurnInput::Assistant(UNORDERED.into()), t0());
        assert_eq!(v, Verdict::Recorded);
        assert_eq!(s.stage, Stage::Collecting);
    }

    #[test]
    fn test_assistant_numbered_list_terminates() {
        let rt = runtime("island-ranking-social");
        let s = rt.start_session(t0());
        let (s, v) = rt.advance(s, TurnInput::Assistant(NUMBERED.into()), t0());
        assert_eq!(
            v,
            Verdict::Completed {
                reason: TerminationReason::Completed,
                replies: vec![]
            }
        );
        assert!(s.is_terminated());
    }

    #[test]
    fn test_terminated_session_ignores_input_unchanged() {
        let rt = runtime("island-ranking-social");
        let (done, _) = say(&rt, rt.start_session(t0()), NUMBERED);
        let snapshot = done.clone();

        let (after, v) = say(&rt, done, "还有一个问题");
        assert!(matches!(v, Verdict::Ignored { .. }));
        assert_eq!(after, snapshot);

        let (after, v) = rt.advance(after, TurnInput::ConfirmShortlist, t0());
        assert!(matches!(v, Verdict::Ignored { .. }));
        assert_eq!(after, snapshot);
    }

    #[test]
    fn test_time_budget_expires_once() {
        let rt = runtime("island-ranking-social");
        let s = rt.start_session(t0());
        let late = t0() + chrono::Duration::seconds(301);

        let (s, v) = rt.advance(s, TurnInput::Participant(NUMBERED.into()), late);
        assert_eq!(
            v,
            Verdict::Expired {
                notice: rt.messages().time_up.clone()
            }
        );
        assert_eq!(s.termination_reason(), Some(TerminationReason::TimeExpired));
        assert!(s.result.is_none(), "late answer must not be recorded");

        let (_, v) = rt.advance(s, TurnInput::Participant(NUMBERED.into()), late);
        assert!(matches!(v, Verdict::Ignored { .. }));
    }

    #[test]
    fn test_expire_if_due_before_deadline_is_noop() {
        let rt = runtime("crisis-statement");
        let s = rt.start_session(t0());
        let (s, v) = rt.expire_if_due(s, t0() + chrono::Duration::seconds(60));
        assert!(v.is_none());
        assert_eq!(
            s.remaining(t0() + chrono::Duration::seconds(60)),
            Some(chrono::Duration::seconds(360))
        );
    }

    #[test]
    fn test_advance_is_pure_over_session_value() {
        let rt = runtime("island-ranking-social");
        let s = rt.start_session_with_id("session-0000abcd".into(), t0());
        let a = rt.advance(s.clone(), TurnInput::Participant(UNORDERED.into()), t0());
        let b = rt.advance(s, TurnInput::Participant(UNORDERED.into()), t0());
        assert_eq!(a, b);
    }

    // ─── Open-ended ──────────────────────────────────────────────────────

    #[test]
    fn test_open_ended_always_forwards() {
        let rt = runtime("crisis-statement");
        let (s, v) = say(&rt, rt.start_session(t0()), UNORDERED);
        assert_eq!(v, Verdict::Forward);
        assert_eq!(s.stage, Stage::Collecting);
    }

    #[test]
    fn test_response_policy_only_in_request() {
        let rt = runtime("brainstorm");
        let (s, _) = say(&rt, rt.start_session(t0()), "Ideas for a bake sale?");
        let request = rt.request_messages(&s);
        assert_eq!(request.len(), s.messages.len() + 1);
        assert_eq!(request.last().unwrap().role, Role::System);
        assert!(request.last().unwrap().content.contains("80–100 words"));
        assert!(s.messages.iter().all(|m| !m.content.contains("80–100 words")));
    }

    // ─── Start gates ─────────────────────────────────────────────────────

    #[test]
    fn test_keyword_gate() {
        let rt = runtime("desert-partner");
        let s = rt.start_session(t0());
        assert_eq!(s.stage, Stage::AwaitingStart);

        let (s, v) = say(&rt, s, "water");
        assert_eq!(
            v,
            Verdict::AwaitingStart {
                reply: "Please input **\"OK\"** to begin.".into()
            }
        );
        assert!(s.claimed.is_empty());

        let (s, v) = say(&rt, s, "  Ok ");
        assert!(matches!(v, Verdict::Started { reply: Some(_) }));
        assert_eq!(s.stage, Stage::Collecting);
    }

    #[test]
    fn test_any_input_gate_does_not_claim() {
        let rt = runtime("desert-assistant");
        let (s, v) = say(&rt, rt.start_session(t0()), "water please");
        assert!(matches!(v, Verdict::Started { reply: Some(ref r) } if r.contains("magnetic compass")));
        assert!(s.claimed.is_empty());
    }

    // ─── Step-wise ───────────────────────────────────────────────────────

    fn opened(key: &str) -> (TaskRuntime, Session) {
        let rt = runtime(key);
        let (s, _) = say(&rt, rt.start_session(t0()), "ok");
        (rt, s)
    }

    #[test]
    fn test_stepwise_full_run_scores_ranking() {
        let (rt, s) = opened("desert-assistant");
        let (s, v) = say(&rt, s, "Water first");
        assert_eq!(
            v,
            Verdict::Claimed {
                item: "a bottle of water".into(),
                reply: "Let's start with the most immediate needs for surviving in the desert.".into()
            }
        );
        let (s, _) = say(&rt, s, "the canvas");
        let (s, _) = say(&rt, s, "COMPASS");
        let (s, _) = say(&rt, s, "map");
        let (s, v) = say(&rt, s, "knife, I guess");

        match v {
            Verdict::Completed { reason, replies } => {
                assert_eq!(reason, TerminationReason::Completed);
                assert_eq!(replies.len(), 2);
                assert_eq!(replies[1], rt.messages().closing);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(
            s.result,
            Some(FinalResult::Ranking {
                items: vec![
                    "a bottle of water".into(),
                    "a 20′×20′ piece of canvas".into(),
                    "a magnetic compass".into(),
                    "a map".into(),
                    "a knife".into(),
                ],
                score: Some(1.0),
            })
        );
    }

    #[test]
    fn test_stepwise_rejects_repeat_and_off_list() {
        let (rt, s) = opened("desert-assistant");
        let (s, _) = say(&rt, s, "water");
        let (s, v) = say(&rt, s, "more water");
        assert_eq!(
            v,
            Verdict::Rejected {
                reply: rt.messages().retry_selection.clone()
            }
        );
        let (s, v) = say(&rt, s, "a flashlight");
        assert!(matches!(v, Verdict::Rejected { .. }));
        assert_eq!(s.claimed, vec!["a bottle of water".to_string()]);
    }

    #[test]
    fn test_stepwise_one_item_per_turn_in_table_order() {
        let (rt, s) = opened("desert-assistant");
        let (s, v) = say(&rt, s, "knife and water");
        assert!(matches!(v, Verdict::Claimed { ref item, .. } if item == "a bottle of water"));
        assert_eq!(s.claimed.len(), 1);
    }

    #[test]
    fn test_partner_replies_rotate_by_claim_count() {
        let (rt, s) = opened("desert-partner");
        let (s, v1) = say(&rt, s, "water");
        let (_, v2) = say(&rt, s, "canvas");
        let (Verdict::Claimed { reply: r1, .. }, Verdict::Claimed { reply: r2, .. }) = (v1, v2)
        else {
            panic!("expected two claims");
        };
        assert!(r1.starts_with("Easy call"), "got {r1}");
        assert!(r2.starts_with("Isn't it bulky"), "got {r2}");
    }

    // ─── Shortlist ───────────────────────────────────────────────────────

    #[test]
    fn test_shortlist_detect_then_confirm() {
        let rt = runtime("candidate-shortlist");
        let (s, v) = say(&rt, rt.start_session(t0()), "最终入围：C、E");
        assert_eq!(
            v,
            Verdict::ShortlistPending {
                letters: vec!['C', 'E'],
                reply: rt.messages().shortlist_pending_for(&['C', 'E']),
            }
        );
        assert_eq!(s.stage, Stage::Collecting);

        let (s, v) = rt.advance(s, TurnInput::ConfirmShortlist, t0());
        assert_eq!(
            v.replies(),
            vec!["已确认最终入围：C、E。我们将这两位安排进入最终面试。"]
        );
        assert_eq!(
            s.termination_reason(),
            Some(TerminationReason::ShortlistConfirmed)
        );
        assert_eq!(
            s.result,
            Some(FinalResult::Shortlist {
                letters: vec!['C', 'E']
            })
        );
        assert!(s.pending_shortlist.is_none());
    }

    #[test]
    fn test_shortlist_confirm_keeps_first_picks() {
        let rt = runtime("candidate-shortlist");
        let (s, _) = say(&rt, rt.start_session(t0()), "最终入围：B、D、F");
        let (s, _) = rt.advance(s, TurnInput::ConfirmShortlist, t0());
        assert_eq!(
            s.result,
            Some(FinalResult::Shortlist {
                letters: vec!['B', 'D']
            })
        );
    }

    #[test]
    fn test_shortlist_cancel_forwards_and_clears() {
        let rt = runtime("candidate-shortlist");
        let (s, _) = say(&rt, rt.start_session(t0()), "我决定选A和B");
        assert!(s.pending_shortlist.is_some());
        let (s, v) = rt.advance(s, TurnInput::CancelShortlist, t0());
        assert_eq!(v, Verdict::Forward);
        assert!(s.pending_shortlist.is_none());
        assert_eq!(s.stage, Stage::Collecting);
    }

    #[test]
    fn test_shortlist_question_forwards() {
        let rt = runtime("candidate-shortlist");
        let (s, v) = say(&rt, rt.start_session(t0()), "A还是B哪个更好？");
        assert_eq!(v, Verdict::Forward);
        assert!(s.pending_shortlist.is_none());

        let (s, v) = say(&rt, s, "我该选择A还是B？");
        assert_eq!(v, Verdict::Forward);
        assert!(s.pending_shortlist.is_none());
    }

    #[test]
    fn test_confirm_without_pending_is_rejected() {
        let rt = runtime("candidate-shortlist");
        let s = rt.start_session(t0());
        let (s, v) = rt.advance(s, TurnInput::ConfirmShortlist, t0());
        assert!(matches!(v, Verdict::Rejected { .. }));
        assert_eq!(s.stage, Stage::Collecting);
        let (_, v) = rt.advance(s, TurnInput::CancelShortlist, t0());
        assert!(matches!(v, Verdict::Rejected { .. }));
    }

    #[test]
    fn test_assistant_reply_never_finishes_shortlist() {
        let rt = runtime("candidate-shortlist");
        let s = rt.start_session(t0());
        let (s, v) = rt.advance(s, TurnInput::Assistant("最终入围：A、B".into()), t0());
        assert_eq!(v, Verdict::Recorded);
        assert!(s.pending_shortlist.is_none());
    }
}
