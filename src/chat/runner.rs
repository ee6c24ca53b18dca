//! Turn runner.
//!
//! Per participant message:
//! 1. Apply it to the stage machine.
//! 2. If the machine forwards, request a reply with the stored history plus
//!    the task's response policy, flatten it, and apply it as an assistant
//!    turn (a reply can itself complete a ranking task).
//! 3. Log every message appended this turn.
//! 4. Persist the result record on the turn the session terminates.

use chrono::{DateTime, Utc};

use super::errors::ChatError;
use crate::inference::{CompletionService, Role};
use crate::session::{Session, TaskRuntime, TurnInput, Verdict};
use crate::store::{ChatLogStore, NewLogEntry, ResultRecord};
use crate::tasks::TasksConfig;

/// Result of one submitted input.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session: Session,
    /// The verdict for the participant's input, or the assistant turn's
    /// verdict when that reply ended the session.
    pub verdict: Verdict,
    /// Everything to show the participant, in order.
    pub replies: Vec<String>,
}

/// Runs sessions of one task against a completion service and a log store.
pub struct ChatRunner<C> {
    runtime: TaskRuntime,
    service: C,
    store: ChatLogStore,
}

impl<C: CompletionService> ChatRunner<C> {
    pub fn new(runtime: TaskRuntime, service: C, store: ChatLogStore) -> Self {
        Self {
            runtime,
            service,
            store,
        }
    }

    /// Build a runner for a task key from config or presets.
    pub fn for_task(
        key: &str,
        tasks: &TasksConfig,
        service: C,
        store: ChatLogStore,
    ) -> Result<Self, ChatError> {
        let runtime = TaskRuntime::new(key, tasks.resolve(key)?)?;
        Ok(Self::new(runtime, service, store))
    }

    pub fn runtime(&self) -> &TaskRuntime {
        &self.runtime
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    pub fn store(&self) -> &ChatLogStore {
        &self.store
    }

    /// Open a session and log its greeting.
    pub fn start(&self, now: DateTime<Utc>) -> Result<Session, ChatError> {
        let session = self.runtime.start_session(now);
        self.log_since(&session, 0, now)?;
        Ok(session)
    }

    /// Apply one input at the current time.
    pub async fn submit(
        &mut self,
        session: Session,
        input: TurnInput,
    ) -> Result<TurnOutcome, ChatError> {
        self.submit_at(session, input, Utc::now()).await
    }

    /// Apply one input at `now`.
    pub async fn submit_at(
        &mut self,
        session: Session,
        input: TurnInput,
        now: DateTime<Utc>,
    ) -> Result<TurnOutcome, ChatError> {
        let logged = session.messages.len();
        let was_terminated = session.is_terminated();

        let (mut session, mut verdict) = self.runtime.advance(session, input, now);
        let mut replies: Vec<String> =
            verdict.replies().into_iter().map(str::to_string).collect();

        if verdict == Verdict::Forward {
            let reply = self.request_reply(&session).await;
            let (next, follow) = self
                .runtime
                .advance(session, TurnInput::Assistant(reply.clone()), now);
            session = next;
            replies.push(reply);
            if matches!(follow, Verdict::Completed { .. } | Verdict::Expired { .. }) {
                verdict = follow;
            }
        }

        self.log_since(&session, logged, now)?;
        if !was_terminated {
            self.persist_if_finished(&session, now)?;
        }

        Ok(TurnOutcome {
            session,
            verdict,
            replies,
        })
    }

    /// Check the time budget without input. Returns the time-up notice on
    /// the call that ends the session.
    pub fn tick(
        &self,
        session: Session,
        now: DateTime<Utc>,
    ) -> Result<(Session, Option<Verdict>), ChatError> {
        let (session, expired) = self.runtime.expire_if_due(session, now);
        if expired.is_some() {
            self.persist_if_finished(&session, now)?;
        }
        Ok((session, expired))
    }

    async fn request_reply(&mut self, session: &Session) -> String {
        let request = self.runtime.request_messages(session);
        let sampling = self.runtime.sampling();
        let messages = self.runtime.messages();

        match self.service.complete(&request, sampling).await {
            Ok(content) => {
                let text = content.flatten();
                if text.is_empty() {
                    tracing::warn!(session_id = %session.id, "completion returned empty content");
                    messages.empty_reply.clone()
                } else {
                    text
                }
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session.id,
                    task = %self.runtime.key(),
                    category = ?e.category(),
                    error = %e,
                    "completion request failed"
                );
                messages.completion_failure(e.category(), &e.detail())
            }
        }
    }

    /// Log non-system messages from index `from` onward.
    fn log_since(
        &self,
        session: &Session,
        from: usize,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        for message in session.messages.iter().skip(from) {
            if message.role == Role::System {
                continue;
            }
            self.store.append(&NewLogEntry {
                bot_name: &session.bot_name,
                session_id: &session.id,
                role: message.role,
                content: &message.content,
                created_at: now,
            })?;
        }
        Ok(())
    }

    fn persist_if_finished(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        if let Some(record) = ResultRecord::from_session(session, now) {
            self.store.record_result(&record)?;
            tracing::info!(
                session_id = %session.id,
                reason = %record.reason,
                turns = record.turns,
                "session result recorded"
            );
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
