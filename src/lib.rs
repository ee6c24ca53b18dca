//! Taskchat: chat sessions for human-AI collaboration experiments.
//!
//! Modules:
//! - `detection`: alias tables, ranked-list and mention parsers, completion
//!   and shortlist detectors, ranking agreement score
//! - `session`: the `Session` value and the pure stage machine
//! - `tasks`: declarative task definitions, presets and canned messages
//! - `inference`: OpenAI-compatible completion client
//! - `store`: SQLite chat log and result records
//! - `chat`: the turn runner wiring the above together
//! - `config`: config file discovery and env interpolation

pub mod chat;
pub mod config;
pub mod detection;
pub mod inference;
pub mod session;
pub mod store;
pub mod tasks;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use chat::ChatRunner;
use inference::{CompletionService, InferenceClient, Role, UnconfiguredService};
use session::{TaskRuntime, TurnInput, Verdict};
use store::ChatLogStore;
use tasks::TasksConfig;

/// Task run when neither the command line nor the config names one.
const DEFAULT_TASK: &str = "island-ranking-social";

/// Return the platform-standard data directory for Taskchat.
///
/// - macOS: `~/Library/Application Support/taskchat/`
/// - Windows: `{FOLDERID_RoamingAppData}\taskchat\`
/// - Linux: `$XDG_DATA_HOME/taskchat/` (fallback `~/.local/share/taskchat/`)
///
/// Falls back to `~/.taskchat/` only if none of the above can be resolved.
pub(crate) fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("taskchat");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskchat")
}

/// Initialize the tracing subscriber, writing to `<data_dir>/taskchat.log`.
///
/// Existing logs are rotated first (keeps the last 3). Output goes through a
/// line-flushing writer so nothing is lost if the process is killed.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = data_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_path = log_dir.join("taskchat.log");
    rotate_log_file(&log_path, 3);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("taskchat=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(FlushingWriter::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %log_dir.display(),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== Taskchat starting ==="
    );
    Ok(())
}

/// Rotate log files: `taskchat.log` → `taskchat.log.1` → `.2` → … → `.{keep}`.
///
/// Oldest file beyond `keep` is deleted. Missing files in the chain are skipped.
fn rotate_log_file(base_path: &std::path::Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// A writer that wraps `std::fs::File` and flushes after every write.
#[derive(Clone)]
struct FlushingWriter {
    file: std::sync::Arc<std::sync::Mutex<std::fs::File>>,
}

impl FlushingWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: std::sync::Arc::new(std::sync::Mutex::new(file)),
        }
    }
}

impl std::io::Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        let n = std::io::Write::write(&mut *f, buf)?;
        std::io::Write::flush(&mut *f)?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        std::io::Write::flush(&mut *f)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ─── Terminal Driver ─────────────────────────────────────────────────────────

/// Command-line options for [`run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Task key; defaults to the config's `active_task`.
    pub task: Option<String>,
    /// Print the available task keys and exit.
    pub list: bool,
}

/// Run one session on stdin/stdout.
pub async fn run(options: RunOptions) -> anyhow::Result<()> {
    init_tracing()?;

    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let config_path = config::find_config_path(&cwd);

    let tasks = match &config_path {
        Some(path) => tasks::load_tasks_config(path)?,
        None => {
            tracing::info!("no config file found, using built-in tasks");
            TasksConfig::default()
        }
    };

    if options.list {
        for key in tasks.available() {
            println!("{key}");
        }
        return Ok(());
    }

    let key = options
        .task
        .or_else(|| tasks.active_task.clone())
        .unwrap_or_else(|| DEFAULT_TASK.to_string());
    let runtime = TaskRuntime::new(&key, tasks.resolve(&key)?)?;

    let db_path = data_dir().join("chat_logs.db");
    let store = ChatLogStore::open(&db_path.to_string_lossy())
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    if !runtime.config().uses_completion_service() {
        let service = UnconfiguredService::new("step-wise tasks do not use a model");
        return drive(ChatRunner::new(runtime, service, store)).await;
    }

    let client = config_path
        .as_deref()
        .ok_or_else(|| "no config file with a models section".to_string())
        .and_then(|path| {
            inference::config::load_models_config(path)
                .and_then(InferenceClient::from_config)
                .map_err(|e| e.to_string())
        });

    match client {
        Ok(client) => {
            tracing::info!(
                model = %client.current_model_name(),
                task = %key,
                "completion client ready"
            );
            drive(ChatRunner::new(runtime, client, store)).await
        }
        Err(reason) => {
            tracing::warn!(reason = %reason, "completion service unavailable");
            let service = UnconfiguredService::new(reason);
            drive(ChatRunner::new(runtime, service, store)).await
        }
    }
}

async fn drive<C: CompletionService>(mut runner: ChatRunner<C>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut session = runner.start(Utc::now())?;
    let bot = session.bot_name.clone();
    stdout
        .write_all(format!("[{}] task {}\n", session.id, runner.runtime().key()).as_bytes())
        .await?;
    for message in session.messages.iter().filter(|m| m.role == Role::Assistant) {
        stdout
            .write_all(format!("{bot}: {}\n", message.content).as_bytes())
            .await?;
    }

    while !session.is_terminated() {
        let (next, expired) = runner.tick(session, Utc::now())?;
        session = next;
        if let Some(verdict) = expired {
            print_replies(&mut stdout, &bot, &verdict.replies()).await?;
            break;
        }

        let prompt = match session.remaining(Utc::now()) {
            Some(left) => format!("[{:02}:{:02}] > ", left.num_minutes(), left.num_seconds() % 60),
            None => "> ".to_string(),
        };
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = match line.trim() {
            "" => continue,
            "/quit" => break,
            "/confirm" => TurnInput::ConfirmShortlist,
            "/cancel" => TurnInput::CancelShortlist,
            _ => TurnInput::Participant(line),
        };

        let outcome = runner.submit(session, input).await?;
        let replies: Vec<&str> = outcome.replies.iter().map(String::as_str).collect();
        print_replies(&mut stdout, &bot, &replies).await?;
        if matches!(outcome.verdict, Verdict::ShortlistPending { .. }) {
            stdout
                .write_all(b"(type /confirm to submit or /cancel to keep discussing)\n")
                .await?;
        }
        session = outcome.session;
    }

    if let Some(reason) = session.termination_reason() {
        stdout
            .write_all(
                format!("-- session {} ended: {} --\n", session.id, reason.as_str()).as_bytes(),
            )
            .await?;
    }
    stdout.flush().await?;
    Ok(())
}

async fn print_replies(
    stdout: &mut tokio::io::Stdout,
    bot: &str,
    replies: &[&str],
) -> std::io::Result<()> {
    for reply in replies {
        stdout.write_all(format!("{bot}: {reply}\n").as_bytes()).await?;
    }
    Ok(())
}
