mod terminal;

use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use quiz_core::model::{SessionConfigDraft, SessionMode};
use services::{
    Clock, PlayerInput, RoundStateMachine, SessionHistoryService, SessionLoopService,
    SessionRuntime,
};
use storage::repository::Storage;
use storage::{JsonFileResponseLog, MemoryResponseLog, QuestionBank, ResponseLog};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use terminal::TerminalPresentation;

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Parser)]
#[command(name = "quiz")]
#[command(about = "Timed multiple-choice quiz: strike the target holding the right answer")]
struct Cli {
    /// Session history database
    #[arg(long, global = true, env = "QUIZ_DB_URL", default_value = "sqlite:quiz.sqlite3")]
    db: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play one session
    Play(PlayArgs),
    /// List recent sessions
    History {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Args)]
struct PlayArgs {
    /// Question bank JSON (`{"items": [...]}`)
    #[arg(long, env = "QUIZ_QUESTIONS")]
    questions: PathBuf,

    #[arg(long, value_enum, env = "QUIZ_MODE", default_value = "timed")]
    mode: ModeArg,

    /// Session length in seconds (timed mode)
    #[arg(long)]
    duration: Option<u32>,

    /// Mistakes allowed (timed mode)
    #[arg(long)]
    lives: Option<u32>,

    /// Seed for prompt order and option placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write the answer log to this JSON file
    #[arg(long, env = "QUIZ_RESPONSES")]
    responses: Option<PathBuf>,

    /// Log rounds cut short by the timer as unanswered
    #[arg(long)]
    record_unanswered: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Practice,
    Timed,
}

impl From<ModeArg> for SessionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Practice => SessionMode::Practice,
            ModeArg::Timed => SessionMode::Timed,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// One stdin line to a player action. Target numbers are 1-based.
fn parse_input(line: &str) -> Option<PlayerInput> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(PlayerInput::Pause),
        "r" | "resume" => Some(PlayerInput::Resume),
        "restart" => Some(PlayerInput::Restart),
        "q" | "quit" => Some(PlayerInput::Quit),
        other => other
            .parse::<usize>()
            .ok()
            .map(|n| PlayerInput::Strike(n.wrapping_sub(1))),
    }
}

/// Blocking stdin reader on its own thread so it never holds up shutdown.
fn spawn_stdin_reader(tx: mpsc::Sender<PlayerInput>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let Some(input) = parse_input(&line) else {
                eprintln!("1-3 strike, p pause, r resume, restart, q quit");
                continue;
            };
            if tx.blocking_send(input).is_err() {
                break;
            }
        }
    });
}

async fn play(storage: Storage, args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bank = QuestionBank::load(&args.questions)?;
    info!(prompts = bank.len(), path = %args.questions.display(), "question bank loaded");

    let config = SessionConfigDraft {
        duration_seconds: args.duration,
        max_lives: args.lives,
        prompts: bank.into_prompts(),
        record_unresolved_rounds: Some(args.record_unanswered),
        ..SessionConfigDraft::default()
    }
    .validate()?;

    let log: Box<dyn ResponseLog> = match &args.responses {
        Some(path) => Box::new(JsonFileResponseLog::new(path)),
        None => Box::new(MemoryResponseLog::new()),
    };
    let mut machine = RoundStateMachine::new(Box::new(TerminalPresentation::stdout()), log)
        .with_clock(Clock::default_clock());
    if let Some(seed) = args.seed {
        machine = machine.with_seed(seed);
    }
    let mut runtime = SessionRuntime::new(machine);

    let (tx, mut rx) = mpsc::channel(16);
    spawn_stdin_reader(tx);

    let session_loop = SessionLoopService::new(storage.sessions);
    let played = session_loop
        .play(&mut runtime, args.mode.into(), config, &mut rx)
        .await?;

    match played {
        Some(played) => {
            if let Some(err) = &played.persist_error {
                warn!(error = %err, "answer log was not saved");
                eprintln!("warning: answer log was not saved: {err}");
            }
            println!("Saved as session #{}.", played.history_id);
        }
        None => println!("Session abandoned."),
    }
    Ok(())
}

async fn history(storage: Storage, limit: u32) -> Result<(), Box<dyn std::error::Error>> {
    let history = SessionHistoryService::new(storage.sessions);
    let items = history.list_recent(limit).await?;
    if items.is_empty() {
        println!("No sessions yet.");
        return Ok(());
    }
    for item in items {
        println!(
            "#{:<4} {}  {:<8} {:<4} {:>3}%  {}/{}  {} star(s)  {}",
            item.id,
            item.ended_at.format("%Y-%m-%d %H:%M"),
            item.mode.as_str(),
            item.outcome.as_str(),
            item.score,
            item.correct,
            item.answered,
            item.stars,
            item.reason.as_str(),
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    let db_url = normalize_sqlite_url(cli.db);
    prepare_sqlite_file(&db_url)?;
    let storage = Storage::sqlite(&db_url).await?;

    match cli.command {
        Command::Play(args) => play(storage, args).await,
        Command::History { limit } => history(storage, limit).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
