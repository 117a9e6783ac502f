use clap::{Parser, Subcommand};
use quest_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mq")]
#[command(about = "Math practice quizzes with progress tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Seed the problem generator for a reproducible quiz
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List practice topics
    Topics {
        /// Only show topics for this level (introductory, advanced)
        #[arg(long)]
        level: Option<Level>,
    },

    /// Play a quiz, reading one answer per line from stdin
    Play {
        /// Topic id (see `mq topics`)
        #[arg(long)]
        topic: String,

        /// Difficulty level (defaults to the configured level)
        #[arg(long)]
        level: Option<Level>,

        /// Number of questions, used exactly as given (not snapped to the
        /// 10/20/30/50/100 preference values); defaults to the saved count
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        count: Option<u32>,

        /// Skip the pause after each answer
        #[arg(long)]
        no_pause: bool,
    },

    /// Show or set the player code
    Player {
        /// New code: 3-24 characters of A-Z, 0-9 and '-'
        code: Option<String>,
    },

    /// Show or set the number of questions per quiz
    Count {
        /// Requested count; snapped to 10, 20, 30, 50 or 100
        value: Option<u32>,
    },

    /// Best score per topic and the practice streak
    Stats,

    /// Export progress as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import progress exported with `mq export`
    Import {
        file: PathBuf,
    },

    /// Delete all recorded sessions
    Reset,

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

type Engine = PracticeEngine<FileStore, RngSource, SystemClock>;

fn main() -> Result<()> {
    // Initialize logging; warnings only so the quiz output stays readable
    quest_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    // Determine data directory
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    let errors = get_default_catalog().validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Config("Invalid catalog".into()));
    }

    let rng = match cli.seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    };
    let mut engine = PracticeEngine::with_parts(FileStore::new(config.store_dir()), rng, SystemClock);

    match cli.command {
        Commands::Topics { level } => cmd_topics(level),
        Commands::Play {
            topic,
            level,
            count,
            no_pause,
        } => {
            let level = level.unwrap_or(config.quiz.default_level);
            let pause = if no_pause {
                Duration::ZERO
            } else {
                Duration::from_millis(config.quiz.feedback_pause_ms)
            };
            cmd_play(&mut engine, &topic, level, count, pause)
        }
        Commands::Player { code } => cmd_player(&mut engine, code),
        Commands::Count { value } => cmd_count(&mut engine, value),
        Commands::Stats => cmd_stats(&mut engine),
        Commands::Export { output } => cmd_export(&mut engine, output),
        Commands::Import { file } => cmd_import(&mut engine, file),
        Commands::Reset => cmd_reset(&mut engine),
        Commands::Config { init } => cmd_config(&config, init),
    }
}

fn cmd_topics(level: Option<Level>) -> Result<()> {
    let levels: Vec<Level> = match level {
        Some(level) => vec![level],
        None => Level::ALL.to_vec(),
    };

    for level in levels {
        println!("{}:", level);
        for topic in topics_for_level(level) {
            println!("  {:<10} {}", topic.id, topic.title);
        }
    }
    Ok(())
}

fn cmd_play(
    engine: &mut Engine,
    topic_id: &str,
    level: Level,
    count: Option<u32>,
    pause: Duration,
) -> Result<()> {
    let mut session = engine.start(topic_id, level, count)?;
    let title = session
        .topic()
        .map(|t| t.title.clone())
        .unwrap_or_else(|| topic_id.to_string());

    println!("\n{} ({}) - {} questions\n", title, level, session.total_count());

    let stdin = io::stdin();
    let mut input = stdin.lock();

    let summary = loop {
        let Some(problem) = session.current_problem() else {
            return Err(Error::Other("session has no current problem".into()));
        };
        println!(
            "Q{}/{}: {}",
            session.current_index(),
            session.total_count(),
            problem.statement
        );
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            println!("\nSession abandoned, nothing recorded.");
            tracing::debug!("stdin closed during session {}", session.id());
            return Ok(());
        }

        let outcome = match engine.submit(&mut session, &line) {
            Ok(outcome) => outcome,
            // Last answer was scored but the record could not be written
            Err(e) if session.state() == SessionState::Completed => {
                if let Some(attempt) = session.attempts().last() {
                    print_feedback(attempt.was_correct, &attempt.canonical_answer);
                }
                break save_completed(engine, &mut session, e)?;
            }
            Err(e) => return Err(e),
        };
        print_feedback(outcome.was_correct, &outcome.expected);

        match outcome.next {
            NextStep::Problem(_) => {
                if !pause.is_zero() {
                    std::thread::sleep(pause);
                }
                println!();
            }
            NextStep::Completed(summary) => break summary,
        }
    };

    println!();
    println!(
        "Score: {}/{} • {}%",
        summary.correct, summary.total, summary.score_pct
    );
    println!();
    println!("Review:");
    for (i, attempt) in session.attempts().iter().enumerate() {
        let mark = if attempt.was_correct { '✓' } else { '✗' };
        println!(
            "  {} {:>2}. {}  you: {}  answer: {}",
            mark,
            i + 1,
            attempt.statement,
            attempt.submitted,
            attempt.canonical_answer
        );
    }
    Ok(())
}

fn print_feedback(was_correct: bool, expected: &str) {
    if was_correct {
        println!("✓ Correct!");
    } else {
        println!("✗ Not quite. Answer: {}", expected);
    }
}

/// Retry recording a completed session once after a failed save
fn save_completed(engine: &mut Engine, session: &mut Session, first: Error) -> Result<SessionSummary> {
    tracing::warn!("Saving session {} failed: {}. Retrying.", session.id(), first);

    match engine.finish(session) {
        Ok(Some(summary)) => Ok(summary),
        Ok(None) => Err(Error::Other("session was already recorded".into())),
        Err(e) => {
            println!();
            println!(
                "Score: {}/{} • {}% (not saved)",
                session.correct_count(),
                session.total_count(),
                session.score_percent().unwrap_or(0)
            );
            Err(e)
        }
    }
}

fn cmd_player(engine: &mut Engine, code: Option<String>) -> Result<()> {
    let mut profile = engine.profile();
    match code {
        None => {
            println!("Player: {}", profile.display_code());
            Ok(())
        }
        Some(code) => {
            if profile.set_player_code(&code)? {
                println!("✓ Player code set to {}", profile.display_code());
                Ok(())
            } else {
                Err(Error::InvalidArgument(format!(
                    "player code '{}' must be 3-24 characters of A-Z, 0-9 or '-'",
                    code
                )))
            }
        }
    }
}

fn cmd_count(engine: &mut Engine, value: Option<u32>) -> Result<()> {
    let mut profile = engine.profile();
    match value {
        None => println!("Questions per quiz: {}", profile.question_count()),
        Some(requested) => {
            let stored = profile.set_question_count(requested)?;
            println!("✓ Questions per quiz set to {}", stored);
        }
    }
    Ok(())
}

fn cmd_stats(engine: &mut Engine) -> Result<()> {
    let streak = engine.progress().streak();
    let stats = engine.stats();

    println!(
        "Streak: {}",
        if streak > 0 {
            "active (practiced today or yesterday)"
        } else {
            "inactive"
        }
    );

    if stats.is_empty() {
        println!("No practice sessions recorded yet.");
        return Ok(());
    }

    println!();
    println!("{:<13} {:<40} {:>5} {:>6}  {}", "Level", "Topic", "Best", "Plays", "Last played");
    for entry in stats.values() {
        let last = entry
            .last_played
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<13} {:<40} {:>4}% {:>6}  {}",
            entry.level, entry.topic, entry.best, entry.count, last
        );
    }
    Ok(())
}

fn cmd_export(engine: &mut Engine, output: Option<PathBuf>) -> Result<()> {
    let doc = engine.export();
    let json = doc.to_json()?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!(
                "✓ Exported {} sessions for {} to {}",
                doc.progress.sessions.len(),
                doc.player_code,
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_import(engine: &mut Engine, file: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&file)?;

    match engine.import(&text)? {
        ImportOutcome::AdoptedIncoming { sessions } => {
            println!("✓ Imported progress ({} sessions)", sessions);
            Ok(())
        }
        ImportOutcome::KeptCurrent { sessions } => {
            println!(
                "Kept current progress ({} sessions); the import had fewer",
                sessions
            );
            Ok(())
        }
        ImportOutcome::Rejected => Err(Error::InvalidArgument(format!(
            "{} is not a Math Quest export",
            file.display()
        ))),
    }
}

fn cmd_reset(engine: &mut Engine) -> Result<()> {
    engine.progress().reset()?;
    println!("✓ Progress cleared");
    Ok(())
}

fn cmd_config(config: &Config, init: bool) -> Result<()> {
    let path = Config::default_config_path();

    if !init {
        println!("# {}", path.display());
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    if path.exists() {
        println!("Config already exists at {}", path.display());
    } else {
        Config::default().save()?;
        println!("✓ Wrote default config to {}", path.display());
    }
    Ok(())
}
