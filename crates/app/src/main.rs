use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, interval_at};

use quiz_core::model::{CategorySelection, Difficulty};
use services::{
    AdvanceOutcome, HttpQuestionSource, QuestionResolver, QuizSession, QuizSummary, QuizWorkflow,
    ResumeOutcome, StartError, StartInput, SubmitFeedback, TickOutcome,
};
use storage::repository::{PreferenceStore, Storage};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidCategory { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid --category value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

struct Args {
    amount: usize,
    seconds_per_question: u32,
    selection: CategorySelection,
    difficulty: Difficulty,
    player_name: String,
    db_url: Option<String>,
    source_url: Option<String>,
    reset: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            amount: 10,
            seconds_per_question: 20,
            selection: CategorySelection::Any,
            difficulty: Difficulty::Any,
            player_name: String::new(),
            db_url: None,
            source_url: None,
            reset: false,
        }
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, ArgsError> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--amount" => {
                let value = require_value(&mut raw, "--amount")?;
                args.amount = value.parse().map_err(|_| ArgsError::InvalidNumber {
                    flag: "--amount",
                    raw: value,
                })?;
            }
            "--time" => {
                let value = require_value(&mut raw, "--time")?;
                args.seconds_per_question =
                    value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--time",
                        raw: value,
                    })?;
            }
            "--category" => {
                let value = require_value(&mut raw, "--category")?;
                args.selection = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidCategory { raw: value })?;
            }
            "--difficulty" => {
                let value = require_value(&mut raw, "--difficulty")?;
                args.difficulty = Difficulty::from_key(&value);
            }
            "--name" => args.player_name = require_value(&mut raw, "--name")?,
            "--db" => args.db_url = Some(require_value(&mut raw, "--db")?),
            "--source-url" => args.source_url = Some(require_value(&mut raw, "--source-url")?),
            "--reset" => args.reset = true,
            other => return Err(ArgsError::UnknownArg(other.to_owned())),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(args).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let storage = match &args.db_url {
        Some(url) => Storage::sqlite(url).await?,
        None => Storage::in_memory(),
    };
    if let Some(theme) = storage.preferences.theme().await? {
        log::info!("stored theme preference: {theme}");
    }

    let resolver = match &args.source_url {
        Some(url) => QuestionResolver::with_source(Arc::new(HttpQuestionSource::new(url.clone()))),
        None => QuestionResolver::generated_only(),
    };
    let workflow = QuizWorkflow::new(resolver, storage);

    if args.reset {
        workflow.reset().await?;
    }

    let session = match workflow.resume().await? {
        ResumeOutcome::InProgress(session) => {
            println!("Resuming your quiz in progress.");
            session
        }
        ResumeOutcome::Completed(summary) => {
            println!("Your last quiz:");
            print_summary(&summary);
            start_new(&workflow, &args).await?
        }
        ResumeOutcome::Fresh => start_new(&workflow, &args).await?,
    };

    run_session(&workflow, session).await
}

async fn start_new(workflow: &QuizWorkflow, args: &Args) -> Result<QuizSession, StartError> {
    let input = StartInput {
        amount: args.amount,
        seconds_per_question: args.seconds_per_question,
        selection: args.selection,
        difficulty: args.difficulty,
        player_name: args.player_name.clone(),
    };
    match workflow.start(input).await {
        Ok(session) => Ok(session),
        Err(StartError::Bank(err)) => {
            eprintln!("Could not build enough unique questions ({err}). Try a broader category.");
            Err(StartError::Bank(err))
        }
        Err(err) => Err(err),
    }
}

async fn run_session(
    workflow: &QuizWorkflow,
    mut session: QuizSession,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Commands: 1-4 select, (s)ubmit, s(k)ip, (p)ause, (h)int, (n)ext, (q)uit."
    );
    print_question(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let period = Duration::from_secs(1);
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let token = session.token();
                match workflow.tick(&mut session, token).await? {
                    TickOutcome::Running { remaining } if remaining <= 5 || remaining % 10 == 0 => {
                        println!("  {remaining}s left");
                    }
                    TickOutcome::Expired(feedback) => {
                        println!("Time's up!");
                        print_feedback(&feedback);
                    }
                    _ => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => {}
                    "q" | "quit" => break,
                    "s" | "submit" => match workflow.submit(&mut session).await {
                        Ok(feedback) => print_feedback(&feedback),
                        Err(err) => println!("{err}"),
                    },
                    "k" | "skip" => match workflow.skip(&mut session).await {
                        Ok(feedback) => print_feedback(&feedback),
                        Err(err) => println!("{err}"),
                    },
                    "p" | "pause" => match workflow.toggle_pause(&mut session).await {
                        Ok(true) => println!("Paused."),
                        Ok(false) => println!("Resumed."),
                        Err(err) => println!("{err}"),
                    },
                    "h" | "hint" => match session.hint() {
                        Ok(hint) => println!("Hint: {hint}"),
                        Err(err) => println!("{err}"),
                    },
                    "n" | "next" => match workflow.advance(&mut session).await {
                        Ok(AdvanceOutcome::Next { .. }) => print_question(&session),
                        Ok(AdvanceOutcome::Finished(summary)) => {
                            print_summary(&summary);
                            print_leaderboard(workflow).await?;
                            return Ok(());
                        }
                        Err(err) => println!("{err}"),
                    },
                    selection @ ("1" | "2" | "3" | "4") => {
                        let index = selection.parse::<usize>().unwrap_or(1) - 1;
                        let option = session
                            .state()
                            .current_item()
                            .and_then(|item| item.options().get(index))
                            .cloned();
                        match option {
                            Some(option) => {
                                let chosen = option.clone();
                                match workflow.select(&mut session, option).await {
                                    Ok(()) => println!("Selected: {chosen}"),
                                    Err(err) => println!("{err}"),
                                }
                            }
                            None => println!("No such option."),
                        }
                    }
                    other => println!("Unknown command: {other}"),
                }
            }
        }
    }
    Ok(())
}

fn print_question(session: &QuizSession) {
    let state = session.state();
    let Some(item) = state.current_item() else {
        return;
    };
    println!();
    println!(
        "Question {}/{} [{}] - {}s",
        state.current_index() + 1,
        state.total(),
        item.category(),
        state.timer_remaining()
    );
    println!("{}", item.question());
    for (i, option) in item.options().iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
}

fn print_feedback(feedback: &SubmitFeedback) {
    if feedback.correct {
        println!("Correct!");
    } else {
        println!("Incorrect. Correct answer: {}", feedback.correct_answer);
    }
    println!("Type 'n' for the next question.");
}

fn print_summary(summary: &QuizSummary) {
    println!();
    println!(
        "{}: {}/{} ({}%) - questions were {}",
        if summary.player_name.is_empty() {
            "Anonymous"
        } else {
            &summary.player_name
        },
        summary.score,
        summary.total,
        summary.percentage,
        summary.provenance
    );
    for (category, tally) in summary.breakdown.iter() {
        println!("  {category}: {}/{}", tally.correct, tally.total);
    }
    if !summary.badges.is_empty() {
        let labels: Vec<&str> = summary.badges.iter().map(|badge| badge.label()).collect();
        println!("Badges: {}", labels.join(", "));
    }
}

async fn print_leaderboard(workflow: &QuizWorkflow) -> Result<(), Box<dyn std::error::Error>> {
    let board = workflow.leaderboard().await?;
    if board.is_empty() {
        return Ok(());
    }
    println!();
    println!("Leaderboard:");
    for (rank, entry) in board.entries().iter().enumerate() {
        println!(
            "  {}. {} - {}/{} ({}%)",
            rank + 1,
            entry.name,
            entry.score,
            entry.total,
            entry.percentage
        );
    }
    Ok(())
}
