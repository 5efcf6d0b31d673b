use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use bead_abacus::app::state::HELP;
use bead_abacus::app::{AbacusSession, Outcome, SessionController};
use bead_abacus::config::AbacusConfig;
use bead_abacus::engine::local::DEFAULT_BASE;
use bead_abacus::engine::{ArithmeticEngine, HttpEngine, LocalEngine};

/// Interactive bead abacus over a base-n arithmetic engine.
#[derive(Parser)]
#[command(name = "bead-abacus", version, about)]
struct Args {
    /// TOML configuration file (defaults are used when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the in-process engine instead of the HTTP one.
    #[arg(long)]
    offline: bool,

    /// Starting base of the in-process engine.
    #[arg(long, default_value_t = DEFAULT_BASE)]
    base: u32,

    /// Read commands from a file instead of stdin.
    #[arg(long)]
    script: Option<PathBuf>,
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_summary(session: &mut AbacusSession) {
    let summary = session.summary();
    let divider = summary
        .divider
        .map_or_else(|| "-".to_string(), |d| d.to_string());

    println!(
        "width {}  divider {}  beads {}  binary beads {}",
        summary.width,
        divider,
        session.snapshot().bead_total(),
        summary.binary_beads
    );
    for row in session.rows().iter().filter(|row| row.is_occupied()) {
        println!("  y={:<2} {}", row.position, "#".repeat(row.count as usize));
    }
}

fn report(outcome: Outcome, session: &mut AbacusSession) {
    match outcome {
        Outcome::Grid => print_summary(session),
        Outcome::Columns { added: Some(id) } => println!("added column {id}"),
        Outcome::Columns { added: None } => {
            for column in session.columns().columns() {
                let rows: Vec<String> = column.beads().iter().map(u32::to_string).collect();
                println!("  column {}: [{}]", column.id(), rows.join(", "));
            }
        }
        Outcome::Merged(report) if report.is_noop() => println!("nothing to merge"),
        Outcome::Merged(report) => {
            println!("merged {} row(s)", report.applied.len());
            print_summary(session);
        }
        Outcome::Edited => {}
        Outcome::Reading(summary) => {
            println!("word    {}", summary.word);
            println!("sum     {}", summary.sum);
            println!("phrase  {}", summary.phrase);
            println!("manual  {}", summary.manual_score);
        }
        Outcome::Rendered(path) => println!("wrote {}", path.display()),
        Outcome::Help => println!("{HELP}"),
        Outcome::Quit => {}
    }
}

fn run<E: ArithmeticEngine>(controller: &mut SessionController<E>, input: Box<dyn BufRead>, prompt: bool) {
    if prompt {
        print!("> ");
        let _ = io::stdout().flush();
    }

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(error = %err, "failed to read input");
                break;
            }
        };

        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            match controller.run_line(trimmed) {
                Ok(Outcome::Quit) => break,
                Ok(outcome) => report(outcome, controller.session_mut()),
                Err(err) => eprintln!("error: {err}"),
            }
        }

        if prompt {
            print!("> ");
            let _ = io::stdout().flush();
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match AbacusConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log.filter);

    let engine: Box<dyn ArithmeticEngine> = if args.offline {
        info!(base = args.base, "using in-process engine");
        Box::new(LocalEngine::with_base(args.base))
    } else {
        info!(url = %config.engine.base_url, "using HTTP engine");
        Box::new(HttpEngine::new(&config.engine))
    };

    let mut controller = SessionController::new(engine, &config);
    let interpreter = controller.session_mut().interpreter_mut();
    interpreter.on_text(|word| debug!(word, "word changed"));
    interpreter.on_sum(|sum| debug!(sum, "sum changed"));

    if let Err(err) = controller.refresh() {
        warn!(error = %err, "could not load the engine grid; starting from the default grid");
    }

    let (input, prompt): (Box<dyn BufRead>, bool) = match &args.script {
        Some(path) => match File::open(path) {
            Ok(file) => (Box::new(BufReader::new(file)), false),
            Err(err) => {
                eprintln!("Failed to open script {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => (Box::new(io::stdin().lock()), true),
    };

    run(&mut controller, input, prompt);
    ExitCode::SUCCESS
}
