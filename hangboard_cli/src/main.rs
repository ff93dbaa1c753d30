use clap::{ArgAction, Args, Parser, Subcommand};
use hangboard_core::*;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "hangboard")]
#[command(about = "Guided hangboard training sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Dataset file to use instead of the built-in catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every protocol, intensity level and duration in the catalog
    Protocols,

    /// Show the exercises and warm-ups for a session without starting it
    Plan {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Run a guided session (p = pause, s = skip phase, n = next item, f = finish)
    Run {
        #[command(flatten)]
        session: SessionArgs,

        /// Clock tick length in milliseconds (overrides config)
        #[arg(long)]
        tick_ms: Option<u64>,
    },
}

#[derive(Args, Clone)]
struct SessionArgs {
    /// Protocol name, e.g. "Short Maximal Hangs"
    #[arg(long)]
    protocol: String,

    /// Intensity level (low, medium, high)
    #[arg(long)]
    intensity: IntensityLevel,

    /// Session length in minutes
    #[arg(long)]
    duration: u32,

    /// Include a warm-up
    #[arg(long, conflicts_with = "no_warmup")]
    warmup: bool,

    /// Skip the warm-up
    #[arg(long)]
    no_warmup: bool,

    /// Seed for warm-up selection (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Prep seconds before each item (overrides config)
    #[arg(long)]
    prep: Option<u32>,
}

impl SessionArgs {
    fn filter(&self) -> Filter {
        Filter::new(self.protocol.clone(), self.intensity, self.duration)
    }

    fn wants_warmup(&self, config: &Config) -> bool {
        if self.warmup {
            true
        } else if self.no_warmup {
            false
        } else {
            config.session.warmup
        }
    }

    fn rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    hangboard_core::logging::init(hangboard_core::logging::level_for(cli.verbose, cli.quiet))?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Load catalog: explicit dataset files must validate cleanly
    let dataset = cli.catalog.clone().or_else(|| config.catalog.path.clone());
    let loaded;
    let catalog: &Catalog = match dataset {
        Some(path) => {
            loaded = Catalog::load_from(&path)?;
            loaded.ensure_valid()?;
            &loaded
        }
        None => default_catalog()?,
    };

    match cli.command {
        Commands::Protocols => cmd_protocols(catalog),
        Commands::Plan { session } => {
            if let Some(prep) = session.prep {
                config.session.prep_seconds = prep;
            }
            cmd_plan(catalog, &session, &config)
        }
        Commands::Run { session, tick_ms } => {
            if let Some(prep) = session.prep {
                config.session.prep_seconds = prep;
            }
            if let Some(tick_ms) = tick_ms {
                config.session.tick_millis = tick_ms;
            }
            config.validate()?;
            cmd_run(catalog, &session, &config).await
        }
    }
}

fn cmd_protocols(catalog: &Catalog) -> Result<()> {
    for protocol in catalog.protocol_names() {
        println!("{}", protocol);
        for (level, durations) in &catalog.protocols[protocol] {
            let minutes: Vec<String> = durations.keys().map(|m| format!("{} min", m)).collect();
            println!("  {:<8} {}", level, minutes.join(", "));
        }
    }
    Ok(())
}

fn cmd_plan(catalog: &Catalog, args: &SessionArgs, config: &Config) -> Result<()> {
    let filter = args.filter();
    let exercises = select_exercises(catalog, &filter)?;
    let prep = config.session.prep_seconds;

    println!(
        "{} / {} / {} min",
        filter.protocol, filter.intensity, filter.duration
    );

    if args.wants_warmup(config) {
        let budget = warmup_budget_seconds(filter.duration);
        let warmups = select_warmups(catalog.warmup_pool(), budget, &mut *args.rng());

        println!();
        println!("Warm-up (budget {})", format_clock(budget));
        display_items(&warmups);
        println!(
            "  Warm-up total: {}",
            format_clock(estimate_total(&warmups, prep))
        );
    }

    println!();
    println!("Workout");
    display_items(&exercises);
    println!(
        "  Workout total: {}",
        format_clock(estimate_total(&exercises, prep))
    );

    Ok(())
}

async fn cmd_run(catalog: &Catalog, args: &SessionArgs, config: &Config) -> Result<()> {
    // Resolve everything before any clock starts
    let filter = args.filter();
    let exercises = select_exercises(catalog, &filter)?;
    let warmups = if args.wants_warmup(config) {
        let budget = warmup_budget_seconds(filter.duration);
        select_warmups(catalog.warmup_pool(), budget, &mut *args.rng())
    } else {
        Vec::new()
    };

    let mut input = spawn_input_reader();
    let tick = config.session.tick();

    if !warmups.is_empty() {
        println!("── Warm-up ──");
        let session = Session::new(&warmups, config.session.session_config(SessionKind::Warmup));
        let report = drive(session, tick, &mut input).await?;
        print_report(&report);
    }

    let session = Session::new(
        &exercises,
        config.session.session_config(SessionKind::Workout),
    );
    if session.is_finished() {
        println!("Nothing to do for this selection.");
        return Ok(());
    }

    println!("── Workout ──");
    let report = drive(session, tick, &mut input).await?;
    print_report(&report);
    Ok(())
}

/// Run one session to the end, echoing updates and forwarding keyboard commands
async fn drive(
    session: Session,
    tick: Duration,
    input: &mut Option<mpsc::UnboundedReceiver<String>>,
) -> Result<SessionReport> {
    let mut handle = SessionHandle::spawn(session, tick);
    let mut cues = CueTracker::new();
    let mut player = TerminalCues;

    loop {
        tokio::select! {
            update = handle.next_update() => match update {
                Some(snapshot) => {
                    cues.drive(&snapshot, &mut player);
                    print_status(&snapshot);
                }
                None => break,
            },
            line = next_line(input) => match line {
                Some(line) => handle_input(&handle, line.trim()),
                // EOF: keep running without keyboard control
                None => *input = None,
            },
        }
    }

    handle.wait().await
}

async fn next_line(input: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match input {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Read stdin on a plain thread so a pending read never holds up shutdown
fn spawn_input_reader() -> Option<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    Some(rx)
}

fn handle_input(handle: &SessionHandle, input: &str) {
    let command = match input.to_lowercase().as_str() {
        "p" => Command::TogglePause,
        "s" => Command::SkipPhase,
        "n" => Command::SkipItem,
        "f" | "q" => Command::FinishEarly,
        "" => return,
        other => {
            eprintln!("Unknown command '{}': p = pause, s = skip phase, n = next item, f = finish", other);
            return;
        }
    };
    handle.send(command);
}

fn display_items(items: &[TimedItem]) {
    if items.is_empty() {
        println!("  (nothing selected)");
        return;
    }
    for (idx, item) in items.iter().enumerate() {
        println!("  {}. {} @ {}", idx + 1, item.label, item.secondary_label);
        println!(
            "     {} x {}s, {}s rest | {} set(s), {}s between sets | {}",
            item.reps,
            item.work_seconds,
            item.rest_between_reps,
            item.sets,
            item.rest_between_sets,
            format_clock(item_seconds(item))
        );
        if !item.intensity_note.is_empty() {
            println!("     {}", item.intensity_note);
        }
    }
}

fn print_status(snapshot: &SessionSnapshot) {
    if snapshot.phase == Phase::Finished {
        println!("{:<20} total {}", snapshot.phase_label, snapshot.total_clock);
        return;
    }
    println!(
        "{:<20} {}  total {}  item {}/{} set {}/{} rep {}/{}  {} @ {}{}",
        snapshot.phase_label,
        snapshot.phase_clock,
        snapshot.total_clock,
        snapshot.item_index + 1,
        snapshot.item_count,
        snapshot.set,
        snapshot.set_count,
        snapshot.rep,
        snapshot.rep_count,
        snapshot.label,
        snapshot.secondary_label,
        if snapshot.paused { "  [paused]" } else { "" }
    );
}

fn print_report(report: &SessionReport) {
    let elapsed = (report.finished_at - report.started_at).num_seconds().max(0) as u32;
    if report.completed_naturally {
        println!("✓ {} complete in {}", report.kind.as_str(), format_clock(elapsed));
    } else {
        println!("{} finished early after {}", report.kind.as_str(), format_clock(elapsed));
    }
    if report.items_skipped > 0 {
        println!(
            "  Skipped {} of {} item(s)",
            report.items_skipped, report.items_total
        );
    }
}

/// Cue playback for a terminal: a bell for the countdown
struct TerminalCues;

impl CuePlayer for TerminalCues {
    fn play(&mut self, cue: Cue) {
        match cue {
            Cue::Countdown => eprint!("\x07"),
            Cue::StartRestLoop => tracing::debug!("Rest cue started"),
            Cue::StopRestLoop => tracing::debug!("Rest cue stopped"),
        }
    }
}
