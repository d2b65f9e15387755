//! `rover` – run behavior goals against a simulated rover.
//!
//! ```text
//! rover run [--goal NAME]... [--seed N] [--secs N] [--rays N] [--realtime] [--json]
//! rover config show
//! rover config init [--force]
//! ```
//!
//! `run` loads `~/.rover/config.toml` (defaults when absent), lets command
//! line flags override it, registers the chosen goals with a
//! [`GoalScheduler`], and plays the agent controller with a small simulated
//! world.  By default the run uses virtual time and finishes instantly;
//! `--realtime` paces passes on the wall clock and stops on Ctrl-C.

mod config;
mod world;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rover_hal::{ActionChannel, ActionOutbox, SimSensor};
use rover_runtime::{GoalCore, GoalKind, GoalReport, GoalScheduler, init_tracing};
use rover_types::RoverError;
use tracing::{info, warn};

use crate::config::Config;
use crate::world::SimWorld;

/// Capacity of the action queue between the goals and the simulated
/// controller.
const OUTBOX_CAPACITY: usize = 64;

#[derive(Parser)]
#[command(name = "rover", version, about = "Behavior goals for an autonomous rover")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run goals against the simulated world.
    Run(RunArgs),
    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Goal to schedule (repeatable): forward-stop, turn, roam, avoid, idle.
    #[arg(long = "goal", value_name = "NAME")]
    goals: Vec<GoalKind>,
    /// Seed every random source for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    /// Run length in seconds.
    #[arg(long)]
    secs: Option<u64>,
    /// Number of sensor rays.
    #[arg(long)]
    rays: Option<usize>,
    /// Pace passes on the wall clock instead of virtual time.
    #[arg(long)]
    realtime: bool,
    /// Print the action log and goal reports as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing("rover");

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Config { action } => config_command(action),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// rover run
// ─────────────────────────────────────────────────────────────────────────────

/// Layer the `run` flags over the loaded config and validate the result.
fn merge_run_args(mut cfg: Config, args: &RunArgs) -> Result<Config, RoverError> {
    if !args.goals.is_empty() {
        cfg.goals = args.goals.clone();
    }
    if let Some(seed) = args.seed {
        cfg.seed = Some(seed);
    }
    if let Some(secs) = args.secs {
        cfg.run_secs = secs;
    }
    if let Some(rays) = args.rays {
        cfg.ray_count = rays;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run(args: RunArgs) -> Result<(), RoverError> {
    let cfg = merge_run_args(config::load()?, &args)?;

    if !args.json {
        print_banner();
    }

    let sensor = Arc::new(SimSensor::new(cfg.ray_count));
    let (outbox, rx, executing) = ActionOutbox::new("rover", OUTBOX_CAPACITY);
    let outbox: Arc<dyn ActionChannel> = Arc::new(outbox);

    let world_rng = cfg
        .seed
        .map_or_else(StdRng::from_entropy, |s| StdRng::seed_from_u64(s.wrapping_add(1)));
    let mut world = SimWorld::new(
        sensor.clone(),
        cfg.ray_count,
        rx,
        executing,
        world_rng,
        (cfg.obstacle_min_passes, cfg.obstacle_max_passes),
    );

    let mut scheduler = GoalScheduler::new(cfg.timing);
    for (i, kind) in cfg.goals.iter().enumerate() {
        let name = if cfg.goals.len() > 1 {
            format!("{kind}-{i}")
        } else {
            kind.to_string()
        };
        let core = GoalCore::new(name, outbox.clone(), sensor.clone());
        let mut options = cfg.goal_options();
        options.seed = options.seed.map(|s| s.wrapping_add(100 + i as u64));
        scheduler.add(kind.build(core, cfg.timing, options));
    }

    let horizon = Duration::from_secs(cfg.run_secs);
    info!(goals = ?cfg.goals, rays = cfg.ray_count, seed = ?cfg.seed, ?horizon, "run starting");

    let passes = if args.realtime {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            println!();
            println!("{}", "⚠  Ctrl-C received – stopping goals …".yellow().bold());
            flag.store(true, Ordering::Release);
        }) {
            warn!(error = %e, "failed to install Ctrl-C handler");
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| RoverError::Config(format!("failed to start tokio runtime: {e}")))?;
        runtime.block_on(scheduler.run_realtime(horizon, shutdown, |now| world.on_pass(now)))
    } else {
        scheduler.run_for(horizon, |now| world.on_pass(now))
    };

    let reports = scheduler.reports();
    if args.json {
        let out = serde_json::json!({
            "passes": passes,
            "blocked_by": world.blocked(),
            "actions": world.log(),
            "goals": reports,
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| RoverError::Serialization(e.to_string()))?;
        println!("{text}");
    } else {
        print_action_log(&world);
        print_reports(&reports, passes);
    }
    Ok(())
}

fn print_action_log(world: &SimWorld) {
    println!("  {}", "Actions".bold());
    if world.log().is_empty() {
        println!("    {}", "(none)".dimmed());
    }
    for entry in world.log() {
        println!(
            "    {:>8} ms  {}  {}",
            entry.at_ms,
            entry.token.to_string().bold(),
            entry.source.dimmed()
        );
    }
    if let Some(obstacle) = world.blocked() {
        println!("    {}", format!("ended facing obstacle: {obstacle:?}").yellow());
    }
    println!();
}

fn print_reports(reports: &[GoalReport], passes: u64) {
    println!("  {} {}", "Goals".bold(), format!("after {passes} passes").dimmed());
    for r in reports {
        let status = match (&r.aborted, r.terminal) {
            (Some(e), _) => format!("aborted: {e}").red(),
            (None, true) => r.state.green(),
            (None, false) => r.state.cyan(),
        };
        println!(
            "    {:<16} {:<24} updates {:>6}  pending {}",
            r.name.bold(),
            status,
            r.updates,
            r.pending
        );
    }
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// rover config
// ─────────────────────────────────────────────────────────────────────────────

fn config_command(action: ConfigAction) -> Result<(), RoverError> {
    let path = config::config_path();
    match action {
        ConfigAction::Show => {
            let cfg = config::load()?;
            cfg.validate()?;
            println!("# {}", path.display().to_string().dimmed());
            print!("{}", config::to_toml(&cfg)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(RoverError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            config::save(&Config::default())?;
            println!(
                "  {} Config saved to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("  {} {}", "rover".bold().cyan(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Behavior goals on a simulated corridor");
    println!();
}
