//! `ltlnav-cli` – operator entry point for the plan execution core.
//!
//! 1. Loads `~/.ltlnav/config.toml` (writing the defaults on first run) and
//!    applies `LTLNAV_*` overrides.
//! 2. Loads the plan file and runs the [`PlannerNode`] startup sequence,
//!    optionally against a simulated robot.
//! 3. Drops the operator into a console to toggle activation and inspect
//!    progress.
//! 4. Intercepts **Ctrl-C** to deactivate the planner and exit.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use tracing::{error, info, warn};

use ltlnav_middleware::{EventBus, MoveBaseAdapter, SimulatedBase};
use ltlnav_runtime::{PlannerNode, ReplaySynthesizer, telemetry};
use ltlnav_types::NavError;

fn main() {
    let _guard = telemetry::init_tracing("ltlnav");

    print_banner();
    let cfg = load_config();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red(), e);
            std::process::exit(1);
        }
    };

    let bus = Arc::new(EventBus::default());
    let started = runtime.block_on(start_planner(&cfg, Arc::clone(&bus)));
    let (node, sim) = match started {
        Ok(parts) => parts,
        Err(e) => {
            error!(error = %e, "planner failed to start");
            println!("{} {}", "✗ Startup failed:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let session = repl::Session {
        bus: Arc::clone(&bus),
        controller: node.controller(),
        plan: node.plan().clone(),
        task: node.task().clone(),
        robot_name: cfg.robot_name.clone(),
    };
    let planner = runtime.spawn(node.run());

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let bus_ctrlc = Arc::clone(&bus);
    let controller_ctrlc = Arc::clone(&session.controller);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – deactivating planner …".yellow().bold());
        repl::deactivate(&bus_ctrlc, &controller_ctrlc);
        println!("{}", "  ✓ Planner deactivated; in-flight goal left running.".green());
        println!("{}", "  ✓ Exiting ltlnav.".green());
        std::process::exit(0);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    println!(
        "  Planner {} – type {} to start, {} for all commands.\n",
        "ready".green().bold(),
        "/activate".bold().cyan(),
        "/help".bold().cyan()
    );
    repl::run(&session);

    planner.abort();
    if let Some(sim) = sim {
        sim.abort();
    }
    info!("ltlnav shut down");
}

/// Load the synthesizer, wire the navigation adapter and run startup.
async fn start_planner(
    cfg: &config::Config,
    bus: Arc<EventBus>,
) -> Result<(PlannerNode, Option<tokio::task::JoinHandle<()>>), NavError> {
    let synthesizer = ReplaySynthesizer::from_path(&cfg.plan_path)?;
    let adapter = Arc::new(MoveBaseAdapter::new(Arc::clone(&bus), "move_base"));

    let sim = if cfg.simulate {
        println!(
            "  Simulated base: {} per goal",
            format!("{} ms", cfg.sim_travel_ms).yellow()
        );
        Some(SimulatedBase::new(Arc::clone(&bus), cfg.sim_travel()).spawn())
    } else {
        println!(
            "  No simulation: publish poses with {}",
            "/pose X Y [YAW]".bold()
        );
        None
    };
    if cfg.server_ready_at_startup() {
        adapter.mark_server_ready();
    } else {
        println!(
            "  Waiting up to {} for the navigation server …",
            format!("{} s", cfg.server_timeout_secs).yellow()
        );
    }

    println!(
        "  Collecting tasks for {} ms …",
        cfg.startup_window_ms.to_string().yellow()
    );
    let node = PlannerNode::start(bus, Box::new(synthesizer), adapter, cfg.node_config()).await?;
    Ok((node, sim))
}

fn load_config() -> config::Config {
    let mut cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };
    config::apply_env_overrides(&mut cfg);
    cfg
}

fn print_banner() {
    println!();
    println!("{}", r#"   __  __  __              "#.bold().cyan());
    println!("{}", r#"  / / / /_/ /___  ___ __  __"#.bold().cyan());
    println!("{}", r#" / / / __/ / __ \/ _ `/ |/ /"#.bold().cyan());
    println!("{}", r#"/_/  \__/_/_/ /_/\_,_/|___/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "ltlnav".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Temporal-logic plan execution");
    println!();
}
