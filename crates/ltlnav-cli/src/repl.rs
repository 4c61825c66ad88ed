//! REPL – operator console for a running planner.
//!
//! Supported slash-commands:
//!   /activate        – publish `planner_active = true`
//!   /deactivate      – publish `planner_active = false`
//!   /status          – controller state, active goal and next move
//!   /plan            – print the synthesized prefix and suffix
//!   /pose X Y [YAW]  – publish a pose estimate, as localization would
//!   /help            – show this list
//!   /quit | /exit    – deactivate and exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use ltlnav_middleware::EventBus;
use ltlnav_runtime::{ActivationOutcome, ControllerState, PlanExecutionController};
use ltlnav_types::{EventPayload, Pose, PoseEstimate, Position, Quaternion, Run, TaskSpec, Waypoint};

/// Event source tag for everything the console publishes.
const SOURCE: &str = "ltlnav-cli::repl";

/// Everything the console needs from the running planner.
pub struct Session {
    pub bus: Arc<EventBus>,
    pub controller: Arc<PlanExecutionController>,
    pub plan: Run,
    pub task: TaskSpec,
    pub robot_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Activate,
    Deactivate,
    Status,
    Plan,
    Pose(Pose),
    Help,
    Quit,
}

/// Parse one input line.  `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let command = match head {
        "/activate" => Command::Activate,
        "/deactivate" => Command::Deactivate,
        "/status" => Command::Status,
        "/plan" => Command::Plan,
        "/pose" => Command::Pose(parse_pose(words.collect())?),
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => return Err(format!("Unknown command: '{other}'")),
    };
    Ok(Some(command))
}

fn parse_pose(args: Vec<&str>) -> Result<Pose, String> {
    if !(2..=3).contains(&args.len()) {
        return Err("usage: /pose X Y [YAW]".to_string());
    }
    let numbers = args
        .iter()
        .map(|a| a.parse::<f64>().map_err(|_| format!("'{a}' is not a number")))
        .collect::<Result<Vec<_>, _>>()?;
    let yaw = numbers.get(2).copied().unwrap_or(0.0);
    Ok(Pose::new(
        Position::new(numbers[0], numbers[1], 0.0),
        Quaternion::from_yaw(yaw),
    ))
}

/// Entry point for the interactive console.  Returns on `/quit` or EOF.
pub fn run(session: &Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", format!("{}>", session.robot_name).bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        match parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => {
                deactivate(&session.bus, &session.controller);
                println!("{}", "Goodbye.".green());
                break;
            }
            Ok(Some(command)) => execute(session, command),
            Err(e) => println!(
                "{} Type {} for available commands.",
                e.red(),
                "/help".bold()
            ),
        }
    }
}

fn execute(session: &Session, command: Command) {
    match command {
        Command::Activate => {
            publish(session, EventPayload::Activation(true));
            println!("  {} planner activation requested", "▶".green());
        }
        Command::Deactivate => {
            publish(session, EventPayload::Activation(false));
            println!("  {} planner deactivated (in-flight goal keeps running)", "■".yellow());
        }
        Command::Status => cmd_status(session),
        Command::Plan => cmd_plan(session),
        Command::Pose(pose) => {
            publish(session, EventPayload::Pose(PoseEstimate::at(pose)));
            println!("  pose estimate published at {}", fmt_waypoint(&pose).dimmed());
        }
        Command::Help => cmd_help(),
        Command::Quit => {}
    }
}

/// Deactivate the controller directly, then announce it on the bus.
///
/// Used on the way out, when the planner task may never drain the
/// activation topic again.
pub fn deactivate(bus: &EventBus, controller: &PlanExecutionController) -> ActivationOutcome {
    let outcome = match controller.set_active(false) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("{}: {}", "Deactivation error".red(), e);
            return ActivationOutcome::Unchanged;
        }
    };
    if let Err(e) = bus.emit(SOURCE, EventPayload::Activation(false)) {
        println!("{}: {}", "Bus error".red(), e);
    }
    outcome
}

fn publish(session: &Session, payload: EventPayload) {
    if let Err(e) = session.bus.emit(SOURCE, payload) {
        println!("{}: {}", "Bus error".red(), e);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "ltlnav Commands".bold().underline());
    println!("  {}        – start dispatching goals", "/activate".bold().cyan());
    println!("  {}      – stop dispatching goals", "/deactivate".bold().cyan());
    println!("  {}          – controller state and current goal", "/status".bold().cyan());
    println!("  {}            – synthesized prefix and suffix", "/plan".bold().cyan());
    println!("  {} – publish a pose estimate", "/pose X Y [YAW]".bold().cyan());
    println!("  {}     – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_status(session: &Session) {
    let status = session.controller.status();
    let state = match status.state {
        ControllerState::Dormant => "DORMANT".yellow(),
        ControllerState::Dispatching => "DISPATCHING".cyan(),
        ControllerState::AwaitingArrival => "AWAITING ARRIVAL".green(),
        ControllerState::Faulted => "FAULTED".red().bold(),
    };
    println!("{}", "Planner Status".bold().underline());
    println!("  State       : {}", state);
    println!("  Active flag : {}", status.active);
    if let Some(elapsed) = status.epoch_elapsed {
        println!("  Running for : {:.1}s", elapsed.as_secs_f64());
    }
    match &status.active_goal {
        Some(goal) => println!(
            "  Active goal : #{} {} (sent {:.1}s ago)",
            goal.sequence_id(),
            fmt_waypoint(goal.waypoint()),
            goal.sent_at.elapsed().as_secs_f64()
        ),
        None => println!("  Active goal : {}", "none".dimmed()),
    }
    println!(
        "  Next move   : #{} {}",
        status.next_move.progress_index,
        fmt_waypoint(&status.next_move.waypoint)
    );
    if let Some(fault) = status.fault {
        println!("  Fault       : {}", fault.to_string().red());
    }
}

fn cmd_plan(session: &Session) {
    println!("{}", "Synthesized Run".bold().underline());
    println!("  Hard task : {}", session.task.hard_task.yellow());
    println!("  Soft task : {}", session.task.soft_task.yellow());
    println!("  Prefix ({}):", session.plan.prefix().len());
    for (i, wp) in session.plan.prefix().iter().enumerate() {
        println!("    {:>3}  {}", i, fmt_waypoint(wp));
    }
    println!("  Suffix ({}, repeated):", session.plan.suffix().len());
    for (i, wp) in session.plan.suffix().iter().enumerate() {
        println!("    {:>3}  {}", i, fmt_waypoint(wp));
    }
}

fn fmt_waypoint(wp: &Waypoint) -> String {
    let p = wp.position;
    format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
}
