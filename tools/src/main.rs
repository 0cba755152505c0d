//! journey-runner: headless scenario runner for the onboarding simulator.
//!
//! Usage:
//!   journey-runner --scenario standard --persona salaried_professional --tier T1
//!   journey-runner --scenario idle_timeout --seed 99 --realtime
//!   journey-runner --list
//!   journey-runner --ipc-mode

use anyhow::Result;
use onboarding_core::{
    audit::AuditStore,
    catalog::SimCatalog,
    clock::SimSpeed,
    controller::{SessionController, StepOutcome},
    scenario::ScenarioId,
    snapshot::SessionSnapshot,
    types::Tier,
};
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Start {
        persona: String,
        tier: String,
        scenario: String,
    },
    Advance {
        count: Option<u64>,
    },
    RunToCompletion,
    GetState,
    Reset,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let list_mode = args.iter().any(|a| a == "--list");
    let realtime = args.iter().any(|a| a == "--realtime");
    let fast = args.iter().any(|a| a == "--fast");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let db = str_arg(&args, "--db");
    let persona = str_arg(&args, "--persona").unwrap_or("salaried_professional");
    let tier: Tier = str_arg(&args, "--tier").unwrap_or("T1").parse()?;
    let scenario: ScenarioId = str_arg(&args, "--scenario").unwrap_or("standard").parse()?;

    let catalog = SimCatalog::load(data_dir)?;

    if list_mode {
        println!("Personas:");
        let mut personas: Vec<_> = catalog.personas.values().collect();
        personas.sort_by(|a, b| a.id.cmp(&b.id));
        for p in personas {
            println!("  {:24} {} ({}, ₹{:.0}/month, {})",
                p.id, p.name, p.occupation, p.income, p.preferred_channel);
        }
        println!("Scenarios:");
        for s in ScenarioId::all() {
            println!("  {:18} {}", s.as_str(), s.display_name());
        }
        return Ok(());
    }

    let audit = match db {
        Some(path) => AuditStore::open(path)?,
        None => AuditStore::in_memory()?,
    };
    audit.migrate()?;

    let mut controller = SessionController::new(catalog, audit, seed);

    if ipc_mode {
        return run_ipc_loop(&mut controller);
    }

    let speed = if realtime {
        SimSpeed::Realtime
    } else if fast {
        SimSpeed::Fast
    } else {
        SimSpeed::Instant
    };

    println!("journey-runner");
    println!("  seed:      {seed}");
    println!("  persona:   {persona}");
    println!("  tier:      {tier}");
    println!("  scenario:  {scenario}");
    println!();

    let session_id = controller.start(persona, tier, scenario)?;
    controller.set_speed(speed);
    drive(&mut controller)?;
    print_summary(&controller, &session_id)?;

    Ok(())
}

/// Step the run to completion, sleeping per the pacing hint and printing
/// journal entries as they land.
fn drive(controller: &mut SessionController) -> Result<()> {
    let mut printed_messages = 0;
    let mut printed_events = 0;

    while let Some(pending) = controller.begin_step()? {
        let sleep_ms = controller
            .run()
            .map(|run| run.clock.real_delay_ms(pending.delay_ms()))
            .unwrap_or(0);
        if sleep_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(sleep_ms));
        }

        if let StepOutcome::Applied { .. } = controller.commit_step(pending)? {
            if let Some(run) = controller.run() {
                for message in &run.journal.messages()[printed_messages..] {
                    println!("  [{:?}] {}", message.speaker, message.content);
                }
                printed_messages = run.journal.messages().len();
                for event in &run.journal.events()[printed_events..] {
                    println!("  == {} ({}): {}", event.title, event.phase.as_str(), event.description);
                }
                printed_events = run.journal.events().len();
            }
        }
    }
    Ok(())
}

fn print_summary(controller: &SessionController, session_id: &str) -> Result<()> {
    let snapshot = SessionSnapshot::capture(controller)?;
    println!();
    println!("Session {session_id}: {:?}", snapshot.state);
    if let Some(breakdown) = &snapshot.score_breakdown {
        println!(
            "  lead score: {}/{} (base {} x {} tier x {} penalty)",
            breakdown.display_score,
            breakdown.scale,
            breakdown.base_score,
            breakdown.tier_multiplier,
            breakdown.drop_off_penalty
        );
    }
    if let Some(verdict) = &snapshot.incentive {
        println!(
            "  incentive: {} ₹{:.0} (max ₹{:.0}, compliant={})",
            verdict.incentive.incentive_type,
            verdict.incentive.amount,
            verdict.max_allowed,
            verdict.is_compliant
        );
    }
    if !snapshot.fields.is_empty() {
        println!("  form:");
        for field in &snapshot.fields {
            println!("    {:10} {:10?} '{}'", field.id, field.status, field.value);
        }
        println!(
            "  metrics: {} completed, {} errors, {} assists, {}s active",
            snapshot.metrics.fields_completed,
            snapshot.metrics.errors_encountered,
            snapshot.metrics.assists_provided,
            snapshot.metrics.active_time_secs
        );
    }
    if !snapshot.admin_log.is_empty() {
        println!("  admin log:");
        for entry in &snapshot.admin_log {
            println!("    {} {} {}", entry.at.to_rfc3339(), entry.event, entry.data);
        }
    }
    Ok(())
}

fn run_ipc_loop(controller: &mut SessionController) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{err_json}")?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Start { persona, tier, scenario } => {
                match start_from_strings(controller, &persona, &tier, &scenario) {
                    Ok(session_id) => serde_json::json!({ "ok": { "session_id": session_id } }),
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                }
            }
            IpcCommand::Advance { count } => {
                let mut applied = 0u64;
                let mut error = None;
                for _ in 0..count.unwrap_or(1) {
                    match controller.advance() {
                        Ok(StepOutcome::Applied { .. }) => applied += 1,
                        Ok(_) => break,
                        Err(e) => {
                            error = Some(e.to_string());
                            break;
                        }
                    }
                }
                match error {
                    None => serde_json::json!({ "ok": { "applied": applied } }),
                    Some(e) => serde_json::json!({ "error": e, "applied": applied }),
                }
            }
            IpcCommand::RunToCompletion => match controller.run_to_completion() {
                Ok(state) => serde_json::json!({ "ok": { "state": state } }),
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            IpcCommand::GetState => match SessionSnapshot::capture(controller) {
                Ok(snapshot) => serde_json::to_value(&snapshot)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            IpcCommand::Reset => match controller.reset() {
                Ok(()) => serde_json::json!({ "ok": "reset" }),
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
        };

        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn start_from_strings(
    controller: &mut SessionController,
    persona: &str,
    tier: &str,
    scenario: &str,
) -> Result<String> {
    let tier: Tier = tier.parse()?;
    let scenario: ScenarioId = scenario.parse()?;
    Ok(controller.start(persona, tier, scenario)?)
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
