//! Command-line runner for seeded demo campaigns.

mod scenario;

use std::env;
use std::sync::Arc;

use contracts::{ActionOutcome, EngineConfig, TurnLogEntry};
use ironveil_core::director::Director;
use tracing_subscriber::EnvFilter;

use crate::scenario::{demo_knowledge, demo_world, DoctrineDecider};

fn print_usage() {
    println!("ironveil <command>");
    println!("commands:");
    println!("  demo [turns]");
    println!("    runs the bundled border-skirmish campaign (seed 1337)");
    println!("  run <seed> [turns]");
    println!("    runs the campaign with an explicit seed");
    println!("  replay-check <seed> [turns]");
    println!("    runs the same campaign twice and compares replay hashes");
}

fn parse_u64(value: Option<&String>, label: &str) -> Result<u64, String> {
    let raw = value.ok_or_else(|| format!("missing {label}"))?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid {label}: {raw}"))
}

fn parse_turns(value: Option<&String>) -> Result<u64, String> {
    match value {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| format!("invalid turns: {raw}")),
        None => Ok(12),
    }
}

fn build_director(seed: u64, turns: u64) -> Director {
    let mut config = EngineConfig::default();
    config.seed = seed;
    config.max_turns = turns;
    config.worker_threads = 2;

    let (world, personas) = demo_world();
    Director::new(
        config,
        world,
        personas,
        Arc::new(demo_knowledge()),
        Arc::new(DoctrineDecider),
    )
}

fn outcome_note(entry: &TurnLogEntry) -> String {
    match &entry.outcome {
        ActionOutcome::Applied { .. } => "applied".to_string(),
        ActionOutcome::Repaired { original_code, .. } => {
            format!("repaired after {original_code}")
        }
        ActionOutcome::Rejected { code, .. } => format!("rejected with {code}"),
        ActionOutcome::DecisionFailed { reason } => format!("no decision: {reason}"),
        ActionOutcome::SystemError { reason } => format!("system error: {reason}"),
    }
}

fn run_campaign(seed: u64, turns: u64) {
    let mut director = build_director(seed, turns);
    let committed = director.step_n(turns);

    for entry in director.log().entries() {
        println!(
            "turn {:>3} seq {:>2}  {:<12} {:<24} [{}]",
            entry.turn,
            entry.sequence_in_turn,
            entry.persona_id,
            entry.summary,
            outcome_note(entry)
        );
    }
    println!(
        "campaign complete: seed={} turns={}/{} entries={} replay_hash={:016x}",
        seed,
        committed,
        turns,
        director.log().len(),
        director.replay_hash()
    );
}

fn replay_check(seed: u64, turns: u64) -> bool {
    let mut first = build_director(seed, turns);
    let mut second = build_director(seed, turns);
    first.step_n(turns);
    second.step_n(turns);

    let matched = first.replay_hash() == second.replay_hash();
    println!(
        "replay-check seed={} turns={} first={:016x} second={:016x} {}",
        seed,
        turns,
        first.replay_hash(),
        second.replay_hash(),
        if matched { "MATCH" } else { "DIVERGED" }
    );
    matched
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("demo") => match parse_turns(args.get(2)) {
            Ok(turns) => run_campaign(1337, turns),
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        Some("run") => {
            match (parse_u64(args.get(2), "seed"), parse_turns(args.get(3))) {
                (Ok(seed), Ok(turns)) => run_campaign(seed, turns),
                (Err(err), _) | (_, Err(err)) => {
                    eprintln!("error: {err}");
                    print_usage();
                    std::process::exit(2);
                }
            }
        }
        Some("replay-check") => {
            match (parse_u64(args.get(2), "seed"), parse_turns(args.get(3))) {
                (Ok(seed), Ok(turns)) => {
                    if !replay_check(seed, turns) {
                        std::process::exit(1);
                    }
                }
                (Err(err), _) | (_, Err(err)) => {
                    eprintln!("error: {err}");
                    print_usage();
                    std::process::exit(2);
                }
            }
        }
        _ => {
            print_usage();
        }
    }
}
