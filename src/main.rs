//! iou-netting CLI
//!
//! Resolve IOUs against a ledger file from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show how an IOU would be resolved
//! iou-netting resolve --input ledger.json --debtor alice --creditor bob --amount 10
//!
//! # Record it, netting any cycle it closes
//! iou-netting resolve --input ledger.json --debtor alice --creditor bob --amount 10 --apply
//!
//! # List debts
//! iou-netting debts --input ledger.json --participant alice
//!
//! # Generate a random ledger for testing
//! iou-netting generate --participants 10 --debts 30
//! ```

use iou_netting::core::iou::{Amount, DebtEdge, ProposedIou};
use iou_netting::core::participant::Participant;
use iou_netting::graph::ledger::DebtLedger;
use iou_netting::resolution::resolver::{CycleResolver, Resolution};
use iou_netting::simulation::stress_test::{generate_random_ledger, NetworkConfig};
use std::process;

fn print_usage() {
    eprintln!(
        r#"iou-netting — pairwise IOU ledger with debt cycle netting

USAGE:
    iou-netting <COMMAND> [OPTIONS]

COMMANDS:
    resolve     Resolve a proposed IOU against a ledger file
    debts       List the debts in a ledger file
    generate    Generate a random ledger (for testing)
    help        Show this message

OPTIONS (resolve):
    --input <FILE>      Path to JSON ledger file
    --debtor <ID>       Participant taking on the debt
    --creditor <ID>     Participant being owed
    --amount <N>        Positive whole amount
    --apply             Record the IOU and write the updated ledger
    --memo <TEXT>       Note stored with the recorded IOU (with --apply)
    --output <FILE>     Where to write the updated ledger (default: --input)
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (debts):
    --input <FILE>      Path to JSON ledger file
    --participant <ID>  Only debts owed by or to this participant
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --participants <N>  Number of participants (default: 10)
    --debts <N>         Number of distinct debts (default: 30)
    --max-amount <N>    Largest single debt (default: 1000)
    --output <FILE>     Write to file instead of stdout

Set RUST_LOG=debug to trace the cycle search.

EXAMPLES:
    iou-netting resolve --input ledger.json --debtor alice --creditor bob --amount 10
    iou-netting resolve --input ledger.json --debtor alice --creditor bob --amount 10 --apply
    iou-netting debts --input ledger.json --participant alice --format json
    iou-netting generate --participants 5 --debts 12 --output ledger.json"#
    );
}

#[derive(serde::Serialize)]
struct ResolveOutput<'a> {
    debtor: &'a Participant,
    creditor: &'a Participant,
    amount: Amount,
    resolution: &'a Resolution,
    applied: bool,
}

#[derive(serde::Serialize)]
struct DebtsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    participant: Option<Participant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_owed: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_owed_to: Option<Amount>,
    debts: Vec<DebtEdge>,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn load_ledger(path: &str) -> DebtLedger {
    DebtLedger::load(path).unwrap_or_else(|e| {
        eprintln!("Error loading ledger '{}': {}", path, e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "participants": ["alice", "bob"],
  "debts": [
    {{ "debtor": "alice", "creditor": "bob", "amount": 10 }}
  ]
}}"#
        );
        process::exit(1);
    })
}

fn required(value: Option<String>, flag: &str) -> String {
    value.unwrap_or_else(|| fail(format!("{} is required", flag)))
}

fn next_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    args.get(*i)
        .cloned()
        .unwrap_or_else(|| fail(format!("{} requires a value", flag)))
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> T {
    value
        .parse()
        .unwrap_or_else(|_| fail(format!("{} requires a non-negative whole number, got '{}'", flag, value)))
}

fn parse_participant(value: &str, flag: &str) -> Participant {
    value
        .parse()
        .unwrap_or_else(|e| fail(format!("{}: {}", flag, e)))
}

fn parse_json_flag(format: Option<String>) -> bool {
    match format.as_deref() {
        None | Some("text") => false,
        Some("json") => true,
        Some(other) => fail(format!("unknown format '{}'", other)),
    }
}

fn cmd_resolve(args: &[String]) {
    let mut input = None;
    let mut debtor = None;
    let mut creditor = None;
    let mut amount = None;
    let mut memo = None;
    let mut output = None;
    let mut format = None;
    let mut apply = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => input = Some(next_value(args, &mut i, "--input")),
            "--debtor" => debtor = Some(next_value(args, &mut i, "--debtor")),
            "--creditor" => creditor = Some(next_value(args, &mut i, "--creditor")),
            "--amount" => amount = Some(next_value(args, &mut i, "--amount")),
            "--memo" => memo = Some(next_value(args, &mut i, "--memo")),
            "--output" => output = Some(next_value(args, &mut i, "--output")),
            "--format" => format = Some(next_value(args, &mut i, "--format")),
            "--apply" => apply = true,
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let input = required(input, "--input");
    let debtor = parse_participant(&required(debtor, "--debtor"), "--debtor");
    let creditor = parse_participant(&required(creditor, "--creditor"), "--creditor");
    let amount: Amount = parse_number(&required(amount, "--amount"), "--amount");
    let json = parse_json_flag(format);

    let iou = ProposedIou::new(debtor, creditor, amount)
        .unwrap_or_else(|e| fail(format!("invalid IOU: {}", e)));

    let mut ledger = load_ledger(&input);
    let resolution = if apply {
        let resolution = ledger.record_iou(iou.clone(), memo).resolution().clone();
        let target = output.unwrap_or_else(|| input.clone());
        ledger
            .save(&target)
            .unwrap_or_else(|e| fail(format!("could not write '{}': {}", target, e)));
        eprintln!("Ledger written to {}", target);
        resolution
    } else {
        match CycleResolver::resolve(&ledger, &iou) {
            Ok(resolution) => resolution,
            Err(never) => match never {},
        }
    };

    if json {
        let out = ResolveOutput {
            debtor: iou.debtor(),
            creditor: iou.creditor(),
            amount: iou.amount(),
            resolution: &resolution,
            applied: apply,
        };
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(e),
        }
    } else {
        println!("IOU: {} owes {} {}", iou.debtor(), iou.creditor(), iou.amount());
        print!("{}", resolution);
        if !apply {
            println!("(dry run; pass --apply to record)");
        }
    }
}

fn cmd_debts(args: &[String]) {
    let mut input = None;
    let mut participant = None;
    let mut format = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => input = Some(next_value(args, &mut i, "--input")),
            "--participant" => participant = Some(next_value(args, &mut i, "--participant")),
            "--format" => format = Some(next_value(args, &mut i, "--format")),
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let ledger = load_ledger(&required(input, "--input"));
    let json = parse_json_flag(format);
    let participant = participant.map(|p| parse_participant(&p, "--participant"));

    let output = match &participant {
        Some(p) => {
            let mut debts = ledger.debts_owed_by(p);
            debts.extend(ledger.debts_owed_to(p));
            DebtsOutput {
                participant: Some(p.clone()),
                total_owed: Some(ledger.total_owed(p)),
                total_owed_to: Some(ledger.total_owed_to(p)),
                debts,
            }
        }
        None => DebtsOutput {
            participant: None,
            total_owed: None,
            total_owed_to: None,
            debts: ledger.edges(),
        },
    };

    if json {
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(e),
        }
        return;
    }

    if output.debts.is_empty() {
        println!("No debts recorded.");
    }
    for debt in &output.debts {
        println!("  {} owes {}: {}", debt.debtor, debt.creditor, debt.amount);
    }
    if let (Some(p), Some(owed), Some(owed_to)) =
        (&output.participant, output.total_owed, output.total_owed_to)
    {
        println!("\n{} owes {} in total and is owed {}.", p, owed, owed_to);
    } else {
        println!(
            "\nParticipants: {}   Debts: {}",
            ledger.participant_count(),
            ledger.edge_count()
        );
    }
}

fn cmd_generate(args: &[String]) {
    let mut participants = 10usize;
    let mut debts = 30usize;
    let mut max_amount: Amount = 1_000;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--participants" => {
                participants = parse_number(&next_value(args, &mut i, "--participants"), "--participants")
            }
            "--debts" => debts = parse_number(&next_value(args, &mut i, "--debts"), "--debts"),
            "--max-amount" => {
                max_amount = parse_number(&next_value(args, &mut i, "--max-amount"), "--max-amount")
            }
            "--output" => output_path = Some(next_value(args, &mut i, "--output")),
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let config = NetworkConfig {
        participant_count: participants,
        debt_count: debts,
        max_amount,
        ..Default::default()
    };

    let ledger = generate_random_ledger(&config);

    if let Some(path) = output_path {
        ledger
            .save(&path)
            .unwrap_or_else(|e| fail(format!("could not write '{}': {}", path, e)));
        eprintln!(
            "Generated {} debts across {} participants → {}",
            ledger.edge_count(),
            ledger.participant_count(),
            path
        );
    } else {
        match serde_json::to_string_pretty(&ledger) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "resolve" => cmd_resolve(rest),
        "debts" => cmd_debts(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
