//! Cycle resolution scenarios.
//!
//! Shows which cycle the resolver picks, how the bottleneck is computed and
//! what the caller is asked to write back.

use iou_netting::prelude::*;

fn show(title: &str, ledger: &DebtLedger, debtor: &str, creditor: &str, amount: Amount) {
    println!("━━━ {} ━━━\n", title);
    for edge in ledger.edges() {
        println!("  existing: {} owes {} {}", edge.debtor, edge.creditor, edge.amount);
    }
    println!("  proposed: {} owes {} {}\n", debtor, creditor, amount);
    match resolve(debtor.into(), creditor.into(), amount, ledger) {
        Ok(resolution) => println!("{}", resolution),
        Err(e) => println!("  rejected: {}\n", e),
    }
}

fn ledger(participants: &[&str], debts: &[(&str, &str, Amount)]) -> DebtLedger {
    let mut ledger = DebtLedger::new();
    for id in participants {
        ledger.register(Participant::new(id));
    }
    for (debtor, creditor, amount) in debts {
        if let Err(e) = ledger.set_debt((*debtor).into(), (*creditor).into(), *amount) {
            eprintln!("skipping debt: {}", e);
        }
    }
    ledger
}

fn main() {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  iou-netting: Cycle Resolution Scenarios      ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    show(
        "Three-party cycle",
        &ledger(&["A", "B", "C"], &[("B", "C", 5), ("C", "A", 5)]),
        "A",
        "B",
        10,
    );

    show("No existing debts", &DebtLedger::new(), "A", "B", 7);

    show(
        "Two-party cycle",
        &ledger(&["A", "B"], &[("B", "A", 3)]),
        "A",
        "B",
        5,
    );

    // The direct route back has a small bottleneck, the long one a large
    // bottleneck; the shortest cycle is netted.
    show(
        "Shortest cycle wins",
        &ledger(
            &["A", "B", "C", "D"],
            &[("B", "A", 1), ("B", "C", 50), ("C", "D", 50), ("D", "A", 50)],
        ),
        "A",
        "B",
        50,
    );

    show("Self-debt", &DebtLedger::new(), "A", "a", 5);

    println!("━━━ Interpretation ━━━\n");
    println!("  Netting removes the bottleneck amount from every debt in the loop.");
    println!("  Each participant's net position is unchanged; only fewer, smaller");
    println!("  debts remain to be settled.");
}
