//! Shared expenses example.
//!
//! A group of friends records IOUs one at a time. Each new IOU that closes
//! a loop of debts is netted immediately, keeping the ledger small.

use iou_netting::core::iou::ProposedIou;
use iou_netting::core::participant::Participant;
use iou_netting::graph::ledger::DebtLedger;

fn main() {
    println!("╔════════════════════════════════════════════╗");
    println!("║  iou-netting: Shared Expenses Example      ║");
    println!("╚════════════════════════════════════════════╝\n");

    let alice = Participant::new("alice");
    let bob = Participant::new("bob");
    let carol = Participant::new("carol");
    let dave = Participant::new("dave");

    let ious = [
        (&alice, &bob, 40, "groceries"),
        (&bob, &carol, 25, "taxi"),
        (&carol, &dave, 30, "concert"),
        (&dave, &alice, 20, "coffee beans"),
        (&carol, &alice, 10, "pizza"),
    ];

    let mut ledger = DebtLedger::new();
    for (debtor, creditor, amount, memo) in ious {
        let iou = match ProposedIou::new(debtor.clone(), creditor.clone(), amount) {
            Ok(iou) => iou,
            Err(e) => {
                eprintln!("skipping {}: {}", memo, e);
                continue;
            }
        };
        println!("━━━ {} owes {} {} ({}) ━━━\n", debtor, creditor, amount, memo);
        let record = ledger.record_iou(iou, Some(memo.to_string()));
        println!("{}", record.resolution());
    }

    println!("━━━ Final Balances ━━━\n");
    for edge in ledger.edges() {
        println!("  {:<6} owes {:<6} {:>4}", edge.debtor, edge.creditor, edge.amount);
    }
    println!();
    for who in [&alice, &bob, &carol, &dave] {
        println!(
            "  {:<6} owes {:>4} in total, is owed {:>4}",
            who,
            ledger.total_owed(who),
            ledger.total_owed_to(who)
        );
    }

    let netted: u64 = ledger
        .journal()
        .iter()
        .map(|record| record.resolution().netted_total())
        .sum();
    println!("\n  Gross debt cancelled by netting: {}", netted);
}
