//! Check a cycle submitted alongside an IOU before trusting it.
//!
//! A client may resolve an IOU against one snapshot and submit the cycle it
//! found to a ledger that has since moved on. The ledger re-checks the cycle
//! against its own state before netting it.

use crate::core::error::CycleError;
use crate::core::iou::{Amount, ProposedIou};
use crate::core::participant::Participant;
use crate::graph::debt_graph::DebtGraph;
use std::collections::HashSet;

/// Verify that `cycle` is a valid closing cycle for `iou` in `graph`, and
/// return its bottleneck.
///
/// The cycle must read `[debtor, creditor, .., debtor]`, visit no participant
/// twice between the endpoints, and every existing edge after the proposed
/// one must carry a positive debt.
pub fn verify_cycle<G: DebtGraph>(
    graph: &G,
    iou: &ProposedIou,
    cycle: &[Participant],
) -> Result<Amount, CycleError<G::Error>> {
    if cycle.len() < 3 {
        return Err(CycleError::TooShort(cycle.len()));
    }
    if cycle.first() != Some(iou.debtor()) || cycle.last() != Some(iou.debtor()) {
        return Err(CycleError::WrongEndpoints {
            debtor: iou.debtor().clone(),
        });
    }
    if &cycle[1] != iou.creditor() {
        return Err(CycleError::WrongCreditor {
            creditor: iou.creditor().clone(),
        });
    }

    let mut seen: HashSet<&Participant> = HashSet::new();
    seen.insert(iou.debtor());
    for participant in &cycle[1..cycle.len() - 1] {
        if !seen.insert(participant) {
            return Err(CycleError::RepeatedParticipant(participant.clone()));
        }
    }

    let mut min_amount = iou.amount();
    for pair in cycle[1..].windows(2) {
        let amount = graph
            .lookup(&pair[0], &pair[1])
            .map_err(CycleError::Lookup)?;
        if amount == 0 {
            return Err(CycleError::MissingDebt {
                debtor: pair[0].clone(),
                creditor: pair[1].clone(),
            });
        }
        min_amount = min_amount.min(amount);
    }
    Ok(min_amount)
}
