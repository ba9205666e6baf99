use crate::core::error::ResolveError;
use crate::core::iou::{Amount, ProposedIou};
use crate::core::participant::Participant;
use crate::graph::debt_graph::{AsyncDebtGraph, DebtGraph};
use crate::graph::path_search::{find_path, find_path_async};
use futures::future::try_join_all;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Replacement balance for one edge of a netted cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub debtor: Participant,
    pub creditor: Participant,
    /// What `debtor` owes `creditor` once the cycle is netted.
    pub new_amount: Amount,
}

impl BalanceDelta {
    /// A zero balance means the edge should be removed, not stored as zero.
    pub fn clears_edge(&self) -> bool {
        self.new_amount == 0
    }
}

/// A debt cycle closed by a proposed IOU, and how to net it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NettedCycle {
    /// `[debtor, creditor, .., debtor]`: the proposed edge followed by the
    /// existing debts leading from the creditor back to the debtor.
    cycle: Vec<Participant>,
    /// The bottleneck: smallest amount on any edge of the cycle, the proposed
    /// amount included.
    min_amount: Amount,
    /// One entry per cycle edge, in traversal order, starting with the
    /// proposed edge.
    deltas: Vec<BalanceDelta>,
}

impl NettedCycle {
    /// Build the netting for `iou` closed by `path` (creditor .. debtor), given
    /// the existing amount on each consecutive pair of `path`.
    fn close(iou: &ProposedIou, path: Vec<Participant>, existing: &[Amount]) -> Self {
        let min_amount = existing
            .iter()
            .copied()
            .fold(iou.amount(), Amount::min);

        let mut cycle = Vec::with_capacity(path.len() + 1);
        cycle.push(iou.debtor().clone());
        cycle.extend(path);

        // The proposed edge is not recorded yet, so its existing amount is the
        // proposal itself.
        let amounts = std::iter::once(iou.amount()).chain(existing.iter().copied());
        let deltas = cycle
            .windows(2)
            .zip(amounts)
            .map(|(pair, amount)| BalanceDelta {
                debtor: pair[0].clone(),
                creditor: pair[1].clone(),
                new_amount: amount - min_amount,
            })
            .collect();

        Self {
            cycle,
            min_amount,
            deltas,
        }
    }

    pub fn cycle(&self) -> &[Participant] {
        &self.cycle
    }

    pub fn min_amount(&self) -> Amount {
        self.min_amount
    }

    pub fn deltas(&self) -> &[BalanceDelta] {
        &self.deltas
    }

    /// Number of debts in the cycle, the proposed one included.
    pub fn edge_count(&self) -> usize {
        self.deltas.len()
    }

    /// Gross debt removed by netting: the bottleneck once per edge.
    pub fn netted_total(&self) -> Amount {
        self.min_amount.saturating_mul(self.edge_count() as Amount)
    }
}

/// Outcome of resolving a proposed IOU against a debt snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Resolution {
    /// No cycle: record the IOU unchanged.
    Direct(Amount),
    /// A cycle was found: apply the deltas instead of the original IOU.
    Netted(NettedCycle),
}

impl Resolution {
    pub fn is_netted(&self) -> bool {
        matches!(self, Resolution::Netted(_))
    }

    pub fn cycle(&self) -> Option<&[Participant]> {
        match self {
            Resolution::Direct(_) => None,
            Resolution::Netted(netted) => Some(netted.cycle()),
        }
    }

    pub fn min_amount(&self) -> Option<Amount> {
        match self {
            Resolution::Direct(_) => None,
            Resolution::Netted(netted) => Some(netted.min_amount()),
        }
    }

    /// Balance updates to apply; empty for [`Resolution::Direct`].
    pub fn deltas(&self) -> &[BalanceDelta] {
        match self {
            Resolution::Direct(_) => &[],
            Resolution::Netted(netted) => netted.deltas(),
        }
    }

    /// Gross debt cancelled; zero for [`Resolution::Direct`].
    pub fn netted_total(&self) -> Amount {
        match self {
            Resolution::Direct(_) => 0,
            Resolution::Netted(netted) => netted.netted_total(),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Direct(amount) => {
                writeln!(f, "=== Resolution: direct ===")?;
                writeln!(f, "No cycle; record the IOU of {} unchanged.", amount)
            }
            Resolution::Netted(netted) => {
                let cycle: Vec<&str> = netted.cycle.iter().map(Participant::as_str).collect();
                writeln!(f, "=== Resolution: netted ===")?;
                writeln!(f, "Cycle:          {}", cycle.join(" → "))?;
                writeln!(f, "Bottleneck:     {}", netted.min_amount)?;
                writeln!(f, "Netted total:   {}", netted.netted_total())?;
                writeln!(f, "Updates:")?;
                for delta in &netted.deltas {
                    let note = if delta.clears_edge() { " (cleared)" } else { "" };
                    writeln!(
                        f,
                        "  {} → {}: {}{}",
                        delta.debtor, delta.creditor, delta.new_amount, note
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// The cycle detection and netting engine.
///
/// Holds no state: every call is a pure function of the snapshot and the
/// proposal, so a call can be abandoned or repeated at any point.
pub struct CycleResolver;

impl CycleResolver {
    /// Resolve `iou` against `graph`.
    ///
    /// When `debtor` owes `creditor`, a cycle exists only if the creditor
    /// already reaches the debtor through existing debts. The search therefore
    /// runs from the creditor to the debtor, and the found path
    /// `creditor .. debtor` prefixed with the debtor forms the cycle.
    ///
    /// # Algorithm
    ///
    /// 1. Breadth-first search for the shortest debt path creditor → debtor.
    /// 2. No path: [`Resolution::Direct`] with the proposed amount.
    /// 3. Otherwise the bottleneck is the minimum of the proposed amount and
    ///    every existing debt on the path.
    /// 4. Each cycle edge is reduced by the bottleneck; the proposed edge
    ///    counts as holding the proposed amount.
    pub fn resolve<G: DebtGraph>(graph: &G, iou: &ProposedIou) -> Result<Resolution, G::Error> {
        let Some(path) = find_path(graph, iou.creditor(), iou.debtor())? else {
            return Ok(Resolution::Direct(iou.amount()));
        };

        let existing = path
            .windows(2)
            .map(|pair| graph.lookup(&pair[0], &pair[1]))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::finish(iou, path, &existing))
    }

    /// Asynchronous [`CycleResolver::resolve`]. Lookups along the found
    /// path are issued concurrently.
    pub async fn resolve_async<G: AsyncDebtGraph>(
        graph: &G,
        iou: &ProposedIou,
    ) -> Result<Resolution, G::Error> {
        let Some(path) = find_path_async(graph, iou.creditor(), iou.debtor()).await? else {
            return Ok(Resolution::Direct(iou.amount()));
        };

        let existing = try_join_all(
            path.windows(2)
                .map(|pair| graph.lookup(&pair[0], &pair[1])),
        )
        .await?;

        Ok(Self::finish(iou, path, &existing))
    }

    fn finish(iou: &ProposedIou, path: Vec<Participant>, existing: &[Amount]) -> Resolution {
        // A zero here means the snapshot changed between search and lookup.
        if existing.contains(&0) {
            debug!(
                "cycle through {} -> {} vanished during resolution",
                iou.debtor(),
                iou.creditor()
            );
            return Resolution::Direct(iou.amount());
        }
        let netted = NettedCycle::close(iou, path, existing);
        debug!(
            "netted {}-edge cycle for {} -> {} by {}",
            netted.edge_count(),
            iou.debtor(),
            iou.creditor(),
            netted.min_amount()
        );
        Resolution::Netted(netted)
    }
}

/// Validate a proposed IOU and resolve it against `graph`.
///
/// Zero amounts and self-debts are rejected with
/// [`ResolveError::InvalidInput`] before the graph is consulted.
///
/// # Examples
///
/// ```
/// use iou_netting::prelude::*;
///
/// let mut ledger = DebtLedger::new();
/// ledger.set_debt("bob".into(), "alice".into(), 3).unwrap();
///
/// let resolution = resolve("alice".into(), "bob".into(), 5, &ledger).unwrap();
/// assert_eq!(resolution.min_amount(), Some(3));
/// ```
pub fn resolve<G: DebtGraph>(
    debtor: Participant,
    creditor: Participant,
    amount: Amount,
    graph: &G,
) -> Result<Resolution, ResolveError<G::Error>> {
    let iou = ProposedIou::new(debtor, creditor, amount)?;
    CycleResolver::resolve(graph, &iou).map_err(ResolveError::Lookup)
}

/// Asynchronous [`resolve`].
pub async fn resolve_async<G: AsyncDebtGraph>(
    debtor: Participant,
    creditor: Participant,
    amount: Amount,
    graph: &G,
) -> Result<Resolution, ResolveError<G::Error>> {
    let iou = ProposedIou::new(debtor, creditor, amount)?;
    CycleResolver::resolve_async(graph, &iou)
        .await
        .map_err(ResolveError::Lookup)
}
