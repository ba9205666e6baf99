use crate::core::error::{CycleError, InvalidIou, LedgerFileError};
use crate::core::iou::{Amount, DebtEdge, IouRecord, ProposedIou};
use crate::core::participant::Participant;
use crate::graph::debt_graph::{AsyncDebtGraph, DebtGraph};
use crate::resolution::resolver::{CycleResolver, Resolution};
use crate::resolution::verify::verify_cycle;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::path::Path;

/// An in-memory table of pairwise debts.
///
/// Participants keep the order in which they were first seen, which is the
/// traversal order the resolver uses. Only non-zero debts are stored.
///
/// `DebtLedger` implements [`DebtGraph`], so it can be handed to the resolver
/// directly, and [`DebtLedger::record_iou`] resolves and commits an IOU in
/// one step.
///
/// # Examples
///
/// ```
/// use iou_netting::prelude::*;
///
/// let mut ledger = DebtLedger::new();
/// ledger.set_debt("bob".into(), "carol".into(), 5).unwrap();
/// ledger.set_debt("carol".into(), "alice".into(), 5).unwrap();
///
/// let iou = ProposedIou::new("alice".into(), "bob".into(), 10).unwrap();
/// let record = ledger.record_iou(iou, None);
/// assert!(record.resolution().is_netted());
///
/// assert_eq!(ledger.debt(&"alice".into(), &"bob".into()), 5);
/// assert_eq!(ledger.edge_count(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "LedgerFile", into = "LedgerFile")]
pub struct DebtLedger {
    /// Participants in first-seen order.
    participants: Vec<Participant>,
    /// Participant -> position in `participants`.
    positions: HashMap<Participant, usize>,
    /// (debtor, creditor) -> amount, never zero.
    edges: HashMap<(Participant, Participant), Amount>,
    /// IOUs recorded through this ledger.
    journal: Vec<IouRecord>,
}

/// On-disk form of a [`DebtLedger`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    participants: Vec<Participant>,
    #[serde(default)]
    debts: Vec<DebtEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    journal: Vec<IouRecord>,
}

impl TryFrom<LedgerFile> for DebtLedger {
    type Error = InvalidIou;

    fn try_from(file: LedgerFile) -> Result<Self, Self::Error> {
        let mut ledger = DebtLedger::new();
        for participant in file.participants {
            ledger.register(participant);
        }
        for edge in file.debts {
            ledger.set_debt(edge.debtor, edge.creditor, edge.amount)?;
        }
        ledger.journal = file.journal;
        Ok(ledger)
    }
}

impl From<DebtLedger> for LedgerFile {
    fn from(ledger: DebtLedger) -> Self {
        LedgerFile {
            debts: ledger.edges(),
            participants: ledger.participants,
            journal: ledger.journal,
        }
    }
}

impl DebtLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from a list of debts. Later entries for the same edge
    /// replace earlier ones.
    pub fn from_edges(edges: impl IntoIterator<Item = DebtEdge>) -> Result<Self, InvalidIou> {
        let mut ledger = Self::new();
        for edge in edges {
            ledger.set_debt(edge.debtor, edge.creditor, edge.amount)?;
        }
        Ok(ledger)
    }

    /// Read a ledger from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerFileError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the ledger to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LedgerFileError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Add a participant if not already known. Returns `true` if it was new.
    /// Blank identifiers are never registered.
    pub fn register(&mut self, participant: Participant) -> bool {
        if participant.is_blank() || self.positions.contains_key(&participant) {
            return false;
        }
        self.positions.insert(participant.clone(), self.participants.len());
        self.participants.push(participant);
        true
    }

    /// Set what `debtor` owes `creditor`. Zero removes the debt.
    pub fn set_debt(
        &mut self,
        debtor: Participant,
        creditor: Participant,
        amount: Amount,
    ) -> Result<(), InvalidIou> {
        if debtor.is_blank() || creditor.is_blank() {
            return Err(InvalidIou::BlankParticipant);
        }
        if debtor == creditor {
            return Err(InvalidIou::SelfDebt {
                participant: debtor,
            });
        }
        self.write_edge(debtor, creditor, amount);
        Ok(())
    }

    /// Write an edge between two distinct, non-blank participants.
    pub(crate) fn write_edge(&mut self, debtor: Participant, creditor: Participant, amount: Amount) {
        debug_assert!(debtor != creditor && !debtor.is_blank() && !creditor.is_blank());
        self.register(debtor.clone());
        self.register(creditor.clone());
        if amount == 0 {
            self.edges.remove(&(debtor, creditor));
        } else {
            self.edges.insert((debtor, creditor), amount);
        }
    }

    /// What `debtor` currently owes `creditor`.
    pub fn debt(&self, debtor: &Participant, creditor: &Participant) -> Amount {
        self.edges
            .get(&(debtor.clone(), creditor.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Commit a resolution computed for `iou`, possibly against another
    /// snapshot.
    ///
    /// A `Direct` resolution must carry the proposed amount, which is added to
    /// the proposed edge. A `Netted` cycle is re-checked with
    /// [`verify_cycle`] and must still close with the recorded bottleneck.
    /// Every debt on it then shrinks by the bottleneck, and the remainder of
    /// the IOU is added to whatever the debtor already owed the creditor.
    /// The resolution's deltas are not written as-is.
    ///
    /// Nothing changes when an error is returned.
    pub fn apply(
        &mut self,
        iou: &ProposedIou,
        resolution: &Resolution,
    ) -> Result<(), CycleError<Infallible>> {
        match resolution {
            Resolution::Direct(amount) if *amount != iou.amount() => {
                return Err(CycleError::AmountMismatch {
                    recorded: *amount,
                    proposed: iou.amount(),
                });
            }
            Resolution::Direct(_) => {}
            Resolution::Netted(netted) => {
                let current = verify_cycle(&*self, iou, netted.cycle())?;
                if current != netted.min_amount() {
                    return Err(CycleError::StaleBottleneck {
                        recorded: netted.min_amount(),
                        current,
                    });
                }
            }
        }
        self.commit(iou, resolution);
        Ok(())
    }

    /// Write a resolution known to match the current state.
    fn commit(&mut self, iou: &ProposedIou, resolution: &Resolution) {
        self.register(iou.debtor().clone());
        self.register(iou.creditor().clone());
        match resolution {
            Resolution::Direct(amount) => self.add_to_edge(iou.debtor(), iou.creditor(), *amount),
            Resolution::Netted(netted) => {
                let min_amount = netted.min_amount();
                for pair in netted.cycle()[1..].windows(2) {
                    let remaining = self.debt(&pair[0], &pair[1]).saturating_sub(min_amount);
                    self.write_edge(pair[0].clone(), pair[1].clone(), remaining);
                }
                self.add_to_edge(
                    iou.debtor(),
                    iou.creditor(),
                    iou.amount().saturating_sub(min_amount),
                );
            }
        }
    }

    fn add_to_edge(&mut self, debtor: &Participant, creditor: &Participant, amount: Amount) {
        if amount == 0 {
            return;
        }
        let entry = self
            .edges
            .entry((debtor.clone(), creditor.clone()))
            .or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Resolve `iou` against the current state, apply the result and journal it.
    pub fn record_iou(&mut self, iou: ProposedIou, memo: Option<String>) -> &IouRecord {
        let resolution = match CycleResolver::resolve(&*self, &iou) {
            Ok(resolution) => resolution,
            Err(never) => match never {},
        };
        self.commit(&iou, &resolution);

        match &resolution {
            Resolution::Direct(amount) => info!(
                "recorded {} owes {} {}",
                iou.debtor(),
                iou.creditor(),
                amount
            ),
            Resolution::Netted(netted) => info!(
                "recorded {} owes {} {} with a {}-edge cycle netted by {}",
                iou.debtor(),
                iou.creditor(),
                iou.amount(),
                netted.edge_count(),
                netted.min_amount()
            ),
        }

        let mut record = IouRecord::new(iou, resolution);
        if let Some(memo) = memo {
            record = record.with_memo(memo);
        }
        self.journal.push(record);
        &self.journal[self.journal.len() - 1]
    }

    /// IOUs recorded through [`DebtLedger::record_iou`], oldest first.
    pub fn journal(&self) -> &[IouRecord] {
        &self.journal
    }

    /// Number of known participants.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Number of non-zero debts.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Known participants in first-seen order.
    pub fn participant_list(&self) -> &[Participant] {
        &self.participants
    }

    /// All non-zero debts, ordered by debtor then creditor position.
    pub fn edges(&self) -> Vec<DebtEdge> {
        self.sorted_edges(|_| true)
    }

    /// Debts `participant` owes, ordered by creditor position.
    pub fn debts_owed_by(&self, participant: &Participant) -> Vec<DebtEdge> {
        self.sorted_edges(|(debtor, _)| debtor == participant)
    }

    /// Debts owed to `participant`, ordered by debtor position.
    pub fn debts_owed_to(&self, participant: &Participant) -> Vec<DebtEdge> {
        self.sorted_edges(|(_, creditor)| creditor == participant)
    }

    /// Everything `participant` owes, summed.
    pub fn total_owed(&self, participant: &Participant) -> Amount {
        self.debts_owed_by(participant)
            .iter()
            .fold(0, |sum: Amount, edge| sum.saturating_add(edge.amount))
    }

    /// Everything owed to `participant`, summed.
    pub fn total_owed_to(&self, participant: &Participant) -> Amount {
        self.debts_owed_to(participant)
            .iter()
            .fold(0, |sum: Amount, edge| sum.saturating_add(edge.amount))
    }

    fn sorted_edges(&self, keep: impl Fn(&(Participant, Participant)) -> bool) -> Vec<DebtEdge> {
        let mut edges: Vec<(&(Participant, Participant), Amount)> = self
            .edges
            .iter()
            .filter(|(key, _)| keep(*key))
            .map(|(key, &amount)| (key, amount))
            .collect();
        edges.sort_by_key(|((debtor, creditor), _)| {
            (self.positions[debtor], self.positions[creditor])
        });
        edges
            .into_iter()
            .map(|((debtor, creditor), amount)| {
                DebtEdge::new(debtor.clone(), creditor.clone(), amount)
            })
            .collect()
    }
}

impl DebtGraph for DebtLedger {
    type Error = Infallible;

    fn participants(&self) -> Result<Vec<Participant>, Infallible> {
        Ok(self.participants.clone())
    }

    fn lookup(&self, debtor: &Participant, creditor: &Participant) -> Result<Amount, Infallible> {
        Ok(self.debt(debtor, creditor))
    }
}

#[async_trait]
impl AsyncDebtGraph for DebtLedger {
    type Error = Infallible;

    async fn participants(&self) -> Result<Vec<Participant>, Infallible> {
        Ok(self.participants.clone())
    }

    async fn lookup(
        &self,
        debtor: &Participant,
        creditor: &Participant,
    ) -> Result<Amount, Infallible> {
        Ok(self.debt(debtor, creditor))
    }
}
