use crate::core::iou::Amount;
use crate::core::participant::Participant;
use async_trait::async_trait;

/// Read-only view over a consistent snapshot of current debts.
///
/// Implementations are supplied by the caller's storage layer and passed to
/// the resolver as a parameter. Nothing is mutated through this trait.
///
/// `lookup(x, x)` is never called by this crate.
pub trait DebtGraph {
    /// Failure of the underlying storage. In-memory snapshots use
    /// [`std::convert::Infallible`].
    type Error;

    /// All known participants in stable insertion order. The order fixes the
    /// traversal order, and with it which of several equally short cycles is
    /// found.
    fn participants(&self) -> Result<Vec<Participant>, Self::Error>;

    /// The amount `debtor` currently owes `creditor`; zero when there is no debt.
    fn lookup(&self, debtor: &Participant, creditor: &Participant) -> Result<Amount, Self::Error>;
}

/// Asynchronous form of [`DebtGraph`], for snapshots where each lookup is a
/// remote read.
///
/// Every call must observe the same snapshot for the duration of one
/// resolution.
#[async_trait]
pub trait AsyncDebtGraph: Send + Sync {
    type Error: Send;

    async fn participants(&self) -> Result<Vec<Participant>, Self::Error>;

    async fn lookup(
        &self,
        debtor: &Participant,
        creditor: &Participant,
    ) -> Result<Amount, Self::Error>;
}
