//! # iou-netting
//!
//! Pairwise IOU tracking with debt cycle netting.
//!
//! Whenever a new IOU `debtor owes creditor amount` is proposed, the engine
//! looks for an existing chain of debts leading from the creditor back to the
//! debtor. If one exists, the new IOU closes a cycle, and every debt on that
//! cycle is reduced by the smallest amount along it.
//!
//! ## Architecture
//!
//! - **core** — Participants, debts, proposals and error types
//! - **graph** — The `DebtGraph` capability, an in-memory ledger, breadth-first path search
//! - **resolution** — The cycle resolver and verification of submitted cycles
//! - **simulation** — Random debt networks for stress testing

pub mod core;
pub mod graph;
pub mod resolution;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::error::{CycleError, InvalidIou, ResolveError};
    pub use crate::core::iou::{Amount, DebtEdge, IouRecord, ProposedIou};
    pub use crate::core::participant::Participant;
    pub use crate::graph::debt_graph::{AsyncDebtGraph, DebtGraph};
    pub use crate::graph::ledger::DebtLedger;
    pub use crate::resolution::resolver::{
        resolve, resolve_async, BalanceDelta, CycleResolver, NettedCycle, Resolution,
    };
    pub use crate::resolution::verify::verify_cycle;
}
