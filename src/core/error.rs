use crate::core::iou::Amount;
use crate::core::participant::Participant;
use thiserror::Error;

/// Errors from parsing a participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParticipantError {
    #[error("participant identifier is empty")]
    Empty,
}

/// Reasons a proposed IOU is rejected before any search happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidIou {
    #[error("participant identifier is empty")]
    BlankParticipant,
    #[error("IOU amount must be positive")]
    NonPositiveAmount,
    #[error("{participant} cannot owe themselves")]
    SelfDebt { participant: Participant },
}

/// Errors returned by [`resolve`](crate::resolution::resolver::resolve).
///
/// `E` is the error type of the debt graph being searched. A failing lookup
/// is surfaced as-is: treating it as "no debt" would hide or invent cycles.
#[derive(Debug, Error)]
pub enum ResolveError<E> {
    #[error("invalid IOU: {0}")]
    InvalidInput(#[from] InvalidIou),
    #[error("debt lookup failed: {0}")]
    Lookup(E),
}

/// Reasons a caller-supplied cycle, or a resolution built on one, is rejected
/// against the current snapshot.
#[derive(Debug, Error)]
pub enum CycleError<E> {
    #[error("cycle must contain at least 3 entries, got {0}")]
    TooShort(usize),
    #[error("cycle must start and end with debtor {debtor}")]
    WrongEndpoints { debtor: Participant },
    #[error("cycle must continue with creditor {creditor}")]
    WrongCreditor { creditor: Participant },
    #[error("participant {0} appears more than once inside the cycle")]
    RepeatedParticipant(Participant),
    #[error("no debt from {debtor} to {creditor} along the cycle")]
    MissingDebt {
        debtor: Participant,
        creditor: Participant,
    },
    #[error("cycle was netted by {recorded} but now closes with bottleneck {current}")]
    StaleBottleneck { recorded: Amount, current: Amount },
    #[error("direct resolution carries {recorded}, IOU is for {proposed}")]
    AmountMismatch { recorded: Amount, proposed: Amount },
    #[error("debt lookup failed: {0}")]
    Lookup(E),
}

/// Errors from loading or saving a ledger file.
#[derive(Debug, Error)]
pub enum LedgerFileError {
    #[error("could not access ledger file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed ledger file: {0}")]
    Json(#[from] serde_json::Error),
}
