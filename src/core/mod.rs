//! Value types shared by every layer: participants, debts, proposals and errors.

pub mod error;
pub mod iou;
pub mod participant;
