//! The debt graph capability, an in-memory ledger implementing it, and the
//! breadth-first path search over it.

pub mod debt_graph;
pub mod ledger;
pub mod path_search;
