//! Distributed opening expansion.
//!
//! A UCT-style trainer that grows an opening tree persisted in a
//! key/value [`Store`], dispatching position evaluations to a worker
//! pool. Outstanding evaluations are marked with a virtual-loss counter
//! along their ancestor chain, which steers concurrent selections away
//! from branches that are already being worked on.
//!
//! The driver thread owns the game, the store and every tree mutation;
//! workers only ever see an immutable move list and answer with a
//! score. A run interrupted mid-way leaves its unfinished nodes marked
//! unevaluated on disk, and the next run re-enqueues them before
//! expanding anything new.

mod node;
mod store;
mod trainer;

pub use node::{DoeNode, NIL_KEY, ROOT_KEY};
pub use store::{MemoryStore, SqliteStore, Store};
pub use trainer::Trainer;
