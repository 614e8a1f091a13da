//! Convergence engine: decides and applies per-artifact corrections.
//!
//! The `planner` module is the pure equality check between desired and
//! persisted state. The `executor` module drives one reconciliation pass
//! over a batch of discovered artifacts.

pub mod executor;
pub mod planner;
