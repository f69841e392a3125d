//! The two pump heuristics.

mod feaspump;
mod kernelpump;

pub use feaspump::{FeasibilityPump, FpStats, PumpOutcome};
pub use kernelpump::{KernelPump, KpStats};
