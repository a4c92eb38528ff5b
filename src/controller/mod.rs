//! Convergence controllers
//!
//! This module provides:
//! - `Target` and `Quantizer`: shaping targets and step arithmetic
//! - `DescendingSearch`: walk down until a target is confirmed
//! - `AscendingSearch`: climb from a confirmed target to the ceiling
//! - `FixedRepetitionSampler`: median of N runs at one target
//! - `PassHooks`/`PassContext`: per-pass naming, gateway preparation and dumps
//!
//! Every controller runs its trials through a `TrialRunner` and records them
//! in a `SharedHistory` passed in by the caller.

pub mod ascending;
pub mod descending;
pub mod hooks;
pub mod sampler;
pub mod tally;
pub mod target;

pub use ascending::{AscendingConfig, AscendingSearch};
pub use descending::{DescendingConfig, DescendingSearch};
pub use hooks::{DefaultHooks, PassContext, PassHooks};
pub use sampler::{FixedRepetitionSampler, OddRunCount};
pub use tally::TargetTally;
pub use target::{Quantizer, Target};
