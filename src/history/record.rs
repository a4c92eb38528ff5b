//! One executed benchmark and its classification marks

use serde::Serialize;

use crate::controller::Target;
use crate::measurement::Measurement;

/// Position of a record in its `RunHistory`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RunId(pub usize);

/// A measurement bound to the target it ran at
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub target: Target,
    pub measurement: Measurement,
    /// Raw flent output the measurement was parsed from
    #[serde(skip)]
    pub report: String,
    pub marked_good: bool,
    pub marked_bad: bool,
    pub marked_selected: bool,
}

impl RunRecord {
    /// Parse a raw report into an unmarked record
    pub fn from_report(report: String, target: Target) -> Self {
        Self {
            target,
            measurement: Measurement::parse(&report),
            report,
            marked_good: false,
            marked_bad: false,
            marked_selected: false,
        }
    }

    /// Total throughput of the underlying measurement
    pub fn totals(&self) -> f64 {
        self.measurement.totals()
    }

    pub fn ping(&self) -> Option<f64> {
        self.measurement.ping()
    }
}
