//! Shaping targets and step quantization

use serde::Serialize;
use std::fmt;

use crate::utils::{Result, TunerError};

/// Bandwidth limit applied by the gateway's SQM, in Mbit/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Shaping switched off
    Disabled,
    /// Shaping enabled at this rate (strictly positive)
    Rate(f64),
}

impl Target {
    /// Shaped target from user input; the rate must be finite and above zero
    pub fn positive(rate: f64) -> Result<Target> {
        if rate.is_finite() && rate > 0.0 {
            Ok(Target::Rate(rate))
        } else {
            Err(TunerError::Config(format!("target rate must be above 0 Mbps, got {}", rate)))
        }
    }

    pub fn rate(&self) -> Option<f64> {
        match self {
            Target::Disabled => None,
            Target::Rate(rate) => Some(*rate),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Target::Rate(_))
    }

    /// Rate in kbit/s as pushed to the gateway (truncated)
    pub fn kbps(&self) -> Option<u64> {
        self.rate().map(|rate| (rate * 1000.0) as u64)
    }
}

impl From<Option<f64>> for Target {
    fn from(rate: Option<f64>) -> Self {
        rate.map_or(Target::Disabled, Target::Rate)
    }
}

/// Step-size regime for target arithmetic
///
/// Below `fractional_threshold` targets move in `fractional_increment` steps,
/// at or above it in whole units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    pub fractional_threshold: f64,
    pub fractional_increment: f64,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self {
            fractional_threshold: 20.0,
            fractional_increment: 0.1,
        }
    }
}

impl Quantizer {
    /// Increment that applies to a (not yet quantized) value
    pub fn increment_for(&self, value: f64) -> f64 {
        if value < self.fractional_threshold {
            self.fractional_increment
        } else {
            1.0
        }
    }

    /// Round `value` to the nearest multiple of `increment`
    ///
    /// Increments that divide one evenly are applied through their reciprocal
    /// so that e.g. 5.72 with 0.1 yields exactly `5.7` rather than `57.0 * 0.1`.
    /// Any other increment is snapped to its own decimal precision afterwards.
    pub fn quantize(value: f64, increment: f64) -> f64 {
        let reciprocal = 1.0 / increment;
        if increment < 1.0 && (reciprocal - reciprocal.round()).abs() < 1e-9 {
            let steps = reciprocal.round();
            return (value * steps).round() / steps;
        }

        let quantized = (value / increment).round() * increment;
        let scale = 10f64.powi(decimal_places(increment));
        (quantized * scale).round() / scale
    }

    /// Next target below `current`
    ///
    /// `scaled` is the already multiplied value; the result is quantized and
    /// forced at least one increment below `current`.
    pub fn step_down(&self, current: f64, scaled: f64) -> f64 {
        let increment = self.increment_for(scaled);
        let mut next = Self::quantize(scaled, increment);
        while next >= current {
            next = Self::quantize(next - increment, increment);
        }
        next
    }

    /// Next target above `current`, forced at least one increment up
    pub fn step_up(&self, current: f64, scaled: f64) -> f64 {
        let increment = self.increment_for(scaled);
        let mut next = Self::quantize(scaled, increment);
        while next <= current {
            next = Self::quantize(next + increment, increment);
        }
        next
    }

    /// Human label: `None`, one decimal below the threshold, integer otherwise
    pub fn label(&self, target: Target) -> String {
        match target {
            Target::Disabled => "None".to_string(),
            Target::Rate(rate) if rate < self.fractional_threshold => format!("{:.1}", rate),
            Target::Rate(rate) => format!("{}", rate.round() as i64),
        }
    }

    /// Fixed-width log column (`"{:6.1} Mbps"` / `"{:6} Mbps"` / `"      None "`)
    pub fn column(&self, target: Target) -> String {
        match target {
            Target::Disabled => "      None ".to_string(),
            Target::Rate(rate) if rate < self.fractional_threshold => {
                format!("{:6.1} Mbps", rate)
            }
            Target::Rate(rate) => format!("{:6} Mbps", rate.round() as i64),
        }
    }
}

/// Decimal digits needed to write `increment` exactly (capped at 9)
fn decimal_places(increment: f64) -> i32 {
    (0..9)
        .find(|&places| {
            let scaled = increment * 10f64.powi(places);
            (scaled - scaled.round()).abs() < 1e-9
        })
        .unwrap_or(9)
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Disabled => write!(f, "None"),
            Target::Rate(rate) => write!(f, "{} Mbps", rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kbps() {
        assert_eq!(Target::Rate(717.0).kbps(), Some(717_000));
        assert_eq!(Target::Rate(5.7).kbps(), Some(5_700));
        assert_eq!(Target::Disabled.kbps(), None);
        assert_eq!(Target::from(None), Target::Disabled);
        assert_eq!(Target::from(Some(2.0)), Target::Rate(2.0));
    }

    #[test]
    fn test_positive_rate_only() {
        assert_eq!(Target::positive(380.0).unwrap(), Target::Rate(380.0));
        assert!(Target::positive(0.0).unwrap_err().is_config());
        assert!(Target::positive(-5.0).is_err());
        assert!(Target::positive(f64::NAN).is_err());
        assert!(Target::positive(f64::INFINITY).is_err());
    }

    #[test]
    fn test_increment_regime() {
        let q = Quantizer::default();
        assert_eq!(q.increment_for(19.99), 0.1);
        assert_eq!(q.increment_for(20.0), 1.0);
        assert_eq!(q.increment_for(716.8), 1.0);
    }

    #[test]
    fn test_quantize_values() {
        assert_eq!(Quantizer::quantize(716.8, 1.0), 717.0);
        assert_eq!(Quantizer::quantize(5.7176, 0.1), 5.7);
        assert_eq!(Quantizer::quantize(4.77, 0.1), 4.8);
        assert_eq!(Quantizer::quantize(1.4, 1.0), 1.0);
    }

    #[test]
    fn test_quantize_uneven_increments() {
        assert_eq!(Quantizer::quantize(1.0, 0.3), 0.9);
        assert_eq!(Quantizer::quantize(1.0, 0.6), 1.2);
        assert_eq!(Quantizer::quantize(0.3, 0.25), 0.25);
        assert_eq!(Quantizer::quantize(7.0, 2.5), 7.5);

        let q = Quantizer {
            fractional_threshold: 20.0,
            fractional_increment: 0.3,
        };
        assert_eq!(q.step_down(2.0, 1.673), 1.8);
        assert_eq!(q.step_up(1.8, 1.9), 2.1);
    }

    #[test]
    fn test_quantize_idempotent() {
        for increment in [0.1, 0.25, 0.3, 0.6] {
            let q = Quantizer {
                fractional_threshold: 20.0,
                fractional_increment: increment,
            };
            let mut value = 0.05;
            while value < 3000.0 {
                let increment = q.increment_for(value);
                let once = Quantizer::quantize(value, increment);
                let twice = Quantizer::quantize(once, increment);
                assert_eq!(once, twice, "value {} increment {}", value, increment);

                let steps = once / increment;
                assert!((steps - steps.round()).abs() < 1e-9, "value {} increment {}", value, increment);

                value *= 1.037;
            }
        }
    }

    #[test]
    fn test_forced_progress() {
        let q = Quantizer {
            fractional_threshold: 0.0,
            fractional_increment: 0.1,
        };
        // 2 * sqrt(0.7) rounds back to 2
        assert_eq!(q.step_down(2.0, 2.0 * 0.7f64.sqrt()), 1.0);
        assert_eq!(q.step_up(100.0, 100.4), 101.0);
        // rounding below an unquantized current still moves upward
        let q = Quantizer::default();
        assert_eq!(q.step_up(4.91, 4.93), 5.0);

        let q = Quantizer::default();
        let mut current = 1024.0;
        for _ in 0..200 {
            let next = q.step_down(current, current * 0.99);
            assert!(next < current);
            current = next;
        }
        let mut current = 1.0;
        for _ in 0..200 {
            let next = q.step_up(current, current * 1.01);
            assert!(next > current);
            current = next;
        }
    }

    #[test]
    fn test_labels() {
        let q = Quantizer::default();
        assert_eq!(q.label(Target::Disabled), "None");
        assert_eq!(q.label(Target::Rate(5.7)), "5.7");
        assert_eq!(q.label(Target::Rate(1933.0)), "1933");
        assert_eq!(q.column(Target::Disabled), "      None ");
        assert_eq!(q.column(Target::Rate(5.7)), "   5.7 Mbps");
        assert_eq!(q.column(Target::Rate(1933.0)), "  1933 Mbps");
    }
}
