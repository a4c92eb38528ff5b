//! Summary statistics over throughput samples
//!
//! All functions return `None` for an empty sample sequence instead of
//! producing NaN, so callers must decide what an absent statistic means.

/// Arithmetic mean
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Population standard deviation
pub fn stddev(samples: &[f64]) -> Option<f64> {
    let mu = mean(samples)?;
    let variance =
        samples.iter().map(|x| (x - mu) * (x - mu)).sum::<f64>() / samples.len() as f64;
    Some(variance.sqrt())
}

/// Coefficient of variation (stddev / mean)
///
/// `None` when there are no samples or the mean is zero.
pub fn coefvar(samples: &[f64]) -> Option<f64> {
    let mu = mean(samples)?;
    if mu == 0.0 {
        return None;
    }
    stddev(samples).map(|sigma| sigma / mu)
}
