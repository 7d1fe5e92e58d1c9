/// Basic metrics: how long and how well the pendulum stayed up.
use crate::systems::sdk::Sample;

/// Percent of samples with |deviation| < threshold.
pub fn stability_score(samples: &[Sample], threshold: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let inside = samples
        .iter()
        .filter(|s| s.state.deviation().abs() < threshold)
        .count();
    100.0 * inside as f64 / samples.len() as f64
}

/// Seconds spent within threshold, counting each interval by its start.
pub fn balance_duration(samples: &[Sample], threshold: f64) -> f64 {
    samples
        .windows(2)
        .filter(|w| w[0].state.deviation().abs() < threshold)
        .map(|w| (w[1].state.time - w[0].state.time).max(0.0))
        .sum()
}

pub fn push_count(samples: &[Sample]) -> i64 {
    samples.iter().filter(|s| s.action.is_some()).count() as i64
}

/// Time spanned by the buffer.
pub fn session_time(samples: &[Sample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(a), Some(b)) => (b.state.time - a.state.time).max(0.0),
        _ => 0.0,
    }
}
