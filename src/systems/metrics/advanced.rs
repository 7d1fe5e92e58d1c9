/// Advanced metrics: how pushes were spent and how quickly they came.
use crate::systems::sdk::{PushDirection, Sample};

/// Minimum pushes before reversal statistics mean anything.
pub const MIN_PUSHES: usize = 20;
/// A reversal faster than this counts as overcorrection (s).
pub const OVERCORRECTION_WINDOW: f64 = 0.5;
/// Responses slower than this are not attributed to the event (s).
pub const RESPONSE_WINDOW: f64 = 2.0;

/// (time, direction, magnitude) of every recorded push, in order.
pub fn pushes(samples: &[Sample]) -> Vec<(f64, PushDirection, f64)> {
    samples
        .iter()
        .filter_map(|s| s.push_action().map(|p| (s.state.time, p.direction, p.magnitude)))
        .collect()
}

/// Stability per unit of force spent, 0..100. Without force it equals the
/// stability score.
pub fn efficiency_rating(samples: &[Sample], threshold: f64) -> f64 {
    let stability = super::basic::stability_score(samples, threshold);
    let total: f64 = pushes(samples).iter().map(|p| p.2).sum();
    if total <= 0.0 {
        return stability;
    }
    (stability / total.sqrt() * 10.0).clamp(0.0, 100.0)
}

/// (right − left) / total in [-1, 1]; `None` without pushes.
pub fn directional_bias(samples: &[Sample]) -> Option<f64> {
    let ps = pushes(samples);
    if ps.is_empty() {
        return None;
    }
    let right = ps.iter().filter(|p| p.1 == PushDirection::Right).count() as f64;
    let left = ps.len() as f64 - right;
    Some((right - left) / ps.len() as f64)
}

/// Percent of consecutive push pairs that reverse direction within the
/// overcorrection window.
pub fn overcorrection_rate(samples: &[Sample]) -> Option<f64> {
    let ps = pushes(samples);
    if ps.len() < MIN_PUSHES {
        return None;
    }
    let reversals = ps
        .windows(2)
        .filter(|w| w[0].1 != w[1].1 && w[1].0 - w[0].0 < OVERCORRECTION_WINDOW)
        .count();
    Some(100.0 * reversals as f64 / (ps.len() - 1) as f64)
}

/// Mean delay from every unstable sample to the next push.
pub fn average_correction_time(samples: &[Sample], threshold: f64) -> Option<f64> {
    let times = push_times(samples);
    let delays = samples
        .iter()
        .filter(|s| s.action.is_none() && s.state.deviation().abs() > threshold)
        .filter_map(|s| next_response(&times, s.state.time));
    mean(delays)
}

/// Mean delay from each threshold crossing (stable → unstable) to the next
/// push.
pub fn response_delay(samples: &[Sample], threshold: f64) -> Option<f64> {
    let times = push_times(samples);
    let delays = samples
        .windows(2)
        .filter(|w| {
            w[0].state.deviation().abs() <= threshold && w[1].state.deviation().abs() > threshold
        })
        .filter_map(|w| next_response(&times, w[1].state.time));
    mean(delays)
}

fn push_times(samples: &[Sample]) -> Vec<f64> {
    pushes(samples).into_iter().map(|p| p.0).collect()
}

/// Delay to the first push at or after `t`, if within the response window.
fn next_response(push_times: &[f64], t: f64) -> Option<f64> {
    let i = push_times.partition_point(|&pt| pt < t);
    push_times
        .get(i)
        .map(|&pt| pt - t)
        .filter(|&d| d < RESPONSE_WINDOW)
}

fn mean(xs: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = xs.fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    (n > 0).then(|| sum / n as f64)
}
