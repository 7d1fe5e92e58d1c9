//! Scientific metrics over the (deviation, θ̇) phase plane.
//!
//! Deviation here is always the wrapped one in [-π, π]; energy uses raw θ
//! because the spring term depends on whole turns.

use std::f64::consts::PI;

use crate::config::PhysicsConfig;
use crate::systems::metrics::advanced::{self, MIN_PUSHES};
use crate::systems::sdk::Sample;

pub const ENERGY_MIN_SAMPLES: usize = 10;
pub const LYAPUNOV_MIN_SAMPLES: usize = 100;

/// Nearest neighbours closer than this in time are the same trajectory.
const LYAPUNOV_MIN_SEPARATION: usize = 10;
/// Steps the neighbour pair is followed for.
const LYAPUNOV_HORIZON: usize = 10;
const LYAPUNOV_MAX_REFERENCES: usize = 200;
const LYAPUNOV_MAX_CANDIDATES: usize = 2000;

/// Percent of a `grid × grid` cell partition of deviation ∈ [-π, π],
/// θ̇ ∈ [-omega_bound, omega_bound] visited at least once. Out-of-range
/// velocities land in the edge cells.
pub fn phase_space_coverage(samples: &[Sample], grid: usize, omega_bound: f64) -> f64 {
    if grid == 0 || samples.is_empty() {
        return 0.0;
    }
    let mut visited = vec![false; grid * grid];
    let last = (grid - 1) as f64;
    for s in samples {
        let x = ((s.state.deviation() + PI) / (2.0 * PI)).clamp(0.0, 1.0);
        let v = ((s.state.theta_dot + omega_bound) / (2.0 * omega_bound)).clamp(0.0, 1.0);
        if !(x.is_finite() && v.is_finite()) {
            continue;
        }
        let (i, j) = ((x * last) as usize, (v * last) as usize);
        visited[i * grid + j] = true;
    }
    let n = visited.iter().filter(|&&c| c).count();
    100.0 * n as f64 / (grid * grid) as f64
}

/// How tightly total energy is held at the upright level E* = m g L:
/// (1 − min(mean((E − E*)²) / E*², 1)) · 100.
pub fn energy_management(samples: &[Sample], physics: &PhysicsConfig) -> Option<f64> {
    if samples.len() < ENERGY_MIN_SAMPLES {
        return None;
    }
    let target = physics.equilibrium_energy();
    if target.abs() < f64::EPSILON {
        return None;
    }
    let mse = samples
        .iter()
        .map(|s| {
            let e = physics.energy(s.state.theta, s.state.theta_dot) - target;
            e * e
        })
        .sum::<f64>()
        / samples.len() as f64;
    let ratio = mse / (target * target);
    Some((1.0 - ratio.min(1.0)) * 100.0)
}

/// Largest-exponent estimate by nearest-neighbour divergence.
///
/// For a spread of reference points, find the closest phase-space point that
/// is at least a few samples away in time, follow both for a fixed horizon
/// and average ln(d_k / d_0) / Δt. Positive means nearby states drift apart.
pub fn lyapunov_exponent(samples: &[Sample]) -> Option<f64> {
    let n = samples.len();
    if n < LYAPUNOV_MIN_SAMPLES {
        return None;
    }
    let pts: Vec<(f64, f64, f64)> = samples
        .iter()
        .map(|s| (s.state.deviation(), s.state.theta_dot, s.state.time))
        .collect();
    let usable = n - LYAPUNOV_HORIZON;
    let ref_stride = (usable / LYAPUNOV_MAX_REFERENCES).max(1);
    let cand_stride = (usable / LYAPUNOV_MAX_CANDIDATES).max(1);

    let dist = |a: usize, b: usize| -> f64 {
        let (dx, dv) = (pts[a].0 - pts[b].0, pts[a].1 - pts[b].1);
        (dx * dx + dv * dv).sqrt()
    };

    let mut sum = 0.0;
    let mut count = 0usize;
    for i in (0..usable).step_by(ref_stride) {
        let mut best: Option<(usize, f64)> = None;
        for j in (0..usable).step_by(cand_stride) {
            if i.abs_diff(j) < LYAPUNOV_MIN_SEPARATION {
                continue;
            }
            let d = dist(i, j);
            if d > 1e-12 && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((j, d));
            }
        }
        let Some((j, d0)) = best else { continue };
        let dk = dist(i + LYAPUNOV_HORIZON, j + LYAPUNOV_HORIZON);
        let dt = pts[i + LYAPUNOV_HORIZON].2 - pts[i].2;
        if dk > 1e-12 && dt > 0.0 {
            let rate = (dk / d0).ln() / dt;
            if rate.is_finite() {
                sum += rate;
                count += 1;
            }
        }
    }
    (count > 0).then(|| sum / count as f64)
}

pub const STEADY_RHYTHM: &str = "Steady Rhythm";
pub const VARIABLE_FORCE: &str = "Variable Force";
pub const REACTIVE_TIMING: &str = "Reactive Timing";
pub const GENTLE_TOUCH: &str = "Gentle Touch";
pub const AGGRESSIVE_CONTROL: &str = "Aggressive Control";
pub const ADAPTIVE_MIXED: &str = "Adaptive Mixed";

/// Classify the push pattern by magnitude spread and timing regularity.
pub fn control_strategy(samples: &[Sample]) -> Option<&'static str> {
    let ps = advanced::pushes(samples);
    if ps.len() < MIN_PUSHES {
        return None;
    }
    let mags: Vec<f64> = ps.iter().map(|p| p.2).collect();
    let intervals: Vec<f64> = ps.windows(2).map(|w| w[1].0 - w[0].0).collect();
    let (mean_force, force_var) = mean_var(&mags);
    let (_, interval_var) = mean_var(&intervals);

    let label = if force_var < 0.1 && interval_var < 0.1 {
        STEADY_RHYTHM
    } else if force_var > 0.5 && interval_var < 0.2 {
        VARIABLE_FORCE
    } else if force_var < 0.2 && interval_var > 0.5 {
        REACTIVE_TIMING
    } else if mean_force < 0.3 {
        GENTLE_TOUCH
    } else if mean_force > 0.7 {
        AGGRESSIVE_CONTROL
    } else {
        ADAPTIVE_MIXED
    };
    Some(label)
}

/// θ̇ sign reversals per second. Exact zeros don't break a run.
pub fn state_transition_frequency(samples: &[Sample]) -> Option<f64> {
    let duration = super::basic::session_time(samples);
    if duration <= 0.0 {
        return None;
    }
    let mut prev = 0.0_f64;
    let mut reversals = 0usize;
    for s in samples {
        let v = s.state.theta_dot;
        if v == 0.0 || !v.is_finite() {
            continue;
        }
        if prev != 0.0 && v.signum() != prev.signum() {
            reversals += 1;
        }
        prev = v;
    }
    Some(reversals as f64 / duration)
}

/// Population standard deviation of |deviation| (rad).
pub fn angular_deviation(samples: &[Sample]) -> f64 {
    let xs: Vec<f64> = samples.iter().map(|s| s.state.deviation().abs()).collect();
    mean_var(&xs).1.sqrt()
}

fn mean_var(xs: &[f64]) -> (f64, f64) {
    if xs.is_empty() {
        return (0.0, 0.0);
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    (mean, var)
}
