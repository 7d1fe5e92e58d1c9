//! angle: normalization on read.
//! Raw θ is never wrapped by the simulator; readers that need "distance from
//! vertical" go through [`deviation`].

use std::f64::consts::PI;

/// Upright equilibrium in the simulator's convention.
pub const UPRIGHT: f64 = PI;

/// Signed deviation from upright in [-π, π]: atan2(sin(θ − π), cos(θ − π)).
/// Positive means tilted right.
#[inline]
pub fn deviation(theta: f64) -> f64 {
    let phi = theta - UPRIGHT;
    phi.sin().atan2(phi.cos())
}

/// Unwrapped deviation θ − π (keeps whole revolutions).
#[inline]
pub fn raw_deviation(theta: f64) -> f64 {
    theta - UPRIGHT
}

/// Full revolutions between two raw angles.
#[inline]
pub fn revolutions(from: f64, to: f64) -> f64 {
    (to - from) / (2.0 * PI)
}
