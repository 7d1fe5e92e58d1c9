/// Control mechanics: proportional tuning steps and the PD balancing law.

/// Proportional against signed error: x' = clamp(x - k * error).
#[inline]
pub fn p_against_error(x: f64, error: f64, k: f64, lo: f64, hi: f64) -> f64 {
    (x - k * error).clamp(lo, hi)
}

/// PD law on a deviation and its rate: u = -kp * e - kd * e'.
/// Positive `u` asks for a push to the right (increasing θ).
#[inline]
pub fn pd(error: f64, rate: f64, kp: f64, kd: f64) -> f64 {
    -kp * error - kd * rate
}

/// Zero inside the dead band, unchanged outside it.
#[inline]
pub fn dead_band(u: f64, band: f64) -> f64 {
    if u.abs() < band.abs() { 0.0 } else { u }
}
