/// Energy mechanics for the inverted pendulum (φ = θ − π, upright at φ = 0).

/// Effective inertia about the pivot: m L² + I₀.
#[inline]
pub fn inertia(mass: f64, length: f64, moment_of_inertia: f64) -> f64 {
    mass * length * length + moment_of_inertia
}

/// Kinetic term ½ I ω².
#[inline]
pub fn kinetic(inertia: f64, omega: f64) -> f64 {
    0.5 * inertia * omega * omega
}

/// Gravity + torsional spring: m g L cos φ + ½ k φ².
#[inline]
pub fn potential(mass: f64, gravity: f64, length: f64, spring: f64, phi: f64) -> f64 {
    mass * gravity * length * phi.cos() + 0.5 * spring * phi * phi
}

/// Energy of the upright pendulum at rest: m g L.
#[inline]
pub fn upright(mass: f64, gravity: f64, length: f64) -> f64 {
    mass * gravity * length
}

