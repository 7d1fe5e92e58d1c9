/// Topology metrics: revolutions, basin residence, separatrix crossings.
use crate::config::PhysicsConfig;
use crate::mechanics::angle;
use crate::systems::sdk::Sample;

/// Net revolutions of raw θ between the first and last sample.
pub fn winding_number(samples: &[Sample]) -> Option<f64> {
    let (a, b) = (samples.first()?, samples.last()?);
    Some(angle::revolutions(a.state.theta, b.state.theta))
}

/// Percent of samples inside the stable region around upright.
pub fn basin_stability(samples: &[Sample], stable_region: f64) -> f64 {
    super::basic::stability_score(samples, stable_region)
}

/// Times total energy crosses the upright energy m g L, i.e. the pendulum
/// switches between swinging over the top and oscillating below it.
pub fn separatrix_crossings(samples: &[Sample], physics: &PhysicsConfig) -> i64 {
    let e_star = physics.equilibrium_energy();
    let mut prev: Option<bool> = None;
    let mut crossings = 0i64;
    for s in samples {
        let above = physics.energy(s.state.theta, s.state.theta_dot) > e_star;
        if prev.is_some_and(|p| p != above) {
            crossings += 1;
        }
        prev = Some(above);
    }
    crossings
}
