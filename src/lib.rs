/*!
`pendulum_balance` — the physics/control/analysis core of a pendulum
balancing game.

What it does
- Integrates an inverted pendulum (upright at θ = π) under gravity, a
  torsional spring, damping, an optional sinusoidal drive and discrete
  lateral impulses (`systems::simulator`).
- Plays the pendulum with a skill-tiered AI that observes state each tick
  and emits push events to a channel subscriber (`systems::ai`).
- Keeps a bounded history of (state, optional push) samples and derives a
  catalog of control-quality metrics from it (`systems::recorder`,
  `systems::metrics`).
- Wires all of the above into a tick loop (`session::BalanceSession`) and,
  with `session-tuning`, calibrates perturbation strength through the
  closed refinement loop below.

How to use (call surface only)
- Build a `config::PendulumConfig` (defaults, or JSON via `load`).
- Create a `session::BalanceSession`, call `tick(dt)` from your loop, and
  read `metrics(category)` whenever a panel needs numbers.
- Or use the systems directly: `PendulumSimulator::step`,
  `AiController::update_pendulum_state`, `Recorder::record_snapshot`,
  `MetricsEngine::calculate_metrics`.

Sign convention
- Positive force, `PushDirection::Right` and positive deviation all mean
  "toward increasing θ". Every call site uses this.

What it does NOT do
- No rendering, persistence, or scheduling. The caller owns the clock.
*/

pub mod config;
pub mod error;
pub mod mechanics;
pub mod session;
pub mod systems;

pub use config::PendulumConfig;
pub use error::{ConfigError, ExportError};
pub use systems::sdk::{Issuer, PendulumState, PushAction, PushDirection, PushEvent, Sample};

/// Deterministic refinement: θ_{t+1} = update(θ_t, measure(simulate(θ_t))).
///
/// Stops as soon as `converged(θ_t, θ_{t+1})` holds and returns θ_{t+1};
/// otherwise returns the last θ after `max_iters` passes.
pub fn refine_det<P, D, M, Sim, Meas, Upd, Conv>(
    mut theta: P,
    mut simulate: Sim,
    mut measure: Meas,
    mut update: Upd,
    converged: Conv,
    max_iters: usize,
) -> P
where
    Sim: FnMut(&P) -> D,
    Meas: FnMut(&D) -> M,
    Upd: FnMut(&P, &M) -> P,
    Conv: Fn(&P, &P) -> bool,
{
    for _ in 0..max_iters {
        let data = simulate(&theta);
        let pi = measure(&data);
        let theta_next = update(&theta, &pi);
        if converged(&theta, &theta_next) {
            return theta_next;
        }
        theta = theta_next;
    }
    theta
}
