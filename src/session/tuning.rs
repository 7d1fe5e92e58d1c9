//! Perturbation calibration: pick the disturbance strength at which an AI
//! player of a given tier holds a target stability.
//!
//! θ = strength, simulate = a full seeded session, π = stability fraction,
//! update = proportional step against the stability error. Every run uses
//! the same seeds, so the loop is a deterministic function of strength.

use std::cell::Cell;

use tracing::{debug, info};

use crate::config::PendulumConfig;
use crate::mechanics::control;
use crate::refine_det;
use crate::session::BalanceSession;
use crate::systems::ai::SkillLevel;
use crate::systems::metrics::basic;
use crate::systems::perturbation::{MAX_STRENGTH, MIN_STRENGTH, PerturbationProfile};
use crate::systems::sdk::Sample;

#[derive(Clone, Debug)]
pub struct TuneConfig {
    /// Profile whose strength is tuned; its shape is kept.
    pub profile: PerturbationProfile,
    pub skill: SkillLevel,
    pub human_error: bool,
    /// Ticks per simulated session.
    pub ticks: usize,
    pub dt: f64,
    /// Proportional gain on the stability error.
    pub gain: f64,
    /// Accept when |stability − target| ≤ tolerance.
    pub tolerance: f64,
    pub max_iters: usize,
    pub seed: u64,
}

impl Default for TuneConfig {
    fn default() -> Self {
        Self {
            profile: PerturbationProfile::jiggle(0.5),
            skill: SkillLevel::Expert,
            human_error: false,
            ticks: 1500,
            dt: 0.02,
            gain: 2.0,
            tolerance: 0.05,
            max_iters: 20,
            seed: 7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TuneOutcome {
    pub strength: f64,
    /// Last measured stability fraction in [0, 1].
    pub stability: f64,
    pub iters: usize,
    pub converged: bool,
}

/// One seeded session at `strength`; returns its history.
pub fn simulate_session(cfg: &PendulumConfig, tune: &TuneConfig, strength: f64) -> Vec<Sample> {
    let mut c = *cfg;
    c.ai.skill = tune.skill;
    c.ai.human_error = tune.human_error;
    c.ai.seed = tune.seed;
    c.recorder.capacity = c.recorder.capacity.max(tune.ticks * 2);

    let mut s = BalanceSession::new(c);
    s.set_perturbation(tune.profile.with_strength(strength), tune.seed ^ 0x9E37_79B9);
    s.start();
    s.start_ai();
    s.run(tune.ticks, tune.dt);
    s.stop();
    s.samples()
}

/// Stability fraction of a history, in [0, 1].
pub fn stability_fraction(cfg: &PendulumConfig, samples: &[Sample]) -> f64 {
    basic::stability_score(samples, cfg.metrics.balance_threshold) / 100.0
}

/// Search strength in [MIN_STRENGTH, MAX_STRENGTH] so that stability lands
/// within tolerance of `target` (a fraction in [0, 1]).
pub fn calibrate_perturbation(cfg: &PendulumConfig, tune: &TuneConfig, target: f64) -> TuneOutcome {
    let target = target.clamp(0.0, 1.0);
    let start = tune.profile.strength.clamp(MIN_STRENGTH, MAX_STRENGTH);

    let last = Cell::new(f64::NAN);
    let iters = Cell::new(0usize);
    let done = Cell::new(false);

    let strength = refine_det(
        start,
        |s: &f64| simulate_session(cfg, tune, *s),
        |data: &Vec<Sample>| stability_fraction(cfg, data),
        |s: &f64, stability: &f64| {
            iters.set(iters.get() + 1);
            last.set(*stability);
            let err = target - stability;
            debug!(strength = *s, stability = *stability, err, "calibration step");
            if err.abs() <= tune.tolerance {
                done.set(true);
                return *s;
            }
            control::p_against_error(*s, err, tune.gain, MIN_STRENGTH, MAX_STRENGTH)
        },
        |_, _| done.get(),
        tune.max_iters,
    );

    let out = TuneOutcome {
        strength,
        stability: last.get(),
        iters: iters.get(),
        converged: done.get(),
    };
    info!(
        strength = out.strength,
        stability = out.stability,
        iters = out.iters,
        converged = out.converged,
        "perturbation calibrated"
    );
    out
}
