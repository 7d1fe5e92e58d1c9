//! AI player: skill-tiered PD balancing with reaction latency and optional
//! human error. Decisions leave the controller as the return value of
//! [`AiController::update_pendulum_state`] and, once someone has called
//! [`AiController::subscribe`], as [`PushEvent`]s on a crossbeam channel.
//! The controller never touches the simulator.

use bevy_prng::WyRand;
use crossbeam_channel::{Receiver, Sender, unbounded};
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::AiConfig;
use crate::mechanics::{angle, control, stoch};
use crate::systems::sdk::{PushDirection, PushEvent};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
    Perfect,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 5] = [
        SkillLevel::Beginner,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
        SkillLevel::Expert,
        SkillLevel::Perfect,
    ];

    pub fn profile(self) -> SkillProfile {
        let (reaction_min, reaction_max, error_rate, error_severity, force_accuracy, anticipation) =
            match self {
                SkillLevel::Beginner => (0.4, 0.8, 0.30, 0.50, 0.60, 0.2),
                SkillLevel::Intermediate => (0.3, 0.5, 0.20, 0.30, 0.75, 0.4),
                SkillLevel::Advanced => (0.2, 0.4, 0.10, 0.20, 0.85, 0.6),
                SkillLevel::Expert => (0.1, 0.3, 0.05, 0.10, 0.95, 0.8),
                SkillLevel::Perfect => (0.05, 0.1, 0.0, 0.0, 1.0, 1.0),
            };
        SkillProfile {
            reaction_min,
            reaction_max,
            error_rate,
            error_severity,
            force_accuracy,
            anticipation,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
            SkillLevel::Perfect => "Perfect",
        }
    }
}

/// Per-tier behaviour knobs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    /// Reaction time range (s).
    pub reaction_min: f64,
    pub reaction_max: f64,
    /// Probability that a decision is corrupted.
    pub error_rate: f64,
    /// Spread of magnitude errors.
    pub error_severity: f64,
    /// Fraction of the ideal force actually delivered.
    pub force_accuracy: f64,
    /// How far ahead the controller extrapolates, in [0, 1].
    pub anticipation: f64,
}

impl SkillProfile {
    /// Force every knob into its valid range.
    pub fn clamped(self) -> Self {
        let reaction_min = self.reaction_min.max(0.0);
        Self {
            reaction_min,
            reaction_max: self.reaction_max.max(reaction_min),
            error_rate: self.error_rate.clamp(0.0, 1.0),
            error_severity: self.error_severity.clamp(0.0, 1.0),
            force_accuracy: self.force_accuracy.clamp(0.0, 1.0),
            anticipation: self.anticipation.clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlStrategy {
    Reactive,
    Predictive,
    Aggressive,
    Gentle,
}

impl ControlStrategy {
    /// (kp, kd) for natural frequency ω₀.
    pub fn gains(self, omega0: f64) -> (f64, f64) {
        let w2 = omega0 * omega0;
        match self {
            ControlStrategy::Reactive => (2.0 * w2, 2.0 * omega0),
            ControlStrategy::Predictive => (1.5 * w2, 3.0 * omega0),
            ControlStrategy::Aggressive => (3.0 * w2, 2.5 * omega0),
            ControlStrategy::Gentle => (w2, 1.5 * omega0),
        }
    }

    /// Rotation order used by learning.
    pub fn next(self) -> Self {
        match self {
            ControlStrategy::Reactive => ControlStrategy::Predictive,
            ControlStrategy::Predictive => ControlStrategy::Aggressive,
            ControlStrategy::Aggressive => ControlStrategy::Gentle,
            ControlStrategy::Gentle => ControlStrategy::Reactive,
        }
    }

    /// Pick a strategy from the observed state.
    pub fn for_state(deviation: f64, velocity: f64) -> Self {
        let (d, v) = (deviation.abs(), velocity.abs());
        if d > 0.5 {
            ControlStrategy::Aggressive
        } else if d < 0.1 && v < 0.5 {
            ControlStrategy::Gentle
        } else if v > 1.0 {
            ControlStrategy::Predictive
        } else {
            ControlStrategy::Reactive
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiState {
    Idle,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingPush {
    direction: PushDirection,
    magnitude: f64,
    due: f64,
}

/// Learning needs this many outcomes before it judges a strategy.
const LEARNING_WINDOW: u32 = 5;
const LEARNING_MIN_SUCCESS: f64 = 0.3;
/// Deviation at which urgency saturates (rad).
const URGENCY_SPAN: f64 = 0.5;
const TIMING_ERROR: f64 = 0.1;
const WRONG_DIRECTION_SCALE: f64 = 0.7;

pub struct AiController {
    cfg: AiConfig,
    profile: SkillProfile,
    state: AiState,
    strategy: ControlStrategy,
    rng: WyRand,
    pending: Option<PendingPush>,
    last_push: Option<f64>,
    decisions: u64,
    interventions: u64,
    successes: u32,
    failures: u32,
    tx: Option<Sender<PushEvent>>,
}

impl AiController {
    pub fn new(cfg: AiConfig) -> Self {
        Self {
            profile: cfg.skill.profile().clamped(),
            rng: WyRand::from_seed(cfg.seed.to_le_bytes()),
            cfg,
            state: AiState::Idle,
            strategy: ControlStrategy::Reactive,
            pending: None,
            last_push: None,
            decisions: 0,
            interventions: 0,
            successes: 0,
            failures: 0,
            tx: None,
        }
    }

    /// Open the push channel. Only pushes emitted after this call are sent,
    /// and a new subscription replaces the previous one. Dropping the
    /// receiver closes the channel again.
    pub fn subscribe(&mut self) -> Receiver<PushEvent> {
        let (tx, rx) = unbounded();
        self.tx = Some(tx);
        rx
    }

    pub fn is_subscribed(&self) -> bool {
        self.tx.is_some()
    }

    pub fn config(&self) -> &AiConfig {
        &self.cfg
    }

    pub fn skill_level(&self) -> SkillLevel {
        self.cfg.skill
    }

    pub fn set_skill_level(&mut self, skill: SkillLevel) {
        self.cfg.skill = skill;
        self.profile = skill.profile().clamped();
        debug!(skill = skill.name(), "ai skill changed");
    }

    /// Override the tier profile; values are clamped, never rejected.
    pub fn set_profile(&mut self, profile: SkillProfile) {
        self.profile = profile.clamped();
    }

    pub fn profile(&self) -> &SkillProfile {
        &self.profile
    }

    pub fn set_human_error(&mut self, enabled: bool) {
        self.cfg.human_error = enabled;
    }

    pub fn strategy(&self) -> ControlStrategy {
        self.strategy
    }

    /// Fixed strategy used when adaptive selection is off.
    pub fn set_strategy(&mut self, strategy: ControlStrategy) {
        self.strategy = strategy;
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == AiState::Playing
    }

    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    pub fn interventions(&self) -> u64 {
        self.interventions
    }

    pub fn reset_counters(&mut self) {
        self.decisions = 0;
        self.interventions = 0;
    }

    /// Forget timing state and counters, e.g. when the clock restarts at 0.
    /// Playing/idle is kept.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_push = None;
        self.successes = 0;
        self.failures = 0;
        self.reset_counters();
    }

    pub fn start_playing(&mut self) {
        self.state = AiState::Playing;
        self.pending = None;
        self.last_push = None;
        info!(skill = self.cfg.skill.name(), "ai started playing");
    }

    /// Back to idle; a push still waiting on its reaction delay is dropped.
    pub fn stop_playing(&mut self) {
        if self.pending.take().is_some() {
            debug!("pending ai push discarded");
        }
        self.state = AiState::Idle;
        info!(
            decisions = self.decisions,
            interventions = self.interventions,
            "ai stopped playing"
        );
    }

    /// Per-tick input. Returns the push emitted on this tick, if any; the
    /// same event is also sent to the [`Self::subscribe`] receiver.
    pub fn update_pendulum_state(&mut self, angle: f64, angle_velocity: f64, time: f64) -> Option<PushEvent> {
        if self.state != AiState::Playing {
            return None;
        }

        if let Some(p) = self.pending {
            if time >= p.due {
                self.pending = None;
                return Some(self.emit(p, time));
            }
            return None;
        }

        if let Some(last) = self.last_push {
            if time - last < self.cfg.min_push_interval {
                return None;
            }
        }

        let deviation = angle::deviation(angle);
        let pending = self.decide(deviation, angle_velocity, time)?;
        if time >= pending.due {
            return Some(self.emit(pending, time));
        }
        self.pending = Some(pending);
        None
    }

    /// Feed the outcome of a balancing attempt to the learning rule.
    pub fn notify_balance_success(&mut self) {
        self.successes += 1;
        self.learn();
    }

    pub fn notify_balance_failure(&mut self) {
        self.failures += 1;
        self.learn();
    }

    /// Classify one observed angle as success, failure or neither, and
    /// notify accordingly. Ignored while idle.
    pub fn report_outcome(&mut self, angle: f64) {
        if self.state != AiState::Playing {
            return;
        }
        let d = angle::deviation(angle).abs();
        if d < self.cfg.success_deviation {
            self.notify_balance_success();
        } else if d > self.cfg.failure_deviation {
            self.notify_balance_failure();
        }
    }

    fn decide(&mut self, deviation: f64, velocity: f64, time: f64) -> Option<PendingPush> {
        self.decisions += 1;
        let p = self.profile;

        let strategy = if self.cfg.adaptive_strategy {
            ControlStrategy::for_state(deviation, velocity)
        } else {
            self.strategy
        };
        let anticipated = deviation + velocity * p.anticipation * self.cfg.anticipation_horizon;
        let (kp, kd) = strategy.gains(self.cfg.natural_frequency);
        let u = control::dead_band(control::pd(anticipated, velocity, kp, kd), self.cfg.deadband);
        let mut direction = PushDirection::from_signed(u)?;
        let mut magnitude = u.abs().min(self.cfg.max_force) * p.force_accuracy;

        let urgency = 1.0 - (deviation.abs() / URGENCY_SPAN).min(0.5);
        let mut delay = stoch::uniform(&mut self.rng, p.reaction_min, p.reaction_max) * urgency;

        if self.cfg.human_error {
            if stoch::bernoulli(&mut self.rng, p.error_rate) {
                match stoch::index(&mut self.rng, 4) {
                    0 => {
                        direction = direction.opposite();
                        magnitude *= WRONG_DIRECTION_SCALE;
                        debug!(time, "ai error: wrong direction");
                    }
                    1 => {
                        let s = p.error_severity;
                        magnitude *= stoch::uniform(&mut self.rng, 1.0 - s, 1.0 + s);
                        debug!(time, magnitude, "ai error: magnitude");
                    }
                    2 => {
                        delay = (delay + stoch::sign(&mut self.rng) * TIMING_ERROR).max(0.0);
                        debug!(time, delay, "ai error: timing");
                    }
                    _ => {
                        debug!(time, "ai error: missed push");
                        return None;
                    }
                }
            }
            magnitude *= stoch::jitter(&mut self.rng, 0.05, 0.9, 1.1);
        }

        let magnitude = magnitude.min(self.cfg.max_force);
        if magnitude <= 0.0 {
            return None;
        }
        trace!(
            time,
            deviation,
            ?strategy,
            ?direction,
            magnitude,
            delay,
            "ai decision"
        );
        Some(PendingPush {
            direction,
            magnitude,
            due: time + delay,
        })
    }

    fn emit(&mut self, p: PendingPush, time: f64) -> PushEvent {
        self.interventions += 1;
        self.last_push = Some(time);
        let ev = PushEvent {
            direction: p.direction,
            magnitude: p.magnitude,
            time,
        };
        let closed = self.tx.as_ref().is_some_and(|tx| tx.send(ev).is_err());
        if closed {
            debug!("push receiver dropped, closing channel");
            self.tx = None;
        }
        debug!(time, direction = p.direction.label(), magnitude = p.magnitude, "ai push");
        ev
    }

    fn learn(&mut self) {
        if !self.cfg.learning {
            self.successes = 0;
            self.failures = 0;
            return;
        }
        let total = self.successes + self.failures;
        if total < LEARNING_WINDOW {
            return;
        }
        let rate = self.successes as f64 / total as f64;
        if rate < LEARNING_MIN_SUCCESS {
            let next = self.strategy.next();
            info!(rate, from = ?self.strategy, to = ?next, "ai switching strategy");
            self.strategy = next;
        }
        self.successes = 0;
        self.failures = 0;
    }
}
