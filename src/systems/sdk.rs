// src/systems/sdk.rs

//! # Systems SDK
//!
//! Shared vocabulary for the **systems** (simulator, AI, recorder, metrics,
//! perturbation) plus a small hook protocol the session driver calls into.
//! Every system speaks in these types so they can be wired together by a
//! driver without knowing about each other.
//!
//! ## The data model
//! - [`PendulumState`]: one snapshot `(θ, θ̇, t)`. θ is *raw*: it is never
//!   wrapped, so whole revolutions survive. Use [`PendulumState::deviation`]
//!   for the canonical signed distance from upright in `[-π, π]`.
//! - [`PushDirection`] / [`PushAction`]: a discrete lateral impulse.
//!   `Right` is positive and means "toward increasing θ".
//! - [`Issuer`]: who pushed (player or AI).
//! - [`Sample`]: one recorder entry, a state plus an optional push.
//! - [`PushEvent`]: what the AI emits over its channel; the driver turns it
//!   into `apply_force` and a recorded sample.
//!
//! ## Who owns what
//! - The simulator exclusively owns the live state; everyone else sees
//!   copies (`PendulumState` is `Copy`).
//! - The recorder owns history. Metrics read a `&[Sample]` snapshot and
//!   never mutate it.
//! - The AI never touches the simulator. It returns push events and, for a
//!   subscriber, sends them on a channel; the driver applies them.
//!
//! ## Hooks (optional observers)
//! Implement [`SessionHook`] to watch a running session without editing the
//! driver (telemetry, live charts, achievement checks). Every method has a
//! no-op default; override only what you need.
//!
//! ## Determinism
//! - Physics is deterministic given `(dt, forces)`.
//! - Every stochastic system takes an explicit seed.
//!
//! ## Testing a system
//! - Integration tests live at `tests/<system>.rs`.
//! - Feed synthetic states into the AI and assert on emitted events; no
//!   live simulator needed.
//!
//! ## Feature flags
//! - Optional systems are gated with `feature = "system-*"`.
//! - Do not import session code here; sessions compose systems, not the
//!   other way round.

use serde::{Deserialize, Serialize};

use crate::mechanics::angle;

/// Snapshot of the pendulum at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PendulumState {
    /// Raw angle (rad). Upright at π; never renormalized.
    pub theta: f64,
    /// Angular velocity (rad/s).
    pub theta_dot: f64,
    /// Simulation time (s), non-decreasing within a run.
    pub time: f64,
}

impl PendulumState {
    pub fn new(theta: f64, theta_dot: f64, time: f64) -> Self {
        Self { theta, theta_dot, time }
    }

    /// Signed deviation from upright in [-π, π].
    pub fn deviation(&self) -> f64 {
        angle::deviation(self.theta)
    }

    /// Unwrapped θ − π.
    pub fn raw_deviation(&self) -> f64 {
        angle::raw_deviation(self.theta)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PushDirection {
    Left,
    Right,
}

impl PushDirection {
    /// -1 for left, +1 for right.
    pub fn sign(self) -> f64 {
        match self {
            PushDirection::Left => -1.0,
            PushDirection::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            PushDirection::Left => PushDirection::Right,
            PushDirection::Right => PushDirection::Left,
        }
    }

    /// Direction of a signed force; `None` for zero or NaN.
    pub fn from_signed(force: f64) -> Option<Self> {
        if force > 0.0 {
            Some(PushDirection::Right)
        } else if force < 0.0 {
            Some(PushDirection::Left)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PushDirection::Left => "left",
            PushDirection::Right => "right",
        }
    }
}

/// A discrete lateral impulse. `magnitude` is always > 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushAction {
    pub direction: PushDirection,
    pub magnitude: f64,
}

impl PushAction {
    pub fn new(direction: PushDirection, magnitude: f64) -> Self {
        Self {
            direction,
            magnitude: magnitude.abs(),
        }
    }

    /// Split a signed force into direction and magnitude.
    pub fn from_signed(force: f64) -> Option<Self> {
        PushDirection::from_signed(force).map(|d| Self::new(d, force))
    }

    /// Signed force as handed to `apply_force`.
    pub fn signed(&self) -> f64 {
        self.direction.sign() * self.magnitude
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Issuer {
    Player,
    Ai,
}

impl Issuer {
    pub fn label(self) -> &'static str {
        match self {
            Issuer::Player => "player",
            Issuer::Ai => "ai",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleAction {
    pub push: PushAction,
    pub issuer: Issuer,
}

/// One recorder entry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub state: PendulumState,
    pub action: Option<SampleAction>,
}

impl Sample {
    pub fn tick(state: PendulumState) -> Self {
        Self { state, action: None }
    }

    pub fn push(state: PendulumState, push: PushAction, issuer: Issuer) -> Self {
        Self {
            state,
            action: Some(SampleAction { push, issuer }),
        }
    }

    pub fn push_action(&self) -> Option<&PushAction> {
        self.action.as_ref().map(|a| &a.push)
    }
}

/// A push decided by the AI, emitted once its reaction delay elapsed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    pub direction: PushDirection,
    pub magnitude: f64,
    /// Time of emission (s).
    pub time: f64,
}

impl PushEvent {
    pub fn action(&self) -> PushAction {
        PushAction::new(self.direction, self.magnitude)
    }

    pub fn signed(&self) -> f64 {
        self.action().signed()
    }
}

/// Observer of a running session.
pub trait SessionHook {
    /// (Optional) called after every simulator step with the new state.
    fn on_tick(&mut self, _state: &PendulumState) {}
    /// (Optional) called for every push applied, player or AI.
    fn on_push(&mut self, _state: &PendulumState, _push: &PushAction, _issuer: Issuer) {}
    /// (Optional) called for every perturbation force applied.
    fn on_perturbation(&mut self, _state: &PendulumState, _force: f64) {}
}
