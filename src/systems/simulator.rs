//! Inverted-pendulum simulator: RK4 over (θ, θ̇) with upright at θ = π.
//!
//! With φ = θ − π and I = m L² + I₀:
//!   θ̈ = (m g L / I) sin φ − (k / I) φ − (b / I) θ̇ + A sin(2π f t)
//!
//! θ is never wrapped after a step. Impulses change θ̇ instantly.

use std::f64::consts::PI;

use tracing::{info, trace};

use crate::config::PhysicsConfig;
use crate::systems::sdk::PendulumState;

#[derive(Clone, Debug)]
pub struct PendulumSimulator {
    cfg: PhysicsConfig,
    state: PendulumState,
    running: bool,
}

impl PendulumSimulator {
    /// A stopped simulator at the reset pose.
    pub fn new(cfg: PhysicsConfig) -> Self {
        Self {
            state: initial_state(&cfg),
            cfg,
            running: false,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.cfg
    }

    /// Swap physical parameters; state is kept.
    pub fn set_config(&mut self, cfg: PhysicsConfig) {
        self.cfg = cfg;
    }

    pub fn state(&self) -> PendulumState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!(time = self.state.time, "simulator started");
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!(time = self.state.time, "simulator stopped");
        }
    }

    /// θ = π − initial_offset, θ̇ = 0, t = 0. Running flag is untouched.
    pub fn reset(&mut self) {
        self.state = initial_state(&self.cfg);
        info!(theta = self.state.theta, "simulator reset");
    }

    pub fn reset_with_angle(&mut self, theta: f64) {
        self.state = PendulumState::new(theta, 0.0, 0.0);
        info!(theta, "simulator reset");
    }

    /// One RK4 step of size `dt`. No-op while stopped; `dt` is not validated.
    pub fn step(&mut self, dt: f64) {
        if !self.running {
            return;
        }
        let PendulumState { theta, theta_dot, time } = self.state;
        let h = 0.5 * dt;

        let k1_th = theta_dot;
        let k1_om = self.angular_acceleration(theta, theta_dot, time);

        let k2_th = theta_dot + h * k1_om;
        let k2_om = self.angular_acceleration(theta + h * k1_th, k2_th, time + h);

        let k3_th = theta_dot + h * k2_om;
        let k3_om = self.angular_acceleration(theta + h * k2_th, k3_th, time + h);

        let k4_th = theta_dot + dt * k3_om;
        let k4_om = self.angular_acceleration(theta + dt * k3_th, k4_th, time + dt);

        self.state = PendulumState {
            theta: theta + dt / 6.0 * (k1_th + 2.0 * k2_th + 2.0 * k3_th + k4_th),
            theta_dot: theta_dot + dt / 6.0 * (k1_om + 2.0 * k2_om + 2.0 * k3_om + k4_om),
            time: time + dt,
        };
    }

    /// Instantaneous Δθ̇ = force · impulse_gain. Positive pushes right.
    pub fn apply_force(&mut self, force: f64) {
        self.state.theta_dot += force * self.cfg.impulse_gain;
        trace!(force, theta_dot = self.state.theta_dot, "impulse applied");
    }

    /// θ̈ at an arbitrary point; used by the integrator.
    pub fn angular_acceleration(&self, theta: f64, theta_dot: f64, time: f64) -> f64 {
        let phi = theta - PI;
        let drive = if self.cfg.drive_amplitude != 0.0 {
            self.cfg.drive_amplitude * (2.0 * PI * self.cfg.drive_frequency * time).sin()
        } else {
            0.0
        };
        self.cfg.ka() * phi.sin() - self.cfg.ks() * phi - self.cfg.kb() * theta_dot + drive
    }

    /// Total mechanical energy of the current state.
    pub fn energy(&self) -> f64 {
        self.cfg.energy(self.state.theta, self.state.theta_dot)
    }
}

impl Default for PendulumSimulator {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

fn initial_state(cfg: &PhysicsConfig) -> PendulumState {
    PendulumState::new(PI - cfg.initial_offset, 0.0, 0.0)
}
