use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::mechanics::energy;
use crate::systems::ai::SkillLevel;

/// Physical parameters of the pendulum and of the push actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "PhysicsConfig::default_mass")]
    pub mass: f64,
    #[serde(default = "PhysicsConfig::default_length")]
    pub length: f64,
    #[serde(default = "PhysicsConfig::default_gravity")]
    pub gravity: f64,
    #[serde(default = "PhysicsConfig::default_damping")]
    pub damping: f64,
    #[serde(default = "PhysicsConfig::default_spring_constant")]
    pub spring_constant: f64,
    #[serde(default = "PhysicsConfig::default_moment_of_inertia")]
    pub moment_of_inertia: f64,
    /// External drive frequency (Hz).
    #[serde(default)]
    pub drive_frequency: f64,
    /// External drive amplitude (rad/s²).
    #[serde(default)]
    pub drive_amplitude: f64,
    /// Δθ̇ per unit of applied force.
    #[serde(default = "PhysicsConfig::default_impulse_gain")]
    pub impulse_gain: f64,
    /// `reset()` starts at θ = π − initial_offset.
    #[serde(default = "PhysicsConfig::default_initial_offset")]
    pub initial_offset: f64,
}

impl PhysicsConfig {
    fn default_mass() -> f64 {
        1.0
    }
    fn default_length() -> f64 {
        1.0
    }
    fn default_gravity() -> f64 {
        9.81
    }
    fn default_damping() -> f64 {
        0.4
    }
    fn default_spring_constant() -> f64 {
        0.20
    }
    fn default_moment_of_inertia() -> f64 {
        1.0
    }
    fn default_impulse_gain() -> f64 {
        0.3
    }
    fn default_initial_offset() -> f64 {
        0.3
    }

    /// m L² + I₀.
    pub fn inertia(&self) -> f64 {
        energy::inertia(self.mass, self.length, self.moment_of_inertia)
    }

    /// Gravity coefficient m g L / I.
    pub fn ka(&self) -> f64 {
        self.mass * self.length * self.gravity / self.inertia()
    }

    /// Spring coefficient k / I.
    pub fn ks(&self) -> f64 {
        self.spring_constant / self.inertia()
    }

    /// Damping coefficient b / I.
    pub fn kb(&self) -> f64 {
        self.damping / self.inertia()
    }

    /// Total mechanical energy at (θ, θ̇); non-increasing without forcing.
    pub fn energy(&self, theta: f64, theta_dot: f64) -> f64 {
        let phi = theta - PI;
        energy::kinetic(self.inertia(), theta_dot)
            + energy::potential(self.mass, self.gravity, self.length, self.spring_constant, phi)
    }

    /// Energy of the balanced, resting pendulum.
    pub fn equilibrium_energy(&self) -> f64 {
        energy::upright(self.mass, self.gravity, self.length)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("physics.mass", self.mass)?;
        positive("physics.length", self.length)?;
        positive("physics.gravity", self.gravity)?;
        non_negative("physics.damping", self.damping)?;
        non_negative("physics.spring_constant", self.spring_constant)?;
        non_negative("physics.moment_of_inertia", self.moment_of_inertia)?;
        non_negative("physics.drive_frequency", self.drive_frequency)?;
        finite("physics.drive_amplitude", self.drive_amplitude)?;
        positive("physics.impulse_gain", self.impulse_gain)?;
        finite("physics.initial_offset", self.initial_offset)?;
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            mass: Self::default_mass(),
            length: Self::default_length(),
            gravity: Self::default_gravity(),
            damping: Self::default_damping(),
            spring_constant: Self::default_spring_constant(),
            moment_of_inertia: Self::default_moment_of_inertia(),
            drive_frequency: 0.0,
            drive_amplitude: 0.0,
            impulse_gain: Self::default_impulse_gain(),
            initial_offset: Self::default_initial_offset(),
        }
    }
}

/// AI controller tunables. Out-of-range values are clamped by the
/// controller, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub skill: SkillLevel,
    #[serde(default = "AiConfig::default_true")]
    pub human_error: bool,
    #[serde(default = "AiConfig::default_true")]
    pub adaptive_strategy: bool,
    #[serde(default)]
    pub learning: bool,
    #[serde(default = "AiConfig::default_seed")]
    pub seed: u64,
    /// ω₀ used to scale the PD gains.
    #[serde(default = "AiConfig::default_natural_frequency")]
    pub natural_frequency: f64,
    #[serde(default = "AiConfig::default_deadband")]
    pub deadband: f64,
    #[serde(default = "AiConfig::default_max_force")]
    pub max_force: f64,
    /// Seconds between two emitted pushes, at least.
    #[serde(default = "AiConfig::default_min_push_interval")]
    pub min_push_interval: f64,
    /// Look-ahead (s) scaled by the skill's anticipation factor.
    #[serde(default = "AiConfig::default_anticipation_horizon")]
    pub anticipation_horizon: f64,
    /// |deviation| below which a tick counts as a balance success (rad).
    #[serde(default = "AiConfig::default_success_deviation")]
    pub success_deviation: f64,
    /// |deviation| above which a tick counts as a balance failure (rad).
    #[serde(default = "AiConfig::default_failure_deviation")]
    pub failure_deviation: f64,
}

impl AiConfig {
    fn default_true() -> bool {
        true
    }
    fn default_seed() -> u64 {
        0x5EED_BA1A
    }
    fn default_natural_frequency() -> f64 {
        (9.81_f64 / 3.0).sqrt()
    }
    fn default_deadband() -> f64 {
        0.1
    }
    fn default_max_force() -> f64 {
        3.0
    }
    fn default_min_push_interval() -> f64 {
        0.1
    }
    fn default_anticipation_horizon() -> f64 {
        0.1
    }
    fn default_success_deviation() -> f64 {
        0.15
    }
    fn default_failure_deviation() -> f64 {
        1.5
    }

    pub fn with_skill(skill: SkillLevel) -> Self {
        Self {
            skill,
            ..Self::default()
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            skill: SkillLevel::default(),
            human_error: true,
            adaptive_strategy: true,
            learning: false,
            seed: Self::default_seed(),
            natural_frequency: Self::default_natural_frequency(),
            deadband: Self::default_deadband(),
            max_force: Self::default_max_force(),
            min_push_interval: Self::default_min_push_interval(),
            anticipation_horizon: Self::default_anticipation_horizon(),
            success_deviation: Self::default_success_deviation(),
            failure_deviation: Self::default_failure_deviation(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Ring capacity in samples.
    #[serde(default = "RecorderConfig::default_capacity")]
    pub capacity: usize,
}

impl RecorderConfig {
    /// Ten minutes at 60 Hz.
    pub const DEFAULT_CAPACITY: usize = 36_000;

    fn default_capacity() -> usize {
        Self::DEFAULT_CAPACITY
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "recorder.capacity",
                reason: "must hold at least one sample".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
        }
    }
}

/// Thresholds and grid used by the metrics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// |deviation| counted as balanced (~20°).
    #[serde(default = "MetricsConfig::default_balance_threshold")]
    pub balance_threshold: f64,
    /// |deviation| that starts an instability event.
    #[serde(default = "MetricsConfig::default_instability_threshold")]
    pub instability_threshold: f64,
    /// |deviation| counted as inside the stable basin.
    #[serde(default = "MetricsConfig::default_stable_region")]
    pub stable_region: f64,
    #[serde(default = "MetricsConfig::default_grid_size")]
    pub phase_grid: usize,
    /// Phase grid spans θ̇ ∈ [-omega_bound, omega_bound].
    #[serde(default = "MetricsConfig::default_omega_bound")]
    pub omega_bound: f64,
    /// Values with magnitude below this are reported as degenerate.
    #[serde(default = "MetricsConfig::default_epsilon")]
    pub epsilon: f64,
}

impl MetricsConfig {
    fn default_balance_threshold() -> f64 {
        0.35
    }
    fn default_instability_threshold() -> f64 {
        0.2
    }
    fn default_stable_region() -> f64 {
        0.5
    }
    fn default_grid_size() -> usize {
        50
    }
    fn default_omega_bound() -> f64 {
        10.0
    }
    fn default_epsilon() -> f64 {
        1e-4
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("metrics.balance_threshold", self.balance_threshold)?;
        positive("metrics.instability_threshold", self.instability_threshold)?;
        positive("metrics.stable_region", self.stable_region)?;
        positive("metrics.omega_bound", self.omega_bound)?;
        non_negative("metrics.epsilon", self.epsilon)?;
        if self.phase_grid < 2 {
            return Err(ConfigError::Invalid {
                field: "metrics.phase_grid",
                reason: format!("need at least 2 cells per axis, got {}", self.phase_grid),
            });
        }
        Ok(())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            balance_threshold: Self::default_balance_threshold(),
            instability_threshold: Self::default_instability_threshold(),
            stable_region: Self::default_stable_region(),
            phase_grid: Self::default_grid_size(),
            omega_bound: Self::default_omega_bound(),
            epsilon: Self::default_epsilon(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PendulumConfig {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl PendulumConfig {
    /// Parse and validate a JSON document; missing fields take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "loaded pendulum config");
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.recorder.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

fn finite(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be finite, got {v}"),
        })
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    finite(field, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be > 0, got {v}"),
        })
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
    finite(field, v)?;
    if v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be >= 0, got {v}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_takes_defaults() {
        let cfg = PendulumConfig::from_json_str(r#"{ "physics": { "damping": 0.1 } }"#)
            .expect("valid config");
        assert_eq!(cfg.physics.damping, 0.1);
        assert_eq!(cfg.physics.mass, 1.0);
        assert_eq!(cfg.recorder.capacity, RecorderConfig::DEFAULT_CAPACITY);
        assert_eq!(cfg.ai.skill, SkillLevel::Intermediate);
    }

    #[test]
    fn rejects_non_physical_length() {
        let err = PendulumConfig::from_json_str(r#"{ "physics": { "length": 0.0 } }"#)
            .expect_err("zero length must be rejected");
        assert!(matches!(err, ConfigError::Invalid { field: "physics.length", .. }));
    }

    #[test]
    fn rejects_zero_capacity_and_bad_json() {
        let err = PendulumConfig::from_json_str(r#"{ "recorder": { "capacity": 0 } }"#)
            .expect_err("zero capacity must be rejected");
        assert!(matches!(err, ConfigError::Invalid { field: "recorder.capacity", .. }));

        let err = PendulumConfig::from_json_str("{ not json").expect_err("parse error");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn json_round_trip_preserves_values() {
        let mut cfg = PendulumConfig::default();
        cfg.ai.skill = SkillLevel::Expert;
        cfg.physics.impulse_gain = 0.5;
        let text = cfg.to_json_pretty().expect("serialize");
        let back = PendulumConfig::from_json_str(&text).expect("parse");
        assert_eq!(back, cfg);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PendulumConfig::load("/definitely/not/here.json").expect_err("missing");
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
