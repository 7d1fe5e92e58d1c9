//! Metrics engine: a closed catalog of control-quality measures computed
//! from a sample snapshot.
//!
//! Every metric is a pure function of `&[Sample]` plus configuration, so two
//! calls on the same buffer agree exactly. Below a metric's minimum sample
//! count (or when its inputs are absent) it is reported with status
//! [`MetricStatus::InsufficientData`] rather than a spurious number.

pub mod advanced;
pub mod basic;
pub mod scientific;
pub mod topology;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{MetricsConfig, PhysicsConfig};
use crate::systems::sdk::Sample;

pub const INSUFFICIENT_DATA: &str = "Insufficient Data";
pub const UNKNOWN: &str = "Unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricCategory {
    Basic,
    Advanced,
    Scientific,
    Topology,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 4] = [
        MetricCategory::Basic,
        MetricCategory::Advanced,
        MetricCategory::Scientific,
        MetricCategory::Topology,
    ];

    pub fn metrics(self) -> &'static [MetricType] {
        use MetricType::*;
        match self {
            MetricCategory::Basic => &[StabilityScore, BalanceDuration, PushCount, SessionTime],
            MetricCategory::Advanced => &[
                EfficiencyRating,
                DirectionalBias,
                OvercorrectionRate,
                AverageCorrectionTime,
                ResponseDelay,
            ],
            MetricCategory::Scientific => &[
                PhaseSpaceCoverage,
                EnergyManagement,
                LyapunovExponent,
                ControlStrategy,
                StateTransitionFrequency,
                AngularDeviation,
            ],
            MetricCategory::Topology => &[WindingNumber, BasinStability, SeparatrixCrossings],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    StabilityScore,
    BalanceDuration,
    PushCount,
    SessionTime,
    EfficiencyRating,
    DirectionalBias,
    OvercorrectionRate,
    AverageCorrectionTime,
    ResponseDelay,
    PhaseSpaceCoverage,
    EnergyManagement,
    LyapunovExponent,
    ControlStrategy,
    StateTransitionFrequency,
    AngularDeviation,
    WindingNumber,
    BasinStability,
    SeparatrixCrossings,
}

impl MetricType {
    pub fn category(self) -> MetricCategory {
        MetricCategory::ALL
            .into_iter()
            .find(|c| c.metrics().contains(&self))
            .unwrap_or(MetricCategory::Basic)
    }

    pub fn name(self) -> &'static str {
        use MetricType::*;
        match self {
            StabilityScore => "Stability Score",
            BalanceDuration => "Balance Duration",
            PushCount => "Push Count",
            SessionTime => "Session Time",
            EfficiencyRating => "Efficiency Rating",
            DirectionalBias => "Directional Bias",
            OvercorrectionRate => "Overcorrection Rate",
            AverageCorrectionTime => "Average Correction Time",
            ResponseDelay => "Response Delay",
            PhaseSpaceCoverage => "Phase Space Coverage",
            EnergyManagement => "Energy Management",
            LyapunovExponent => "Lyapunov Exponent",
            ControlStrategy => "Control Strategy",
            StateTransitionFrequency => "State Transition Frequency",
            AngularDeviation => "Angular Deviation",
            WindingNumber => "Winding Number",
            BasinStability => "Basin Stability",
            SeparatrixCrossings => "Separatrix Crossings",
        }
    }

    pub fn unit(self) -> &'static str {
        use MetricType::*;
        match self {
            StabilityScore | EfficiencyRating | OvercorrectionRate | PhaseSpaceCoverage
            | EnergyManagement | BasinStability => "%",
            BalanceDuration | SessionTime | AverageCorrectionTime | ResponseDelay => "s",
            LyapunovExponent | StateTransitionFrequency => "1/s",
            AngularDeviation => "rad",
            WindingNumber => "rev",
            PushCount | DirectionalBias | ControlStrategy | SeparatrixCrossings => "",
        }
    }

    /// Samples needed before the metric is computed at all.
    pub fn min_samples(self) -> usize {
        match self {
            MetricType::EnergyManagement => scientific::ENERGY_MIN_SAMPLES,
            MetricType::LyapunovExponent => scientific::LYAPUNOV_MIN_SAMPLES,
            _ => 2,
        }
    }

    fn insufficient_value(self) -> MetricValue {
        match self {
            MetricType::PushCount | MetricType::SeparatrixCrossings => MetricValue::Count(0),
            MetricType::ControlStrategy => MetricValue::Label(INSUFFICIENT_DATA.to_string()),
            _ => MetricValue::Numeric(0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    Numeric(f64),
    Count(i64),
    Label(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Numeric(x) => Some(*x),
            MetricValue::Count(n) => Some(*n as f64),
            MetricValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            MetricValue::Label(s) => Some(s),
            _ => None,
        }
    }

    /// Zero-ish or sentinel.
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        match self {
            MetricValue::Numeric(x) => !x.is_finite() || x.abs() < epsilon,
            MetricValue::Count(n) => *n == 0,
            MetricValue::Label(s) => s == UNKNOWN || s == INSUFFICIENT_DATA,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricStatus {
    Computed,
    InsufficientData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub kind: MetricType,
    pub value: MetricValue,
    pub status: MetricStatus,
}

impl Metric {
    fn computed(kind: MetricType, value: MetricValue) -> Self {
        Self {
            kind,
            value,
            status: MetricStatus::Computed,
        }
    }

    fn insufficient(kind: MetricType) -> Self {
        Self {
            kind,
            value: kind.insufficient_value(),
            status: MetricStatus::InsufficientData,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.status == MetricStatus::InsufficientData
    }

    /// Degenerate when data was insufficient or the value is zero/sentinel.
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.is_insufficient() || self.value.is_degenerate(epsilon)
    }
}

/// Stateless apart from configuration; one instance can serve any number of
/// buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsEngine {
    physics: PhysicsConfig,
    cfg: MetricsConfig,
}

impl MetricsEngine {
    pub fn new(physics: PhysicsConfig, cfg: MetricsConfig) -> Self {
        Self { physics, cfg }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.cfg
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// One metric per type of `category`, in catalog order.
    pub fn calculate_metrics(&self, category: MetricCategory, samples: &[Sample]) -> Vec<Metric> {
        category
            .metrics()
            .iter()
            .map(|&kind| self.calculate(kind, samples))
            .collect()
    }

    /// [`Metric::is_degenerate`] with the configured epsilon.
    pub fn is_degenerate(&self, metric: &Metric) -> bool {
        metric.is_degenerate(self.cfg.epsilon)
    }

    pub fn calculate_all(&self, samples: &[Sample]) -> Vec<Metric> {
        MetricCategory::ALL
            .into_iter()
            .flat_map(|c| self.calculate_metrics(c, samples))
            .collect()
    }

    pub fn calculate(&self, kind: MetricType, samples: &[Sample]) -> Metric {
        if samples.len() < kind.min_samples() {
            return Metric::insufficient(kind);
        }
        let c = &self.cfg;
        let value = match kind {
            MetricType::StabilityScore => {
                Some(MetricValue::Numeric(basic::stability_score(samples, c.balance_threshold)))
            }
            MetricType::BalanceDuration => {
                Some(MetricValue::Numeric(basic::balance_duration(samples, c.balance_threshold)))
            }
            MetricType::PushCount => Some(MetricValue::Count(basic::push_count(samples))),
            MetricType::SessionTime => Some(MetricValue::Numeric(basic::session_time(samples))),
            MetricType::EfficiencyRating => {
                Some(MetricValue::Numeric(advanced::efficiency_rating(samples, c.balance_threshold)))
            }
            MetricType::DirectionalBias => {
                advanced::directional_bias(samples).map(MetricValue::Numeric)
            }
            MetricType::OvercorrectionRate => {
                advanced::overcorrection_rate(samples).map(MetricValue::Numeric)
            }
            MetricType::AverageCorrectionTime => {
                advanced::average_correction_time(samples, c.instability_threshold)
                    .map(MetricValue::Numeric)
            }
            MetricType::ResponseDelay => {
                advanced::response_delay(samples, c.instability_threshold).map(MetricValue::Numeric)
            }
            MetricType::PhaseSpaceCoverage => Some(MetricValue::Numeric(
                scientific::phase_space_coverage(samples, c.phase_grid, c.omega_bound),
            )),
            MetricType::EnergyManagement => {
                scientific::energy_management(samples, &self.physics).map(MetricValue::Numeric)
            }
            MetricType::LyapunovExponent => {
                scientific::lyapunov_exponent(samples).map(MetricValue::Numeric)
            }
            MetricType::ControlStrategy => {
                scientific::control_strategy(samples).map(|s| MetricValue::Label(s.to_string()))
            }
            MetricType::StateTransitionFrequency => {
                scientific::state_transition_frequency(samples).map(MetricValue::Numeric)
            }
            MetricType::AngularDeviation => {
                Some(MetricValue::Numeric(scientific::angular_deviation(samples)))
            }
            MetricType::WindingNumber => {
                topology::winding_number(samples).map(MetricValue::Numeric)
            }
            MetricType::BasinStability => {
                Some(MetricValue::Numeric(topology::basin_stability(samples, c.stable_region)))
            }
            MetricType::SeparatrixCrossings => Some(MetricValue::Count(
                topology::separatrix_crossings(samples, &self.physics),
            )),
        };
        let metric = match value {
            Some(v) => Metric::computed(kind, v),
            None => Metric::insufficient(kind),
        };
        trace!(metric = kind.name(), value = ?metric.value, status = ?metric.status, "metric");
        metric
    }
}
