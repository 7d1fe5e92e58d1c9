//! Export package: CSV trajectory plus a serializable summary with the
//! player's balance personality.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MetricsConfig;
use crate::error::ExportError;
use crate::systems::metrics::{INSUFFICIENT_DATA, advanced, basic, scientific};
use crate::systems::recorder::Recorder;
use crate::systems::sdk::{PushDirection, Sample};

pub const CSV_HEADER: &str = "time,theta,thetaDot,action,magnitude,issuer";

/// Push magnitude treated as fully aggressive.
const TYPICAL_PUSH: f64 = 2.0;
/// Interval / magnitude jumps that count as a pattern change.
const PATTERN_INTERVAL_JUMP: f64 = 0.1;
const PATTERN_MAGNITUDE_JUMP: f64 = 0.3;

/// Style scores, each in [0, 1]. 0.5 means "not enough pushes to tell".
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalancePersonality {
    /// Mean push strength.
    pub aggressiveness: f64,
    /// How close to upright pushes are issued.
    pub anticipation: f64,
    /// Regularity of push intervals (1 − coefficient of variation).
    pub rhythmicity: f64,
    /// Fraction of samples within the balance threshold.
    pub precision: f64,
    /// How often the push pattern changes.
    pub adaptability: f64,
}

impl BalancePersonality {
    pub fn analyze(samples: &[Sample], cfg: &MetricsConfig) -> Self {
        let ps = advanced::pushes(samples);
        let mags: Vec<f64> = ps.iter().map(|p| p.2).collect();
        let intervals: Vec<f64> = ps.windows(2).map(|w| w[1].0 - w[0].0).collect();

        let aggressiveness = if mags.is_empty() {
            0.5
        } else {
            (mags.iter().sum::<f64>() / mags.len() as f64 / TYPICAL_PUSH).min(1.0)
        };

        let push_devs: Vec<f64> = samples
            .iter()
            .filter(|s| s.action.is_some())
            .map(|s| s.state.deviation().abs())
            .collect();
        let anticipation = if push_devs.is_empty() {
            0.5
        } else {
            push_devs
                .iter()
                .map(|d| 1.0 - (d / std::f64::consts::PI).min(1.0))
                .sum::<f64>()
                / push_devs.len() as f64
        };

        let rhythmicity = if ps.len() > 2 {
            let n = intervals.len() as f64;
            let mean = intervals.iter().sum::<f64>() / n;
            let sd = (intervals.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n).sqrt();
            if mean > 0.0 { (1.0 - sd / mean).clamp(0.0, 1.0) } else { 0.0 }
        } else {
            0.5
        };

        let precision = basic::stability_score(samples, cfg.balance_threshold) / 100.0;

        let adaptability = if ps.len() > 5 {
            let mut last = (0.0, 0.0);
            let mut changes = 0usize;
            for (interval, &mag) in intervals.iter().zip(mags.iter().skip(1)) {
                if (interval - last.0).abs() > PATTERN_INTERVAL_JUMP
                    || (mag - last.1).abs() > PATTERN_MAGNITUDE_JUMP
                {
                    changes += 1;
                }
                last = (*interval, mag);
            }
            (changes as f64 / intervals.len() as f64).min(1.0)
        } else {
            0.5
        };

        Self {
            aggressiveness,
            anticipation,
            rhythmicity,
            precision,
            adaptability,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub sample_count: usize,
    pub duration: f64,
    pub push_count: usize,
    pub left_pushes: usize,
    pub right_pushes: usize,
    pub personality: BalancePersonality,
    pub control_strategy: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportPackage {
    pub csv: String,
    pub summary: ExportSummary,
}

impl ExportPackage {
    pub fn build(samples: &[Sample], cfg: &MetricsConfig) -> Self {
        let ps = advanced::pushes(samples);
        let right = ps.iter().filter(|p| p.1 == PushDirection::Right).count();
        let summary = ExportSummary {
            sample_count: samples.len(),
            duration: basic::session_time(samples),
            push_count: ps.len(),
            left_pushes: ps.len() - right,
            right_pushes: right,
            personality: BalancePersonality::analyze(samples, cfg),
            control_strategy: scientific::control_strategy(samples)
                .unwrap_or(INSUFFICIENT_DATA)
                .to_string(),
        };
        debug!(samples = samples.len(), pushes = ps.len(), "export package built");
        Self {
            csv: to_csv(samples),
            summary,
        }
    }

    pub fn summary_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.summary)?)
    }
}

/// One row per sample; push columns are empty on plain ticks.
pub fn to_csv(samples: &[Sample]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + samples.len() * 48);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for s in samples {
        let st = &s.state;
        // Writing to a String cannot fail.
        let _ = match &s.action {
            Some(a) => writeln!(
                out,
                "{},{},{},{},{},{}",
                st.time,
                st.theta,
                st.theta_dot,
                a.push.direction.label(),
                a.push.magnitude,
                a.issuer.label()
            ),
            None => writeln!(out, "{},{},{},,,", st.time, st.theta, st.theta_dot),
        };
    }
    out
}

impl Recorder {
    pub fn export(&self) -> ExportPackage {
        self.export_with(&MetricsConfig::default())
    }

    pub fn export_with(&self, cfg: &MetricsConfig) -> ExportPackage {
        ExportPackage::build(&self.snapshot(), cfg)
    }
}
