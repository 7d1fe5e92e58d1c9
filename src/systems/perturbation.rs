//! External disturbances: impulse gusts, sine swell, per-tick noise and
//! compounds of those, arranged into level profiles.
//!
//! The manager only produces a signed force per update; the caller decides
//! where it goes (normally `PendulumSimulator::apply_force`).

use bevy_prng::WyRand;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::mechanics::stoch;

pub const MIN_STRENGTH: f64 = 0.05;
pub const MAX_STRENGTH: f64 = 5.0;
/// Forces below this are swallowed.
pub const FORCE_FLOOR: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerturbationType {
    /// ±strength·U[0.8, 1.2] at random intervals.
    Impulse,
    /// ½·strength·sin(2π f t).
    Sine,
    /// U[-1, 1]·strength every update.
    Random,
    /// Sum of the sub-profiles.
    Compound,
    /// Nothing at all (zen).
    Calm,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerturbationProfile {
    pub name: String,
    pub types: Vec<PerturbationType>,
    pub strength: f64,
    /// Hz, for sine components.
    pub frequency: f64,
    /// Seconds between impulses, drawn uniformly from this range.
    pub interval: (f64, f64),
    #[serde(default)]
    pub sub_profiles: Vec<PerturbationProfile>,
}

impl PerturbationProfile {
    fn simple(name: &str, types: &[PerturbationType], strength: f64, frequency: f64, interval: (f64, f64)) -> Self {
        Self {
            name: name.to_string(),
            types: types.to_vec(),
            strength,
            frequency,
            interval,
            sub_profiles: Vec::new(),
        }
    }

    /// Campaign profile for `level` (levels below 1 read as 1).
    pub fn for_level(level: u32) -> Self {
        use PerturbationType::*;
        match level.max(1) {
            1 => Self::simple("Gentle Breeze", &[Impulse], 0.3, 0.0, (4.0, 6.0)),
            2 => Self::simple("Moderate Wind", &[Impulse], 0.5, 0.0, (3.0, 5.0)),
            3 => Self::simple("Rhythmic Current", &[Impulse, Sine], 0.6, 0.2, (3.0, 5.0)),
            4 => Self::simple("Ocean Waves", &[Sine], 0.7, 0.3, (3.0, 4.0)),
            5 => Self::simple("Stormy Waters", &[Sine, Impulse], 0.8, 0.4, (2.5, 4.0)),
            6 => Self::simple("Seismic Tremors", &[Random, Impulse], 0.9, 0.0, (2.0, 3.5)),
            7 => Self::simple("Chaotic Turbulence", &[Random], 1.0, 0.0, (1.5, 3.0)),
            l @ 8..=10 => Self {
                sub_profiles: vec![
                    Self::simple("Base Sine", &[Sine], 0.8, 0.3, (0.0, 0.0)),
                    Self::simple("Random Gusts", &[Impulse], 1.2, 0.0, (1.5, 3.0)),
                ],
                ..Self::simple("Perfect Storm", &[Compound], 1.0 + (l - 8) as f64 * 0.2, 0.5, (1.0, 2.0))
            },
            l => {
                let over = (l - 10) as f64;
                let strength = (1.0 + over * 0.1).min(2.0);
                let frequency = (0.5 + over * 0.05).min(1.0);
                Self {
                    name: format!("Extreme Challenge {l}"),
                    sub_profiles: vec![
                        Self::simple("Primary Wave", &[Sine], strength * 0.8, frequency, (0.0, 0.0)),
                        Self::simple(
                            "Impulse Bursts",
                            &[Impulse],
                            strength * 1.2,
                            0.0,
                            ((2.0 - over * 0.1).max(0.5), (3.0 - over * 0.1).max(1.0)),
                        ),
                    ],
                    ..Self::simple(
                        "",
                        &[Compound],
                        strength,
                        frequency,
                        ((3.0 - over * 0.1).max(0.5), (3.5 - over * 0.1).max(1.0)),
                    )
                }
            }
        }
    }

    /// Impulse-only ramp; difficulty comes from holding longer.
    pub fn progressive(level: u32) -> Self {
        let l = level.max(1) as f64;
        Self {
            name: format!("Progressive L{}", level.max(1)),
            ..Self::simple(
                "",
                &[PerturbationType::Impulse],
                (0.2 + (l - 1.0) * 0.05).min(0.8),
                0.0,
                ((5.0 - l * 0.3).max(2.0), (7.0 - l * 0.3).max(3.0)),
            )
        }
    }

    pub fn zen() -> Self {
        Self::simple("Zen", &[PerturbationType::Calm], 0.0, 0.0, (0.0, 0.0))
    }

    /// Continuous per-tick noise; intensity ~0.3 (gentle) to ~1.5 (intense).
    pub fn jiggle(intensity: f64) -> Self {
        Self {
            name: format!("Jiggle ({intensity:.1})"),
            ..Self::simple("", &[PerturbationType::Random], intensity, 0.0, (0.0, 0.0))
        }
    }

    pub fn is_calm(&self) -> bool {
        self.types.contains(&PerturbationType::Calm)
    }

    /// Same profile with strength scaled by `factor`, clamped to
    /// [MIN_STRENGTH, MAX_STRENGTH]. Sub-profiles scale along.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut p = self.clone();
        p.strength = (p.strength * factor).clamp(MIN_STRENGTH, MAX_STRENGTH);
        p.sub_profiles = p.sub_profiles.iter().map(|s| s.scaled(factor)).collect();
        p
    }

    /// Same profile rescaled so its top-level strength is `strength`.
    pub fn with_strength(&self, strength: f64) -> Self {
        if self.strength > 0.0 {
            self.scaled(strength / self.strength)
        } else {
            let mut p = self.clone();
            p.strength = strength.clamp(MIN_STRENGTH, MAX_STRENGTH);
            p
        }
    }
}

pub struct PerturbationManager {
    profile: Option<PerturbationProfile>,
    active: bool,
    last_time: Option<f64>,
    gusts: Gusts,
}

impl PerturbationManager {
    pub fn new(seed: u64) -> Self {
        Self {
            profile: None,
            active: false,
            last_time: None,
            gusts: Gusts::new(seed),
        }
    }

    pub fn with_profile(profile: PerturbationProfile, seed: u64) -> Self {
        let mut m = Self::new(seed);
        m.activate_profile(profile);
        m
    }

    pub fn profile(&self) -> Option<&PerturbationProfile> {
        self.profile.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active && self.profile.is_some()
    }

    pub fn activate_profile(&mut self, profile: PerturbationProfile) {
        info!(profile = %profile.name, strength = profile.strength, "perturbation profile activated");
        self.gusts.elapsed = 0.0;
        self.gusts.reset_timing(&profile);
        self.profile = Some(profile);
        self.last_time = None;
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn resume(&mut self) {
        self.active = true;
        self.last_time = None;
        if let Some(p) = self.profile.as_ref() {
            self.gusts.reset_timing(p);
        }
    }

    pub fn deactivate(&mut self) {
        self.profile = None;
        self.active = false;
    }

    /// Multiply the active profile's strength; clamped to [0.05, 5].
    pub fn scale_intensity(&mut self, factor: f64) {
        if let Some(p) = self.profile.as_mut() {
            *p = p.scaled(factor);
            debug!(strength = p.strength, "perturbation intensity scaled");
        }
    }

    /// Advance to `time` and return the combined force, if above the floor.
    /// The first update after (re)activation only sets the clock; gaps of a
    /// second or more are skipped.
    pub fn update(&mut self, time: f64) -> Option<f64> {
        if !self.active {
            return None;
        }
        let profile = self.profile.as_ref()?;
        if profile.is_calm() {
            return None;
        }
        let dt = self.last_time.map_or(0.0, |last| time - last);
        self.last_time = Some(time);
        if !(dt > 0.0 && dt < 1.0) {
            return None;
        }
        let force = self.gusts.advance(profile, dt);
        (force.abs() > FORCE_FLOOR).then_some(force)
    }
}

/// Clock, RNG and impulse timers; kept apart from the profile so an update
/// can read the profile while drawing.
struct Gusts {
    rng: WyRand,
    elapsed: f64,
    next_impulse: f64,
    sub_next_impulse: Vec<f64>,
}

impl Gusts {
    fn new(seed: u64) -> Self {
        Self {
            rng: WyRand::from_seed(seed.to_le_bytes()),
            elapsed: 0.0,
            next_impulse: 0.0,
            sub_next_impulse: Vec::new(),
        }
    }

    fn reset_timing(&mut self, profile: &PerturbationProfile) {
        self.next_impulse = self.draw_interval(profile.interval);
        self.sub_next_impulse.clear();
        for sub in &profile.sub_profiles {
            let next = self.draw_interval(sub.interval);
            self.sub_next_impulse.push(next);
        }
    }

    fn advance(&mut self, profile: &PerturbationProfile, dt: f64) -> f64 {
        self.elapsed += dt;
        let mut force = 0.0;
        for ty in &profile.types {
            match ty {
                PerturbationType::Impulse => {
                    self.next_impulse -= dt;
                    if self.next_impulse <= 0.0 {
                        force += self.impulse(profile.strength);
                        self.next_impulse = self.draw_interval(profile.interval);
                    }
                }
                PerturbationType::Sine => force += self.sine(profile.strength, profile.frequency),
                PerturbationType::Random => force += self.noise(profile.strength),
                PerturbationType::Compound => {
                    for (k, sub) in profile.sub_profiles.iter().enumerate() {
                        force += self.sub_force(k, sub, dt);
                    }
                }
                PerturbationType::Calm => {}
            }
        }
        force
    }

    fn sub_force(&mut self, k: usize, sub: &PerturbationProfile, dt: f64) -> f64 {
        let mut f = 0.0;
        for ty in &sub.types {
            match ty {
                PerturbationType::Sine => f += self.sine(sub.strength, sub.frequency),
                PerturbationType::Random => f += self.noise(sub.strength),
                PerturbationType::Impulse => {
                    let fire = match self.sub_next_impulse.get_mut(k) {
                        Some(t) => {
                            *t -= dt;
                            *t <= 0.0
                        }
                        None => false,
                    };
                    if fire {
                        f += self.impulse(sub.strength);
                        let next = self.draw_interval(sub.interval);
                        if let Some(t) = self.sub_next_impulse.get_mut(k) {
                            *t = next;
                        }
                    }
                }
                PerturbationType::Compound | PerturbationType::Calm => {}
            }
        }
        f
    }

    fn impulse(&mut self, strength: f64) -> f64 {
        stoch::sign(&mut self.rng) * strength * stoch::uniform(&mut self.rng, 0.8, 1.2)
    }

    fn sine(&self, strength: f64, frequency: f64) -> f64 {
        0.5 * strength * (2.0 * std::f64::consts::PI * frequency * self.elapsed).sin()
    }

    fn noise(&mut self, strength: f64) -> f64 {
        stoch::uniform(&mut self.rng, -1.0, 1.0) * strength
    }

    fn draw_interval(&mut self, (lo, hi): (f64, f64)) -> f64 {
        stoch::uniform(&mut self.rng, lo, hi)
    }
}
