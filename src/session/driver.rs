//! Balance session: the driver loop around simulator, AI, recorder and
//! (optionally) perturbations.

use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::config::PendulumConfig;
use crate::systems::ai::AiController;
use crate::systems::export::ExportPackage;
use crate::systems::metrics::{Metric, MetricCategory, MetricsEngine};
use crate::systems::recorder::{Recorder, SharedRecorder};
use crate::systems::sdk::{Issuer, PendulumState, PushAction, PushDirection, PushEvent, Sample, SessionHook};
use crate::systems::simulator::PendulumSimulator;

#[cfg(feature = "system-perturbation")]
use crate::systems::perturbation::{PerturbationManager, PerturbationProfile};

pub struct BalanceSession {
    cfg: PendulumConfig,
    simulator: PendulumSimulator,
    ai: AiController,
    events: Receiver<PushEvent>,
    recorder: SharedRecorder,
    engine: MetricsEngine,
    #[cfg(feature = "system-perturbation")]
    perturbation: Option<PerturbationManager>,
    hooks: Vec<Box<dyn SessionHook>>,
}

impl BalanceSession {
    pub fn new(cfg: PendulumConfig) -> Self {
        let mut ai = AiController::new(cfg.ai);
        let events = ai.subscribe();
        Self {
            simulator: PendulumSimulator::new(cfg.physics),
            ai,
            events,
            recorder: Recorder::new(cfg.recorder).into_shared(),
            engine: MetricsEngine::new(cfg.physics, cfg.metrics),
            #[cfg(feature = "system-perturbation")]
            perturbation: None,
            hooks: Vec::new(),
            cfg,
        }
    }

    pub fn config(&self) -> &PendulumConfig {
        &self.cfg
    }

    pub fn simulator(&self) -> &PendulumSimulator {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut PendulumSimulator {
        &mut self.simulator
    }

    pub fn ai(&self) -> &AiController {
        &self.ai
    }

    pub fn ai_mut(&mut self) -> &mut AiController {
        &mut self.ai
    }

    /// Handle to the history; lock briefly, snapshot, release.
    pub fn recorder(&self) -> SharedRecorder {
        SharedRecorder::clone(&self.recorder)
    }

    pub fn engine(&self) -> &MetricsEngine {
        &self.engine
    }

    pub fn state(&self) -> PendulumState {
        self.simulator.state()
    }

    pub fn add_hook(&mut self, hook: Box<dyn SessionHook>) {
        self.hooks.push(hook);
    }

    #[cfg(feature = "system-perturbation")]
    pub fn set_perturbation(&mut self, profile: PerturbationProfile, seed: u64) {
        self.perturbation = Some(PerturbationManager::with_profile(profile, seed));
    }

    #[cfg(feature = "system-perturbation")]
    pub fn clear_perturbation(&mut self) {
        self.perturbation = None;
    }

    #[cfg(feature = "system-perturbation")]
    pub fn perturbation_mut(&mut self) -> Option<&mut PerturbationManager> {
        self.perturbation.as_mut()
    }

    /// Start the clock and recording. The AI stays idle until `start_ai`.
    pub fn start(&mut self) {
        self.simulator.start();
        self.recorder.lock().start_recording();
        info!("balance session started");
    }

    pub fn start_ai(&mut self) {
        self.ai.start_playing();
    }

    pub fn stop_ai(&mut self) {
        self.ai.stop_playing();
        // Anything the AI emitted before stopping is not applied.
        let dropped = self.events.try_iter().count();
        if dropped > 0 {
            debug!(dropped, "discarded undelivered ai pushes");
        }
    }

    pub fn stop(&mut self) {
        self.stop_ai();
        self.simulator.stop();
        self.recorder.lock().stop_recording();
        info!(time = self.simulator.state().time, "balance session stopped");
    }

    /// Back to the reset pose with empty history; running flags are kept.
    pub fn reset(&mut self) {
        self.simulator.reset();
        self.recorder.lock().clear();
        self.ai.reset();
        let _ = self.events.try_iter().count();
    }

    /// One tick of the loop. No-op while the simulator is stopped.
    pub fn tick(&mut self, dt: f64) -> PendulumState {
        if !self.simulator.is_running() {
            return self.simulator.state();
        }
        self.simulator.step(dt);
        let st = self.simulator.state();
        self.recorder.lock().record_snapshot(st, None);
        for h in self.hooks.iter_mut() {
            h.on_tick(&st);
        }

        #[cfg(feature = "system-perturbation")]
        if let Some(force) = self.perturbation.as_mut().and_then(|p| p.update(st.time)) {
            self.simulator.apply_force(force);
            for h in self.hooks.iter_mut() {
                h.on_perturbation(&st, force);
            }
        }

        let st = self.simulator.state();
        self.ai.update_pendulum_state(st.theta, st.theta_dot, st.time);
        self.ai.report_outcome(st.theta);
        while let Ok(ev) = self.events.try_recv() {
            self.apply_push(ev.action(), Issuer::Ai);
        }
        self.simulator.state()
    }

    /// Run `ticks` ticks of size `dt`; returns the final state.
    pub fn run(&mut self, ticks: usize, dt: f64) -> PendulumState {
        for _ in 0..ticks {
            self.tick(dt);
        }
        self.simulator.state()
    }

    /// Apply and record a player push. Magnitudes that are not finite and
    /// positive are ignored.
    pub fn player_push(&mut self, direction: PushDirection, magnitude: f64) -> bool {
        if !(magnitude.is_finite() && magnitude > 0.0) {
            debug!(magnitude, "player push ignored");
            return false;
        }
        self.apply_push(PushAction::new(direction, magnitude), Issuer::Player);
        true
    }

    /// Metrics of one category over the current history.
    pub fn metrics(&self, category: MetricCategory) -> Vec<Metric> {
        let samples = self.samples();
        self.engine.calculate_metrics(category, &samples)
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.recorder.lock().snapshot()
    }

    pub fn export(&self) -> ExportPackage {
        ExportPackage::build(&self.samples(), &self.cfg.metrics)
    }

    fn apply_push(&mut self, push: PushAction, issuer: Issuer) {
        self.simulator.apply_force(push.signed());
        let st = self.simulator.state();
        self.recorder.lock().record_push(st, push, issuer);
        for h in self.hooks.iter_mut() {
            h.on_push(&st, &push, issuer);
        }
    }
}
