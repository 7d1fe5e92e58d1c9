// tests/session.rs
use std::cell::RefCell;
use std::rc::Rc;

use pendulum_balance::PendulumConfig;
use pendulum_balance::session::BalanceSession;
use pendulum_balance::systems::ai::{ControlStrategy, SkillLevel};
use pendulum_balance::systems::metrics::{MetricCategory, MetricStatus, MetricType, MetricValue};
use pendulum_balance::systems::sdk::{Issuer, PendulumState, PushAction, PushDirection, SessionHook};

fn expert_cfg() -> PendulumConfig {
    let mut cfg = PendulumConfig::default();
    cfg.ai.skill = SkillLevel::Expert;
    cfg.ai.human_error = false;
    cfg
}

#[derive(Default)]
struct Counts {
    ticks: usize,
    ai_pushes: usize,
    player_pushes: usize,
}

struct Counter(Rc<RefCell<Counts>>);

impl SessionHook for Counter {
    fn on_tick(&mut self, _state: &PendulumState) {
        self.0.borrow_mut().ticks += 1;
    }
    fn on_push(&mut self, _state: &PendulumState, _push: &PushAction, issuer: Issuer) {
        let mut c = self.0.borrow_mut();
        match issuer {
            Issuer::Ai => c.ai_pushes += 1,
            Issuer::Player => c.player_pushes += 1,
        }
    }
}

/* ──────────────────────────────────────────────────────────────────────────
1) Tick loop — stopped sessions are inert, ticks are recorded
────────────────────────────────────────────────────────────────────────── */

#[test]
fn stopped_session_does_nothing() {
    let mut s = BalanceSession::new(expert_cfg());
    let before = s.state();
    s.run(100, 0.02);
    assert_eq!(s.state(), before);
    assert!(s.samples().is_empty());
}

#[test]
fn every_tick_is_recorded() {
    let mut s = BalanceSession::new(PendulumConfig::default());
    s.start();
    s.run(250, 0.02);
    let samples = s.samples();
    assert_eq!(samples.len(), 250);
    assert!(samples.iter().all(|x| x.action.is_none()));
    assert!((samples[249].state.time - 5.0).abs() < 1e-9);
}

/* ──────────────────────────────────────────────────────────────────────────
2) AI in the loop — pushes applied, recorded, and keep it up
────────────────────────────────────────────────────────────────────────── */

#[test]
fn expert_ai_keeps_pendulum_balanced() {
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut s = BalanceSession::new(expert_cfg());
    s.add_hook(Box::new(Counter(Rc::clone(&counts))));
    s.simulator_mut().reset_with_angle(std::f64::consts::PI - 0.05);
    s.start();
    s.start_ai();
    s.run(1_500, 0.02);

    let c = counts.borrow();
    assert_eq!(c.ticks, 1_500);
    assert!(c.ai_pushes > 0);
    assert_eq!(c.ai_pushes as u64, s.ai().interventions());

    let samples = s.samples();
    let recorded_ai = samples
        .iter()
        .filter(|x| x.action.is_some_and(|a| a.issuer == Issuer::Ai))
        .count();
    assert_eq!(recorded_ai, c.ai_pushes);

    let basic = s.metrics(MetricCategory::Basic);
    let stability = basic
        .iter()
        .find(|m| m.kind == MetricType::StabilityScore)
        .and_then(|m| m.value.as_f64())
        .expect("stability");
    assert!(stability > 50.0, "stability {stability}");
}

#[test]
fn uncontrolled_session_loses_balance() {
    let mut s = BalanceSession::new(PendulumConfig::default());
    s.start();
    s.run(1_500, 0.02);
    let basic = s.metrics(MetricCategory::Basic);
    let stability = basic[0].value.as_f64().expect("numeric");
    assert!(stability < 20.0, "stability {stability}");
    assert_eq!(basic[2].value, MetricValue::Count(0));
}

#[test]
fn stopping_ai_stops_pushes() {
    let mut s = BalanceSession::new(expert_cfg());
    s.start();
    s.start_ai();
    s.run(200, 0.02);
    s.stop_ai();
    let pushes = s.ai().interventions();
    s.run(500, 0.02);
    assert_eq!(s.ai().interventions(), pushes);
}

#[test]
fn falling_pendulum_makes_learning_ai_switch_strategy() {
    let mut cfg = PendulumConfig::default();
    cfg.ai.learning = true;
    cfg.ai.adaptive_strategy = false;
    cfg.ai.max_force = 0.01;
    let mut s = BalanceSession::new(cfg);
    s.start();
    s.start_ai();
    assert_eq!(s.ai().strategy(), ControlStrategy::Reactive);
    let switched = (0..3_000).any(|_| {
        s.tick(0.02);
        s.ai().strategy() != ControlStrategy::Reactive
    });
    assert!(switched);
}

#[test]
fn learning_stays_put_when_disabled() {
    let mut cfg = PendulumConfig::default();
    cfg.ai.adaptive_strategy = false;
    cfg.ai.max_force = 0.01;
    let mut s = BalanceSession::new(cfg);
    s.start();
    s.start_ai();
    s.run(1_000, 0.02);
    assert_eq!(s.ai().strategy(), ControlStrategy::Reactive);
}

/* ──────────────────────────────────────────────────────────────────────────
3) Player input, reset, export
────────────────────────────────────────────────────────────────────────── */

#[test]
fn player_push_is_applied_and_recorded() {
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut s = BalanceSession::new(PendulumConfig::default());
    s.add_hook(Box::new(Counter(Rc::clone(&counts))));
    s.start();
    let w0 = s.state().theta_dot;
    s.player_push(PushDirection::Right, 2.0);
    assert!((s.state().theta_dot - w0 - 0.6).abs() < 1e-12);
    let last = s.samples().last().copied().expect("sample");
    let a = last.action.expect("push");
    assert_eq!(a.issuer, Issuer::Player);
    assert_eq!(a.push.direction, PushDirection::Right);
    assert_eq!(counts.borrow().player_pushes, 1);
}

#[test]
fn non_positive_or_non_finite_player_push_is_ignored() {
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut s = BalanceSession::new(PendulumConfig::default());
    s.add_hook(Box::new(Counter(Rc::clone(&counts))));
    s.start();
    s.run(5, 0.02);
    let before = s.state();
    for m in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(!s.player_push(PushDirection::Left, m));
    }
    assert_eq!(s.state(), before);
    assert!(s.samples().iter().all(|x| x.action.is_none()));
    assert_eq!(counts.borrow().player_pushes, 0);
    assert!(s.player_push(PushDirection::Left, 0.5));
}

#[test]
fn reset_clears_history() {
    let mut s = BalanceSession::new(expert_cfg());
    s.start();
    s.start_ai();
    s.run(300, 0.02);
    s.reset();
    assert!(s.samples().is_empty());
    assert_eq!(s.state().time, 0.0);
    assert_eq!(s.ai().interventions(), 0);
    s.run(10, 0.02);
    assert_eq!(s.samples().len() as u64, 10 + s.ai().interventions());
}

#[test]
fn export_has_one_row_per_sample() {
    let mut s = BalanceSession::new(expert_cfg());
    s.start();
    s.start_ai();
    s.run(500, 0.02);
    s.player_push(PushDirection::Left, 1.0);
    let pkg = s.export();
    let lines: Vec<&str> = pkg.csv.lines().collect();
    assert_eq!(lines[0], "time,theta,thetaDot,action,magnitude,issuer");
    assert_eq!(lines.len() - 1, pkg.summary.sample_count);
    assert!(lines.last().is_some_and(|l| l.ends_with(",left,1,player")));
    assert_eq!(pkg.summary.push_count, pkg.summary.left_pushes + pkg.summary.right_pushes);

    let json = pkg.summary_json().expect("summary serializes");
    assert!(json.contains("\"personality\""));
    let p = pkg.summary.personality;
    for x in [p.aggressiveness, p.anticipation, p.rhythmicity, p.precision, p.adaptability] {
        assert!((0.0..=1.0).contains(&x));
    }
}

#[test]
fn metrics_are_stable_between_ticks() {
    let mut s = BalanceSession::new(expert_cfg());
    s.start();
    s.start_ai();
    s.run(800, 0.02);
    for cat in MetricCategory::ALL {
        let a = s.metrics(cat);
        let b = s.metrics(cat);
        assert_eq!(a, b);
        assert!(a.iter().all(|m| m.status == MetricStatus::Computed || m.is_insufficient()));
    }
}

#[cfg(feature = "system-perturbation")]
#[test]
fn perturbation_forces_reach_the_pendulum() {
    use pendulum_balance::systems::perturbation::PerturbationProfile;

    let run = |perturb: bool| {
        let mut s = BalanceSession::new(PendulumConfig::default());
        s.simulator_mut().reset_with_angle(std::f64::consts::PI);
        if perturb {
            s.set_perturbation(PerturbationProfile::jiggle(1.0), 5);
        }
        s.start();
        s.run(50, 0.02)
    };
    let calm = run(false);
    assert_eq!(calm.theta, std::f64::consts::PI);
    assert_ne!(run(true).theta, calm.theta);
}
