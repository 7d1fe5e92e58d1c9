// tests/ai.rs
use std::f64::consts::PI;

use pendulum_balance::config::AiConfig;
use pendulum_balance::systems::ai::{AiController, ControlStrategy, SkillLevel, SkillProfile};
use pendulum_balance::systems::sdk::PushDirection;

fn expert_no_errors() -> AiController {
    let cfg = AiConfig {
        human_error: false,
        ..AiConfig::with_skill(SkillLevel::Expert)
    };
    AiController::new(cfg)
}

/// Diverging trajectory: deviation a·e^{t}, velocity a·e^{t}.
fn diverging(sign: f64, ticks: usize, dt: f64) -> impl Iterator<Item = (f64, f64, f64)> {
    (0..ticks).map(move |i| {
        let t = i as f64 * dt;
        let d = sign * 0.01 * t.exp();
        (PI + d, d, t)
    })
}

/* ──────────────────────────────────────────────────────────────────────────
1) Idle ↔ Playing
────────────────────────────────────────────────────────────────────────── */

#[test]
fn idle_controller_ignores_updates() {
    let mut ai = expert_no_errors();
    let rx = ai.subscribe();
    for (th, om, t) in diverging(1.0, 200, 0.02) {
        assert!(ai.update_pendulum_state(th, om, t).is_none());
    }
    assert!(rx.try_recv().is_err());
    assert_eq!(ai.decisions(), 0);
}

#[test]
fn stopping_discards_pending_push() {
    let mut ai = expert_no_errors();
    let rx = ai.subscribe();
    ai.start_playing();
    // big deviation: a push is decided but waits out the reaction delay
    let first = ai.update_pendulum_state(PI + 0.4, 0.5, 0.0);
    assert!(first.is_none());
    assert_eq!(ai.decisions(), 1);
    ai.stop_playing();
    for i in 1..100 {
        assert!(ai.update_pendulum_state(PI + 0.4, 0.5, i as f64 * 0.02).is_none());
    }
    assert!(rx.try_recv().is_err());
    assert_eq!(ai.interventions(), 0);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Decisions — bounded response, correct direction, latency, spacing
────────────────────────────────────────────────────────────────────────── */

#[test]
fn expert_pushes_against_diverging_fall_within_bounded_ticks() {
    for (sign, want) in [(1.0, PushDirection::Left), (-1.0, PushDirection::Right)] {
        let mut ai = expert_no_errors();
        let rx = ai.subscribe();
        ai.start_playing();
        let mut first_tick = None;
        for (i, (th, om, t)) in diverging(sign, 200, 0.02).enumerate() {
            if ai.update_pendulum_state(th, om, t).is_some() {
                first_tick = Some(i);
                break;
            }
        }
        let tick = first_tick.expect("expert never pushed");
        // leaves the dead band near tick 26, then waits ≤ 0.3 s
        assert!(tick <= 60, "first push at tick {tick}");
        let ev = rx.try_recv().expect("event on channel");
        assert_eq!(ev.direction, want);
        assert!(ev.magnitude > 0.0 && ev.magnitude <= 3.0);
    }
}

#[test]
fn push_waits_for_reaction_delay() {
    let mut ai = expert_no_errors();
    ai.start_playing();
    let mut emitted = None;
    for i in 0..100 {
        let t = i as f64 * 0.01;
        if let Some(ev) = ai.update_pendulum_state(PI + 0.2, 0.0, t) {
            emitted = Some(ev);
            break;
        }
    }
    let ev = emitted.expect("push emitted");
    // expert reaction 0.1..0.3 s, urgency factor 0.6 at 0.2 rad
    assert!(ev.time >= 0.06 - 1e-9 && ev.time <= 0.18 + 0.01 + 1e-9, "emitted at {}", ev.time);
    assert_eq!(ev.direction, PushDirection::Left);
    assert_eq!(ai.decisions(), 1);
}

#[test]
fn emitted_pushes_respect_minimum_interval() {
    let mut ai = AiController::new(AiConfig::with_skill(SkillLevel::Perfect));
    ai.start_playing();
    let mut times = Vec::new();
    for i in 0..500 {
        let t = i as f64 * 0.01;
        if let Some(ev) = ai.update_pendulum_state(PI + 0.3, 1.0, t) {
            times.push(ev.time);
        }
    }
    assert!(times.len() > 5);
    for w in times.windows(2) {
        assert!(w[1] - w[0] >= 0.1 - 1e-9);
    }
    assert_eq!(ai.interventions() as usize, times.len());
}

#[test]
fn no_push_inside_dead_band() {
    let mut ai = expert_no_errors();
    ai.start_playing();
    for i in 0..200 {
        assert!(ai.update_pendulum_state(PI + 0.001, 0.0, i as f64 * 0.02).is_none());
    }
    assert_eq!(ai.interventions(), 0);
}

#[test]
fn same_seed_same_decisions() {
    let run = || {
        let mut ai = AiController::new(AiConfig::with_skill(SkillLevel::Beginner));
        ai.start_playing();
        diverging(1.0, 300, 0.02)
            .filter_map(|(th, om, t)| ai.update_pendulum_state(th, om, t))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

/* ──────────────────────────────────────────────────────────────────────────
3) Push channel — opt-in, never hoards events
────────────────────────────────────────────────────────────────────────── */

fn perfect_run(ai: &mut AiController, from: usize, to: usize) -> usize {
    (from..to)
        .filter_map(|i| {
            let t = i as f64 * 0.01;
            ai.update_pendulum_state(PI + 0.3 * (t * 2.0).sin(), 0.6 * (t * 2.0).cos(), t)
        })
        .count()
}

#[test]
fn unsubscribed_controller_queues_nothing() {
    let mut ai = AiController::new(AiConfig::with_skill(SkillLevel::Perfect));
    ai.start_playing();
    let returned = perfect_run(&mut ai, 0, 20_000);
    assert!(returned > 100);
    assert!(!ai.is_subscribed());

    // a late subscriber only sees what comes after it
    let rx = ai.subscribe();
    assert_eq!(rx.len(), 0);
    let more = perfect_run(&mut ai, 20_000, 20_500);
    assert_eq!(rx.len(), more);
}

#[test]
fn dropping_the_receiver_closes_the_channel() {
    let mut ai = AiController::new(AiConfig::with_skill(SkillLevel::Perfect));
    let rx = ai.subscribe();
    ai.start_playing();
    assert!(perfect_run(&mut ai, 0, 500) > 0);
    assert!(ai.is_subscribed());
    drop(rx);
    // pushes keep coming back as return values
    assert!(perfect_run(&mut ai, 500, 1_000) > 0);
    assert!(!ai.is_subscribed());
}

/* ──────────────────────────────────────────────────────────────────────────
4) Profiles, strategies, learning
────────────────────────────────────────────────────────────────────────── */

#[test]
fn profiles_improve_with_skill() {
    for w in SkillLevel::ALL.windows(2) {
        let (a, b) = (w[0].profile(), w[1].profile());
        assert!(b.reaction_max <= a.reaction_max);
        assert!(b.error_rate <= a.error_rate);
        assert!(b.force_accuracy >= a.force_accuracy);
    }
    assert_eq!(SkillLevel::Perfect.profile().error_rate, 0.0);
}

#[test]
fn out_of_range_profile_is_clamped() {
    let mut ai = expert_no_errors();
    ai.set_profile(SkillProfile {
        reaction_min: -1.0,
        reaction_max: -2.0,
        error_rate: 3.0,
        error_severity: -0.5,
        force_accuracy: 7.0,
        anticipation: f64::INFINITY,
    });
    let p = ai.profile();
    assert_eq!(p.reaction_min, 0.0);
    assert_eq!(p.reaction_max, 0.0);
    assert_eq!(p.error_rate, 1.0);
    assert_eq!(p.error_severity, 0.0);
    assert_eq!(p.force_accuracy, 1.0);
    assert_eq!(p.anticipation, 1.0);
}

#[test]
fn adaptive_selection_follows_state() {
    assert_eq!(ControlStrategy::for_state(0.8, 0.0), ControlStrategy::Aggressive);
    assert_eq!(ControlStrategy::for_state(0.05, 0.1), ControlStrategy::Gentle);
    assert_eq!(ControlStrategy::for_state(0.2, 2.0), ControlStrategy::Predictive);
    assert_eq!(ControlStrategy::for_state(0.2, 0.2), ControlStrategy::Reactive);
}

#[test]
fn learning_rotates_strategy_after_poor_results() {
    let cfg = AiConfig {
        learning: true,
        adaptive_strategy: false,
        ..AiConfig::default()
    };
    let mut ai = AiController::new(cfg);
    assert_eq!(ai.strategy(), ControlStrategy::Reactive);
    for _ in 0..5 {
        ai.notify_balance_failure();
    }
    assert_eq!(ai.strategy(), ControlStrategy::Predictive);

    for _ in 0..5 {
        ai.notify_balance_success();
    }
    assert_eq!(ai.strategy(), ControlStrategy::Predictive);
}

#[test]
fn observed_outcomes_drive_learning_only_while_playing() {
    let cfg = AiConfig {
        learning: true,
        adaptive_strategy: false,
        ..AiConfig::default()
    };
    let mut ai = AiController::new(cfg);
    // hanging straight down: every observation is a failure
    for _ in 0..20 {
        ai.report_outcome(0.0);
    }
    assert_eq!(ai.strategy(), ControlStrategy::Reactive);

    ai.start_playing();
    for _ in 0..5 {
        ai.report_outcome(0.0);
    }
    assert_eq!(ai.strategy(), ControlStrategy::Predictive);

    // inside the success band, and the in-between band counts for nothing
    for _ in 0..5 {
        ai.report_outcome(PI + 0.05);
        ai.report_outcome(PI + 0.8);
    }
    assert_eq!(ai.strategy(), ControlStrategy::Predictive);
}

#[test]
fn human_error_changes_beginner_output() {
    let run = |human_error: bool| {
        let cfg = AiConfig {
            human_error,
            ..AiConfig::with_skill(SkillLevel::Beginner)
        };
        let mut ai = AiController::new(cfg);
        ai.start_playing();
        (0..3000)
            .filter_map(|i| {
                let t = i as f64 * 0.02;
                let d = 0.3 * (t * 1.3).sin();
                ai.update_pendulum_state(PI + d, 0.39 * (t * 1.3).cos(), t)
            })
            .collect::<Vec<_>>()
    };
    let clean = run(false);
    let noisy = run(true);
    assert!(!clean.is_empty());
    assert_ne!(clean, noisy);
}
