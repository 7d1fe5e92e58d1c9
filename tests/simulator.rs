// tests/simulator.rs
use std::f64::consts::PI;

use pendulum_balance::config::PhysicsConfig;
use pendulum_balance::mechanics::angle;
use pendulum_balance::systems::simulator::PendulumSimulator;

fn running() -> PendulumSimulator {
    let mut sim = PendulumSimulator::new(PhysicsConfig::default());
    sim.start();
    sim
}

/* ──────────────────────────────────────────────────────────────────────────
1) Lifecycle — reset pose, stop keeps state, step is inert while stopped
────────────────────────────────────────────────────────────────────────── */

#[test]
fn new_simulator_starts_at_reset_pose_and_stopped() {
    let sim = PendulumSimulator::new(PhysicsConfig::default());
    let st = sim.state();
    assert!(!sim.is_running());
    assert!((st.theta - (PI - 0.3)).abs() < 1e-15);
    assert_eq!(st.theta_dot, 0.0);
    assert_eq!(st.time, 0.0);
}

#[test]
fn step_is_noop_while_stopped() {
    let mut sim = PendulumSimulator::new(PhysicsConfig::default());
    let before = sim.state();
    sim.step(0.02);
    assert_eq!(sim.state(), before);

    sim.start();
    sim.step(0.02);
    sim.stop();
    let held = sim.state();
    assert!(held.time > 0.0);
    sim.step(0.02);
    assert_eq!(sim.state(), held);
}

#[test]
fn reset_restores_offset_and_zeroes_time() {
    let mut sim = running();
    for _ in 0..50 {
        sim.step(0.02);
    }
    sim.apply_force(1.0);
    sim.reset();
    let st = sim.state();
    assert!((st.theta - (PI - 0.3)).abs() < 1e-15);
    assert_eq!(st.theta_dot, 0.0);
    assert_eq!(st.time, 0.0);
    assert!(sim.is_running());

    sim.reset_with_angle(PI + 0.1);
    assert_eq!(sim.state().theta, PI + 0.1);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Dynamics — upright is unstable, determinism, dissipation
────────────────────────────────────────────────────────────────────────── */

#[test]
fn uncontrolled_pendulum_falls_away_from_upright() {
    let mut sim = running();
    let start = sim.state().theta;
    let mut max_dev: f64 = 0.0;
    for i in 0..250 {
        sim.step(0.02);
        let dev = angle::deviation(sim.state().theta);
        if i == 9 {
            // falls to the left, away from π
            assert!(sim.state().theta < start);
            assert!(dev.abs() > 0.3);
        }
        max_dev = max_dev.max(dev.abs());
    }
    assert!(max_dev > 1.0, "max deviation {max_dev}");
    assert!((sim.state().time - 5.0).abs() < 1e-9);
}

#[test]
fn identical_inputs_give_identical_trajectories() {
    let run = || {
        let mut sim = running();
        let mut out = Vec::new();
        for i in 0..400 {
            if i % 37 == 0 {
                sim.apply_force(if i % 2 == 0 { 1.5 } else { -0.7 });
            }
            sim.step(0.0167);
            out.push(sim.state());
        }
        out
    };
    assert_eq!(run(), run());
}

#[test]
fn energy_never_increases_without_forcing() {
    let mut sim = running();
    let mut e = sim.energy();
    for _ in 0..5_000 {
        sim.step(0.01);
        let e2 = sim.energy();
        assert!(e2 <= e + 1e-6, "energy rose from {e} to {e2}");
        e = e2;
    }
}

#[test]
fn angular_velocity_dies_out() {
    let mut sim = running();
    for _ in 0..10_000 {
        sim.step(0.01);
    }
    assert!(sim.state().theta_dot.abs() < 0.05);
}

#[test]
fn theta_is_not_wrapped() {
    let mut sim = running();
    sim.apply_force(60.0);
    let mut max_theta = sim.state().theta;
    for _ in 0..300 {
        sim.step(0.01);
        max_theta = max_theta.max(sim.state().theta);
    }
    // a hard push swings it over the top at least once
    assert!(max_theta > 2.0 * PI, "max θ {max_theta}");
}

/* ──────────────────────────────────────────────────────────────────────────
3) Impulses — linear in force, symmetric, signed right = +θ̇
────────────────────────────────────────────────────────────────────────── */

#[test]
fn opposite_pushes_cancel() {
    let mut sim = running();
    for _ in 0..20 {
        sim.step(0.02);
    }
    let before = sim.state().theta_dot;
    sim.apply_force(2.3);
    sim.apply_force(-2.3);
    assert!((sim.state().theta_dot - before).abs() < 1e-12);
}

#[test]
fn right_push_raises_angular_velocity_by_gain() {
    let mut sim = running();
    sim.apply_force(1.0);
    assert!((sim.state().theta_dot - 0.3).abs() < 1e-15);
    sim.apply_force(-2.0);
    assert!((sim.state().theta_dot + 0.3).abs() < 1e-15);
}

#[test]
fn drive_term_moves_a_balanced_pendulum() {
    let cfg = PhysicsConfig {
        drive_amplitude: 0.5,
        drive_frequency: 1.0,
        ..PhysicsConfig::default()
    };
    let mut sim = PendulumSimulator::new(cfg);
    sim.reset_with_angle(PI);
    sim.start();
    sim.step(0.05);
    assert!(sim.state().theta_dot > 0.0);
}
