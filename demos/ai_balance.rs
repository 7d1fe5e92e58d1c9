// demos/ai_balance.rs
// Run with:
//   cargo run --example ai_balance

use pendulum_balance::PendulumConfig;
use pendulum_balance::session::BalanceSession;
use pendulum_balance::systems::ai::SkillLevel;
use pendulum_balance::systems::metrics::{MetricCategory, MetricStatus};
use pendulum_balance::systems::perturbation::PerturbationProfile;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let dt = 1.0 / 60.0;
    let ticks = 60 * 60;

    for skill in SkillLevel::ALL {
        let mut cfg = PendulumConfig::default();
        cfg.ai.skill = skill;

        let mut session = BalanceSession::new(cfg);
        session.set_perturbation(PerturbationProfile::for_level(3), 17);
        session.start();
        session.start_ai();
        session.run(ticks, dt);
        session.stop();

        println!("== {} ==", skill.name());
        for cat in MetricCategory::ALL {
            for m in session.metrics(cat) {
                let shown = match m.status {
                    MetricStatus::InsufficientData => "insufficient data".to_string(),
                    MetricStatus::Computed => match m.value.as_f64() {
                        Some(x) => format!("{x:.3} {}", m.kind.unit()),
                        None => m.value.as_label().unwrap_or_default().to_string(),
                    },
                };
                println!("  {:<28} {}", m.kind.name(), shown);
            }
        }

        let pkg = session.export();
        match pkg.summary_json() {
            Ok(json) => println!("  summary: {json}"),
            Err(e) => eprintln!("  summary failed: {e}"),
        }
    }

    #[cfg(feature = "session-tuning")]
    {
        use pendulum_balance::session::tuning::{TuneConfig, calibrate_perturbation};

        let out = calibrate_perturbation(&PendulumConfig::default(), &TuneConfig::default(), 0.7);
        println!(
            "== calibration == strength {:.3} → stability {:.2} ({} iters, converged: {})",
            out.strength, out.stability, out.iters, out.converged
        );
    }
}
