// src/session/mod.rs

//! # Sessions
//!
//! A **session** wires the systems into one tick loop. Systems stay neutral
//! (the simulator knows nothing about the AI, the AI nothing about the
//! recorder); the session is where they meet.
//!
//! ## Tick order
//! [`BalanceSession::tick`] runs, in order:
//! 1. `PendulumSimulator::step(dt)`
//! 2. record the new state
//! 3. perturbation force, if a profile is active (`system-perturbation`)
//! 4. `AiController::update_pendulum_state`, then `report_outcome` for
//!    learning
//! 5. drain AI push events into `apply_force`, recording each as an AI push
//!
//! Player input goes through [`BalanceSession::player_push`] at any time;
//! magnitudes that are not finite and positive are dropped.
//!
//! ## Threads
//! The session is single-threaded. The recorder sits behind a
//! `SharedRecorder` so another thread (a dashboard) can take a snapshot
//! under the lock and compute metrics outside it.
//!
//! ## Tuning
//! With `session-tuning`, [`tuning::calibrate_perturbation`] runs whole
//! sessions inside the crate's closed refinement loop to pick a
//! perturbation strength that lands an AI player on a target stability.

pub mod driver;
pub use driver::*;

#[cfg(feature = "session-tuning")]
pub mod tuning;

#[cfg(feature = "session-tuning")]
pub use tuning::*;
