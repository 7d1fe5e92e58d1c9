pub mod sdk;
pub mod ai;
pub mod export;
pub mod metrics;
pub mod recorder;
pub mod simulator;
#[cfg(feature = "system-perturbation")] pub mod perturbation;
