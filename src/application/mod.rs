pub mod convergence_controller;
pub mod fingerprint;
pub mod intensity;
pub mod reconciler;

pub use convergence_controller::{run, ConvergenceController, CycleSummary, Decision};
pub use fingerprint::{fingerprint, Fingerprint};
pub use intensity::{AdvanceIntensity, IntensityController};
pub use reconciler::Reconciler;
