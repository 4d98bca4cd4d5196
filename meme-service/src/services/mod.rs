pub mod codec;
pub mod metrics;
pub mod orchestrator;
pub mod providers;
pub mod validation;

pub use orchestrator::MemeOrchestrator;
