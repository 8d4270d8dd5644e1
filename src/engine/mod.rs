mod context;
mod error;
mod events;
mod runner;
mod state;
mod steps;

pub use events::EngineEvent;
pub use runner::run_scenario;
pub use state::{StepRuntimeState, StepStatus};
