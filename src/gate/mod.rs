//! 체크포인트마다 시나리오를 멈추고 운영자 결정을 기다리는 스텝 게이트이다.

mod advancer;
mod config;
mod error;
mod headless;
mod presentation;
mod state;
mod step_gate;

pub use config::GateSettings;
pub use error::AdvanceError;
pub use headless::HeadlessPresentation;
#[cfg(test)]
pub use headless::Interaction;
pub use presentation::{ConfirmControl, Presentation};
pub use state::{GatePhase, RunState};
pub use step_gate::StepGate;
