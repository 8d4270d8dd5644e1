use crate::engine::StepStatus;
use crate::gate::ConfirmControl;
use eframe::egui::{self, RichText};

use super::state::DemoControllerApp;
use super::widgets::{PrimaryButton, StepCard, solid_section_header};

mod comment;
mod layout;
mod panels;
mod status;
mod toolbar;
