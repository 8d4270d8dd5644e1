mod presentation;
mod state;
mod ui;
mod widgets;

pub use state::DemoControllerApp;
