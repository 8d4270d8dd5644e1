#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod console;
mod engine;
mod gate;
mod scenario;
mod theme;

use app::DemoControllerApp;
use console::ConsoleOptions;
use eframe::egui;
use std::path::PathBuf;

/// egui 애플리케이션을 초기화하고 실행하는 진입점입니다.
///
/// 첫 번째 인자로 시나리오 YAML 경로를 주면 시작과 함께 불러옵니다.
/// `--headless [--auto] <scenario.yaml>`이면 창 없이 터미널에서 실행합니다.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args_os().skip(1).peekable();
    if args.next_if(|arg| arg == "--headless").is_some() {
        let status = match ConsoleOptions::from_args(args).and_then(console::run) {
            Ok(status) => status,
            Err(err) => {
                tracing::error!("헤드리스 실행 실패: {err:#}");
                1
            }
        };
        std::process::exit(status);
    }

    let initial = args.next().map(PathBuf::from);
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_app_id("Rust StepGate")
            .with_inner_size([1100.0, 760.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Step Gate 데모 컨트롤러",
        native_options,
        Box::new(move |cc| match DemoControllerApp::new(cc, initial) {
            Ok(app) => Box::new(app) as Box<dyn eframe::App>,
            Err(err) => {
                tracing::error!("초기화 실패: {err:#}");
                std::process::exit(1);
            }
        }),
    )
}
