//! 창 없이 터미널에서 시나리오를 돌리는 헤드리스 실행 모드이다.
//!
//! 코멘트 창은 [`HeadlessPresentation`]이 대신하고, 운영자는 표준 입력으로 결정을 내린다.
//! `--auto`를 주면 첫 체크포인트에서 자동 진행을 켜고 마지막 코멘트에서 스스로 종료한다.

use crate::engine::{EngineEvent, run_scenario};
use crate::gate::{ConfirmControl, HeadlessPresentation, StepGate};
use crate::scenario::{Scenario, load_scenario_from_file};
use anyhow::{Context as _, bail};
use std::ffi::OsString;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 헤드리스 모드 실행 옵션이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOptions {
    pub scenario_path: PathBuf,
    /// 운영자 없이 끝까지 진행한다.
    pub auto: bool,
}

impl ConsoleOptions {
    /// `--headless` 뒤에 오는 인자를 해석한다.
    pub fn from_args(args: impl IntoIterator<Item = OsString>) -> anyhow::Result<Self> {
        let mut auto = false;
        let mut scenario_path = None;
        for arg in args {
            if arg == "--auto" {
                auto = true;
            } else if scenario_path.is_none() {
                scenario_path = Some(PathBuf::from(arg));
            } else {
                bail!("알 수 없는 인자: {}", arg.to_string_lossy());
            }
        }
        let scenario_path = scenario_path
            .context("시나리오 경로가 필요합니다: --headless [--auto] <scenario.yaml>")?;
        Ok(Self {
            scenario_path,
            auto,
        })
    }
}

/// 시나리오를 헤드리스로 실행하고 프로세스 종료 코드를 돌려준다.
pub fn run(options: ConsoleOptions) -> anyhow::Result<i32> {
    let scenario = load_scenario_from_file(&options.scenario_path)?;
    let runtime = Runtime::new().context("Tokio 런타임 생성 실패")?;
    let presentation = Arc::new(HeadlessPresentation::new());
    let gate = StepGate::new(
        presentation.clone(),
        scenario.settings.clone(),
        runtime.handle().clone(),
    );
    info!(
        path = %options.scenario_path.display(),
        auto = options.auto,
        "헤드리스 실행 시작"
    );
    if !options.auto {
        spawn_operator(gate.clone());
    }
    Ok(runtime.block_on(run_console(scenario, gate, presentation, options.auto)))
}

async fn run_console(
    scenario: Scenario,
    gate: StepGate,
    presentation: Arc<HeadlessPresentation>,
    auto: bool,
) -> i32 {
    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report_events(rx, gate.clone(), presentation, auto));
    let result = run_scenario(scenario, gate.clone(), tx, CancellationToken::new()).await;
    if let Err(err) = reporter.await {
        warn!("이벤트 출력 태스크 실패: {err}");
    }
    match result {
        Ok(report) => {
            let verdict = if gate.is_finished() {
                "데모 완료"
            } else {
                "데모가 끝까지 진행되지 않았습니다."
            };
            println!(
                "{verdict} · 체크포인트 {}개, 자동 진행 {}회",
                report.checkpoints, report.auto_advanced
            );
            0
        }
        Err(err) => {
            println!("{err}");
            err.status()
        }
    }
}

/// 드라이버 이벤트를 터미널에 출력한다. 자동 모드에서는 결정도 대신 내린다.
async fn report_events(
    mut rx: UnboundedReceiver<EngineEvent>,
    gate: StepGate,
    presentation: Arc<HeadlessPresentation>,
    auto: bool,
) {
    while let Some(event) = rx.recv().await {
        match event {
            EngineEvent::CheckpointRaised { step_id, .. } => {
                println!("\n[{step_id}]");
                println!("{}", render_window(&presentation));
                if auto && !gate.is_continual() {
                    gate.run_all();
                }
            }
            EngineEvent::FinalCommentRaised { .. } => {
                println!();
                println!("{}", render_window(&presentation));
                if auto {
                    gate.interrupt();
                }
            }
            EngineEvent::CheckpointResolved { continual, .. } => {
                if continual {
                    println!("  → 자동 진행");
                }
            }
            EngineEvent::StepStarted { step_id } => println!("  ▶ {step_id}"),
            EngineEvent::StepLog { line, .. } => println!("    {line}"),
            EngineEvent::StepFinished { step_id, success } => {
                let mark = if success { "✔" } else { "✖" };
                println!("  {mark} {step_id}");
            }
            EngineEvent::ScenarioInterrupted { .. } | EngineEvent::ScenarioFinished => {}
        }
    }
}

/// 헤드리스 창의 코멘트와 켜진 버튼을 한 덩어리 텍스트로 그린다.
fn render_window(presentation: &HeadlessPresentation) -> String {
    let buttons: Vec<String> = ConfirmControl::ALL
        .into_iter()
        .filter(|control| presentation.is_enabled(*control))
        .map(|control| format!("[{}] {}", key_for(control), presentation.label(control)))
        .collect();
    format!("💬 {}\n   {}", presentation.comment(), buttons.join("  "))
}

fn key_for(control: ConfirmControl) -> char {
    match control {
        ConfirmControl::OneStep => 's',
        ConfirmControl::AllSteps => 'a',
        ConfirmControl::Interrupt => 'q',
    }
}

/// 입력 한 줄을 버튼으로 바꾼다. 빈 줄은 "한 단계"이다.
fn control_for_input(input: &str) -> Option<ConfirmControl> {
    match input.trim() {
        "" => Some(ConfirmControl::OneStep),
        key => ConfirmControl::ALL
            .into_iter()
            .find(|control| key.len() == 1 && key.starts_with(key_for(*control))),
    }
}

/// 표준 입력을 읽어 결정을 게이트로 보낸다.
fn spawn_operator(gate: StepGate) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match control_for_input(&line) {
                Some(control) => {
                    if !gate.decide(control.decision()) {
                        println!("  지금은 이 결정을 받을 수 없습니다.");
                    }
                }
                None => println!("  알 수 없는 입력: {}", line.trim()),
            }
        }
    });
}
