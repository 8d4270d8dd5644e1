use super::presentation::EguiPresentation;
use crate::engine::{EngineEvent, StepRuntimeState, StepStatus, run_scenario};
use crate::gate::{GatePhase, StepGate};
use crate::scenario::{Scenario, load_scenario_from_file};
use crate::theme::{Theme, install_custom_font};
use anyhow::Context as _;
use eframe::egui;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 메모리에 적재할 수 있는 최대 로그 라인 수를 정의한다.
pub(crate) const MAX_LOG_LINES: usize = 500;

/// 데모 컨트롤러 애플리케이션의 전체 상태를 보관한다.
pub struct DemoControllerApp {
    /// UI 테마 정보.
    pub(crate) theme: Theme,
    /// 현재 로드된 시나리오.
    pub(crate) scenario: Option<Scenario>,
    /// 선택된 시나리오 경로.
    pub(crate) scenario_path: Option<PathBuf>,
    /// 선택된 Step ID.
    pub(crate) selected_step: Option<String>,
    /// Step별 상태 맵.
    pub(crate) step_states: HashMap<String, StepRuntimeState>,
    /// Tokio 런타임.
    runtime: Runtime,
    /// 코멘트 창 표시 계층.
    pub(crate) presentation: Arc<EguiPresentation>,
    /// 실행 중인 시나리오의 게이트.
    pub(crate) gate: Option<StepGate>,
    /// 엔진 이벤트 수신 채널.
    pub(crate) events_rx: Option<UnboundedReceiver<EngineEvent>>,
    /// 시나리오 취소 토큰.
    pub(crate) cancel_token: Option<CancellationToken>,
    /// 실행 중 여부.
    pub(crate) scenario_running: bool,
    /// 마지막 실행 결과 요약.
    pub(crate) last_outcome: Option<String>,
    /// 마지막 오류 메시지.
    pub(crate) last_error: Option<String>,
}

impl DemoControllerApp {
    /// egui Context를 받아 초기 상태를 구성한다.
    pub fn new(cc: &eframe::CreationContext<'_>, initial: Option<PathBuf>) -> anyhow::Result<Self> {
        let theme = Theme::default();
        theme.apply(&cc.egui_ctx);
        install_custom_font(&cc.egui_ctx);
        let runtime = Runtime::new().context("Tokio 런타임 생성 실패")?;
        let mut app = Self {
            theme,
            scenario: None,
            scenario_path: None,
            selected_step: None,
            step_states: HashMap::new(),
            runtime,
            presentation: Arc::new(EguiPresentation::new(cc.egui_ctx.clone())),
            gate: None,
            events_rx: None,
            cancel_token: None,
            scenario_running: false,
            last_outcome: None,
            last_error: None,
        };
        if let Some(path) = initial {
            app.apply_scenario_path(path);
        }
        Ok(app)
    }

    /// 엔진 이벤트를 모두 소비하여 UI 상태를 동기화한다.
    pub(super) fn drain_events(&mut self) {
        if let Some(mut rx) = self.events_rx.take() {
            while let Ok(event) = rx.try_recv() {
                match event {
                    EngineEvent::CheckpointRaised { step_id, .. } => {
                        self.step_state(&step_id).status = StepStatus::AwaitingDecision;
                        self.selected_step = Some(step_id);
                    }
                    EngineEvent::CheckpointResolved { step_id, continual } => {
                        if continual {
                            self.push_log(&step_id, "자동 진행".into());
                        }
                    }
                    EngineEvent::StepStarted { step_id } => {
                        let state = self.step_state(&step_id);
                        state.status = StepStatus::Running;
                        state.started_at = Some(Instant::now());
                    }
                    EngineEvent::StepLog { step_id, line } => {
                        self.push_log(&step_id, line);
                    }
                    EngineEvent::StepFinished { step_id, success } => {
                        self.mark_step_finished(&step_id, success);
                    }
                    // 코멘트 창이 직접 보여 준다
                    EngineEvent::FinalCommentRaised { .. } => {}
                    EngineEvent::ScenarioInterrupted { message } => {
                        if let Some(step_id) = self.awaiting_step() {
                            self.step_state(&step_id).status = StepStatus::Interrupted;
                        }
                        self.last_outcome = Some(format!("중단됨 · {message}"));
                        self.finish_run();
                    }
                    EngineEvent::ScenarioFinished => {
                        if self.last_outcome.is_none() {
                            let finished = self
                                .gate
                                .as_ref()
                                .is_some_and(|gate| gate.phase() == GatePhase::Finished);
                            self.last_outcome = Some(if finished {
                                "데모 완료".into()
                            } else {
                                "데모가 끝까지 진행되지 않았습니다.".into()
                            });
                        }
                        self.finish_run();
                    }
                }
            }
            self.events_rx = Some(rx);
        }
    }

    fn step_state(&mut self, step_id: &str) -> &mut StepRuntimeState {
        self.step_states.entry(step_id.to_string()).or_default()
    }

    /// 결정을 기다리던 Step의 ID.
    fn awaiting_step(&self) -> Option<String> {
        self.step_states
            .iter()
            .find(|(_, state)| state.status == StepStatus::AwaitingDecision)
            .map(|(id, _)| id.clone())
    }

    fn finish_run(&mut self) {
        self.scenario_running = false;
        self.cancel_token = None;
    }

    /// Step이 종료되었음을 기록한다.
    fn mark_step_finished(&mut self, step_id: &str, success: bool) {
        let state = self.step_state(step_id);
        state.finished_at = Some(Instant::now());
        if success {
            state.status = StepStatus::Success;
        } else if !matches!(state.status, StepStatus::Failed(_)) {
            let reason = state.logs.last().cloned().unwrap_or_else(|| "실패".into());
            state.status = StepStatus::Failed(reason);
        }
    }

    /// Step별 로그를 버퍼에 적재한다.
    fn push_log(&mut self, step_id: &str, line: String) {
        let state = self.step_state(step_id);
        state.logs.push(line);
        if state.logs.len() > MAX_LOG_LINES {
            let overflow = state.logs.len() - MAX_LOG_LINES;
            state.logs.drain(0..overflow);
        }
    }

    /// 파일 다이얼로그로부터 시나리오를 로드한다.
    pub(super) fn load_scenario_from_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("YAML", &["yaml", "yml"])
            .pick_file()
        {
            self.apply_scenario_path(path);
        }
    }

    /// 주어진 경로의 YAML을 파싱한다.
    pub(super) fn apply_scenario_path(&mut self, path: PathBuf) {
        if self.scenario_running {
            self.last_error = Some("실행 중에는 시나리오를 바꿀 수 없습니다.".into());
            return;
        }
        match load_scenario_from_file(&path) {
            Ok(scenario) => {
                info!(path = %path.display(), steps = scenario.len(), "시나리오 로드");
                self.reset_step_states(&scenario);
                self.selected_step = scenario.steps.first().map(|s| s.id.clone());
                self.scenario = Some(scenario);
                self.scenario_path = Some(path);
                self.last_error = None;
                self.last_outcome = None;
            }
            Err(err) => {
                warn!(path = %path.display(), "시나리오 로드 실패: {err:#}");
                self.last_error = Some(format!("{err:#}"));
            }
        }
    }

    fn reset_step_states(&mut self, scenario: &Scenario) {
        self.step_states.clear();
        for step in &scenario.steps {
            self.step_states
                .insert(step.id.clone(), StepRuntimeState::new());
        }
    }

    /// 시나리오 실행을 시작한다.
    pub(super) fn start_scenario(&mut self) {
        if self.scenario_running {
            return;
        }
        let scenario = match self.scenario.clone() {
            Some(s) => s,
            None => {
                self.last_error = Some("시나리오가 로드되지 않았습니다.".into());
                return;
            }
        };
        self.reset_step_states(&scenario);
        let gate = StepGate::new(
            self.presentation.clone(),
            scenario.settings.clone(),
            self.runtime.handle().clone(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let driver_gate = gate.clone();
        let driver_token = token.clone();
        self.runtime.spawn(async move {
            if let Err(err) = run_scenario(scenario, driver_gate, tx, driver_token).await {
                warn!(status = err.status(), "{err}");
            }
        });
        self.gate = Some(gate);
        self.events_rx = Some(rx);
        self.cancel_token = Some(token);
        self.scenario_running = true;
        self.last_error = None;
        self.last_outcome = None;
    }

    /// 현재 실행 중인 시나리오를 중단한다.
    pub(super) fn stop_scenario(&mut self) {
        if let Some(token) = &self.cancel_token {
            token.cancel();
        }
        if let Some(gate) = &self.gate {
            gate.close();
        }
        self.last_outcome = Some("사용자가 실행을 정지했습니다.".into());
        self.scenario_running = false;
    }

    /// 선택된 Step의 로그 배열을 반환한다.
    pub(super) fn selected_logs(&self) -> &[String] {
        self.selected_step
            .as_ref()
            .and_then(|id| self.step_states.get(id))
            .map(|state| state.logs.as_slice())
            .unwrap_or(&[])
    }

    /// 전체 진행률을 계산한다.
    pub(super) fn progress_ratio(&self) -> f32 {
        match &self.scenario {
            Some(scenario) if !scenario.is_empty() => {
                let completed = self
                    .step_states
                    .values()
                    .filter(|state| state.status.is_terminal())
                    .count();
                completed as f32 / scenario.len() as f32
            }
            _ => 0.0,
        }
    }
}
