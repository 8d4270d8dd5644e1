use super::advancer::{AdvanceHandle, AdvanceMode, AutoAdvance, DecisionSink};
use super::config::GateSettings;
use super::presentation::{ConfirmControl, FINISH_LABEL, SharedPresentation};
use super::state::{Decision, GatePhase, RunState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info};

/// 시나리오 드라이버와 운영자 사이에서 체크포인트 진행을 중계한다.
///
/// 복제본은 모두 같은 상태를 공유한다. 상태 전이는 watch 채널 안에서 한 번에 일어나므로
/// 드라이버, UI 스레드, 자동 진행 태스크가 동시에 호출해도 체크포인트마다 결정은 하나만
/// 반영된다.
#[derive(Clone)]
pub struct StepGate {
    inner: Arc<GateInner>,
}

struct GateInner {
    /// 실행 상태와 변경 알림.
    state: watch::Sender<RunState>,
    presentation: SharedPresentation,
    settings: Mutex<GateSettings>,
    /// 현재 체크포인트에 붙은 자동 진행 태스크.
    advancer: Mutex<Option<AdvanceHandle>>,
    runtime: Handle,
}

/// 자동 진행 태스크가 게이트를 붙잡지 않도록 약한 참조로 결정을 전달한다.
struct GateSink {
    gate: Weak<GateInner>,
}

impl DecisionSink for GateSink {
    fn resolve(&self, checkpoint: u64, decision: Decision) -> bool {
        match self.gate.upgrade() {
            Some(inner) => inner.decide(decision, Some(checkpoint)),
            None => false,
        }
    }
}

impl StepGate {
    /// 표시 계층과 설정을 받아 게이트를 만든다. 자동 진행 태스크는 `runtime`에서 돈다.
    pub fn new(presentation: SharedPresentation, settings: GateSettings, runtime: Handle) -> Self {
        let (state, _) = watch::channel(RunState::default());
        Self {
            inner: Arc::new(GateInner {
                state,
                presentation,
                settings: Mutex::new(settings),
                advancer: Mutex::new(None),
                runtime,
            }),
        }
    }

    /// 체크포인트를 올리고 코멘트를 표시한다. 결정은 기다리지 않는다.
    pub fn next_step(&self, comment: impl Into<String>) {
        self.inner.raise_checkpoint(comment.into(), false);
    }

    /// 마지막 코멘트를 표시한다. 운영자가 "종료"를 눌러야 재개된다.
    pub fn show_final_comment(&self, comment: impl Into<String>) {
        self.inner.raise_checkpoint(comment.into(), true);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state.borrow().stopped
    }

    pub fn is_interrupted(&self) -> bool {
        self.inner.state.borrow().is_interrupted()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state.borrow().is_finished()
    }

    pub fn is_continual(&self) -> bool {
        self.inner.state.borrow().continual
    }

    pub fn phase(&self) -> GatePhase {
        self.inner.state.borrow().phase()
    }

    pub fn snapshot(&self) -> RunState {
        self.inner.state.borrow().clone()
    }

    /// 상태 변경을 구독한다.
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.inner.state.subscribe()
    }

    /// 중단 보고용 메시지이다.
    pub fn interrupt_message(&self) -> String {
        format!("Step 설명: \"{}\"", self.inner.state.borrow().last_comment)
    }

    /// 코멘트 창을 닫는다. 실행 상태는 바꾸지 않는다.
    pub fn close(&self) {
        self.inner.cancel_advancer(None);
        self.inner.presentation.hide();
    }

    /// 다음 체크포인트부터 적용할 코멘트 표시 시간을 바꾼다.
    pub fn set_comment_timeout(&self, timeout: Duration) {
        self.inner.settings().comment_timeout_ms =
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }

    /// "한 단계" 결정. 반영되지 않았으면 false.
    pub fn step(&self) -> bool {
        self.inner.decide(Decision::Step, None)
    }

    /// "전체 단계" 결정.
    pub fn run_all(&self) -> bool {
        self.inner.decide(Decision::RunAll, None)
    }

    /// "중단" 결정. 마지막 체크포인트에서는 종료 확인이 된다.
    pub fn interrupt(&self) -> bool {
        self.inner.decide(Decision::Interrupt, None)
    }

    pub fn decide(&self, decision: Decision) -> bool {
        self.inner.decide(decision, None)
    }

    /// 현재 체크포인트가 풀릴 때까지 기다린다.
    pub async fn wait_resolved(&self) -> RunState {
        let mut rx = self.inner.state.subscribe();
        match rx.wait_for(|state| !state.stopped).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }
}

impl GateInner {
    fn settings(&self) -> MutexGuard<'_, GateSettings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advancer_slot(&self) -> MutexGuard<'_, Option<AdvanceHandle>> {
        self.advancer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn raise_checkpoint(self: &Arc<Self>, comment: String, last: bool) {
        let mut checkpoint = 0;
        let mut continual = false;
        self.state.send_modify(|state| {
            checkpoint = state.raise(&comment, last);
            continual = state.continual;
        });
        self.cancel_advancer(None);
        info!(checkpoint, last, continual, "체크포인트 도달: {comment}");

        let presentation = &self.presentation;
        presentation.display_comment(&comment);
        let (mode, control) = if last {
            presentation.set_confirm_label(ConfirmControl::Interrupt, FINISH_LABEL);
            presentation.set_control_enabled(ConfirmControl::Interrupt, true);
            (AdvanceMode::Hover, ConfirmControl::Interrupt)
        } else {
            for control in ConfirmControl::ALL {
                presentation.set_confirm_label(control, control.default_label());
                presentation.set_control_enabled(control, true);
            }
            let mode = if continual {
                AdvanceMode::Press
            } else {
                AdvanceMode::Hover
            };
            (mode, ConfirmControl::OneStep)
        };
        self.show_window();

        let task = {
            let settings = self.settings();
            AutoAdvance {
                mode,
                control,
                delay: settings.comment_timeout(),
                poll_interval: settings.poll_interval(),
                drain_timeout: settings.drain_timeout(),
                readiness_timeout: settings.readiness_timeout(),
            }
        };
        // 결정 수락과 태스크 등록을 슬롯 잠금 안에서 묶는다. 그 사이에 들어온 결정은
        // cancel_advancer에서 잠금을 기다렸다가 방금 등록된 태스크를 취소한다.
        let mut slot = self.advancer_slot();
        let mut opened = false;
        self.state.send_if_modified(|state| {
            opened = state.open(checkpoint);
            opened
        });
        if !opened {
            debug!(checkpoint, "창 준비 중 체크포인트가 교체되었습니다");
            return;
        }
        let sink = Arc::new(GateSink {
            gate: Arc::downgrade(self),
        });
        *slot = Some(task.spawn(&self.runtime, presentation.clone(), sink, checkpoint));
    }

    /// 결정을 반영한다. 체크포인트를 선점하지 못한 결정은 아무 일도 하지 않는다.
    fn decide(&self, decision: Decision, checkpoint: Option<u64>) -> bool {
        let automatic = checkpoint.is_some();
        let mut claimed = None;
        self.state.send_if_modified(|state| {
            let result = state.claim(decision, checkpoint);
            let modified = result.is_ok();
            claimed = Some(result);
            modified
        });
        let checkpoint = match claimed {
            Some(Ok(checkpoint)) => checkpoint,
            Some(Err(err)) => {
                debug!(%err, "결정을 무시합니다");
                return false;
            }
            None => return false,
        };

        // 드라이버가 깨어나 다음 창을 띄우기 전에 현재 창을 먼저 내린다.
        self.hide_window();
        for control in ConfirmControl::ALL {
            self.presentation.set_control_enabled(control, false);
        }
        self.cancel_advancer(Some(checkpoint));
        self.state
            .send_modify(|state| state.commit(decision, automatic));
        info!(checkpoint, ?decision, "체크포인트 해제");
        true
    }

    /// 자동 진행 태스크를 취소한다. `checkpoint`가 주어지면 해당 체크포인트의 태스크만 건드린다.
    fn cancel_advancer(&self, checkpoint: Option<u64>) {
        let mut slot = self.advancer_slot();
        let matches = match (slot.as_ref(), checkpoint) {
            (Some(handle), Some(id)) => handle.checkpoint() == id,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if matches {
            if let Some(handle) = slot.take() {
                handle.cancel();
            }
        }
    }

    fn show_window(&self) {
        self.presentation.show();
        if !self.settings().modal {
            self.presentation.bring_to_front();
        }
    }

    fn hide_window(&self) {
        if self.settings().modal {
            self.presentation.hide();
        } else {
            self.presentation.send_to_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::error::AdvanceError;
    use crate::gate::headless::{HeadlessPresentation, Interaction};
    use crate::gate::presentation::Presentation;
    use crate::gate::state::Outcome;
    use async_trait::async_trait;
    use tokio::time::{Instant, sleep};

    /// 버튼이 켜지거나 창이 뜨는 즉시 "한 단계"를 누르는 운영자를 흉내 낸다.
    #[derive(Default)]
    struct EagerOperator {
        window: HeadlessPresentation,
        gate: Mutex<Option<StepGate>>,
        clicks: Mutex<Vec<bool>>,
    }

    impl EagerOperator {
        fn click(&self) {
            let gate = self.gate.lock().expect("gate mutex poisoned").clone();
            if let Some(gate) = gate {
                let accepted = gate.step();
                self.clicks.lock().expect("clicks mutex poisoned").push(accepted);
            }
        }

        fn clicks(&self) -> Vec<bool> {
            self.clicks.lock().expect("clicks mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl Presentation for EagerOperator {
        fn display_comment(&self, text: &str) {
            self.window.display_comment(text);
        }

        fn show(&self) {
            self.window.show();
            self.click();
        }

        fn hide(&self) {
            self.window.hide();
        }

        fn bring_to_front(&self) {
            self.window.bring_to_front();
        }

        fn send_to_back(&self) {
            self.window.send_to_back();
        }

        fn set_confirm_label(&self, control: ConfirmControl, label: &str) {
            self.window.set_confirm_label(control, label);
        }

        fn set_control_enabled(&self, control: ConfirmControl, enabled: bool) {
            self.window.set_control_enabled(control, enabled);
            if enabled {
                self.click();
            }
        }

        fn is_confirm_control_ready(&self, control: ConfirmControl) -> bool {
            self.window.is_confirm_control_ready(control)
        }

        fn position_on(&self, control: ConfirmControl) {
            self.window.position_on(control);
        }

        fn press(&self, control: ConfirmControl) {
            self.window.press(control);
        }

        async fn drain_interaction_queue(&self, timeout: Duration) -> Result<(), AdvanceError> {
            self.window.drain_interaction_queue(timeout).await
        }
    }

    fn gate_with(settings: GateSettings) -> (StepGate, Arc<HeadlessPresentation>) {
        let recorder = Arc::new(HeadlessPresentation::new());
        let gate = StepGate::new(recorder.clone(), settings, Handle::current());
        (gate, recorder)
    }

    fn gate() -> (StepGate, Arc<HeadlessPresentation>) {
        gate_with(GateSettings::default())
    }

    fn presses(recorder: &HeadlessPresentation) -> usize {
        recorder
            .interactions()
            .iter()
            .filter(|i| matches!(i, Interaction::Press(_)))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn next_step_stops_until_step() {
        let (gate, recorder) = gate();
        gate.next_step("첫 단계");
        assert!(gate.is_stopped());
        assert_eq!(gate.phase(), GatePhase::AwaitingDecision);
        assert_eq!(recorder.comment(), "첫 단계");
        assert!(recorder.is_visible());
        assert!(recorder.is_enabled(ConfirmControl::AllSteps));

        assert!(gate.step());
        assert!(!gate.is_stopped());
        assert_eq!(gate.phase(), GatePhase::Running);
        assert!(!recorder.is_enabled(ConfirmControl::OneStep));
        assert!(!gate.step());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_checkpoint_only_hovers() {
        let (gate, recorder) = gate();
        gate.next_step("수동");
        sleep(Duration::from_secs(5)).await;
        assert!(gate.is_stopped());
        assert!(recorder
            .interactions()
            .contains(&Interaction::PositionOn(ConfirmControl::OneStep)));
        assert_eq!(presses(&recorder), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_all_auto_resolves_following_checkpoints() {
        let (gate, recorder) = gate();
        gate.next_step("init");
        assert!(gate.run_all());
        assert!(gate.is_continual());

        for comment in ["load", "run"] {
            let raised = Instant::now();
            gate.next_step(comment);
            assert!(gate.is_stopped());
            let state = gate.wait_resolved().await;
            assert!(!state.stopped);
            assert_eq!(state.last_comment, comment);
            assert!(raised.elapsed() >= Duration::from_millis(1000));
        }
        assert_eq!(presses(&recorder), 2);

        gate.show_final_comment("끝");
        assert_eq!(recorder.label(ConfirmControl::Interrupt), FINISH_LABEL);
        assert!(!gate.is_continual());
        sleep(Duration::from_secs(5)).await;
        assert!(gate.is_stopped());
        assert_eq!(presses(&recorder), 2);

        assert!(gate.interrupt());
        let state = gate.snapshot();
        assert_eq!(state.outcome, Outcome::Finished);
        assert!(!gate.is_interrupted());
        assert_eq!(gate.phase(), GatePhase::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn press_follows_positioning_in_order() {
        let (gate, recorder) = gate();
        gate.next_step("init");
        gate.run_all();
        gate.next_step("load");
        gate.wait_resolved().await;

        let log = recorder.interactions();
        let moved = log
            .iter()
            .rposition(|i| *i == Interaction::PositionOn(ConfirmControl::OneStep))
            .expect("포인터 이동 기록 없음");
        let pressed = log
            .iter()
            .position(|i| *i == Interaction::Press(ConfirmControl::OneStep))
            .expect("누름 기록 없음");
        assert!(moved < pressed);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_latches_and_clears_continual() {
        let (gate, _recorder) = gate();
        gate.next_step("step0");
        gate.run_all();
        gate.next_step("step1");
        assert!(gate.interrupt());

        let state = gate.snapshot();
        assert!(!state.stopped);
        assert!(state.is_interrupted());
        assert!(!state.continual);
        assert_eq!(gate.interrupt_message(), "Step 설명: \"step1\"");
        sleep(Duration::from_secs(5)).await;
        assert!(gate.is_interrupted());
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_after_final_does_not_latch() {
        let (gate, _recorder) = gate();
        gate.show_final_comment("마지막");
        assert!(!gate.step());
        assert!(!gate.run_all());
        assert!(gate.is_stopped());
        assert!(gate.interrupt());
        assert!(!gate.is_interrupted());
        assert!(gate.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn operator_before_auto_press_cancels_it() {
        let (gate, recorder) = gate();
        gate.next_step("init");
        gate.run_all();
        gate.next_step("load");

        // 자동 누름 직전 시점까지 진행한 뒤 운영자가 먼저 누른다.
        sleep(Duration::from_millis(999)).await;
        assert!(gate.step());
        sleep(Duration::from_secs(3)).await;

        assert!(!gate.is_stopped());
        assert_eq!(presses(&recorder), 0);
        assert_eq!(gate.snapshot().checkpoint, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn operator_and_auto_press_at_same_instant_resolve_once() {
        let (gate, recorder) = gate();
        gate.next_step("init");
        gate.run_all();
        gate.next_step("load");

        sleep(Duration::from_millis(1000)).await;
        let operator_won = gate.step();
        sleep(Duration::from_secs(3)).await;

        let auto_won = presses(&recorder) == 1;
        assert!(operator_won ^ auto_won);
        assert!(!gate.is_stopped());
        assert!(!gate.step());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_auto_press_is_inert() {
        let (gate, _recorder) = gate();
        gate.next_step("a");
        gate.run_all();
        gate.next_step("b");
        let sink = GateSink {
            gate: Arc::downgrade(&gate.inner),
        };
        assert!(gate.step());
        gate.next_step("c");
        // 체크포인트 2를 향한 늦은 누름은 체크포인트 3에 영향을 주지 않는다.
        assert!(!sink.resolve(2, Decision::Step));
        assert!(gate.is_stopped());
        assert!(sink.resolve(3, Decision::Step));
        assert!(!gate.is_stopped());
    }

    #[test]
    fn concurrent_decisions_resolve_exactly_once() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .expect("런타임 생성 실패");
        let recorder = Arc::new(HeadlessPresentation::new());
        let gate = StepGate::new(recorder, GateSettings::default(), runtime.handle().clone());

        for round in 0..20 {
            gate.next_step(format!("round {round}"));
            let accepted: usize = std::thread::scope(|scope| {
                let workers: Vec<_> = [Decision::Step, Decision::RunAll, Decision::Interrupt, Decision::Step]
                    .into_iter()
                    .map(|decision| {
                        let gate = gate.clone();
                        scope.spawn(move || gate.decide(decision) as usize)
                    })
                    .collect();
                workers
                    .into_iter()
                    .map(|w| w.join().expect("작업 스레드 패닉"))
                    .sum()
            });
            assert_eq!(accepted, 1, "round {round}");
            assert!(!runtime.block_on(gate.wait_resolved()).stopped);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn modal_gate_hides_instead_of_sending_back() {
        let (gate, recorder) = gate_with(GateSettings {
            modal: true,
            ..GateSettings::default()
        });
        gate.next_step("모달");
        assert!(gate.step());
        let log = recorder.interactions();
        assert!(log.contains(&Interaction::Hide));
        assert!(!log.contains(&Interaction::BringToFront));
        assert!(!log.contains(&Interaction::SendToBack));
        assert!(!recorder.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn comment_timeout_applies_to_next_checkpoint() {
        let (gate, _recorder) = gate();
        gate.set_comment_timeout(Duration::from_millis(200));
        gate.next_step("a");
        gate.run_all();
        let raised = Instant::now();
        gate.next_step("b");
        gate.wait_resolved().await;
        assert!(raised.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn close_hides_without_touching_state() {
        let (gate, recorder) = gate();
        gate.next_step("a");
        gate.close();
        assert!(!recorder.is_visible());
        assert!(gate.is_stopped());
        assert!(!gate.is_interrupted());
    }

    #[tokio::test(start_paused = true)]
    async fn decision_during_window_setup_is_rejected() {
        let operator = Arc::new(EagerOperator::default());
        let gate = StepGate::new(
            operator.clone(),
            GateSettings {
                modal: true,
                ..GateSettings::default()
            },
            Handle::current(),
        );
        *operator.gate.lock().expect("gate mutex poisoned") = Some(gate.clone());

        gate.next_step("준비 중");
        let clicks = operator.clicks();
        assert!(!clicks.is_empty());
        assert!(clicks.iter().all(|accepted| !accepted));
        assert!(gate.is_stopped());
        assert!(operator.window.is_visible());
        assert!(gate.inner.advancer_slot().is_some());

        *operator.gate.lock().expect("gate mutex poisoned") = None;
        assert!(gate.step());
        assert!(!operator.window.is_visible());
        assert!(gate.inner.advancer_slot().is_none());
        sleep(Duration::from_secs(5)).await;
        assert!(!operator
            .window
            .interactions()
            .contains(&Interaction::PositionOn(ConfirmControl::OneStep)));
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_records_who_won() {
        let (gate, _recorder) = gate();
        gate.next_step("a");
        gate.run_all();
        assert!(!gate.snapshot().auto_resolved);

        gate.next_step("b");
        assert!(gate.wait_resolved().await.auto_resolved);

        gate.next_step("c");
        assert!(gate.step());
        assert!(!gate.snapshot().auto_resolved);
    }
}
