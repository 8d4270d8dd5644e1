use super::error::AdvanceError;
use super::presentation::{ConfirmControl, Presentation};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// 헤드리스 표시 계층이 기록하는 상호작용이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    DisplayComment(String),
    Show,
    Hide,
    BringToFront,
    SendToBack,
    SetLabel(ConfirmControl, String),
    SetEnabled(ConfirmControl, bool),
    PositionOn(ConfirmControl),
    Press(ConfirmControl),
}

/// 창 없이 상호작용 순서만 기록하는 표시 계층이다.
///
/// `show` 이후 `attach_latency`가 지나야 버튼이 준비된 것으로 본다.
#[derive(Debug, Default)]
pub struct HeadlessPresentation {
    /// 표시 직후 버튼이 붙기까지 걸리는 시간.
    attach_latency: Duration,
    /// 가변 상태.
    inner: Mutex<HeadlessState>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    visible: bool,
    shown_at: Option<Instant>,
    comment: String,
    labels: [Option<String>; 3],
    enabled: [bool; 3],
    stalled: bool,
    log: Vec<(Instant, Interaction)>,
}

impl HeadlessPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&self) -> String {
        self.lock().comment.clone()
    }

    pub fn label(&self, control: ConfirmControl) -> String {
        self.lock().labels[control.index()]
            .clone()
            .unwrap_or_else(|| control.default_label().to_string())
    }

    pub fn is_enabled(&self, control: ConfirmControl) -> bool {
        self.lock().enabled[control.index()]
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, interaction: Interaction) {
        self.lock().log.push((Instant::now(), interaction));
    }
}

#[cfg(test)]
impl HeadlessPresentation {
    pub fn with_attach_latency(mut self, latency: Duration) -> Self {
        self.attach_latency = latency;
        self
    }

    /// 상호작용 큐가 비워지지 않는 상황을 흉내 낸다.
    pub fn stall_interaction_queue(&self, stalled: bool) {
        self.lock().stalled = stalled;
    }

    /// 지금까지 기록된 상호작용 목록이다.
    pub fn interactions(&self) -> Vec<Interaction> {
        self.lock().log.iter().map(|(_, i)| i.clone()).collect()
    }

    /// 기록 시각을 포함한 상호작용 목록이다.
    pub fn timed_interactions(&self) -> Vec<(Instant, Interaction)> {
        self.lock().log.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }
}

#[async_trait]
impl Presentation for HeadlessPresentation {
    fn display_comment(&self, text: &str) {
        self.lock().comment = text.to_string();
        self.record(Interaction::DisplayComment(text.to_string()));
    }

    fn show(&self) {
        {
            let mut state = self.lock();
            if !state.visible {
                state.visible = true;
                state.shown_at = Some(Instant::now());
            }
        }
        self.record(Interaction::Show);
    }

    fn hide(&self) {
        {
            let mut state = self.lock();
            state.visible = false;
            state.shown_at = None;
        }
        self.record(Interaction::Hide);
    }

    fn bring_to_front(&self) {
        self.record(Interaction::BringToFront);
    }

    fn send_to_back(&self) {
        self.record(Interaction::SendToBack);
    }

    fn set_confirm_label(&self, control: ConfirmControl, label: &str) {
        self.lock().labels[control.index()] = Some(label.to_string());
        self.record(Interaction::SetLabel(control, label.to_string()));
    }

    fn set_control_enabled(&self, control: ConfirmControl, enabled: bool) {
        self.lock().enabled[control.index()] = enabled;
        self.record(Interaction::SetEnabled(control, enabled));
    }

    // 비활성 버튼도 화면에는 붙어 있으므로 버튼 종류와 무관하게 창 상태만 본다.
    fn is_confirm_control_ready(&self, _control: ConfirmControl) -> bool {
        let state = self.lock();
        match state.shown_at {
            Some(at) => state.visible && at.elapsed() >= self.attach_latency,
            None => false,
        }
    }

    fn position_on(&self, control: ConfirmControl) {
        self.record(Interaction::PositionOn(control));
    }

    fn press(&self, control: ConfirmControl) {
        self.record(Interaction::Press(control));
    }

    async fn drain_interaction_queue(&self, timeout: Duration) -> Result<(), AdvanceError> {
        let stalled = self.lock().stalled;
        if stalled {
            sleep(timeout).await;
            return Err(AdvanceError::ReadinessTimeout { waited: timeout });
        }
        Ok(())
    }
}
