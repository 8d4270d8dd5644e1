use crate::gate::{AdvanceError, ConfirmControl, Presentation};
use async_trait::async_trait;
use eframe::egui;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// 누름 효과를 보여 줄 시간.
const PRESS_FLASH: Duration = Duration::from_millis(250);

/// 코멘트 창이 그려야 할 내용이다. UI 스레드는 프레임마다 복사본을 읽는다.
#[derive(Debug, Clone)]
pub(crate) struct CommentWindowView {
    pub visible: bool,
    /// 다른 창보다 앞에 두어야 하는지 여부.
    pub raised: bool,
    pub comment: String,
    pub labels: [String; 3],
    pub enabled: [bool; 3],
    /// 자동 진행이 포인터를 올려 둔 버튼.
    pub pointer_on: Option<ConfirmControl>,
    /// 누름 효과를 표시 중인 버튼.
    pub flashing: Option<ConfirmControl>,
}

#[derive(Debug)]
struct WindowModel {
    visible: bool,
    raised: bool,
    comment: String,
    labels: [String; 3],
    enabled: [bool; 3],
    pointer_on: Option<ConfirmControl>,
    pressed: Option<(ConfirmControl, Instant)>,
    /// 창을 다시 띄운 시점의 프레임 번호.
    shown_frame: Option<u64>,
}

impl Default for WindowModel {
    fn default() -> Self {
        Self {
            visible: false,
            raised: false,
            comment: String::new(),
            labels: ConfirmControl::ALL.map(|c| c.default_label().to_string()),
            enabled: [false; 3],
            pointer_on: None,
            pressed: None,
            shown_frame: None,
        }
    }
}

/// egui 코멘트 창을 게이트의 표시 계층으로 연결한다.
///
/// 게이트와 자동 진행 태스크는 런타임 스레드에서 모델만 바꾸고 다시 그리기를 요청한다.
/// 실제 그리기는 UI 스레드가 [`EguiPresentation::view`]로 읽어 수행하고, 프레임을 마칠
/// 때마다 [`EguiPresentation::frame_painted`]를 호출해 대기 중인 작업을 깨운다.
pub struct EguiPresentation {
    ctx: egui::Context,
    model: Mutex<WindowModel>,
    frames: watch::Sender<u64>,
}

impl EguiPresentation {
    pub fn new(ctx: egui::Context) -> Self {
        let (frames, _) = watch::channel(0);
        Self {
            ctx,
            model: Mutex::new(WindowModel::default()),
            frames,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut WindowModel)) {
        apply(&mut self.lock());
        self.ctx.request_repaint();
    }

    fn painted_frames(&self) -> u64 {
        *self.frames.borrow()
    }

    /// 이번 프레임에 그릴 창 상태를 복사해 온다.
    pub(crate) fn view(&self) -> CommentWindowView {
        let mut model = self.lock();
        let flashing = match model.pressed {
            Some((control, at)) if at.elapsed() < PRESS_FLASH => Some(control),
            Some(_) => {
                model.pressed = None;
                None
            }
            None => None,
        };
        CommentWindowView {
            visible: model.visible,
            raised: model.raised,
            comment: model.comment.clone(),
            labels: model.labels.clone(),
            enabled: model.enabled,
            pointer_on: model.pointer_on,
            flashing,
        }
    }

    /// UI 스레드가 한 프레임을 모두 그린 뒤 호출한다.
    pub(crate) fn frame_painted(&self) {
        self.frames.send_modify(|frame| *frame += 1);
    }
}

#[async_trait]
impl Presentation for EguiPresentation {
    fn display_comment(&self, text: &str) {
        self.update(|model| model.comment = text.to_string());
    }

    fn show(&self) {
        let frame = self.painted_frames();
        self.update(|model| {
            model.visible = true;
            model.shown_frame = Some(frame);
            model.pointer_on = None;
        });
    }

    fn hide(&self) {
        self.update(|model| {
            model.visible = false;
            model.raised = false;
            model.shown_frame = None;
            model.pointer_on = None;
        });
    }

    fn bring_to_front(&self) {
        self.update(|model| model.raised = true);
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
    }

    fn send_to_back(&self) {
        self.update(|model| {
            model.raised = false;
            model.pointer_on = None;
        });
    }

    fn set_confirm_label(&self, control: ConfirmControl, label: &str) {
        self.update(|model| model.labels[control.index()] = label.to_string());
    }

    fn set_control_enabled(&self, control: ConfirmControl, enabled: bool) {
        self.update(|model| model.enabled[control.index()] = enabled);
    }

    /// 창을 띄운 뒤 한 프레임 이상 그려졌으면 버튼이 준비된 것으로 본다.
    fn is_confirm_control_ready(&self, control: ConfirmControl) -> bool {
        let painted = self.painted_frames();
        let model = self.lock();
        model.visible
            && model.enabled[control.index()]
            && model.shown_frame.is_some_and(|shown| painted > shown)
    }

    fn position_on(&self, control: ConfirmControl) {
        self.update(|model| model.pointer_on = Some(control));
    }

    fn press(&self, control: ConfirmControl) {
        self.update(|model| model.pressed = Some((control, Instant::now())));
    }

    async fn drain_interaction_queue(&self, timeout: Duration) -> Result<(), AdvanceError> {
        // 진행 중인 프레임은 변경 전 모델을 읽었을 수 있으므로 두 프레임을 기다린다.
        let target = self.painted_frames() + 2;
        let mut rx = self.frames.subscribe();
        self.ctx.request_repaint();
        match tokio::time::timeout(timeout, rx.wait_for(|frame| *frame >= target)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) | Err(_) => Err(AdvanceError::ReadinessTimeout { waited: timeout }),
        }
    }
}
