use super::error::AdvanceError;
use super::state::Decision;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// 마지막 체크포인트에서 중단 버튼에 붙는 라벨이다.
pub const FINISH_LABEL: &str = "종료";

/// 코멘트 창의 결정 버튼이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmControl {
    /// "한 단계" 버튼.
    OneStep,
    /// "전체 단계" 버튼.
    AllSteps,
    /// "중단" 버튼. 마지막 체크포인트에서는 "종료"로 바뀐다.
    Interrupt,
}

impl ConfirmControl {
    pub const ALL: [ConfirmControl; 3] = [
        ConfirmControl::OneStep,
        ConfirmControl::AllSteps,
        ConfirmControl::Interrupt,
    ];

    /// 버튼을 눌렀을 때 내려지는 결정이다.
    pub fn decision(self) -> Decision {
        match self {
            ConfirmControl::OneStep => Decision::Step,
            ConfirmControl::AllSteps => Decision::RunAll,
            ConfirmControl::Interrupt => Decision::Interrupt,
        }
    }

    pub fn default_label(self) -> &'static str {
        match self {
            ConfirmControl::OneStep => "한 단계",
            ConfirmControl::AllSteps => "전체 단계",
            ConfirmControl::Interrupt => "중단",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ConfirmControl::OneStep => 0,
            ConfirmControl::AllSteps => 1,
            ConfirmControl::Interrupt => 2,
        }
    }
}

/// 게이트가 코멘트 창을 다루기 위해 사용하는 표시 계층이다.
///
/// egui 창이든 헤드리스 기록기든 이 계약만 지키면 된다. 모든 메서드는 어느 스레드에서나
/// 호출될 수 있다.
#[async_trait]
pub trait Presentation: Send + Sync {
    /// 코멘트 텍스트를 교체한다.
    fn display_comment(&self, text: &str);
    fn show(&self);
    fn hide(&self);
    fn bring_to_front(&self);
    fn send_to_back(&self);
    /// 버튼 라벨을 바꾼다.
    fn set_confirm_label(&self, control: ConfirmControl, label: &str);
    /// 버튼 활성 상태를 바꾼다.
    fn set_control_enabled(&self, control: ConfirmControl, enabled: bool);
    /// 버튼이 화면에 붙어 상호작용할 수 있는지 여부.
    fn is_confirm_control_ready(&self, control: ConfirmControl) -> bool;
    /// 포인터를 버튼 위로 옮기는 흉내를 낸다.
    fn position_on(&self, control: ConfirmControl);
    /// 버튼 누름을 시각적으로 재현한다. 결정 자체는 게이트가 처리한다.
    fn press(&self, control: ConfirmControl);
    /// 밀려 있는 상호작용이 모두 처리될 때까지 기다린다.
    async fn drain_interaction_queue(&self, timeout: Duration) -> Result<(), AdvanceError>;
}

/// Presentation을 공유하기 위한 Arc 타입 별칭이다.
pub type SharedPresentation = Arc<dyn Presentation>;
