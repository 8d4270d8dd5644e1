/// 중단된 데모가 보고하는 종료 상태 코드이다.
pub const INTERRUPTED_STATUS: i32 = 100;

/// 시나리오 드라이버가 상위로 보고하는 오류이다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DemoError {
    /// 운영자가 체크포인트에서 중단을 선택했다.
    #[error("데모가 중단되었습니다. {message}")]
    Interrupted { message: String },
    /// Step 동작이 실패했다.
    #[error("Step '{step_id}' 실패: {reason}")]
    StepFailed { step_id: String, reason: String },
    /// 실행이 외부에서 취소되었다.
    #[error("사용자에 의해 실행이 취소되었습니다.")]
    Cancelled,
}

impl DemoError {
    /// 프로세스 종료 코드로 쓸 상태 값이다.
    pub fn status(&self) -> i32 {
        match self {
            DemoError::Interrupted { .. } => INTERRUPTED_STATUS,
            DemoError::StepFailed { .. } => 1,
            DemoError::Cancelled => 2,
        }
    }
}
