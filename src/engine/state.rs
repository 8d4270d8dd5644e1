use std::time::Instant;

/// Step의 런타임 상태를 표현한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// 아직 체크포인트에 도달하지 않았다.
    Pending,
    /// 체크포인트에서 결정을 기다리는 중.
    AwaitingDecision,
    /// 동작 실행 중.
    Running,
    /// 정상 종료.
    Success,
    /// 실패와 함께 오류 메시지를 포함한다.
    Failed(String),
    /// 이 Step의 체크포인트에서 중단되었다.
    Interrupted,
}

impl StepStatus {
    /// 더 이상 바뀌지 않는 상태인지 여부.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Success | StepStatus::Failed(_) | StepStatus::Interrupted
        )
    }
}

/// Step의 시간 및 로그 정보를 담는다.
#[derive(Debug, Clone)]
pub struct StepRuntimeState {
    /// 현재 상태 값.
    pub status: StepStatus,
    /// 시작 시각.
    pub started_at: Option<Instant>,
    /// 종료 시각.
    pub finished_at: Option<Instant>,
    /// 메모리에 적재된 로그 버퍼.
    pub logs: Vec<String>,
}

impl StepRuntimeState {
    /// 초기 상태를 생성한다.
    pub fn new() -> Self {
        Self {
            status: StepStatus::Pending,
            started_at: None,
            finished_at: None,
            logs: Vec::new(),
        }
    }
}

impl Default for StepRuntimeState {
    fn default() -> Self {
        Self::new()
    }
}
