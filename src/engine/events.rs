/// 엔진에서 UI로 전달되는 주요 이벤트 모델이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// 체크포인트가 올라와 결정을 기다리기 시작했다.
    CheckpointRaised { step_id: String, comment: String },
    /// 체크포인트가 풀렸다. `continual`은 자동 진행 모드 여부이다.
    CheckpointResolved { step_id: String, continual: bool },
    /// Step 동작 시작 알림.
    StepStarted { step_id: String },
    /// Step별 로그 라인.
    StepLog { step_id: String, line: String },
    /// Step 동작 종료 알림.
    StepFinished { step_id: String, success: bool },
    /// 마지막 코멘트가 올라와 종료 확인을 기다린다.
    FinalCommentRaised { comment: String },
    /// 운영자가 시나리오를 중단했다.
    ScenarioInterrupted { message: String },
    /// 전체 시나리오 종료.
    ScenarioFinished,
}
