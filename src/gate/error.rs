use super::state::{Decision, GatePhase};
use std::time::Duration;

/// 자동 진행 태스크가 조기 종료되는 사유이다.
///
/// 이 오류는 태스크 내부에서 로그로만 남고 시나리오 드라이버로 전파되지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvanceError {
    /// 확인 컨트롤 준비 또는 상호작용 큐 비우기가 한도를 넘겼다.
    #[error("확인 컨트롤 대기 시간 초과 ({waited:?})")]
    ReadinessTimeout { waited: Duration },
    /// 대기 중 취소 요청을 받았다.
    #[error("자동 진행 대기가 중단되었습니다.")]
    InterruptedWait,
}

/// 게이트 상태 전이 규칙 위반이다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// 결정을 받을 수 없는 상태에서 결정이 들어왔다.
    #[error("{phase:?} 상태에서는 {decision:?} 결정을 처리할 수 없습니다.")]
    InvalidTransition { decision: Decision, phase: GatePhase },
    /// 이미 지나간 체크포인트를 대상으로 한 결정이다.
    #[error("체크포인트 {requested}은(는) 이미 지나갔습니다 (현재 {current}).")]
    StaleCheckpoint { requested: u64, current: u64 },
}
