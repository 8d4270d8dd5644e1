use super::error::GateError;

/// 운영자 또는 자동 진행이 내릴 수 있는 세 가지 결정이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// 한 단계만 진행한다.
    Step,
    /// 이후 체크포인트를 자동으로 진행한다.
    RunAll,
    /// 실행을 중단한다. 마지막 체크포인트에서는 종료 확인으로 쓰인다.
    Interrupt,
}

/// 실행의 종결 상태 태그이다. `Open`에서만 벗어날 수 있다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// 아직 종결되지 않았다.
    #[default]
    Open,
    /// 마지막 체크포인트에 도달했다.
    Finished,
    /// 운영자가 중단했다.
    Interrupted,
}

/// 드라이버 관점에서 본 게이트 상태이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// 체크포인트에서 결정을 기다리는 중.
    AwaitingDecision,
    /// 다음 체크포인트까지 실행 중.
    Running,
    /// 마지막 체크포인트가 확인되었다.
    Finished,
    /// 중단되었다.
    Interrupted,
}

/// 한 시나리오 실행 동안 유지되는 게이트 상태이다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// 결정을 기다리는 중이면 true.
    pub stopped: bool,
    /// "전체 단계"가 선택된 뒤 중단 전까지 유지된다.
    pub continual: bool,
    /// 종결 태그.
    pub outcome: Outcome,
    /// 마지막으로 표시한 코멘트.
    pub last_comment: String,
    /// 지금까지 올라온 체크포인트 수이자 현재 체크포인트 번호.
    pub checkpoint: u64,
    /// 결정 버튼 활성 여부.
    pub accepting: bool,
    /// 현재 체크포인트가 마지막 코멘트인지 여부.
    pub final_raised: bool,
    /// 직전 체크포인트를 자동 누름이 풀었는지 여부.
    pub auto_resolved: bool,
}

impl RunState {
    pub fn is_finished(&self) -> bool {
        self.outcome == Outcome::Finished
    }

    pub fn is_interrupted(&self) -> bool {
        self.outcome == Outcome::Interrupted
    }

    /// 현재 상태를 상태 기계의 단계로 환산한다.
    pub fn phase(&self) -> GatePhase {
        if self.stopped {
            return GatePhase::AwaitingDecision;
        }
        match self.outcome {
            Outcome::Open => GatePhase::Running,
            Outcome::Finished => GatePhase::Finished,
            Outcome::Interrupted => GatePhase::Interrupted,
        }
    }

    /// 새 체크포인트를 올리고 그 번호를 반환한다.
    ///
    /// 창이 준비되기 전이므로 결정은 아직 받지 않는다. [`RunState::open`]이 받기 시작한다.
    pub(super) fn raise(&mut self, comment: &str, last: bool) -> u64 {
        self.checkpoint += 1;
        self.last_comment = comment.to_string();
        self.stopped = true;
        self.accepting = false;
        self.auto_resolved = false;
        self.final_raised = last;
        if last {
            self.latch(Outcome::Finished);
            self.continual = false;
        }
        self.checkpoint
    }

    /// 창 표시가 끝난 체크포인트에서 결정을 받기 시작한다.
    pub(super) fn open(&mut self, checkpoint: u64) -> bool {
        if self.checkpoint != checkpoint || !self.stopped || self.accepting {
            return false;
        }
        self.accepting = true;
        true
    }

    /// 결정 하나가 현재 체크포인트를 선점한다.
    ///
    /// 선점에 성공하면 결정 버튼이 비활성화되어 같은 체크포인트에 대한 두 번째 결정은
    /// 모두 거부된다. `stopped`는 [`RunState::commit`]에서 내려간다.
    pub(super) fn claim(
        &mut self,
        decision: Decision,
        checkpoint: Option<u64>,
    ) -> Result<u64, GateError> {
        if let Some(requested) = checkpoint {
            if requested != self.checkpoint {
                return Err(GateError::StaleCheckpoint {
                    requested,
                    current: self.checkpoint,
                });
            }
        }
        let invalid = GateError::InvalidTransition {
            decision,
            phase: self.phase(),
        };
        if !self.stopped || !self.accepting {
            return Err(invalid);
        }
        // 마지막 체크포인트에서는 종료 버튼만 살아 있다.
        if self.final_raised && decision != Decision::Interrupt {
            return Err(invalid);
        }
        self.accepting = false;
        Ok(self.checkpoint)
    }

    /// 선점한 결정을 반영하고 드라이버를 재개시킨다.
    pub(super) fn commit(&mut self, decision: Decision, automatic: bool) {
        self.auto_resolved = automatic;
        match decision {
            Decision::Step => {}
            Decision::RunAll => {
                if self.outcome == Outcome::Open {
                    self.continual = true;
                }
            }
            Decision::Interrupt => {
                if !self.is_finished() {
                    self.latch(Outcome::Interrupted);
                }
                self.continual = false;
            }
        }
        self.stopped = false;
    }

    fn latch(&mut self, outcome: Outcome) {
        if self.outcome == Outcome::Open {
            self.outcome = outcome;
        }
    }
}
