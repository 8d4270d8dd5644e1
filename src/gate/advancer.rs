use super::error::AdvanceError;
use super::presentation::{ConfirmControl, SharedPresentation};
use super::state::Decision;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 자동 진행 태스크의 동작 방식이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceMode {
    /// 버튼 위로 포인터만 옮긴다.
    Hover,
    /// 포인터를 옮기고 지연 후 버튼을 누른다.
    Press,
}

/// 자동 진행 태스크가 정상 종료했을 때의 결과이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Hovered,
    /// `accepted`가 false면 이미 다른 결정이 체크포인트를 가져간 뒤였다.
    Pressed { accepted: bool },
}

/// 자동 누름이 전달되는 결정 창구이다.
pub trait DecisionSink: Send + Sync {
    /// 지정한 체크포인트에 결정을 전달하고 반영 여부를 반환한다.
    fn resolve(&self, checkpoint: u64, decision: Decision) -> bool;
}

/// 체크포인트 하나에 대한 자동 진행 작업 명세이다.
#[derive(Debug, Clone)]
pub struct AutoAdvance {
    pub mode: AdvanceMode,
    pub control: ConfirmControl,
    /// 포인터 이동과 누름 사이의 지연.
    pub delay: Duration,
    pub poll_interval: Duration,
    pub drain_timeout: Duration,
    pub readiness_timeout: Option<Duration>,
}

/// 실행 중인 자동 진행 태스크의 핸들이다.
#[derive(Debug)]
pub struct AdvanceHandle {
    checkpoint: u64,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl AdvanceHandle {
    pub fn checkpoint(&self) -> u64 {
        self.checkpoint
    }

    /// 대기 중인 태스크를 깨워 조용히 종료시킨다.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl AutoAdvance {
    /// 런타임에 태스크를 띄우고 핸들을 반환한다.
    pub fn spawn(
        self,
        runtime: &Handle,
        presentation: SharedPresentation,
        sink: Arc<dyn DecisionSink>,
        checkpoint: u64,
    ) -> AdvanceHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let join = runtime.spawn(async move {
            match self.run(&presentation, sink.as_ref(), checkpoint, &token).await {
                Ok(outcome) => debug!(checkpoint, ?outcome, "자동 진행 완료"),
                Err(AdvanceError::InterruptedWait) => {
                    debug!(checkpoint, "자동 진행 취소됨")
                }
                Err(err) => warn!(checkpoint, %err, "자동 진행을 포기합니다"),
            }
        });
        AdvanceHandle {
            checkpoint,
            cancel,
            join,
        }
    }

    /// 준비 대기, 큐 비우기, 포인터 이동, (누름 모드면) 지연 후 누름 순으로 수행한다.
    pub async fn run(
        &self,
        presentation: &SharedPresentation,
        sink: &dyn DecisionSink,
        checkpoint: u64,
        cancel: &CancellationToken,
    ) -> Result<AdvanceOutcome, AdvanceError> {
        self.wait_until_ready(presentation, cancel).await?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AdvanceError::InterruptedWait),
            drained = presentation.drain_interaction_queue(self.drain_timeout) => drained?,
        }
        presentation.position_on(self.control);
        if self.mode == AdvanceMode::Hover {
            return Ok(AdvanceOutcome::Hovered);
        }
        pause(self.delay, cancel).await?;
        presentation.press(self.control);
        let accepted = sink.resolve(checkpoint, self.control.decision());
        Ok(AdvanceOutcome::Pressed { accepted })
    }

    async fn wait_until_ready(
        &self,
        presentation: &SharedPresentation,
        cancel: &CancellationToken,
    ) -> Result<(), AdvanceError> {
        let started = Instant::now();
        loop {
            if cancel.is_cancelled() {
                return Err(AdvanceError::InterruptedWait);
            }
            if presentation.is_confirm_control_ready(self.control) {
                return Ok(());
            }
            if let Some(limit) = self.readiness_timeout {
                let waited = started.elapsed();
                if waited >= limit {
                    return Err(AdvanceError::ReadinessTimeout { waited });
                }
            }
            pause(self.poll_interval, cancel).await?;
        }
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), AdvanceError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AdvanceError::InterruptedWait),
        _ = sleep(duration) => Ok(()),
    }
}
