use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 게이트와 자동 진행 태스크가 사용하는 타이밍 설정이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateSettings {
    /// 코멘트 최소 표시 시간이자 자동 누름 전 대기 시간(ms).
    #[serde(default = "default_comment_timeout")]
    pub comment_timeout_ms: u64,
    /// 확인 컨트롤 준비 여부를 확인하는 주기(ms).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// 상호작용 큐 비우기 대기 한도(ms).
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_ms: u64,
    /// 확인 컨트롤 준비 대기 한도(ms). 비어 있으면 무제한 대기한다.
    #[serde(default)]
    pub readiness_timeout_ms: Option<u64>,
    /// 코멘트 창을 모달로 다룰지 여부.
    #[serde(default)]
    pub modal: bool,
}

impl GateSettings {
    pub fn comment_timeout(&self) -> Duration {
        Duration::from_millis(self.comment_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // 0ms면 준비 확인 루프가 바쁜 대기가 된다
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.readiness_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            comment_timeout_ms: default_comment_timeout(),
            poll_interval_ms: default_poll_interval(),
            drain_timeout_ms: default_drain_timeout(),
            readiness_timeout_ms: None,
            modal: false,
        }
    }
}

fn default_comment_timeout() -> u64 {
    1000
}

fn default_poll_interval() -> u64 {
    100
}

fn default_drain_timeout() -> u64 {
    60_000
}
