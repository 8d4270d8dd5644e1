use super::context::SharedExecutionContext;
use super::error::DemoError;
use super::events::EngineEvent;
use crate::scenario::{Step, StepKind};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

mod shell;
mod utils;

use shell::run_shell_command;
use utils::log_step;

/// 체크포인트를 통과한 Step의 동작을 실행한다.
pub(super) async fn run_step_action(
    step: &Step,
    ctx: SharedExecutionContext,
    sender: &UnboundedSender<EngineEvent>,
    cancel: &CancellationToken,
) -> Result<(), DemoError> {
    let _ = sender.send(EngineEvent::StepStarted {
        step_id: step.id.clone(),
    });
    let timeout_duration = Duration::from_secs(step.timeout_sec.max(1));
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(DemoError::Cancelled),
        result = tokio::time::timeout(timeout_duration, execute_step_kind(step, ctx, sender)) => result,
    };
    let failure = match result {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(format!("{err:#}")),
        Err(_) => Some("시간 초과".to_string()),
    };
    let _ = sender.send(EngineEvent::StepFinished {
        step_id: step.id.clone(),
        success: failure.is_none(),
    });
    match failure {
        None => Ok(()),
        Some(reason) => {
            warn!(step_id = %step.id, %reason, "Step 동작 실패");
            log_step(sender, &step.id, &reason);
            Err(DemoError::StepFailed {
                step_id: step.id.clone(),
                reason,
            })
        }
    }
}

/// StepKind별 실제 수행 로직을 실행한다.
async fn execute_step_kind(
    step: &Step,
    ctx: SharedExecutionContext,
    sender: &UnboundedSender<EngineEvent>,
) -> anyhow::Result<()> {
    match &step.kind {
        StepKind::Note => {
            log_step(sender, &step.id, &format!("[{}] 설명 단계", step.name));
        }
        StepKind::Wait { millis } => {
            log_step(sender, &step.id, &format!("{millis}ms 대기"));
            sleep(Duration::from_millis(*millis)).await;
        }
        StepKind::Shell { config } => {
            run_shell_command(
                config,
                ctx,
                sender,
                &step.id,
                Duration::from_secs(step.timeout_sec.max(1)),
            )
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::ExecutionContext;
    use crate::scenario::ShellConfig;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn step(kind: StepKind, timeout_sec: u64) -> Step {
        Step {
            id: "s1".into(),
            name: "테스트".into(),
            comment: "설명".into(),
            kind,
            timeout_sec,
        }
    }

    fn shell(script: &str, capture_as: Option<&str>) -> StepKind {
        StepKind::Shell {
            config: ShellConfig {
                script: script.into(),
                shell_program: None,
                env: Default::default(),
                working_dir: None,
                capture_as: capture_as.map(str::to_string),
            },
        }
    }

    fn context() -> SharedExecutionContext {
        Arc::new(RwLock::new(ExecutionContext::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn wait_step_sleeps_and_reports_success() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        run_step_action(
            &step(StepKind::Wait { millis: 1500 }, 60),
            context(),
            &tx,
            &CancellationToken::new(),
        )
        .await
        .expect("대기 실패");
        assert!(started.elapsed() >= Duration::from_millis(1500));
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events.first(),
            Some(&EngineEvent::StepStarted {
                step_id: "s1".into()
            })
        );
        assert_eq!(
            events.last(),
            Some(&EngineEvent::StepFinished {
                step_id: "s1".into(),
                success: true
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn step_timeout_becomes_failure() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = run_step_action(
            &step(StepKind::Wait { millis: 5_000 }, 1),
            context(),
            &tx,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            DemoError::StepFailed {
                step_id: "s1".into(),
                reason: "시간 초과".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins_over_running_action() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let err = run_step_action(
            &step(StepKind::Wait { millis: 10_000 }, 60),
            context(),
            &tx,
            &cancel,
        )
        .await
        .unwrap_err();
        assert_eq!(err, DemoError::Cancelled);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_step_captures_last_stdout_line() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctx = context();
        run_step_action(
            &step(shell("echo 첫줄; echo 42", Some("ROWS")), 30),
            ctx.clone(),
            &tx,
            &CancellationToken::new(),
        )
        .await
        .expect("쉘 실행 실패");
        assert_eq!(ctx.read().await.get_var("ROWS"), Some("42"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_step_failure_carries_exit_status() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = run_step_action(
            &step(shell("exit 3", None), 30),
            context(),
            &tx,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        match err {
            DemoError::StepFailed { step_id, reason } => {
                assert_eq!(step_id, "s1");
                assert!(reason.contains("종료 코드"), "{reason}");
            }
            other => panic!("예상과 다른 오류: {other:?}"),
        }
    }
}
