use super::context::{ExecutionContext, SharedExecutionContext};
use super::error::DemoError;
use super::events::EngineEvent;
use super::steps::run_step_action;
use crate::gate::{RunState, StepGate};
use crate::scenario::Scenario;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// 끝까지 실행된 시나리오의 요약이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoReport {
    /// 시나리오 이름.
    pub scenario: String,
    /// 통과한 체크포인트 수(마지막 코멘트 포함).
    pub checkpoints: usize,
    /// 자동 누름으로 풀린 체크포인트 수.
    pub auto_advanced: usize,
}

/// Scenario를 체크포인트 단위로 실행한다.
///
/// 각 Step마다 코멘트를 표시하고 결정을 기다린 뒤 동작을 실행한다. 운영자가 중단하면
/// 마지막 코멘트가 담긴 [`DemoError::Interrupted`]를 반환한다. 종료 시 코멘트 창은 항상
/// 닫힌다.
pub async fn run_scenario(
    scenario: Scenario,
    gate: StepGate,
    sender: UnboundedSender<EngineEvent>,
    cancel: CancellationToken,
) -> Result<DemoReport, DemoError> {
    let ctx: SharedExecutionContext = Arc::new(RwLock::new(ExecutionContext::new()));
    let result = drive(&scenario, &gate, ctx, &sender, &cancel).await;
    gate.close();
    match &result {
        Ok(report) => {
            info!(scenario = %report.scenario, checkpoints = report.checkpoints, "시나리오 종료");
            let _ = sender.send(EngineEvent::ScenarioFinished);
        }
        Err(DemoError::Interrupted { message }) => {
            info!(scenario = %scenario.name, "시나리오 중단: {message}");
            let _ = sender.send(EngineEvent::ScenarioInterrupted {
                message: message.clone(),
            });
        }
        Err(_) => {
            let _ = sender.send(EngineEvent::ScenarioFinished);
        }
    }
    result
}

async fn drive(
    scenario: &Scenario,
    gate: &StepGate,
    ctx: SharedExecutionContext,
    sender: &UnboundedSender<EngineEvent>,
    cancel: &CancellationToken,
) -> Result<DemoReport, DemoError> {
    gate.set_comment_timeout(scenario.settings.comment_timeout());
    let mut report = DemoReport {
        scenario: scenario.name.clone(),
        checkpoints: 0,
        auto_advanced: 0,
    };
    for step in &scenario.steps {
        let comment = ctx.read().await.expand_lenient(&step.comment);
        gate.next_step(comment.clone());
        let _ = sender.send(EngineEvent::CheckpointRaised {
            step_id: step.id.clone(),
            comment,
        });
        let state = await_decision(gate, cancel).await?;
        report.checkpoints += 1;
        if state.auto_resolved {
            report.auto_advanced += 1;
        }
        let _ = sender.send(EngineEvent::CheckpointResolved {
            step_id: step.id.clone(),
            continual: state.continual,
        });
        if state.is_interrupted() {
            return Err(DemoError::Interrupted {
                message: gate.interrupt_message(),
            });
        }
        run_step_action(step, ctx.clone(), sender, cancel).await?;
    }

    let final_comment = ctx.read().await.expand_lenient(&scenario.final_comment);
    gate.show_final_comment(final_comment.clone());
    let _ = sender.send(EngineEvent::FinalCommentRaised {
        comment: final_comment,
    });
    await_decision(gate, cancel).await?;
    report.checkpoints += 1;
    Ok(report)
}

/// 체크포인트가 풀리거나 실행이 취소될 때까지 기다린다.
async fn await_decision(
    gate: &StepGate,
    cancel: &CancellationToken,
) -> Result<RunState, DemoError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DemoError::Cancelled),
        state = gate.wait_resolved() => Ok(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{GateSettings, HeadlessPresentation, Interaction};
    use crate::scenario::{Step, StepKind};
    use std::time::Duration;
    use tokio::runtime::Handle;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::time::sleep;

    fn note(id: &str, comment: &str) -> Step {
        Step {
            id: id.into(),
            name: id.into(),
            comment: comment.into(),
            kind: StepKind::Note,
            timeout_sec: 60,
        }
    }

    fn scenario(ids: &[&str]) -> Scenario {
        Scenario {
            name: "테스트".into(),
            settings: GateSettings::default(),
            steps: ids.iter().map(|id| note(id, id)).collect(),
            final_comment: "끝".into(),
        }
    }

    fn drain(rx: &mut UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// 체크포인트가 결정을 받기 시작할 때까지 기다린다.
    async fn wait_checkpoint(gate: &StepGate, checkpoint: u64) {
        let mut rx = gate.subscribe();
        rx.wait_for(|state| state.checkpoint == checkpoint && state.stopped && state.accepting)
            .await
            .expect("게이트가 사라졌습니다");
    }

    #[tokio::test(start_paused = true)]
    async fn run_all_at_first_checkpoint_auto_advances_the_rest() {
        let recorder = Arc::new(HeadlessPresentation::new());
        let gate = StepGate::new(recorder.clone(), GateSettings::default(), Handle::current());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(run_scenario(
            scenario(&["init", "load", "run"]),
            gate.clone(),
            tx,
            CancellationToken::new(),
        ));

        wait_checkpoint(&gate, 1).await;
        assert!(gate.run_all());
        wait_checkpoint(&gate, 4).await;
        assert!(!gate.is_continual());
        assert!(gate.interrupt());

        let report = driver.await.expect("드라이버 패닉").expect("시나리오 실패");
        assert_eq!(report.checkpoints, 4);
        assert_eq!(report.auto_advanced, 2);
        assert!(gate.is_finished());
        assert!(!gate.is_interrupted());

        let log = recorder.interactions();
        let presses = log
            .iter()
            .filter(|i| matches!(i, Interaction::Press(_)))
            .count();
        assert_eq!(presses, 2);
        let events = drain(&mut rx);
        assert!(events.contains(&EngineEvent::FinalCommentRaised {
            comment: "끝".into()
        }));
        assert_eq!(events.last(), Some(&EngineEvent::ScenarioFinished));
        assert!(!recorder.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_aborts_with_last_comment() {
        let recorder = Arc::new(HeadlessPresentation::new());
        let gate = StepGate::new(recorder, GateSettings::default(), Handle::current());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(run_scenario(
            scenario(&["step0", "step1", "step2"]),
            gate.clone(),
            tx,
            CancellationToken::new(),
        ));

        wait_checkpoint(&gate, 1).await;
        assert!(gate.step());
        wait_checkpoint(&gate, 2).await;
        assert!(gate.interrupt());

        let err = driver.await.expect("드라이버 패닉").unwrap_err();
        assert_eq!(
            err,
            DemoError::Interrupted {
                message: "Step 설명: \"step1\"".into()
            }
        );
        assert_eq!(err.status(), 100);
        let state = gate.snapshot();
        assert!(!state.stopped);
        assert!(state.is_interrupted());
        assert!(!state.continual);

        let events = drain(&mut rx);
        assert!(!events.contains(&EngineEvent::StepStarted {
            step_id: "step1".into()
        }));
        assert!(matches!(
            events.last(),
            Some(EngineEvent::ScenarioInterrupted { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_releases_waiting_driver() {
        let gate = StepGate::new(
            Arc::new(HeadlessPresentation::new()),
            GateSettings::default(),
            Handle::current(),
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let driver = tokio::spawn(run_scenario(
            scenario(&["a"]),
            gate.clone(),
            tx,
            cancel.clone(),
        ));

        wait_checkpoint(&gate, 1).await;
        sleep(Duration::from_secs(10)).await;
        cancel.cancel();

        let err = driver.await.expect("드라이버 패닉").unwrap_err();
        assert_eq!(err, DemoError::Cancelled);
        assert!(!gate.is_interrupted());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_placeholders_stay_in_comments() {
        let recorder = Arc::new(HeadlessPresentation::new());
        let gate = StepGate::new(recorder.clone(), GateSettings::default(), Handle::current());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut demo = scenario(&[]);
        demo.steps = vec![
            note("first", "첫 단계"),
            note("second", "홈: ${STEPGATE_TEST_UNSET_VAR}"),
        ];
        let driver = tokio::spawn(run_scenario(demo, gate.clone(), tx, CancellationToken::new()));

        wait_checkpoint(&gate, 1).await;
        gate.step();
        wait_checkpoint(&gate, 2).await;
        assert_eq!(recorder.comment(), "홈: ${STEPGATE_TEST_UNSET_VAR}");
        gate.interrupt();
        assert!(driver.await.expect("드라이버 패닉").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn operator_steps_in_continual_mode_are_not_counted_as_automatic() {
        let recorder = Arc::new(HeadlessPresentation::new());
        let gate = StepGate::new(recorder.clone(), GateSettings::default(), Handle::current());
        let (tx, _rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(run_scenario(
            scenario(&["a", "b"]),
            gate.clone(),
            tx,
            CancellationToken::new(),
        ));

        wait_checkpoint(&gate, 1).await;
        assert!(gate.run_all());
        wait_checkpoint(&gate, 2).await;
        assert!(gate.is_continual());
        assert!(gate.step());
        wait_checkpoint(&gate, 3).await;
        assert!(gate.interrupt());

        let report = driver.await.expect("드라이버 패닉").expect("시나리오 실패");
        assert_eq!(report.checkpoints, 3);
        assert_eq!(report.auto_advanced, 0);
        assert!(!recorder
            .interactions()
            .iter()
            .any(|i| matches!(i, Interaction::Press(_))));
    }
}
