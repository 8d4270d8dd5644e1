use super::super::context::SharedExecutionContext;
use super::super::events::EngineEvent;
use super::utils::{log_step, pipe_forwarder};
use crate::scenario::ShellConfig;
use anyhow::Context;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

/// 쉘 명령을 실행하고 실시간 로그를 전달한다.
///
/// # 인자
/// - `config`: 쉘 프로그램, 스크립트, 환경 변수 설정을 담은 구성
/// - `ctx`: 변수 치환과 출력 저장에 사용되는 실행 컨텍스트
/// - `sender`: 로그 이벤트를 내보낼 채널 송신자
/// - `step_id`: 실행 중인 스텝의 식별자 문자열
/// - `timeout_duration`: 명령 최대 대기 시간
///
/// # 반환값
/// 종료 코드가 0이면 `Ok(())`, 그 외에는 에러를 반환한다. `capture_as`가 지정되면
/// 표준 출력의 마지막 비어 있지 않은 줄을 컨텍스트 변수로 저장한다.
pub(super) async fn run_shell_command(
    config: &ShellConfig,
    ctx: SharedExecutionContext,
    sender: &UnboundedSender<EngineEvent>,
    step_id: &str,
    timeout_duration: Duration,
) -> anyhow::Result<()> {
    let windows = cfg!(target_os = "windows");
    let program = config
        .shell_program
        .clone()
        .unwrap_or_else(|| if windows { "cmd" } else { "sh" }.to_string());
    let (script, env_map, working_dir) = {
        let guard = ctx.read().await;
        let script = guard
            .expand_placeholders(&config.script)
            .context("shell.command 필드의 플레이스홀더를 치환할 수 없습니다.")?;
        let mut env_map = HashMap::new();
        for (key, value) in &config.env {
            let expanded = guard
                .expand_placeholders(value)
                .with_context(|| format!("shell.env.{key} 필드의 플레이스홀더를 치환할 수 없습니다."))?;
            env_map.insert(key.clone(), expanded);
        }
        let working_dir = match &config.working_dir {
            Some(dir) => Some(guard.expand_placeholders(&dir.to_string_lossy())?),
            None => None,
        };
        (script, env_map, working_dir)
    };

    let mut command = Command::new(&program);
    command.arg(if windows { "/C" } else { "-c" }).arg(&script);
    if let Some(dir) = &working_dir {
        command.current_dir(dir);
    }
    command
        .envs(&env_map)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let mut child = command
        .spawn()
        .with_context(|| format!("쉘 명령 실행 실패: {script}"))?;
    let stdout_task = child.stdout.take().map(|stdout| {
        tokio::spawn(pipe_forwarder(
            stdout,
            sender.clone(),
            step_id.to_string(),
            "STDOUT",
        ))
    });
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pipe_forwarder(
            stderr,
            sender.clone(),
            step_id.to_string(),
            "STDERR",
        ));
    }
    let status = tokio::time::timeout(timeout_duration, child.wait())
        .await
        .with_context(|| format!("쉘 명령 시간 초과: {script}"))??;
    let last_line = match stdout_task {
        Some(task) => task.await.ok().flatten(),
        None => None,
    };
    if !status.success() {
        anyhow::bail!("쉘 명령 종료 코드: {status}");
    }
    if let Some(var) = &config.capture_as {
        let value = last_line.unwrap_or_default();
        log_step(sender, step_id, &format!("변수 저장: {var}={value}"));
        ctx.write().await.set_var(var.clone(), value);
    }
    Ok(())
}
