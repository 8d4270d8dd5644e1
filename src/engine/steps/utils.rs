use super::super::events::EngineEvent;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::codec::{FramedRead, LinesCodec};

/// Step 로그를 전송한다.
pub(super) fn log_step(sender: &UnboundedSender<EngineEvent>, step_id: &str, line: &str) {
    let _ = sender.send(EngineEvent::StepLog {
        step_id: step_id.to_string(),
        line: line.to_string(),
    });
}

/// 프로세스 파이프를 읽어 로그 이벤트로 중계하고 마지막 줄을 돌려준다.
pub(super) async fn pipe_forwarder<R>(
    reader: R,
    sender: UnboundedSender<EngineEvent>,
    step_id: String,
    tag: &'static str,
) -> Option<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new());
    let mut last = None;
    while let Some(line_result) = lines.next().await {
        match line_result {
            Ok(line) => {
                log_step(&sender, &step_id, &format!("{tag}: {line}"));
                if !line.trim().is_empty() {
                    last = Some(line);
                }
            }
            Err(err) => {
                log_step(&sender, &step_id, &format!("{tag} 읽기 오류: {err}"));
                break;
            }
        }
    }
    last
}
