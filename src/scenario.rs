use crate::gate::GateSettings;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Shell Step 실행 설정이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShellConfig {
    /// 실제 실행할 스크립트/명령 문자열.
    #[serde(alias = "command")]
    pub script: String,
    /// 사용할 셸 프로그램 경로.
    pub shell_program: Option<String>,
    /// 스크립트 실행 시 적용할 환경 변수.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// 실행 전 변경할 작업 디렉터리.
    pub working_dir: Option<PathBuf>,
    /// 표준 출력 마지막 줄을 저장할 변수명.
    pub capture_as: Option<String>,
}

/// 체크포인트를 통과한 뒤 수행할 데모 동작이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// 코멘트만 보여 준다.
    Note,
    /// 지정한 시간만큼 기다린다.
    Wait {
        /// 대기 시간(ms).
        millis: u64,
    },
    /// 쉘 명령을 실행한다.
    Shell {
        #[serde(rename = "shell")]
        config: ShellConfig,
    },
}

/// 데모 시나리오의 한 단계이다. 실행 전에 `comment`를 보여 주고 결정을 기다린다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    /// 고유 Step ID.
    pub id: String,
    /// 사용자 친화적인 Step 이름.
    pub name: String,
    /// 체크포인트에서 보여 줄 설명. `${VAR}` 치환을 지원한다.
    pub comment: String,
    #[serde(flatten)]
    pub kind: StepKind,
    /// 동작 제한 시간(초 단위).
    #[serde(default = "default_timeout")]
    pub timeout_sec: u64,
}

/// 여러 체크포인트로 구성된 데모 시나리오이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scenario {
    /// 시나리오의 표시 이름.
    pub name: String,
    /// 게이트 타이밍 설정.
    #[serde(default)]
    pub settings: GateSettings,
    /// Step 목록.
    pub steps: Vec<Step>,
    /// 모든 단계가 끝난 뒤 보여 줄 코멘트.
    #[serde(default = "default_final_comment")]
    pub final_comment: String,
}

/// 시나리오 정의 오류이다.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScenarioError {
    /// Step ID가 중복된 경우이다.
    #[error("중복된 Step ID가 존재합니다: {0}")]
    DuplicateStepId(String),
    /// Step ID가 비어 있는 경우이다.
    #[error("Step ID가 비어 있습니다. (순번 {0})")]
    EmptyStepId(usize),
}

impl Scenario {
    /// 전체 Step 수를 반환한다.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Step 수가 비었는지 여부를 확인한다.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step ID 규칙을 검사한다.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut seen = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.id.trim().is_empty() {
                return Err(ScenarioError::EmptyStepId(index + 1));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(ScenarioError::DuplicateStepId(step.id.clone()));
            }
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_final_comment() -> String {
    "데모가 끝났습니다.".to_string()
}

/// YAML 파일을 읽어 Scenario로 역직렬화한다.
pub fn load_scenario_from_file(path: &Path) -> anyhow::Result<Scenario> {
    let mut file = File::open(path)?;
    load_scenario_from_reader(&mut file)
}

/// Reader에서 YAML을 읽어 Scenario 구조체로 파싱하고 검증한다.
pub fn load_scenario_from_reader<R: Read>(reader: &mut R) -> anyhow::Result<Scenario> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let scenario: Scenario = serde_yaml::from_str(&buf)?;
    scenario.validate()?;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name: 파일 선택 데모
settings:
  comment_timeout_ms: 500
steps:
  - id: init
    name: 준비
    comment: 작업 디렉터리를 준비합니다.
    kind: note
  - id: load
    name: 적재
    comment: 파일을 적재합니다.
    kind: shell
    shell:
      command: echo 42
      capture_as: ROWS
  - id: run
    name: 실행
    comment: ${ROWS}건을 처리합니다.
    kind: wait
    millis: 200
"#;

    #[test]
    fn parses_all_step_kinds() {
        let scenario =
            load_scenario_from_reader(&mut SAMPLE.as_bytes()).expect("시나리오 파싱 실패");
        assert_eq!(scenario.len(), 3);
        assert_eq!(scenario.settings.comment_timeout_ms, 500);
        assert_eq!(scenario.settings.poll_interval_ms, 100);
        assert_eq!(scenario.final_comment, "데모가 끝났습니다.");
        assert_eq!(scenario.steps[0].kind, StepKind::Note);
        match &scenario.steps[1].kind {
            StepKind::Shell { config } => {
                assert_eq!(config.script, "echo 42");
                assert_eq!(config.capture_as.as_deref(), Some("ROWS"));
            }
            other => panic!("예상과 다른 Step 종류: {other:?}"),
        }
        assert_eq!(scenario.steps[2].kind, StepKind::Wait { millis: 200 });
        assert_eq!(scenario.steps[2].timeout_sec, 60);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let yaml = r#"
name: 중복
steps:
  - { id: a, name: A, comment: x, kind: note }
  - { id: a, name: B, comment: y, kind: note }
"#;
        let err = load_scenario_from_reader(&mut yaml.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScenarioError>(),
            Some(&ScenarioError::DuplicateStepId("a".into()))
        );
    }
}
