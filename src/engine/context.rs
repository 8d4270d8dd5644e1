use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// 실행 중 Step 간 값을 공유하기 위한 컨텍스트이다.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    /// 문자열 기반 변수 저장소이다.
    vars: HashMap<String, String>,
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_]+)\}").unwrap_or_else(|err| panic!("정규식 컴파일 실패: {err}"))
});

impl ExecutionContext {
    /// 비어 있는 실행 컨텍스트를 생성한다.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    /// 컨텍스트 변수 값을 설정한다.
    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// 변수 값을 조회한다.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// `${VAR}` 패턴을 컨텍스트 또는 환경 변수 값으로 치환한다.
    ///
    /// # 반환값
    /// 값을 찾지 못한 플레이스홀더가 남으면 오류를 반환한다.
    pub fn expand_placeholders(&self, template: &str) -> anyhow::Result<String> {
        let mut missing = Vec::new();
        let result = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            if let Some(val) = self.get_var(key) {
                return val.to_string();
            }
            if let Ok(env_val) = std::env::var(key) {
                return env_val;
            }
            missing.push(key.to_string());
            caps[0].to_string()
        });
        if !missing.is_empty() {
            anyhow::bail!("플레이스홀더 치환 실패: {}", missing.join(", "));
        }
        Ok(result.into_owned())
    }

    /// 코멘트용 치환. 값이 없는 플레이스홀더는 원문 그대로 남긴다.
    pub fn expand_lenient(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &regex::Captures| {
                let key = &caps[1];
                self.get_var(key)
                    .map(str::to_string)
                    .or_else(|| std::env::var(key).ok())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// ExecutionContext를 비동기 환경에서 공유하기 위한 타입 별칭이다.
pub type SharedExecutionContext = std::sync::Arc<tokio::sync::RwLock<ExecutionContext>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_context_variables() {
        let mut ctx = ExecutionContext::new();
        ctx.set_var("ROWS", "42");
        assert_eq!(
            ctx.expand_placeholders("${ROWS}건 처리").expect("치환 실패"),
            "42건 처리"
        );
    }

    #[test]
    fn strict_expansion_reports_missing_keys() {
        let ctx = ExecutionContext::new();
        let err = ctx
            .expand_placeholders("${STEPGATE_SURELY_UNSET_VAR}")
            .unwrap_err();
        assert!(err.to_string().contains("STEPGATE_SURELY_UNSET_VAR"));
    }

    #[test]
    fn lenient_expansion_keeps_unknown_placeholders() {
        let mut ctx = ExecutionContext::new();
        ctx.set_var("A", "1");
        assert_eq!(
            ctx.expand_lenient("${A}/${STEPGATE_SURELY_UNSET_VAR}"),
            "1/${STEPGATE_SURELY_UNSET_VAR}"
        );
    }
}
