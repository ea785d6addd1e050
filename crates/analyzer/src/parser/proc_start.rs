//! am_proc_start 라인 파서
//!
//! `am_proc_start: [user,pid,uid,process,start_type,component]` 형식.
//! 시작 유형이 `prestart-top-activity`를 포함하는 라인만 수집합니다.
//! 백그라운드 기동까지 받으면 시작 통계가 서비스 재기동 노이즈로
//! 덮이기 때문입니다.

use regex::Regex;

use super::named;

const PROC_START_PATTERN: &str =
    r"^(?P<ts>\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}).*am_proc_start: \[(?P<payload>[^\]]+)\]";

/// am_proc_start 라인에서 캡처된 필드
#[derive(Debug, Clone, Default)]
pub struct ProcStartFields {
    /// 타임스탬프 원문
    pub ts: String,
    pub pid: String,
    pub uid: String,
    /// 로그에 찍힌 전체 프로세스명
    pub full_name: String,
    pub start_type: String,
    /// 시작을 유발한 컴포넌트
    pub component: String,
}

/// am_proc_start 라인 파서
pub struct ProcStartParser {
    pattern: Regex,
}

impl ProcStartParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(PROC_START_PATTERN).expect("constant pattern"),
        }
    }

    /// 라인을 파싱합니다. 형식 불일치, 6필드 미만,
    /// prestart-top-activity 아님은 모두 `None`.
    pub fn parse(&self, line: &str) -> Option<ProcStartFields> {
        let caps = self.pattern.captures(line)?;
        let payload = named(&caps, "payload");
        let parts: Vec<&str> = payload.split(',').map(str::trim).collect();
        if parts.len() < 6 {
            return None;
        }

        let start_type = parts[4];
        if !start_type.contains("prestart-top-activity") {
            return None;
        }

        Some(ProcStartFields {
            ts: named(&caps, "ts"),
            pid: parts[1].to_owned(),
            uid: parts[2].to_owned(),
            full_name: parts[3].to_owned(),
            start_type: start_type.to_owned(),
            component: parts[5].to_owned(),
        })
    }
}

impl Default for ProcStartParser {
    fn default() -> Self {
        Self::new()
    }
}
