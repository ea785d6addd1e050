//! lowmemorykiller 라인 파서
//!
//! 메인 패턴은 설정에서 오버라이드할 수 있고, 꼬리 텍스트에서
//! adj/reason/rss를 뽑는 보조 패턴은 문법의 일부라 고정입니다.
//!
//! 커널 빌드에 따라 pid 표기가 `(pid 1234)`, `(1234)`, `pid 1234`로
//! 제각각이고 adj 키워드도 `adj`/`oom_score_adj`가 혼재합니다.

use regex::Regex;

use super::named;

/// 꼬리에서 adj 값을 뽑는 패턴
const ADJ_TAIL_PATTERN: &str = r"(?:adj|oom_score_adj)\s*(-?\d+)";
/// 꼬리에서 킬 사유 토큰을 뽑는 패턴
const REASON_TAIL_PATTERN: &str = r"(?:reason|kill_reason)\s+([A-Za-z0-9_-]+)";
/// 꼬리에서 해제 대상 rss를 뽑는 패턴 (`to free NNNkB`)
const RSS_TAIL_PATTERN: &str = r"to free\s+(\d+)kB";

/// LMK 라인에서 캡처된 필드
#[derive(Debug, Clone, Default)]
pub struct LmkFields {
    /// 타임스탬프 원문
    pub ts: String,
    /// 로그에 찍힌 프로세스명
    pub process: String,
    /// pid, 없으면 빈 문자열
    pub pid: String,
    /// 매칭 후 남은 자유 텍스트
    pub tail: String,
    /// 꼬리에서 추출한 adj
    pub adj: Option<String>,
    /// 꼬리에서 추출한 킬 사유
    pub reason: Option<String>,
    /// 꼬리에서 추출한 rss (kB)
    pub rss_kb: Option<String>,
}

/// lowmemorykiller 라인 파서
pub struct LmkParser {
    pattern: Regex,
    adj: Regex,
    reason: Regex,
    rss: Regex,
}

impl LmkParser {
    /// 메인 패턴을 받아 파서를 만듭니다. 보조 패턴은 상수라
    /// 컴파일 실패가 불가능합니다.
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            adj: Regex::new(ADJ_TAIL_PATTERN).expect("constant pattern"),
            reason: Regex::new(REASON_TAIL_PATTERN).expect("constant pattern"),
            rss: Regex::new(RSS_TAIL_PATTERN).expect("constant pattern"),
        }
    }

    /// 라인을 파싱합니다. LMK 라인이 아니면 `None`.
    pub fn parse(&self, line: &str) -> Option<LmkFields> {
        let caps = self.pattern.captures(line)?;
        let pid = {
            let primary = named(&caps, "pid");
            if primary.is_empty() {
                named(&caps, "pid_alt")
            } else {
                primary
            }
        };
        let tail = named(&caps, "tail");

        let adj = self
            .adj
            .captures(&tail)
            .map(|c| c[1].to_owned());
        let reason = self
            .reason
            .captures(&tail)
            .map(|c| c[1].to_owned());
        let rss_kb = self
            .rss
            .captures(&tail)
            .map(|c| c[1].to_owned());

        Some(LmkFields {
            ts: named(&caps, "ts"),
            process: named(&caps, "process"),
            pid,
            tail,
            adj,
            reason,
            rss_kb,
        })
    }
}
