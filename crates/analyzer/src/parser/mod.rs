//! 라인 분류기와 형식별 파서
//!
//! 다섯 가지 라인 문법을 고정 우선순위로 판별합니다:
//!
//! 1. [`lmk`] -- `lowmemorykiller: Kill ...` 커널 킬 라인
//! 2. [`killinfo`] -- `killinfo: [...]` 진단 덤프
//! 3. [`am_kill`] -- `am_kill : [...]` activity manager 킬 태그
//! 4. [`proc_start`] -- `am_proc_start: [...]` 프로세스 시작
//! 5. [`bracket`] -- `[kill|..][..][..]` 통합 킬러 3브래킷 라인
//!
//! 어느 문법에도 맞지 않는 라인은 에러가 아니라 그냥 버려집니다.
//! 하나의 문법에 걸렸지만 내부 검증(필드 수, 시작 유형 등)에 실패한
//! 라인도 다음 문법으로 넘어가지 않고 버려집니다.

pub mod am_kill;
pub mod bracket;
pub mod killinfo;
pub mod lmk;
pub mod proc_start;

use regex::Regex;

use crate::config::AnalyzerConfig;

pub use bracket::{BracketFields, BracketKind, BracketParser};
pub use killinfo::KillInfoPayload;
pub use lmk::{LmkFields, LmkParser};
pub use proc_start::{ProcStartFields, ProcStartParser};

/// 분류 결과 -- 캡처된 필드를 담은 라인 한 줄
#[derive(Debug, Clone)]
pub enum ClassifiedLine {
    /// lowmemorykiller 킬 라인
    Lmk(LmkFields),
    /// killinfo 라인 (페이로드는 빌더에서 파싱)
    KillInfo {
        /// 타임스탬프 원문 (`MM-DD HH:MM:SS[.mmm]`)
        ts: String,
        /// 브래킷 내부 콤마 페이로드
        payload: String,
    },
    /// am_kill 라인
    AmKill {
        /// 타임스탬프 원문
        ts: String,
        /// 브래킷 내부 콤마 페이로드
        payload: String,
    },
    /// am_proc_start 라인 (prestart-top-activity만 통과)
    ProcStart(ProcStartFields),
    /// 통합 킬러 kill/trig/skip 라인
    KillKi(BracketFields),
}

/// 라인 분류기
///
/// 패턴은 [`AnalyzerConfig`]에서 한 번 컴파일된 것을 공유합니다
/// (`Regex`는 내부적으로 Arc라 클론이 저렴합니다).
pub struct LineClassifier {
    lmk: LmkParser,
    killinfo: Regex,
    am_kill: Regex,
    proc_start: ProcStartParser,
    bracket: BracketParser,
}

impl LineClassifier {
    /// 설정의 패턴으로 분류기를 만듭니다.
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            lmk: LmkParser::new(config.lmk_pattern.clone()),
            killinfo: config.killinfo_pattern.clone(),
            am_kill: config.am_kill_pattern.clone(),
            proc_start: ProcStartParser::new(),
            bracket: BracketParser::new(),
        }
    }

    /// 한 줄을 분류합니다. 인식 실패는 `None` (라인 드롭).
    pub fn classify(&self, line: &str) -> Option<ClassifiedLine> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(fields) = self.lmk.parse(line) {
            return Some(ClassifiedLine::Lmk(fields));
        }

        if let Some(caps) = self.killinfo.captures(line) {
            return Some(ClassifiedLine::KillInfo {
                ts: named(&caps, "ts"),
                payload: named(&caps, "payload"),
            });
        }

        if let Some(caps) = self.am_kill.captures(line) {
            return Some(ClassifiedLine::AmKill {
                ts: named(&caps, "ts"),
                payload: named(&caps, "payload"),
            });
        }

        // am_proc_start 키워드가 있으면 브래킷 문법은 시도하지 않는다
        if line.contains("am_proc_start") {
            return self.proc_start.parse(line).map(ClassifiedLine::ProcStart);
        }

        self.bracket.parse(line).map(ClassifiedLine::KillKi)
    }
}

/// 이름 있는 캡처 그룹을 꺼냅니다. 그룹이 없거나 미매칭이면 빈 문자열.
pub(crate) fn named(caps: &regex::Captures<'_>, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> LineClassifier {
        LineClassifier::new(&AnalyzerConfig::new())
    }

    #[test]
    fn classifies_lmk_line() {
        let line = "12-01 10:00:00.123 1000 2000 I lowmemorykiller: \
                    Kill 'com.example.app' (pid 1234) to free 51200kB, reason lowmem";
        match classifier().classify(line) {
            Some(ClassifiedLine::Lmk(fields)) => {
                assert_eq!(fields.process, "com.example.app");
                assert_eq!(fields.pid, "1234");
            }
            other => panic!("expected lmk, got {other:?}"),
        }
    }

    #[test]
    fn classifies_killinfo_line() {
        let line = "12-01 10:00:02.000 killinfo: [com.example.app,1234,10001,901]";
        match classifier().classify(line) {
            Some(ClassifiedLine::KillInfo { ts, payload }) => {
                assert_eq!(ts, "12-01 10:00:02.000");
                assert_eq!(payload, "com.example.app,1234,10001,901");
            }
            other => panic!("expected killinfo, got {other:?}"),
        }
    }

    #[test]
    fn classifies_am_kill_line() {
        let line = "12-01 10:00:03.000 am_kill : [10001,1234,com.example.app,901,cached-empty,51200]";
        assert!(matches!(
            classifier().classify(line),
            Some(ClassifiedLine::AmKill { .. })
        ));
    }

    #[test]
    fn lmk_takes_precedence_over_killinfo() {
        // 한 줄에 두 문법이 다 보여도 첫 매칭(LMK)이 이긴다
        let line = "12-01 10:00:00.000 lowmemorykiller: Kill com.a (pid 1) \
                    killinfo: [1,2,3]";
        assert!(matches!(
            classifier().classify(line),
            Some(ClassifiedLine::Lmk(_))
        ));
    }

    #[test]
    fn proc_start_keyword_blocks_bracket_fallback() {
        // am_proc_start가 보이지만 시작 유형이 걸러지면 그 라인은 버려진다
        let line = "12-01 10:00:00.123 am_proc_start: [0,123,10001,com.a,background-start,com.a/.S]";
        assert!(classifier().classify(line).is_none());
    }

    #[test]
    fn unrecognized_line_is_dropped() {
        assert!(classifier().classify("hello world").is_none());
        assert!(classifier().classify("").is_none());
    }
}
