//! 통합 킬러 3브래킷 라인 파서
//!
//! `[kill|...][proc|...][mem|...]` 형태의 파이프 구분 3그룹 라인.
//! 첫 그룹의 태그(`kill`/`trig`/`skip`)가 이벤트 종류를 결정합니다.
//!
//! 그룹별 최소 필드 수(A: 태그+10, B: 이름+9, C: 6)를 못 채우면
//! 잘린 라인으로 보고 경고 후 버립니다. B/C 그룹의 `-1`/`None`은
//! 결측 표기라 빈 문자열로 정규화하되, 프로세스명만은 정규화 전의
//! 원문을 보존합니다.

use regex::Regex;
use tracing::warn;

use super::named;

const BRACKET_PATTERN: &str = r"^(?P<ts>\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}).*?\[(?P<a>[Kk]ill[^\]]*|[Tt]rig[^\]]*|[Ss]kip[^\]]*)\]\s*\[(?P<b>[^\]]+)\]\s*\[(?P<c>[^\]]+)\]";

/// 첫 브래킷 태그로 결정되는 라인 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Kill,
    Trig,
    Skip,
}

/// 3브래킷 라인에서 캡처된 필드
#[derive(Debug, Clone)]
pub struct BracketFields {
    /// 타임스탬프 원문
    pub ts: String,
    /// 첫 그룹 태그 원문 (`kill`, `trig_memlow` 등)
    pub tag: String,
    pub kind: BracketKind,
    /// A 그룹의 태그 이후 킬 결정 필드 (10개 이상)
    pub decision: Vec<String>,
    /// B 그룹의 프로세스명 이후 필드, 결측 정규화 적용 (9개 이상)
    pub proc: Vec<String>,
    /// C 그룹 메모리 스냅샷 필드, 결측 정규화 적용 (6개 이상)
    pub mem: Vec<String>,
    /// B 그룹 첫 필드의 정규화 전 원문
    pub process_name: String,
}

/// kill/trig/skip 3브래킷 라인 파서
pub struct BracketParser {
    pattern: Regex,
}

impl BracketParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(BRACKET_PATTERN).expect("constant pattern"),
        }
    }

    /// 라인을 파싱합니다. 형식 불일치나 그룹 필드 부족은 `None`.
    pub fn parse(&self, line: &str) -> Option<BracketFields> {
        let caps = self.pattern.captures(line)?;

        let a: Vec<String> = split_group(&named(&caps, "a"));
        let b: Vec<String> = split_group(&named(&caps, "b"));
        let c: Vec<String> = split_group(&named(&caps, "c"));

        if a.len() < 11 || b.len() < 10 || c.len() < 6 {
            warn!(
                a = a.len(),
                b = b.len(),
                c = c.len(),
                "truncated kill bracket line dropped"
            );
            return None;
        }

        let tag = a[0].clone();
        let kind = match tag.to_ascii_lowercase() {
            t if t.starts_with("kill") => BracketKind::Kill,
            t if t.starts_with("trig") => BracketKind::Trig,
            _ => BracketKind::Skip,
        };

        let process_name = b[0].clone();
        let decision = a[1..].to_vec();
        let proc = b[1..].iter().map(|f| normalize(f)).collect();
        let mem = c.iter().map(|f| normalize(f)).collect();

        Some(BracketFields {
            ts: named(&caps, "ts"),
            tag,
            kind,
            decision,
            proc,
            mem,
            process_name,
        })
    }
}

impl Default for BracketParser {
    fn default() -> Self {
        Self::new()
    }
}

fn split_group(group: &str) -> Vec<String> {
    group.split('|').map(|f| f.trim().to_owned()).collect()
}

/// 결측 표기(`-1`, `None`, 빈 문자열)를 빈 문자열로 통일
fn normalize(field: &str) -> String {
    match field {
        "-1" | "None" | "" => String::new(),
        other => other.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KILL_LINE: &str = "12-01 10:00:05.000 1000 2000 I killer  : \
        [kill|2|-900|15|3|1|0|2|350000|120000|51200]\
        [com.example.app:push|10001|1234|901|905|51200|1024|0|0|1]\
        [123456|234567|-1|45678|None|7890]";

    #[test]
    fn parses_kill_line() {
        let fields = BracketParser::new().parse(KILL_LINE).unwrap();
        assert_eq!(fields.kind, BracketKind::Kill);
        assert_eq!(fields.tag, "kill");
        assert_eq!(fields.ts, "12-01 10:00:05.000");
        assert_eq!(fields.process_name, "com.example.app:push");
        assert_eq!(fields.decision.len(), 10);
        assert_eq!(fields.decision[0], "2");
        assert_eq!(fields.decision[9], "51200");
        assert_eq!(fields.proc.len(), 9);
        assert_eq!(fields.proc[0], "10001");
        assert_eq!(fields.mem[0], "123456");
    }

    #[test]
    fn missing_markers_become_empty() {
        let fields = BracketParser::new().parse(KILL_LINE).unwrap();
        assert_eq!(fields.mem[2], "");
        assert_eq!(fields.mem[4], "");
    }

    #[test]
    fn trig_and_skip_tags_map_to_kind() {
        let trig = KILL_LINE.replace("[kill|", "[trig_memlow|");
        let skip = KILL_LINE.replace("[kill|", "[Skip|");
        assert_eq!(
            BracketParser::new().parse(&trig).unwrap().kind,
            BracketKind::Trig
        );
        assert_eq!(
            BracketParser::new().parse(&skip).unwrap().kind,
            BracketKind::Skip
        );
    }

    #[test]
    fn truncated_groups_are_dropped() {
        let line = "12-01 10:00:05.000 [kill|2|-900][com.a|1|2][3|4]";
        assert!(BracketParser::new().parse(line).is_none());
    }

    #[test]
    fn non_bracket_line_is_rejected() {
        assert!(
            BracketParser::new()
                .parse("12-01 10:00:05.000 ordinary log text")
                .is_none()
        );
    }
}
