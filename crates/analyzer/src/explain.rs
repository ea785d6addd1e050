//! 단일 라인 해설 유틸리티
//!
//! 분석 파이프라인과 같은 문법/우선순위로 붙여넣은 로그 한 줄을
//! 판별하고, 구조화된 이벤트 대신 사람이 읽을 필드 분해 텍스트를
//! 돌려줍니다. 대화식 사용을 위해 본 파이프라인보다 관대합니다:
//! 타임스탬프 없는 브래킷 라인, 벗겨진 `[...]` 페이로드, 맨 콤마
//! 페이로드(6필드 이하면 am_kill, 넘으면 killinfo로 추정)도
//! 받습니다.

use std::fmt::Write as _;

use regex::Regex;

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::parser::{am_kill, killinfo, BracketParser, LmkParser};

/// A 그룹(킬 결정) 필드 이름, 태그 제외
const DECISION_LABELS: [&str; 10] = [
    "kill_type",
    "min_score",
    "killable_proc_count",
    "important_app_count",
    "killed_count",
    "killed_imp_count",
    "skip_count",
    "target_mem",
    "target_release_mem",
    "killed_pss",
];

/// B 그룹(프로세스) 필드 이름, 프로세스명 제외
const PROC_LABELS: [&str; 9] = [
    "uid", "pid", "adj", "score", "pss", "swap_used", "ret", "is_main", "is_imp",
];

/// C 그룹(메모리 스냅샷) 필드 이름
const MEM_LABELS: [&str; 6] = [
    "mem_free",
    "mem_avail",
    "mem_file",
    "mem_anon",
    "mem_swap_free",
    "cma_free",
];

/// 타임스탬프 없는 브래킷 라인 폴백 패턴
const BARE_BRACKET_PATTERN: &str =
    r"\[(?P<a>[Kk]ill[^\]]*|[Tt]rig[^\]]*|[Ss]kip[^\]]*)\]\s*\[(?P<b>[^\]]+)\]\s*\[(?P<c>[^\]]+)\]";

/// 로그 한 줄을 해설합니다.
pub fn explain_line(config: &AnalyzerConfig, line: &str) -> Result<String, AnalyzerError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(AnalyzerError::EmptyInput);
    }

    // 1. kill/trig/skip 브래킷 (타임스탬프 있는 본 패턴 + 없는 폴백)
    if let Some(fields) = BracketParser::new().parse(line) {
        return Ok(explain_bracket(
            config,
            &fields.tag,
            Some(&fields.ts),
            &fields.decision,
            &std::iter::once(fields.process_name.clone())
                .chain(fields.proc.iter().cloned())
                .collect::<Vec<_>>(),
            &fields.mem,
        ));
    }
    let bare = Regex::new(BARE_BRACKET_PATTERN).expect("constant pattern");
    if let Some(caps) = bare.captures(line) {
        let a: Vec<String> = split_pipes(&caps["a"]);
        let b: Vec<String> = split_pipes(&caps["b"]);
        let c: Vec<String> = split_pipes(&caps["c"]);
        return Ok(explain_bracket(config, &a[0], None, &a[1..], &b, &c));
    }

    // 2. lowmemorykiller
    if line.contains("lowmemorykiller") {
        let parser = LmkParser::new(config.lmk_pattern.clone());
        if let Some(fields) = parser.parse(line) {
            let mut out = String::from("lowmemorykiller kill line\n");
            push_field(&mut out, "time", &fields.ts);
            push_field(&mut out, "process", &fields.process);
            push_field(&mut out, "pid", &fields.pid);
            push_field(&mut out, "adj", fields.adj.as_deref().unwrap_or(""));
            push_field(&mut out, "reason", fields.reason.as_deref().unwrap_or("unknown"));
            push_field(&mut out, "rss_kb", fields.rss_kb.as_deref().unwrap_or(""));
            return Ok(out);
        }
        return Err(AnalyzerError::UnrecognizedLine(line.to_owned()));
    }

    // 3. am_kill
    if let Some(caps) = config.am_kill_pattern.captures(line) {
        let ts = caps.name("ts").map(|m| m.as_str().to_owned());
        return Ok(explain_am_kill(ts.as_deref(), &caps["payload"]));
    }

    // 4. killinfo
    if let Some(caps) = config.killinfo_pattern.captures(line) {
        let ts = caps.name("ts").map(|m| m.as_str().to_owned());
        return Ok(explain_killinfo(config, ts.as_deref(), &caps["payload"]));
    }

    // 5. 맨 페이로드: 브래킷을 벗기고 필드 수로 문법을 추정
    let payload = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(line);
    if payload.contains(',') {
        let count = payload.split(',').count();
        return Ok(if count <= 6 {
            explain_am_kill(None, payload)
        } else {
            explain_killinfo(config, None, payload)
        });
    }

    Err(AnalyzerError::UnrecognizedLine(line.to_owned()))
}

fn split_pipes(group: &str) -> Vec<String> {
    group.split('|').map(|f| f.trim().to_owned()).collect()
}

fn push_field(out: &mut String, name: &str, value: &str) {
    let shown = if value.is_empty() { "-" } else { value };
    let _ = writeln!(out, "  {name} = {shown}");
}

/// 라벨 목록으로 값을 차례로 붙이고 넘치는 값은 `field_<idx>`로 표기
fn push_labeled(out: &mut String, labels: &[&str], values: &[String]) {
    for (idx, value) in values.iter().enumerate() {
        match labels.get(idx) {
            Some(label) => push_field(out, label, value),
            None => push_field(out, &format!("field_{idx}"), value),
        }
    }
}

fn explain_bracket(
    config: &AnalyzerConfig,
    tag: &str,
    ts: Option<&str>,
    decision: &[String],
    proc: &[String],
    mem: &[String],
) -> String {
    let mut out = format!("integrated killer line, tag '{tag}'\n");
    if let Some(ts) = ts {
        push_field(&mut out, "time", ts);
    }
    let _ = writeln!(out, " decision:");
    push_labeled(&mut out, &DECISION_LABELS, decision);
    if let Some(kill_type) = decision.first() {
        push_field(&mut out, "kill_type_desc", &config.describe_kill_type(kill_type));
    }
    if let Some(min_score) = decision.get(1) {
        push_field(&mut out, "min_score_desc", &config.describe_min_score(min_score));
    }
    let _ = writeln!(out, " process:");
    if let Some(name) = proc.first() {
        push_field(&mut out, "process_name", name);
    }
    push_labeled(&mut out, &PROC_LABELS, proc.get(1..).unwrap_or(&[]));
    let _ = writeln!(out, " memory (kB):");
    push_labeled(&mut out, &MEM_LABELS, mem);
    out
}

fn explain_am_kill(ts: Option<&str>, payload: &str) -> String {
    let (_, info) = am_kill::parse_payload(payload);
    let mut out = String::from("am_kill line\n");
    if let Some(ts) = ts {
        push_field(&mut out, "time", ts);
    }
    push_field(&mut out, "uid", &info.uid);
    push_field(&mut out, "pid", &info.pid);
    push_field(&mut out, "process", &info.process_name);
    push_field(&mut out, "adj", &info.adj);
    push_field(&mut out, "reason", &info.reason);
    push_field(&mut out, "pss_kb", &info.pss_kb);
    out
}

fn explain_killinfo(config: &AnalyzerConfig, ts: Option<&str>, payload: &str) -> String {
    let parsed = killinfo::parse_payload(payload, config);
    let mapping = if parsed.fields.len() <= config.killinfo_mapping_compact.len() + 1 {
        &config.killinfo_mapping_compact
    } else {
        &config.killinfo_mapping_full
    };

    let mut out = format!("killinfo line ({} fields)\n", parsed.fields.len());
    if let Some(ts) = ts {
        push_field(&mut out, "time", ts);
    }
    push_field(&mut out, "process", parsed.field("process_name"));
    push_field(&mut out, "pid", parsed.field("pid"));
    for (idx, value) in parsed.fields.iter().enumerate() {
        match mapping.get(idx) {
            Some(name) => push_field(&mut out, name, value),
            None => push_field(&mut out, &format!("field_{idx}"), value),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explain(line: &str) -> Result<String, AnalyzerError> {
        explain_line(&AnalyzerConfig::new(), line)
    }

    #[test]
    fn empty_line_is_an_error() {
        assert!(matches!(explain("   "), Err(AnalyzerError::EmptyInput)));
    }

    #[test]
    fn explains_bracket_line_with_timestamp() {
        let line = "12-01 10:00:05.000 killer: \
            [kill|2|-900|15|3|1|0|2|350000|120000|51200]\
            [com.example.app|10001|1234|901|905|51200|1024|0|1|0]\
            [123456|234567|345678|45678|56789|7890]";
        let out = explain(line).unwrap();
        assert!(out.contains("tag 'kill'"));
        assert!(out.contains("kill_type = 2"));
        assert!(out.contains("kill_type_desc = CPW"));
        assert!(out.contains("process_name = com.example.app"));
        assert!(out.contains("mem_free = 123456"));
    }

    #[test]
    fn explains_bracket_line_without_timestamp() {
        let line = "[trig|2|-900|15|3][com.example.app|10001|1234][123456|234567]";
        let out = explain(line).unwrap();
        assert!(out.contains("tag 'trig'"));
        assert!(out.contains("killable_proc_count = 15"));
    }

    #[test]
    fn explains_lmk_line() {
        let line = "12-01 10:00:00.123 lowmemorykiller: \
                    Kill 'com.example.app' (pid 1234) to free 51200kB, reason lowmem";
        let out = explain(line).unwrap();
        assert!(out.contains("lowmemorykiller"));
        assert!(out.contains("process = com.example.app"));
        assert!(out.contains("reason = lowmem"));
    }

    #[test]
    fn explains_killinfo_line() {
        let line = "12-01 10:00:02.000 killinfo: [com.example.app,1234,10001,901,900,51200,120,3]";
        let out = explain(line).unwrap();
        assert!(out.contains("killinfo line (8 fields)"));
        assert!(out.contains("pid = 1234"));
        assert!(out.contains("min_adj = 900"));
    }

    #[test]
    fn bare_short_payload_is_treated_as_am_kill() {
        let out = explain("[10001,1234,com.example.app,901,cached-empty,51200]").unwrap();
        assert!(out.contains("am_kill line"));
        assert!(out.contains("reason = cached-empty"));
    }

    #[test]
    fn bare_long_payload_is_treated_as_killinfo() {
        let out = explain("com.example.app,1234,10001,901,900,51200,120,3,99").unwrap();
        assert!(out.contains("killinfo line (9 fields)"));
        assert!(out.contains("process = com.example.app"));
    }

    #[test]
    fn unrecognized_line_is_an_error() {
        assert!(matches!(
            explain("completely unrelated text"),
            Err(AnalyzerError::UnrecognizedLine(_))
        ));
    }
}
