//! killinfo 페이로드 파서
//!
//! 콤마 분리 페이로드를 필드 수에 따라 19필드 신형(compact) 또는
//! 41필드 레거시(full) 매핑으로 해석합니다. 벤더 빌드에 따라
//! `comm,pid` / `pid,comm` 순서가 뒤집히므로 매핑 적용 후
//! 순서 무관 휴리스틱으로 pid/process_name을 확정합니다.

use std::collections::BTreeMap;

use crate::config::AnalyzerConfig;

/// 파싱된 killinfo 페이로드
#[derive(Debug, Clone)]
pub struct KillInfoPayload {
    /// 콤마 분리 원본 필드 (trim 적용)
    pub fields: Vec<String>,
    /// 필드명 → 값
    pub parsed: BTreeMap<String, String>,
}

impl KillInfoPayload {
    /// 파싱된 필드 값, 없으면 빈 문자열
    pub fn field(&self, name: &str) -> &str {
        self.parsed.get(name).map(String::as_str).unwrap_or("")
    }
}

/// 페이로드를 필드 목록 + 이름 매핑으로 파싱합니다.
///
/// 필드 수가 compact 매핑 길이 + 1 이하이면 compact(한 필드 정도의
/// 출입은 신형으로 간주), 그보다 많으면 full 매핑을 씁니다.
/// 매핑에 없는 인덱스는 `field_<idx>`라는 이름을 받습니다.
pub fn parse_payload(payload: &str, config: &AnalyzerConfig) -> KillInfoPayload {
    let fields: Vec<String> = payload.split(',').map(|f| f.trim().to_owned()).collect();

    let mapping = if fields.len() <= config.killinfo_mapping_compact.len() + 1 {
        &config.killinfo_mapping_compact
    } else {
        &config.killinfo_mapping_full
    };

    let mut parsed: BTreeMap<String, String> = BTreeMap::new();
    for (idx, value) in fields.iter().enumerate() {
        let key = mapping
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("field_{idx}"));
        parsed.insert(key, value.clone());
    }

    // comm/pid 순서 휴리스틱: 이미 확정된 키는 덮어쓰지 않는다
    if let Some(first) = fields.first() {
        if is_all_digits(first) {
            parsed
                .entry("pid".to_owned())
                .or_insert_with(|| first.clone());
            if let Some(second) = fields.get(1) {
                parsed
                    .entry("process_name".to_owned())
                    .or_insert_with(|| second.clone());
            }
        } else {
            parsed
                .entry("process_name".to_owned())
                .or_insert_with(|| first.clone());
            if let Some(second) = fields.get(1) {
                if is_all_digits(second) {
                    parsed
                        .entry("pid".to_owned())
                        .or_insert_with(|| second.clone());
                }
            }
        }
        if let Some(uid) = fields.get(2) {
            parsed.entry("uid".to_owned()).or_insert_with(|| uid.clone());
        }
        if let Some(adj) = fields.get(3) {
            parsed.entry("adj".to_owned()).or_insert_with(|| adj.clone());
        }
        if fields.len() > 6 {
            parsed
                .entry("kill_reason".to_owned())
                .or_insert_with(|| fields[6].clone());
        }
    }

    KillInfoPayload { fields, parsed }
}

/// 무효 killinfo 판정: 전 필드가 순수 숫자면 프로세스명이 없는
/// 노이즈 레코드로 보고 버립니다.
pub fn is_spurious(fields: &[String]) -> bool {
    !fields.is_empty() && fields.iter().all(|f| is_all_digits(f))
}

/// 비어 있지 않고 ASCII 숫자로만 구성되었는지
fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
