//! 이벤트 데이터 모델 -- 파이프라인의 정규화된 출력 단위
//!
//! 로그 한 줄이 분류/파싱을 거치면 [`Event`] 하나로 정규화됩니다.
//! 종류별 상세 정보는 [`EventDetails`] 태그드 유니언으로 표현하며,
//! 각 variant는 해당 이벤트 종류에서만 존재하는 필드를 타입으로 강제합니다.
//!
//! 원본 로그의 수치 필드는 결측(`-1`/`None`/빈 문자열)이 빈번하므로
//! 문자열 그대로 보존하고, 집계 단계에서만 숫자로 해석합니다.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// 프로세스 시작 (`am_proc_start`, prestart-top-activity만 수집)
    Start,
    /// 통합 킬러(kill ki)의 실제 처형 기록
    Kill,
    /// 커널 lowmemorykiller 처형 기록
    Lmk,
    /// 킬러 트리거(후보 탐색) 기록
    Trig,
    /// 킬러가 처형을 건너뛴 기록
    Skip,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Start => "start",
            EventKind::Kill => "kill",
            EventKind::Lmk => "lmk",
            EventKind::Trig => "trig",
            EventKind::Skip => "skip",
        };
        f.write_str(s)
    }
}

/// 정규화된 단일 이벤트
///
/// `process_name`은 항상 `:` 앞의 베이스 패키지명이며,
/// 로그에 찍힌 그대로의 이름은 `full_name`에 보존됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// 이벤트 시각 (연도는 호출 측에서 보충한 naive local)
    pub time: NaiveDateTime,
    /// 베이스 프로세스명 (`:` 서브프로세스 접미사 제거)
    pub process_name: String,
    /// 로그에 찍힌 전체 이름 (`:` 접미사 포함 가능)
    pub full_name: String,
    /// 서브프로세스 여부 (`full_name`에 `:` 포함)
    pub is_subprocess: bool,
    /// 원본 로그 라인
    pub raw: String,
    /// 종류별 상세
    pub details: EventDetails,
}

impl Event {
    /// `details` variant에서 파생되는 이벤트 종류
    pub fn kind(&self) -> EventKind {
        match &self.details {
            EventDetails::Start(_) => EventKind::Start,
            EventDetails::Kill(_) => EventKind::Kill,
            EventDetails::Lmk(_) => EventKind::Lmk,
            EventDetails::Trig(_) => EventKind::Trig,
            EventDetails::Skip(_) => EventKind::Skip,
        }
    }
}

/// 종류별 상세 정보 태그드 유니언
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDetails {
    Start(StartDetails),
    Kill(KillDetails),
    Lmk(LmkDetails),
    Trig(TrigDetails),
    Skip(SkipDetails),
}

/// `am_proc_start` 상세
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartDetails {
    pub pid: String,
    pub uid: String,
    /// 시작 유형 (prestart-top-activity 계열만 수집됨)
    pub start_type: String,
    /// 시작을 유발한 컴포넌트
    pub component: String,
}

/// lowmemorykiller 상세
///
/// `killinfo`에는 시간 창 매칭으로 붙은 [`KillInfoRecord`]가 들어갑니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LmkDetails {
    pub pid: String,
    pub adj: String,
    pub min_adj: String,
    pub rss_kb: String,
    /// 킬 사유, 미상이면 `"unknown"`
    pub reason: String,
    /// 정규식 매칭 후 남은 자유 텍스트 꼬리
    pub tail: String,
    /// 매칭된 killinfo 레코드 (없을 수 있음)
    pub killinfo: Vec<KillInfoRecord>,
}

/// kill ki 처형 상세
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillDetails {
    /// 첫 번째 브래킷 그룹의 태그 원문 (`kill...`)
    pub event_tag: String,
    pub kill: KillDecision,
    pub proc: ProcInfo,
    pub mem: MemSnapshot,
    /// 이 킬을 보고한 서브시스템 목록 (`"kill"`, `"am_kill"`)
    pub sources: Vec<String>,
    /// 병합된 am_kill 보고 (있을 경우)
    pub am_kill: Option<AmKillInfo>,
}

/// kill ki 트리거 상세
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrigDetails {
    pub event_tag: String,
    pub kill: KillDecision,
    pub proc: ProcInfo,
    pub mem: MemSnapshot,
    /// killinfo 단독 레코드에서 합성된 경우 원본 레코드
    pub killinfo: Vec<KillInfoRecord>,
}

/// kill ki 스킵 상세
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipDetails {
    pub event_tag: String,
    pub kill: KillDecision,
    pub proc: ProcInfo,
    pub mem: MemSnapshot,
}

/// 브래킷 A 그룹 -- 킬 결정 카운터
///
/// `kill_type`/`min_score`는 원문 코드, `*_desc`는 룩업 테이블로
/// 디코딩된 라벨입니다 (미지 코드는 `unknown(<code>)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KillDecision {
    pub kill_type: String,
    pub kill_type_desc: String,
    pub min_score: String,
    pub min_score_desc: String,
    pub killable_proc_count: String,
    pub important_app_count: String,
    pub killed_count: String,
    pub killed_imp_count: String,
    pub skip_count: String,
    pub target_mem: String,
    pub target_release_mem: String,
    pub killed_pss: String,
}

/// 브래킷 B 그룹 -- 대상 프로세스 정보
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcInfo {
    pub uid: String,
    pub pid: String,
    pub adj: String,
    pub score: String,
    pub pss: String,
    pub swap_used: String,
    pub ret: String,
    pub is_main: String,
    pub is_imp: String,
}

/// 브래킷 C 그룹 -- 시스템 메모리 스냅샷 (KB)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemSnapshot {
    pub mem_free: String,
    pub mem_avail: String,
    pub mem_file: String,
    pub mem_anon: String,
    pub mem_swap_free: String,
    pub cma_free: String,
}

/// am_kill 페이로드 `[uid, pid, process, adj, reason, pss]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmKillInfo {
    pub uid: String,
    pub pid: String,
    pub process_name: String,
    pub adj: String,
    pub reason: String,
    pub pss_kb: String,
    /// adj와 동일 값, 원본 포맷 호환용 별칭
    pub priority: String,
}

/// killinfo 진단 레코드
///
/// 스캔 중 pid/comm으로 버퍼링되어 LMK 이벤트에 붙거나,
/// 끝까지 매칭되지 않으면 합성 이벤트의 재료가 됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillInfoRecord {
    pub time: NaiveDateTime,
    /// 콤마 분리된 원본 필드 순서 그대로
    pub raw_fields: Vec<String>,
    /// 필드명 → 값. 매핑 테이블 + 순서 무관 휴리스틱 적용 결과
    pub parsed: BTreeMap<String, String>,
    /// 브래킷 내부 원문
    pub payload: String,
}

impl KillInfoRecord {
    /// 파싱된 필드 값 조회, 없으면 빈 문자열
    pub fn field(&self, name: &str) -> &str {
        self.parsed.get(name).map(String::as_str).unwrap_or("")
    }
}

/// 병합 전의 am_kill 보고
///
/// 최종 이벤트 목록에는 등장하지 않습니다. kill 이벤트에 병합되거나
/// 단독 kill 이벤트로 승격된 뒤 소멸합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAmKill {
    pub time: NaiveDateTime,
    /// 베이스 프로세스명
    pub process_name: String,
    pub full_name: String,
    pub is_subprocess: bool,
    pub raw: String,
    pub info: AmKillInfo,
}

/// `:` 앞의 베이스 프로세스명을 돌려줍니다.
pub fn base_name(name: &str) -> &str {
    name.split(':').next().unwrap_or(name)
}

/// Android 앱 패키지명으로 보이는지 판정합니다 (`com.` 접두사 규약).
pub fn looks_like_package(name: &str) -> bool {
    !name.is_empty() && name.starts_with("com.")
}
