//! 분석기 설정 -- 패턴/룩업 테이블/하이라이트 목록
//!
//! [`AnalyzerConfig`]는 한 번 만들어 파싱 진입점에 명시적으로 전달하는
//! 불변 값입니다. 프로세스 전역 가변 상태는 두지 않습니다.
//!
//! # 오버라이드 로딩
//! 기본값은 코드에 내장되어 있고, [`ConfigOverrides`] 문서(YAML 또는
//! JSON, 확장자로 구분)로 일부만 덮어쓸 수 있습니다:
//! 라인 패턴(lmk/killinfo/am_kill), killType/minScore 라벨 테이블,
//! killinfo 필드 매핑(full/compact), 하이라이트 프로세스 목록.
//!
//! # 사용 예시
//! ```
//! use killtrace_analyzer::config::AnalyzerConfig;
//!
//! let config = AnalyzerConfig::new();
//! assert_eq!(config.describe_kill_type("3"), "LAUNCH");
//! assert_eq!(config.describe_kill_type("99"), "unknown(99)");
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;

/// lowmemorykiller 라인 기본 패턴
///
/// 타임스탬프, 프로세스명(따옴표/괄호 허용), pid(`(pid NNN)` 또는
/// `pid NNN`), 자유 텍스트 꼬리를 캡처합니다. 대소문자 무시.
/// 대안은 선호 순서라 `Killing`이 `Kill`보다 먼저 와야 접두 매칭으로
/// 프로세스명이 `ing`부터 잘리지 않습니다.
const DEFAULT_LMK_PATTERN: &str = r#"(?P<ts>\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d+)?).*?lowmemorykiller:\s*(?:Killing|Kill)\s*['"]?(?P<process>[^\s'"(]+)['"]?\s*(?:\((?:pid\s*)?(?P<pid>\d+)[^)]*\)|pid\s*(?P<pid_alt>\d+))?(?P<tail>.*)"#;

/// killinfo 라인 기본 패턴
const DEFAULT_KILLINFO_PATTERN: &str =
    r"(?P<ts>\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d+)?).*?killinfo:\s*\[(?P<payload>[^\]]+)\]";

/// am_kill 라인 기본 패턴 (대소문자 무시)
const DEFAULT_AM_KILL_PATTERN: &str =
    r"(?P<ts>\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d+)?).*?am_kill\s*:\s*\[(?P<payload>[^\]]+)\]";

/// killinfo 41필드 레거시 매핑 (인덱스 → 필드명)
const DEFAULT_KILLINFO_MAPPING_FULL: [&str; 41] = [
    "pid_or_comm",
    "pid_or_comm",
    "uid",
    "adj",
    "min_adj",
    "rss_kb",
    "kill_reason",
    "mem_total_kb",
    "mem_free_kb",
    "cached_kb",
    "swap_cached_kb",
    "buffers_kb",
    "shmem_kb",
    "unevictable_kb",
    "swap_total_kb",
    "swap_free_kb",
    "active_anon_kb",
    "inactive_anon_kb",
    "active_file_kb",
    "inactive_file_kb",
    "k_reclaimable_kb",
    "s_reclaimable_kb",
    "s_unreclaim_kb",
    "kernel_stack_kb",
    "page_tables_kb",
    "ion_heap_kb",
    "ion_heap_pool_kb",
    "cma_free_kb",
    "pressure_since_event_ms",
    "since_wakeup_ms",
    "wakeups_since_event",
    "skipped_wakeups",
    "proc_swap_kb",
    "gpu_kb",
    "thrashing",
    "max_thrashing",
    "psi_mem_some",
    "psi_mem_full",
    "psi_io_some",
    "psi_io_full",
    "psi_cpu_some",
];

/// killinfo 19필드 신형 매핑 (swap/psi/thrashing 핵심 지표만)
const DEFAULT_KILLINFO_MAPPING_COMPACT: [&str; 19] = [
    "pid_or_comm",
    "pid_or_comm",
    "uid",
    "adj",
    "min_adj",
    "rss_kb",
    "proc_swap_kb",
    "kill_reason",
    "mem_total_kb",
    "mem_free_kb",
    "cached_kb",
    "swap_free_kb",
    "thrashing",
    "max_thrashing",
    "psi_mem_some",
    "psi_mem_full",
    "psi_io_some",
    "psi_io_full",
    "psi_cpu_some",
];

/// 기본 하이라이트 프로세스 목록 (설정 미제공 시 폴백)
const DEFAULT_HIGHLIGHT_PROCESSES: [&str; 30] = [
    "com.tencent.mm",
    "com.ss.android.ugc.aweme",
    "com.smile.gifmaker",
    "tv.danmaku.bili",
    "com.ss.android.article.news",
    "com.dragon.read",
    "com.tencent.mobileqq",
    "com.alibaba.android.rimet",
    "com.xunmeng.pinduoduo",
    "com.baidu.searchbox",
    "com.ss.android.article.video",
    "com.tencent.qqlive",
    "com.taobao.taobao",
    "com.qiyi.video",
    "com.UCMobile",
    "com.kmxs.reader",
    "com.tencent.mtt",
    "com.youku.phone",
    "com.sina.weibo",
    "com.quark.browser",
    "com.eg.android.AlipayGphone",
    "com.autonavi.minimap",
    "com.duowan.kiwi",
    "com.sankuai.meituan",
    "com.jingdong.app.mall",
    "com.zhihu.android",
    "air.tv.douyu.android",
    "com.qidian.QDReader",
    "com.tencent.tmgp.pubgmhd",
    "com.tencent.tmgp.sgame",
];

/// killType 코드 기본 라벨
fn default_kill_type_map() -> BTreeMap<String, String> {
    [
        ("0", "NPW"),
        ("1", "EPW"),
        ("2", "CPW"),
        ("3", "LAUNCH"),
        ("4", "SUB_PROC"),
        ("5", "INVALID"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

/// minScore 상수 기본 라벨 (OOM factor/threshold)
fn default_min_score_map() -> BTreeMap<i64, String> {
    [
        (-1073741824, "MAIN_PROC_FACTOR | SUB_MIN_SCORE"),
        (-536870912, "LOWADJ_PROC_FACTOR"),
        (-268435456, "FORCE_PROTECT_PROC_FACTOR"),
        (-134217728, "LOCKED_PROC_FACTOR"),
        (-67108864, "RECENT_PROC_FACTOR"),
        (-33554432, "IMPORTANT_PROC_FACTOR"),
        (-1342177280, "RECENT_MIN_SCORE"),
        (-1140850688, "IMPORTANT_MIN_SCORE"),
        (-1107296256, "NORMAL_MIN_SCORE"),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_owned()))
    .collect()
}

/// 라인 패턴 오버라이드
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternOverrides {
    /// lowmemorykiller 라인 패턴
    pub lmk: Option<String>,
    /// killinfo 라인 패턴
    pub killinfo: Option<String>,
    /// am_kill 라인 패턴
    pub am_kill: Option<String>,
}

/// killinfo 필드 매핑 오버라이드
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingOverrides {
    /// 41필드 레거시 매핑
    pub full: Option<Vec<String>>,
    /// 19필드 신형 매핑
    pub compact: Option<Vec<String>>,
}

/// 외부 설정 문서 (모든 필드 선택적, 빈 목록은 무시하고 기본값 유지)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub patterns: Option<PatternOverrides>,
    #[serde(default)]
    pub kill_type_map: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub min_score_map: Option<BTreeMap<i64, String>>,
    #[serde(default)]
    pub killinfo_field_mapping: Option<MappingOverrides>,
    #[serde(default)]
    pub highlight_processes: Option<Vec<String>>,
}

impl ConfigOverrides {
    /// 파일에서 오버라이드 문서를 읽습니다.
    ///
    /// `.yaml`/`.yml`은 YAML, 그 외는 JSON으로 파싱합니다.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnalyzerError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                AnalyzerError::Io(e)
            }
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| AnalyzerError::Config {
                field: "overrides".to_owned(),
                reason: e.to_string(),
            })
        } else {
            serde_json::from_str(&content).map_err(|e| AnalyzerError::Config {
                field: "overrides".to_owned(),
                reason: e.to_string(),
            })
        }
    }
}

/// 분석기 설정 -- 파싱 한 회차 동안 읽기 전용으로 공유됩니다.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// 통계 버킷팅에 쓰는 하이라이트 프로세스 목록 (중복 제거, 순서 유지)
    pub highlight_processes: Vec<String>,
    /// killType 코드 → 라벨
    pub kill_type_map: BTreeMap<String, String>,
    /// minScore 상수 → 라벨
    pub min_score_map: BTreeMap<i64, String>,
    /// killinfo 41필드 매핑
    pub killinfo_mapping_full: Vec<String>,
    /// killinfo 19필드 매핑
    pub killinfo_mapping_compact: Vec<String>,
    /// lowmemorykiller 라인 패턴 (컴파일 완료)
    pub lmk_pattern: Regex,
    /// killinfo 라인 패턴
    pub killinfo_pattern: Regex,
    /// am_kill 라인 패턴
    pub am_kill_pattern: Regex,
}

impl AnalyzerConfig {
    /// 내장 기본값으로 설정을 만듭니다.
    pub fn new() -> Self {
        // 내장 패턴은 상수이며 단위 테스트로 유효성이 보장됩니다.
        Self::with_overrides(ConfigOverrides::default())
            .expect("built-in default configuration is valid")
    }

    /// 오버라이드를 적용한 설정을 만듭니다.
    ///
    /// 오버라이드 패턴이 컴파일되지 않으면 [`AnalyzerError::Pattern`]을
    /// 반환합니다. 빈 매핑/목록 오버라이드는 기본값으로 폴백합니다.
    pub fn with_overrides(overrides: ConfigOverrides) -> Result<Self, AnalyzerError> {
        let patterns = overrides.patterns.unwrap_or_default();

        let lmk_pattern = compile_pattern(
            "lmk",
            patterns.lmk.as_deref().unwrap_or(DEFAULT_LMK_PATTERN),
            true,
        )?;
        let killinfo_pattern = compile_pattern(
            "killinfo",
            patterns
                .killinfo
                .as_deref()
                .unwrap_or(DEFAULT_KILLINFO_PATTERN),
            false,
        )?;
        let am_kill_pattern = compile_pattern(
            "am_kill",
            patterns
                .am_kill
                .as_deref()
                .unwrap_or(DEFAULT_AM_KILL_PATTERN),
            true,
        )?;

        let mapping = overrides.killinfo_field_mapping.unwrap_or_default();
        let killinfo_mapping_full = non_empty_or(mapping.full, &DEFAULT_KILLINFO_MAPPING_FULL);
        let killinfo_mapping_compact =
            non_empty_or(mapping.compact, &DEFAULT_KILLINFO_MAPPING_COMPACT);

        let highlight_processes = dedup_preserving_order(non_empty_or(
            overrides.highlight_processes,
            &DEFAULT_HIGHLIGHT_PROCESSES,
        ));

        Ok(Self {
            highlight_processes,
            kill_type_map: overrides
                .kill_type_map
                .filter(|m| !m.is_empty())
                .unwrap_or_else(default_kill_type_map),
            min_score_map: overrides
                .min_score_map
                .filter(|m| !m.is_empty())
                .unwrap_or_else(default_min_score_map),
            killinfo_mapping_full,
            killinfo_mapping_compact,
            lmk_pattern,
            killinfo_pattern,
            am_kill_pattern,
        })
    }

    /// 오버라이드 파일을 읽어 설정을 만듭니다.
    pub fn from_override_file(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        Self::with_overrides(ConfigOverrides::from_file(path)?)
    }

    /// killType 코드를 라벨로 디코딩합니다. 미지 코드는 `unknown(<code>)`.
    pub fn describe_kill_type(&self, code: &str) -> String {
        self.kill_type_map
            .get(code)
            .cloned()
            .unwrap_or_else(|| format!("unknown({code})"))
    }

    /// minScore 값을 라벨로 디코딩합니다.
    ///
    /// 정수가 아닌 입력은 원문 그대로 돌려주고, 미지 상수는
    /// `unknown(<code>)` 플레이스홀더를 만듭니다.
    pub fn describe_min_score(&self, value: &str) -> String {
        let Ok(key) = value.trim().parse::<i64>() else {
            return value.to_owned();
        };
        self.min_score_map
            .get(&key)
            .cloned()
            .unwrap_or_else(|| format!("unknown({key})"))
    }

    /// 베이스 프로세스명이 하이라이트 대상인지 확인합니다.
    pub fn is_highlight(&self, base: &str) -> bool {
        self.highlight_processes.iter().any(|p| p == base)
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 패턴 문자열을 컴파일합니다. 실패 시 패턴 이름을 담아 에러를 만듭니다.
fn compile_pattern(
    name: &str,
    pattern: &str,
    case_insensitive: bool,
) -> Result<Regex, AnalyzerError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| AnalyzerError::Pattern {
            name: name.to_owned(),
            reason: e.to_string(),
        })
}

/// 비어 있지 않은 오버라이드 목록을 쓰고, 아니면 기본값을 복사합니다.
fn non_empty_or(override_list: Option<Vec<String>>, default: &[&str]) -> Vec<String> {
    match override_list {
        Some(list) if !list.is_empty() => list,
        _ => default.iter().map(|s| (*s).to_owned()).collect(),
    }
}

/// 순서를 유지하며 중복을 제거합니다.
fn dedup_preserving_order(list: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    list.into_iter().filter(|p| seen.insert(p.clone())).collect()
}
