//! 통계 집계 -- 최종 이벤트 목록 위의 단일 선형 패스
//!
//! [`Summary`]는 이벤트 목록에서 한 번 계산되는 읽기 전용 스냅샷이며
//! 이벤트를 변경하지 않습니다. 수치 필드는 문자열로 보존된 원본을
//! 여기서 처음 숫자로 해석하고, 해석 불능 값은 해당 통계에서만
//! 빠집니다.
//!
//! 상주율 계산은 하이라이트 또는 메인 앱 프로세스만 추적합니다.
//! 백그라운드 서비스의 잦은 재기동까지 넣으면 상주 시간 분포가
//! 의미를 잃기 때문입니다.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::event::{looks_like_package, Event, EventDetails, EventKind, KillInfoRecord};

/// 선형 보간 백분위수
///
/// `values`는 오름차순 정렬 전제. `p`는 0.0..=1.0 분위.
/// 빈 입력은 `None`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    if n == 1 {
        return Some(values[0]);
    }
    let rank = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    Some(values[lo] * (1.0 - frac) + values[hi] * frac)
}

/// 표본 집합의 기술 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: usize,
    pub avg: Option<f64>,
    pub median: Option<f64>,
    pub p95: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// 표본에서 기술 통계를 계산합니다. 입력 순서는 무관합니다.
pub fn calc_stats(values: &[f64]) -> MetricStats {
    if values.is_empty() {
        return MetricStats::default();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    MetricStats {
        count,
        avg: Some(sum / count as f64),
        median: percentile(&sorted, 0.5),
        p95: percentile(&sorted, 0.95),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
    }
}

/// 이벤트에서 추출한 메모리 지표 표본 (KB)
///
/// 지표마다 독립적으로 있거나 없을 수 있습니다. 스냅샷이 `-1`/`None`
/// 마커를 품어도 해석된 나머지 지표는 표본으로 남습니다.
#[derive(Debug, Clone, Copy, Default)]
struct MemMetrics {
    mem_free: Option<i64>,
    file_pages: Option<i64>,
    anon_pages: Option<i64>,
    swap_free: Option<i64>,
}

impl MemMetrics {
    fn is_empty(&self) -> bool {
        self.mem_free.is_none()
            && self.file_pages.is_none()
            && self.anon_pages.is_none()
            && self.swap_free.is_none()
    }
}

/// 메모리 버킷 하나의 지표별 통계
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemBucketStats {
    pub mem_free: MetricStats,
    pub file_pages: MetricStats,
    pub anon_pages: MetricStats,
    pub swap_free: MetricStats,
}

/// 버킷별 표본 누적기
#[derive(Debug, Default)]
struct MemSamples {
    mem_free: Vec<f64>,
    file_pages: Vec<f64>,
    anon_pages: Vec<f64>,
    swap_free: Vec<f64>,
}

impl MemSamples {
    fn push(&mut self, m: MemMetrics) {
        if let Some(v) = m.mem_free {
            self.mem_free.push(v as f64);
        }
        if let Some(v) = m.file_pages {
            self.file_pages.push(v as f64);
        }
        if let Some(v) = m.anon_pages {
            self.anon_pages.push(v as f64);
        }
        if let Some(v) = m.swap_free {
            self.swap_free.push(v as f64);
        }
    }

    fn stats(&self) -> MemBucketStats {
        MemBucketStats {
            mem_free: calc_stats(&self.mem_free),
            file_pages: calc_stats(&self.file_pages),
            anon_pages: calc_stats(&self.anon_pages),
            swap_free: calc_stats(&self.swap_free),
        }
    }
}

/// 관대한 정수 해석: i64 우선, 실패 시 f64 절사
fn safe_int(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
}

/// killinfo parsed 맵에서 두 필드의 합
fn sum_ki(record: &KillInfoRecord, a: &str, b: &str) -> Option<i64> {
    let parts: Vec<i64> = [a, b]
        .iter()
        .filter_map(|name| safe_int(record.field(name)))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.iter().sum())
    }
}

/// 이벤트에서 메모리 지표를 추출합니다.
///
/// kill/lmk/trig만 표본이 됩니다. skip은 처형이 아닌 후보 탈락
/// 기록이라 압력 분포에 넣지 않습니다.
fn extract_mem_metrics(event: &Event) -> Option<MemMetrics> {
    let from_snapshot = |mem: &crate::event::MemSnapshot| -> MemMetrics {
        MemMetrics {
            mem_free: safe_int(&mem.mem_free),
            file_pages: safe_int(&mem.mem_file),
            anon_pages: safe_int(&mem.mem_anon),
            swap_free: safe_int(&mem.mem_swap_free),
        }
    };
    let from_killinfo = |records: &[KillInfoRecord]| -> Option<MemMetrics> {
        let record = records.first()?;
        Some(MemMetrics {
            mem_free: safe_int(record.field("mem_free_kb")),
            file_pages: sum_ki(record, "active_file_kb", "inactive_file_kb"),
            anon_pages: sum_ki(record, "active_anon_kb", "inactive_anon_kb"),
            swap_free: safe_int(record.field("swap_free_kb")),
        })
    };

    let metrics = match &event.details {
        EventDetails::Kill(d) => Some(from_snapshot(&d.mem)),
        EventDetails::Trig(d) => {
            let snapshot = from_snapshot(&d.mem);
            if snapshot.is_empty() {
                from_killinfo(&d.killinfo)
            } else {
                Some(snapshot)
            }
        }
        EventDetails::Lmk(d) => from_killinfo(&d.killinfo),
        EventDetails::Skip(_) | EventDetails::Start(_) => None,
    };
    metrics.filter(|m| !m.is_empty())
}

/// 하이라이트 프로세스별 종류 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KindCounters {
    pub start: usize,
    pub kill: usize,
    pub lmk: usize,
    pub trig: usize,
    pub skip: usize,
}

/// 프로세스 하나의 킬 수, 메인/서브 분리
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcKillSplit {
    /// 메인 프로세스(`:` 없는 이름) 킬 수
    pub main: usize,
    /// `:` 서브프로세스 킬 수
    pub sub: usize,
}

impl ProcKillSplit {
    fn bump(&mut self, is_subprocess: bool) {
        if is_subprocess {
            self.sub += 1;
        } else {
            self.main += 1;
        }
    }
}

/// 전역/메인/하이라이트 3중 히스토그램
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistogramViews {
    pub all: BTreeMap<String, usize>,
    pub main: BTreeMap<String, usize>,
    pub highlight: BTreeMap<String, usize>,
}

impl HistogramViews {
    fn bump(&mut self, key: &str, is_main: bool, is_highlight: bool) {
        if key.is_empty() {
            return;
        }
        *self.all.entry(key.to_owned()).or_default() += 1;
        if is_main {
            *self.main.entry(key.to_owned()).or_default() += 1;
        }
        if is_highlight {
            *self.highlight.entry(key.to_owned()).or_default() += 1;
        }
    }
}

/// 저 mem_free 킬 랭킹 항목
#[derive(Debug, Clone, Serialize)]
pub struct LowMemFreeKill {
    /// 킬 시점의 가용 메모리 (KB)
    pub mem_free: i64,
    pub process: String,
    /// 최종 목록에서의 1부터 시작하는 이벤트 번호
    pub event_id: usize,
    pub time: NaiveDateTime,
}

/// 상주 구간 하나
#[derive(Debug, Clone, Serialize)]
pub struct ResidencyRecord {
    /// 베이스 프로세스명
    pub process: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_sec: f64,
    /// 스캔 종료 시점까지 살아 있었는지
    pub alive_at_end: bool,
}

/// 상주 통계
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResidencyStats {
    pub records: Vec<ResidencyRecord>,
    /// 전 구간 평균 상주 시간 (초)
    pub avg_duration_sec: Option<f64>,
}

/// 집계 요약 스냅샷
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total_events: usize,
    /// 종류별 이벤트 수
    pub kind_counts: BTreeMap<String, usize>,
    /// `:` 서브프로세스의 start 수
    pub subprocess_start_count: usize,
    /// 베이스명별 start 수
    pub start_counts: BTreeMap<String, usize>,
    /// 로그에 찍힌 전체 이름별 킬 수 (kill ki)
    pub top_killed: BTreeMap<String, usize>,
    /// 전체 이름별 LMK 킬 수
    pub top_lmk_killed: BTreeMap<String, usize>,
    /// 전체 이름별 skip 수
    pub top_skipped: BTreeMap<String, usize>,
    /// 패키지꼴 베이스명별 kill/lmk 수, 메인/서브 분리
    pub main_proc_detail: BTreeMap<String, ProcKillSplit>,
    /// 하이라이트 베이스명별 kill/lmk 수, 메인/서브 분리
    pub highlight_proc_detail: BTreeMap<String, ProcKillSplit>,
    /// 하이라이트 프로세스별 카운터 (목록 전체가 0으로 선시드됨)
    pub highlight_stats: BTreeMap<String, KindCounters>,
    /// 하이라이트 프로세스 이벤트의 1부터 시작하는 번호 목록
    pub highlight_event_ids: Vec<usize>,
    /// 킬 집계 게이트를 통과한 kill 이벤트 수
    pub total_killed: i64,
    /// kill 이벤트의 killed_pss 합 (KB)
    pub total_release_mem: i64,
    /// kill 이벤트의 killed_imp_count 합
    pub killed_imp_count: i64,
    pub kill_type_stats: HistogramViews,
    pub min_score_stats: HistogramViews,
    pub adj_stats: HistogramViews,
    /// LMK 킬 사유 히스토그램
    pub lmk_reason_stats: BTreeMap<String, usize>,
    /// LMK adj 히스토그램
    pub lmk_adj_stats: BTreeMap<String, usize>,
    /// 버킷별 메모리 지표 통계 (all/main/highlight_main/trig)
    pub mem_stats: BTreeMap<String, MemBucketStats>,
    /// mem_free 오름차순 상위 10개 킬
    pub low_memfree_kills: Vec<LowMemFreeKill>,
    pub residency: ResidencyStats,
}

/// 메인 앱 프로세스 판정: 서브프로세스가 아니고 패키지명 꼴
fn is_main_proc(event: &Event) -> bool {
    !event.is_subprocess && looks_like_package(&event.process_name)
}

/// 요약을 계산합니다. 입력은 시간 정렬된 최종 이벤트 목록.
pub fn compute_summary(events: &[Event], config: &AnalyzerConfig) -> Summary {
    let mut summary = Summary {
        total_events: events.len(),
        ..Summary::default()
    };
    for name in &config.highlight_processes {
        summary.highlight_stats.insert(name.clone(), KindCounters::default());
    }

    let mut buckets: BTreeMap<&'static str, MemSamples> = BTreeMap::new();
    let mut low_memfree: Vec<LowMemFreeKill> = Vec::new();
    let mut residency = ResidencyTracker::default();

    for (idx, event) in events.iter().enumerate() {
        let kind = event.kind();
        *summary.kind_counts.entry(kind.to_string()).or_default() += 1;

        let is_main = is_main_proc(event);
        let is_highlight = config.is_highlight(&event.process_name);

        if is_highlight {
            summary.highlight_event_ids.push(idx + 1);
            let counters = summary
                .highlight_stats
                .entry(event.process_name.clone())
                .or_default();
            match kind {
                EventKind::Start => counters.start += 1,
                EventKind::Kill => counters.kill += 1,
                EventKind::Lmk => counters.lmk += 1,
                EventKind::Trig => counters.trig += 1,
                EventKind::Skip => counters.skip += 1,
            }
        }

        match &event.details {
            EventDetails::Start(_) => {
                if event.is_subprocess {
                    summary.subprocess_start_count += 1;
                }
                *summary
                    .start_counts
                    .entry(event.process_name.clone())
                    .or_default() += 1;
            }
            EventDetails::Kill(d) => {
                *summary
                    .top_killed
                    .entry(event.full_name.clone())
                    .or_default() += 1;

                // killed_pss가 숫자가 아니면 킬 집계 블록 전체를 건너뛴다.
                // total_killed는 killed_count 필드가 아니라 이벤트당 1씩 센다.
                if let Some(pss) = safe_int(&d.kill.killed_pss) {
                    summary.total_release_mem += pss;
                    summary.total_killed += 1;
                    summary.killed_imp_count +=
                        safe_int(&d.kill.killed_imp_count).unwrap_or(0);
                    summary
                        .kill_type_stats
                        .bump(&d.kill.kill_type_desc, is_main, is_highlight);
                    summary
                        .min_score_stats
                        .bump(&d.kill.min_score_desc, is_main, is_highlight);
                    summary.adj_stats.bump(&d.proc.adj, is_main, is_highlight);
                }

                if let Some(mem_free) = safe_int(&d.mem.mem_free) {
                    low_memfree.push(LowMemFreeKill {
                        mem_free,
                        process: event.full_name.clone(),
                        event_id: idx + 1,
                        time: event.time,
                    });
                }
            }
            EventDetails::Lmk(d) => {
                *summary
                    .top_lmk_killed
                    .entry(event.full_name.clone())
                    .or_default() += 1;
                if !d.reason.is_empty() {
                    *summary.lmk_reason_stats.entry(d.reason.clone()).or_default() += 1;
                }
                if !d.adj.is_empty() {
                    *summary.lmk_adj_stats.entry(d.adj.clone()).or_default() += 1;
                }
            }
            EventDetails::Skip(_) => {
                *summary
                    .top_skipped
                    .entry(event.full_name.clone())
                    .or_default() += 1;
            }
            EventDetails::Trig(_) => {}
        }

        // 베이스명 단위 킬 상세: 같은 앱의 메인/서브 킬을 나눠 센다
        if matches!(kind, EventKind::Kill | EventKind::Lmk) {
            if looks_like_package(&event.process_name) {
                summary
                    .main_proc_detail
                    .entry(event.process_name.clone())
                    .or_default()
                    .bump(event.is_subprocess);
            }
            if is_highlight {
                summary
                    .highlight_proc_detail
                    .entry(event.process_name.clone())
                    .or_default()
                    .bump(event.is_subprocess);
            }
        }

        if let Some(metrics) = extract_mem_metrics(event) {
            buckets.entry("all").or_default().push(metrics);
            if is_main {
                buckets.entry("main").or_default().push(metrics);
                if is_highlight {
                    buckets.entry("highlight_main").or_default().push(metrics);
                }
            }
            if kind == EventKind::Trig {
                buckets.entry("trig").or_default().push(metrics);
            }
        }

        residency.observe(event, kind, is_main, is_highlight);
    }

    summary.mem_stats = buckets
        .into_iter()
        .map(|(name, samples)| (name.to_owned(), samples.stats()))
        .collect();

    low_memfree.sort_by_key(|k| (k.mem_free, k.event_id));
    low_memfree.truncate(10);
    summary.low_memfree_kills = low_memfree;

    summary.residency = residency.finish(events.last().map(|e| e.time));
    summary
}

/// 프로세스별 생존 상태 기계
#[derive(Debug, Default)]
struct ResidencyTracker {
    /// 베이스명 → 열린 구간의 시작 시각
    alive: BTreeMap<String, NaiveDateTime>,
    records: Vec<ResidencyRecord>,
}

impl ResidencyTracker {
    fn observe(&mut self, event: &Event, kind: EventKind, is_main: bool, is_highlight: bool) {
        // 서브프로세스 이벤트는 메인 구간을 건드리면 안 된다.
        // :push 킬이 본체 생존 구간을 닫는 오염을 막는다.
        if event.is_subprocess || (!is_main && !is_highlight) {
            return;
        }
        let name = &event.process_name;
        match kind {
            EventKind::Start => {
                // 이미 살아 있으면 암묵적 재시작: 이전 구간을 먼저 닫는다
                if let Some(opened) = self.alive.remove(name) {
                    self.close(name, opened, event.time, false);
                }
                self.alive.insert(name.clone(), event.time);
            }
            EventKind::Kill | EventKind::Lmk => {
                if let Some(opened) = self.alive.remove(name) {
                    self.close(name, opened, event.time, false);
                }
            }
            EventKind::Trig | EventKind::Skip => {}
        }
    }

    fn close(&mut self, name: &str, start: NaiveDateTime, end: NaiveDateTime, alive: bool) {
        let duration = (end - start).num_milliseconds().max(0) as f64 / 1000.0;
        self.records.push(ResidencyRecord {
            process: name.to_owned(),
            start,
            end,
            duration_sec: duration,
            alive_at_end: alive,
        });
    }

    /// 아직 살아 있는 프로세스를 로그 마지막 시각으로 닫고 통계를 냅니다.
    fn finish(mut self, log_end: Option<NaiveDateTime>) -> ResidencyStats {
        if let Some(end) = log_end {
            for (name, start) in std::mem::take(&mut self.alive) {
                self.close(&name, start, end, true);
            }
        }
        self.records.sort_by_key(|r| r.start);
        let durations: Vec<f64> = self.records.iter().map(|r| r.duration_sec).collect();
        let avg = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<f64>() / durations.len() as f64)
        };
        ResidencyStats {
            records: self.records,
            avg_duration_sec: avg,
        }
    }
}

/// 윈도 상주율 한 칸
#[derive(Debug, Clone, Serialize)]
pub struct WindowRate {
    /// 되돌아본 직전 start 수 (full 행은 전체 이력)
    pub window: usize,
    pub alive: usize,
    pub total: usize,
    /// 0.1 단위로 반올림된 백분율
    pub rate_percent: f64,
}

/// i번째 하이라이트 start 시점의 윈도 상주율 행
#[derive(Debug, Clone, Serialize)]
pub struct ResidencyRow {
    pub process: String,
    pub time: NaiveDateTime,
    /// 윈도 크기 1..=5의 상주율. 이력이 윈도보다 짧으면 `None`.
    pub windows: Vec<Option<WindowRate>>,
    /// 전체 이력 상주율
    pub full: WindowRate,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// 하이라이트 start 열 위의 윈도 상주율 표
///
/// i번째 하이라이트 start(i>0)마다, 직전 하이라이트 start들 중
/// "현재 시각까지 같은 베이스 프로세스의 kill/lmk가 없었던" 비율을
/// 윈도 1..=5와 전체 이력으로 계산합니다.
pub fn build_highlight_residency(events: &[Event], config: &AnalyzerConfig) -> Vec<ResidencyRow> {
    // (start 시각, 베이스명) 열과, 프로세스별 kill/lmk 시각 목록
    let mut starts: Vec<(NaiveDateTime, String)> = Vec::new();
    let mut kills: BTreeMap<String, Vec<NaiveDateTime>> = BTreeMap::new();
    for event in events {
        // 서브프로세스 킬/기동은 본체 생존 판정에서 제외
        if event.is_subprocess || !config.is_highlight(&event.process_name) {
            continue;
        }
        match event.kind() {
            EventKind::Start => starts.push((event.time, event.process_name.clone())),
            EventKind::Kill | EventKind::Lmk => kills
                .entry(event.process_name.clone())
                .or_default()
                .push(event.time),
            _ => {}
        }
    }

    let alive_at = |prior: &(NaiveDateTime, String), now: NaiveDateTime| -> bool {
        kills
            .get(&prior.1)
            .map(|times| !times.iter().any(|&t| t > prior.0 && t < now))
            .unwrap_or(true)
    };

    let mut rows = Vec::new();
    for i in 1..starts.len() {
        let (now, ref process) = starts[i];
        let prior = &starts[..i];

        let rate_for = |slice: &[(NaiveDateTime, String)], window: usize| -> WindowRate {
            let alive = slice.iter().filter(|p| alive_at(p, now)).count();
            let total = slice.len();
            WindowRate {
                window,
                alive,
                total,
                rate_percent: round1(alive as f64 / total as f64 * 100.0),
            }
        };

        // 이력이 윈도보다 짧으면 잘린 분모로 비율을 내지 않고 빈 칸
        let windows = (1..=5)
            .map(|w| {
                (prior.len() >= w).then(|| rate_for(&prior[prior.len() - w..], w))
            })
            .collect();
        rows.push(ResidencyRow {
            process: process.clone(),
            time: now,
            windows,
            full: rate_for(prior, prior.len()),
        });
    }
    rows
}

/// 두 번째 라운드 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondRound {
    /// 첫 킬 이후 재시작이 관측됨 (콜드 스타트)
    Cold,
    /// 첫 라운드가 킬로 닫히지 않아 판정 불가
    Unknown,
    /// 첫 킬 이후 재시작이 없음
    NoSecondRun,
}

/// 하이라이트 프로세스의 첫 두 start→kill 라운드
#[derive(Debug, Clone, Serialize)]
pub struct HighlightRun {
    pub process: String,
    pub first_round_sec: Option<f64>,
    pub second_round_sec: Option<f64>,
    /// 관측된 라운드들의 평균
    pub avg_sec: Option<f64>,
    pub second_round: SecondRound,
}

/// 하이라이트 프로세스별 첫 두 라운드 표
///
/// 라운드 = start에서 다음 kill/lmk까지. start가 한 번도 없는
/// 프로세스는 표에서 빠집니다.
pub fn compute_highlight_runs(events: &[Event], config: &AnalyzerConfig) -> Vec<HighlightRun> {
    let mut runs = Vec::new();
    for name in &config.highlight_processes {
        let timeline: Vec<(NaiveDateTime, EventKind)> = events
            .iter()
            .filter(|e| &e.process_name == name)
            .map(|e| (e.time, e.kind()))
            .collect();
        if !timeline.iter().any(|(_, k)| *k == EventKind::Start) {
            continue;
        }

        let round_after = |from: usize| -> Option<(usize, usize)> {
            let start = timeline[from..]
                .iter()
                .position(|(_, k)| *k == EventKind::Start)?
                + from;
            let kill = timeline[start + 1..]
                .iter()
                .position(|(_, k)| matches!(k, EventKind::Kill | EventKind::Lmk))
                .map(|p| p + start + 1)?;
            Some((start, kill))
        };

        let first = round_after(0);
        let first_round_sec = first.map(|(s, k)| duration_sec(timeline[s].0, timeline[k].0));

        let (second_round_sec, second_round) = match first {
            None => (None, SecondRound::Unknown),
            Some((_, first_kill)) => {
                let has_restart = timeline[first_kill + 1..]
                    .iter()
                    .any(|(_, k)| *k == EventKind::Start);
                if !has_restart {
                    (None, SecondRound::NoSecondRun)
                } else {
                    let second = round_after(first_kill + 1);
                    (
                        second.map(|(s, k)| duration_sec(timeline[s].0, timeline[k].0)),
                        SecondRound::Cold,
                    )
                }
            }
        };

        let observed: Vec<f64> = [first_round_sec, second_round_sec]
            .into_iter()
            .flatten()
            .collect();
        let avg_sec = if observed.is_empty() {
            None
        } else {
            Some(observed.iter().sum::<f64>() / observed.len() as f64)
        };

        runs.push(HighlightRun {
            process: name.clone(),
            first_round_sec,
            second_round_sec,
            avg_sec,
            second_round,
        });
    }
    runs
}

fn duration_sec(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_milliseconds().max(0) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::LogAnalyzer;
    use crate::builder::TimeRange;

    #[test]
    fn percentile_interpolates_linearly() {
        assert_eq!(percentile(&[10.0, 20.0, 30.0, 40.0], 0.5), Some(25.0));
        assert_eq!(percentile(&[5.0], 0.95), Some(5.0));
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(percentile(&[1.0, 2.0], 1.0), Some(2.0));
        assert_eq!(percentile(&[1.0, 2.0], 0.0), Some(1.0));
    }

    #[test]
    fn calc_stats_handles_unsorted_input() {
        let stats = calc_stats(&[30.0, 10.0, 20.0, 40.0]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.avg, Some(25.0));
        assert_eq!(stats.median, Some(25.0));
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(40.0));
    }

    #[test]
    fn safe_int_truncates_floats() {
        assert_eq!(safe_int("42"), Some(42));
        assert_eq!(safe_int("42.9"), Some(42));
        assert_eq!(safe_int("-5"), Some(-5));
        assert_eq!(safe_int(""), None);
        assert_eq!(safe_int("abc"), None);
    }

    fn parse(lines: &[&str]) -> Vec<Event> {
        LogAnalyzer::new().parse_lines(lines.iter().copied(), &TimeRange::default())
    }

    const KILL_LINE: &str = "12-01 10:00:05.000 killer: \
        [kill|2|-900|15|3|1|0|2|350000|120000|51200]\
        [com.tencent.mm|10001|1234|901|905|51200|1024|0|1|0]\
        [123456|234567|345678|45678|56789|7890]";

    #[test]
    fn summary_counts_and_kill_stats() {
        let events = parse(&[
            "12-01 10:00:00.123 am_proc_start: \
             [0,123,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            KILL_LINE,
        ]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());

        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.kind_counts["start"], 1);
        assert_eq!(summary.kind_counts["kill"], 1);
        assert_eq!(summary.start_counts["com.tencent.mm"], 1);
        assert_eq!(summary.top_killed["com.tencent.mm"], 1);
        assert_eq!(summary.total_killed, 1);
        assert_eq!(summary.total_release_mem, 51200);
        assert_eq!(summary.kill_type_stats.all["CPW"], 1);
        assert_eq!(summary.kill_type_stats.highlight["CPW"], 1);

        // 하이라이트 카운터는 목록 전체가 선시드된다
        let counters = &summary.highlight_stats["com.tencent.mm"];
        assert_eq!(counters.start, 1);
        assert_eq!(counters.kill, 1);
        assert_eq!(summary.highlight_stats["com.sina.weibo"], KindCounters::default());
        assert_eq!(summary.highlight_event_ids, vec![1, 2]);
    }

    #[test]
    fn unparseable_killed_pss_skips_kill_stats_block() {
        let line = KILL_LINE.replace("|120000|51200]", "|120000|n/a]");
        let events = parse(&[line.as_str()]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        assert_eq!(summary.total_killed, 0);
        assert_eq!(summary.total_release_mem, 0);
        assert!(summary.kill_type_stats.all.is_empty());
        // 랭킹과 메모리 표본은 게이트 밖이라 계속 집계된다
        assert_eq!(summary.top_killed["com.tencent.mm"], 1);
        assert_eq!(summary.low_memfree_kills.len(), 1);
    }

    #[test]
    fn low_memfree_ranking_sorts_ascending() {
        let high = KILL_LINE.replace("[123456|", "[999999|");
        let events = parse(&[high.as_str(), KILL_LINE]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        assert_eq!(summary.low_memfree_kills.len(), 2);
        assert_eq!(summary.low_memfree_kills[0].mem_free, 123456);
        assert_eq!(summary.low_memfree_kills[1].mem_free, 999999);
    }

    #[test]
    fn mem_buckets_split_by_scope() {
        let events = parse(&[KILL_LINE]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        assert_eq!(summary.mem_stats["all"].mem_free.count, 1);
        assert_eq!(summary.mem_stats["main"].mem_free.count, 1);
        assert_eq!(summary.mem_stats["highlight_main"].mem_free.count, 1);
        assert!(!summary.mem_stats.contains_key("trig"));
    }

    #[test]
    fn skip_events_do_not_feed_mem_buckets() {
        let line = KILL_LINE.replace("[kill|", "[skip|");
        let events = parse(&[line.as_str()]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        assert_eq!(summary.kind_counts["skip"], 1);
        assert_eq!(summary.top_skipped["com.tencent.mm"], 1);
        // skip의 메모리 스냅샷은 압력 분포 표본이 아니다
        assert!(summary.mem_stats.is_empty());
    }

    #[test]
    fn missing_mem_free_keeps_partial_sample() {
        // mem_free가 None 마커라도 나머지 지표는 표본으로 남는다
        let line = KILL_LINE.replace("[123456|", "[None|");
        let events = parse(&[line.as_str()]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        let all = &summary.mem_stats["all"];
        assert_eq!(all.mem_free.count, 0);
        assert_eq!(all.file_pages.count, 1);
        assert_eq!(all.anon_pages.count, 1);
        assert_eq!(all.swap_free.count, 1);
    }

    #[test]
    fn total_killed_counts_events_not_killed_count() {
        // killed_count 필드가 5여도 kill 이벤트 1건은 1로 센다
        let line = KILL_LINE.replace("|15|3|1|0|2|", "|15|3|5|0|2|");
        let events = parse(&[line.as_str()]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        assert_eq!(summary.total_killed, 1);
    }

    #[test]
    fn proc_detail_splits_main_and_sub_kills() {
        let sub_kill = KILL_LINE
            .replace("[com.tencent.mm|", "[com.tencent.mm:push|")
            .replace("10:00:05.000", "10:00:08.000");
        let events = parse(&[KILL_LINE, sub_kill.as_str()]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        let split = summary.main_proc_detail["com.tencent.mm"];
        assert_eq!(split.main, 1);
        assert_eq!(split.sub, 1);
        assert_eq!(summary.highlight_proc_detail["com.tencent.mm"], split);
    }

    #[test]
    fn residency_scenario_with_alive_at_end() {
        // t=0 start, t=10 kill (10초), t=20 재시작, t=30 로그 끝 (생존)
        let events = parse(&[
            "12-01 10:00:00.000 am_proc_start: \
             [0,1,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            &KILL_LINE.replace("10:00:05.000", "10:00:10.000"),
            "12-01 10:00:20.000 am_proc_start: \
             [0,2,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            "12-01 10:00:30.000 am_proc_start: \
             [0,3,10002,com.sina.weibo,prestart-top-activity,com.sina.weibo/.Main]",
        ]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        let mm: Vec<&ResidencyRecord> = summary
            .residency
            .records
            .iter()
            .filter(|r| r.process == "com.tencent.mm")
            .collect();
        assert_eq!(mm.len(), 2);
        assert_eq!(mm[0].duration_sec, 10.0);
        assert!(!mm[0].alive_at_end);
        assert_eq!(mm[1].duration_sec, 10.0);
        assert!(mm[1].alive_at_end);
    }

    #[test]
    fn start_while_alive_closes_previous_interval() {
        let events = parse(&[
            "12-01 10:00:00.000 am_proc_start: \
             [0,1,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            "12-01 10:00:05.000 am_proc_start: \
             [0,2,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
        ]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        let records = &summary.residency.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].duration_sec, 5.0);
        assert!(!records[0].alive_at_end);
        assert!(records[1].alive_at_end);
    }

    #[test]
    fn windowed_residency_rates() {
        // a start(t0) → a kill(t5) → a start(t10): 두 번째 start 시점에
        // 직전 start는 사이에 킬이 있어 죽어 있었다
        let events = parse(&[
            "12-01 10:00:00.000 am_proc_start: \
             [0,1,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            KILL_LINE,
            "12-01 10:00:10.000 am_proc_start: \
             [0,2,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            "12-01 10:00:20.000 am_proc_start: \
             [0,3,10002,com.sina.weibo,prestart-top-activity,com.sina.weibo/.Main]",
        ]);
        let rows = build_highlight_residency(&events, &AnalyzerConfig::new());
        assert_eq!(rows.len(), 2);

        // 두 번째 start: 이력 1건, 죽음
        assert_eq!(rows[0].process, "com.tencent.mm");
        assert_eq!(rows[0].full.total, 1);
        assert_eq!(rows[0].full.alive, 0);
        assert_eq!(rows[0].full.rate_percent, 0.0);

        // 세 번째 start(weibo): 이력 2건, mm은 t10 재시작 후 생존
        assert_eq!(rows[1].full.total, 2);
        assert_eq!(rows[1].full.alive, 1);
        assert_eq!(rows[1].full.rate_percent, 50.0);
        let w1 = rows[1].windows[0].as_ref().unwrap();
        assert_eq!(w1.window, 1);
        assert_eq!(w1.total, 1);
    }

    #[test]
    fn window_larger_than_history_is_blank() {
        let events = parse(&[
            "12-01 10:00:00.000 am_proc_start: \
             [0,1,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            "12-01 10:00:10.000 am_proc_start: \
             [0,2,10002,com.sina.weibo,prestart-top-activity,com.sina.weibo/.Main]",
        ]);
        let rows = build_highlight_residency(&events, &AnalyzerConfig::new());
        assert_eq!(rows.len(), 1);
        // 이력이 start 1건뿐이라 윈도 1만 값이 있고 2..=5는 빈 칸
        assert!(rows[0].windows[0].is_some());
        assert!(rows[0].windows[1..].iter().all(Option::is_none));
        assert_eq!(rows[0].full.total, 1);
    }

    #[test]
    fn subprocess_kill_keeps_main_interval_open() {
        // :push 킬은 본체 com.tencent.mm의 생존 구간을 닫지 않는다
        let sub_kill = KILL_LINE.replace("[com.tencent.mm|", "[com.tencent.mm:push|");
        let events = parse(&[
            "12-01 10:00:00.000 am_proc_start: \
             [0,1,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            sub_kill.as_str(),
            "12-01 10:00:20.000 am_proc_start: \
             [0,2,10002,com.sina.weibo,prestart-top-activity,com.sina.weibo/.Main]",
        ]);
        let summary = compute_summary(&events, &AnalyzerConfig::new());
        let mm: Vec<&ResidencyRecord> = summary
            .residency
            .records
            .iter()
            .filter(|r| r.process == "com.tencent.mm")
            .collect();
        assert_eq!(mm.len(), 1);
        assert!(mm[0].alive_at_end);
        assert_eq!(mm[0].duration_sec, 20.0);

        // 윈도 상주율 판정에서도 서브프로세스 킬은 무시된다
        let rows = build_highlight_residency(&events, &AnalyzerConfig::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].full.alive, 1);
    }

    #[test]
    fn highlight_runs_first_two_rounds() {
        let events = parse(&[
            "12-01 10:00:00.000 am_proc_start: \
             [0,1,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            KILL_LINE,
            "12-01 10:00:20.000 am_proc_start: \
             [0,2,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            &KILL_LINE.replace("10:00:05.000", "10:00:35.000"),
        ]);
        let runs = compute_highlight_runs(&events, &AnalyzerConfig::new());
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.process, "com.tencent.mm");
        assert_eq!(run.first_round_sec, Some(5.0));
        assert_eq!(run.second_round_sec, Some(15.0));
        assert_eq!(run.avg_sec, Some(10.0));
        assert_eq!(run.second_round, SecondRound::Cold);
    }

    #[test]
    fn highlight_run_without_restart() {
        let events = parse(&[
            "12-01 10:00:00.000 am_proc_start: \
             [0,1,10001,com.tencent.mm,prestart-top-activity,com.tencent.mm/.Main]",
            KILL_LINE,
        ]);
        let runs = compute_highlight_runs(&events, &AnalyzerConfig::new());
        assert_eq!(runs[0].second_round, SecondRound::NoSecondRun);
        assert_eq!(runs[0].second_round_sec, None);
    }
}
