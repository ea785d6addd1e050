//! 분류된 라인 → 이벤트/레코드 변환
//!
//! 타임스탬프에 연도를 보충해 [`chrono::NaiveDateTime`]으로 올리고,
//! 시간 범위 필터를 적용한 뒤 종류별 상세 구조체를 채웁니다.
//!
//! 타임스탬프가 깨진 라인은 범위 필터가 걸려 있으면 버리고,
//! 무제한 분석이면 현재 시각으로 대체해 살립니다. 덤프 앞머리의
//! 헤더 잘림으로 시각만 날아간 라인을 통째로 잃지 않기 위한
//! 원본 포맷의 관행입니다.

use chrono::{Local, NaiveDateTime};
use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::event::{
    base_name, Event, EventDetails, KillDecision, KillDetails, KillInfoRecord, LmkDetails,
    MemSnapshot, PendingAmKill, ProcInfo, SkipDetails, StartDetails, TrigDetails,
};
use crate::parser::{
    am_kill, killinfo, BracketFields, BracketKind, ClassifiedLine, LmkFields, ProcStartFields,
};

/// 분석 대상 시간 범위 (닫힌 구간, 양끝 선택)
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeRange {
    /// 시각이 범위 안인지
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        if let Some(start) = self.start {
            if t < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if t > end {
                return false;
            }
        }
        true
    }

    /// 양끝 모두 미지정인지
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// 스캔 단계의 산출물 한 건
///
/// LMK 이벤트와 killinfo 레코드는 상관 단계를 거쳐야 해서
/// 일반 이벤트와 분리해 나릅니다.
#[derive(Debug, Clone)]
pub enum ScanItem {
    /// 바로 최종 목록에 들어가는 이벤트 (start/kill/trig/skip)
    Event(Event),
    /// 상관 대상 LMK 이벤트
    LmkEvent(Event),
    /// 버퍼링할 killinfo 레코드
    KillInfo(KillInfoRecord),
    /// 병합 대기 am_kill 보고
    AmKill(PendingAmKill),
}

/// 분류 결과를 [`ScanItem`]으로 올리는 빌더
pub struct EventBuilder {
    year: i32,
    range: TimeRange,
}

impl EventBuilder {
    pub fn new(year: i32, range: TimeRange) -> Self {
        Self { year, range }
    }

    /// `MM-DD HH:MM:SS[.mmm]` 타임스탬프에 연도를 붙여 파싱합니다.
    pub fn parse_log_timestamp(ts: &str, year: i32) -> Option<NaiveDateTime> {
        let dated = format!("{year}-{ts}");
        NaiveDateTime::parse_from_str(&dated, "%Y-%m-%d %H:%M:%S%.f").ok()
    }

    /// 타임스탬프를 해석하고 범위 필터를 적용합니다.
    ///
    /// 파싱 실패 시 무제한 분석이면 현재 시각으로 대체, 아니면 제외.
    fn resolve_time(&self, ts: &str) -> Option<NaiveDateTime> {
        match Self::parse_log_timestamp(ts, self.year) {
            Some(t) => self.range.contains(t).then_some(t),
            None if self.range.is_unbounded() => Some(Local::now().naive_local()),
            None => None,
        }
    }

    /// 분류된 라인 하나를 변환합니다. 필터에 걸린 라인은 `None`.
    pub fn build(
        &self,
        line: ClassifiedLine,
        raw: &str,
        config: &AnalyzerConfig,
    ) -> Option<ScanItem> {
        match line {
            ClassifiedLine::Lmk(fields) => self.build_lmk(fields, raw),
            ClassifiedLine::KillInfo { ts, payload } => self.build_killinfo(&ts, &payload, config),
            ClassifiedLine::AmKill { ts, payload } => self.build_am_kill(&ts, &payload, raw),
            ClassifiedLine::ProcStart(fields) => self.build_start(fields, raw),
            ClassifiedLine::KillKi(fields) => self.build_bracket(fields, raw, config),
        }
    }

    fn build_lmk(&self, fields: LmkFields, raw: &str) -> Option<ScanItem> {
        let time = self.resolve_time(&fields.ts)?;
        let full_name = fields.process.clone();
        let base = base_name(&full_name).to_owned();
        let details = LmkDetails {
            pid: fields.pid,
            adj: fields.adj.unwrap_or_default(),
            min_adj: String::new(),
            rss_kb: fields.rss_kb.unwrap_or_default(),
            reason: fields.reason.unwrap_or_else(|| "unknown".to_owned()),
            tail: fields.tail,
            killinfo: Vec::new(),
        };
        Some(ScanItem::LmkEvent(Event {
            time,
            process_name: base,
            is_subprocess: full_name.contains(':'),
            full_name,
            raw: raw.to_owned(),
            details: EventDetails::Lmk(details),
        }))
    }

    fn build_killinfo(
        &self,
        ts: &str,
        payload: &str,
        config: &AnalyzerConfig,
    ) -> Option<ScanItem> {
        let time = self.resolve_time(ts)?;
        let parsed = killinfo::parse_payload(payload, config);
        if killinfo::is_spurious(&parsed.fields) {
            debug!(payload, "spurious all-numeric killinfo dropped");
            return None;
        }
        Some(ScanItem::KillInfo(KillInfoRecord {
            time,
            raw_fields: parsed.fields,
            parsed: parsed.parsed,
            payload: payload.to_owned(),
        }))
    }

    fn build_am_kill(&self, ts: &str, payload: &str, raw: &str) -> Option<ScanItem> {
        let time = self.resolve_time(ts)?;
        let (_, info) = am_kill::parse_payload(payload);
        // 원클릭 정리는 사용자 주도 일괄 킬이라 압력 분석에서 제외.
        // 로그에 따라 OneKeyClean/onekeyclean이 혼재한다.
        if info.reason.eq_ignore_ascii_case("onekeyclean") {
            debug!(process = %info.process_name, "onekeyclean am_kill dropped");
            return None;
        }
        let full_name = info.process_name.clone();
        let base = base_name(&full_name).to_owned();
        Some(ScanItem::AmKill(PendingAmKill {
            time,
            process_name: base,
            is_subprocess: full_name.contains(':'),
            full_name,
            raw: raw.to_owned(),
            info,
        }))
    }

    fn build_start(&self, fields: ProcStartFields, raw: &str) -> Option<ScanItem> {
        let time = self.resolve_time(&fields.ts)?;
        let base = base_name(&fields.full_name).to_owned();
        Some(ScanItem::Event(Event {
            time,
            process_name: base,
            is_subprocess: fields.full_name.contains(':'),
            full_name: fields.full_name,
            raw: raw.to_owned(),
            details: EventDetails::Start(StartDetails {
                pid: fields.pid,
                uid: fields.uid,
                start_type: fields.start_type,
                component: fields.component,
            }),
        }))
    }

    fn build_bracket(
        &self,
        fields: BracketFields,
        raw: &str,
        config: &AnalyzerConfig,
    ) -> Option<ScanItem> {
        let time = self.resolve_time(&fields.ts)?;

        let d = &fields.decision;
        let kill = KillDecision {
            kill_type: d[0].clone(),
            kill_type_desc: config.describe_kill_type(&d[0]),
            min_score: d[1].clone(),
            min_score_desc: config.describe_min_score(&d[1]),
            killable_proc_count: d[2].clone(),
            important_app_count: d[3].clone(),
            killed_count: d[4].clone(),
            killed_imp_count: d[5].clone(),
            skip_count: d[6].clone(),
            target_mem: d[7].clone(),
            target_release_mem: d[8].clone(),
            killed_pss: d[9].clone(),
        };

        let p = &fields.proc;
        let proc = ProcInfo {
            uid: p[0].clone(),
            pid: p[1].clone(),
            adj: p[2].clone(),
            score: p[3].clone(),
            pss: p[4].clone(),
            swap_used: p[5].clone(),
            ret: p[6].clone(),
            is_main: p[7].clone(),
            is_imp: p[8].clone(),
        };

        let m = &fields.mem;
        let mem = MemSnapshot {
            mem_free: m[0].clone(),
            mem_avail: m[1].clone(),
            mem_file: m[2].clone(),
            mem_anon: m[3].clone(),
            mem_swap_free: m[4].clone(),
            cma_free: m[5].clone(),
        };

        let full_name = fields.process_name.clone();
        let base = base_name(&full_name).to_owned();
        let details = match fields.kind {
            BracketKind::Kill => EventDetails::Kill(KillDetails {
                event_tag: fields.tag,
                kill,
                proc,
                mem,
                sources: vec!["kill".to_owned()],
                am_kill: None,
            }),
            BracketKind::Trig => EventDetails::Trig(TrigDetails {
                event_tag: fields.tag,
                kill,
                proc,
                mem,
                killinfo: Vec::new(),
            }),
            BracketKind::Skip => EventDetails::Skip(SkipDetails {
                event_tag: fields.tag,
                kill,
                proc,
                mem,
            }),
        };

        Some(ScanItem::Event(Event {
            time,
            process_name: base,
            is_subprocess: full_name.contains(':'),
            full_name,
            raw: raw.to_owned(),
            details,
        }))
    }
}
