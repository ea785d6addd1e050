//! LMK 이벤트 ↔ killinfo 레코드 상관
//!
//! 스캔 중 모든 killinfo 레코드를 버퍼에 쌓고 pid/프로세스명으로
//! 색인한 뒤, LMK 이벤트마다 5초 이내 최근접 레코드를 붙입니다.
//! 최소 델타가 동률인 레코드는 전부 붙습니다.
//!
//! 끝까지 어느 LMK에도 붙지 않은 레코드는 버리지 않고 이벤트로
//! 합성합니다. 프로세스명이 앱 패키지로 보이면 LMK 라인이 유실된
//! 커널 킬로 간주해 lmk 이벤트로, 아니면 트리거 기록으로 올립니다.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::event::{
    looks_like_package, Event, EventDetails, KillDecision, KillInfoRecord, LmkDetails,
    MemSnapshot, ProcInfo, TrigDetails,
};

/// 매칭 허용 시간 창 (초)
const MATCH_WINDOW_SECONDS: f64 = 5.0;

/// 사용 여부를 추적하는 버퍼 항목
#[derive(Debug, Clone)]
struct BufferedKillInfo {
    record: KillInfoRecord,
    used: bool,
}

/// killinfo 레코드 버퍼
///
/// 색인은 버퍼 내 인덱스를 가리키며, 동일 레코드가 pid 색인과
/// 프로세스명 색인 양쪽에서 나와도 한 번만 후보가 됩니다.
#[derive(Debug, Default)]
pub struct KillInfoBuffer {
    records: Vec<BufferedKillInfo>,
    by_pid: HashMap<String, Vec<usize>>,
    by_comm: HashMap<String, Vec<usize>>,
}

impl KillInfoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드를 버퍼에 넣고 색인합니다.
    pub fn push(&mut self, record: KillInfoRecord) {
        let idx = self.records.len();
        let pid = record.field("pid").to_owned();
        let comm = record.field("process_name").to_owned();
        if !pid.is_empty() {
            self.by_pid.entry(pid).or_default().push(idx);
        }
        if !comm.is_empty() {
            self.by_comm.entry(comm).or_default().push(idx);
        }
        self.records.push(BufferedKillInfo { record, used: false });
    }

    /// 버퍼가 비었는지
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// LMK 이벤트들에 최근접 killinfo를 붙입니다.
    ///
    /// 후보는 pid 일치 또는 로그에 찍힌 전체 이름 일치로 모으고,
    /// 시간 델타 최솟값이 [`MATCH_WINDOW_SECONDS`] 이내면 동률
    /// 레코드를 모두 붙인 뒤 사용 처리합니다. 첫 매칭 레코드로
    /// LMK 상세의 빈 필드(rss/min_adj/reason)를 보충합니다.
    pub fn attach_to_lmk(&mut self, events: &mut [Event]) {
        for event in events.iter_mut() {
            let event_time = event.time;
            let event_full_name = event.full_name.clone();
            let EventDetails::Lmk(details) = &mut event.details else {
                continue;
            };

            let mut candidates: Vec<usize> = Vec::new();
            if !details.pid.is_empty() {
                if let Some(indices) = self.by_pid.get(&details.pid) {
                    candidates.extend_from_slice(indices);
                }
            }
            if let Some(indices) = self.by_comm.get(&event_full_name) {
                candidates.extend_from_slice(indices);
            }
            candidates.sort_unstable();
            candidates.dedup();
            if candidates.is_empty() {
                continue;
            }

            let deltas: Vec<(usize, f64)> = candidates
                .iter()
                .map(|&idx| (idx, delta_seconds(self.records[idx].record.time, event_time)))
                .collect();
            let min = deltas
                .iter()
                .map(|(_, d)| *d)
                .fold(f64::INFINITY, f64::min);
            if min > MATCH_WINDOW_SECONDS {
                continue;
            }

            for &(idx, delta) in &deltas {
                if delta > min {
                    continue;
                }
                let entry = &mut self.records[idx];
                entry.used = true;
                details.killinfo.push(entry.record.clone());
            }

            if let Some(first) = details.killinfo.first() {
                if details.rss_kb.is_empty() {
                    details.rss_kb = first.field("rss_kb").to_owned();
                }
                if details.min_adj.is_empty() {
                    details.min_adj = first.field("min_adj").to_owned();
                }
                let reason = first.field("kill_reason");
                if (details.reason.is_empty() || details.reason == "unknown")
                    && !reason.is_empty()
                {
                    details.reason = reason.to_owned();
                }
            }
        }
    }

    /// 미사용 레코드를 합성 이벤트로 배출합니다.
    pub fn drain_unused(self, config: &AnalyzerConfig) -> Vec<Event> {
        let mut synthesized = Vec::new();
        for entry in self.records {
            if entry.used {
                continue;
            }
            debug!(
                payload = %entry.record.payload,
                "unmatched killinfo promoted to synthetic event"
            );
            synthesized.push(synthesize(entry.record, config));
        }
        synthesized
    }
}

/// 두 시각 사이 시간 델타 (초, 절댓값)
fn delta_seconds(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    let millis = (a - b).num_milliseconds().abs();
    millis as f64 / 1000.0
}

/// 미매칭 killinfo 레코드 하나를 이벤트로 합성합니다.
fn synthesize(record: KillInfoRecord, config: &AnalyzerConfig) -> Event {
    let name = record.field("process_name").to_owned();
    let raw = format!("killinfo-only: [{}]", record.payload);
    let time = record.time;

    if looks_like_package(&name) {
        let reason = match record.field("kill_reason") {
            "" => "unknown".to_owned(),
            r => r.to_owned(),
        };
        let details = LmkDetails {
            pid: record.field("pid").to_owned(),
            adj: record.field("adj").to_owned(),
            min_adj: record.field("min_adj").to_owned(),
            rss_kb: record.field("rss_kb").to_owned(),
            reason,
            tail: String::new(),
            killinfo: vec![record],
        };
        let base = crate::event::base_name(&name).to_owned();
        return Event {
            time,
            process_name: base,
            is_subprocess: name.contains(':'),
            full_name: name,
            raw,
            details: EventDetails::Lmk(details),
        };
    }

    let min_adj = record.field("min_adj").to_owned();
    let kill = KillDecision {
        kill_type: "trig".to_owned(),
        kill_type_desc: "trig".to_owned(),
        min_score_desc: config.describe_min_score(&min_adj),
        min_score: min_adj,
        ..KillDecision::default()
    };
    let proc = ProcInfo {
        uid: record.field("uid").to_owned(),
        pid: record.field("pid").to_owned(),
        adj: record.field("adj").to_owned(),
        pss: record.field("rss_kb").to_owned(),
        swap_used: record.field("proc_swap_kb").to_owned(),
        is_main: "true".to_owned(),
        is_imp: "false".to_owned(),
        ..ProcInfo::default()
    };
    let mem = MemSnapshot {
        mem_free: record.field("mem_free_kb").to_owned(),
        mem_avail: String::new(),
        mem_file: sum_fields(&record, "active_file_kb", "inactive_file_kb"),
        mem_anon: sum_fields(&record, "active_anon_kb", "inactive_anon_kb"),
        mem_swap_free: record.field("swap_free_kb").to_owned(),
        cma_free: record.field("cma_free_kb").to_owned(),
    };

    let full_name = if name.is_empty() {
        "unknown".to_owned()
    } else {
        name
    };
    let base = crate::event::base_name(&full_name).to_owned();
    Event {
        time,
        process_name: base,
        is_subprocess: full_name.contains(':'),
        full_name,
        raw,
        details: EventDetails::Trig(TrigDetails {
            event_tag: "trig".to_owned(),
            kill,
            proc,
            mem,
            killinfo: vec![record],
        }),
    }
}

/// 두 필드의 정수 합. 하나만 파싱되면 그 값, 둘 다 없으면 빈 문자열.
fn sum_fields(record: &KillInfoRecord, a: &str, b: &str) -> String {
    let parts: Vec<i64> = [a, b]
        .iter()
        .filter_map(|name| record.field(name).parse::<i64>().ok())
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        parts.iter().sum::<i64>().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{EventBuilder, ScanItem, TimeRange};
    use crate::parser::LineClassifier;

    fn scan(lines: &[&str]) -> (Vec<Event>, KillInfoBuffer) {
        let config = AnalyzerConfig::new();
        let classifier = LineClassifier::new(&config);
        let builder = EventBuilder::new(2025, TimeRange::default());
        let mut lmk_events = Vec::new();
        let mut buffer = KillInfoBuffer::new();
        for line in lines {
            let Some(classified) = classifier.classify(line) else {
                continue;
            };
            match builder.build(classified, line, &config) {
                Some(ScanItem::LmkEvent(event)) => lmk_events.push(event),
                Some(ScanItem::KillInfo(record)) => buffer.push(record),
                _ => {}
            }
        }
        (lmk_events, buffer)
    }

    #[test]
    fn killinfo_within_window_is_attached() {
        let (mut events, mut buffer) = scan(&[
            "12-01 10:00:00.000 lowmemorykiller: Kill 'com.example.app' (pid 1234)",
            "12-01 10:00:04.000 killinfo: [com.example.app,1234,10001,901,900,51200,120,3]",
        ]);
        buffer.attach_to_lmk(&mut events);
        let EventDetails::Lmk(details) = &events[0].details else {
            panic!("expected lmk details");
        };
        assert_eq!(details.killinfo.len(), 1);
        // 빈 필드가 레코드로 보충된다
        assert_eq!(details.rss_kb, "51200");
        assert_eq!(details.min_adj, "900");
        assert_eq!(details.reason, "3");
        assert!(buffer.drain_unused(&AnalyzerConfig::new()).is_empty());
    }

    #[test]
    fn killinfo_outside_window_is_not_attached() {
        let (mut events, mut buffer) = scan(&[
            "12-01 10:00:00.000 lowmemorykiller: Kill 'com.example.app' (pid 1234)",
            "12-01 10:00:06.000 killinfo: [com.example.app,1234,10001,901,900,51200,120,3]",
        ]);
        buffer.attach_to_lmk(&mut events);
        let EventDetails::Lmk(details) = &events[0].details else {
            panic!("expected lmk details");
        };
        assert!(details.killinfo.is_empty());
        // 미매칭 레코드는 합성 이벤트가 된다
        let synthesized = buffer.drain_unused(&AnalyzerConfig::new());
        assert_eq!(synthesized.len(), 1);
    }

    #[test]
    fn comm_match_attaches_when_pid_is_missing() {
        // pid 없는 LMK 라인이라 후보 수집이 전체 이름 색인만 탄다
        let (mut events, mut buffer) = scan(&[
            "12-01 10:00:00.000 lowmemorykiller: Kill com.example.app to free 100kB",
            "12-01 10:00:02.000 killinfo: [com.example.app,1234,10001,901,900,51200,120,3]",
        ]);
        buffer.attach_to_lmk(&mut events);
        let EventDetails::Lmk(details) = &events[0].details else {
            panic!("expected lmk details");
        };
        assert_eq!(details.killinfo.len(), 1);
        assert_eq!(details.min_adj, "900");
    }

    #[test]
    fn tied_records_all_attach() {
        let (mut events, mut buffer) = scan(&[
            "12-01 10:00:02.000 lowmemorykiller: Kill 'com.example.app' (pid 1234)",
            "12-01 10:00:00.000 killinfo: [com.example.app,1234,10001,901]",
            "12-01 10:00:04.000 killinfo: [com.example.app,1234,10001,901]",
        ]);
        buffer.attach_to_lmk(&mut events);
        let EventDetails::Lmk(details) = &events[0].details else {
            panic!("expected lmk details");
        };
        assert_eq!(details.killinfo.len(), 2);
    }

    #[test]
    fn package_name_synthesizes_lmk_event() {
        let (_, buffer) = scan(&[
            "12-01 10:00:00.000 killinfo: [com.example.app:push,1234,10001,901,900,51200,120,3]",
        ]);
        let events = buffer.drain_unused(&AnalyzerConfig::new());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].process_name, "com.example.app");
        assert!(events[0].is_subprocess);
        assert!(events[0].raw.starts_with("killinfo-only:"));
        let EventDetails::Lmk(details) = &events[0].details else {
            panic!("expected lmk details");
        };
        assert_eq!(details.pid, "1234");
        assert_eq!(details.killinfo.len(), 1);
    }

    #[test]
    fn non_package_name_synthesizes_trig_event() {
        let (_, buffer) = scan(&[
            "12-01 10:00:00.000 killinfo: [kworker/u16,1234,10001,901,900,51200,120,3]",
        ]);
        let events = buffer.drain_unused(&AnalyzerConfig::new());
        assert_eq!(events.len(), 1);
        let EventDetails::Trig(details) = &events[0].details else {
            panic!("expected trig details");
        };
        assert_eq!(details.kill.kill_type, "trig");
        assert_eq!(details.proc.is_main, "true");
        assert_eq!(details.proc.pss, "51200");
    }
}
