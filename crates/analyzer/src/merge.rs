//! kill 이벤트 ↔ am_kill 보고 병합
//!
//! 통합 킬러의 kill 라인과 activity manager의 am_kill 라인은 같은
//! 처형을 두 서브시스템이 따로 보고한 것입니다. 3초 이내 최근접
//! kill 이벤트에 am_kill을 병합하고, 짝이 없는 am_kill은 단독 kill
//! 이벤트로 승격합니다. am_kill 보고 자체는 최종 목록에 남지 않습니다.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::event::{
    base_name, Event, EventDetails, KillDecision, KillDetails, MemSnapshot, PendingAmKill,
    ProcInfo,
};

/// am_kill 병합 허용 시간 창 (초)
pub const AM_KILL_WINDOW_SECONDS: f64 = 3.0;

/// am_kill 보고를 kill 이벤트에 병합하고 시간순으로 재정렬합니다.
///
/// 매칭 조건은 pid 일치 또는 베이스 프로세스명 일치에 시간 창입니다.
/// 최근접 하나에만 붙고, 델타 동률이면 목록상 먼저 나온 이벤트가
/// 이깁니다. 같은 kill이 창 안에서 두 번 보고되면 나중 보고가
/// 먼저 붙은 것을 덮어씁니다.
pub fn merge_kill_amkill(
    mut events: Vec<Event>,
    am_kills: Vec<PendingAmKill>,
    window_seconds: f64,
) -> Vec<Event> {
    for pending in am_kills {
        match find_match(&events, &pending, window_seconds) {
            Some(idx) => {
                let EventDetails::Kill(details) = &mut events[idx].details else {
                    continue;
                };
                // 같은 kill에 두 번째 보고가 오면 나중 것이 덮어쓴다
                if !details.sources.iter().any(|s| s == "am_kill") {
                    details.sources.push("am_kill".to_owned());
                }
                details.am_kill = Some(pending.info);
            }
            None => {
                debug!(
                    process = %pending.full_name,
                    "unmatched am_kill promoted to standalone kill event"
                );
                events.push(promote(pending));
            }
        }
    }

    events.sort_by_key(|e| e.time);
    events
}

/// 시간 창 안에서 가장 가까운 kill 이벤트의 인덱스
fn find_match(events: &[Event], pending: &PendingAmKill, window_seconds: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, event) in events.iter().enumerate() {
        let EventDetails::Kill(details) = &event.details else {
            continue;
        };

        let pid_match =
            !pending.info.pid.is_empty() && details.proc.pid == pending.info.pid;
        let name_match = base_name(&event.full_name) == pending.process_name;
        if !pid_match && !name_match {
            continue;
        }

        let delta = delta_seconds(event.time, pending.time);
        if delta > window_seconds {
            continue;
        }
        match best {
            Some((_, best_delta)) if delta >= best_delta => {}
            _ => best = Some((idx, delta)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// 짝 없는 am_kill을 단독 kill 이벤트로 승격합니다.
///
/// 킬러 브래킷에만 있는 필드(메모리 스냅샷, 카운터류)는 비워 두고,
/// pss는 am_kill이 보고한 값을 그대로 씁니다.
fn promote(pending: PendingAmKill) -> Event {
    let info = pending.info;
    let kill = KillDecision {
        kill_type: "am_kill".to_owned(),
        kill_type_desc: "am_kill".to_owned(),
        killed_count: "1".to_owned(),
        killed_pss: info.pss_kb.clone(),
        ..KillDecision::default()
    };
    let proc = ProcInfo {
        uid: info.uid.clone(),
        pid: info.pid.clone(),
        adj: info.adj.clone(),
        pss: info.pss_kb.clone(),
        ret: info.pss_kb.clone(),
        is_main: (!pending.is_subprocess).to_string(),
        is_imp: "false".to_owned(),
        ..ProcInfo::default()
    };

    Event {
        time: pending.time,
        process_name: pending.process_name,
        full_name: pending.full_name,
        is_subprocess: pending.is_subprocess,
        raw: pending.raw,
        details: EventDetails::Kill(KillDetails {
            event_tag: "am_kill".to_owned(),
            kill,
            proc,
            mem: MemSnapshot::default(),
            sources: vec!["am_kill".to_owned()],
            am_kill: Some(info),
        }),
    }
}

fn delta_seconds(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    (a - b).num_milliseconds().abs() as f64 / 1000.0
}
