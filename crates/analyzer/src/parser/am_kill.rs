//! am_kill 페이로드 파서
//!
//! `[uid, pid, process, adj, reason, pss]` 위치 고정 6필드.
//! 모자라는 필드는 빈 문자열로 채우고, 넘치는 필드는 버립니다.

use crate::event::AmKillInfo;

/// am_kill 브래킷 페이로드를 파싱합니다.
///
/// 원본 필드 목록과 구조화된 [`AmKillInfo`]를 함께 돌려줍니다.
/// `priority`는 adj의 별칭입니다.
pub fn parse_payload(payload: &str) -> (Vec<String>, AmKillInfo) {
    let fields: Vec<String> = payload.split(',').map(|f| f.trim().to_owned()).collect();

    let at = |idx: usize| fields.get(idx).cloned().unwrap_or_default();

    let adj = at(3);
    let info = AmKillInfo {
        uid: at(0),
        pid: at(1),
        process_name: at(2),
        adj: adj.clone(),
        reason: at(4),
        pss_kb: at(5),
        priority: adj,
    };

    (fields, info)
}
