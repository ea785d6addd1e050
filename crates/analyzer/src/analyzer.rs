//! 분석 파이프라인 진입점
//!
//! 스캔(분류/빌드) → killinfo 상관 → 합성 → 정렬 → am_kill 병합의
//! 고정 순서로 로그를 이벤트 목록으로 올립니다. 같은 입력은 항상
//! 같은 출력을 냅니다.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{Datelike, Local};
use tracing::info;

use crate::builder::{EventBuilder, ScanItem, TimeRange};
use crate::config::AnalyzerConfig;
use crate::correlate::KillInfoBuffer;
use crate::error::AnalyzerError;
use crate::event::{Event, PendingAmKill};
use crate::merge::{merge_kill_amkill, AM_KILL_WINDOW_SECONDS};
use crate::parser::LineClassifier;
use crate::summary::{
    build_highlight_residency, compute_highlight_runs, compute_summary, HighlightRun,
    ResidencyRow, Summary,
};

/// 킬 로그 분석기
pub struct LogAnalyzer {
    config: AnalyzerConfig,
}

impl LogAnalyzer {
    /// 기본 설정으로 만듭니다.
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::new(),
        }
    }

    /// 오버라이드가 적용된 설정으로 만듭니다.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// 설정 참조
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// 로그 파일을 읽어 이벤트 목록을 만듭니다.
    ///
    /// 라인은 UTF-8 손상을 허용하며(깨진 바이트는 대체 문자로),
    /// 파일 없음만 전용 에러로 구분합니다.
    pub fn parse_file(
        &self,
        path: impl AsRef<Path>,
        range: &TimeRange,
    ) -> Result<Vec<Event>, AnalyzerError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnalyzerError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                AnalyzerError::Io(e)
            }
        })?;

        let mut reader = BufReader::new(file);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            lines.push(String::from_utf8_lossy(&buf).into_owned());
        }

        Ok(self.parse_lines(lines.iter().map(String::as_str), range))
    }

    /// 라인 열을 이벤트 목록으로 올립니다.
    ///
    /// 타임스탬프의 연도는 실행 시점의 현재 연도로 보충합니다.
    pub fn parse_lines<'a>(
        &self,
        lines: impl IntoIterator<Item = &'a str>,
        range: &TimeRange,
    ) -> Vec<Event> {
        let classifier = LineClassifier::new(&self.config);
        let builder = EventBuilder::new(Local::now().year(), *range);

        let mut events: Vec<Event> = Vec::new();
        let mut lmk_events: Vec<Event> = Vec::new();
        let mut buffer = KillInfoBuffer::new();
        let mut am_kills: Vec<PendingAmKill> = Vec::new();
        let mut scanned = 0usize;

        for line in lines {
            scanned += 1;
            let Some(classified) = classifier.classify(line) else {
                continue;
            };
            match builder.build(classified, line, &self.config) {
                Some(ScanItem::Event(event)) => events.push(event),
                Some(ScanItem::LmkEvent(event)) => lmk_events.push(event),
                Some(ScanItem::KillInfo(record)) => buffer.push(record),
                Some(ScanItem::AmKill(pending)) => am_kills.push(pending),
                None => {}
            }
        }

        buffer.attach_to_lmk(&mut lmk_events);
        events.append(&mut lmk_events);
        events.extend(buffer.drain_unused(&self.config));
        events.sort_by_key(|e| e.time);

        let events = merge_kill_amkill(events, am_kills, AM_KILL_WINDOW_SECONDS);
        info!(
            lines = scanned,
            events = events.len(),
            "log scan complete"
        );
        events
    }

    /// 이벤트 목록의 통계 요약
    pub fn summarize(&self, events: &[Event]) -> Summary {
        compute_summary(events, &self.config)
    }

    /// 하이라이트 프로세스 상주율 표
    pub fn residency_table(&self, events: &[Event]) -> Vec<ResidencyRow> {
        build_highlight_residency(events, &self.config)
    }

    /// 하이라이트 프로세스의 킬→재시작 구간 표
    pub fn highlight_runs(&self, events: &[Event]) -> Vec<HighlightRun> {
        compute_highlight_runs(events, &self.config)
    }

    /// 로그 한 줄 해설 (문법 판별 + 필드 분해)
    pub fn explain_line(&self, line: &str) -> Result<String, AnalyzerError> {
        crate::explain::explain_line(&self.config, line)
    }
}

impl Default for LogAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use proptest::prelude::*;

    const SAMPLE_LINES: [&str; 6] = [
        "12-01 10:00:00.123 am_proc_start: \
         [0,123,10001,com.example.app,prestart-top-activity,com.example.app/.Main]",
        "12-01 10:00:10.000 lowmemorykiller: Kill 'com.example.app' (pid 123) to free 51200kB",
        "12-01 10:00:12.000 killinfo: [com.example.app,123,10001,901,900,51200,120,3]",
        "12-01 10:00:20.000 killer: \
         [kill|2|-900|15|3|1|0|2|350000|120000|51200]\
         [com.other.app|10002|456|901|905|51200|1024|0|1|0]\
         [123456|234567|345678|45678|56789|7890]",
        "12-01 10:00:21.000 am_kill : [10002,456,com.other.app,901,cached-empty,51200]",
        "12-01 10:00:30.000 killinfo: [kworker/u16,999,0,901,900,1000,0,7]",
    ];

    #[test]
    fn full_pipeline_produces_sorted_events() {
        let analyzer = LogAnalyzer::new();
        let events = analyzer.parse_lines(SAMPLE_LINES, &TimeRange::default());
        // start + lmk + kill(병합) + trig(합성) = 4
        assert_eq!(events.len(), 4);
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));

        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Start, EventKind::Lmk, EventKind::Kill, EventKind::Trig]
        );
    }

    #[test]
    fn pipeline_is_deterministic() {
        let analyzer = LogAnalyzer::new();
        let a = analyzer.parse_lines(SAMPLE_LINES, &TimeRange::default());
        let b = analyzer.parse_lines(SAMPLE_LINES, &TimeRange::default());
        assert_eq!(a, b);
    }

    #[test]
    fn missing_file_is_a_dedicated_error() {
        let analyzer = LogAnalyzer::new();
        let err = analyzer
            .parse_file("/nonexistent/kill.log", &TimeRange::default())
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::FileNotFound { .. }));
    }

    proptest! {
        /// 무관한 노이즈 라인이 어디에 끼어도 결과가 같다
        #[test]
        fn noise_lines_do_not_change_events(positions in prop::collection::vec(0usize..=6, 0..8)) {
            let analyzer = LogAnalyzer::new();
            let baseline = analyzer.parse_lines(SAMPLE_LINES, &TimeRange::default());

            let mut noisy: Vec<&str> = SAMPLE_LINES.to_vec();
            for pos in positions {
                let at = pos.min(noisy.len());
                noisy.insert(at, "12-01 10:00:00.000 D SomeTag: irrelevant chatter");
            }
            let events = analyzer.parse_lines(noisy, &TimeRange::default());
            prop_assert_eq!(events, baseline);
        }
    }
}
