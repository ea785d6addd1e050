//! `killtrace analyze` 커맨드 핸들러

use std::io::Write;

use chrono::{Datelike, Local, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use killtrace_analyzer::builder::TimeRange;
use killtrace_analyzer::summary::{HighlightRun, ResidencyRow, Summary};
use killtrace_analyzer::{Event, LogAnalyzer};

use crate::cli::AnalyzeArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// analyze 결과 페이로드
#[derive(Serialize)]
struct AnalyzeReport {
    summary: Summary,
    residency_table: Vec<ResidencyRow>,
    highlight_runs: Vec<HighlightRun>,
    /// `--events` 지정 시에만 포함
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<Vec<Event>>,
}

/// `analyze` 커맨드를 실행합니다.
pub fn execute(
    args: AnalyzeArgs,
    analyzer: &LogAnalyzer,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let range = TimeRange {
        start: args.start.as_deref().map(parse_time_arg).transpose()?,
        end: args.end.as_deref().map(parse_time_arg).transpose()?,
    };

    info!(file = %args.file.display(), "starting log analysis");
    let events = analyzer.parse_file(&args.file, &range)?;

    let report = AnalyzeReport {
        summary: analyzer.summarize(&events),
        residency_table: analyzer.residency_table(&events),
        highlight_runs: analyzer.highlight_runs(&events),
        events: args.events.then_some(events),
    };
    writer.render(&report)
}

/// 시각 인자 해석: 연도 포함 형식 우선, 없으면 현재 연도 보충
fn parse_time_arg(arg: &str) -> Result<NaiveDateTime, CliError> {
    if let Ok(t) = NaiveDateTime::parse_from_str(arg, "%Y-%m-%d %H:%M:%S") {
        return Ok(t);
    }
    let year = Local::now().year();
    NaiveDateTime::parse_from_str(&format!("{year}-{arg}"), "%Y-%m-%d %H:%M:%S")
        .map_err(|_| CliError::InvalidTime(arg.to_owned()))
}

impl Render for AnalyzeReport {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let s = &self.summary;
        writeln!(out, "total events: {}", s.total_events)?;
        for (kind, count) in &s.kind_counts {
            writeln!(out, "  {kind}: {count}")?;
        }
        writeln!(
            out,
            "killed: {} (imp {}), released {} kB",
            s.total_killed, s.killed_imp_count, s.total_release_mem
        )?;

        if !s.low_memfree_kills.is_empty() {
            writeln!(out, "lowest mem_free kills:")?;
            for kill in &s.low_memfree_kills {
                writeln!(
                    out,
                    "  #{} {} {} kB at {}",
                    kill.event_id, kill.process, kill.mem_free, kill.time
                )?;
            }
        }

        if let Some(avg) = s.residency.avg_duration_sec {
            writeln!(
                out,
                "residency: {} intervals, avg {:.1}s",
                s.residency.records.len(),
                avg
            )?;
        }

        for run in &self.highlight_runs {
            writeln!(
                out,
                "run {}: first {} second {} ({:?})",
                run.process,
                fmt_opt_sec(run.first_round_sec),
                fmt_opt_sec(run.second_round_sec),
                run.second_round
            )?;
        }

        if let Some(events) = &self.events {
            writeln!(out, "events:")?;
            for (idx, event) in events.iter().enumerate() {
                writeln!(
                    out,
                    "  #{} {} {} {}",
                    idx + 1,
                    event.time,
                    event.kind(),
                    event.full_name
                )?;
            }
        }
        Ok(())
    }
}

fn fmt_opt_sec(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}s"),
        None => "-".to_owned(),
    }
}
