//! `killtrace explain` 커맨드 핸들러

use std::io::Write;

use serde::Serialize;

use killtrace_analyzer::LogAnalyzer;

use crate::cli::ExplainArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// explain 결과 페이로드
#[derive(Serialize)]
struct ExplainReport {
    line: String,
    explanation: String,
}

/// `explain` 커맨드를 실행합니다.
pub fn execute(
    args: ExplainArgs,
    analyzer: &LogAnalyzer,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let explanation = analyzer.explain_line(&args.line)?;
    writer.render(&ExplainReport {
        line: args.line,
        explanation,
    })
}

impl Render for ExplainReport {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        out.write_all(self.explanation.as_bytes())
    }
}
