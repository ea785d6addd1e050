//! clap derive 기반 CLI 인자 정의
//!
//! 선언만 담고 부수 효과는 없습니다.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Killtrace -- Android 메모리 킬 로그 분석기.
///
/// `killtrace <COMMAND> --help`로 서브커맨드 상세를 봅니다.
#[derive(Parser, Debug)]
#[command(name = "killtrace", version, about, long_about = None)]
pub struct Cli {
    /// 설정 오버라이드 파일 (YAML 또는 JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// 출력 형식
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// 지원 출력 형식
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// 사람이 읽을 텍스트
    Text,
    /// 기계가 읽을 JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 로그 파일을 분석해 이벤트 타임라인과 요약을 출력
    Analyze(AnalyzeArgs),

    /// 로그 한 줄을 판별해 필드를 해설
    Explain(ExplainArgs),
}

// ---- analyze ----

/// 로그 파일 분석.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// 분석할 로그 파일 경로
    pub file: PathBuf,

    /// 분석 시작 시각 (`MM-DD HH:MM:SS` 또는 `YYYY-MM-DD HH:MM:SS`)
    #[arg(long)]
    pub start: Option<String>,

    /// 분석 종료 시각 (`MM-DD HH:MM:SS` 또는 `YYYY-MM-DD HH:MM:SS`)
    #[arg(long)]
    pub end: Option<String>,

    /// 요약과 함께 전체 이벤트 목록도 출력
    #[arg(long)]
    pub events: bool,
}

// ---- explain ----

/// 단일 라인 해설.
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// 붙여넣은 로그 한 줄
    pub line: String,
}
