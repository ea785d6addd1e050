//! CLI 에러 타입

use killtrace_analyzer::AnalyzerError;

/// CLI 전용 에러
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// 시각 인자 해석 실패
    #[error("invalid time '{0}': expected 'MM-DD HH:MM:SS' or 'YYYY-MM-DD HH:MM:SS'")]
    InvalidTime(String),

    /// 분석 코어 에러
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    /// JSON 출력 직렬화 실패
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// I/O 에러 (stdout 등)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
