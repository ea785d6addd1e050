//! 분석기 에러 타입
//!
//! 하드 실패는 입력 파일 열기와 오버라이드 설정 검증뿐입니다.
//! 개별 라인의 문법 오류는 에러가 아니라 "건너뛰고 계속"으로 처리되므로
//! 여기에 variant가 없습니다.

/// 분석기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// 입력 로그 파일 없음
    #[error("log file not found: {path}")]
    FileNotFound {
        /// 찾지 못한 경로
        path: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 오버라이드 설정 검증 실패
    #[error("config error: {field}: {reason}")]
    Config {
        /// 문제가 된 설정 필드
        field: String,
        /// 실패 사유
        reason: String,
    },

    /// 오버라이드 정규식 컴파일 실패
    #[error("invalid pattern '{name}': {reason}")]
    Pattern {
        /// 패턴 이름 (lmk, killinfo, am_kill)
        name: String,
        /// regex 컴파일 에러 메시지
        reason: String,
    },

    /// 단일 라인 해설 유틸리티가 어떤 문법으로도 인식하지 못함
    #[error("unrecognized log line: {0}")]
    UnrecognizedLine(String),

    /// 단일 라인 해설 유틸리티에 빈 입력이 들어옴
    #[error("empty input line")]
    EmptyInput,
}
