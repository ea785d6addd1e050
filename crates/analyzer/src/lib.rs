//! Killtrace 분석 코어 -- Android 메모리 킬 로그 파싱/상관/집계 엔진
//!
//! 커널 lowmemorykiller, 통합 킬러(kill ki), activity manager의
//! am_kill, killinfo 진단 덤프가 같은 킬을 제각각 보고하는 로그를
//! 받아, 정규화된 단일 이벤트 타임라인과 통계 요약으로 올립니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: 패턴/룩업 테이블/하이라이트 목록, 오버라이드 로딩
//! - [`event`]: 정규화된 이벤트 데이터 모델
//! - [`parser`]: 라인 분류기와 다섯 가지 문법별 파서
//! - [`builder`]: 분류된 라인 → 이벤트 변환, 시간 범위 필터
//! - [`correlate`]: LMK ↔ killinfo 5초 창 상관과 폴백 합성
//! - [`merge`]: kill ↔ am_kill 3초 창 병합과 단독 승격
//! - [`analyzer`]: 파이프라인 진입점 ([`LogAnalyzer`])
//! - [`summary`]: 히스토그램/백분위수/상주율 집계
//! - [`explain`]: 단일 라인 해설 유틸리티
//! - [`error`]: 도메인 에러 타입
//!
//! # 파이프라인
//!
//! ```text
//! lines -> LineClassifier -> EventBuilder -> KillInfoBuffer ─┐
//!                                              (attach/synth) ├─ sort -> merge am_kill -> Events
//!                                                             ┘            |
//!                                                                      Summary / Residency
//! ```

pub mod analyzer;
pub mod builder;
pub mod config;
pub mod correlate;
pub mod error;
pub mod event;
pub mod explain;
pub mod merge;
pub mod parser;
pub mod summary;

// --- 주요 타입 re-export ---

// 진입점
pub use analyzer::LogAnalyzer;

// 설정
pub use config::{AnalyzerConfig, ConfigOverrides};

// 에러
pub use error::AnalyzerError;

// 이벤트 모델
pub use event::{Event, EventDetails, EventKind};

// 스캔/필터
pub use builder::TimeRange;

// 집계
pub use summary::{HighlightRun, ResidencyRow, Summary};
