//! 서브커맨드 핸들러 -- 커맨드당 모듈 하나

pub mod analyze;
pub mod explain;
