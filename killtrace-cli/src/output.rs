//! 텍스트/JSON 출력 추상화
//!
//! 모든 서브커맨드 출력은 [`OutputWriter`]를 지나며, 형식 분기는
//! 여기서만 일어납니다.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// 텍스트 렌더링 인터페이스. JSON은 `Serialize`로 처리됩니다.
pub trait Render {
    fn render_text(&self, out: &mut dyn Write) -> std::io::Result<()>;
}

/// 형식 선택을 감춘 출력기
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// 페이로드를 stdout으로 렌더링합니다.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        match self.format {
            OutputFormat::Text => payload.render_text(&mut handle)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut handle, payload)?;
                writeln!(handle)?;
            }
        }
        Ok(())
    }
}
