//! Compensation Pipeline - Single Entry Point
//!
//! Order: marker guard, directive scan, whitespace normalization, quadrant
//! split, backlash compensation, preamble. Output is only written after both
//! rewrite passes succeed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::arc_split::{ArcSplitter, SplitStats};
use crate::backlash::{BacklashCompensator, CorrectionStats};
use crate::command::{Label, Line};
use crate::config::{Config, ConfigError};
use crate::hashing::sha256_hex;
use crate::program::{LineError, Program};
use crate::validation::{Diagnostic, Scanner};
use crate::ENGINE_VERSION;

/// First line of every compensated program.
pub const COMPENSATION_MARKER: &str = ";--+--BACKLASH COMPENSATED--+--";

/// Lines following the marker: establish XY/absolute mode and approach the
/// origin from the negative side so both axes start out travelling positive.
pub const PREAMBLE: [&str; 4] = [
    "; Zero is defined when driving from negative X/Y to zero X/Y",
    "G90 G17",
    "G0 X-1 Y-1",
    "G0 X0 Y0",
];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Malformed program: {0}")]
    Field(#[from] LineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} is not a valid file")]
    InputNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A successfully compensated program plus what the passes did to it.
#[derive(Debug, Clone)]
pub struct Compensation {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
    pub split: SplitStats,
    pub corrections: CorrectionStats,
    pub lines_in: usize,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Compensated(Compensation),
    /// The input already starts with the marker; nothing was changed.
    AlreadyCompensated,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompensationReport {
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub config: Config,
    pub input_sha256: String,
    pub output_sha256: String,
    pub lines_in: usize,
    pub lines_out: usize,
    pub split: SplitStats,
    pub corrections: CorrectionStats,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompensationReport {
    /// Pretty JSON with keys in sorted order (serde_json's default map).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let value = serde_json::to_value(self)?;
        serde_json::to_string_pretty(&value)
    }
}

/// The compensation pipeline - single entry point for all program rewrites
pub struct CompensationPipeline {
    config: Config,
    scanner: Scanner,
}

impl CompensationPipeline {
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            scanner: Scanner::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run both rewrite passes over `program`.
    pub fn compensate(&self, mut program: Program) -> Result<Outcome, PipelineError> {
        if is_compensated(&program) {
            info!("program already carries the compensation marker");
            return Ok(Outcome::AlreadyCompensated);
        }

        let diagnostics = self.scanner.scan(&program);
        for d in &diagnostics {
            warn!(line = d.line, directive = %d.directive, "{}", d.message);
        }

        let lines_in = program.len();
        normalize_whitespace(&mut program);
        let split = ArcSplitter::new(&self.config).split(&mut program)?;
        let corrections = BacklashCompensator::new(&self.config).compensate(&mut program)?;
        insert_preamble(&mut program);

        Ok(Outcome::Compensated(Compensation {
            program,
            diagnostics,
            split,
            corrections,
            lines_in,
        }))
    }

    pub fn compensate_text(&self, text: &str) -> Result<Outcome, PipelineError> {
        self.compensate(Program::parse(text))
    }

    /// Compensate `input` into `output`. Returns `None` when the input was
    /// already compensated, in which case `output` is not touched.
    pub fn compensate_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<Option<CompensationReport>, PipelineError> {
        let text = read_input(input)?;
        let compensation = match self.compensate_text(&text)? {
            Outcome::Compensated(compensation) => compensation,
            Outcome::AlreadyCompensated => return Ok(None),
        };

        let output_text = compensation.program.to_text();
        fs::write(output, &output_text).map_err(|source| PipelineError::Write {
            path: output.to_path_buf(),
            source,
        })?;
        info!(path = %output.display(), "compensated program written");

        Ok(Some(self.report(&text, &output_text, &compensation)))
    }

    pub fn report(
        &self,
        input_text: &str,
        output_text: &str,
        compensation: &Compensation,
    ) -> CompensationReport {
        CompensationReport {
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            config: self.config,
            input_sha256: sha256_hex(input_text.as_bytes()),
            output_sha256: sha256_hex(output_text.as_bytes()),
            lines_in: compensation.lines_in,
            lines_out: compensation.program.len(),
            split: compensation.split,
            corrections: compensation.corrections,
            diagnostics: compensation.diagnostics.clone(),
        }
    }
}

pub fn read_input(path: &Path) -> Result<String, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn is_compensated(program: &Program) -> bool {
    program
        .first()
        .is_some_and(|line| line.as_str().trim_end() == COMPENSATION_MARKER)
}

/// Separate X/Y/I/J words glued to the preceding word.
pub fn normalize_whitespace(program: &mut Program) {
    for line in program.lines_mut() {
        for label in [Label::X, Label::Y, Label::I, Label::J] {
            line.ensure_space_before(label);
        }
    }
}

pub fn insert_preamble(program: &mut Program) {
    let header = std::iter::once(COMPENSATION_MARKER).chain(PREAMBLE);
    for (idx, text) in header.enumerate() {
        program.insert(idx, Line::new(text));
    }
}

/// `<stem>_nobacklash.<ext>` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_nobacklash.{}", ext.to_string_lossy()),
        None => format!("{stem}_nobacklash"),
    };
    input.with_file_name(name)
}

impl Default for CompensationPipeline {
    fn default() -> Self {
        Self {
            config: Config::default(),
            scanner: Scanner::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_detection() {
        let done = Program::from_lines([COMPENSATION_MARKER, "G1 X1"]);
        assert!(is_compensated(&done));

        let crlf = Program::parse(";--+--BACKLASH COMPENSATED--+--\r\nG1 X1\r\n");
        assert!(is_compensated(&crlf));

        let later = Program::from_lines(["G1 X1", COMPENSATION_MARKER]);
        assert!(!is_compensated(&later));
    }

    #[test]
    fn test_preamble_order() {
        let mut program = Program::from_lines(["G1 X1"]);
        insert_preamble(&mut program);
        let texts: Vec<_> = program.lines().iter().map(Line::as_str).collect();
        assert_eq!(
            texts,
            vec![
                ";--+--BACKLASH COMPENSATED--+--",
                "; Zero is defined when driving from negative X/Y to zero X/Y",
                "G90 G17",
                "G0 X-1 Y-1",
                "G0 X0 Y0",
                "G1 X1",
            ]
        );
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/part.nc")),
            PathBuf::from("/tmp/part_nobacklash.nc")
        );
        assert_eq!(
            default_output_path(Path::new("part.tap.gcode")),
            PathBuf::from("part.tap_nobacklash.gcode")
        );
        assert_eq!(
            default_output_path(Path::new("part")),
            PathBuf::from("part_nobacklash")
        );
    }

    #[test]
    fn test_normalize_whitespace() {
        let mut program = Program::from_lines(["G2X1Y2I3J4 F100"]);
        normalize_whitespace(&mut program);
        assert_eq!(program.lines()[0].as_str(), "G2 X1 Y2 I3 J4 F100");
    }

    #[test]
    fn test_config_accessor_returns_validated_config() {
        let pipeline = CompensationPipeline::new(Config::new(0.3, 0.07)).unwrap();
        assert_eq!(*pipeline.config(), Config::new(0.3, 0.07));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = CompensationPipeline::new(Config::new(0.1, f64::NAN));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
