//! Backlash Compensation - G-code rewriting for two-axis backlash
//!
//! # Passes
//! 1. Quadrant split: no arc crosses an axis through its own center
//! 2. Backlash compensation: reversals get a take-up move, negative travel is offset
//!
//! A compensated program starts with [`COMPENSATION_MARKER`] and is never
//! processed twice.

pub mod command;
pub mod program;
pub mod quadrant;
pub mod arc_split;
pub mod backlash;
pub mod validation;
pub mod config;
pub mod hashing;
pub mod logging;
pub mod pipeline;

pub use command::{FieldError, Label, Line, MotionMode};
pub use program::{Cursor, LineEnding, LineError, Program};
pub use quadrant::{classify_end, classify_start, crossing_point, Point, Quadrant, Rotation};
pub use arc_split::{ArcSplitter, SplitStats};
pub use backlash::{BacklashCompensator, CorrectionStats, Direction};
pub use validation::{Diagnostic, DirectiveRule, Scanner};
pub use config::{Config, ConfigError};
pub use pipeline::{
    CompensationPipeline, Compensation, CompensationReport, Outcome, PipelineError,
    COMPENSATION_MARKER,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
