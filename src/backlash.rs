//! Backlash Compensator
//!
//! Single forward pass over an arc-split program. Each axis tracks the sign of
//! its last travel. A reversal inserts a take-up move ahead of the current
//! line, and while an axis travels negative every literal coordinate on that
//! axis is shifted down by the backlash. I/J offsets are never adjusted.

use serde::Serialize;
use tracing::{debug, info};

use crate::command::{Label, Line};
use crate::config::Config;
use crate::program::{LineError, Program};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorrectionStats {
    pub x_corrections: usize,
    pub y_corrections: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

/// Replay state for one axis.
#[derive(Debug, Clone, Copy)]
struct Axis {
    label: Label,
    backlash: f64,
    position: f64,
    direction: Direction,
    corrections: usize,
}

impl Axis {
    fn new(label: Label, backlash: f64) -> Self {
        Self {
            label,
            backlash,
            position: 0.0,
            direction: Direction::Positive,
            corrections: 0,
        }
    }

    /// Flip direction when travelling to `target` reverses the axis and
    /// return the take-up coordinate to command first.
    fn reverse_towards(&mut self, target: f64) -> Option<f64> {
        let take_up = match self.direction {
            Direction::Positive if target < self.position => {
                self.direction = Direction::Negative;
                self.position - self.backlash
            }
            Direction::Negative if target > self.position => {
                self.direction = Direction::Positive;
                self.position
            }
            _ => return None,
        };
        self.corrections += 1;
        Some(take_up)
    }
}

pub struct BacklashCompensator {
    backlash_x: f64,
    backlash_y: f64,
}

impl BacklashCompensator {
    pub fn new(config: &Config) -> Self {
        Self {
            backlash_x: config.backlash_x,
            backlash_y: config.backlash_y,
        }
    }

    pub fn compensate(&self, program: &mut Program) -> Result<CorrectionStats, LineError> {
        let mut axes = [
            Axis::new(Label::X, self.backlash_x),
            Axis::new(Label::Y, self.backlash_y),
        ];
        let mut cursor = program.cursor();

        while cursor.current().is_some() {
            let mut targets = [0.0; 2];
            for (target, axis) in targets.iter_mut().zip(&axes) {
                *target = cursor.field(axis.label)?.unwrap_or(axis.position);
            }

            for (axis, &target) in axes.iter_mut().zip(&targets) {
                if let Some(take_up) = axis.reverse_towards(target) {
                    debug!(
                        line = cursor.line_number(),
                        axis = %axis.label,
                        direction = ?axis.direction,
                        take_up,
                        "axis reversal"
                    );
                    cursor.insert_before(Line::new(format!("G1 {}{:.3}", axis.label, take_up)));
                }
            }

            for (axis, &target) in axes.iter_mut().zip(&targets) {
                if axis.direction == Direction::Negative {
                    if let Some(line) = cursor.current_mut() {
                        line.set(axis.label, target - axis.backlash);
                    }
                }
                axis.position = target;
            }

            cursor.advance();
        }

        let [x, y] = axes;
        let stats = CorrectionStats {
            x_corrections: x.corrections,
            y_corrections: y.corrections,
        };
        info!(
            x = stats.x_corrections,
            y = stats.y_corrections,
            "backlash compensation complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compensate(config: Config, lines: &[&str]) -> (Vec<String>, CorrectionStats) {
        let mut program = Program::from_lines(lines.iter().copied());
        let stats = BacklashCompensator::new(&config)
            .compensate(&mut program)
            .unwrap();
        let texts = program.lines().iter().map(|l| l.to_string()).collect();
        (texts, stats)
    }

    #[test]
    fn test_x_reversal_inserts_take_up() {
        let (lines, stats) = compensate(Config::new(0.2, 0.0), &["G1 X10 Y0", "G1 X-10 Y0"]);
        assert_eq!(lines, vec!["G1 X10 Y0", "G1 X9.800", "G1 X-10.200 Y0"]);
        assert_eq!(stats, CorrectionStats { x_corrections: 1, y_corrections: 0 });
    }

    #[test]
    fn test_reversal_back_to_positive() {
        let (lines, stats) = compensate(
            Config::new(0.2, 0.1),
            &["G1 X10", "G1 X5", "G1 X2", "G1 X8"],
        );
        assert_eq!(
            lines,
            vec![
                "G1 X10",
                "G1 X9.800",
                "G1 X4.800",
                "G1 X1.800",
                "G1 X2.000",
                "G1 X8",
            ]
        );
        assert_eq!(stats.x_corrections, 2);
    }

    #[test]
    fn test_both_axes_reverse_on_one_line() {
        let (lines, stats) = compensate(
            Config::new(0.2, 0.1),
            &["G1 X10 Y10", "G1 X0 Y0"],
        );
        assert_eq!(
            lines,
            vec!["G1 X10 Y10", "G1 X9.800", "G1 Y9.900", "G1 X-0.200 Y-0.100"]
        );
        assert_eq!(stats, CorrectionStats { x_corrections: 1, y_corrections: 1 });
    }

    #[test]
    fn test_y_reversal_counted_on_y_only() {
        let (lines, stats) = compensate(
            Config::new(0.2, 0.1),
            &["G1 X1 Y5 F200", "G2 X2 Y4 I0 J-1", "F100"],
        );
        assert_eq!(lines, vec!["G1 X1 Y5 F200", "G1 Y4.900", "G2 X2 Y3.900 I0 J-1", "F100"]);
        assert_eq!(stats, CorrectionStats { x_corrections: 0, y_corrections: 1 });
    }

    #[test]
    fn test_modal_axis_keeps_negative_offset() {
        // Y is absent on the third line: no rewrite, no reversal.
        let (lines, _) = compensate(
            Config::new(0.0, 0.5),
            &["G1 Y4", "G1 Y1", "G1 X3", "G1 Y0.5"],
        );
        assert_eq!(
            lines,
            vec!["G1 Y4", "G1 Y3.500", "G1 Y0.500", "G1 X3", "G1 Y0.000"]
        );
    }

    #[test]
    fn test_arc_offsets_are_not_adjusted() {
        let (lines, _) = compensate(
            Config::new(0.2, 0.0),
            &["G1 X10", "G2 X5 Y5 I-5 J0"],
        );
        assert_eq!(lines, vec!["G1 X10", "G1 X9.800", "G2 X4.800 Y5 I-5 J0"]);
    }

    #[test]
    fn test_no_motion_no_insertion() {
        let (lines, stats) = compensate(Config::default(), &["G1 X5", "G1 X5", "F100", "G1 X6"]);
        assert_eq!(lines, vec!["G1 X5", "G1 X5", "F100", "G1 X6"]);
        assert_eq!(stats, CorrectionStats::default());
    }
}
