//! Arc Splitter
//!
//! Arcs whose start and end fall in different quadrants are cut at the first
//! axis crossing. The remainder is inserted right after the cut and revisited,
//! so an arc spanning several quadrants is peeled one boundary per step.

use serde::Serialize;
use tracing::{debug, info};

use crate::command::{Label, Line};
use crate::config::Config;
use crate::program::{Cursor, LineError, Program};
use crate::quadrant::{classify_end, classify_start, crossing_point, Point, Rotation};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitStats {
    /// Original arcs that needed at least one cut
    pub arcs_split: usize,
    /// Continuation arcs inserted
    pub segments_inserted: usize,
    /// Standalone feed lines inserted to keep the feed rate modal
    pub feed_lines_inserted: usize,
}

pub struct ArcSplitter {
    tolerance: f64,
}

impl ArcSplitter {
    pub fn new(config: &Config) -> Self {
        Self {
            tolerance: config.tolerance,
        }
    }

    pub fn split(&self, program: &mut Program) -> Result<SplitStats, LineError> {
        let mut stats = SplitStats::default();
        let mut position = Point::ORIGIN;
        let mut continuing = false;
        let mut cursor = program.cursor();

        while cursor.current().is_some() {
            let target = Point::new(
                cursor.field(Label::X)?.unwrap_or(position.x),
                cursor.field(Label::Y)?.unwrap_or(position.y),
            );

            match self.split_current(&mut cursor, position, target, &mut stats)? {
                Some(crossing) => {
                    if !continuing {
                        stats.arcs_split += 1;
                    }
                    continuing = true;
                    position = crossing;
                }
                None => {
                    continuing = false;
                    position = target;
                }
            }

            cursor.advance();
        }

        info!(
            arcs = stats.arcs_split,
            segments = stats.segments_inserted,
            "quadrant split complete"
        );
        Ok(stats)
    }

    /// Cut the current line at its first quadrant crossing, if it has one.
    /// Returns the crossing point the tool reaches at the end of the cut.
    fn split_current(
        &self,
        cursor: &mut Cursor<'_>,
        position: Point,
        target: Point,
        stats: &mut SplitStats,
    ) -> Result<Option<Point>, LineError> {
        let Some(rotation) = cursor
            .current()
            .and_then(Line::motion)
            .and_then(Rotation::from_motion)
        else {
            return Ok(None);
        };

        let (i, j) = match (cursor.field(Label::I)?, cursor.field(Label::J)?) {
            (None, None) => return Ok(None),
            (i, j) => (i.unwrap_or(0.0), j.unwrap_or(0.0)),
        };
        let center = position.offset(i, j);
        let radius = i.hypot(j);

        let Some(start) = classify_start(rotation, position, center, self.tolerance) else {
            return Ok(None);
        };
        let end = if target == position {
            Some(start.full_circle_end(rotation))
        } else {
            classify_end(rotation, target, center, self.tolerance)
        };
        let Some(end) = end else {
            return Ok(None);
        };
        if start == end {
            return Ok(None);
        }

        debug!(
            line = cursor.line_number(),
            ?rotation,
            start = start.number(),
            end = end.number(),
            "splitting arc at quadrant boundary"
        );

        if let Some(feed) = cursor.field(Label::F)? {
            cursor.insert_before(Line::new(format!("F{feed:.1}")));
            stats.feed_lines_inserted += 1;
        }

        let crossing = crossing_point(rotation, start, center, radius);
        cursor.replace_current(arc_line(rotation, crossing, i, j));
        cursor.insert_after(arc_line(
            rotation,
            target,
            center.x - crossing.x,
            center.y - crossing.y,
        ));
        stats.segments_inserted += 1;

        Ok(Some(crossing))
    }
}

fn arc_line(rotation: Rotation, end: Point, i: f64, j: f64) -> Line {
    Line::new(format!(
        "{} X{:.3} Y{:.3} I{:.3} J{:.3}",
        rotation.g_word(),
        end.x,
        end.y,
        i,
        j
    ))
}
