//! Quadrant Classifier
//!
//! Points are classified relative to a circle center. A component within
//! `tolerance` of zero counts as lying on the axis, and on-axis points are
//! assigned by rotation sense. The start and end tables break those ties in
//! opposite directions: a start point belongs to the quadrant the arc enters,
//! an end point to the quadrant the arc leaves.

use crate::command::MotionMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn from_motion(mode: MotionMode) -> Option<Self> {
        match mode {
            MotionMode::ArcClockwise => Some(Rotation::Clockwise),
            MotionMode::ArcCounterClockwise => Some(Rotation::CounterClockwise),
            MotionMode::Rapid | MotionMode::Linear => None,
        }
    }

    pub fn g_word(self) -> &'static str {
        match self {
            Rotation::Clockwise => "G2",
            Rotation::CounterClockwise => "G3",
        }
    }
}

/// Cartesian quadrant: 1 = +x+y, 2 = -x+y, 3 = -x-y, 4 = +x-y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    First,
    Second,
    Third,
    Fourth,
}

impl Quadrant {
    pub fn number(self) -> u8 {
        match self {
            Quadrant::First => 1,
            Quadrant::Second => 2,
            Quadrant::Third => 3,
            Quadrant::Fourth => 4,
        }
    }

    /// End quadrant of a full circle starting in `self`: `(start % 4) + 1`
    /// clockwise, `((start - 2) % 4) + 1` counterclockwise.
    pub fn full_circle_end(self, rotation: Rotation) -> Self {
        match (rotation, self) {
            (Rotation::Clockwise, Quadrant::First) => Quadrant::Second,
            (Rotation::Clockwise, Quadrant::Second) => Quadrant::Third,
            (Rotation::Clockwise, Quadrant::Third) => Quadrant::Fourth,
            (Rotation::Clockwise, Quadrant::Fourth) => Quadrant::First,
            (Rotation::CounterClockwise, Quadrant::First) => Quadrant::Fourth,
            (Rotation::CounterClockwise, Quadrant::Second) => Quadrant::First,
            (Rotation::CounterClockwise, Quadrant::Third) => Quadrant::Second,
            (Rotation::CounterClockwise, Quadrant::Fourth) => Quadrant::Third,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Positive,
    Negative,
    On,
}

fn side(value: f64, tolerance: f64) -> Side {
    if value > tolerance {
        Side::Positive
    } else if value < -tolerance {
        Side::Negative
    } else {
        Side::On
    }
}

/// Quadrant of an arc's start point. `None` when the point is the center.
pub fn classify_start(
    rotation: Rotation,
    point: Point,
    center: Point,
    tolerance: f64,
) -> Option<Quadrant> {
    use Rotation::{Clockwise as Cw, CounterClockwise as Ccw};
    use Side::{Negative as Neg, On, Positive as Pos};

    let dx = side(point.x - center.x, tolerance);
    let dy = side(point.y - center.y, tolerance);

    let quadrant = match (dx, dy, rotation) {
        (Pos, Pos, _) => Quadrant::First,
        (Pos, Neg, _) => Quadrant::Fourth,
        (Pos, On, Cw) => Quadrant::Fourth,
        (Pos, On, Ccw) => Quadrant::First,
        (Neg, Pos, _) => Quadrant::Second,
        (Neg, Neg, _) => Quadrant::Third,
        (Neg, On, Cw) => Quadrant::Second,
        (Neg, On, Ccw) => Quadrant::Third,
        (On, Pos, Cw) => Quadrant::First,
        (On, Pos, Ccw) => Quadrant::Second,
        (On, Neg, Cw) => Quadrant::Third,
        (On, Neg, Ccw) => Quadrant::Fourth,
        (On, On, _) => return None,
    };
    Some(quadrant)
}

/// Quadrant of an arc's end point. `None` when the point is the center.
pub fn classify_end(
    rotation: Rotation,
    point: Point,
    center: Point,
    tolerance: f64,
) -> Option<Quadrant> {
    use Rotation::{Clockwise as Cw, CounterClockwise as Ccw};
    use Side::{Negative as Neg, On, Positive as Pos};

    let dx = side(point.x - center.x, tolerance);
    let dy = side(point.y - center.y, tolerance);

    let quadrant = match (dx, dy, rotation) {
        (Pos, Pos, _) => Quadrant::First,
        (Pos, Neg, _) => Quadrant::Fourth,
        (Pos, On, Cw) => Quadrant::First,
        (Pos, On, Ccw) => Quadrant::Fourth,
        (Neg, Pos, _) => Quadrant::Second,
        (Neg, Neg, _) => Quadrant::Third,
        (Neg, On, Cw) => Quadrant::Third,
        (Neg, On, Ccw) => Quadrant::Second,
        (On, Pos, Cw) => Quadrant::Second,
        (On, Pos, Ccw) => Quadrant::First,
        (On, Neg, Cw) => Quadrant::Fourth,
        (On, Neg, Ccw) => Quadrant::Third,
        (On, On, _) => return None,
    };
    Some(quadrant)
}

/// Axis-crossing point through which an arc leaves `start` when travelling
/// in `rotation`'s direction.
pub fn crossing_point(rotation: Rotation, start: Quadrant, center: Point, radius: f64) -> Point {
    let Point { x, y } = center;
    match (rotation, start) {
        (Rotation::Clockwise, Quadrant::First) => Point::new(x + radius, y),
        (Rotation::Clockwise, Quadrant::Second) => Point::new(x, y + radius),
        (Rotation::Clockwise, Quadrant::Third) => Point::new(x - radius, y),
        (Rotation::Clockwise, Quadrant::Fourth) => Point::new(x, y - radius),
        (Rotation::CounterClockwise, Quadrant::First) => Point::new(x, y + radius),
        (Rotation::CounterClockwise, Quadrant::Second) => Point::new(x - radius, y),
        (Rotation::CounterClockwise, Quadrant::Third) => Point::new(x, y - radius),
        (Rotation::CounterClockwise, Quadrant::Fourth) => Point::new(x + radius, y),
    }
}
