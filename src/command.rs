//! Command Accessor - labeled numeric fields within a single G-code line
//!
//! Only the code portion of a line is searched: everything after `;` and
//! everything inside `( ... )` is comment text.

use std::fmt;
use thiserror::Error;

/// Field labels the compensation passes read or rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    X,
    Y,
    I,
    J,
    F,
}

impl Label {
    pub fn as_char(self) -> char {
        match self {
            Label::X => 'X',
            Label::Y => 'Y',
            Label::I => 'I',
            Label::J => 'J',
            Label::F => 'F',
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{label} field value {text:?} is not a number")]
    Malformed { label: Label, text: String },
}

/// Motion mode carried explicitly by a line. Lines without one are modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    Rapid,
    Linear,
    ArcClockwise,
    ArcCounterClockwise,
}

impl MotionMode {
    fn from_g_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(MotionMode::Rapid),
            1 => Some(MotionMode::Linear),
            2 => Some(MotionMode::ArcClockwise),
            3 => Some(MotionMode::ArcCounterClockwise),
            _ => None,
        }
    }
}

/// A single program line, stored without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: String,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Value of the first `label` field, `None` when the label is absent.
    pub fn get(&self, label: Label) -> Result<Option<f64>, FieldError> {
        let Some((start, end)) = self.value_span(label) else {
            return Ok(None);
        };
        let text = &self.text[start..end];
        text.parse::<f64>()
            .map(Some)
            .map_err(|_| FieldError::Malformed {
                label,
                text: text.to_string(),
            })
    }

    /// Replace the value of the first `label` field, formatted with 3
    /// decimals. Lines without the label are left unchanged.
    pub fn set(&mut self, label: Label, value: f64) {
        if let Some((start, end)) = self.value_span(label) {
            self.text.replace_range(start..end, &format!("{value:.3}"));
        }
    }

    /// Insert a space before the first `label` when it is glued to the
    /// previous word, e.g. `X1.0Y2.0` becomes `X1.0 Y2.0`.
    pub fn ensure_space_before(&mut self, label: Label) {
        let Some(pos) = find_label(&self.text, label.as_char()) else {
            return;
        };
        let glued = self.text[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace());
        if glued {
            self.text.insert(pos, ' ');
        }
    }

    /// Motion mode named on this line. Rapid wins over linear, linear over
    /// clockwise, clockwise over counterclockwise.
    pub fn motion(&self) -> Option<MotionMode> {
        let codes = self.g_codes();
        [
            MotionMode::Rapid,
            MotionMode::Linear,
            MotionMode::ArcClockwise,
            MotionMode::ArcCounterClockwise,
        ]
        .into_iter()
        .find(|mode| {
            codes
                .iter()
                .any(|&code| MotionMode::from_g_code(code) == Some(*mode))
        })
    }

    /// Integer G words in the code portion, in order of appearance.
    /// `G01` reads as 1; fractional words such as `G91.1` are skipped.
    pub fn g_codes(&self) -> Vec<u32> {
        words(&self.text)
            .into_iter()
            .filter(|(letter, _)| letter.eq_ignore_ascii_case(&'G'))
            .filter_map(|(_, number)| {
                if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
                    number.parse().ok()
                } else {
                    None
                }
            })
            .collect()
    }

    fn value_span(&self, label: Label) -> Option<(usize, usize)> {
        let start = find_label(&self.text, label.as_char())? + 1;
        let end = self.text[start..]
            .find(|c: char| c.is_whitespace() || c == ';' || c == '(')
            .map_or(self.text.len(), |offset| start + offset);
        Some((start, end))
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Line {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Line {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// Byte offset of the first `label` outside comments.
fn find_label(text: &str, label: char) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            ';' if depth == 0 => return None,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if depth == 0 && c == label => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Split the code portion into `(letter, number)` words.
fn words(text: &str) -> Vec<(char, &str)> {
    let mut result = vec![];
    let mut depth = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            ';' if depth == 0 => break,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if depth == 0 && c.is_ascii_alphabetic() => {
                let start = idx + c.len_utf8();
                let mut end = start;
                while let Some(&(next_idx, next)) = chars.peek() {
                    if next.is_ascii_digit() || matches!(next, '.' | '+' | '-') {
                        end = next_idx + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                result.push((c, &text[start..end]));
            }
            _ => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_present_and_absent() {
        let line = Line::new("G1 X10 Y-2.5 F300");
        assert_eq!(line.get(Label::X).unwrap(), Some(10.0));
        assert_eq!(line.get(Label::Y).unwrap(), Some(-2.5));
        assert_eq!(line.get(Label::F).unwrap(), Some(300.0));
        assert_eq!(line.get(Label::I).unwrap(), None);
    }

    #[test]
    fn test_zero_is_distinct_from_absent() {
        let line = Line::new("G2 X0 Y0 I0");
        assert_eq!(line.get(Label::I).unwrap(), Some(0.0));
        assert_eq!(line.get(Label::J).unwrap(), None);
    }

    #[test]
    fn test_malformed_value_is_error() {
        let line = Line::new("G1 Xabc Y1");
        let err = line.get(Label::X).unwrap_err();
        assert_eq!(
            err,
            FieldError::Malformed {
                label: Label::X,
                text: "abc".to_string()
            }
        );

        let empty = Line::new("G1 X Y1");
        assert!(empty.get(Label::X).is_err());
    }

    #[test]
    fn test_comments_are_ignored() {
        let line = Line::new("G1 Y4 (FIX X) ; MAX X");
        assert_eq!(line.get(Label::X).unwrap(), None);
        assert_eq!(line.get(Label::Y).unwrap(), Some(4.0));

        let trailing = Line::new("G1 X2;comment");
        assert_eq!(trailing.get(Label::X).unwrap(), Some(2.0));
    }

    #[test]
    fn test_set_formats_three_decimals() {
        let mut line = Line::new("G1 X10 Y0 F100");
        line.set(Label::X, -10.2);
        assert_eq!(line.as_str(), "G1 X-10.200 Y0 F100");

        line.set(Label::I, 4.0);
        assert_eq!(line.as_str(), "G1 X-10.200 Y0 F100");

        let mut last = Line::new("G1 Y3");
        last.set(Label::Y, 2.955);
        assert_eq!(last.as_str(), "G1 Y2.955");
    }

    #[test]
    fn test_ensure_space_before() {
        let mut line = Line::new("G1X1.0Y2.0");
        line.ensure_space_before(Label::X);
        line.ensure_space_before(Label::Y);
        assert_eq!(line.as_str(), "G1 X1.0 Y2.0");

        let mut spaced = Line::new("G1 X1");
        spaced.ensure_space_before(Label::X);
        assert_eq!(spaced.as_str(), "G1 X1");

        let mut leading = Line::new("X5");
        leading.ensure_space_before(Label::X);
        assert_eq!(leading.as_str(), "X5");
    }

    #[test]
    fn test_motion_long_and_short_forms() {
        assert_eq!(Line::new("G00 X1").motion(), Some(MotionMode::Rapid));
        assert_eq!(Line::new("G0 X1").motion(), Some(MotionMode::Rapid));
        assert_eq!(Line::new("G01 X1").motion(), Some(MotionMode::Linear));
        assert_eq!(Line::new("G2 X1 I1").motion(), Some(MotionMode::ArcClockwise));
        assert_eq!(
            Line::new("G03 X1 J1").motion(),
            Some(MotionMode::ArcCounterClockwise)
        );
        assert_eq!(Line::new("X1 Y2").motion(), None);
        assert_eq!(Line::new("G21").motion(), None);
        assert_eq!(Line::new("G17 G90").motion(), None);
    }

    #[test]
    fn test_g_codes_skip_fractional_and_comments() {
        let line = Line::new("G90 G91.1 G17 (G20)");
        assert_eq!(line.g_codes(), vec![90, 17]);
    }
}
