//! Program - ordered, insertable sequence of lines
//!
//! Rewrite passes walk a program through a [`Cursor`]. Lines inserted before
//! the cursor are stepped over; lines inserted after it are visited next.

use thiserror::Error;

use crate::command::{FieldError, Label, Line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A field error tied to the line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {source} in `{text}`")]
pub struct LineError {
    /// 1-based position in the program at the time of the failure
    pub line: usize,
    pub text: String,
    pub source: FieldError,
}

/// Lines plus the terminator each one carried. Only a final line may be
/// unterminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    lines: Vec<Line>,
    endings: Vec<Option<LineEnding>>,
}

impl Program {
    /// Split program text into lines, keeping every line's own terminator.
    pub fn parse(text: &str) -> Self {
        let mut lines = vec![];
        let mut endings = vec![];

        for piece in text.split_inclusive('\n') {
            let (body, ending) = if let Some(body) = piece.strip_suffix("\r\n") {
                (body, Some(LineEnding::CrLf))
            } else if let Some(body) = piece.strip_suffix('\n') {
                (body, Some(LineEnding::Lf))
            } else {
                (piece, None)
            };
            lines.push(Line::new(body));
            endings.push(ending);
        }

        Self { lines, endings }
    }

    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Line>,
    {
        let lines: Vec<Line> = lines.into_iter().map(Into::into).collect();
        let endings = vec![Some(LineEnding::Lf); lines.len()];
        Self { lines, endings }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.lines.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn first(&self) -> Option<&Line> {
        self.lines.first()
    }

    /// Terminator of the line at `index`; `None` for an unterminated last line.
    pub fn ending(&self, index: usize) -> Option<LineEnding> {
        self.endings.get(index).copied().flatten()
    }

    /// The more frequent terminator, LF on a tie.
    pub fn dominant_ending(&self) -> LineEnding {
        let crlf = self
            .endings
            .iter()
            .filter(|e| **e == Some(LineEnding::CrLf))
            .count();
        let lf = self
            .endings
            .iter()
            .filter(|e| **e == Some(LineEnding::Lf))
            .count();
        if crlf > lf {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    /// Insert at `index`. The new line takes its predecessor's terminator, or
    /// the first line's when inserted at the top.
    pub fn insert(&mut self, index: usize, line: Line) {
        let index = index.min(self.lines.len());
        let ending = if index == 0 {
            Some(self.ending(0).unwrap_or_else(|| self.dominant_ending()))
        } else {
            let dominant = self.dominant_ending();
            let previous = &mut self.endings[index - 1];
            // Inserting after an unterminated last line: it gains a terminator
            // and the new line becomes the unterminated one.
            let terminated = previous.unwrap_or(dominant);
            previous.replace(terminated)
        };
        self.lines.insert(index, line);
        self.endings.insert(index, ending);
    }

    pub fn cursor(&mut self) -> Cursor<'_> {
        Cursor {
            program: self,
            index: 0,
        }
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (line, ending) in self.lines.iter().zip(&self.endings) {
            text.push_str(line.as_str());
            if let Some(ending) = ending {
                text.push_str(ending.as_str());
            }
        }
        text
    }
}

/// Forward cursor over a program that tolerates insertion while walking.
pub struct Cursor<'a> {
    program: &'a mut Program,
    index: usize,
}

impl Cursor<'_> {
    pub fn current(&self) -> Option<&Line> {
        self.program.lines.get(self.index)
    }

    pub fn current_mut(&mut self) -> Option<&mut Line> {
        self.program.lines.get_mut(self.index)
    }

    /// 1-based line number of the current line.
    pub fn line_number(&self) -> usize {
        self.index + 1
    }

    /// Read a field of the current line; absent when past the end.
    pub fn field(&self, label: Label) -> Result<Option<f64>, LineError> {
        let Some(line) = self.current() else {
            return Ok(None);
        };
        line.get(label).map_err(|source| LineError {
            line: self.line_number(),
            text: line.as_str().to_string(),
            source,
        })
    }

    pub fn replace_current(&mut self, line: Line) {
        if let Some(current) = self.current_mut() {
            *current = line;
        }
    }

    /// Insert ahead of the current line; the cursor stays on the same line.
    pub fn insert_before(&mut self, line: Line) {
        self.program.insert(self.index, line);
        self.index += 1;
    }

    /// Insert behind the current line; it becomes the next line visited.
    pub fn insert_after(&mut self, line: Line) {
        self.program.insert(self.index + 1, line);
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_line_endings() {
        let lf = Program::parse("G0 X1\nG1 Y2\n");
        assert_eq!(lf.len(), 2);
        assert_eq!(lf.to_text(), "G0 X1\nG1 Y2\n");

        let crlf = Program::parse("G0 X1\r\nG1 Y2\r\n");
        assert_eq!(crlf.dominant_ending(), LineEnding::CrLf);
        assert_eq!(crlf.lines()[1].as_str(), "G1 Y2");
        assert_eq!(crlf.to_text(), "G0 X1\r\nG1 Y2\r\n");

        let bare = Program::parse("G0 X1\nG1 Y2");
        assert_eq!(bare.to_text(), "G0 X1\nG1 Y2");

        let mixed = Program::parse("G1 X1\nG1 X2\r\nG1 X3\n");
        assert_eq!(mixed.dominant_ending(), LineEnding::Lf);
        assert_eq!(mixed.ending(1), Some(LineEnding::CrLf));
        assert_eq!(mixed.to_text(), "G1 X1\nG1 X2\r\nG1 X3\n");
    }

    #[test]
    fn test_inserted_line_takes_predecessor_ending() {
        let mut program = Program::parse("A\r\nB\nC\n");
        program.insert(1, Line::new("after A"));
        program.insert(3, Line::new("after B"));
        program.insert(0, Line::new("top"));
        assert_eq!(
            program.to_text(),
            "top\r\nA\r\nafter A\r\nB\nafter B\nC\n"
        );
    }

    #[test]
    fn test_insert_after_unterminated_last_line() {
        let mut program = Program::parse("A\r\nB\r\nC");
        let mut cursor = program.cursor();
        cursor.advance();
        cursor.advance();
        cursor.insert_after(Line::new("D"));
        assert_eq!(program.to_text(), "A\r\nB\r\nC\r\nD");
    }

    #[test]
    fn test_cursor_insert_before_keeps_current() {
        let mut program = Program::from_lines(["A", "B"]);
        let mut cursor = program.cursor();
        cursor.advance();
        cursor.insert_before(Line::new("inserted"));
        assert_eq!(cursor.current().map(Line::as_str), Some("B"));
        assert_eq!(cursor.line_number(), 3);

        let texts: Vec<_> = program.lines().iter().map(Line::as_str).collect();
        assert_eq!(texts, vec!["A", "inserted", "B"]);
    }

    #[test]
    fn test_cursor_insert_after_is_visited_next() {
        let mut program = Program::from_lines(["A", "B"]);
        let mut cursor = program.cursor();
        cursor.insert_after(Line::new("next"));
        cursor.advance();
        assert_eq!(cursor.current().map(Line::as_str), Some("next"));
        cursor.advance();
        assert_eq!(cursor.current().map(Line::as_str), Some("B"));
        cursor.advance();
        assert!(cursor.current().is_none());
    }

    #[test]
    fn test_field_error_carries_line_number() {
        let mut program = Program::from_lines(["G1 X1", "G1 X?"]);
        let mut cursor = program.cursor();
        cursor.advance();
        let err = cursor.field(Label::X).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.text, "G1 X?");
    }
}
