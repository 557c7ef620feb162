//! Directive Scan - Rule/Report Separation
//!
//! Rules flag directives that break the compensation's assumptions
//! (absolute positioning, XY plane, millimeters). Findings are warnings only;
//! they never block processing.

use serde::{Deserialize, Serialize};

use crate::command::Line;
use crate::program::Program;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number in the input program
    pub line: usize,
    pub rule: String,
    pub directive: String,
    pub message: String,
}

/// Directive rule trait - produces diagnostics for one line
pub trait DirectiveRule {
    fn name(&self) -> &'static str;
    fn check(&self, line_number: usize, line: &Line) -> Vec<Diagnostic>;
}

fn flag(
    rule: &dyn DirectiveRule,
    line_number: usize,
    line: &Line,
    codes: &[u32],
    message: &str,
) -> Vec<Diagnostic> {
    line.g_codes()
        .into_iter()
        .filter(|code| codes.contains(code))
        .map(|code| Diagnostic {
            line: line_number,
            rule: rule.name().to_string(),
            directive: format!("G{code}"),
            message: message.to_string(),
        })
        .collect()
}

// --- Concrete Rules ---

pub struct IncrementalPositioningRule;

impl DirectiveRule for IncrementalPositioningRule {
    fn name(&self) -> &'static str { "incremental_positioning" }

    fn check(&self, line_number: usize, line: &Line) -> Vec<Diagnostic> {
        flag(self, line_number, line, &[91], "Incremental positioning; coordinates are treated as absolute")
    }
}

pub struct AlternatePlaneRule;

impl DirectiveRule for AlternatePlaneRule {
    fn name(&self) -> &'static str { "alternate_plane" }

    fn check(&self, line_number: usize, line: &Line) -> Vec<Diagnostic> {
        flag(self, line_number, line, &[18, 19], "Arc plane other than XY; arcs are split as if in XY")
    }
}

pub struct ImperialUnitsRule;

impl DirectiveRule for ImperialUnitsRule {
    fn name(&self) -> &'static str { "imperial_units" }

    fn check(&self, line_number: usize, line: &Line) -> Vec<Diagnostic> {
        flag(self, line_number, line, &[20], "Inch units; backlash is applied in millimeters")
    }
}

/// Scanner runs every rule over every line
pub struct Scanner {
    rules: Vec<Box<dyn DirectiveRule>>,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(IncrementalPositioningRule),
                Box::new(AlternatePlaneRule),
                Box::new(ImperialUnitsRule),
            ],
        }
    }

    pub fn scan(&self, program: &Program) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];

        for (idx, line) in program.lines().iter().enumerate() {
            for rule in &self.rules {
                diagnostics.extend(rule.check(idx + 1, line));
            }
        }

        diagnostics
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_each_directive_with_line_number() {
        let program = Program::from_lines(["G21 G90", "G91 X1", "G18", "G19 G20", "G1 X2"]);
        let diagnostics = Scanner::new().scan(&program);

        let found: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.line, d.directive.as_str(), d.rule.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (2, "G91", "incremental_positioning"),
                (3, "G18", "alternate_plane"),
                (4, "G19", "alternate_plane"),
                (4, "G20", "imperial_units"),
            ]
        );
    }

    #[test]
    fn test_clean_program_has_no_diagnostics() {
        let program = Program::from_lines(["G90 G17 G21", "G0 X0 Y0", "(G20 in a comment)"]);
        assert!(Scanner::new().scan(&program).is_empty());
    }
}
