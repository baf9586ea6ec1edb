//! Accumulates resolved lines, bottom to top, into a six-line figure.

use std::fmt::Write;

use crate::line::{LINES_PER_FIGURE, Line, LinePosition};
use crate::transform::ResolvedResult;

/// Misuse of a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FigureError {
    #[error("figure already has six lines")]
    Complete,

    #[error("figure has only {lines} of six lines")]
    Incomplete { lines: usize },
}

/// Where a figure is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FigureState {
    Empty,
    /// Between one and five lines.
    Collecting(usize),
    Complete,
}

/// Lines thrown so far, index 0 at the bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexagramFigure {
    lines: Vec<Line>,
}

impl HexagramFigure {
    pub fn new() -> Self {
        Self {
            lines: Vec::with_capacity(LINES_PER_FIGURE),
        }
    }

    /// Record the next line. Rejected, without changing anything, once the
    /// figure holds six lines.
    pub fn add_line(&mut self, line: Line) -> Result<LinePosition, FigureError> {
        let position = LinePosition::from_index(self.lines.len()).ok_or(FigureError::Complete)?;
        self.lines.push(line);
        Ok(position)
    }

    /// Discard every line.
    pub fn reset(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.lines.len() == LINES_PER_FIGURE
    }

    pub fn state(&self) -> FigureState {
        match self.lines.len() {
            0 => FigureState::Empty,
            LINES_PER_FIGURE => FigureState::Complete,
            n => FigureState::Collecting(n),
        }
    }

    /// The six lines, once complete.
    pub fn complete_lines(&self) -> Option<[Line; LINES_PER_FIGURE]> {
        self.lines.as_slice().try_into().ok()
    }

    /// Resolve the complete figure into its hexagrams.
    pub fn resolve(&self) -> Result<ResolvedResult, FigureError> {
        self.complete_lines()
            .map(ResolvedResult::from_lines)
            .ok_or(FigureError::Incomplete {
                lines: self.lines.len(),
            })
    }

    /// Text rendering, top line first, moving lines marked `o` (yang) or
    /// `x` (yin).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate().rev() {
            let _ = writeln!(out, "{} {line}", i + 1);
        }
        out
    }
}
