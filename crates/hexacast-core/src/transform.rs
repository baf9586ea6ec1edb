//! Primary and transformed hexagrams from six resolved lines.

use crate::line::{LINES_PER_FIGURE, Line, LinePosition};
use crate::table::{HexagramDef, HexagramKey, table};

/// What happened to the figure once its moving lines changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    /// No line was moving; there is no second hexagram.
    Unchanged,
    /// At least one line moved, giving this hexagram.
    Changed(&'static HexagramDef),
}

impl Transformation {
    pub fn hexagram(&self) -> Option<&'static HexagramDef> {
        match *self {
            Transformation::Unchanged => None,
            Transformation::Changed(def) => Some(def),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Transformation::Unchanged)
    }
}

/// The outcome of a complete figure. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResult {
    lines: [Line; LINES_PER_FIGURE],
    primary: &'static HexagramDef,
    transformed: Transformation,
    moving: Vec<LinePosition>,
}

impl ResolvedResult {
    /// Resolve six lines, index 0 at the bottom.
    pub fn from_lines(lines: [Line; LINES_PER_FIGURE]) -> Self {
        let table = table();
        let primary = table.get(primary_key(&lines));
        let mask = moving_mask(&lines);
        let transformed = if mask == 0 {
            Transformation::Unchanged
        } else {
            Transformation::Changed(table.get(primary.key().flip(mask)))
        };
        let moving = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.is_moving())
            .filter_map(|(i, _)| LinePosition::from_index(i))
            .collect();

        Self {
            lines,
            primary,
            transformed,
            moving,
        }
    }

    pub fn lines(&self) -> &[Line; LINES_PER_FIGURE] {
        &self.lines
    }

    pub fn primary(&self) -> &'static HexagramDef {
        self.primary
    }

    pub fn transformed(&self) -> Transformation {
        self.transformed
    }

    /// The transformed hexagram, or the primary when nothing moved.
    pub fn transformed_or_primary(&self) -> &'static HexagramDef {
        self.transformed.hexagram().unwrap_or(self.primary)
    }

    /// Moving line positions, 1-based from the bottom, ascending.
    pub fn moving_lines(&self) -> &[LinePosition] {
        &self.moving
    }
}

/// Key from the lines' polarities as thrown.
pub fn primary_key(lines: &[Line; LINES_PER_FIGURE]) -> HexagramKey {
    HexagramKey::from_polarities((*lines).map(|l| l.polarity().is_yang()))
}

/// Key after every moving line has changed.
pub fn transformed_key(lines: &[Line; LINES_PER_FIGURE]) -> HexagramKey {
    HexagramKey::from_polarities((*lines).map(|l| l.changed_polarity().is_yang()))
}

/// Bit `i` set when line `i` is moving.
pub fn moving_mask(lines: &[Line; LINES_PER_FIGURE]) -> u8 {
    lines
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, l)| acc | ((l.is_moving() as u8) << i))
}
