//! Face outcomes, lines, and the three-coin line resolver.

use std::fmt;

/// Number of coins tossed per line.
pub const COINS_PER_THROW: usize = 3;

/// Number of lines in a complete figure.
pub const LINES_PER_FIGURE: usize = 6;

// ---------------------------------------------------------------------------
// Face outcome
// ---------------------------------------------------------------------------

/// Which face of a settled coin points up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FaceOutcome {
    MarkedFaceUp,
    OtherFaceUp,
}

impl FaceOutcome {
    pub fn is_marked(self) -> bool {
        self == FaceOutcome::MarkedFaceUp
    }
}

// ---------------------------------------------------------------------------
// Polarity & value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Polarity {
    Yin,
    Yang,
}

impl Polarity {
    pub fn flipped(self) -> Polarity {
        match self {
            Polarity::Yin => Polarity::Yang,
            Polarity::Yang => Polarity::Yin,
        }
    }

    pub fn is_yang(self) -> bool {
        self == Polarity::Yang
    }
}

/// A line value outside {6, 7, 8, 9}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("line value {0} is not one of 6, 7, 8, 9")]
pub struct InvalidLineValue(pub u8);

/// The four canonical line values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum LineValue {
    /// 6: moving yin, becomes yang.
    OldYin = 6,
    /// 7: static yang.
    YoungYang = 7,
    /// 8: static yin.
    YoungYin = 8,
    /// 9: moving yang, becomes yin.
    OldYang = 9,
}

impl LineValue {
    pub const fn number(self) -> u8 {
        self as u8
    }

    pub const fn polarity(self) -> Polarity {
        match self {
            LineValue::YoungYang | LineValue::OldYang => Polarity::Yang,
            LineValue::OldYin | LineValue::YoungYin => Polarity::Yin,
        }
    }

    pub const fn is_moving(self) -> bool {
        matches!(self, LineValue::OldYin | LineValue::OldYang)
    }
}

impl TryFrom<u8> for LineValue {
    type Error = InvalidLineValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            6 => Ok(LineValue::OldYin),
            7 => Ok(LineValue::YoungYang),
            8 => Ok(LineValue::YoungYin),
            9 => Ok(LineValue::OldYang),
            other => Err(InvalidLineValue(other)),
        }
    }
}

impl From<LineValue> for u8 {
    fn from(value: LineValue) -> u8 {
        value.number()
    }
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One resolved line. The moving flag is derived from the value, so the two
/// can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Line {
    value: LineValue,
}

impl Line {
    pub const fn new(value: LineValue) -> Self {
        Self { value }
    }

    pub const fn value(self) -> LineValue {
        self.value
    }

    pub const fn is_moving(self) -> bool {
        self.value.is_moving()
    }

    pub const fn polarity(self) -> Polarity {
        self.value.polarity()
    }

    /// Polarity after a moving line has changed. Static lines keep theirs.
    pub fn changed_polarity(self) -> Polarity {
        if self.is_moving() {
            self.polarity().flipped()
        } else {
            self.polarity()
        }
    }
}

impl From<LineValue> for Line {
    fn from(value: LineValue) -> Self {
        Line::new(value)
    }
}

impl TryFrom<u8> for Line {
    type Error = InvalidLineValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        LineValue::try_from(value).map(Line::new)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = match self.value {
            LineValue::OldYin => "━━ ━━ x",
            LineValue::YoungYang => "━━━━━  ",
            LineValue::YoungYin => "━━ ━━  ",
            LineValue::OldYang => "━━━━━ o",
        };
        f.write_str(glyph)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A 1-based line position counted from the bottom (1..=6).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct LinePosition(u8);

impl LinePosition {
    /// Position of the line at 0-based `index`, if it is within a figure.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < LINES_PER_FIGURE).then(|| Self(index as u8 + 1))
    }

    /// 1-based position.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// 0-based index from the bottom.
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl TryFrom<u8> for LinePosition {
    type Error = InvalidLinePosition;

    fn try_from(position: u8) -> Result<Self, Self::Error> {
        if (1..=LINES_PER_FIGURE as u8).contains(&position) {
            Ok(Self(position))
        } else {
            Err(InvalidLinePosition(position))
        }
    }
}

impl From<LinePosition> for u8 {
    fn from(position: LinePosition) -> u8 {
        position.0
    }
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line position outside 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("line position {0} is not within 1..=6")]
pub struct InvalidLinePosition(pub u8);

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolve three face outcomes into a line by counting marked faces.
///
/// | marked | value | moving |
/// |--------|-------|--------|
/// | 3      | 9     | yes    |
/// | 2      | 8     | no     |
/// | 1      | 7     | no     |
/// | 0      | 6     | yes    |
///
/// The match is over every arrangement of three outcomes, so the compiler
/// checks that no count is left unmapped.
pub fn resolve(outcomes: [FaceOutcome; COINS_PER_THROW]) -> Line {
    use FaceOutcome::{MarkedFaceUp as Up, OtherFaceUp as Down};

    let value = match outcomes {
        [Up, Up, Up] => LineValue::OldYang,
        [Up, Up, Down] | [Up, Down, Up] | [Down, Up, Up] => LineValue::YoungYin,
        [Up, Down, Down] | [Down, Up, Down] | [Down, Down, Up] => LineValue::YoungYang,
        [Down, Down, Down] => LineValue::OldYin,
    };
    Line::new(value)
}

/// Number of marked faces among three outcomes.
pub fn marked_count(outcomes: &[FaceOutcome; COINS_PER_THROW]) -> usize {
    outcomes.iter().filter(|o| o.is_marked()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use FaceOutcome::{MarkedFaceUp as Up, OtherFaceUp as Down};

    #[test]
    fn resolver_table() {
        assert_eq!(resolve([Up, Up, Up]).value(), LineValue::OldYang);
        assert_eq!(resolve([Up, Up, Down]).value(), LineValue::YoungYin);
        assert_eq!(resolve([Up, Down, Down]).value(), LineValue::YoungYang);
        assert_eq!(resolve([Down, Down, Down]).value(), LineValue::OldYin);
    }

    #[test]
    fn two_marked_is_static_eight() {
        let line = resolve([Up, Up, Down]);
        assert_eq!(line.value().number(), 8);
        assert!(!line.is_moving());
    }

    #[test]
    fn value_tracks_marked_count() {
        let all = [Up, Down];
        for a in all {
            for b in all {
                for c in all {
                    let outcomes = [a, b, c];
                    let expected = match marked_count(&outcomes) {
                        3 => 9,
                        2 => 8,
                        1 => 7,
                        0 => 6,
                        n => panic!("impossible count {n}"),
                    };
                    assert_eq!(resolve(outcomes).value().number(), expected);
                }
            }
        }
    }

    #[test]
    fn order_of_outcomes_does_not_matter() {
        assert_eq!(resolve([Down, Up, Up]), resolve([Up, Down, Up]));
        assert_eq!(resolve([Down, Down, Up]), resolve([Up, Down, Down]));
    }

    #[test]
    fn moving_values_flip() {
        assert!(Line::new(LineValue::OldYang).is_moving());
        assert!(Line::new(LineValue::OldYin).is_moving());
        assert_eq!(
            Line::new(LineValue::OldYang).changed_polarity(),
            Polarity::Yin
        );
        assert_eq!(
            Line::new(LineValue::OldYin).changed_polarity(),
            Polarity::Yang
        );
        assert_eq!(
            Line::new(LineValue::YoungYang).changed_polarity(),
            Polarity::Yang
        );
    }

    #[test]
    fn line_value_rejects_out_of_range() {
        assert_eq!(LineValue::try_from(5), Err(InvalidLineValue(5)));
        assert_eq!(LineValue::try_from(10), Err(InvalidLineValue(10)));
        for v in 6..=9u8 {
            assert_eq!(LineValue::try_from(v).unwrap().number(), v);
        }
    }

    #[test]
    fn line_position_bounds() {
        assert!(LinePosition::try_from(0).is_err());
        assert!(LinePosition::try_from(7).is_err());
        assert_eq!(LinePosition::from_index(0).unwrap().get(), 1);
        assert_eq!(LinePosition::from_index(5).unwrap().get(), 6);
        assert!(LinePosition::from_index(6).is_none());
    }

    #[test]
    fn line_deserialization_validates_value() {
        let ok: Line = serde_json::from_str(r#"{"value":9}"#).unwrap();
        assert!(ok.is_moving());
        let bad: Result<Line, _> = serde_json::from_str(r#"{"value":4}"#);
        assert!(bad.is_err());
    }
}
