//! Serializable record of a completed reading.
//!
//! A record stores the thrown line values and what they resolved to. When a
//! record is loaded back it is resolved again from its lines, and the stored
//! hexagram numbers must agree with the fresh resolution.

use crate::line::{InvalidLineValue, LINES_PER_FIGURE, Line, LineValue};
use crate::transform::ResolvedResult;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("line {position}: {source}")]
    InvalidLine {
        position: usize,
        #[source]
        source: InvalidLineValue,
    },

    #[error("stored {field} {stored} does not match the lines, which give {derived}")]
    Mismatch {
        field: &'static str,
        stored: String,
        derived: String,
    },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// A finished reading, flattened to plain values.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReadingRecord {
    /// Line values 6..=9, bottom first.
    pub lines: [u8; LINES_PER_FIGURE],
    /// Which lines were read on a forced settle.
    pub forced: [bool; LINES_PER_FIGURE],
    /// King Wen number of the primary hexagram.
    pub primary: u8,
    /// King Wen number of the transformed hexagram; `None` when no line moved.
    pub transformed: Option<u8>,
    /// Moving positions, 1-based from the bottom.
    pub moving: Vec<u8>,
}

impl ReadingRecord {
    pub fn new(result: &ResolvedResult, forced: [bool; LINES_PER_FIGURE]) -> Self {
        Self {
            lines: (*result.lines()).map(|l| l.value().number()),
            forced,
            primary: result.primary().number,
            transformed: result.transformed().hexagram().map(|d| d.number),
            moving: result.moving_lines().iter().map(|p| p.get()).collect(),
        }
    }

    /// Rebuild the result from the stored lines and check the stored
    /// hexagrams against it.
    pub fn resolve(&self) -> Result<ResolvedResult, RecordError> {
        let mut lines = [Line::new(LineValue::YoungYang); LINES_PER_FIGURE];
        for (i, (&value, slot)) in self.lines.iter().zip(lines.iter_mut()).enumerate() {
            *slot = Line::try_from(value).map_err(|source| RecordError::InvalidLine {
                position: i + 1,
                source,
            })?;
        }

        let result = ResolvedResult::from_lines(lines);
        let derived = Self::new(&result, self.forced);
        if derived.primary != self.primary {
            return Err(mismatch("primary", self.primary, derived.primary));
        }
        if derived.transformed != self.transformed {
            return Err(mismatch(
                "transformed",
                format!("{:?}", self.transformed),
                format!("{:?}", derived.transformed),
            ));
        }
        if derived.moving != self.moving {
            return Err(mismatch(
                "moving",
                format!("{:?}", self.moving),
                format!("{:?}", derived.moving),
            ));
        }
        Ok(result)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        bitcode::serialize(self).map_err(|e| RecordError::Encode(e.to_string()))
    }

    /// Decode and validate.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RecordError> {
        let record: Self =
            bitcode::deserialize(data).map_err(|e| RecordError::Decode(e.to_string()))?;
        record.resolve()?;
        Ok(record)
    }
}

impl From<&ResolvedResult> for ReadingRecord {
    fn from(result: &ResolvedResult) -> Self {
        Self::new(result, [false; LINES_PER_FIGURE])
    }
}

fn mismatch(field: &'static str, stored: impl ToString, derived: impl ToString) -> RecordError {
    RecordError::Mismatch {
        field,
        stored: stored.to_string(),
        derived: derived.to_string(),
    }
}
