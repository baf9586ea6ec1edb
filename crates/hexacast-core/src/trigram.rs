//! The eight trigrams and their 3-bit encoding.
//!
//! Bit 0 is the bottom sub-line, bit 2 the top. A set bit is a yang
//! (solid) line. The mapping is a bijection onto `0..8`, so a trigram can be
//! recovered from any 3-bit value without a fallible path.

use std::fmt;

/// One of the eight three-line primitives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Trigram {
    Heaven,
    Earth,
    Thunder,
    Water,
    Mountain,
    Wind,
    Lake,
    Fire,
}

impl Trigram {
    /// All eight trigrams, in the traditional family order.
    pub const ALL: [Trigram; 8] = [
        Trigram::Heaven,
        Trigram::Earth,
        Trigram::Thunder,
        Trigram::Water,
        Trigram::Mountain,
        Trigram::Wind,
        Trigram::Lake,
        Trigram::Fire,
    ];

    /// The 3-bit representation (bit 0 = bottom line, set = yang).
    pub const fn bits(self) -> u8 {
        match self {
            Trigram::Heaven => 0b111,
            Trigram::Earth => 0b000,
            Trigram::Thunder => 0b001,
            Trigram::Water => 0b010,
            Trigram::Mountain => 0b100,
            Trigram::Wind => 0b110,
            Trigram::Lake => 0b011,
            Trigram::Fire => 0b101,
        }
    }

    /// Decode a trigram from its low three bits. Higher bits are ignored.
    pub const fn from_bits(bits: u8) -> Trigram {
        match bits & 0b111 {
            0b111 => Trigram::Heaven,
            0b000 => Trigram::Earth,
            0b001 => Trigram::Thunder,
            0b010 => Trigram::Water,
            0b100 => Trigram::Mountain,
            0b110 => Trigram::Wind,
            0b011 => Trigram::Lake,
            _ => Trigram::Fire,
        }
    }

    /// Whether the sub-line at `index` (0 = bottom) is yang.
    pub const fn is_yang(self, index: usize) -> bool {
        index < 3 && (self.bits() >> index) & 1 == 1
    }

    /// The natural image, used when naming a hexagram by its trigrams.
    pub const fn image(self) -> &'static str {
        match self {
            Trigram::Heaven => "Heaven",
            Trigram::Earth => "Earth",
            Trigram::Thunder => "Thunder",
            Trigram::Water => "Water",
            Trigram::Mountain => "Mountain",
            Trigram::Wind => "Wind",
            Trigram::Lake => "Lake",
            Trigram::Fire => "Fire",
        }
    }

    /// Romanized trigram name.
    pub const fn pinyin(self) -> &'static str {
        match self {
            Trigram::Heaven => "Qian",
            Trigram::Earth => "Kun",
            Trigram::Thunder => "Zhen",
            Trigram::Water => "Kan",
            Trigram::Mountain => "Gen",
            Trigram::Wind => "Xun",
            Trigram::Lake => "Dui",
            Trigram::Fire => "Li",
        }
    }

    /// Unicode trigram symbol (U+2630 block).
    pub const fn symbol(self) -> char {
        match self {
            Trigram::Heaven => '☰',
            Trigram::Lake => '☱',
            Trigram::Fire => '☲',
            Trigram::Thunder => '☳',
            Trigram::Wind => '☴',
            Trigram::Water => '☵',
            Trigram::Mountain => '☶',
            Trigram::Earth => '☷',
        }
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.image())
    }
}
