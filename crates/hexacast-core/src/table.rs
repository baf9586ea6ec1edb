//! The 64-entry hexagram table.
//!
//! The table is generated once from the eight trigrams by an exhaustive
//! cross-product. Each (upper, lower) pair yields a 6-bit [`HexagramKey`]
//! and the traditional (King Wen) ordinal for that pair. Construction checks
//! that both keys and ordinals form a bijection onto 64 slots, so a lookup by
//! key can never miss at runtime.

use std::fmt;
use std::sync::OnceLock;

use crate::trigram::Trigram;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Defects detected while building the table, or a raw key out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("hexagram key {0} is outside the 6-bit key space")]
    KeyOutOfRange(u8),

    #[error("hexagram ordinal {0} is outside 1..=64")]
    OrdinalOutOfRange(u8),

    #[error("hexagram ordinal {0} assigned to more than one trigram pair")]
    DuplicateOrdinal(u8),

    #[error("hexagram key {0} produced by more than one trigram pair")]
    DuplicateKey(HexagramKey),

    #[error("no hexagram generated for key {0:06b}")]
    MissingKey(u8),
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A 6-bit hexagram key: upper trigram bits in 5..3, lower trigram in 2..0.
///
/// Equivalently, bit `i` is the polarity of line `i` counted from the
/// bottom, set for yang.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct HexagramKey(u8);

impl HexagramKey {
    /// Number of distinct keys.
    pub const COUNT: usize = 64;

    const MASK: u8 = 0b11_1111;

    /// Concatenate the upper and lower trigram bits.
    pub const fn from_trigrams(upper: Trigram, lower: Trigram) -> Self {
        Self((upper.bits() << 3) | lower.bits())
    }

    /// Build a key from per-line polarities, index 0 at the bottom.
    pub fn from_polarities(yang: [bool; 6]) -> Self {
        let bits = yang
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &is_yang)| acc | ((is_yang as u8) << i));
        Self(bits)
    }

    /// Raw 6-bit value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Trigram formed by lines 3..=5.
    pub const fn upper(self) -> Trigram {
        Trigram::from_bits(self.0 >> 3)
    }

    /// Trigram formed by lines 0..=2.
    pub const fn lower(self) -> Trigram {
        Trigram::from_bits(self.0)
    }

    /// Whether line `index` (0 = bottom) is yang.
    pub const fn is_yang(self, index: usize) -> bool {
        index < 6 && (self.0 >> index) & 1 == 1
    }

    /// Flip the polarity of every line whose bit is set in `mask`.
    pub const fn flip(self, mask: u8) -> Self {
        Self((self.0 ^ mask) & Self::MASK)
    }

    /// Every key in ascending order.
    pub fn all() -> impl Iterator<Item = HexagramKey> {
        (0..Self::COUNT as u8).map(HexagramKey)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for HexagramKey {
    type Error = TableError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        if raw <= Self::MASK {
            Ok(Self(raw))
        } else {
            Err(TableError::KeyOutOfRange(raw))
        }
    }
}

impl From<HexagramKey> for u8 {
    fn from(key: HexagramKey) -> u8 {
        key.0
    }
}

impl fmt::Display for HexagramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06b}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// One of the 64 canonical hexagrams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexagramDef {
    /// Traditional ordinal, 1..=64.
    pub number: u8,
    /// Romanized name.
    pub pinyin: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Canonical judgment text.
    pub text: &'static str,
    /// Outer trigram, lines 4 to 6.
    pub upper: Trigram,
    /// Inner trigram, lines 1 to 3 counted from the bottom.
    pub lower: Trigram,
}

impl HexagramDef {
    pub fn key(&self) -> HexagramKey {
        HexagramKey::from_trigrams(self.upper, self.lower)
    }

    /// The trigram image, e.g. "Fire over Lake".
    pub fn image(&self) -> String {
        format!("{} over {}", self.upper.image(), self.lower.image())
    }

    /// Unicode hexagram symbol (U+4DC0 block, ordered by ordinal).
    pub fn symbol(&self) -> char {
        char::from_u32(0x4DC0 + u32::from(self.number) - 1).unwrap_or('?')
    }
}

impl fmt::Display for HexagramDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} ({})", self.number, self.name, self.pinyin)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Immutable key -> definition table. Built once, shared process-wide.
#[derive(Debug)]
pub struct HexagramTable {
    by_key: Vec<HexagramDef>,
    key_by_number: [HexagramKey; HexagramKey::COUNT],
}

static TABLE: OnceLock<HexagramTable> = OnceLock::new();

/// The process-wide table.
///
/// Construction failure is a defect in the static data, never a runtime
/// condition, so it panics on first access instead of returning an error.
pub fn table() -> &'static HexagramTable {
    TABLE.get_or_init(|| match HexagramTable::build() {
        Ok(table) => table,
        Err(e) => panic!("hexagram table construction defect: {e}"),
    })
}

impl HexagramTable {
    /// Generate the table from the trigram cross-product, verifying that
    /// keys and ordinals are both bijections onto 64 slots.
    pub fn build() -> Result<Self, TableError> {
        Self::build_from(&KING_WEN)
    }

    fn build_from(ordinals: &[[u8; 8]; 8]) -> Result<Self, TableError> {
        let mut slots: [Option<HexagramDef>; HexagramKey::COUNT] = [const { None }; 64];
        let mut ordinal_taken = [false; HexagramKey::COUNT];

        for (row, &upper) in Trigram::ALL.iter().enumerate() {
            for (col, &lower) in Trigram::ALL.iter().enumerate() {
                let number = ordinals[row][col];
                if !(1..=64).contains(&number) {
                    return Err(TableError::OrdinalOutOfRange(number));
                }
                let taken = &mut ordinal_taken[usize::from(number) - 1];
                if *taken {
                    return Err(TableError::DuplicateOrdinal(number));
                }
                *taken = true;

                let key = HexagramKey::from_trigrams(upper, lower);
                let slot = &mut slots[key.index()];
                if slot.is_some() {
                    return Err(TableError::DuplicateKey(key));
                }
                let (pinyin, name, text) = CANON[usize::from(number) - 1];
                *slot = Some(HexagramDef {
                    number,
                    pinyin,
                    name,
                    text,
                    upper,
                    lower,
                });
            }
        }

        let mut by_key = Vec::with_capacity(HexagramKey::COUNT);
        for (raw, slot) in slots.into_iter().enumerate() {
            by_key.push(slot.ok_or(TableError::MissingKey(raw as u8))?);
        }

        let mut key_by_number = [HexagramKey(0); HexagramKey::COUNT];
        for def in &by_key {
            key_by_number[usize::from(def.number) - 1] = def.key();
        }

        Ok(Self {
            by_key,
            key_by_number,
        })
    }

    /// Look up a key. Total: every key has exactly one definition.
    pub fn get(&self, key: HexagramKey) -> &HexagramDef {
        &self.by_key[key.index()]
    }

    /// Look up by (upper, lower) trigram pair.
    pub fn by_trigrams(&self, upper: Trigram, lower: Trigram) -> &HexagramDef {
        self.get(HexagramKey::from_trigrams(upper, lower))
    }

    /// Look up by traditional ordinal (1..=64).
    pub fn by_number(&self, number: u8) -> Option<&HexagramDef> {
        let idx = usize::from(number).checked_sub(1)?;
        self.key_by_number.get(idx).map(|&key| self.get(key))
    }

    /// All definitions in key order.
    pub fn iter(&self) -> impl Iterator<Item = &HexagramDef> {
        self.by_key.iter()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Static data
// ---------------------------------------------------------------------------

/// Traditional ordinal for each (upper, lower) pair. Rows are the upper
/// trigram and columns the lower, both in [`Trigram::ALL`] order.
const KING_WEN: [[u8; 8]; 8] = [
    // lower: Heaven Earth Thunder Water Mountain Wind Lake Fire
    [1, 12, 25, 6, 33, 44, 10, 13],   // Heaven
    [11, 2, 24, 7, 15, 46, 19, 36],   // Earth
    [34, 16, 51, 40, 62, 32, 54, 55], // Thunder
    [5, 8, 3, 29, 39, 48, 60, 63],    // Water
    [26, 23, 27, 4, 52, 18, 41, 22],  // Mountain
    [9, 20, 42, 59, 53, 57, 61, 37],  // Wind
    [43, 45, 17, 47, 31, 28, 58, 49], // Lake
    [14, 35, 21, 64, 56, 50, 38, 30], // Fire
];

/// (pinyin, name, judgment) indexed by ordinal - 1.
const CANON: [(&str, &str, &str); 64] = [
    ("Qian", "The Creative", "The Creative works sublime success, furthering through perseverance."),
    ("Kun", "The Receptive", "The Receptive brings sublime success, furthering through the perseverance of a mare."),
    ("Zhun", "Difficulty at the Beginning", "Difficulty at the beginning works supreme success. Nothing should be undertaken; it furthers one to appoint helpers."),
    ("Meng", "Youthful Folly", "Youthful folly has success. It is not I who seek the young fool; the young fool seeks me."),
    ("Xu", "Waiting", "Waiting. If you are sincere, you have light and success. Perseverance brings good fortune."),
    ("Song", "Conflict", "Conflict. You are sincere and are being obstructed. A cautious halt halfway brings good fortune."),
    ("Shi", "The Army", "The army needs perseverance and a strong man. Good fortune without blame."),
    ("Bi", "Holding Together", "Holding together brings good fortune. Inquire of the oracle once again whether you possess sublimity, constancy and perseverance."),
    ("Xiao Chu", "The Taming Power of the Small", "The taming power of the small has success. Dense clouds, no rain from our western region."),
    ("Lu", "Treading", "Treading upon the tail of the tiger. It does not bite the man. Success."),
    ("Tai", "Peace", "Peace. The small departs, the great approaches. Good fortune. Success."),
    ("Pi", "Standstill", "Standstill. Evil people do not further the perseverance of the superior man. The great departs; the small approaches."),
    ("Tong Ren", "Fellowship with Men", "Fellowship with men in the open. Success. It furthers one to cross the great water."),
    ("Da You", "Possession in Great Measure", "Possession in great measure. Supreme success."),
    ("Qian", "Modesty", "Modesty creates success. The superior man carries things through."),
    ("Yu", "Enthusiasm", "Enthusiasm. It furthers one to install helpers and to set armies marching."),
    ("Sui", "Following", "Following has supreme success. Perseverance furthers. No blame."),
    ("Gu", "Work on What Has Been Spoiled", "Work on what has been spoiled has supreme success. It furthers one to cross the great water."),
    ("Lin", "Approach", "Approach has supreme success. Perseverance furthers. When the eighth month comes, there will be misfortune."),
    ("Guan", "Contemplation", "Contemplation. The ablution has been made, but not yet the offering. Full of trust they look up to him."),
    ("Shi He", "Biting Through", "Biting through has success. It is favorable to let justice be administered."),
    ("Bi", "Grace", "Grace has success. In small matters it is favorable to undertake something."),
    ("Bo", "Splitting Apart", "Splitting apart. It does not further one to go anywhere."),
    ("Fu", "Return", "Return. Success. Going out and coming in without error. Friends come without blame."),
    ("Wu Wang", "Innocence", "Innocence. Supreme success. Perseverance furthers. If someone is not as he should be, he has misfortune."),
    ("Da Chu", "The Taming Power of the Great", "The taming power of the great. Perseverance furthers. Not eating at home brings good fortune."),
    ("Yi", "The Corners of the Mouth", "The corners of the mouth. Perseverance brings good fortune. Pay heed to the providing of nourishment."),
    ("Da Guo", "Preponderance of the Great", "Preponderance of the great. The ridgepole sags to the breaking point. It furthers one to have somewhere to go."),
    ("Kan", "The Abysmal", "The abysmal repeated. If you are sincere, you have success in your heart, and whatever you do succeeds."),
    ("Li", "The Clinging", "The clinging. Perseverance furthers. It brings success. Care of the cow brings good fortune."),
    ("Xian", "Influence", "Influence. Success. Perseverance furthers. To take a maiden to wife brings good fortune."),
    ("Heng", "Duration", "Duration. Success. No blame. Perseverance furthers. It furthers one to have somewhere to go."),
    ("Dun", "Retreat", "Retreat. Success. In what is small, perseverance furthers."),
    ("Da Zhuang", "The Power of the Great", "The power of the great. Perseverance furthers."),
    ("Jin", "Progress", "Progress. The powerful prince is honored with horses in large numbers."),
    ("Ming Yi", "Darkening of the Light", "Darkening of the light. In adversity it furthers one to be persevering."),
    ("Jia Ren", "The Family", "The family. The perseverance of the woman furthers."),
    ("Kui", "Opposition", "Opposition. In small matters, good fortune."),
    ("Jian", "Obstruction", "Obstruction. The southwest furthers. The northeast does not further. It furthers one to see the great man."),
    ("Xie", "Deliverance", "Deliverance. The southwest furthers. If there is no longer anything where one has to go, return brings good fortune."),
    ("Sun", "Decrease", "Decrease combined with sincerity brings about supreme good fortune without blame."),
    ("Yi", "Increase", "Increase. It furthers one to undertake something. It furthers one to cross the great water."),
    ("Guai", "Breakthrough", "Breakthrough. One must resolutely make the matter known at the court of the king."),
    ("Gou", "Coming to Meet", "Coming to meet. The maiden is powerful. One should not marry such a maiden."),
    ("Cui", "Gathering Together", "Gathering together. Success. The king approaches his temple. It furthers one to see the great man."),
    ("Sheng", "Pushing Upward", "Pushing upward has supreme success. One must see the great man. Fear not."),
    ("Kun", "Oppression", "Oppression. Success. Perseverance. The great man brings about good fortune. No blame."),
    ("Jing", "The Well", "The well. The town may be changed, but the well cannot be changed. It neither decreases nor increases."),
    ("Ge", "Revolution", "Revolution. On your own day you are believed. Supreme success, furthering through perseverance."),
    ("Ding", "The Cauldron", "The cauldron. Supreme good fortune. Success."),
    ("Zhen", "The Arousing", "Shock brings success. Shock comes, oh, oh! Laughing words, ha, ha!"),
    ("Gen", "Keeping Still", "Keeping still. Keeping his back still so that he no longer feels his body. No blame."),
    ("Jian", "Development", "Development. The maiden is given in marriage. Good fortune. Perseverance furthers."),
    ("Gui Mei", "The Marrying Maiden", "The marrying maiden. Undertakings bring misfortune. Nothing that would further."),
    ("Feng", "Abundance", "Abundance has success. The king attains abundance. Be not sad. Be like the sun at midday."),
    ("Lu", "The Wanderer", "The wanderer. Success through smallness. Perseverance brings good fortune to the wanderer."),
    ("Xun", "The Gentle", "The gentle. Success through what is small. It furthers one to have somewhere to go."),
    ("Dui", "The Joyous", "The joyous. Success. Perseverance is favorable."),
    ("Huan", "Dispersion", "Dispersion. Success. The king approaches his temple. It furthers one to cross the great water."),
    ("Jie", "Limitation", "Limitation. Success. Galling limitation must not be persevered in."),
    ("Zhong Fu", "Inner Truth", "Inner truth. Pigs and fishes. Good fortune. It furthers one to cross the great water."),
    ("Xiao Guo", "Preponderance of the Small", "Preponderance of the small. Success. Perseverance furthers. Small things may be done; great things should not be done."),
    ("Ji Ji", "After Completion", "After completion. Success in small matters. Perseverance furthers. At the beginning good fortune, at the end disorder."),
    ("Wei Ji", "Before Completion", "Before completion. Success. But if the little fox, after nearly completing the crossing, gets his tail in the water, there is nothing that would further."),
];
