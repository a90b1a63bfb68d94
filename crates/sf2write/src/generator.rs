//! Generator operators, amounts and list items.
//!
//! A generator is a single synthesis parameter override keyed by a fixed
//! operator enumeration. Zones carry an ordered list of generator items;
//! the format mandates that a key-range item comes first and a
//! velocity-range item second within any zone.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// Generator record size on disk (operator + amount).
pub const GEN_RECORD_SIZE: usize = 4;

/// The generator operator enumeration defined by the SoundFont 2 format.
///
/// The `Unused*` and `Reserved*` placeholders are part of the enumeration
/// and kept so the numeric values line up with the on-disk operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum GeneratorKind {
    StartAddrsOffset = 0,
    EndAddrsOffset = 1,
    StartloopAddrsOffset = 2,
    EndloopAddrsOffset = 3,
    StartAddrsCoarseOffset = 4,
    ModLfoToPitch = 5,
    VibLfoToPitch = 6,
    ModEnvToPitch = 7,
    InitialFilterFc = 8,
    InitialFilterQ = 9,
    ModLfoToFilterFc = 10,
    ModEnvToFilterFc = 11,
    EndAddrsCoarseOffset = 12,
    ModLfoToVolume = 13,
    Unused1 = 14,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    Unused2 = 18,
    Unused3 = 19,
    Unused4 = 20,
    DelayModLfo = 21,
    FreqModLfo = 22,
    DelayVibLfo = 23,
    FreqVibLfo = 24,
    DelayModEnv = 25,
    AttackModEnv = 26,
    HoldModEnv = 27,
    DecayModEnv = 28,
    SustainModEnv = 29,
    ReleaseModEnv = 30,
    KeynumToModEnvHold = 31,
    KeynumToModEnvDecay = 32,
    DelayVolEnv = 33,
    AttackVolEnv = 34,
    HoldVolEnv = 35,
    DecayVolEnv = 36,
    SustainVolEnv = 37,
    ReleaseVolEnv = 38,
    KeynumToVolEnvHold = 39,
    KeynumToVolEnvDecay = 40,
    Instrument = 41,
    Reserved1 = 42,
    KeyRange = 43,
    VelRange = 44,
    StartloopAddrsCoarseOffset = 45,
    Keynum = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    Reserved2 = 49,
    EndloopAddrsCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    Reserved3 = 55,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
    Unused5 = 59,
    EndOper = 60,
}

impl GeneratorKind {
    /// The on-disk operator value.
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Returns true for the operators that are synthesized from a zone's
    /// cross-reference at assembly time and never stored in a zone's list.
    pub fn is_reference(self) -> bool {
        matches!(self, GeneratorKind::Instrument | GeneratorKind::SampleId)
    }
}

/// The 16-bit generator amount.
///
/// The format stores a two-byte field whose interpretation depends on the
/// operator: a signed value, an unsigned index, or a low/high byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorAmount {
    /// Signed 16-bit value.
    Value(i16),
    /// Unsigned 16-bit index (instrument or sample references).
    Index(u16),
    /// Byte range, low bound first.
    Range { low: u8, high: u8 },
}

impl GeneratorAmount {
    /// The two little-endian bytes of the amount field.
    pub fn to_le_bytes(self) -> [u8; 2] {
        match self {
            GeneratorAmount::Value(v) => v.to_le_bytes(),
            GeneratorAmount::Index(v) => v.to_le_bytes(),
            GeneratorAmount::Range { low, high } => [low, high],
        }
    }
}

/// One generator item: an operator plus its amount.
///
/// Immutable once constructed; zones compare items by operator for
/// duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorItem {
    kind: GeneratorKind,
    amount: GeneratorAmount,
}

impl GeneratorItem {
    /// Create a new generator item.
    pub fn new(kind: GeneratorKind, amount: GeneratorAmount) -> Self {
        Self { kind, amount }
    }

    /// Create a key-range item (the item the format requires first in a zone).
    pub fn key_range(low: u8, high: u8) -> Self {
        Self::new(GeneratorKind::KeyRange, GeneratorAmount::Range { low, high })
    }

    /// Create a velocity-range item.
    pub fn vel_range(low: u8, high: u8) -> Self {
        Self::new(GeneratorKind::VelRange, GeneratorAmount::Range { low, high })
    }

    /// The operator of this item.
    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }

    /// The amount of this item.
    pub fn amount(&self) -> GeneratorAmount {
        self.amount
    }

    /// Write the 4-byte generator record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.kind.value())?;
        writer.write_all(&self.amount.to_le_bytes())?;
        Ok(())
    }
}
