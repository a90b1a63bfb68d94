//! Modulator sources, transforms and list items.
//!
//! A modulator routes a control source, optionally scaled by a second
//! source and a transform, onto a generator's amount.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

use crate::generator::GeneratorKind;

/// Modulator record size on disk.
pub const MOD_RECORD_SIZE: usize = 10;

/// Source descriptor bit layout.
mod source_bits {
    /// Controller index mask (bits 0-6).
    pub const INDEX: u16 = 0x007F;
    /// MIDI continuous controller flag (bit 7).
    pub const MIDI_CC: u16 = 0x0080;
    /// Direction flag (bit 8).
    pub const DIRECTION: u16 = 0x0100;
    /// Polarity flag (bit 9).
    pub const POLARITY: u16 = 0x0200;
    /// Curve shape shift (bits 10-15).
    pub const SHAPE_SHIFT: u16 = 10;
}

/// Controllers from the format's general controller palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GeneralController {
    NoController = 0,
    NoteOnVelocity = 2,
    NoteOnKeyNumber = 3,
    PolyPressure = 10,
    ChannelPressure = 13,
    PitchWheel = 14,
    PitchWheelSensitivity = 16,
    Link = 127,
}

/// The controller feeding a modulator source: either an entry of the
/// general palette or a MIDI continuous controller number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerSource {
    General(GeneralController),
    MidiController(u8),
}

/// Mapping direction of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SourceDirection {
    /// Minimum input maps to minimum output.
    Increase = 0,
    /// Minimum input maps to maximum output.
    Decrease = 1,
}

/// Polarity of the source mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SourcePolarity {
    /// Output range 0 to 1.
    Unipolar = 0,
    /// Output range -1 to 1.
    Bipolar = 1,
}

/// Curve shape of the source mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SourceShape {
    Linear = 0,
    Concave = 1,
    Convex = 2,
    Switch = 3,
}

/// A packed 16-bit modulator source descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModulatorSource {
    controller: ControllerSource,
    direction: SourceDirection,
    polarity: SourcePolarity,
    shape: SourceShape,
}

impl ModulatorSource {
    /// Create a new source descriptor.
    pub fn new(
        controller: ControllerSource,
        direction: SourceDirection,
        polarity: SourcePolarity,
        shape: SourceShape,
    ) -> Self {
        Self {
            controller,
            direction,
            polarity,
            shape,
        }
    }

    /// A source that contributes no modulation (all fields zero).
    pub fn no_controller() -> Self {
        Self::new(
            ControllerSource::General(GeneralController::NoController),
            SourceDirection::Increase,
            SourcePolarity::Unipolar,
            SourceShape::Linear,
        )
    }

    /// The controller of this source.
    pub fn controller(&self) -> ControllerSource {
        self.controller
    }

    /// The direction of this source.
    pub fn direction(&self) -> SourceDirection {
        self.direction
    }

    /// The polarity of this source.
    pub fn polarity(&self) -> SourcePolarity {
        self.polarity
    }

    /// The curve shape of this source.
    pub fn shape(&self) -> SourceShape {
        self.shape
    }

    /// The packed 16-bit on-disk form of this descriptor.
    pub fn bits(&self) -> u16 {
        let (index, cc_flag) = match self.controller {
            ControllerSource::General(c) => (c as u16, 0),
            ControllerSource::MidiController(cc) => (cc as u16, source_bits::MIDI_CC),
        };
        let mut bits = (index & source_bits::INDEX) | cc_flag;
        if self.direction == SourceDirection::Decrease {
            bits |= source_bits::DIRECTION;
        }
        if self.polarity == SourcePolarity::Bipolar {
            bits |= source_bits::POLARITY;
        }
        bits | ((self.shape as u16) << source_bits::SHAPE_SHIFT)
    }
}

/// Transform applied to the modulation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Transform {
    Linear = 0,
    AbsoluteValue = 2,
}

/// One modulator item: a routing from a source onto a generator amount.
///
/// Immutable once constructed. The uniqueness key within a zone is
/// (source, destination, amount source, transform); the amount itself is
/// not part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulatorItem {
    source: ModulatorSource,
    destination: GeneratorKind,
    amount: i16,
    amount_source: ModulatorSource,
    transform: Transform,
}

impl ModulatorItem {
    /// Create a new modulator item.
    pub fn new(
        source: ModulatorSource,
        destination: GeneratorKind,
        amount: i16,
        amount_source: ModulatorSource,
        transform: Transform,
    ) -> Self {
        Self {
            source,
            destination,
            amount,
            amount_source,
            transform,
        }
    }

    /// The source descriptor.
    pub fn source(&self) -> ModulatorSource {
        self.source
    }

    /// The destination generator operator.
    pub fn destination(&self) -> GeneratorKind {
        self.destination
    }

    /// The modulation amount.
    pub fn amount(&self) -> i16 {
        self.amount
    }

    /// The secondary source scaling the amount.
    pub fn amount_source(&self) -> ModulatorSource {
        self.amount_source
    }

    /// The transform applied to the output.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// True when the two items share the uniqueness key.
    pub fn same_key(&self, other: &ModulatorItem) -> bool {
        self.source == other.source
            && self.destination == other.destination
            && self.amount_source == other.amount_source
            && self.transform == other.transform
    }

    /// Write the 10-byte modulator record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.source.bits())?;
        writer.write_u16::<LittleEndian>(self.destination.value())?;
        writer.write_i16::<LittleEndian>(self.amount)?;
        writer.write_u16::<LittleEndian>(self.amount_source.bits())?;
        writer.write_u16::<LittleEndian>(self.transform as u16)?;
        Ok(())
    }
}
