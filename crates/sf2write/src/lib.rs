//! sf2write - Write-Only SoundFont 2 (.sf2) Bank Builder
//!
//! This crate builds SoundFont 2 instrument banks in memory and serializes
//! them to the RIFF-based .sf2 container. It is write-only: there is no
//! parser, only a builder API and a byte-exact writer.
//!
//! # Features
//!
//! - **Entity graph**: presets, instruments and samples as shared handles
//!   with exclusive zone ownership and automatic registration cascades
//! - **Articulation**: generator and modulator lists with the format's
//!   canonical ordering and duplicate rules enforced at insertion
//! - **Deterministic output**: entities are written in registration order,
//!   so the same build sequence produces byte-identical files
//!
//! # Example
//!
//! ```
//! use sf2write::{GeneratorItem, Instrument, InstrumentZone, Preset, PresetZone, Sample,
//!     SoundFont};
//!
//! // A sample, an instrument playing it, and a preset selecting the
//! // instrument.
//! let sample = Sample::new("Sine", vec![0i16; 64], 0, 64, 44100, 60, 0);
//! let zone = InstrumentZone::with_sample(&sample);
//! zone.add_generator(GeneratorItem::key_range(0, 127))?;
//!
//! let instrument = Instrument::new("Sine Wave");
//! instrument.add_zone(&zone)?;
//!
//! let preset = Preset::new("Sine Lead", 0, 0);
//! preset.add_zone(&PresetZone::with_instrument(&instrument))?;
//!
//! // Adding the preset registers the instrument and sample transitively.
//! let soundfont = SoundFont::new();
//! soundfont.set_bank_name("Example Bank");
//! soundfont.add_preset(&preset);
//!
//! let bytes = soundfont.to_bytes()?;
//! assert_eq!(&bytes[0..4], b"RIFF");
//! assert_eq!(&bytes[8..12], b"sfbk");
//! # Ok::<(), sf2write::Error>(())
//! ```
//!
//! # Module Structure
//!
//! - [`generator`]: Generator operators, amounts and list items
//! - [`modulator`]: Modulator sources, transforms and list items
//! - [`zone`]: The generator/modulator bundle shared by both zone kinds
//! - [`sample`]: Sample entities and PCM data packing
//! - [`instrument`]: Instrument entities and instrument zones
//! - [`preset`]: Preset entities and preset zones
//! - [`info`]: Bank metadata (the INFO list)
//! - [`soundfont`]: The file, its registries and the writer
//! - [`hydra`]: The articulation tables of the pdta list
//! - [`riff`]: RIFF chunk envelope writing

pub mod error;
pub mod generator;
pub mod hydra;
pub mod info;
pub mod instrument;
pub mod modulator;
pub mod preset;
pub mod riff;
pub mod sample;
pub mod soundfont;
pub mod zone;

pub use error::Error;
pub use generator::{GeneratorAmount, GeneratorItem, GeneratorKind};
pub use info::{Info, Version};
pub use instrument::{Instrument, InstrumentZone};
pub use modulator::{
    ControllerSource, GeneralController, ModulatorItem, ModulatorSource, SourceDirection,
    SourcePolarity, SourceShape, Transform,
};
pub use preset::{Preset, PresetZone};
pub use sample::{Sample, SampleLink};
pub use soundfont::SoundFont;
pub use zone::Zone;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
