//! The SoundFont file: the entity registries and the file writer.

use std::cell::{Ref, RefCell};
use std::io::Write;
use std::rc::{Rc, Weak};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::Error;
use crate::hydra;
use crate::info::Info;
use crate::instrument::Instrument;
use crate::preset::Preset;
use crate::riff;
use crate::sample::{self, Sample};

#[derive(Debug)]
pub(crate) struct FileData {
    pub(crate) info: Info,
    pub(crate) samples: Vec<Sample>,
    pub(crate) instruments: Vec<Instrument>,
    pub(crate) presets: Vec<Preset>,
}

impl FileData {
    /// Register a sample, once. Re-registering a sample already in the
    /// registry is a no-op.
    pub(crate) fn register_sample(this: &Rc<RefCell<FileData>>, sample: &Sample) {
        let already = this
            .borrow()
            .samples
            .iter()
            .any(|existing| existing.handle_eq(sample));
        if already {
            return;
        }
        sample.data.borrow_mut().parent_file = Rc::downgrade(this);
        this.borrow_mut().samples.push(sample.clone());
    }

    /// Register an instrument, once, then cascade to every sample its
    /// zones reference.
    pub(crate) fn register_instrument(this: &Rc<RefCell<FileData>>, instrument: &Instrument) {
        let already = this
            .borrow()
            .instruments
            .iter()
            .any(|existing| existing.handle_eq(instrument));
        if !already {
            instrument.data.borrow_mut().parent_file = Rc::downgrade(this);
            this.borrow_mut().instruments.push(instrument.clone());
        }

        // Cascade even for an already-registered instrument: its zones
        // may have gained samples while the file was not reachable.
        let mut zones = instrument.zones().to_vec();
        if let Some(global) = instrument.global_zone() {
            zones.push(global);
        }
        for zone in zones {
            if let Some(sample) = zone.sample() {
                Self::register_sample(this, &sample);
            }
        }
    }

    /// Register a preset, once, then cascade to every instrument its
    /// zones reference (and from there to their samples).
    pub(crate) fn register_preset(this: &Rc<RefCell<FileData>>, preset: &Preset) {
        let already = this
            .borrow()
            .presets
            .iter()
            .any(|existing| existing.handle_eq(preset));
        if !already {
            preset.data.borrow_mut().parent_file = Rc::downgrade(this);
            this.borrow_mut().presets.push(preset.clone());
        }

        let mut zones = preset.zones().to_vec();
        if let Some(global) = preset.global_zone() {
            zones.push(global);
        }
        for zone in zones {
            if let Some(instrument) = zone.instrument() {
                Self::register_instrument(this, &instrument);
            }
        }
    }
}

/// An in-memory SoundFont 2 bank and its writer.
///
/// The file keeps one registry per entity kind, in registration order.
/// Adding a preset transitively registers the instruments its zones
/// reference, and adding an instrument registers the samples its zones
/// reference, so a bank built top-down needs a single
/// [`SoundFont::add_preset`] call per preset.
///
/// # Example
///
/// ```
/// use sf2write::{
///     GeneratorItem, Instrument, InstrumentZone, Preset, PresetZone, Sample, SoundFont,
/// };
///
/// let sample = Sample::new("Sine", vec![0i16; 64], 0, 64, 44100, 60, 0);
/// let zone = InstrumentZone::with_sample(&sample);
/// zone.add_generator(GeneratorItem::key_range(0, 127))?;
///
/// let instrument = Instrument::new("Sine Wave");
/// instrument.add_zone(&zone)?;
///
/// let preset = Preset::new("Sine Lead", 0, 0);
/// preset.add_zone(&PresetZone::with_instrument(&instrument))?;
///
/// let soundfont = SoundFont::new();
/// soundfont.set_bank_name("Example Bank");
/// soundfont.add_preset(&preset);
///
/// let bytes = soundfont.to_bytes()?;
/// assert_eq!(&bytes[0..4], b"RIFF");
/// # Ok::<(), sf2write::Error>(())
/// ```
#[derive(Debug)]
pub struct SoundFont {
    pub(crate) data: Rc<RefCell<FileData>>,
}

impl Default for SoundFont {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundFont {
    /// Create a new empty file with default metadata.
    pub fn new() -> Self {
        Self {
            data: Rc::new(RefCell::new(FileData {
                info: Info::default(),
                samples: Vec::new(),
                instruments: Vec::new(),
                presets: Vec::new(),
            })),
        }
    }

    /// The bank metadata.
    pub fn info(&self) -> Ref<'_, Info> {
        Ref::map(self.data.borrow(), |d| &d.info)
    }

    /// Replace the bank metadata.
    pub fn set_info(&self, info: Info) {
        self.data.borrow_mut().info = info;
    }

    /// Set the bank name (INAM).
    pub fn set_bank_name(&self, name: &str) {
        self.data.borrow_mut().info.bank_name = name.to_string();
    }

    /// Set the target sound engine (isng).
    pub fn set_sound_engine(&self, engine: &str) {
        self.data.borrow_mut().info.sound_engine = engine.to_string();
    }

    /// Set the comment chunk (ICMT).
    pub fn set_comment(&self, comment: &str) {
        self.data.borrow_mut().info.comment = Some(comment.to_string());
    }

    /// The registered samples, in registration order.
    pub fn samples(&self) -> Ref<'_, [Sample]> {
        Ref::map(self.data.borrow(), |d| d.samples.as_slice())
    }

    /// The registered instruments, in registration order.
    pub fn instruments(&self) -> Ref<'_, [Instrument]> {
        Ref::map(self.data.borrow(), |d| d.instruments.as_slice())
    }

    /// The registered presets, in registration order.
    pub fn presets(&self) -> Ref<'_, [Preset]> {
        Ref::map(self.data.borrow(), |d| d.presets.as_slice())
    }

    /// Register a sample. Registering the same sample twice is a no-op.
    pub fn add_sample(&self, sample: &Sample) {
        FileData::register_sample(&self.data, sample);
    }

    /// Register an instrument and, transitively, the samples its zones
    /// reference.
    pub fn add_instrument(&self, instrument: &Instrument) {
        FileData::register_instrument(&self.data, instrument);
    }

    /// Register a preset and, transitively, the instruments its zones
    /// reference and their samples.
    pub fn add_preset(&self, preset: &Preset) {
        FileData::register_preset(&self.data, preset);
    }

    /// Remove the sample at the given position. Entities referencing it
    /// keep their weak references; those stay resolvable while the caller
    /// holds a handle and go dead with the last one.
    pub fn remove_sample(&self, index: usize) -> Option<Sample> {
        let mut data = self.data.borrow_mut();
        if index >= data.samples.len() {
            return None;
        }
        let sample = data.samples.remove(index);
        sample.data.borrow_mut().parent_file = Weak::new();
        Some(sample)
    }

    /// Remove the instrument at the given position. Its samples stay
    /// registered (removal never cascades).
    pub fn remove_instrument(&self, index: usize) -> Option<Instrument> {
        let mut data = self.data.borrow_mut();
        if index >= data.instruments.len() {
            return None;
        }
        let instrument = data.instruments.remove(index);
        instrument.data.borrow_mut().parent_file = Weak::new();
        Some(instrument)
    }

    /// Remove the preset at the given position. Its instruments stay
    /// registered (removal never cascades).
    pub fn remove_preset(&self, index: usize) -> Option<Preset> {
        let mut data = self.data.borrow_mut();
        if index >= data.presets.len() {
            return None;
        }
        let preset = data.presets.remove(index);
        preset.data.borrow_mut().parent_file = Weak::new();
        Some(preset)
    }

    /// Keep only the presets matched by the predicate.
    pub fn retain_presets<F: FnMut(&Preset) -> bool>(&self, mut predicate: F) {
        let removed: Vec<Preset> = {
            let mut data = self.data.borrow_mut();
            let mut removed = Vec::new();
            data.presets.retain(|preset| {
                if predicate(preset) {
                    true
                } else {
                    removed.push(preset.clone());
                    false
                }
            });
            removed
        };
        for preset in removed {
            preset.data.borrow_mut().parent_file = Weak::new();
        }
    }

    /// Keep only the instruments matched by the predicate.
    pub fn retain_instruments<F: FnMut(&Instrument) -> bool>(&self, mut predicate: F) {
        let removed: Vec<Instrument> = {
            let mut data = self.data.borrow_mut();
            let mut removed = Vec::new();
            data.instruments.retain(|instrument| {
                if predicate(instrument) {
                    true
                } else {
                    removed.push(instrument.clone());
                    false
                }
            });
            removed
        };
        for instrument in removed {
            instrument.data.borrow_mut().parent_file = Weak::new();
        }
    }

    /// Keep only the samples matched by the predicate.
    pub fn retain_samples<F: FnMut(&Sample) -> bool>(&self, mut predicate: F) {
        let removed: Vec<Sample> = {
            let mut data = self.data.borrow_mut();
            let mut removed = Vec::new();
            data.samples.retain(|sample| {
                if predicate(sample) {
                    true
                } else {
                    removed.push(sample.clone());
                    false
                }
            });
            removed
        };
        for sample in removed {
            sample.data.borrow_mut().parent_file = Weak::new();
        }
    }

    /// Remove all presets.
    pub fn clear_presets(&self) {
        self.retain_presets(|_| false);
    }

    /// Remove all instruments.
    pub fn clear_instruments(&self) {
        self.retain_instruments(|_| false);
    }

    /// Remove all samples.
    pub fn clear_samples(&self) {
        self.retain_samples(|_| false);
    }

    /// Serialize the whole bank to the writer.
    ///
    /// Validation happens before any byte is written: a file with no
    /// presets, instruments or samples is rejected, as is any record
    /// count or byte length that would overflow its on-disk field.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        let data = self.data.borrow();
        if data.presets.is_empty() {
            return Err(Error::EmptyCollection("presets"));
        }
        if data.instruments.is_empty() {
            return Err(Error::EmptyCollection("instruments"));
        }
        if data.samples.is_empty() {
            return Err(Error::EmptyCollection("samples"));
        }

        let info_body = data.info.encode()?;
        let sdta_body = sample::encode_sdta(&data.samples)?;
        let pdta_body = hydra::encode_pdta(&data)?;

        let total = 4u64
            + riff::chunk_size_on_disk(info_body.len()) as u64
            + riff::chunk_size_on_disk(sdta_body.len()) as u64
            + riff::chunk_size_on_disk(pdta_body.len()) as u64;
        let total = riff::check_chunk_size("file bytes", total)?;

        writer.write_all(b"RIFF")?;
        writer.write_u32::<LittleEndian>(total)?;
        writer.write_all(b"sfbk")?;
        riff::write_chunk(writer, b"LIST", &info_body)?;
        riff::write_chunk(writer, b"LIST", &sdta_body)?;
        riff::write_chunk(writer, b"LIST", &pdta_body)?;
        Ok(())
    }

    /// Serialize the whole bank to a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentZone;
    use crate::preset::PresetZone;

    fn sample(name: &str) -> Sample {
        Sample::new(name, vec![0i16; 16], 0, 16, 44100, 60, 0)
    }

    #[test]
    fn test_add_preset_cascades() {
        let s = sample("S");
        let instrument = Instrument::new("I");
        instrument
            .add_zone(&InstrumentZone::with_sample(&s))
            .unwrap();
        let preset = Preset::new("P", 0, 0);
        preset
            .add_zone(&PresetZone::with_instrument(&instrument))
            .unwrap();

        let soundfont = SoundFont::new();
        soundfont.add_preset(&preset);

        assert_eq!(soundfont.presets().len(), 1);
        assert_eq!(soundfont.instruments().len(), 1);
        assert_eq!(soundfont.samples().len(), 1);
        assert!(preset.has_parent_file());
        assert!(instrument.has_parent_file());
        assert!(s.has_parent_file());
    }

    #[test]
    fn test_registration_is_idempotent() {
        let s = sample("S");
        let instrument = Instrument::new("I");
        instrument
            .add_zone(&InstrumentZone::with_sample(&s))
            .unwrap();

        let soundfont = SoundFont::new();
        soundfont.add_sample(&s);
        soundfont.add_instrument(&instrument);
        soundfont.add_instrument(&instrument);

        assert_eq!(soundfont.instruments().len(), 1);
        assert_eq!(soundfont.samples().len(), 1);
    }

    #[test]
    fn test_late_zone_registers_sample() {
        let instrument = Instrument::new("I");
        let soundfont = SoundFont::new();
        soundfont.add_instrument(&instrument);

        // Added after the instrument was registered: the cascade runs
        // through the live parent chain.
        let s = sample("Late");
        instrument
            .add_zone(&InstrumentZone::with_sample(&s))
            .unwrap();

        assert_eq!(soundfont.samples().len(), 1);
        assert!(s.has_parent_file());
    }

    #[test]
    fn test_set_sample_on_attached_zone_registers() {
        let instrument = Instrument::new("I");
        let zone = InstrumentZone::new();
        instrument.add_zone(&zone).unwrap();

        let soundfont = SoundFont::new();
        soundfont.add_instrument(&instrument);

        let s = sample("S");
        zone.set_sample(&s);
        assert_eq!(soundfont.samples().len(), 1);
    }

    #[test]
    fn test_remove_resets_parent() {
        let preset = Preset::new("P", 0, 0);
        let soundfont = SoundFont::new();
        soundfont.add_preset(&preset);
        assert!(preset.has_parent_file());

        let removed = soundfont.remove_preset(0).unwrap();
        assert!(removed.handle_eq(&preset));
        assert!(!preset.has_parent_file());
        assert_eq!(soundfont.presets().len(), 0);
    }

    #[test]
    fn test_retain_instruments() {
        let keep = Instrument::new("Keep");
        let drop_inst = Instrument::new("Drop");
        let soundfont = SoundFont::new();
        soundfont.add_instrument(&keep);
        soundfont.add_instrument(&drop_inst);

        soundfont.retain_instruments(|i| i.handle_eq(&keep));
        assert_eq!(soundfont.instruments().len(), 1);
        assert!(!drop_inst.has_parent_file());
        assert!(keep.has_parent_file());

        soundfont.clear_instruments();
        assert_eq!(soundfont.instruments().len(), 0);
        assert!(!keep.has_parent_file());
    }

    #[test]
    fn test_write_empty_file_fails() {
        let soundfont = SoundFont::new();
        let err = soundfont.to_bytes().unwrap_err();
        assert!(matches!(err, Error::EmptyCollection("presets")));
    }
}
