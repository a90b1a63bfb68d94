//! The pdta list: articulation data assembled into the nine fixed-width
//! record tables of the format.
//!
//! Presets and instruments flatten into header, bag, modulator and
//! generator tables linked by cumulative indices: each header points at
//! its first bag, each bag points at its first generator and modulator,
//! and a terminator record closes every table so readers can size the
//! last real entry. Entity cross-references become index-valued
//! generators resolved against the registration order of the file.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::Error;
use crate::generator::{GeneratorAmount, GeneratorItem, GeneratorKind};
use crate::instrument::{Instrument, InstrumentData, InstrumentZone};
use crate::preset::{Preset, PresetZone};
use crate::riff;
use crate::sample::{Sample, SampleData, SAMPLE_GAP_POINTS};
use crate::soundfont::FileData;
use crate::zone::Zone;

/// Preset header record size on disk.
pub const PHDR_RECORD_SIZE: usize = 38;
/// Bag record size on disk (pbag and ibag).
pub const BAG_RECORD_SIZE: usize = 4;
/// Instrument header record size on disk.
pub const INST_RECORD_SIZE: usize = 22;
/// Sample header record size on disk.
pub const SHDR_RECORD_SIZE: usize = 46;

/// Record name of the terminal preset header.
const PRESET_TERMINATOR: &str = "EOP";
/// Record name of the terminal instrument header.
const INSTRUMENT_TERMINATOR: &str = "EOI";
/// Record name of the terminal sample header.
const SAMPLE_TERMINATOR: &str = "EOS";

/// Add to a running u16 table index, rejecting overflow of the on-disk
/// field before anything is written.
fn bump(counter: &mut u16, add: usize, what: &'static str) -> Result<(), Error> {
    let total = u64::from(*counter) + add as u64;
    *counter = u16::try_from(total).map_err(|_| Error::CapacityExceeded { what, count: total })?;
    Ok(())
}

/// The flattened articulation tables of one entity side (preset or
/// instrument): headers are written by the caller, this tracks the bag,
/// generator and modulator tables plus the running indices.
struct ZoneTables {
    bags: Vec<u8>,
    generators: Vec<u8>,
    modulators: Vec<u8>,
    bag_count: u16,
    generator_count: u16,
    modulator_count: u16,
}

impl ZoneTables {
    fn new() -> Self {
        Self {
            bags: Vec::new(),
            generators: Vec::new(),
            modulators: Vec::new(),
            bag_count: 0,
            generator_count: 0,
            modulator_count: 0,
        }
    }

    /// Flatten one zone: a bag record holding the current generator and
    /// modulator totals, the zone's generator items in canonical order,
    /// the cross-reference generator last (when given), then the
    /// modulator items.
    fn push_zone(
        &mut self,
        zone: &Zone,
        reference: Option<GeneratorItem>,
        side: &'static str,
    ) -> Result<(), Error> {
        self.bags.write_u16::<LittleEndian>(self.generator_count)?;
        self.bags.write_u16::<LittleEndian>(self.modulator_count)?;
        bump(&mut self.bag_count, 1, side)?;

        let mut emitted = zone.generators().len();
        for item in zone.generators() {
            item.write(&mut self.generators)?;
        }
        if let Some(reference) = reference {
            reference.write(&mut self.generators)?;
            emitted += 1;
        }
        bump(&mut self.generator_count, emitted, "generator records")?;

        for item in zone.modulators() {
            item.write(&mut self.modulators)?;
        }
        bump(
            &mut self.modulator_count,
            zone.modulators().len(),
            "modulator records",
        )?;
        Ok(())
    }

    /// Close the tables: a terminal bag pointing at the terminal
    /// generator and modulator, then an all-zero record in each.
    fn terminate(&mut self) -> Result<(), Error> {
        self.bags.write_u16::<LittleEndian>(self.generator_count)?;
        self.bags.write_u16::<LittleEndian>(self.modulator_count)?;
        self.generators.extend_from_slice(&[0u8; 4]);
        self.modulators.extend_from_slice(&[0u8; MOD_TERMINATOR_SIZE]);
        Ok(())
    }
}

const MOD_TERMINATOR_SIZE: usize = crate::modulator::MOD_RECORD_SIZE;

fn encode_preset_side(
    presets: &[Preset],
    instrument_index: &HashMap<*const RefCell<InstrumentData>, u16>,
) -> Result<(Vec<u8>, ZoneTables), Error> {
    let mut phdr = Vec::new();
    let mut tables = ZoneTables::new();

    for preset in presets {
        let data = preset.data.borrow();
        phdr.extend_from_slice(&riff::name_field::<20>(&data.name));
        phdr.write_u16::<LittleEndian>(data.preset_number)?;
        phdr.write_u16::<LittleEndian>(data.bank)?;
        phdr.write_u16::<LittleEndian>(tables.bag_count)?;
        phdr.write_u32::<LittleEndian>(data.library)?;
        phdr.write_u32::<LittleEndian>(data.genre)?;
        phdr.write_u32::<LittleEndian>(data.morphology)?;

        if let Some(global) = &data.global_zone {
            let zone = global.data.borrow();
            tables.push_zone(&zone.zone, None, "preset bag records")?;
        }
        for zone in &data.zones {
            let reference = preset_zone_reference(zone, instrument_index);
            let zone = zone.data.borrow();
            tables.push_zone(&zone.zone, reference, "preset bag records")?;
        }
    }

    // Terminal preset header pointing at the terminal bag.
    phdr.extend_from_slice(&riff::name_field::<20>(PRESET_TERMINATOR));
    phdr.write_u16::<LittleEndian>(0)?;
    phdr.write_u16::<LittleEndian>(0)?;
    phdr.write_u16::<LittleEndian>(tables.bag_count)?;
    phdr.write_u32::<LittleEndian>(0)?;
    phdr.write_u32::<LittleEndian>(0)?;
    phdr.write_u32::<LittleEndian>(0)?;
    tables.terminate()?;

    Ok((phdr, tables))
}

/// The instrument generator of a preset zone: present when the
/// referenced instrument is alive and registered. A dead or unregistered
/// reference is silently dropped rather than failing the write.
fn preset_zone_reference(
    zone: &PresetZone,
    instrument_index: &HashMap<*const RefCell<InstrumentData>, u16>,
) -> Option<GeneratorItem> {
    let target = zone.data.borrow().instrument.upgrade()?;
    let index = *instrument_index.get(&Rc::as_ptr(&target))?;
    Some(GeneratorItem::new(
        GeneratorKind::Instrument,
        GeneratorAmount::Index(index),
    ))
}

fn encode_instrument_side(
    instruments: &[Instrument],
    sample_index: &HashMap<*const RefCell<SampleData>, u16>,
) -> Result<(Vec<u8>, ZoneTables), Error> {
    let mut inst = Vec::new();
    let mut tables = ZoneTables::new();

    for instrument in instruments {
        let data = instrument.data.borrow();
        inst.extend_from_slice(&riff::name_field::<20>(&data.name));
        inst.write_u16::<LittleEndian>(tables.bag_count)?;

        if let Some(global) = &data.global_zone {
            let zone = global.data.borrow();
            tables.push_zone(&zone.zone, None, "instrument bag records")?;
        }
        for zone in &data.zones {
            let reference = instrument_zone_reference(zone, sample_index);
            let zone = zone.data.borrow();
            tables.push_zone(&zone.zone, reference, "instrument bag records")?;
        }
    }

    inst.extend_from_slice(&riff::name_field::<20>(INSTRUMENT_TERMINATOR));
    inst.write_u16::<LittleEndian>(tables.bag_count)?;
    tables.terminate()?;

    Ok((inst, tables))
}

/// The sample generator of an instrument zone, mirroring
/// [`preset_zone_reference`].
fn instrument_zone_reference(
    zone: &InstrumentZone,
    sample_index: &HashMap<*const RefCell<SampleData>, u16>,
) -> Option<GeneratorItem> {
    let target = zone.data.borrow().sample.upgrade()?;
    let index = *sample_index.get(&Rc::as_ptr(&target))?;
    Some(GeneratorItem::new(
        GeneratorKind::SampleId,
        GeneratorAmount::Index(index),
    ))
}

/// Encode the shdr table. Start and end offsets are cumulative positions
/// in the smpl chunk, in sample points, including the zero gap written
/// after every sample; loop offsets are absolute within the chunk.
fn encode_shdr(
    samples: &[Sample],
    sample_index: &HashMap<*const RefCell<SampleData>, u16>,
) -> Result<Vec<u8>, Error> {
    let mut shdr = Vec::with_capacity((samples.len() + 1) * SHDR_RECORD_SIZE);
    let mut offset: u64 = 0;

    for sample in samples {
        let data = sample.data.borrow();
        let point = |value: u64| {
            u32::try_from(value).map_err(|_| Error::CapacityExceeded {
                what: "sample data points",
                count: value,
            })
        };
        let end = point(offset + data.data.len() as u64)?;
        let start = offset as u32;
        let loop_start = point(offset + u64::from(data.loop_start))?;
        let loop_end = point(offset + u64::from(data.loop_end))?;

        let link = data
            .link
            .upgrade()
            .and_then(|target| sample_index.get(&Rc::as_ptr(&target)).copied())
            .unwrap_or(0);

        shdr.extend_from_slice(&riff::name_field::<20>(&data.name));
        shdr.write_u32::<LittleEndian>(start)?;
        shdr.write_u32::<LittleEndian>(end)?;
        shdr.write_u32::<LittleEndian>(loop_start)?;
        shdr.write_u32::<LittleEndian>(loop_end)?;
        shdr.write_u32::<LittleEndian>(data.sample_rate)?;
        shdr.write_u8(data.original_key)?;
        shdr.write_i8(data.correction)?;
        shdr.write_u16::<LittleEndian>(link)?;
        shdr.write_u16::<LittleEndian>(data.sample_type as u16)?;

        offset += data.data.len() as u64 + SAMPLE_GAP_POINTS as u64;
    }

    shdr.extend_from_slice(&riff::name_field::<20>(SAMPLE_TERMINATOR));
    shdr.extend_from_slice(&[0u8; SHDR_RECORD_SIZE - 20]);
    Ok(shdr)
}

fn build_instrument_index(
    instruments: &[Instrument],
) -> Result<HashMap<*const RefCell<InstrumentData>, u16>, Error> {
    let mut map = HashMap::with_capacity(instruments.len());
    for (position, instrument) in instruments.iter().enumerate() {
        let index = u16::try_from(position).map_err(|_| Error::CapacityExceeded {
            what: "instrument records",
            count: position as u64,
        })?;
        map.insert(Rc::as_ptr(&instrument.data), index);
    }
    Ok(map)
}

fn build_sample_index(
    samples: &[Sample],
) -> Result<HashMap<*const RefCell<SampleData>, u16>, Error> {
    let mut map = HashMap::with_capacity(samples.len());
    for (position, sample) in samples.iter().enumerate() {
        let index = u16::try_from(position).map_err(|_| Error::CapacityExceeded {
            what: "sample records",
            count: position as u64,
        })?;
        map.insert(Rc::as_ptr(&sample.data), index);
    }
    Ok(map)
}

/// Encode the pdta list body: the form id followed by the nine tables in
/// the order the format fixes.
pub(crate) fn encode_pdta(data: &FileData) -> Result<Vec<u8>, Error> {
    let instrument_index = build_instrument_index(&data.instruments)?;
    let sample_index = build_sample_index(&data.samples)?;

    let (phdr, preset_tables) = encode_preset_side(&data.presets, &instrument_index)?;
    let (inst, instrument_tables) = encode_instrument_side(&data.instruments, &sample_index)?;
    let shdr = encode_shdr(&data.samples, &sample_index)?;

    let mut body = Vec::new();
    body.extend_from_slice(b"pdta");
    riff::write_chunk(&mut body, b"phdr", &phdr)?;
    riff::write_chunk(&mut body, b"pbag", &preset_tables.bags)?;
    riff::write_chunk(&mut body, b"pmod", &preset_tables.modulators)?;
    riff::write_chunk(&mut body, b"pgen", &preset_tables.generators)?;
    riff::write_chunk(&mut body, b"inst", &inst)?;
    riff::write_chunk(&mut body, b"ibag", &instrument_tables.bags)?;
    riff::write_chunk(&mut body, b"imod", &instrument_tables.modulators)?;
    riff::write_chunk(&mut body, b"igen", &instrument_tables.generators)?;
    riff::write_chunk(&mut body, b"shdr", &shdr)?;
    Ok(body)
}
