//! Comprehensive tests for the SoundFont 2 writer.
//!
//! These tests verify container structure, chunk ordering, the INFO list,
//! sample data packing, and the articulation tables of the pdta list.

use sf2write::hydra::{BAG_RECORD_SIZE, INST_RECORD_SIZE, PHDR_RECORD_SIZE, SHDR_RECORD_SIZE};
use sf2write::modulator::MOD_RECORD_SIZE;
use sf2write::sample::SAMPLE_GAP_POINTS;
use sf2write::{
    Error, GeneratorAmount, GeneratorItem, GeneratorKind, Instrument, InstrumentZone, Preset,
    PresetZone, Sample, SoundFont,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Generate a minimal valid bank: one preset, one instrument, one sample.
fn generate_minimal_sf2() -> Vec<u8> {
    generate_minimal_soundfont().to_bytes().unwrap()
}

fn generate_minimal_soundfont() -> SoundFont {
    let sample = Sample::new("Sine", vec![0i16; 100], 0, 100, 44100, 60, 0);
    let zone = InstrumentZone::with_sample(&sample);
    zone.add_generator(GeneratorItem::key_range(0, 127)).unwrap();

    let instrument = Instrument::new("Sine Wave");
    instrument.add_zone(&zone).unwrap();

    let preset = Preset::new("Sine Lead", 0, 0);
    preset
        .add_zone(&PresetZone::with_instrument(&instrument))
        .unwrap();

    let soundfont = SoundFont::new();
    soundfont.set_bank_name("Test Bank");
    soundfont.add_preset(&preset);
    soundfont
}

/// Extract a little-endian u16 from bytes.
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Extract a little-endian u32 from bytes.
fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Walk the chunks of a list body (after the 4-byte form id), returning
/// (id, payload offset, payload size) triples.
fn walk_chunks(data: &[u8], mut at: usize, end: usize) -> Vec<([u8; 4], usize, usize)> {
    let mut chunks = Vec::new();
    while at < end {
        let id: [u8; 4] = data[at..at + 4].try_into().unwrap();
        let size = read_u32_le(data, at + 4) as usize;
        chunks.push((id, at + 8, size));
        at += 8 + size + size % 2;
    }
    assert_eq!(at, end, "chunk sizes must tile the list exactly");
    chunks
}

/// Locate a sub-chunk of the pdta list; returns (payload offset, size).
fn find_pdta_chunk(sf2: &[u8], id: &[u8; 4]) -> (usize, usize) {
    let lists = walk_chunks(sf2, 12, sf2.len());
    for (list_id, at, size) in lists {
        assert_eq!(&list_id, b"LIST");
        if &sf2[at..at + 4] == b"pdta" {
            for (chunk_id, chunk_at, chunk_size) in walk_chunks(sf2, at + 4, at + size) {
                if &chunk_id == id {
                    return (chunk_at, chunk_size);
                }
            }
        }
    }
    panic!("pdta chunk {:?} not found", String::from_utf8_lossy(id));
}

// =============================================================================
// 1. Container Structure Tests
// =============================================================================

#[test]
fn test_riff_magic() {
    let sf2 = generate_minimal_sf2();
    assert_eq!(&sf2[0..4], b"RIFF", "file must start with 'RIFF'");
    assert_eq!(&sf2[8..12], b"sfbk", "form type must be 'sfbk'");
}

#[test]
fn test_riff_size_field_covers_rest_of_file() {
    let sf2 = generate_minimal_sf2();
    let declared = read_u32_le(&sf2, 4) as usize;
    assert_eq!(declared, sf2.len() - 8);
}

#[test]
fn test_list_order_is_info_sdta_pdta() {
    let sf2 = generate_minimal_sf2();
    let lists = walk_chunks(&sf2, 12, sf2.len());
    assert_eq!(lists.len(), 3);

    let forms: Vec<[u8; 4]> = lists
        .iter()
        .map(|&(_, at, _)| sf2[at..at + 4].try_into().unwrap())
        .collect();
    assert_eq!(forms, vec![*b"INFO", *b"sdta", *b"pdta"]);
    for (id, _, _) in lists {
        assert_eq!(&id, b"LIST");
    }
}

#[test]
fn test_output_is_deterministic() {
    let first = generate_minimal_sf2();
    let second = generate_minimal_sf2();
    assert_eq!(first, second);
}

// =============================================================================
// 2. INFO List Tests
// =============================================================================

#[test]
fn test_info_version_and_engine() {
    let sf2 = generate_minimal_sf2();
    let lists = walk_chunks(&sf2, 12, sf2.len());
    let (_, info_at, info_size) = lists[0];
    assert_eq!(&sf2[info_at..info_at + 4], b"INFO");

    let chunks = walk_chunks(&sf2, info_at + 4, info_at + info_size);
    let (ifil_id, ifil_at, ifil_size) = chunks[0];
    assert_eq!(&ifil_id, b"ifil");
    assert_eq!(ifil_size, 4);
    assert_eq!(read_u16_le(&sf2, ifil_at), 2, "major version");
    assert_eq!(read_u16_le(&sf2, ifil_at + 2), 1, "minor version");

    let (isng_id, isng_at, _) = chunks[1];
    assert_eq!(&isng_id, b"isng");
    assert_eq!(&sf2[isng_at..isng_at + 8], b"EMU8000\0");

    let (inam_id, inam_at, _) = chunks[2];
    assert_eq!(&inam_id, b"INAM");
    assert_eq!(&sf2[inam_at..inam_at + 9], b"Test Bank");
}

// =============================================================================
// 3. Sample Data Tests
// =============================================================================

#[test]
fn test_smpl_chunk_includes_gap() {
    let sf2 = generate_minimal_sf2();
    let lists = walk_chunks(&sf2, 12, sf2.len());
    let (_, sdta_at, sdta_size) = lists[1];
    assert_eq!(&sf2[sdta_at..sdta_at + 4], b"sdta");

    let chunks = walk_chunks(&sf2, sdta_at + 4, sdta_at + sdta_size);
    let (smpl_id, smpl_at, smpl_size) = chunks[0];
    assert_eq!(&smpl_id, b"smpl");
    assert_eq!(smpl_size, (100 + SAMPLE_GAP_POINTS) * 2);
    assert!(sf2[smpl_at..smpl_at + smpl_size].iter().all(|&b| b == 0));
}

#[test]
fn test_shdr_matches_smpl_layout() {
    let soundfont = generate_minimal_soundfont();
    let second = Sample::new("Extra", vec![1i16; 30], 5, 25, 22050, 48, 0);
    soundfont.add_sample(&second);
    let sf2 = soundfont.to_bytes().unwrap();

    let (shdr_at, shdr_size) = find_pdta_chunk(&sf2, b"shdr");
    assert_eq!(shdr_size, 3 * SHDR_RECORD_SIZE);

    // Second sample starts after the first plus the 46-point gap, loop
    // offsets are absolute within the smpl chunk.
    let at = shdr_at + SHDR_RECORD_SIZE;
    assert_eq!(&sf2[at..at + 5], b"Extra");
    let start = (100 + SAMPLE_GAP_POINTS) as u32;
    assert_eq!(read_u32_le(&sf2, at + 20), start);
    assert_eq!(read_u32_le(&sf2, at + 24), start + 30);
    assert_eq!(read_u32_le(&sf2, at + 28), start + 5);
    assert_eq!(read_u32_le(&sf2, at + 32), start + 25);
    assert_eq!(read_u32_le(&sf2, at + 36), 22050);
}

// =============================================================================
// 4. Articulation Table Tests
// =============================================================================

#[test]
fn test_minimal_pdta_record_counts() {
    let sf2 = generate_minimal_sf2();

    let (_, phdr_size) = find_pdta_chunk(&sf2, b"phdr");
    assert_eq!(phdr_size, 2 * PHDR_RECORD_SIZE);
    let (_, inst_size) = find_pdta_chunk(&sf2, b"inst");
    assert_eq!(inst_size, 2 * INST_RECORD_SIZE);
    let (_, shdr_size) = find_pdta_chunk(&sf2, b"shdr");
    assert_eq!(shdr_size, 2 * SHDR_RECORD_SIZE);

    let (_, pbag_size) = find_pdta_chunk(&sf2, b"pbag");
    assert_eq!(pbag_size, 2 * BAG_RECORD_SIZE);
    let (_, ibag_size) = find_pdta_chunk(&sf2, b"ibag");
    assert_eq!(ibag_size, 2 * BAG_RECORD_SIZE);

    // Preset zone: the instrument reference plus the terminator.
    let (_, pgen_size) = find_pdta_chunk(&sf2, b"pgen");
    assert_eq!(pgen_size, 2 * 4);
    // Instrument zone: key range, sample reference, terminator.
    let (_, igen_size) = find_pdta_chunk(&sf2, b"igen");
    assert_eq!(igen_size, 3 * 4);

    let (_, pmod_size) = find_pdta_chunk(&sf2, b"pmod");
    assert_eq!(pmod_size, MOD_RECORD_SIZE);
    let (_, imod_size) = find_pdta_chunk(&sf2, b"imod");
    assert_eq!(imod_size, MOD_RECORD_SIZE);
}

#[test]
fn test_preset_header_fields_and_terminator() {
    let sf2 = generate_minimal_sf2();
    let (phdr_at, _) = find_pdta_chunk(&sf2, b"phdr");

    assert_eq!(&sf2[phdr_at..phdr_at + 9], b"Sine Lead");
    assert_eq!(read_u16_le(&sf2, phdr_at + 20), 0, "preset number");
    assert_eq!(read_u16_le(&sf2, phdr_at + 22), 0, "bank");
    assert_eq!(read_u16_le(&sf2, phdr_at + 24), 0, "first bag index");

    let term = phdr_at + PHDR_RECORD_SIZE;
    assert_eq!(&sf2[term..term + 3], b"EOP");
    assert_eq!(read_u16_le(&sf2, term + 24), 1, "terminal bag index");
}

#[test]
fn test_instrument_header_terminator() {
    let sf2 = generate_minimal_sf2();
    let (inst_at, _) = find_pdta_chunk(&sf2, b"inst");

    assert_eq!(&sf2[inst_at..inst_at + 9], b"Sine Wave");
    assert_eq!(read_u16_le(&sf2, inst_at + 20), 0);

    let term = inst_at + INST_RECORD_SIZE;
    assert_eq!(&sf2[term..term + 3], b"EOI");
    assert_eq!(read_u16_le(&sf2, term + 20), 1);
}

#[test]
fn test_reference_generators_point_at_targets() {
    let sf2 = generate_minimal_sf2();

    let (pgen_at, _) = find_pdta_chunk(&sf2, b"pgen");
    assert_eq!(
        read_u16_le(&sf2, pgen_at),
        GeneratorKind::Instrument.value()
    );
    assert_eq!(read_u16_le(&sf2, pgen_at + 2), 0);

    let (igen_at, _) = find_pdta_chunk(&sf2, b"igen");
    // Key range first, then the sample reference last.
    assert_eq!(read_u16_le(&sf2, igen_at), GeneratorKind::KeyRange.value());
    assert_eq!(&sf2[igen_at + 2..igen_at + 4], &[0, 127]);
    assert_eq!(read_u16_le(&sf2, igen_at + 4), GeneratorKind::SampleId.value());
    assert_eq!(read_u16_le(&sf2, igen_at + 6), 0);
}

#[test]
fn test_bag_count_equals_zone_count_plus_terminator() {
    let sample = Sample::new("S", vec![0i16; 8], 0, 8, 44100, 60, 0);
    let instrument = Instrument::new("I");
    instrument
        .add_zone(&InstrumentZone::with_sample(&sample))
        .unwrap();

    let soundfont = SoundFont::new();
    let mut zones = 0usize;
    for number in 0..4u16 {
        let preset = Preset::new("P", number, 0);
        preset.set_global_zone(&PresetZone::new()).unwrap();
        for _ in 0..=number {
            preset
                .add_zone(&PresetZone::with_instrument(&instrument))
                .unwrap();
        }
        zones += 1 + usize::from(number) + 1;
        soundfont.add_preset(&preset);
    }

    let sf2 = soundfont.to_bytes().unwrap();
    let (_, phdr_size) = find_pdta_chunk(&sf2, b"phdr");
    assert_eq!(phdr_size, 5 * PHDR_RECORD_SIZE);
    let (_, pbag_size) = find_pdta_chunk(&sf2, b"pbag");
    assert_eq!(pbag_size, (zones + 1) * BAG_RECORD_SIZE);
}

#[test]
fn test_global_zone_comes_first_without_reference() {
    let sample = Sample::new("S", vec![0i16; 8], 0, 8, 44100, 60, 0);
    let zone = InstrumentZone::with_sample(&sample);
    let global = InstrumentZone::new();
    global
        .add_generator(GeneratorItem::new(
            GeneratorKind::InitialAttenuation,
            GeneratorAmount::Value(60),
        ))
        .unwrap();

    let instrument = Instrument::new("I");
    instrument.set_global_zone(&global).unwrap();
    instrument.add_zone(&zone).unwrap();
    let preset = Preset::new("P", 0, 0);
    preset
        .add_zone(&PresetZone::with_instrument(&instrument))
        .unwrap();
    let soundfont = SoundFont::new();
    soundfont.add_preset(&preset);

    let sf2 = soundfont.to_bytes().unwrap();
    let (igen_at, igen_size) = find_pdta_chunk(&sf2, b"igen");

    // Global attenuation, then the sample reference, then the terminator.
    assert_eq!(igen_size, 3 * 4);
    assert_eq!(
        read_u16_le(&sf2, igen_at),
        GeneratorKind::InitialAttenuation.value()
    );
    assert_eq!(read_u16_le(&sf2, igen_at + 4), GeneratorKind::SampleId.value());

    // The global zone's bag holds no reference generator; the second bag
    // starts after the single global generator.
    let (ibag_at, ibag_size) = find_pdta_chunk(&sf2, b"ibag");
    assert_eq!(ibag_size, 3 * BAG_RECORD_SIZE);
    assert_eq!(read_u16_le(&sf2, ibag_at), 0);
    assert_eq!(read_u16_le(&sf2, ibag_at + 4), 1);
    assert_eq!(read_u16_le(&sf2, ibag_at + 8), 2);
}

// =============================================================================
// 5. Validation Tests
// =============================================================================

#[test]
fn test_empty_file_rejected() {
    let soundfont = SoundFont::new();
    assert!(matches!(
        soundfont.to_bytes().unwrap_err(),
        Error::EmptyCollection("presets")
    ));
}

#[test]
fn test_preset_without_instrument_rejected() {
    let soundfont = SoundFont::new();
    soundfont.add_preset(&Preset::new("P", 0, 0));
    assert!(matches!(
        soundfont.to_bytes().unwrap_err(),
        Error::EmptyCollection("instruments")
    ));
}

#[test]
fn test_bag_index_overflow_rejected() {
    // The bag tables index with 16-bit fields; one more zone than the
    // terminator can point at must fail the write with a capacity error.
    let sample = Sample::new("S", vec![0i16; 8], 0, 8, 44100, 60, 0);
    let instrument = Instrument::new("I");
    instrument
        .add_zone(&InstrumentZone::with_sample(&sample))
        .unwrap();
    let preset = Preset::new("P", 0, 0);
    for _ in 0..=u16::MAX as usize {
        preset.add_zone(&PresetZone::new()).unwrap();
    }

    let soundfont = SoundFont::new();
    soundfont.add_preset(&preset);
    soundfont.add_instrument(&instrument);

    let err = soundfont.to_bytes().unwrap_err();
    assert!(matches!(
        err,
        Error::CapacityExceeded {
            what: "preset bag records",
            ..
        }
    ));
}

#[test]
fn test_long_names_truncate_to_twenty_bytes() {
    let sample = Sample::new(
        "A sample whose name is much longer than the field",
        vec![0i16; 8],
        0,
        8,
        44100,
        60,
        0,
    );
    let instrument = Instrument::new("I");
    instrument
        .add_zone(&InstrumentZone::with_sample(&sample))
        .unwrap();
    let preset = Preset::new("P", 0, 0);
    preset
        .add_zone(&PresetZone::with_instrument(&instrument))
        .unwrap();
    let soundfont = SoundFont::new();
    soundfont.add_preset(&preset);

    let sf2 = soundfont.to_bytes().unwrap();
    let (shdr_at, _) = find_pdta_chunk(&sf2, b"shdr");
    // 19 name bytes, then the terminating zero of the 20-byte field.
    assert_eq!(&sf2[shdr_at..shdr_at + 20], b"A sample whose name\0");
}
