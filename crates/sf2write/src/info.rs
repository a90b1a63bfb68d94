//! Bank metadata: the INFO list of the file.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::Error;
use crate::riff;

/// A SoundFont format version (the ifil and iver chunks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    /// Create a new version.
    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

/// Bank-level metadata written to the INFO list.
///
/// `version`, `sound_engine` and `bank_name` are required by the format
/// and always written; the remaining fields are written only when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    /// Format version (ifil). Defaults to 2.1.
    pub version: Version,
    /// Target sound engine (isng). Defaults to "EMU8000".
    pub sound_engine: String,
    /// Bank name (INAM).
    pub bank_name: String,
    /// Wavetable ROM name (irom).
    pub rom_name: Option<String>,
    /// Wavetable ROM version (iver).
    pub rom_version: Option<Version>,
    /// Creation date (ICRD).
    pub creation_date: Option<String>,
    /// Sound designers and engineers (IENG).
    pub engineers: Option<String>,
    /// Target product (IPRD).
    pub product: Option<String>,
    /// Copyright message (ICOP).
    pub copyright: Option<String>,
    /// Comments (ICMT).
    pub comment: Option<String>,
    /// Creation tool (ISFT).
    pub software: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            version: Version::new(2, 1),
            sound_engine: "EMU8000".to_string(),
            bank_name: String::new(),
            rom_name: None,
            rom_version: None,
            creation_date: None,
            engineers: None,
            product: None,
            copyright: None,
            comment: None,
            software: None,
        }
    }
}

impl Info {
    /// Encode the INFO list body: the form id followed by the sub-chunks,
    /// ifil first as the format requires.
    pub(crate) fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut body = Vec::new();
        body.extend_from_slice(b"INFO");

        let mut ifil = Vec::with_capacity(4);
        ifil.write_u16::<LittleEndian>(self.version.major)?;
        ifil.write_u16::<LittleEndian>(self.version.minor)?;
        riff::write_chunk(&mut body, b"ifil", &ifil)?;

        write_zstr_chunk(&mut body, b"isng", &self.sound_engine)?;
        write_zstr_chunk(&mut body, b"INAM", &self.bank_name)?;

        if let Some(rom_name) = &self.rom_name {
            write_zstr_chunk(&mut body, b"irom", rom_name)?;
        }
        if let Some(rom_version) = self.rom_version {
            let mut iver = Vec::with_capacity(4);
            iver.write_u16::<LittleEndian>(rom_version.major)?;
            iver.write_u16::<LittleEndian>(rom_version.minor)?;
            riff::write_chunk(&mut body, b"iver", &iver)?;
        }
        if let Some(creation_date) = &self.creation_date {
            write_zstr_chunk(&mut body, b"ICRD", creation_date)?;
        }
        if let Some(engineers) = &self.engineers {
            write_zstr_chunk(&mut body, b"IENG", engineers)?;
        }
        if let Some(product) = &self.product {
            write_zstr_chunk(&mut body, b"IPRD", product)?;
        }
        if let Some(copyright) = &self.copyright {
            write_zstr_chunk(&mut body, b"ICOP", copyright)?;
        }
        if let Some(comment) = &self.comment {
            write_zstr_chunk(&mut body, b"ICMT", comment)?;
        }
        if let Some(software) = &self.software {
            write_zstr_chunk(&mut body, b"ISFT", software)?;
        }

        Ok(body)
    }
}

fn write_zstr_chunk(body: &mut Vec<u8>, id: &[u8; 4], text: &str) -> Result<(), Error> {
    let mut payload = Vec::with_capacity(text.len() + 2);
    riff::push_zstr(&mut payload, text);
    riff::write_chunk(body, id, &payload)
}
