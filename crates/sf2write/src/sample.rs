//! Sample entities and sample data packing.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::error::Error;
use crate::riff;
use crate::soundfont::FileData;

/// Zero sample points inserted after every sample in the smpl chunk, as
/// the format requires.
pub const SAMPLE_GAP_POINTS: usize = 46;

/// The sample type flag of a sample header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SampleLink {
    Mono = 0x0001,
    Right = 0x0002,
    Left = 0x0004,
    Linked = 0x0008,
    RomMono = 0x8001,
    RomRight = 0x8002,
    RomLeft = 0x8004,
    RomLinked = 0x8008,
}

#[derive(Debug)]
pub(crate) struct SampleData {
    pub(crate) name: String,
    pub(crate) data: Vec<i16>,
    pub(crate) loop_start: u32,
    pub(crate) loop_end: u32,
    pub(crate) sample_rate: u32,
    pub(crate) original_key: u8,
    pub(crate) correction: i8,
    pub(crate) link: Weak<RefCell<SampleData>>,
    pub(crate) sample_type: SampleLink,
    pub(crate) parent_file: Weak<RefCell<FileData>>,
}

/// A sample: a named block of 16-bit PCM data with loop points and pitch
/// information.
///
/// `Sample` is a shared handle; cloning it shares the underlying entity,
/// so many instrument zones can reference one sample. Loop points are in
/// sample points, relative to the sample's own data.
#[derive(Debug, Clone)]
pub struct Sample {
    pub(crate) data: Rc<RefCell<SampleData>>,
}

impl Sample {
    /// Create a new sample.
    pub fn new(
        name: &str,
        data: Vec<i16>,
        loop_start: u32,
        loop_end: u32,
        sample_rate: u32,
        original_key: u8,
        correction: i8,
    ) -> Self {
        Self {
            data: Rc::new(RefCell::new(SampleData {
                name: name.to_string(),
                data,
                loop_start,
                loop_end,
                sample_rate,
                original_key,
                correction,
                link: Weak::new(),
                sample_type: SampleLink::Mono,
                parent_file: Weak::new(),
            })),
        }
    }

    /// The sample name.
    pub fn name(&self) -> Ref<'_, str> {
        Ref::map(self.data.borrow(), |d| d.name.as_str())
    }

    /// Set the sample name.
    pub fn set_name(&self, name: &str) {
        self.data.borrow_mut().name = name.to_string();
    }

    /// The PCM data.
    pub fn pcm(&self) -> Ref<'_, [i16]> {
        Ref::map(self.data.borrow(), |d| d.data.as_slice())
    }

    /// The length of the PCM data in sample points.
    pub fn len(&self) -> usize {
        self.data.borrow().data.len()
    }

    /// True if the sample has no PCM data.
    pub fn is_empty(&self) -> bool {
        self.data.borrow().data.is_empty()
    }

    /// The loop start point.
    pub fn loop_start(&self) -> u32 {
        self.data.borrow().loop_start
    }

    /// The loop end point.
    pub fn loop_end(&self) -> u32 {
        self.data.borrow().loop_end
    }

    /// Set the loop points.
    pub fn set_loop(&self, loop_start: u32, loop_end: u32) {
        let mut data = self.data.borrow_mut();
        data.loop_start = loop_start;
        data.loop_end = loop_end;
    }

    /// The sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.data.borrow().sample_rate
    }

    /// Set the sample rate.
    pub fn set_sample_rate(&self, sample_rate: u32) {
        self.data.borrow_mut().sample_rate = sample_rate;
    }

    /// The MIDI key number of the recorded pitch.
    pub fn original_key(&self) -> u8 {
        self.data.borrow().original_key
    }

    /// Set the original key.
    pub fn set_original_key(&self, original_key: u8) {
        self.data.borrow_mut().original_key = original_key;
    }

    /// The pitch correction in cents.
    pub fn correction(&self) -> i8 {
        self.data.borrow().correction
    }

    /// Set the pitch correction.
    pub fn set_correction(&self, correction: i8) {
        self.data.borrow_mut().correction = correction;
    }

    /// The sample type flag.
    pub fn sample_type(&self) -> SampleLink {
        self.data.borrow().sample_type
    }

    /// True if the linked stereo counterpart is still alive.
    pub fn has_link(&self) -> bool {
        self.data.borrow().link.strong_count() > 0
    }

    /// The linked stereo counterpart, if alive.
    pub fn link(&self) -> Option<Sample> {
        let data = self.data.borrow().link.upgrade()?;
        Some(Sample { data })
    }

    /// Link this sample to its stereo counterpart and set both type flags.
    pub fn set_link(&self, counterpart: &Sample, sample_type: SampleLink) {
        let mut data = self.data.borrow_mut();
        data.link = Rc::downgrade(&counterpart.data);
        data.sample_type = sample_type;
    }

    /// Drop the stereo link and revert to a mono sample.
    pub fn reset_link(&self) {
        let mut data = self.data.borrow_mut();
        data.link = Weak::new();
        data.sample_type = SampleLink::Mono;
    }

    /// True if this sample has been registered in a live file.
    pub fn has_parent_file(&self) -> bool {
        self.data.borrow().parent_file.strong_count() > 0
    }

    /// Handle identity: true when both handles refer to the same entity.
    pub fn handle_eq(&self, other: &Sample) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

/// Encode the sdta list body: the form id plus the smpl chunk with every
/// sample's PCM data followed by the 46-point zero gap.
pub(crate) fn encode_sdta(samples: &[Sample]) -> Result<Vec<u8>, Error> {
    let total_points: u64 = samples
        .iter()
        .map(|s| s.data.borrow().data.len() as u64 + SAMPLE_GAP_POINTS as u64)
        .sum();
    riff::check_chunk_size("smpl chunk bytes", total_points * 2)?;

    let mut smpl = Vec::with_capacity((total_points * 2) as usize);
    for sample in samples {
        let data = sample.data.borrow();
        for &point in &data.data {
            smpl.extend_from_slice(&point.to_le_bytes());
        }
        smpl.extend_from_slice(&[0u8; SAMPLE_GAP_POINTS * 2]);
    }

    let mut body = Vec::with_capacity(smpl.len() + 12);
    body.extend_from_slice(b"sdta");
    riff::write_chunk(&mut body, b"smpl", &smpl)?;
    Ok(body)
}
