//! Instrument entities and instrument zones.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::error::Error;
use crate::generator::GeneratorItem;
use crate::modulator::ModulatorItem;
use crate::sample::{Sample, SampleData};
use crate::soundfont::FileData;
use crate::zone::Zone;

#[derive(Debug)]
pub(crate) struct InstrumentZoneData {
    pub(crate) zone: Zone,
    pub(crate) sample: Weak<RefCell<SampleData>>,
    pub(crate) parent: Weak<RefCell<InstrumentData>>,
}

/// An instrument zone: a zone plus a weak, liveness-checked reference to
/// a sample.
///
/// `InstrumentZone` is a shared handle; cloning it shares the underlying
/// zone. A zone is owned by at most one instrument at a time.
#[derive(Debug, Clone)]
pub struct InstrumentZone {
    pub(crate) data: Rc<RefCell<InstrumentZoneData>>,
}

impl Default for InstrumentZone {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrumentZone {
    /// Create a new empty zone with no sample reference.
    pub fn new() -> Self {
        Self {
            data: Rc::new(RefCell::new(InstrumentZoneData {
                zone: Zone::new(),
                sample: Weak::new(),
                parent: Weak::new(),
            })),
        }
    }

    /// Create a new zone referencing the given sample.
    pub fn with_sample(sample: &Sample) -> Self {
        let zone = Self::new();
        zone.data.borrow_mut().sample = Rc::downgrade(&sample.data);
        zone
    }

    /// Add a generator item. See [`Zone::add_generator`].
    pub fn add_generator(&self, item: GeneratorItem) -> Result<(), Error> {
        self.data.borrow_mut().zone.add_generator(item)
    }

    /// The generator items, in canonical order.
    pub fn generators(&self) -> Ref<'_, [GeneratorItem]> {
        Ref::map(self.data.borrow(), |d| d.zone.generators())
    }

    /// Add a modulator item. See [`Zone::add_modulator`].
    pub fn add_modulator(&self, item: ModulatorItem) -> Result<(), Error> {
        self.data.borrow_mut().zone.add_modulator(item)
    }

    /// The modulator items, in insertion order.
    pub fn modulators(&self) -> Ref<'_, [ModulatorItem]> {
        Ref::map(self.data.borrow(), |d| d.zone.modulators())
    }

    /// True if the referenced sample is still alive.
    pub fn has_sample(&self) -> bool {
        self.data.borrow().sample.strong_count() > 0
    }

    /// The referenced sample, if alive.
    pub fn sample(&self) -> Option<Sample> {
        let data = self.data.borrow().sample.upgrade()?;
        Some(Sample { data })
    }

    /// Set the referenced sample.
    ///
    /// If this zone is reachable from a live file through its parent
    /// instrument, the sample is registered in that file's sample
    /// registry as a side effect.
    pub fn set_sample(&self, sample: &Sample) {
        if let Some(file) = self.parent_file_data() {
            FileData::register_sample(&file, sample);
        }
        self.data.borrow_mut().sample = Rc::downgrade(&sample.data);
    }

    /// Drop the sample reference.
    pub fn reset_sample(&self) {
        self.data.borrow_mut().sample = Weak::new();
    }

    /// The owning instrument, if alive.
    pub fn parent_instrument(&self) -> Option<Instrument> {
        let data = self.data.borrow().parent.upgrade()?;
        Some(Instrument { data })
    }

    /// True if the parent chain (zone to instrument to file) is alive.
    pub fn has_parent_file(&self) -> bool {
        self.parent_file_data().is_some()
    }

    /// Handle identity: true when both handles refer to the same zone.
    pub fn handle_eq(&self, other: &InstrumentZone) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    fn parent_file_data(&self) -> Option<Rc<RefCell<FileData>>> {
        let parent = self.data.borrow().parent.upgrade()?;
        let file = parent.borrow().parent_file.clone();
        file.upgrade()
    }

    /// Duplicate the zone contents. The copy keeps the sample reference
    /// but is detached from any parent.
    pub(crate) fn deep_clone(&self) -> InstrumentZone {
        let src = self.data.borrow();
        InstrumentZone {
            data: Rc::new(RefCell::new(InstrumentZoneData {
                zone: src.zone.clone(),
                sample: src.sample.clone(),
                parent: Weak::new(),
            })),
        }
    }

    fn detach(&self) {
        self.data.borrow_mut().parent = Weak::new();
    }
}

#[derive(Debug)]
pub(crate) struct InstrumentData {
    pub(crate) name: String,
    pub(crate) zones: Vec<InstrumentZone>,
    pub(crate) global_zone: Option<InstrumentZone>,
    pub(crate) parent_file: Weak<RefCell<FileData>>,
}

/// An instrument: a named, exclusively-owned list of instrument zones
/// plus an optional global zone.
///
/// `Instrument` is a shared handle; cloning it shares the underlying
/// entity (many preset zones may reference one instrument). Use
/// [`Instrument::deep_clone`] for a detached structural copy.
#[derive(Debug, Clone)]
pub struct Instrument {
    pub(crate) data: Rc<RefCell<InstrumentData>>,
}

impl Instrument {
    /// Create a new empty instrument.
    pub fn new(name: &str) -> Self {
        Self {
            data: Rc::new(RefCell::new(InstrumentData {
                name: name.to_string(),
                zones: Vec::new(),
                global_zone: None,
                parent_file: Weak::new(),
            })),
        }
    }

    /// The instrument name.
    pub fn name(&self) -> Ref<'_, str> {
        Ref::map(self.data.borrow(), |d| d.name.as_str())
    }

    /// Set the instrument name.
    pub fn set_name(&self, name: &str) {
        self.data.borrow_mut().name = name.to_string();
    }

    /// The zones, in insertion order.
    pub fn zones(&self) -> Ref<'_, [InstrumentZone]> {
        Ref::map(self.data.borrow(), |d| d.zones.as_slice())
    }

    /// Add a zone to the instrument.
    ///
    /// A zone that already belongs to this instrument is left alone (the
    /// call is a no-op); a zone owned by a different instrument is
    /// rejected and both instruments are left unchanged. If this
    /// instrument is registered in a live file, the zone's sample is
    /// registered there as a side effect.
    pub fn add_zone(&self, zone: &InstrumentZone) -> Result<(), Error> {
        match zone.parent_instrument() {
            Some(parent) if parent.handle_eq(self) => return Ok(()),
            Some(_) => return Err(Error::OwnershipViolation("instrument")),
            None => {}
        }
        zone.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.register_zone_sample(zone);
        self.data.borrow_mut().zones.push(zone.clone());
        Ok(())
    }

    /// Remove the zone at the given position. The removed zone is
    /// detached and can be re-added to another parent. The sample it
    /// referenced stays registered (removal never cascades).
    pub fn remove_zone(&self, index: usize) -> Option<InstrumentZone> {
        let mut data = self.data.borrow_mut();
        if index >= data.zones.len() {
            return None;
        }
        let zone = data.zones.remove(index);
        drop(data);
        zone.detach();
        Some(zone)
    }

    /// Keep only the zones matched by the predicate; the rest are
    /// detached and removed.
    pub fn retain_zones<F: FnMut(&InstrumentZone) -> bool>(&self, mut predicate: F) {
        let removed: Vec<InstrumentZone> = {
            let mut data = self.data.borrow_mut();
            let mut removed = Vec::new();
            data.zones.retain(|zone| {
                if predicate(zone) {
                    true
                } else {
                    removed.push(zone.clone());
                    false
                }
            });
            removed
        };
        for zone in removed {
            zone.detach();
        }
    }

    /// Remove all zones.
    pub fn clear_zones(&self) {
        self.retain_zones(|_| false);
    }

    /// True if the instrument has a global zone.
    pub fn has_global_zone(&self) -> bool {
        self.data.borrow().global_zone.is_some()
    }

    /// The global zone, if set.
    pub fn global_zone(&self) -> Option<InstrumentZone> {
        self.data.borrow().global_zone.clone()
    }

    /// Set the global zone, replacing (and detaching) any previous one.
    /// Ownership rules are the same as for [`Instrument::add_zone`].
    pub fn set_global_zone(&self, zone: &InstrumentZone) -> Result<(), Error> {
        match zone.parent_instrument() {
            Some(parent) if parent.handle_eq(self) => return Ok(()),
            Some(_) => return Err(Error::OwnershipViolation("instrument")),
            None => {}
        }
        zone.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.register_zone_sample(zone);
        let previous = self.data.borrow_mut().global_zone.replace(zone.clone());
        if let Some(previous) = previous {
            previous.detach();
        }
        Ok(())
    }

    /// Remove the global zone, detaching it.
    pub fn reset_global_zone(&self) {
        if let Some(zone) = self.data.borrow_mut().global_zone.take() {
            zone.detach();
        }
    }

    /// True if the instrument is registered in a live file.
    pub fn has_parent_file(&self) -> bool {
        self.data.borrow().parent_file.strong_count() > 0
    }

    /// Handle identity: true when both handles refer to the same entity.
    pub fn handle_eq(&self, other: &Instrument) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Structural deep copy: every zone (and the global zone) is
    /// duplicated and its parent back-pointer repaired to the copy. The
    /// copy is detached from any file.
    pub fn deep_clone(&self) -> Instrument {
        let copy = Instrument::new("");
        {
            let src = self.data.borrow();
            let mut dst = copy.data.borrow_mut();
            dst.name = src.name.clone();
            for zone in &src.zones {
                let clone = zone.deep_clone();
                clone.data.borrow_mut().parent = Rc::downgrade(&copy.data);
                dst.zones.push(clone);
            }
            if let Some(global) = &src.global_zone {
                let clone = global.deep_clone();
                clone.data.borrow_mut().parent = Rc::downgrade(&copy.data);
                dst.global_zone = Some(clone);
            }
        }
        copy
    }

    fn register_zone_sample(&self, zone: &InstrumentZone) {
        let file = self.data.borrow().parent_file.upgrade();
        if let Some(file) = file {
            if let Some(sample) = zone.sample() {
                FileData::register_sample(&file, &sample);
            }
        }
    }
}
