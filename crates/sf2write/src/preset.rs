//! Preset entities and preset zones.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::error::Error;
use crate::generator::GeneratorItem;
use crate::instrument::{Instrument, InstrumentData};
use crate::modulator::ModulatorItem;
use crate::soundfont::FileData;
use crate::zone::Zone;

#[derive(Debug)]
pub(crate) struct PresetZoneData {
    pub(crate) zone: Zone,
    pub(crate) instrument: Weak<RefCell<InstrumentData>>,
    pub(crate) parent: Weak<RefCell<PresetData>>,
}

/// A preset zone: a zone plus a weak, liveness-checked reference to an
/// instrument.
///
/// `PresetZone` is a shared handle; cloning it shares the underlying
/// zone. A zone is owned by at most one preset at a time.
#[derive(Debug, Clone)]
pub struct PresetZone {
    pub(crate) data: Rc<RefCell<PresetZoneData>>,
}

impl Default for PresetZone {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetZone {
    /// Create a new empty zone with no instrument reference.
    pub fn new() -> Self {
        Self {
            data: Rc::new(RefCell::new(PresetZoneData {
                zone: Zone::new(),
                instrument: Weak::new(),
                parent: Weak::new(),
            })),
        }
    }

    /// Create a new zone referencing the given instrument.
    pub fn with_instrument(instrument: &Instrument) -> Self {
        let zone = Self::new();
        zone.data.borrow_mut().instrument = Rc::downgrade(&instrument.data);
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

    /// True if the referenced instrument is still alive.
    pub fn has_instrument(&self) -> bool {
        self.data.borrow().instrument.strong_count() > 0
    }

    /// The referenced instrument, if alive.
    pub fn instrument(&self) -> Option<Instrument> {
        let data = self.data.borrow().instrument.upgrade()?;
        Some(Instrument { data })
    }

    /// Set the referenced instrument.
    ///
    /// If this zone is reachable from a live file through its parent
    /// preset, the instrument (and transitively its zones' samples) is
    /// registered in that file as a side effect.
    pub fn set_instrument(&self, instrument: &Instrument) {
        if let Some(file) = self.parent_file_data() {
            FileData::register_instrument(&file, instrument);
        }
        self.data.borrow_mut().instrument = Rc::downgrade(&instrument.data);
    }

    /// Drop the instrument reference.
    pub fn reset_instrument(&self) {
        self.data.borrow_mut().instrument = Weak::new();
    }

    /// The owning preset, if alive.
    pub fn parent_preset(&self) -> Option<Preset> {
        let data = self.data.borrow().parent.upgrade()?;
        Some(Preset { data })
    }

    /// True if the parent chain (zone to preset to file) is alive.
    pub fn has_parent_file(&self) -> bool {
        self.parent_file_data().is_some()
    }

    /// Handle identity: true when both handles refer to the same zone.
    pub fn handle_eq(&self, other: &PresetZone) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    fn parent_file_data(&self) -> Option<Rc<RefCell<FileData>>> {
        let parent = self.data.borrow().parent.upgrade()?;
        let file = parent.borrow().parent_file.clone();
        file.upgrade()
    }

    /// Duplicate the zone contents. The copy keeps the instrument
    /// reference but is detached from any parent.
    pub(crate) fn deep_clone(&self) -> PresetZone {
        let src = self.data.borrow();
        PresetZone {
            data: Rc::new(RefCell::new(PresetZoneData {
                zone: src.zone.clone(),
                instrument: src.instrument.clone(),
                parent: Weak::new(),
            })),
        }
    }

    fn detach(&self) {
        self.data.borrow_mut().parent = Weak::new();
    }
}

#[derive(Debug)]
pub(crate) struct PresetData {
    pub(crate) name: String,
    pub(crate) preset_number: u16,
    pub(crate) bank: u16,
    pub(crate) library: u32,
    pub(crate) genre: u32,
    pub(crate) morphology: u32,
    pub(crate) zones: Vec<PresetZone>,
    pub(crate) global_zone: Option<PresetZone>,
    pub(crate) parent_file: Weak<RefCell<FileData>>,
}

/// A preset: the named, bank-addressed entity a MIDI program selects,
/// owning a list of preset zones plus an optional global zone.
///
/// `Preset` is a shared handle; cloning it shares the underlying entity.
/// Use [`Preset::deep_clone`] for a detached structural copy.
#[derive(Debug, Clone)]
pub struct Preset {
    pub(crate) data: Rc<RefCell<PresetData>>,
}

impl Preset {
    /// Create a new empty preset.
    pub fn new(name: &str, preset_number: u16, bank: u16) -> Self {
        Self {
            data: Rc::new(RefCell::new(PresetData {
                name: name.to_string(),
                preset_number,
                bank,
                library: 0,
                genre: 0,
                morphology: 0,
                zones: Vec::new(),
                global_zone: None,
                parent_file: Weak::new(),
            })),
        }
    }

    /// The preset name.
    pub fn name(&self) -> Ref<'_, str> {
        Ref::map(self.data.borrow(), |d| d.name.as_str())
    }

    /// Set the preset name.
    pub fn set_name(&self, name: &str) {
        self.data.borrow_mut().name = name.to_string();
    }

    /// The preset number.
    pub fn preset_number(&self) -> u16 {
        self.data.borrow().preset_number
    }

    /// Set the preset number.
    pub fn set_preset_number(&self, preset_number: u16) {
        self.data.borrow_mut().preset_number = preset_number;
    }

    /// The bank number.
    pub fn bank(&self) -> u16 {
        self.data.borrow().bank
    }

    /// Set the bank number.
    pub fn set_bank(&self, bank: u16) {
        self.data.borrow_mut().bank = bank;
    }

    /// The library field of the preset header.
    pub fn library(&self) -> u32 {
        self.data.borrow().library
    }

    /// Set the library field.
    pub fn set_library(&self, library: u32) {
        self.data.borrow_mut().library = library;
    }

    /// The genre field of the preset header.
    pub fn genre(&self) -> u32 {
        self.data.borrow().genre
    }

    /// Set the genre field.
    pub fn set_genre(&self, genre: u32) {
        self.data.borrow_mut().genre = genre;
    }

    /// The morphology field of the preset header.
    pub fn morphology(&self) -> u32 {
        self.data.borrow().morphology
    }

    /// Set the morphology field.
    pub fn set_morphology(&self, morphology: u32) {
        self.data.borrow_mut().morphology = morphology;
    }

    /// The zones, in insertion order.
    pub fn zones(&self) -> Ref<'_, [PresetZone]> {
        Ref::map(self.data.borrow(), |d| d.zones.as_slice())
    }

    /// Add a zone to the preset.
    ///
    /// A zone that already belongs to this preset is left alone (the call
    /// is a no-op); a zone owned by a different preset is rejected and
    /// both presets are left unchanged. If this preset is registered in a
    /// live file, the zone's instrument (and transitively its samples) is
    /// registered there as a side effect.
    pub fn add_zone(&self, zone: &PresetZone) -> Result<(), Error> {
        match zone.parent_preset() {
            Some(parent) if parent.handle_eq(self) => return Ok(()),
            Some(_) => return Err(Error::OwnershipViolation("preset")),
            None => {}
        }
        zone.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.register_zone_instrument(zone);
        self.data.borrow_mut().zones.push(zone.clone());
        Ok(())
    }

    /// Remove the zone at the given position. The removed zone is
    /// detached and can be re-added to another parent. The instrument it
    /// referenced stays registered (removal never cascades).
    pub fn remove_zone(&self, index: usize) -> Option<PresetZone> {
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
    pub fn retain_zones<F: FnMut(&PresetZone) -> bool>(&self, mut predicate: F) {
        let removed: Vec<PresetZone> = {
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

    /// True if the preset has a global zone.
    pub fn has_global_zone(&self) -> bool {
        self.data.borrow().global_zone.is_some()
    }

    /// The global zone, if set.
    pub fn global_zone(&self) -> Option<PresetZone> {
        self.data.borrow().global_zone.clone()
    }

    /// Set the global zone, replacing (and detaching) any previous one.
    /// Ownership rules are the same as for [`Preset::add_zone`].
    pub fn set_global_zone(&self, zone: &PresetZone) -> Result<(), Error> {
        match zone.parent_preset() {
            Some(parent) if parent.handle_eq(self) => return Ok(()),
            Some(_) => return Err(Error::OwnershipViolation("preset")),
            None => {}
        }
        zone.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.register_zone_instrument(zone);
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

    /// True if the preset is registered in a live file.
    pub fn has_parent_file(&self) -> bool {
        self.data.borrow().parent_file.strong_count() > 0
    }

    /// Handle identity: true when both handles refer to the same entity.
    pub fn handle_eq(&self, other: &Preset) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Structural deep copy: every zone (and the global zone) is
    /// duplicated and its parent back-pointer repaired to the copy. The
    /// copy is detached from any file.
    pub fn deep_clone(&self) -> Preset {
        let copy = Preset::new("", 0, 0);
        {
            let src = self.data.borrow();
            let mut dst = copy.data.borrow_mut();
            dst.name = src.name.clone();
            dst.preset_number = src.preset_number;
            dst.bank = src.bank;
            dst.library = src.library;
            dst.genre = src.genre;
            dst.morphology = src.morphology;
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

    fn register_zone_instrument(&self, zone: &PresetZone) {
        let file = self.data.borrow().parent_file.upgrade();
        if let Some(file) = file {
            if let Some(instrument) = zone.instrument() {
                FileData::register_instrument(&file, &instrument);
            }
        }
    }
}
