//! Zone core: the generator and modulator lists shared by preset and
//! instrument zones.

use crate::error::Error;
use crate::generator::{GeneratorItem, GeneratorKind};
use crate::modulator::ModulatorItem;

/// An ordered bundle of generator items and modulator items.
///
/// The generator list is kept in the format's canonical order at all
/// times: a key-range item first, a velocity-range item second, every
/// other item in insertion order after them. The modulator list preserves
/// plain insertion order for determinism.
#[derive(Debug, Clone, Default)]
pub struct Zone {
    generators: Vec<GeneratorItem>,
    modulators: Vec<ModulatorItem>,
}

impl Zone {
    /// Create a new empty zone.
    pub fn new() -> Self {
        Self::default()
    }

    /// The generator items, in canonical order.
    pub fn generators(&self) -> &[GeneratorItem] {
        &self.generators
    }

    /// The modulator items, in insertion order.
    pub fn modulators(&self) -> &[ModulatorItem] {
        &self.modulators
    }

    /// Add a generator item.
    ///
    /// Fails if the zone already contains an item with the same operator,
    /// or if the operator is a cross-reference operator (those are
    /// synthesized from the zone's reference when the file is written).
    /// Key-range and velocity-range items are positioned at the front of
    /// the list as the format requires, regardless of insertion order.
    pub fn add_generator(&mut self, item: GeneratorItem) -> Result<(), Error> {
        if item.kind().is_reference() {
            return Err(Error::ReservedGenerator(item.kind()));
        }
        if self.has_generator(item.kind()) {
            return Err(Error::DuplicateGenerator(item.kind()));
        }
        let position = match item.kind() {
            GeneratorKind::KeyRange => 0,
            GeneratorKind::VelRange => usize::from(
                self.generators
                    .first()
                    .map_or(false, |g| g.kind() == GeneratorKind::KeyRange),
            ),
            _ => self.generators.len(),
        };
        self.generators.insert(position, item);
        Ok(())
    }

    /// True if the zone contains a generator with the given operator.
    pub fn has_generator(&self, kind: GeneratorKind) -> bool {
        self.generators.iter().any(|g| g.kind() == kind)
    }

    /// Find the generator with the given operator.
    pub fn find_generator(&self, kind: GeneratorKind) -> Option<&GeneratorItem> {
        self.generators.iter().find(|g| g.kind() == kind)
    }

    /// Remove the generator with the given operator, if present.
    pub fn remove_generator(&mut self, kind: GeneratorKind) -> Option<GeneratorItem> {
        let position = self.generators.iter().position(|g| g.kind() == kind)?;
        Some(self.generators.remove(position))
    }

    /// Remove all generator items.
    pub fn clear_generators(&mut self) {
        self.generators.clear();
    }

    /// Add a modulator item.
    ///
    /// Fails if the zone already contains an item with the same uniqueness
    /// key (source, destination, amount source, transform) but a different
    /// amount. Re-adding an identical item is a no-op.
    pub fn add_modulator(&mut self, item: ModulatorItem) -> Result<(), Error> {
        if let Some(existing) = self.modulators.iter().find(|m| m.same_key(&item)) {
            if existing.amount() == item.amount() {
                return Ok(());
            }
            return Err(Error::ConflictingModulator);
        }
        self.modulators.push(item);
        Ok(())
    }

    /// Remove the modulators matched by the predicate.
    pub fn retain_modulators<F: FnMut(&ModulatorItem) -> bool>(&mut self, predicate: F) {
        self.modulators.retain(predicate);
    }

    /// Remove all modulator items.
    pub fn clear_modulators(&mut self) {
        self.modulators.clear();
    }
}
