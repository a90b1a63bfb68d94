//! Error type for SoundFont building and writing.

use thiserror::Error;

use crate::generator::GeneratorKind;

/// Error type for SoundFont construction and serialization.
#[derive(Debug, Error)]
pub enum Error {
    /// A zone was attached to a second, different parent.
    #[error("zone is already owned by another {0}")]
    OwnershipViolation(&'static str),

    /// A zone already contains a generator with the same operator.
    #[error("zone already contains a {0:?} generator")]
    DuplicateGenerator(GeneratorKind),

    /// The operator is derived from the zone's cross-reference and cannot
    /// be stored in the generator list directly.
    #[error("{0:?} generators are derived from the zone's reference and cannot be added directly")]
    ReservedGenerator(GeneratorKind),

    /// A zone already contains a modulator with the same source,
    /// destination and transform but a different amount.
    #[error("zone already contains a conflicting modulator for the same source and destination")]
    ConflictingModulator,

    /// A record count, running index or encoded byte length would overflow
    /// its fixed-width on-disk field. Fatal to the whole write.
    #[error("{what} exceeds its on-disk field range ({count})")]
    CapacityExceeded { what: &'static str, count: u64 },

    /// The file lacks content the format requires. Surfaced before any
    /// chunk is written.
    #[error("the file has no {0}")]
    EmptyCollection(&'static str),

    /// IO error during writing.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
