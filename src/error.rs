//! Error kinds, one variant family per §7 of the design: configuration,
//! domain (random/genotype), scheduling and reporter I/O errors.
use thiserror::Error;

/// Raised by [`crate::config`] and anything that validates a loaded
/// configuration document before the model starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration key: {0}")]
    MissingKey(&'static str),
    #[error("configuration value out of range: {0}")]
    OutOfRange(String),
    #[error("genotype schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("raster file not found: {0}")]
    RasterNotFound(String),
}

/// Domain contract violations in [`crate::random`] and [`crate::genotype`].
/// These are implementer contracts: fail fast with a precise message, never
/// silently clamp.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("negative variance: sigma = {0}")]
    NegativeVariance(String),
    #[error("probability out of [0,1]: p = {0}")]
    ProbabilityOutOfRange(String),
    #[error("empty collection passed to {0}")]
    EmptyCollection(&'static str),
    #[error("invalid range: from ({from}) >= to ({to})")]
    InvalidRange { from: String, to: String },
    #[error("truncated normal rejected {max_attempts} draws in a row")]
    TruncatedNormalExhausted { max_attempts: u32 },
    #[error("malformed amino-acid sequence: {0}")]
    MalformedSequence(String),
}

/// An event whose scheduled time lies in the past. The event is
/// dropped; the simulation continues (§7: "Scheduling error").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("event time {event_time} precedes current time {current_time}")]
pub struct SchedulingError {
    pub event_time: i64,
    pub current_time: i64,
}

/// Top-level error returned by `Model::initialize`. Startup errors propagate
/// out of initialization; per-event errors never reach this type (they are
/// contained and logged, per §7's propagation policy).
#[derive(Debug, Error)]
pub enum MalasimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}
