//! ExtremaError: unified error type for halo-extrema public APIs
//!
//! Fatal configuration problems, input failures and transport failures all
//! surface through this enum. Internal invariant violations (out-of-range
//! block access, malformed halo coordinates) are *not* represented here:
//! they are assertion failures, see [`crate::data::block`].

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for halo-extrema operations.
#[derive(Debug, Error)]
pub enum ExtremaError {
    /// `px * py * pz` does not match the number of participating processes.
    #[error("process grid holds {expected} ranks but {found} processes are running")]
    ProcessCountMismatch { expected: usize, found: usize },
    /// A global extent is not an exact multiple of the process-grid extent.
    #[error("global extent {global} on axis {axis} is not divisible by {procs} processes")]
    NonDivisibleExtent {
        axis: usize,
        global: usize,
        procs: usize,
    },
    /// A process-grid or field extent is zero.
    #[error("extent on axis {axis} must be non-zero")]
    EmptyExtent { axis: usize },
    /// A sub-domain extent exceeds the coordinate bound of [`crate::topology::point::Point`].
    #[error("sub-domain extent {extent} on axis {axis} exceeds the supported coordinate range")]
    ExtentTooLarge { axis: usize, extent: usize },
    /// The step count is zero.
    #[error("number of time steps must be non-zero")]
    ZeroSteps,
    /// A rank identifier outside `[0, size)`.
    #[error("rank {rank} is outside a communicator of size {size}")]
    RankOutOfRange { rank: usize, size: usize },
    /// Malformed command line.
    #[error("usage error: {0}")]
    Usage(String),
    /// The input or output file could not be accessed.
    #[error("I/O error on `{path}`: {message}")]
    Io { path: PathBuf, message: String },
    /// A token in the input file is not a floating-point value.
    #[error("input value #{index} (`{token}`) is not a number")]
    ParseValue { index: usize, token: String },
    /// The input file ended early.
    #[error("input file holds {found} values, expected {expected}")]
    InputTruncated { expected: usize, found: usize },
    /// The root failed while reading the input and sent no data for this rank.
    #[error("root aborted input distribution")]
    DistributionAborted,
    /// A point-to-point or collective transfer failed.
    #[error("communication with rank {neighbor} failed: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A structural invariant does not hold (see [`crate::DebugInvariants`]).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl ExtremaError {
    /// I/O failure on `path`.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        ExtremaError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Transport failure with `neighbor`, described by `reason`.
    pub fn comm(neighbor: usize, reason: impl Into<String>) -> Self {
        ExtremaError::CommError {
            neighbor,
            source: reason.into().into(),
        }
    }
}
