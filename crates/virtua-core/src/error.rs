//! Error taxonomy for the virtualization core (spec §7).

use std::error::Error as StdError;
use std::fmt;

/// Boxed, thread-unaware source error from a user-supplied cell factory.
///
/// The core itself is single-threaded (spec §5), so this is not `Send +
/// Sync`; factories that need to report an error only need to produce
/// something implementing [`std::error::Error`].
pub type FactorySource = Box<dyn StdError + 'static>;

/// Errors surfaced by the virtualization core.
///
/// Kinds mirror spec §7 exactly: `InvalidConfiguration`, `FactoryFailure`,
/// `StateInconsistency`, `UnsupportedOperation`.
#[derive(thiserror::Error, Debug)]
pub enum VirtError {
    /// A configuration value is out of its valid domain (negative cell size,
    /// negative buffer, non-positive `columns_per_row`/`cells_per_page`, ...).
    /// Surfaced at the call site; no state change occurs.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The cell factory raised an error while building the cell at `index`.
    /// The in-progress transition is aborted and the old state is retained.
    #[error("cell factory failed while building index {index}")]
    FactoryFailure {
        index: usize,
        #[source]
        source: FactorySource,
    },

    /// A detected invariant violation (e.g. an index present in `State::cells`
    /// but outside `State::range`, or a duplicate cell identity). Fatal in
    /// debug builds; recovered via `invalidate()` in release builds.
    #[error("state inconsistency: {0}")]
    StateInconsistency(String),

    /// The requested operation does not apply to this container variant
    /// (e.g. pixel-based scroll on a paginated container).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl VirtError {
    pub fn factory_failure(index: usize, source: impl StdError + 'static) -> VirtError {
        VirtError::FactoryFailure {
            index,
            source: Box::new(source),
        }
    }

    pub fn invalid_configuration(msg: impl Into<String>) -> VirtError {
        VirtError::InvalidConfiguration(msg.into())
    }

    pub fn state_inconsistency(msg: impl Into<String>) -> VirtError {
        VirtError::StateInconsistency(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> VirtError {
        VirtError::UnsupportedOperation(msg.into())
    }
}

/// Convenience error used by demo/test cell factories that never fail.
#[derive(Debug)]
pub struct Infallible;

impl fmt::Display for Infallible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "infallible")
    }
}

impl StdError for Infallible {}

pub type Result<T> = std::result::Result<T, VirtError>;
