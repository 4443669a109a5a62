//! Mutation state of a record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a record stands relative to the last accepted baseline.
///
/// ```text
/// create
///  |
/// New   --reset_state--> Clean --write--> Dirty
///  |                       |                |
///  +--delete (disposed)    +----delete------+--> Delete --reset_state--> (evicted)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordState {
    /// Attached and unmodified.
    #[default]
    Clean,
    /// Created, or attached since the last baseline.
    New,
    /// A tracked field was written after the last baseline.
    Dirty,
    /// Marked deleted; evicted on the next state reset.
    Delete,
}

impl RecordState {
    /// Whether the record is marked deleted.
    #[inline]
    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clean => "clean",
            Self::New => "new",
            Self::Dirty => "dirty",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}
