use onimate_protocol::{DecodeError, StringRef, StringRefError};

use crate::state::ClipImbalance;

/// Fatal error for the current decode pass.
///
/// Renderer calls issued before the failing record are not rolled back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("TEXT record at offset {offset} references {handle:?}: {source}")]
    InvalidReference {
        offset: usize,
        handle: StringRef,
        #[source]
        source: StringRefError,
    },

    /// `offset` is `None` when the imbalance is found at a frame or pass boundary rather than
    /// at a specific record.
    #[error(
        "unbalanced clip stack{}: {imbalance}",
        .offset.map(|o| format!(" at offset {o}")).unwrap_or_default()
    )]
    UnbalancedClipStack {
        offset: Option<usize>,
        imbalance: ClipImbalance,
    },

    #[error("draw cancelled before the record at offset {offset}")]
    Cancelled { offset: usize },

    #[error("record budget of {limit} exceeded at offset {offset}")]
    RecordLimitExceeded { offset: usize, limit: usize },
}

impl DrawError {
    /// Byte offset of the offending record, when there is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Decode(err) => Some(err.offset()),
            Self::InvalidReference { offset, .. }
            | Self::Cancelled { offset }
            | Self::RecordLimitExceeded { offset, .. } => Some(*offset),
            Self::UnbalancedClipStack { offset, .. } => *offset,
        }
    }
}
