/// Errors produced while walking a command buffer.
///
/// Offsets are byte offsets from the start of the buffer to the record that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A read or advance would go past the end of the buffer.
    #[error(
        "record at offset {offset} needs {needed} bytes but only {available} remain in the buffer"
    )]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The tag slot holds a value that is not in the opcode table.
    #[error("unknown opcode {tag} at offset {offset}")]
    UnknownOpcode { offset: usize, tag: u64 },
}

impl DecodeError {
    pub fn offset(&self) -> usize {
        match *self {
            DecodeError::OutOfBounds { offset, .. } | DecodeError::UnknownOpcode { offset, .. } => {
                offset
            }
        }
    }
}
