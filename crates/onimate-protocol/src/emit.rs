//! Bounded producer-side buffer that flushes when the next record would not fit.

use crate::cmd::DrawCmd;
use crate::opcode::{MAX_RECORD_SLOTS, TAG_SLOTS};
use crate::writer::CmdWriter;

/// Slot capacity of the scripting engine's emit buffer.
pub const DEFAULT_EMIT_CAPACITY_SLOTS: usize = 8196;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("record of {record_slots} slots can never fit in an emit buffer of {capacity_slots} slots")]
    RecordTooLarge {
        record_slots: usize,
        capacity_slots: usize,
    },
}

/// Accumulates records for one frame and splits them into END-terminated command buffers of
/// at most `capacity_slots` slots each (terminator included).
#[derive(Debug, Clone)]
pub struct EmitBuffer {
    writer: CmdWriter,
    capacity_slots: usize,
    flushed: usize,
}

impl Default for EmitBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EMIT_CAPACITY_SLOTS)
    }
}

impl EmitBuffer {
    pub fn with_capacity(capacity_slots: usize) -> Self {
        Self {
            writer: CmdWriter::with_capacity_slots(capacity_slots.min(DEFAULT_EMIT_CAPACITY_SLOTS)),
            capacity_slots,
            flushed: 0,
        }
    }

    pub fn capacity_slots(&self) -> usize {
        self.capacity_slots
    }

    /// Slots buffered and not yet flushed, terminator excluded.
    pub fn pending_slots(&self) -> usize {
        self.writer.slot_len()
    }

    /// Number of buffers handed out by [`push`](Self::push) and [`flush`](Self::flush).
    pub fn flush_count(&self) -> usize {
        self.flushed
    }

    /// Buffers `cmd`.
    ///
    /// When `cmd` does not fit behind the records already buffered, those records are
    /// terminated and returned first, and `cmd` starts the next buffer.
    pub fn push(&mut self, cmd: &DrawCmd) -> Result<Option<Vec<u8>>, EmitError> {
        let record_slots = cmd.opcode().record_slots();
        if record_slots + TAG_SLOTS > self.capacity_slots {
            return Err(EmitError::RecordTooLarge {
                record_slots,
                capacity_slots: self.capacity_slots,
            });
        }

        let flushed = if self.pending_slots() + record_slots + TAG_SLOTS > self.capacity_slots {
            self.flush()
        } else {
            None
        };
        self.writer.push(cmd);
        Ok(flushed)
    }

    /// Terminates and returns the buffered records, or `None` when nothing is buffered.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.writer.is_empty() {
            return None;
        }
        self.flushed += 1;
        Some(self.writer.take())
    }

    /// Whether this capacity can hold the largest record kind.
    pub fn fits_every_record(&self) -> bool {
        self.capacity_slots >= MAX_RECORD_SLOTS + TAG_SLOTS
    }
}
