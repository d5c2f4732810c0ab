//! Bounds-checked sequential reader over a command buffer.

use crate::error::DecodeError;
use crate::opcode::{Opcode, SLOT_BYTES, TAG_SLOTS};

/// Forward-only reader that walks a command buffer one slot group at a time.
///
/// The cursor never moves backwards and never yields bytes outside the buffer it was built
/// from. The position is always a multiple of [`SLOT_BYTES`].
#[derive(Clone, Debug)]
pub struct RecordCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Byte offset of the record the cursor currently points at.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    /// Returns the raw tag value stored in the slot at the cursor.
    pub fn peek_tag(&self) -> Result<u64, DecodeError> {
        let bytes = self.slice(0, TAG_SLOTS)?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Returns the opcode at the cursor, rejecting values outside the opcode table.
    pub fn peek_opcode(&self) -> Result<Opcode, DecodeError> {
        let tag = self.peek_tag()?;
        Opcode::from_u64(tag).ok_or(DecodeError::UnknownOpcode {
            offset: self.pos,
            tag,
        })
    }

    /// Returns the `payload_slots` slots that follow the tag of the current record.
    ///
    /// Does not move the cursor.
    pub fn read(&self, payload_slots: usize) -> Result<Payload<'a>, DecodeError> {
        let bytes = self.slice(TAG_SLOTS, payload_slots)?;
        Ok(Payload {
            record_offset: self.pos,
            bytes,
        })
    }

    /// Moves the cursor forward by `slots` slots.
    pub fn advance(&mut self, slots: usize) -> Result<(), DecodeError> {
        let len = self.span_bytes(slots)?;
        let end = self.end_of(len)?;
        self.pos = end;
        Ok(())
    }

    fn slice(&self, skip_slots: usize, slots: usize) -> Result<&'a [u8], DecodeError> {
        let start_rel = self.span_bytes(skip_slots)?;
        let len = self.span_bytes(slots)?;
        let total = start_rel.checked_add(len).ok_or(self.overflow(usize::MAX))?;
        let end = self.end_of(total)?;
        Ok(&self.buf[self.pos + start_rel..end])
    }

    fn span_bytes(&self, slots: usize) -> Result<usize, DecodeError> {
        slots
            .checked_mul(SLOT_BYTES)
            .ok_or(self.overflow(usize::MAX))
    }

    fn end_of(&self, len: usize) -> Result<usize, DecodeError> {
        match self.pos.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(end),
            _ => Err(self.overflow(len)),
        }
    }

    fn overflow(&self, needed: usize) -> DecodeError {
        DecodeError::OutOfBounds {
            offset: self.pos,
            needed,
            available: self.remaining(),
        }
    }
}

/// The payload slots of one record.
#[derive(Clone, Copy, Debug)]
pub struct Payload<'a> {
    record_offset: usize,
    bytes: &'a [u8],
}

impl<'a> Payload<'a> {
    /// Byte offset of the record (its tag slot) within the command buffer.
    pub fn record_offset(&self) -> usize {
        self.record_offset
    }

    pub fn slots(&self) -> usize {
        self.bytes.len() / SLOT_BYTES
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn u64_at(&self, slot: usize) -> Result<u64, DecodeError> {
        let start = slot * SLOT_BYTES;
        let end = start + SLOT_BYTES;
        if end > self.bytes.len() {
            return Err(DecodeError::OutOfBounds {
                offset: self.record_offset,
                needed: (TAG_SLOTS * SLOT_BYTES) + end,
                available: (TAG_SLOTS * SLOT_BYTES) + self.bytes.len(),
            });
        }
        Ok(u64::from_le_bytes(self.bytes[start..end].try_into().unwrap()))
    }

    pub fn f64_at(&self, slot: usize) -> Result<f64, DecodeError> {
        self.u64_at(slot).map(f64::from_bits)
    }
}
