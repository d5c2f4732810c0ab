//! Producer-owned string storage referenced by TEXT records.
//!
//! A TEXT record cannot carry its string inline, so the producer parks the string in a
//! [`StringTable`] and writes the returned [`StringRef`] into the record. The consumer resolves
//! the handle with [`StringTable::take`], which moves the string out and retires the handle in
//! one step. A retired handle can never resolve again, even after its slot is reused.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to a string parked in a [`StringTable`].
///
/// Wire layout (one little-endian `u64` slot): bits 0..32 hold `slot index + 1`, bits 32..64
/// hold the slot generation. The raw value 0 is never issued.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringRef(u64);

impl StringRef {
    pub const NULL: StringRef = StringRef(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64 + 1))
    }

    fn index(self) -> Option<usize> {
        let low = (self.0 & 0xFFFF_FFFF) as usize;
        low.checked_sub(1)
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for StringRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringRef(0x{:016x})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StringRefError {
    #[error("null string reference")]
    Null,

    /// The handle points at a slot this table never allocated.
    #[error("unknown string reference {0:?}")]
    Unknown(StringRef),

    /// The handle was valid once but its string has already been released.
    #[error("string reference {0:?} was already released")]
    Released(StringRef),

    /// Every slot is holding a live string.
    #[error("string table is full ({capacity} slots)")]
    Exhausted { capacity: usize },
}

/// Most slots a table can address: handle indices are stored as `index + 1` in 32 bits.
pub const MAX_STRING_SLOTS: usize = u32::MAX as usize;

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    text: Option<String>,
}

/// Generational arena of strings awaiting consumption.
#[derive(Debug)]
pub struct StringTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    max_slots: usize,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::with_max_slots(MAX_STRING_SLOTS)
    }
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table that never holds more than `max_slots` live strings (capped at
    /// [`MAX_STRING_SLOTS`]).
    pub fn with_max_slots(max_slots: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            max_slots: max_slots.min(MAX_STRING_SLOTS),
        }
    }

    /// Parks `text` and returns the handle a TEXT record should carry.
    ///
    /// # Panics
    ///
    /// Panics when the table is full; use [`try_alloc`](Self::try_alloc) to handle that case.
    pub fn alloc(&mut self, text: impl Into<String>) -> StringRef {
        match self.try_alloc(text) {
            Ok(handle) => handle,
            Err(err) => panic!("{err}"),
        }
    }

    /// Parks `text`, or fails with [`StringRefError::Exhausted`] when every slot is live.
    pub fn try_alloc(&mut self, text: impl Into<String>) -> Result<StringRef, StringRefError> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.text.is_none());
            slot.text = Some(text.into());
            self.live += 1;
            return Ok(StringRef::new(index, slot.generation));
        }

        if self.slots.len() >= self.max_slots {
            return Err(StringRefError::Exhausted {
                capacity: self.max_slots,
            });
        }
        // `max_slots <= MAX_STRING_SLOTS`, so the index fits.
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            text: Some(text.into()),
        });
        self.live += 1;
        Ok(StringRef::new(index, 0))
    }

    /// Resolves `handle` and releases it, handing ownership of the string to the caller.
    ///
    /// Succeeds at most once per allocation.
    pub fn take(&mut self, handle: StringRef) -> Result<String, StringRefError> {
        let index = self.resolve_index(handle)?;
        let slot = &mut self.slots[index];
        let Some(text) = slot.text.take() else {
            return Err(StringRefError::Released(handle));
        };

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        self.live -= 1;
        Ok(text)
    }

    /// Returns the string behind `handle` without releasing it.
    pub fn get(&self, handle: StringRef) -> Option<&str> {
        let index = self.resolve_index(handle).ok()?;
        self.slots[index].text.as_deref()
    }

    pub fn contains(&self, handle: StringRef) -> bool {
        self.get(handle).is_some()
    }

    /// Number of strings allocated but not yet released.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Releases every outstanding string and retires its handle.
    ///
    /// This is the cleanup path for passes that aborted before reaching their TEXT records.
    /// Returns the number of strings released.
    pub fn reclaim(&mut self) -> usize {
        let mut released = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.text.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                released += 1;
            }
        }
        self.live = 0;
        released
    }

    fn resolve_index(&self, handle: StringRef) -> Result<usize, StringRefError> {
        if handle.is_null() {
            return Err(StringRefError::Null);
        }
        let index = handle.index().ok_or(StringRefError::Unknown(handle))?;
        let slot = self
            .slots
            .get(index)
            .ok_or(StringRefError::Unknown(handle))?;
        if slot.generation != handle.generation() {
            // Generations only move forward, so an older one means the handle was retired.
            return if handle.generation() < slot.generation {
                Err(StringRefError::Released(handle))
            } else {
                Err(StringRefError::Unknown(handle))
            };
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_releases_exactly_once() {
        let mut table = StringTable::new();
        let r = table.alloc("hello");
        assert_eq!(table.live(), 1);
        assert_eq!(table.get(r), Some("hello"));

        assert_eq!(table.take(r).unwrap(), "hello");
        assert_eq!(table.live(), 0);
        assert_eq!(table.take(r), Err(StringRefError::Released(r)));
    }

    #[test]
    fn reused_slot_does_not_revive_old_handle() {
        let mut table = StringTable::new();
        let first = table.alloc("a");
        table.take(first).unwrap();

        let second = table.alloc("b");
        assert_ne!(first, second);
        assert_eq!(table.take(first), Err(StringRefError::Released(first)));
        assert_eq!(table.take(second).unwrap(), "b");
    }

    #[test]
    fn null_and_foreign_handles_are_rejected() {
        let mut table = StringTable::new();
        assert_eq!(table.take(StringRef::NULL), Err(StringRefError::Null));

        let bogus = StringRef::from_raw(0xdead_0000_0042);
        assert_eq!(table.take(bogus), Err(StringRefError::Unknown(bogus)));

        let r = table.alloc("x");
        let future = StringRef::from_raw(r.to_raw() + (5u64 << 32));
        assert_eq!(table.take(future), Err(StringRefError::Unknown(future)));
    }

    #[test]
    fn reclaim_releases_everything_outstanding() {
        let mut table = StringTable::new();
        let a = table.alloc("a");
        let b = table.alloc("b");
        table.take(a).unwrap();

        assert_eq!(table.reclaim(), 1);
        assert!(table.is_empty());
        assert_eq!(table.take(b), Err(StringRefError::Released(b)));

        let c = table.alloc("c");
        assert_eq!(table.get(c), Some("c"));
        assert_eq!(table.live(), 1);
    }

    #[test]
    fn full_table_reports_exhaustion_until_a_slot_frees() {
        let mut table = StringTable::with_max_slots(2);
        let a = table.try_alloc("a").unwrap();
        table.try_alloc("b").unwrap();
        assert_eq!(
            table.try_alloc("c"),
            Err(StringRefError::Exhausted { capacity: 2 })
        );
        assert_eq!(table.live(), 2);

        table.take(a).unwrap();
        let c = table.try_alloc("c").unwrap();
        assert_eq!(table.get(c), Some("c"));
    }

    #[test]
    fn handles_are_never_null() {
        let mut table = StringTable::new();
        for i in 0..16 {
            let r = table.alloc(format!("s{i}"));
            assert!(!r.is_null());
        }
    }
}
