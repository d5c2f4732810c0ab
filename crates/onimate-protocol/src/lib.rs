//! Onimate draw command stream protocol.
//!
//! A command buffer is a flat sequence of fixed-length records written by the scripting
//! engine once per frame and decoded by the host renderer. This crate owns the wire format:
//! - the opcode table and record layouts ([`opcode`])
//! - the bounds-checked reader ([`RecordCursor`]) and table-driven decoder ([`cmd`])
//! - producer-side encoding ([`CmdWriter`], [`EmitBuffer`])
//! - the string table TEXT records point into ([`StringTable`])
//!
//! It does not execute anything; see `onimate-draw` for the dispatcher and render state.

pub mod cmd;
pub mod cursor;
pub mod emit;
mod error;
pub mod opcode;
pub mod strings;
pub mod writer;

pub use cmd::{
    decode_all, decode_record, Bezier, CmdStreamIter, DecodedRecord, DrawCmd, Ellipse, Matrix,
    PenConfig, Rect, TextRun,
};
pub use cursor::{Payload, RecordCursor};
pub use emit::{EmitBuffer, EmitError, DEFAULT_EMIT_CAPACITY_SLOTS};
pub use error::DecodeError;
pub use opcode::{Opcode, RecordLayout, OPCODE_TABLE, SLOT_BYTES};
pub use strings::{StringRef, StringRefError, StringTable, MAX_STRING_SLOTS};
pub use writer::CmdWriter;
