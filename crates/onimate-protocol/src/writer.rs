//! Safe command buffer builder.
//!
//! Intended for producers, tests and host-side tooling that need to emit canonical command
//! buffers (correct record lengths, zeroed reserved slots, END terminator).

use crate::cmd::{Bezier, DrawCmd, Ellipse, Matrix, PenConfig, Rect, TextRun};
use crate::opcode::{Opcode, SLOT_BYTES, TEXT_PAYLOAD_SLOTS};
use crate::strings::StringRef;

/// Builds one command buffer record by record.
#[derive(Debug, Default, Clone)]
pub struct CmdWriter {
    buf: Vec<u8>,
}

impl CmdWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_slots(slots: usize) -> Self {
        Self {
            buf: Vec::with_capacity(slots * SLOT_BYTES),
        }
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Slots written so far, END excluded.
    pub fn slot_len(&self) -> usize {
        self.buf.len() / SLOT_BYTES
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Appends END and returns the finished buffer.
    pub fn finish(mut self) -> Vec<u8> {
        self.push_tag(Opcode::End);
        self.buf
    }

    /// Appends END, returns the finished buffer and leaves the writer empty for reuse.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(self).finish()
    }

    /// Appends one record for `cmd`.
    ///
    /// Pushing [`DrawCmd::End`] writes a terminator without finishing the writer.
    pub fn push(&mut self, cmd: &DrawCmd) {
        let opcode = cmd.opcode();
        let mut fields = [0u64; TEXT_PAYLOAD_SLOTS];
        let used = cmd.payload_fields(&mut fields);
        debug_assert!(used <= opcode.payload_slots());

        self.push_tag(opcode);
        for slot in &fields[..opcode.payload_slots()] {
            self.buf.extend_from_slice(&slot.to_le_bytes());
        }
    }

    pub fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, rotation: f64) {
        self.push(&DrawCmd::Ellipse(Ellipse {
            x,
            y,
            rx,
            ry,
            rotation,
        }));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn bezier(
        &mut self,
        x1: f64,
        y1: f64,
        cx1: f64,
        cy1: f64,
        cx2: f64,
        cy2: f64,
        x2: f64,
        y2: f64,
    ) {
        self.push(&DrawCmd::Bezier(Bezier {
            x1,
            y1,
            cx1,
            cy1,
            cx2,
            cy2,
            x2,
            y2,
        }));
    }

    pub fn config(&mut self, line_width: f64) {
        self.push(&DrawCmd::Config(PenConfig { line_width }));
    }

    pub fn matrix(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.push(&DrawCmd::Matrix(Matrix { a, b, c, d, e, f }));
    }

    pub fn text(&mut self, x: f64, y: f64, size: f64, text: StringRef) {
        self.push(&DrawCmd::Text(TextRun { x, y, size, text }));
    }

    pub fn clip_push(&mut self) {
        self.push(&DrawCmd::ClipPush);
    }

    pub fn clip_start(&mut self) {
        self.push(&DrawCmd::ClipStart);
    }

    pub fn clip_end(&mut self) {
        self.push(&DrawCmd::ClipEnd);
    }

    pub fn clip_pop(&mut self, line_width: f64) {
        self.push(&DrawCmd::ClipPop(PenConfig { line_width }));
    }

    pub fn rect(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.push(&DrawCmd::Rect(Rect { x1, y1, x2, y2 }));
    }

    fn push_tag(&mut self, opcode: Opcode) {
        self.buf.extend_from_slice(&opcode.as_u64().to_le_bytes());
    }
}
