//! Typed draw commands and the table-driven record decoder.

use crate::cursor::{Payload, RecordCursor};
use crate::error::DecodeError;
use crate::opcode::Opcode;
use crate::strings::StringRef;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub x: f64,
    pub y: f64,
    pub rx: f64,
    pub ry: f64,
    /// Rotation in radians.
    pub rotation: f64,
}

/// Cubic bezier from `(x1, y1)` to `(x2, y2)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bezier {
    pub x1: f64,
    pub y1: f64,
    pub cx1: f64,
    pub cy1: f64,
    pub cx2: f64,
    pub cy2: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Axis-aligned rectangle given by two opposite corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// 2D affine transform in canvas `setTransform(a, b, c, d, e, f)` order:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Stroke configuration shared by CONFIG and CLIP_POP.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PenConfig {
    pub line_width: f64,
}

/// Payload of a TEXT record. The string itself lives in the producer's string table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub text: StringRef,
}

/// One decoded record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DrawCmd {
    End,
    Ellipse(Ellipse),
    Bezier(Bezier),
    Config(PenConfig),
    Matrix(Matrix),
    Text(TextRun),
    ClipPush,
    ClipStart,
    ClipEnd,
    /// Restores the saved clip region, then applies the pen configuration.
    ClipPop(PenConfig),
    Rect(Rect),
}

impl DrawCmd {
    pub fn opcode(&self) -> Opcode {
        match self {
            DrawCmd::End => Opcode::End,
            DrawCmd::Ellipse(_) => Opcode::Ellipse,
            DrawCmd::Bezier(_) => Opcode::Bezier,
            DrawCmd::Config(_) => Opcode::Config,
            DrawCmd::Matrix(_) => Opcode::Matrix,
            DrawCmd::Text(_) => Opcode::Text,
            DrawCmd::ClipPush => Opcode::ClipPush,
            DrawCmd::ClipStart => Opcode::ClipStart,
            DrawCmd::ClipEnd => Opcode::ClipEnd,
            DrawCmd::ClipPop(_) => Opcode::ClipPop,
            DrawCmd::Rect(_) => Opcode::Rect,
        }
    }

    /// Writes the meaningful payload slots of this command into `out` and returns how many
    /// were written. Remaining payload slots are reserved.
    pub fn payload_fields(&self, out: &mut [u64; crate::opcode::TEXT_PAYLOAD_SLOTS]) -> usize {
        match *self {
            DrawCmd::End | DrawCmd::ClipPush | DrawCmd::ClipStart | DrawCmd::ClipEnd => 0,
            DrawCmd::Ellipse(e) => put_f64s(out, &[e.x, e.y, e.rx, e.ry, e.rotation]),
            DrawCmd::Bezier(b) => put_f64s(
                out,
                &[b.x1, b.y1, b.cx1, b.cy1, b.cx2, b.cy2, b.x2, b.y2],
            ),
            DrawCmd::Config(p) | DrawCmd::ClipPop(p) => put_f64s(out, &[p.line_width]),
            DrawCmd::Matrix(m) => put_f64s(out, &[m.a, m.b, m.c, m.d, m.e, m.f]),
            DrawCmd::Rect(r) => put_f64s(out, &[r.x1, r.y1, r.x2, r.y2]),
            DrawCmd::Text(t) => {
                let n = put_f64s(out, &[t.x, t.y, t.size]);
                out[n] = t.text.to_raw();
                n + 1
            }
        }
    }
}

fn put_f64s(out: &mut [u64], vals: &[f64]) -> usize {
    for (dst, v) in out.iter_mut().zip(vals) {
        *dst = v.to_bits();
    }
    vals.len()
}

type DecodeFn = fn(&Payload<'_>) -> Result<DrawCmd, DecodeError>;

/// Decoder registered for one opcode.
#[derive(Clone, Copy)]
pub struct DecodeEntry {
    pub opcode: Opcode,
    pub decode: DecodeFn,
}

impl std::fmt::Debug for DecodeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeEntry")
            .field("opcode", &self.opcode)
            .finish_non_exhaustive()
    }
}

/// Decoders indexed by opcode value. Unknown tags have no entry and are rejected.
static DECODE_TABLE: [DecodeEntry; 11] = [
    DecodeEntry {
        opcode: Opcode::End,
        decode: decode_end,
    },
    DecodeEntry {
        opcode: Opcode::Ellipse,
        decode: decode_ellipse,
    },
    DecodeEntry {
        opcode: Opcode::Bezier,
        decode: decode_bezier,
    },
    DecodeEntry {
        opcode: Opcode::Config,
        decode: decode_config,
    },
    DecodeEntry {
        opcode: Opcode::Matrix,
        decode: decode_matrix,
    },
    DecodeEntry {
        opcode: Opcode::Text,
        decode: decode_text,
    },
    DecodeEntry {
        opcode: Opcode::ClipPush,
        decode: decode_clip_push,
    },
    DecodeEntry {
        opcode: Opcode::ClipStart,
        decode: decode_clip_start,
    },
    DecodeEntry {
        opcode: Opcode::ClipEnd,
        decode: decode_clip_end,
    },
    DecodeEntry {
        opcode: Opcode::ClipPop,
        decode: decode_clip_pop,
    },
    DecodeEntry {
        opcode: Opcode::Rect,
        decode: decode_rect,
    },
];

/// Looks up the decoder for a raw tag value.
pub fn decode_entry(tag: u64) -> Option<&'static DecodeEntry> {
    let entry = DECODE_TABLE.get(usize::try_from(tag).ok()?)?;
    debug_assert_eq!(entry.opcode.as_u64(), tag);
    Some(entry)
}

/// A decoded record together with its position in the buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedRecord {
    /// Byte offset of the record's tag slot.
    pub offset: usize,
    pub cmd: DrawCmd,
}

impl DecodedRecord {
    pub fn opcode(&self) -> Opcode {
        self.cmd.opcode()
    }

    pub fn record_bytes(&self) -> usize {
        self.cmd.opcode().record_bytes()
    }
}

/// Decodes the record under `cursor` without advancing it.
pub fn decode_record(cursor: &RecordCursor<'_>) -> Result<DecodedRecord, DecodeError> {
    let offset = cursor.position();
    let tag = cursor.peek_tag()?;
    let entry = decode_entry(tag).ok_or(DecodeError::UnknownOpcode { offset, tag })?;
    let payload = cursor.read(entry.opcode.payload_slots())?;
    let cmd = (entry.decode)(&payload)?;
    Ok(DecodedRecord { offset, cmd })
}

fn decode_end(_: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::End)
}

fn decode_ellipse(p: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::Ellipse(Ellipse {
        x: p.f64_at(0)?,
        y: p.f64_at(1)?,
        rx: p.f64_at(2)?,
        ry: p.f64_at(3)?,
        rotation: p.f64_at(4)?,
    }))
}

fn decode_bezier(p: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::Bezier(Bezier {
        x1: p.f64_at(0)?,
        y1: p.f64_at(1)?,
        cx1: p.f64_at(2)?,
        cy1: p.f64_at(3)?,
        cx2: p.f64_at(4)?,
        cy2: p.f64_at(5)?,
        x2: p.f64_at(6)?,
        y2: p.f64_at(7)?,
    }))
}

fn decode_pen(p: &Payload<'_>) -> Result<PenConfig, DecodeError> {
    Ok(PenConfig {
        line_width: p.f64_at(0)?,
    })
}

fn decode_config(p: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    decode_pen(p).map(DrawCmd::Config)
}

fn decode_clip_push(_: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::ClipPush)
}

fn decode_clip_start(_: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::ClipStart)
}

fn decode_clip_end(_: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::ClipEnd)
}

fn decode_clip_pop(p: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    decode_pen(p).map(DrawCmd::ClipPop)
}

fn decode_matrix(p: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::Matrix(Matrix {
        a: p.f64_at(0)?,
        b: p.f64_at(1)?,
        c: p.f64_at(2)?,
        d: p.f64_at(3)?,
        e: p.f64_at(4)?,
        f: p.f64_at(5)?,
    }))
}

fn decode_text(p: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::Text(TextRun {
        x: p.f64_at(0)?,
        y: p.f64_at(1)?,
        size: p.f64_at(2)?,
        text: StringRef::from_raw(p.u64_at(3)?),
    }))
}

fn decode_rect(p: &Payload<'_>) -> Result<DrawCmd, DecodeError> {
    Ok(DrawCmd::Rect(Rect {
        x1: p.f64_at(0)?,
        y1: p.f64_at(1)?,
        x2: p.f64_at(2)?,
        y2: p.f64_at(3)?,
    }))
}

/// Walks a command buffer and yields every record before END without executing anything.
///
/// Iteration stops after END or after the first error.
pub struct CmdStreamIter<'a> {
    cursor: RecordCursor<'a>,
    done: bool,
    terminated: bool,
}

impl<'a> CmdStreamIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: RecordCursor::new(buf),
            done: false,
            terminated: false,
        }
    }

    /// Bytes consumed so far, including the END record once it has been reached.
    pub fn consumed(&self) -> usize {
        self.cursor.position()
    }

    /// Whether END has been reached.
    pub fn terminated(&self) -> bool {
        self.terminated
    }
}

impl<'a> Iterator for CmdStreamIter<'a> {
    type Item = Result<DecodedRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let record = match decode_record(&self.cursor) {
            Ok(record) => record,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };
        if let Err(err) = self.cursor.advance(record.opcode().record_slots()) {
            self.done = true;
            return Some(Err(err));
        }

        if record.cmd == DrawCmd::End {
            self.done = true;
            self.terminated = true;
            return None;
        }
        Some(Ok(record))
    }
}

/// Decodes a whole buffer into typed commands (END excluded).
pub fn decode_all(buf: &[u8]) -> Result<Vec<DecodedRecord>, DecodeError> {
    CmdStreamIter::new(buf).collect()
}
