//! Onimate draw command record layouts.
//!
//! Every record is a sequence of 8-byte slots: one tag slot holding the opcode as a
//! little-endian `u64`, followed by a fixed, opcode-determined number of payload slots.
//! Numeric payload fields are little-endian `f64`; unused trailing slots are reserved and
//! written as zero.
//!
//! Opcode values are append-only. Existing values must never be renumbered.

/// Size of one slot in bytes.
pub const SLOT_BYTES: usize = 8;

/// Number of slots occupied by the tag that starts every record.
pub const TAG_SLOTS: usize = 1;

/// Payload slot count shared by every opcode except END and TEXT.
pub const STANDARD_PAYLOAD_SLOTS: usize = 8;

/// TEXT carries one extra payload slot.
pub const TEXT_PAYLOAD_SLOTS: usize = 9;

/// Largest record any opcode produces, in slots (TEXT: tag + 9).
pub const MAX_RECORD_SLOTS: usize = TAG_SLOTS + TEXT_PAYLOAD_SLOTS;

#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    End = 0,
    Ellipse = 1,
    Bezier = 2,
    Config = 3,
    Matrix = 4,
    Text = 5,
    ClipPush = 6,
    ClipStart = 7,
    ClipEnd = 8,
    ClipPop = 9,
    Rect = 10,
}

impl Opcode {
    /// All opcodes, indexed by their wire value.
    pub const ALL: [Opcode; 11] = [
        Opcode::End,
        Opcode::Ellipse,
        Opcode::Bezier,
        Opcode::Config,
        Opcode::Matrix,
        Opcode::Text,
        Opcode::ClipPush,
        Opcode::ClipStart,
        Opcode::ClipEnd,
        Opcode::ClipPop,
        Opcode::Rect,
    ];

    pub const fn from_u64(v: u64) -> Option<Self> {
        match v {
            0 => Some(Self::End),
            1 => Some(Self::Ellipse),
            2 => Some(Self::Bezier),
            3 => Some(Self::Config),
            4 => Some(Self::Matrix),
            5 => Some(Self::Text),
            6 => Some(Self::ClipPush),
            7 => Some(Self::ClipStart),
            8 => Some(Self::ClipEnd),
            9 => Some(Self::ClipPop),
            10 => Some(Self::Rect),
            _ => None,
        }
    }

    pub const fn as_u64(self) -> u64 {
        self as u64
    }

    /// Number of payload slots following the tag.
    pub const fn payload_slots(self) -> usize {
        match self {
            Self::End => 0,
            Self::Text => TEXT_PAYLOAD_SLOTS,
            _ => STANDARD_PAYLOAD_SLOTS,
        }
    }

    /// Total record length in slots, tag included.
    pub const fn record_slots(self) -> usize {
        TAG_SLOTS + self.payload_slots()
    }

    /// Total record length in bytes, tag included.
    pub const fn record_bytes(self) -> usize {
        self.record_slots() * SLOT_BYTES
    }

    pub fn layout(self) -> &'static RecordLayout {
        &OPCODE_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.layout().name
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of one record kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    pub opcode: Opcode,
    pub name: &'static str,
    pub payload_slots: usize,
    /// Names of the meaningful payload slots, in slot order. Slots past the end of this list
    /// are reserved.
    pub fields: &'static [&'static str],
}

impl RecordLayout {
    pub const fn reserved_slots(&self) -> usize {
        self.payload_slots - self.fields.len()
    }
}

/// Record layouts indexed by opcode value.
pub static OPCODE_TABLE: [RecordLayout; 11] = [
    RecordLayout {
        opcode: Opcode::End,
        name: "END",
        payload_slots: 0,
        fields: &[],
    },
    RecordLayout {
        opcode: Opcode::Ellipse,
        name: "ELLIPSE",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &["x", "y", "rx", "ry", "rotation"],
    },
    RecordLayout {
        opcode: Opcode::Bezier,
        name: "BEZIER",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &["x1", "y1", "cx1", "cy1", "cx2", "cy2", "x2", "y2"],
    },
    RecordLayout {
        opcode: Opcode::Config,
        name: "CONFIG",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &["line_width"],
    },
    RecordLayout {
        opcode: Opcode::Matrix,
        name: "MATRIX",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &["a", "b", "c", "d", "e", "f"],
    },
    RecordLayout {
        opcode: Opcode::Text,
        name: "TEXT",
        payload_slots: TEXT_PAYLOAD_SLOTS,
        fields: &["x", "y", "size", "string_ref"],
    },
    RecordLayout {
        opcode: Opcode::ClipPush,
        name: "CLIP_PUSH",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &[],
    },
    RecordLayout {
        opcode: Opcode::ClipStart,
        name: "CLIP_START",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &[],
    },
    RecordLayout {
        opcode: Opcode::ClipEnd,
        name: "CLIP_END",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &[],
    },
    RecordLayout {
        opcode: Opcode::ClipPop,
        name: "CLIP_POP",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &["line_width"],
    },
    RecordLayout {
        opcode: Opcode::Rect,
        name: "RECT",
        payload_slots: STANDARD_PAYLOAD_SLOTS,
        fields: &["x1", "y1", "x2", "y2"],
    },
];
