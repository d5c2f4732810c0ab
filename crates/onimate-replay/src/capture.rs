//! JSON captures of command buffers as a producer emitted them.

use std::collections::BTreeMap;

use base64::{engine::general_purpose, Engine as _};
use onimate_protocol::{
    CmdStreamIter, DrawCmd, EmitBuffer, EmitError, StringRef, StringRefError, StringTable,
    TextRun,
};
use serde::{Deserialize, Serialize};

pub const CAPTURE_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("cannot park text: {0}")]
    Strings(#[from] StringRefError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub version: u32,
    pub frames: Vec<CaptureFrame>,
}

/// Every buffer flushed between two `frame_start` calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureFrame {
    pub passes: Vec<CapturePass>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapturePass {
    /// The END-terminated command buffer, base64 in JSON.
    #[serde(with = "base64_bytes")]
    pub buffer: Vec<u8>,
    /// Text for each raw string handle the buffer's TEXT records carry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub strings: BTreeMap<u64, String>,
}

impl Capture {
    pub fn new() -> Self {
        Self {
            version: CAPTURE_VERSION,
            frames: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn pass_count(&self) -> usize {
        self.frames.iter().map(|f| f.passes.len()).sum()
    }
}

mod base64_bytes {
    use super::*;

    pub fn serialize<S: serde::Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        general_purpose::STANDARD
            .decode(text)
            .map_err(serde::de::Error::custom)
    }
}

/// Producer-side recorder: buffers draw commands the way the scripting engine does and
/// captures every flushed buffer together with the strings it references.
#[derive(Debug)]
pub struct CaptureRecorder {
    emit: EmitBuffer,
    strings: StringTable,
    frames: Vec<CaptureFrame>,
    current: Option<CaptureFrame>,
}

impl Default for CaptureRecorder {
    fn default() -> Self {
        Self::with_emit_buffer(EmitBuffer::default())
    }
}

impl CaptureRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emit_buffer(emit: EmitBuffer) -> Self {
        Self {
            emit,
            strings: StringTable::new(),
            frames: Vec::new(),
            current: None,
        }
    }

    /// Closes the current frame, if any, and opens a new one.
    pub fn frame_start(&mut self) {
        self.close_frame();
        self.current = Some(CaptureFrame::default());
    }

    pub fn push(&mut self, cmd: &DrawCmd) -> Result<(), CaptureError> {
        if let Some(buffer) = self.emit.push(cmd)? {
            self.record_pass(buffer);
        }
        Ok(())
    }

    /// Parks `text` in the recorder's string table and emits a TEXT record for it.
    pub fn text(
        &mut self,
        x: f64,
        y: f64,
        size: f64,
        text: impl Into<String>,
    ) -> Result<(), CaptureError> {
        let handle = self.strings.try_alloc(text)?;
        self.push(&DrawCmd::Text(TextRun {
            x,
            y,
            size,
            text: handle,
        }))
    }

    /// Flushes pending records and returns everything captured.
    pub fn finish(mut self) -> Capture {
        self.close_frame();
        if self.strings.live() > 0 {
            tracing::warn!(
                leaked = self.strings.live(),
                "strings allocated but never referenced by a flushed TEXT record"
            );
        }
        Capture {
            frames: self.frames,
            ..Capture::new()
        }
    }

    fn close_frame(&mut self) {
        if let Some(buffer) = self.emit.flush() {
            self.record_pass(buffer);
        }
        if let Some(frame) = self.current.take() {
            self.frames.push(frame);
        }
    }

    fn record_pass(&mut self, buffer: Vec<u8>) {
        let mut strings = BTreeMap::new();
        for record in CmdStreamIter::new(&buffer).flatten() {
            let DrawCmd::Text(run) = record.cmd else {
                continue;
            };
            match self.strings.take(run.text) {
                Ok(text) => {
                    strings.insert(run.text.to_raw(), text);
                }
                Err(err) => {
                    tracing::warn!(
                        offset = record.offset,
                        %err,
                        "TEXT record without a recorded string"
                    );
                }
            }
        }

        let frame = self.current.get_or_insert_with(CaptureFrame::default);
        frame.passes.push(CapturePass { buffer, strings });
    }
}

/// Copies `buffer`, re-allocating every captured string in `table` and rewriting TEXT
/// handles to the new ones.
///
/// Handles the capture has no text for are left as they are, so the draw fails on them the
/// way the recorded pass would have. Records sharing a captured handle share the rewritten
/// one too, so only the first of them finds its string. Rewriting stops at the first
/// undecodable record.
pub(crate) fn bind_strings(
    buffer: &[u8],
    strings: &BTreeMap<u64, String>,
    table: &mut StringTable,
) -> Result<Vec<u8>, StringRefError> {
    // Slot of `string_ref` within the TEXT payload.
    const TEXT_REF_SLOT: usize = 3;

    let mut out = buffer.to_vec();
    let mut bound: BTreeMap<u64, StringRef> = BTreeMap::new();
    for record in CmdStreamIter::new(buffer).map_while(Result::ok) {
        let DrawCmd::Text(run) = record.cmd else {
            continue;
        };
        let raw = run.text.to_raw();
        let handle = match bound.get(&raw) {
            Some(&handle) => handle,
            None => {
                let Some(text) = strings.get(&raw) else {
                    continue;
                };
                let handle = table.try_alloc(text.clone())?;
                bound.insert(raw, handle);
                handle
            }
        };
        let at = record.offset + (1 + TEXT_REF_SLOT) * onimate_protocol::SLOT_BYTES;
        out[at..at + 8].copy_from_slice(&handle.to_raw().to_le_bytes());
    }
    Ok(out)
}
