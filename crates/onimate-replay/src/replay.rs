use onimate_draw::{
    Canvas, DrawConfig, DrawError, DrawStats, RecordingRenderer, RenderCall, StateScope,
};
use onimate_protocol::{StringRefError, StringTable};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::capture::{bind_strings, Capture, CAPTURE_VERSION};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("unsupported capture version {found} (expected {})", CAPTURE_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("frame {frame}, pass {pass}: {source}")]
    Draw {
        frame: usize,
        pass: usize,
        #[source]
        source: DrawError,
    },

    #[error("frame {frame}, pass {pass}: {source}")]
    Strings {
        frame: usize,
        pass: usize,
        #[source]
        source: StringRefError,
    },

    #[error("frame {frame}: {source}")]
    FrameEnd {
        frame: usize,
        #[source]
        source: DrawError,
    },

    /// Session-scoped clip state was still open after the last frame.
    #[error("end of session after frame {last_frame}: {source}")]
    SessionEnd {
        last_frame: usize,
        #[source]
        source: DrawError,
    },

    #[error("failed to serialize call log: {0}")]
    CallLog(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayOptions {
    pub draw: DrawConfig,
    pub glyph_advance: f64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            draw: DrawConfig::default(),
            glyph_advance: onimate_draw::recording::DEFAULT_GLYPH_ADVANCE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: usize,
    pub stats: DrawStats,
    pub calls: Vec<RenderCall>,
    /// Hex sha256 of the JSON-encoded call log.
    pub sha256: String,
}

/// Replays every frame of `capture` through a recording renderer.
///
/// Each pass gets a fresh string table holding only that pass's strings. The first failing pass
/// or unbalanced frame aborts the replay. Under [`StateScope::Session`] clip state may span
/// frames, so balance is checked once after the last frame instead.
pub fn replay_capture(
    capture: &Capture,
    options: &ReplayOptions,
) -> Result<Vec<FrameReport>, ReplayError> {
    if capture.version != CAPTURE_VERSION {
        return Err(ReplayError::UnsupportedVersion {
            found: capture.version,
        });
    }

    let renderer = RecordingRenderer::with_glyph_advance(options.glyph_advance);
    let mut canvas = Canvas::with_config(renderer, options.draw);
    let mut reports = Vec::with_capacity(capture.frames.len());
    let session = options.draw.state_scope == StateScope::Session;

    for (frame_index, frame) in capture.frames.iter().enumerate() {
        canvas.frame_start();
        for (pass_index, pass) in frame.passes.iter().enumerate() {
            let mut table = StringTable::new();
            let buffer = bind_strings(&pass.buffer, &pass.strings, &mut table).map_err(
                |source| ReplayError::Strings {
                    frame: frame_index,
                    pass: pass_index,
                    source,
                },
            )?;
            canvas
                .draw(&buffer, &mut table)
                .map_err(|source| ReplayError::Draw {
                    frame: frame_index,
                    pass: pass_index,
                    source,
                })?;
            if !table.is_empty() {
                let leaked = table.reclaim();
                tracing::warn!(
                    frame = frame_index,
                    pass = pass_index,
                    leaked,
                    "reclaimed strings no TEXT record consumed"
                );
            }
        }

        let stats = if session {
            *canvas.frame_stats()
        } else {
            canvas.end_frame().map_err(|source| ReplayError::FrameEnd {
                frame: frame_index,
                source,
            })?
        };
        let calls = canvas.renderer_mut().take_calls();
        let sha256 = call_log_digest(&calls)?;
        tracing::debug!(frame = frame_index, passes = stats.passes, %sha256, "replayed frame");
        reports.push(FrameReport {
            frame_index,
            stats,
            calls,
            sha256,
        });
    }

    if session {
        if let Some(last_frame) = capture.frames.len().checked_sub(1) {
            canvas
                .end_frame()
                .map_err(|source| ReplayError::SessionEnd { last_frame, source })?;
        }
    }
    Ok(reports)
}

pub fn call_log_digest(calls: &[RenderCall]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(calls)?;
    Ok(format!("{:x}", Sha256::digest(&json)))
}
