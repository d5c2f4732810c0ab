//! Capture and replay of onimate command buffers.
//!
//! A [`Capture`] is a JSON record of the buffers a producer flushed, grouped by frame, with the
//! strings their TEXT records referenced. [`replay_capture`] feeds it back through a
//! [`onimate_draw::Canvas`] with a recording renderer and reports a call log and digest per
//! frame, which makes renderer-visible regressions easy to diff.

mod capture;
mod replay;

pub use capture::{
    Capture, CaptureError, CaptureFrame, CapturePass, CaptureRecorder, CAPTURE_VERSION,
};
pub use replay::{call_log_digest, replay_capture, FrameReport, ReplayError, ReplayOptions};
