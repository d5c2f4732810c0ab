//! A [`Renderer`] that records every call instead of drawing.
//!
//! Used by the replay tool and by tests that assert on call order.

use onimate_protocol::{Bezier, Ellipse, Matrix, PenConfig, Rect};
use serde::{Deserialize, Serialize};

use crate::renderer::Renderer;

/// Advance per character used when no other width is configured.
pub const DEFAULT_GLYPH_ADVANCE: f64 = 8.0;

/// One renderer call as observed by [`RecordingRenderer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCall {
    FrameStart,
    Ellipse(Ellipse),
    Bezier(Bezier),
    Rect(Rect),
    Text {
        x: f64,
        y: f64,
        size: f64,
        text: String,
    },
    Matrix(Matrix),
    Config(PenConfig),
    ClipPush,
    ClipStart,
    ClipEnd,
    ClipPop,
}

#[derive(Clone, Debug)]
pub struct RecordingRenderer {
    calls: Vec<RenderCall>,
    glyph_advance: f64,
    measured: usize,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::with_glyph_advance(DEFAULT_GLYPH_ADVANCE)
    }

    /// Text measures `glyph_advance` per character.
    pub fn with_glyph_advance(glyph_advance: f64) -> Self {
        Self {
            calls: Vec::new(),
            glyph_advance,
            measured: 0,
        }
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<RenderCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of `measure_text` queries answered. Measurement is not a drawing call and never
    /// appears in [`calls`](Self::calls).
    pub fn measure_count(&self) -> usize {
        self.measured
    }
}

impl Renderer for RecordingRenderer {
    fn frame_start(&mut self) {
        self.calls.push(RenderCall::FrameStart);
    }

    fn draw_ellipse(&mut self, ellipse: &Ellipse) {
        self.calls.push(RenderCall::Ellipse(*ellipse));
    }

    fn draw_bezier(&mut self, bezier: &Bezier) {
        self.calls.push(RenderCall::Bezier(*bezier));
    }

    fn draw_rect(&mut self, rect: &Rect) {
        self.calls.push(RenderCall::Rect(*rect));
    }

    fn draw_text(&mut self, x: f64, y: f64, size: f64, text: &str) {
        self.calls.push(RenderCall::Text {
            x,
            y,
            size,
            text: text.to_owned(),
        });
    }

    fn set_matrix(&mut self, matrix: &Matrix) {
        self.calls.push(RenderCall::Matrix(*matrix));
    }

    fn draw_config(&mut self, pen: &PenConfig) {
        self.calls.push(RenderCall::Config(*pen));
    }

    fn clip_push(&mut self) {
        self.calls.push(RenderCall::ClipPush);
    }

    fn clip_start(&mut self) {
        self.calls.push(RenderCall::ClipStart);
    }

    fn clip_end(&mut self) {
        self.calls.push(RenderCall::ClipEnd);
    }

    fn clip_pop(&mut self) {
        self.calls.push(RenderCall::ClipPop);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.measured += 1;
        self.glyph_advance * text.chars().count() as f64
    }
}
