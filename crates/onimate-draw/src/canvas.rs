//! The host side of the boundary: `frame_start`, `draw` and `measure`.

use std::sync::atomic::AtomicBool;

use onimate_protocol::StringTable;

use crate::config::{DrawConfig, StateScope};
use crate::dispatch::Dispatcher;
use crate::error::DrawError;
use crate::renderer::Renderer;
use crate::state::RenderState;
use crate::stats::DrawStats;
use crate::text;

/// Owns a renderer and the render state that persists between passes.
pub struct Canvas<R: Renderer> {
    renderer: R,
    state: RenderState,
    config: DrawConfig,
    frame: u64,
    frame_stats: DrawStats,
}

impl<R: Renderer> Canvas<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, DrawConfig::default())
    }

    pub fn with_config(renderer: R, config: DrawConfig) -> Self {
        Self {
            renderer,
            state: RenderState::new(),
            config,
            frame: 0,
            frame_stats: DrawStats::default(),
        }
    }

    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Frames started so far.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Totals for the passes drawn since the last `frame_start`.
    pub fn frame_stats(&self) -> &DrawStats {
        &self.frame_stats
    }

    /// Begins a new frame.
    ///
    /// Under [`StateScope::Frame`] the render state is discarded here. Left-over clip state from
    /// the previous frame is logged, not reported; use [`end_frame`](Self::end_frame) to treat
    /// it as an error.
    pub fn frame_start(&mut self) {
        if self.config.state_scope == StateScope::Frame {
            if let Err(imbalance) = self.state.check_balanced() {
                tracing::warn!(frame = self.frame, %imbalance, "discarding unbalanced clip state");
            }
            self.state.reset();
        }
        self.frame += 1;
        self.frame_stats = DrawStats::default();
        self.renderer.frame_start();
    }

    /// Decodes and executes one END-terminated command buffer.
    ///
    /// TEXT strings are taken out of `strings` as their records execute. On error, strings
    /// referenced by records after the failing one stay in the table; the caller decides
    /// whether to [`reclaim`](StringTable::reclaim) them.
    pub fn draw(&mut self, buf: &[u8], strings: &mut StringTable) -> Result<DrawStats, DrawError> {
        self.draw_inner(buf, strings, None)
    }

    /// Like [`draw`](Self::draw), but stops at the next record boundary once `cancel` is set.
    pub fn draw_cancellable(
        &mut self,
        buf: &[u8],
        strings: &mut StringTable,
        cancel: &AtomicBool,
    ) -> Result<DrawStats, DrawError> {
        self.draw_inner(buf, strings, Some(cancel))
    }

    fn draw_inner(
        &mut self,
        buf: &[u8],
        strings: &mut StringTable,
        cancel: Option<&AtomicBool>,
    ) -> Result<DrawStats, DrawError> {
        if self.config.state_scope == StateScope::Pass {
            self.state.reset();
        }

        let mut dispatcher = Dispatcher::new(buf, &mut self.state, strings, &mut self.renderer)
            .with_record_limit(self.config.max_records);
        if let Some(flag) = cancel {
            dispatcher = dispatcher.with_cancel(flag);
        }

        let stats = match dispatcher.run() {
            Ok(stats) => stats,
            Err(err) => {
                tracing::debug!(frame = self.frame, error = %err, "draw pass failed");
                return Err(err);
            }
        };

        if self.config.state_scope == StateScope::Pass {
            self.state
                .check_balanced()
                .map_err(|imbalance| DrawError::UnbalancedClipStack {
                    offset: None,
                    imbalance,
                })?;
        }

        tracing::debug!(
            frame = self.frame,
            records = stats.records,
            bytes = stats.bytes_consumed,
            elapsed_us = stats.elapsed.as_micros() as u64,
            "draw pass complete"
        );
        self.frame_stats.merge(&stats);
        Ok(stats)
    }

    /// Width of `text` as the renderer would draw it. Touches no render state.
    pub fn measure(&mut self, text: &str) -> f64 {
        text::measure(&mut self.renderer, text)
    }

    /// Checks that the frame left no clip pushed and no definition open, and returns the frame's
    /// totals.
    pub fn end_frame(&mut self) -> Result<DrawStats, DrawError> {
        self.state
            .check_balanced()
            .map_err(|imbalance| DrawError::UnbalancedClipStack {
                offset: None,
                imbalance,
            })?;
        Ok(self.frame_stats)
    }
}
