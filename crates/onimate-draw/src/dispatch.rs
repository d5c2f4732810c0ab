//! The decode loop: one record at a time, table lookup, execute, advance, until END.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use onimate_protocol::{decode_record, DecodedRecord, DrawCmd, Opcode, RecordCursor, StringTable};

use crate::error::DrawError;
use crate::renderer::Renderer;
use crate::state::{ClipGeometry, ClipImbalance, RenderState};
use crate::stats::DrawStats;
use crate::text;

/// Outcome of a single [`Dispatcher::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A record was executed and the cursor moved past it.
    Executed(Opcode),
    /// END was reached; the pass is over.
    End,
}

/// Executes one command buffer against a render state and a renderer.
///
/// The dispatcher borrows everything it touches, so two passes can never share a cursor and a
/// string table cannot be refilled while a pass is still reading from it.
pub struct Dispatcher<'a, R: Renderer + ?Sized> {
    cursor: RecordCursor<'a>,
    state: &'a mut RenderState,
    strings: &'a mut StringTable,
    renderer: &'a mut R,
    max_records: Option<usize>,
    cancel: Option<&'a AtomicBool>,
    stats: DrawStats,
    finished: bool,
}

impl<'a, R: Renderer + ?Sized> Dispatcher<'a, R> {
    pub fn new(
        buf: &'a [u8],
        state: &'a mut RenderState,
        strings: &'a mut StringTable,
        renderer: &'a mut R,
    ) -> Self {
        Self {
            cursor: RecordCursor::new(buf),
            state,
            strings,
            renderer,
            max_records: None,
            cancel: None,
            stats: DrawStats::default(),
            finished: false,
        }
    }

    /// Fails the pass once more than `limit` records would execute.
    pub fn with_record_limit(mut self, limit: Option<usize>) -> Self {
        self.max_records = limit;
        self
    }

    /// Checks `flag` before every record and stops with [`DrawError::Cancelled`] once it is set.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Byte offset of the next record.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn stats(&self) -> &DrawStats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decodes and executes the record at the cursor.
    ///
    /// Stepping after END keeps returning [`Step::End`] without reading.
    pub fn step(&mut self) -> Result<Step, DrawError> {
        if self.finished {
            return Ok(Step::End);
        }

        let offset = self.cursor.position();
        if let Some(flag) = self.cancel {
            if flag.load(Ordering::Acquire) {
                return Err(DrawError::Cancelled { offset });
            }
        }

        let record = decode_record(&self.cursor)?;
        let opcode = record.opcode();
        if opcode == Opcode::End {
            self.cursor.advance(opcode.record_slots())?;
            self.stats.bytes_consumed = self.cursor.position();
            self.finished = true;
            return Ok(Step::End);
        }

        if let Some(limit) = self.max_records {
            if self.stats.records >= limit {
                return Err(DrawError::RecordLimitExceeded { offset, limit });
            }
        }

        tracing::trace!(offset, opcode = %opcode, "execute record");
        self.execute(&record)?;
        self.stats.count(&record.cmd);
        self.cursor.advance(opcode.record_slots())?;
        self.stats.bytes_consumed = self.cursor.position();
        Ok(Step::Executed(opcode))
    }

    /// Runs until END and returns the pass statistics.
    pub fn run(mut self) -> Result<DrawStats, DrawError> {
        let started = Instant::now();
        while self.step()? != Step::End {}
        self.stats.passes = 1;
        self.stats.elapsed = started.elapsed();
        Ok(self.stats)
    }

    fn execute(&mut self, record: &DecodedRecord) -> Result<(), DrawError> {
        let offset = record.offset;
        let unbalanced = move |imbalance: ClipImbalance| DrawError::UnbalancedClipStack {
            offset: Some(offset),
            imbalance,
        };

        match &record.cmd {
            DrawCmd::End => {}
            DrawCmd::Ellipse(ellipse) => {
                self.state.record_shape(ClipGeometry::Ellipse(*ellipse));
                self.renderer.draw_ellipse(ellipse);
            }
            DrawCmd::Bezier(bezier) => {
                self.state.record_shape(ClipGeometry::Bezier(*bezier));
                self.renderer.draw_bezier(bezier);
            }
            DrawCmd::Rect(rect) => {
                self.state.record_shape(ClipGeometry::Rect(*rect));
                self.renderer.draw_rect(rect);
            }
            DrawCmd::Config(pen) => {
                self.state.set_pen(*pen);
                self.renderer.draw_config(pen);
            }
            DrawCmd::Matrix(matrix) => {
                self.state.set_transform(*matrix);
                self.renderer.set_matrix(matrix);
            }
            DrawCmd::Text(run) => {
                text::draw_text(offset, run, &mut *self.strings, &mut *self.renderer)?;
            }
            DrawCmd::ClipPush => {
                self.state.clip_push();
                self.renderer.clip_push();
            }
            DrawCmd::ClipStart => {
                self.state.clip_start().map_err(unbalanced)?;
                self.renderer.clip_start();
            }
            DrawCmd::ClipEnd => {
                self.state.clip_end().map_err(unbalanced)?;
                self.renderer.clip_end();
            }
            DrawCmd::ClipPop(pen) => {
                // Pop first, then configure.
                self.state.clip_pop().map_err(unbalanced)?;
                self.renderer.clip_pop();
                self.state.set_pen(*pen);
                self.renderer.draw_config(pen);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{RecordingRenderer, RenderCall};
    use onimate_protocol::{CmdWriter, DecodeError, PenConfig, Rect};

    #[test]
    fn steps_one_record_at_a_time() {
        let mut w = CmdWriter::new();
        w.config(2.0);
        w.rect(0.0, 0.0, 5.0, 5.0);
        let buf = w.finish();

        let mut state = RenderState::new();
        let mut strings = StringTable::new();
        let mut rec = RecordingRenderer::new();
        let mut d = Dispatcher::new(&buf, &mut state, &mut strings, &mut rec);

        assert_eq!(d.step().unwrap(), Step::Executed(Opcode::Config));
        assert_eq!(d.position(), 72);
        assert_eq!(d.step().unwrap(), Step::Executed(Opcode::Rect));
        assert_eq!(d.step().unwrap(), Step::End);
        assert!(d.is_finished());
        assert_eq!(d.stats().bytes_consumed, 152);
        assert_eq!(d.step().unwrap(), Step::End);

        assert_eq!(
            rec.calls(),
            [
                RenderCall::Config(PenConfig { line_width: 2.0 }),
                RenderCall::Rect(Rect {
                    x1: 0.0,
                    y1: 0.0,
                    x2: 5.0,
                    y2: 5.0
                }),
            ]
        );
        assert_eq!(state.pen(), Some(&PenConfig { line_width: 2.0 }));
    }

    #[test]
    fn record_limit_stops_before_the_extra_record() {
        let mut w = CmdWriter::new();
        w.clip_push();
        w.clip_pop(1.0);
        let buf = w.finish();

        let mut state = RenderState::new();
        let mut strings = StringTable::new();
        let mut rec = RecordingRenderer::new();
        let err = Dispatcher::new(&buf, &mut state, &mut strings, &mut rec)
            .with_record_limit(Some(1))
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            DrawError::RecordLimitExceeded {
                offset: 72,
                limit: 1
            }
        );
        assert_eq!(rec.calls(), [RenderCall::ClipPush]);
    }

    #[test]
    fn preset_cancel_flag_runs_nothing() {
        let mut w = CmdWriter::new();
        w.clip_push();
        let buf = w.finish();
        let cancel = AtomicBool::new(true);

        let mut state = RenderState::new();
        let mut strings = StringTable::new();
        let mut rec = RecordingRenderer::new();
        let err = Dispatcher::new(&buf, &mut state, &mut strings, &mut rec)
            .with_cancel(&cancel)
            .run()
            .unwrap_err();
        assert_eq!(err, DrawError::Cancelled { offset: 0 });
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn truncated_buffer_is_out_of_bounds() {
        let mut w = CmdWriter::new();
        w.clip_start();
        let mut buf = w.finish();
        buf.truncate(72);

        let mut state = RenderState::new();
        let mut strings = StringTable::new();
        let mut rec = RecordingRenderer::new();
        let err = Dispatcher::new(&buf, &mut state, &mut strings, &mut rec)
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            DrawError::Decode(DecodeError::OutOfBounds {
                offset: 72,
                needed: 8,
                available: 0
            })
        );
        assert!(state.is_defining_clip());
    }
}
