use std::time::Duration;

use onimate_protocol::{DrawCmd, Opcode};
use serde::{Deserialize, Serialize};

/// Counters for one decode pass, or the sum of a frame's passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawStats {
    pub passes: usize,
    /// Executed records, END excluded.
    pub records: usize,
    pub shapes: usize,
    pub texts: usize,
    /// MATRIX and CONFIG records.
    pub state_changes: usize,
    pub clip_ops: usize,
    /// Bytes consumed, END included once reached.
    pub bytes_consumed: usize,
    pub elapsed: Duration,
}

impl DrawStats {
    pub(crate) fn count(&mut self, cmd: &DrawCmd) {
        self.records = self.records.saturating_add(1);
        let counter = match cmd.opcode() {
            Opcode::Ellipse | Opcode::Bezier | Opcode::Rect => &mut self.shapes,
            Opcode::Text => &mut self.texts,
            Opcode::Config | Opcode::Matrix => &mut self.state_changes,
            Opcode::ClipPush | Opcode::ClipStart | Opcode::ClipEnd | Opcode::ClipPop => {
                &mut self.clip_ops
            }
            Opcode::End => return,
        };
        *counter = counter.saturating_add(1);
    }

    /// Adds `other` into `self`.
    pub fn merge(&mut self, other: &DrawStats) {
        self.passes = self.passes.saturating_add(other.passes);
        self.records = self.records.saturating_add(other.records);
        self.shapes = self.shapes.saturating_add(other.shapes);
        self.texts = self.texts.saturating_add(other.texts);
        self.state_changes = self.state_changes.saturating_add(other.state_changes);
        self.clip_ops = self.clip_ops.saturating_add(other.clip_ops);
        self.bytes_consumed = self.bytes_consumed.saturating_add(other.bytes_consumed);
        self.elapsed = self.elapsed.saturating_add(other.elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onimate_protocol::PenConfig;

    #[test]
    fn counts_by_category_and_merges() {
        let mut a = DrawStats::default();
        a.count(&DrawCmd::ClipPush);
        a.count(&DrawCmd::ClipPop(PenConfig { line_width: 1.0 }));
        a.count(&DrawCmd::Config(PenConfig { line_width: 1.0 }));
        assert_eq!(a.records, 3);
        assert_eq!(a.clip_ops, 2);
        assert_eq!(a.state_changes, 1);

        let mut total = DrawStats::default();
        total.merge(&a);
        total.merge(&a);
        assert_eq!(total.records, 6);
        assert_eq!(total.shapes, 0);
    }

    #[test]
    fn counters_saturate_instead_of_wrapping() {
        let mut stats = DrawStats {
            records: usize::MAX,
            clip_ops: usize::MAX,
            ..DrawStats::default()
        };
        stats.count(&DrawCmd::ClipPush);
        assert_eq!(stats.records, usize::MAX);
        assert_eq!(stats.clip_ops, usize::MAX);
    }
}
