//! Render state carried across records.
//!
//! The dispatcher mirrors every state-changing record here before forwarding it to the
//! renderer, so imbalanced clip protocols are caught before the backend sees them and the
//! state a shape was drawn under can be inspected after the fact.

use onimate_protocol::{Bezier, Ellipse, Matrix, PenConfig, Rect};
use serde::{Deserialize, Serialize};

/// Geometry of a shape that contributes to a clip region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipGeometry {
    Ellipse(Ellipse),
    Bezier(Bezier),
    Rect(Rect),
}

/// A clip shape together with the transform it was drawn under.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipShape {
    pub geometry: ClipGeometry,
    pub transform: Matrix,
}

/// Shapes collected between one CLIP_START and its CLIP_END.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipPath {
    pub shapes: Vec<ClipShape>,
}

/// The active clip: the intersection of every installed path. No paths means unclipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipRegion {
    paths: Vec<ClipPath>,
}

impl ClipRegion {
    pub fn is_unclipped(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[ClipPath] {
        &self.paths
    }

    fn intersect(&mut self, path: ClipPath) {
        self.paths.push(path);
    }
}

/// Ways a clip record sequence can be out of balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClipImbalance {
    #[error("CLIP_POP with no saved clip region")]
    PopWithoutPush,
    #[error("CLIP_END without a matching CLIP_START")]
    EndWithoutStart,
    #[error("CLIP_START while a clip region is already being defined")]
    NestedStart,
    #[error("{depth} saved clip region(s) never popped")]
    UnpoppedPush { depth: usize },
    #[error("clip region definition never ended")]
    UnendedDefinition,
}

/// Transform, pen and clip state for one scope of decoding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderState {
    transform: Matrix,
    pen: Option<PenConfig>,
    clip: ClipRegion,
    saved: Vec<ClipRegion>,
    defining: Option<ClipPath>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> &Matrix {
        &self.transform
    }

    /// `None` until the first CONFIG or CLIP_POP.
    pub fn pen(&self) -> Option<&PenConfig> {
        self.pen.as_ref()
    }

    pub fn clip(&self) -> &ClipRegion {
        &self.clip
    }

    /// Number of saved clip regions.
    pub fn clip_depth(&self) -> usize {
        self.saved.len()
    }

    pub fn is_defining_clip(&self) -> bool {
        self.defining.is_some()
    }

    pub fn set_transform(&mut self, matrix: Matrix) {
        self.transform = matrix;
    }

    pub fn set_pen(&mut self, pen: PenConfig) {
        self.pen = Some(pen);
    }

    /// Adds a drawn shape to the clip path being defined, if any.
    pub fn record_shape(&mut self, geometry: ClipGeometry) {
        if let Some(path) = &mut self.defining {
            path.shapes.push(ClipShape {
                geometry,
                transform: self.transform,
            });
        }
    }

    pub fn clip_push(&mut self) {
        self.saved.push(self.clip.clone());
    }

    pub fn clip_start(&mut self) -> Result<(), ClipImbalance> {
        if self.defining.is_some() {
            return Err(ClipImbalance::NestedStart);
        }
        self.defining = Some(ClipPath::default());
        Ok(())
    }

    pub fn clip_end(&mut self) -> Result<(), ClipImbalance> {
        let path = self.defining.take().ok_or(ClipImbalance::EndWithoutStart)?;
        self.clip.intersect(path);
        Ok(())
    }

    pub fn clip_pop(&mut self) -> Result<(), ClipImbalance> {
        self.clip = self.saved.pop().ok_or(ClipImbalance::PopWithoutPush)?;
        Ok(())
    }

    /// Checks that every push was popped and every definition ended.
    pub fn check_balanced(&self) -> Result<(), ClipImbalance> {
        if self.defining.is_some() {
            return Err(ClipImbalance::UnendedDefinition);
        }
        if !self.saved.is_empty() {
            return Err(ClipImbalance::UnpoppedPush {
                depth: self.saved.len(),
            });
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rect() -> ClipGeometry {
        ClipGeometry::Rect(Rect {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        })
    }

    #[test]
    fn defaults_are_identity_and_unclipped() {
        let state = RenderState::new();
        assert_eq!(*state.transform(), Matrix::IDENTITY);
        assert!(state.pen().is_none());
        assert!(state.clip().is_unclipped());
        assert_eq!(state.clip_depth(), 0);
    }

    #[test]
    fn shapes_only_count_while_defining() {
        let mut state = RenderState::new();
        state.record_shape(unit_rect());
        state.clip_start().unwrap();
        state.set_transform(Matrix::translate(3.0, 4.0));
        state.record_shape(unit_rect());
        state.clip_end().unwrap();

        let paths = state.clip().paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].shapes.len(), 1);
        assert_eq!(paths[0].shapes[0].transform, Matrix::translate(3.0, 4.0));
    }

    #[test]
    fn end_intersects_with_active_clip() {
        let mut state = RenderState::new();
        for _ in 0..2 {
            state.clip_start().unwrap();
            state.record_shape(unit_rect());
            state.clip_end().unwrap();
        }
        assert_eq!(state.clip().paths().len(), 2);
    }

    #[test]
    fn pop_restores_saved_region() {
        let mut state = RenderState::new();
        state.clip_start().unwrap();
        state.record_shape(unit_rect());
        state.clip_end().unwrap();
        let before = state.clip().clone();

        state.clip_push();
        state.clip_start().unwrap();
        state.record_shape(unit_rect());
        state.clip_end().unwrap();
        assert_ne!(*state.clip(), before);

        state.clip_pop().unwrap();
        assert_eq!(*state.clip(), before);
        state.check_balanced().unwrap();
    }

    #[test]
    fn imbalances_are_reported() {
        let mut state = RenderState::new();
        assert_eq!(state.clip_pop(), Err(ClipImbalance::PopWithoutPush));
        assert_eq!(state.clip_end(), Err(ClipImbalance::EndWithoutStart));

        state.clip_start().unwrap();
        assert_eq!(state.clip_start(), Err(ClipImbalance::NestedStart));
        assert_eq!(
            state.check_balanced(),
            Err(ClipImbalance::UnendedDefinition)
        );
        state.clip_end().unwrap();

        state.clip_push();
        state.clip_push();
        assert_eq!(
            state.check_balanced(),
            Err(ClipImbalance::UnpoppedPush { depth: 2 })
        );

        state.reset();
        assert_eq!(state, RenderState::new());
    }
}
