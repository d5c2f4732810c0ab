//! Consumer side of the onimate draw command stream.
//!
//! [`Canvas`] is what a host embeds: it owns a [`Renderer`] and the [`RenderState`] that
//! MATRIX, CONFIG and the clip records mutate, and it exposes the three boundary operations
//! (`frame_start`, `draw`, `measure`). Each `draw` call runs a [`Dispatcher`] over one
//! END-terminated buffer.

mod canvas;
mod config;
pub mod dispatch;
mod error;
pub mod recording;
mod renderer;
pub mod state;
mod stats;
mod text;

pub use canvas::Canvas;
pub use config::{DrawConfig, StateScope};
pub use dispatch::{Dispatcher, Step};
pub use error::DrawError;
pub use recording::{RecordingRenderer, RenderCall};
pub use renderer::Renderer;
pub use state::{ClipGeometry, ClipImbalance, ClipPath, ClipRegion, ClipShape, RenderState};
pub use stats::DrawStats;

pub use onimate_protocol as protocol;
