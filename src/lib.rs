//! Onimate: a compact binary draw-command stream between a scripting engine and a host
//! renderer.
//!
//! - [`protocol`]: wire format, encoder, decoder and the string table TEXT records point into.
//! - [`draw`]: the host side (dispatcher, render state, renderer trait, [`Canvas`]).

pub use onimate_draw as draw;
pub use onimate_protocol as protocol;

pub use onimate_draw::{Canvas, DrawConfig, DrawError, DrawStats, Renderer, StateScope};
pub use onimate_protocol::{CmdWriter, DrawCmd, EmitBuffer, StringRef, StringTable};
