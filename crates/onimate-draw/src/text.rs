//! Ownership of the strings TEXT records point at.

use onimate_protocol::{StringTable, TextRun};

use crate::error::DrawError;
use crate::renderer::Renderer;

/// Resolves `run.text`, draws it and releases it.
///
/// The string is moved out of `strings` before the renderer sees it, so it is released exactly
/// once even if the renderer panics. A handle that was never issued or was already released
/// fails the pass.
pub(crate) fn draw_text<R: Renderer + ?Sized>(
    offset: usize,
    run: &TextRun,
    strings: &mut StringTable,
    renderer: &mut R,
) -> Result<(), DrawError> {
    let text = strings
        .take(run.text)
        .map_err(|source| DrawError::InvalidReference {
            offset,
            handle: run.text,
            source,
        })?;
    renderer.draw_text(run.x, run.y, run.size, &text);
    Ok(())
}

/// Width of `text` as the renderer would draw it. The empty string is always zero wide.
pub(crate) fn measure<R: Renderer + ?Sized>(renderer: &mut R, text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    renderer.measure_text(text)
}
