use onimate_protocol::{Bezier, Ellipse, Matrix, PenConfig, Rect};

/// Host-side drawing backend driven by the dispatcher.
///
/// The calls mirror a 2D canvas: shapes carry no style of their own and are drawn with
/// whatever transform, clip and pen the backend was last given. Calls arrive in record order.
pub trait Renderer {
    /// A new frame begins. Backends typically clear their surface here.
    fn frame_start(&mut self) {}

    fn draw_ellipse(&mut self, ellipse: &Ellipse);
    fn draw_bezier(&mut self, bezier: &Bezier);
    fn draw_rect(&mut self, rect: &Rect);
    fn draw_text(&mut self, x: f64, y: f64, size: f64, text: &str);

    /// Replaces the current transform.
    fn set_matrix(&mut self, matrix: &Matrix);
    /// Replaces the current pen configuration.
    fn draw_config(&mut self, pen: &PenConfig);

    /// Saves the current clip region.
    fn clip_push(&mut self);
    /// Starts collecting the shapes that define the next clip region.
    fn clip_start(&mut self);
    /// Installs the collected shapes as the active clip.
    fn clip_end(&mut self);
    /// Restores the most recently saved clip region.
    fn clip_pop(&mut self);

    /// Width of `text` when drawn by this backend. Must not change any drawing state.
    fn measure_text(&mut self, text: &str) -> f64;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn frame_start(&mut self) {
        (**self).frame_start()
    }

    fn draw_ellipse(&mut self, ellipse: &Ellipse) {
        (**self).draw_ellipse(ellipse)
    }

    fn draw_bezier(&mut self, bezier: &Bezier) {
        (**self).draw_bezier(bezier)
    }

    fn draw_rect(&mut self, rect: &Rect) {
        (**self).draw_rect(rect)
    }

    fn draw_text(&mut self, x: f64, y: f64, size: f64, text: &str) {
        (**self).draw_text(x, y, size, text)
    }

    fn set_matrix(&mut self, matrix: &Matrix) {
        (**self).set_matrix(matrix)
    }

    fn draw_config(&mut self, pen: &PenConfig) {
        (**self).draw_config(pen)
    }

    fn clip_push(&mut self) {
        (**self).clip_push()
    }

    fn clip_start(&mut self) {
        (**self).clip_start()
    }

    fn clip_end(&mut self) {
        (**self).clip_end()
    }

    fn clip_pop(&mut self) {
        (**self).clip_pop()
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        (**self).measure_text(text)
    }
}
