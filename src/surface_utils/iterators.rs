//! Pixel iterators for `ImageSurface`.

use super::image_surface::ImageSurface;
use super::Pixel;

/// Iterator over the RGB pixels of one frame of an `ImageSurface`.
///
/// Yields `(x, y, pixel)` in row-major order.
pub struct Pixels<'a> {
    surface: &'a ImageSurface,
    frame: usize,
    x: usize,
    y: usize,
}

impl<'a> Pixels<'a> {
    /// Creates an iterator over one frame's pixels.
    #[inline]
    pub fn new(surface: &'a ImageSurface, frame: usize) -> Self {
        assert!(frame < surface.frames());
        assert!(surface.channels() >= 3);

        Self {
            surface,
            frame,
            x: 0,
            y: 0,
        }
    }
}

impl<'a> Iterator for Pixels<'a> {
    type Item = (usize, usize, Pixel);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.surface.height() {
            return None;
        }

        let item = (
            self.x,
            self.y,
            self.surface.pixel(self.frame, self.x, self.y),
        );

        self.x += 1;
        if self.x >= self.surface.width() {
            self.x = 0;
            self.y += 1;
        }

        Some(item)
    }
}
