//! Normal maps: the encoded surfaces callers hand over, and the decoded
//! fields the lighting kernel consumes.

use nalgebra::Vector3;

use crate::error::RelightError;
use crate::surface_utils::image_surface::ImageSurface;

/// A surface whose first three channels encode per-pixel surface normals.
///
/// Channel values in [0, 1] map linearly onto direction components in
/// [-1, 1]: `decoded = 2 * encoded - 1`.  Channels past the third are
/// ignored.
#[derive(Debug, Clone)]
pub struct NormalMap {
    surface: ImageSurface,
}

impl NormalMap {
    /// Wraps an encoded surface, which must have at least three channels.
    pub fn new(surface: ImageSurface) -> Result<NormalMap, RelightError> {
        if surface.channels() < 3 {
            return Err(RelightError::InputMismatch(format!(
                "normal map needs at least 3 channels, got {}",
                surface.channels()
            )));
        }

        Ok(NormalMap { surface })
    }

    pub fn frames(&self) -> usize {
        self.surface.frames()
    }

    pub fn height(&self) -> usize {
        self.surface.height()
    }

    pub fn width(&self) -> usize {
        self.surface.width()
    }

    /// Decodes the [0, 1] channel values into signed direction components.
    pub fn decode(&self) -> NormalField {
        let channels = self.surface.channels();

        let mut data = Vec::with_capacity(self.frames() * self.height() * self.width() * 3);
        for sample in self.surface.data().chunks_exact(channels) {
            data.push(2.0 * sample[0] - 1.0);
            data.push(2.0 * sample[1] - 1.0);
            data.push(2.0 * sample[2] - 1.0);
        }

        // the shape was validated when the encoded surface was built
        let surface =
            ImageSurface::from_raw(self.frames(), self.height(), self.width(), 3, data).unwrap();

        NormalField { surface }
    }

    /// Decodes, then bilinearly resamples the field to the target resolution.
    ///
    /// Interpolation happens on the decoded values, so blending two opposing
    /// normals passes through zero rather than through the encoded midpoint.
    pub fn resample_to(&self, width: usize, height: usize) -> Result<NormalField, RelightError> {
        let decoded = self.decode();
        let surface = decoded.surface.resample_to(width, height)?;

        Ok(NormalField { surface })
    }
}

/// Decoded per-pixel normals, components in [-1, 1].
///
/// Decoded normals are used as stored; the kernel does not re-normalize them
/// per pixel, so slightly non-unit vectors shade slightly dimmer or brighter.
#[derive(Debug, Clone)]
pub struct NormalField {
    surface: ImageSurface,
}

impl NormalField {
    pub fn frames(&self) -> usize {
        self.surface.frames()
    }

    pub fn height(&self) -> usize {
        self.surface.height()
    }

    pub fn width(&self) -> usize {
        self.surface.width()
    }

    /// The three-channel surface holding the decoded components.
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    /// The decoded direction at one pixel.
    #[inline]
    pub fn normal(&self, frame: usize, x: usize, y: usize) -> Vector3<f64> {
        let p = self.surface.pixel(frame, x, y);

        Vector3::new(f64::from(p.r), f64::from(p.g), f64::from(p.b))
    }
}
