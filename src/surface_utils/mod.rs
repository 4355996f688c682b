//! Various utilities for working with float image surfaces.

pub mod image_surface;
pub mod iterators;

use rgb::ComponentMap;

use crate::util::clamp;

/// A pixel consisting of the R, G and B channels of one image sample.
pub type Pixel = rgb::RGB<f32>;

/// Trait to read a `Pixel` out of the leading channels of a sample slice.
pub trait ToPixel {
    fn to_pixel(&self) -> Pixel;
}

impl ToPixel for [f32] {
    #[inline]
    fn to_pixel(&self) -> Pixel {
        Pixel {
            r: self[0],
            g: self[1],
            b: self[2],
        }
    }
}

/// Extension methods for pixels.
pub trait PixelOps {
    fn scaled(self, factor: f32) -> Self;
    fn modulated(self, other: Self) -> Self;
    fn interpolated(self, other: Self, t: f32) -> Self;
    fn clamped(self) -> Self;
}

impl PixelOps for Pixel {
    /// Scales all channels by the same factor.
    #[inline]
    fn scaled(self, factor: f32) -> Self {
        self.map(|c| c * factor)
    }

    /// Multiplies channelwise with `other`.
    #[inline]
    fn modulated(self, other: Self) -> Self {
        Self {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
        }
    }

    /// Linear interpolation from `self` at `t` = 0 to `other` at `t` = 1.
    #[inline]
    fn interpolated(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Clamps all channels to [0, 1].
    #[inline]
    fn clamped(self) -> Self {
        self.map(|c| clamp(c, 0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pixel_from_slice_reads_leading_channels() {
        let samples = [0.25f32, 0.5, 0.75, 1.0];
        assert_eq!(
            samples.to_pixel(),
            Pixel {
                r: 0.25,
                g: 0.5,
                b: 0.75
            }
        );
    }

    #[test]
    fn interpolation_endpoints() {
        let a = Pixel {
            r: 0.1,
            g: 0.2,
            b: 0.3,
        };
        let b = Pixel {
            r: 0.9,
            g: 0.8,
            b: 0.7,
        };

        assert_eq!(a.interpolated(b, 0.0), a);
        assert_eq!(a.interpolated(b, 1.0), b);
    }

    prop_compose! {
        fn arbitrary_pixel()(r in -2.0f32..4.0, g in -2.0f32..4.0, b in -2.0f32..4.0) -> Pixel {
            Pixel { r, g, b }
        }
    }

    proptest! {
        #[test]
        fn clamped_pixels_stay_in_range(pixel in arbitrary_pixel()) {
            let c = pixel.clamped();
            prop_assert!((0.0..=1.0).contains(&c.r));
            prop_assert!((0.0..=1.0).contains(&c.g));
            prop_assert!((0.0..=1.0).contains(&c.b));
        }

        #[test]
        fn modulation_by_white_is_identity(pixel in arbitrary_pixel()) {
            let white = Pixel { r: 1.0, g: 1.0, b: 1.0 };
            prop_assert_eq!(pixel.modulated(white), pixel);
        }
    }
}
