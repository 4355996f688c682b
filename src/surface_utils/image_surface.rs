//! The main surface type for images, normal maps and masks.

use crate::error::RelightError;
use crate::surface_utils::{Pixel, ToPixel};
use crate::util::clamp;

/// A dense buffer of `f32` samples with shape (frames, height, width, channels).
///
/// Samples are stored row-major, innermost over channels, and are
/// conventionally in [0, 1].  One frame is a single image; batches are just
/// more frames.  The relighting operations only touch the first three
/// channels of a sample; anything past them rides along unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSurface {
    frames: usize,
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f32>,
}

fn check_dimensions(
    frames: usize,
    height: usize,
    width: usize,
    channels: usize,
) -> Result<(), RelightError> {
    if frames == 0 || height == 0 || width == 0 || channels == 0 {
        return Err(RelightError::InputMismatch(format!(
            "surface dimensions must all be nonzero, got {}x{}x{}x{}",
            frames, height, width, channels
        )));
    }

    Ok(())
}

impl ImageSurface {
    /// Creates a zero-filled surface of the given shape.
    pub fn new(
        frames: usize,
        height: usize,
        width: usize,
        channels: usize,
    ) -> Result<ImageSurface, RelightError> {
        check_dimensions(frames, height, width, channels)?;

        Ok(ImageSurface {
            frames,
            height,
            width,
            channels,
            data: vec![0.0; frames * height * width * channels],
        })
    }

    /// Wraps an existing sample buffer of the given shape.
    pub fn from_raw(
        frames: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<ImageSurface, RelightError> {
        check_dimensions(frames, height, width, channels)?;

        let expected = frames * height * width * channels;
        if data.len() != expected {
            return Err(RelightError::InputMismatch(format!(
                "buffer holds {} samples but shape {}x{}x{}x{} needs {}",
                data.len(),
                frames,
                height,
                width,
                channels,
                expected
            )));
        }

        Ok(ImageSurface {
            frames,
            height,
            width,
            channels,
            data,
        })
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of samples in one row, i.e. width times channels.
    pub fn row_stride(&self) -> usize {
        self.width * self.channels
    }

    /// Number of samples in one frame.
    pub fn frame_stride(&self) -> usize {
        self.height * self.row_stride()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the surface and hands the sample buffer back to the caller.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// The samples of one frame.
    pub fn frame(&self, frame: usize) -> &[f32] {
        assert!(frame < self.frames);

        let stride = self.frame_stride();
        &self.data[frame * stride..][..stride]
    }

    #[inline]
    fn sample_offset(&self, frame: usize, x: usize, y: usize) -> usize {
        assert!(frame < self.frames);
        assert!(x < self.width);
        assert!(y < self.height);

        ((frame * self.height + y) * self.width + x) * self.channels
    }

    /// One channel of the sample at the given position.
    #[inline]
    pub fn sample(&self, frame: usize, x: usize, y: usize, channel: usize) -> f32 {
        assert!(channel < self.channels);

        self.data[self.sample_offset(frame, x, y) + channel]
    }

    #[inline]
    pub fn set_sample(&mut self, frame: usize, x: usize, y: usize, channel: usize, value: f32) {
        assert!(channel < self.channels);

        let offset = self.sample_offset(frame, x, y) + channel;
        self.data[offset] = value;
    }

    /// The RGB part of the sample at the given position.
    #[inline]
    pub fn pixel(&self, frame: usize, x: usize, y: usize) -> Pixel {
        assert!(self.channels >= 3);

        let offset = self.sample_offset(frame, x, y);
        self.data[offset..offset + 3].to_pixel()
    }

    /// Overwrites the RGB part of the sample at the given position.
    #[inline]
    pub fn set_pixel(&mut self, frame: usize, x: usize, y: usize, pixel: Pixel) {
        assert!(self.channels >= 3);

        let offset = self.sample_offset(frame, x, y);
        self.data[offset] = pixel.r;
        self.data[offset + 1] = pixel.g;
        self.data[offset + 2] = pixel.b;
    }

    /// Bilinearly resamples every frame to the target resolution.
    ///
    /// Each channel is interpolated independently.  Sample positions are
    /// half-pixel centers, so resampling a surface to its own resolution
    /// reproduces it, and border taps clamp to the edge texel.
    pub fn resample_to(&self, width: usize, height: usize) -> Result<ImageSurface, RelightError> {
        let mut output = ImageSurface::new(self.frames, height, width, self.channels)?;

        let x_taps = axis_taps(self.width, width);
        let y_taps = axis_taps(self.height, height);

        let channels = self.channels;
        let src_row = self.row_stride();
        let src_frame = self.frame_stride();
        let dst_row = output.row_stride();
        let dst_frame = output.frame_stride();

        let dst = output.data_mut();

        for frame in 0..self.frames {
            let src = &self.data[frame * src_frame..][..src_frame];
            let dst = &mut dst[frame * dst_frame..][..dst_frame];

            for (y, yt) in y_taps.iter().enumerate() {
                let row_lo = &src[yt.lo * src_row..][..src_row];
                let row_hi = &src[yt.hi * src_row..][..src_row];
                let out_row = &mut dst[y * dst_row..][..dst_row];

                for (x, xt) in x_taps.iter().enumerate() {
                    let p00 = &row_lo[xt.lo * channels..];
                    let p01 = &row_lo[xt.hi * channels..];
                    let p10 = &row_hi[xt.lo * channels..];
                    let p11 = &row_hi[xt.hi * channels..];
                    let out = &mut out_row[x * channels..][..channels];

                    for c in 0..channels {
                        let top =
                            f64::from(p00[c]) + (f64::from(p01[c]) - f64::from(p00[c])) * xt.frac;
                        let bottom =
                            f64::from(p10[c]) + (f64::from(p11[c]) - f64::from(p10[c])) * xt.frac;

                        out[c] = (top + (bottom - top) * yt.frac) as f32;
                    }
                }
            }
        }

        Ok(output)
    }
}

/// Source taps for one output position along a single axis.
#[derive(Debug, Clone, Copy)]
struct Taps {
    lo: usize,
    hi: usize,
    frac: f64,
}

/// Half-pixel-center tap positions for resampling `src_len` samples to `dst_len`.
fn axis_taps(src_len: usize, dst_len: usize) -> Vec<Taps> {
    let scale = src_len as f64 / dst_len as f64;
    let max = (src_len - 1) as f64;

    (0..dst_len)
        .map(|i| {
            let center = (i as f64 + 0.5) * scale - 0.5;
            let floor = center.floor();

            Taps {
                lo: clamp(floor, 0.0, max) as usize,
                hi: clamp(floor + 1.0, 0.0, max) as usize,
                frac: center - floor,
            }
        })
        .collect()
}
