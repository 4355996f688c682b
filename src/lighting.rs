//! The relighting kernel: diffuse response, shadow/highlight shaping and
//! color tinting driven by a per-pixel normal map.

use std::time::Instant;

use float_cmp::approx_eq;
use nalgebra::Vector3;
use rayon::prelude::*;

use crate::color::{ColorParams, Rgb};
use crate::error::RelightError;
use crate::normal_map::{NormalField, NormalMap};
use crate::surface_utils::image_surface::ImageSurface;
use crate::surface_utils::iterators::Pixels;
use crate::surface_utils::{PixelOps, ToPixel};
use crate::util::clamp;

/// Floor for the falloff divisor, guarding against a vanishing range.
const RANGE_EPSILON: f64 = 1e-6;

/// A directional light.
///
/// Holds the raw direction components; the kernel normalizes them once when
/// it resolves its parameters, and rejects a zero vector at that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightVector {
    vector: Vector3<f64>,
}

impl LightVector {
    /// A light from raw direction components.
    pub fn new(x: f64, y: f64, z: f64) -> LightVector {
        LightVector {
            vector: Vector3::new(x, y, z),
        }
    }

    /// A light from a normalized screen position plus a depth component.
    ///
    /// `x` and `y` are screen coordinates in [0, 1] with the origin at the
    /// top-left corner.  Both are remapped through `-(2v - 1)`: the vertical
    /// flip converts the screen's downward y axis to the light's upward one,
    /// and the horizontal mirror makes the light come from the cursor's side.
    /// The center position with `z` = 1 is the straight-on light (0, 0, 1).
    /// `z` passes through unchanged.
    pub fn from_screen(x: f64, y: f64, z: f64) -> LightVector {
        LightVector::new(-(x * 2.0 - 1.0), -(y * 2.0 - 1.0), z)
    }

    /// The unit-length direction, or an error for a zero vector.
    fn normalized(&self) -> Result<Vector3<f64>, RelightError> {
        self.vector
            .try_normalize(0.0)
            .ok_or(RelightError::InvalidLightVector)
    }
}

/// Scalar shaping knobs for the lighting response.
///
/// Every knob is a no-op at its default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingParams {
    /// Multiplicative gain on the relit RGB.
    pub brightness: f64,

    /// Width of the shadow falloff band, in (0, 2].
    pub shadow_range: f64,

    /// 1 leaves the shadow region alone; values toward 2 darken it to
    /// black, values toward 0 brighten it to twice the input.
    pub shadow_strength: f64,

    /// Width of the highlight falloff band, in (0, 2].
    pub highlight_range: f64,

    /// 1 leaves highlights alone; the deviation from 1 is added to the
    /// intensity where the highlight mask is full.
    pub highlight_strength: f64,
}

impl Default for ShadingParams {
    fn default() -> ShadingParams {
        ShadingParams {
            brightness: 1.0,
            shadow_range: 1.0,
            shadow_strength: 1.0,
            highlight_range: 1.0,
            highlight_strength: 1.0,
        }
    }
}

impl ShadingParams {
    fn check_ranges(&self) -> Result<(), RelightError> {
        check_range("shadow_range", self.shadow_range)?;
        check_range("highlight_range", self.highlight_range)
    }
}

fn check_range(name: &str, value: f64) -> Result<(), RelightError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RelightError::InvalidRange(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

/// One falloff band: the mask ramps from 0 at `threshold` to 1 at
/// `threshold + range`.
#[derive(Debug)]
struct Falloff {
    threshold: f64,
    range: f64,
}

impl Falloff {
    fn new(range: f64) -> Falloff {
        Falloff {
            threshold: 1.0 - range,
            range: range.max(RANGE_EPSILON),
        }
    }

    /// The mask value for a lighting response in [0, 1].
    #[inline]
    fn mask(&self, response: f64) -> f64 {
        clamp((response - self.threshold) / self.range, 0.0, 1.0)
    }
}

/// Per-call invariants, resolved once before the pixel loop.
#[derive(Debug)]
struct Shading {
    light: Vector3<f64>,
    brightness: f64,
    shadow: Falloff,
    highlight: Falloff,
    shadow_strength: Option<f64>,
    highlight_strength: Option<f64>,
    tint: Option<(Rgb, Rgb)>,
}

/// What one pixel's normal resolves to: an intensity gain and a tint.
struct Shade {
    gain: f32,
    tint: Rgb,
}

const UNTINTED: Rgb = Rgb {
    r: 1.0,
    g: 1.0,
    b: 1.0,
};

impl Shading {
    fn resolve(
        light: LightVector,
        params: &ShadingParams,
        color: &ColorParams,
    ) -> Result<Shading, RelightError> {
        params.check_ranges()?;

        // a strength at exactly its default contributes nothing; skipping it
        // keeps the untouched regions bit-identical to the input
        let strength = |value: f64| {
            if approx_eq!(f64, value, 1.0) {
                None
            } else {
                Some(value)
            }
        };

        Ok(Shading {
            light: light.normalized()?,
            brightness: params.brightness,
            shadow: Falloff::new(params.shadow_range),
            highlight: Falloff::new(params.highlight_range),
            shadow_strength: strength(params.shadow_strength),
            highlight_strength: strength(params.highlight_strength),
            tint: if color.is_identity() {
                None
            } else {
                Some((color.highlight, color.shadow))
            },
        })
    }

    /// Shades one decoded normal.
    #[inline]
    fn shade(&self, normal: Vector3<f64>) -> Shade {
        let diffuse = normal.dot(&self.light);
        let response = (diffuse + 1.0) * 0.5;

        let shadow_mask = self.shadow.mask(response);

        let mut intensity = 1.0;

        // shadow shaping is multiplicative and must come before the additive
        // highlight boost; the two do not commute
        if let Some(strength) = self.shadow_strength {
            intensity *= shadow_mask + (1.0 - shadow_mask) * (2.0 - strength);
        }

        if let Some(strength) = self.highlight_strength {
            intensity += self.highlight.mask(response) * (strength - 1.0);
        }

        let tint = match self.tint {
            Some((highlight, shadow)) => shadow.interpolated(highlight, shadow_mask as f32),
            None => UNTINTED,
        };

        Shade {
            gain: (intensity * self.brightness) as f32,
            tint,
        }
    }
}

/// Relights an image using a normal map and a directional light.
///
/// The normal map is decoded and resampled to the image's resolution, a
/// diffuse response against `light` is computed per pixel, and the image's
/// RGB channels are scaled by the shaped intensity, the brightness gain and
/// the shadow/highlight tint, then clamped to [0, 1].  Channels beyond RGB
/// pass through unchanged, and the input is never modified.
///
/// The image needs at least three channels, and its frame count must match
/// the normal map's.
pub fn relight(
    image: &ImageSurface,
    normals: &NormalMap,
    light: LightVector,
    shading: &ShadingParams,
    color: &ColorParams,
) -> Result<ImageSurface, RelightError> {
    let start = Instant::now();

    check_image(image)?;
    check_frames(image, normals)?;

    let shading = Shading::resolve(light, shading, color)?;
    let field = normals.resample_to(image.width(), image.height())?;

    let mut output = image.clone();
    relight_frames(&mut output, &field, &shading);

    relight_log!(
        "(relit {} frame(s) of {}x{} in {} seconds)",
        image.frames(),
        image.width(),
        image.height(),
        start.elapsed().as_secs_f64()
    );

    Ok(output)
}

/// Relights an image, then blends the result over the input through a mask.
///
/// The mask is a single-channel surface; it is bilinearly resampled to the
/// image's resolution and its values are clamped to [0, 1] at use.  A pixel
/// with mask 1 takes the relit value, mask 0 keeps the input, and everything
/// in between interpolates.  A mask with a single frame applies to every
/// frame of a batched image.
pub fn relight_with_mask(
    image: &ImageSurface,
    normals: &NormalMap,
    mask: &ImageSurface,
    light: LightVector,
    shading: &ShadingParams,
    color: &ColorParams,
) -> Result<ImageSurface, RelightError> {
    check_mask(image, mask)?;

    let mut output = relight(image, normals, light, shading, color)?;
    let mask = mask.resample_to(image.width(), image.height())?;
    blend_masked(&mut output, image, &mask);

    Ok(output)
}

fn check_image(image: &ImageSurface) -> Result<(), RelightError> {
    if image.channels() < 3 {
        return Err(RelightError::InputMismatch(format!(
            "image needs at least 3 channels, got {}",
            image.channels()
        )));
    }

    Ok(())
}

fn check_frames(image: &ImageSurface, normals: &NormalMap) -> Result<(), RelightError> {
    if image.frames() != normals.frames() {
        return Err(RelightError::InputMismatch(format!(
            "image has {} frame(s) but the normal map has {}",
            image.frames(),
            normals.frames()
        )));
    }

    Ok(())
}

fn check_mask(image: &ImageSurface, mask: &ImageSurface) -> Result<(), RelightError> {
    if mask.channels() != 1 {
        return Err(RelightError::InputMismatch(format!(
            "mask must have exactly 1 channel, got {}",
            mask.channels()
        )));
    }

    if mask.frames() != 1 && mask.frames() != image.frames() {
        return Err(RelightError::InputMismatch(format!(
            "mask has {} frame(s) but the image has {}",
            mask.frames(),
            image.frames()
        )));
    }

    Ok(())
}

/// Shades every frame of `output` in place against the decoded normals.
fn relight_frames(output: &mut ImageSurface, field: &NormalField, shading: &Shading) {
    let frames = output.frames();
    let channels = output.channels();
    let row_stride = output.row_stride();
    let frame_stride = output.frame_stride();

    let normal_row_stride = field.surface().row_stride();
    let normal_frame_stride = field.surface().frame_stride();
    let field_data = field.surface().data();

    let data = output.data_mut();

    for frame in 0..frames {
        let out_frame = &mut data[frame * frame_stride..][..frame_stride];
        let normal_frame = &field_data[frame * normal_frame_stride..][..normal_frame_stride];

        out_frame
            .par_chunks_mut(row_stride)
            .zip(normal_frame.par_chunks(normal_row_stride))
            .for_each(|(out_row, normal_row)| {
                for (sample, normal) in out_row
                    .chunks_exact_mut(channels)
                    .zip(normal_row.chunks_exact(3))
                {
                    let n = Vector3::new(
                        f64::from(normal[0]),
                        f64::from(normal[1]),
                        f64::from(normal[2]),
                    );

                    let shade = shading.shade(n);

                    let rgb = sample
                        .to_pixel()
                        .scaled(shade.gain)
                        .modulated(shade.tint)
                        .clamped();

                    sample[0] = rgb.r;
                    sample[1] = rgb.g;
                    sample[2] = rgb.b;
                }
            });
    }
}

/// Blends the relit `output` over `input` through a resampled mask.
fn blend_masked(output: &mut ImageSurface, input: &ImageSurface, mask: &ImageSurface) {
    for frame in 0..output.frames() {
        let mask_frame = if mask.frames() == 1 { 0 } else { frame };

        for (x, y, pixel) in Pixels::new(input, frame) {
            let m = clamp(mask.sample(mask_frame, x, y, 0), 0.0, 1.0);
            let relit = output.pixel(frame, x, y);

            output.set_pixel(frame, x, y, pixel.interpolated(relit, m));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolve(light: LightVector, params: &ShadingParams, color: &ColorParams) -> Shading {
        Shading::resolve(light, params, color).unwrap()
    }

    #[test]
    fn screen_center_is_the_straight_on_light() {
        assert_eq!(LightVector::from_screen(0.5, 0.5, 1.0), LightVector::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn screen_corners_invert_both_axes() {
        assert_eq!(LightVector::from_screen(0.0, 0.0, 0.5), LightVector::new(1.0, 1.0, 0.5));
        assert_eq!(LightVector::from_screen(1.0, 1.0, 0.5), LightVector::new(-1.0, -1.0, 0.5));
    }

    #[test]
    fn zero_light_vector_is_rejected() {
        let err = Shading::resolve(
            LightVector::new(0.0, 0.0, 0.0),
            &ShadingParams::default(),
            &ColorParams::default(),
        )
        .unwrap_err();

        assert_eq!(err, RelightError::InvalidLightVector);
    }

    #[test]
    fn nonpositive_ranges_are_rejected() {
        for range in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let params = ShadingParams {
                shadow_range: range,
                ..ShadingParams::default()
            };

            let err = Shading::resolve(
                LightVector::new(0.0, 0.0, 1.0),
                &params,
                &ColorParams::default(),
            )
            .unwrap_err();

            assert!(matches!(err, RelightError::InvalidRange(_)));
        }
    }

    #[test]
    fn falloff_ramps_from_threshold_to_one() {
        let falloff = Falloff::new(0.5);

        assert_eq!(falloff.mask(0.0), 0.0);
        assert_eq!(falloff.mask(0.5), 0.0);
        assert_eq!(falloff.mask(0.75), 0.5);
        assert_eq!(falloff.mask(1.0), 1.0);
    }

    #[test]
    fn light_is_normalized_before_the_dot_product() {
        let shading = resolve(
            LightVector::new(0.0, 0.0, 10.0),
            &ShadingParams::default(),
            &ColorParams::default(),
        );

        let shade = shading.shade(Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(shade.gain, 1.0);
    }

    #[test]
    fn default_shading_is_the_identity() {
        let shading = resolve(
            LightVector::new(0.0, 0.0, 1.0),
            &ShadingParams::default(),
            &ColorParams::default(),
        );

        // facing the light
        let shade = shading.shade(Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(shade.gain, 1.0);
        assert_eq!(shade.tint, UNTINTED);

        // facing away from it: response 0, but every knob is a no-op
        let shade = shading.shade(Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(shade.gain, 1.0);
    }

    #[test]
    fn shadow_strength_two_blacks_out_the_shadow_region() {
        let params = ShadingParams {
            shadow_strength: 2.0,
            ..ShadingParams::default()
        };
        let shading = resolve(LightVector::new(0.0, 0.0, 1.0), &params, &ColorParams::default());

        // response 0: fully inside the shadow band
        assert_eq!(shading.shade(Vector3::new(0.0, 0.0, -1.0)).gain, 0.0);
        // response 1: the lit region is untouched by the strength
        assert_eq!(shading.shade(Vector3::new(0.0, 0.0, 1.0)).gain, 1.0);
    }

    #[test]
    fn shadow_strength_zero_doubles_the_shadow_region() {
        let params = ShadingParams {
            shadow_strength: 0.0,
            ..ShadingParams::default()
        };
        let shading = resolve(LightVector::new(0.0, 0.0, 1.0), &params, &ColorParams::default());

        assert_eq!(shading.shade(Vector3::new(0.0, 0.0, -1.0)).gain, 2.0);
        assert_eq!(shading.shade(Vector3::new(0.0, 0.0, 1.0)).gain, 1.0);
    }

    #[test]
    fn highlight_strength_adds_in_the_highlight_region() {
        let params = ShadingParams {
            highlight_strength: 1.5,
            ..ShadingParams::default()
        };
        let shading = resolve(LightVector::new(0.0, 0.0, 1.0), &params, &ColorParams::default());

        assert_eq!(shading.shade(Vector3::new(0.0, 0.0, 1.0)).gain, 1.5);
        assert_eq!(shading.shade(Vector3::new(0.0, 0.0, -1.0)).gain, 1.0);
    }

    #[test]
    fn shadow_scaling_applies_before_highlight_boost() {
        // at response 0.5 both masks are 0.5 with the default bands;
        // multiplying first gives 0.5 * (0.5 + 0.5 * 0) + 0.5 * 1 = 1.0,
        // the reverse order would give 0.75
        let params = ShadingParams {
            shadow_strength: 2.0,
            highlight_strength: 2.0,
            ..ShadingParams::default()
        };
        let shading = resolve(LightVector::new(0.0, 0.0, 1.0), &params, &ColorParams::default());

        let shade = shading.shade(Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(shade.gain, 1.0);
    }

    #[test]
    fn tint_follows_the_shadow_mask() {
        let color = ColorParams {
            highlight: Rgb {
                r: 1.0,
                g: 0.5,
                b: 0.0,
            },
            shadow: Rgb {
                r: 0.0,
                g: 0.5,
                b: 1.0,
            },
        };
        let shading = resolve(
            LightVector::new(0.0, 0.0, 1.0),
            &ShadingParams::default(),
            &color,
        );

        assert_eq!(shading.shade(Vector3::new(0.0, 0.0, 1.0)).tint, color.highlight);
        assert_eq!(shading.shade(Vector3::new(0.0, 0.0, -1.0)).tint, color.shadow);

        let mid = shading.shade(Vector3::new(0.0, 1.0, 0.0)).tint;
        assert_eq!(
            mid,
            Rgb {
                r: 0.5,
                g: 0.5,
                b: 0.5
            }
        );
    }

    proptest! {
        #[test]
        fn shadow_mask_is_monotonic(
            range in 0.01f64..2.0,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let falloff = Falloff::new(range);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

            prop_assert!(falloff.mask(lo) <= falloff.mask(hi));
        }

        #[test]
        fn masks_stay_in_unit_range(range in 0.01f64..2.0, response in -1.0f64..2.0) {
            let mask = Falloff::new(range).mask(response);

            prop_assert!((0.0..=1.0).contains(&mask));
        }
    }
}
