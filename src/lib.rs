//! Relight images with per-pixel normal maps.
//!
//! This crate recomputes the lighting of a color image from a *normal map*,
//! a second image whose channel values encode the direction each pixel's
//! surface is facing, and a directional light chosen by the caller.  Pixels
//! facing the light keep their brightness or gain a highlight boost; pixels
//! facing away fall into a shadow band that can be darkened, brightened or
//! tinted.  The result is a new image; the inputs are never modified.
//!
//! Surfaces are dense `f32` buffers with a leading frame dimension, so a
//! batch of images is relit with one call.  The normal map may have a
//! different resolution than the image; it is decoded and bilinearly
//! resampled to match before lighting.
//!
//! # Basic usage
//!
//! * Build an [`ImageSurface`] for the image and another for the encoded
//!   normal map, and wrap the latter in a [`NormalMap`].
//! * Pick a [`LightVector`], either from raw direction components or from a
//!   screen position via [`LightVector::from_screen`].
//! * Call [`relight`], or [`relight_with_mask`] to confine the effect to a
//!   masked region.
//!
//! # Example
//!
//! ```
//! use relight::{relight, ColorParams, ImageSurface, LightVector, NormalMap, ShadingParams};
//!
//! // A 2×2 mid-gray image.
//! let image = ImageSurface::from_raw(1, 2, 2, 3, vec![0.5; 12]).unwrap();
//!
//! // A flat normal map pointing straight out of the screen.
//! let normals = ImageSurface::from_raw(1, 2, 2, 3, vec![0.5, 0.5, 1.0].repeat(4)).unwrap();
//! let normals = NormalMap::new(normals).unwrap();
//!
//! // Light from the upper-left corner of the screen, shadows deepened.
//! let shading = ShadingParams {
//!     shadow_strength: 1.5,
//!     ..ShadingParams::default()
//! };
//!
//! let relit = relight(
//!     &image,
//!     &normals,
//!     LightVector::from_screen(0.25, 0.25, 1.0),
//!     &shading,
//!     &ColorParams::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(relit.width(), 2);
//! assert_eq!(relit.height(), 2);
//! ```

#![warn(nonstandard_style, rust_2018_idioms, unused)]
// Standalone lints
#![warn(trivial_casts, trivial_numeric_casts)]

pub use crate::color::{color_from_rgb8, parse_color, ColorParams, Rgb};

pub use crate::error::RelightError;

pub use crate::lighting::{relight, relight_with_mask, LightVector, ShadingParams};

pub use crate::normal_map::{NormalField, NormalMap};

pub use crate::session::{SessionOutcome, SessionRegistry};

pub use crate::surface_utils::image_surface::ImageSurface;

#[macro_use]
pub mod log;

mod color;
mod error;
mod lighting;
mod normal_map;
mod session;
mod surface_utils;
mod util;
