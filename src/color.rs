//! Color parameters, and decoding of external color representations.

use cssparser::{Parser, ParserInput};

use crate::error::RelightError;

/// An RGB color with `f32` channels in [0, 1].
pub type Rgb = rgb::RGB<f32>;

/// The tint pair applied by the color compositor.
///
/// The defaults, white highlight over black shadow, are the identity pair:
/// with them the tint degenerates to all-ones and pixels pass through
/// untinted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorParams {
    pub highlight: Rgb,
    pub shadow: Rgb,
}

impl Default for ColorParams {
    fn default() -> ColorParams {
        ColorParams {
            highlight: Rgb {
                r: 1.0,
                g: 1.0,
                b: 1.0,
            },
            shadow: Rgb {
                r: 0.0,
                g: 0.0,
                b: 0.0,
            },
        }
    }
}

impl ColorParams {
    /// Decodes a pair of CSS colors, highlight first.
    pub fn from_css(highlight: &str, shadow: &str) -> Result<ColorParams, RelightError> {
        Ok(ColorParams {
            highlight: parse_color(highlight)?,
            shadow: parse_color(shadow)?,
        })
    }

    /// Whether this is the white/black pair that leaves pixels untinted.
    pub fn is_identity(&self) -> bool {
        *self == ColorParams::default()
    }
}

/// Parses a CSS `<color>` into an `Rgb` triple.
///
/// Accepts hex colors, `rgb()` functional notation and named colors.
/// `currentColor` has no meaning here and is rejected, as is any trailing
/// input.
pub fn parse_color(s: &str) -> Result<Rgb, RelightError> {
    let mut input = ParserInput::new(s);
    let mut parser = Parser::new(&mut input);

    let color = cssparser::Color::parse(&mut parser)
        .map_err(|_| RelightError::InvalidColor(s.to_string()))?;

    parser
        .expect_exhausted()
        .map_err(|_| RelightError::InvalidColor(s.to_string()))?;

    match color {
        cssparser::Color::RGBA(rgba) => Ok(color_from_rgb8(rgba.red, rgba.green, rgba.blue)),
        cssparser::Color::CurrentColor => Err(RelightError::InvalidColor(s.to_string())),
    }
}

/// Converts 8-bit color channels to the [0, 1] range.
pub fn color_from_rgb8(r: u8, g: u8, b: u8) -> Rgb {
    Rgb {
        r: f32::from(r) / 255.0,
        g: f32::from(g) / 255.0,
        b: f32::from(b) / 255.0,
    }
}
