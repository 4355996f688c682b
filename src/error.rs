//! Error types.

use std::error;
use std::fmt;

/// An enumeration of errors that can occur while relighting an image.
#[derive(Debug, Clone, PartialEq)]
pub enum RelightError {
    /// The shapes of the image, normal map and mask do not agree.
    InputMismatch(String),

    /// The light vector has zero length and no direction.
    InvalidLightVector,

    /// A falloff range is zero, negative or not finite.
    InvalidRange(String),

    /// An external color representation could not be decoded.
    InvalidColor(String),
}

impl fmt::Display for RelightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RelightError::InputMismatch(ref s) => write!(f, "input mismatch: {}", s),

            RelightError::InvalidLightVector => write!(f, "light vector has zero length"),

            RelightError::InvalidRange(ref s) => write!(f, "invalid range: {}", s),

            RelightError::InvalidColor(ref s) => write!(f, "invalid color: {}", s),
        }
    }
}

impl error::Error for RelightError {}
