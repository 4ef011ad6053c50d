//! Primary point of interest (PPOI): the focal point of an image.
//!
//! Stored and exchanged as `"<x>x<y>"` where both coordinates are normalized
//! to `0..=1`, e.g. `"0.5x0.5"` for the center.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

const MAX_PPOI_LEN: usize = 20;

#[derive(Debug, Error, PartialEq)]
pub enum PpoiError {
    #[error("ppoi `{0}` must be two coordinates joined by `x`")]
    Malformed(String),
    #[error("ppoi coordinate `{0}` is outside 0..=1")]
    OutOfRange(String),
    #[error("ppoi must be at most 20 characters")]
    TooLong,
}

/// Normalized focal point. Coordinates are kept to three decimal places so
/// the encoded form always fits the 20-character column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Ppoi {
    x: f64,
    y: f64,
}

impl Ppoi {
    pub const CENTER: Ppoi = Ppoi { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Result<Self, PpoiError> {
        Ok(Self {
            x: normalize(x)?,
            y: normalize(y)?,
        })
    }
}

impl Default for Ppoi {
    fn default() -> Self {
        Self::CENTER
    }
}

fn normalize(value: f64) -> Result<f64, PpoiError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PpoiError::OutOfRange(value.to_string()));
    }
    // adding 0.0 turns -0.0 into 0.0 so it never prints as "-0"
    Ok((value * 1000.0).round() / 1000.0 + 0.0)
}

impl fmt::Display for Ppoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

impl FromStr for Ppoi {
    type Err = PpoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_PPOI_LEN {
            return Err(PpoiError::TooLong);
        }
        let (x, y) = s
            .split_once('x')
            .ok_or_else(|| PpoiError::Malformed(s.to_string()))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| PpoiError::Malformed(s.to_string()))
        };
        Self::new(parse(x)?, parse(y)?)
    }
}

impl TryFrom<String> for Ppoi {
    type Error = PpoiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ppoi> for String {
    fn from(value: Ppoi) -> Self {
        value.to_string()
    }
}
