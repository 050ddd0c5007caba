//! Color space signatures and value normalization
//!
//! Lookup tables store every value in a normalized `[0, 1]` domain. Each color
//! space has a "full range" representation (Lab L* in 0..100, XYZ Y in 0..~2,
//! device values in 0..1) and a normalization that maps it linearly onto
//! `[0, 1]`. The exact mapping depends on the encoding the table will be
//! written with and, for Lab, on the profile version.

use crate::error::{LutError, Result};

/// ICC color space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSpace {
    /// XYZ
    Xyz,
    /// Lab
    Lab,
    /// Luv
    Luv,
    /// YCbCr
    YCbCr,
    /// Yxy
    Yxy,
    /// RGB
    Rgb,
    /// Grayscale
    Gray,
    /// HSV
    Hsv,
    /// HLS
    Hls,
    /// CMYK
    Cmyk,
    /// CMY
    Cmy,
    /// Generic N color device space (`2CLR` .. `FCLR`)
    NColor(u8),
}

/// Sample encoding of the table the normalized values are destined for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// 8 bit integer (`lut8`)
    Bits8,
    /// 16 bit integer (`lut16`)
    #[default]
    Bits16,
    /// 32 bit float
    Float32,
}

/// Lab encoding version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LabVersion {
    /// ICC v2 16 bit Lab: 0xFF00 is L* = 100
    #[default]
    V2,
    /// ICC v4 16 bit Lab: 0xFFFF is L* = 100
    V4,
}

/// Largest XYZ value representable by a u1Fixed15 number
const XYZ_MAX: f64 = 1.0 + 32767.0 / 32768.0;

/// v2 16 bit Lab scale: 0xFF00 maps to L* = 100
const LAB_V2_SCALE: f64 = 65535.0 / 65280.0;

impl ColorSpace {
    /// Parse from an ICC color space signature
    pub fn from_signature(sig: u32) -> Result<Self> {
        let space = match &sig.to_be_bytes() {
            b"XYZ " => Self::Xyz,
            b"Lab " => Self::Lab,
            b"Luv " => Self::Luv,
            b"YCbr" => Self::YCbCr,
            b"Yxy " => Self::Yxy,
            b"RGB " => Self::Rgb,
            b"GRAY" => Self::Gray,
            b"HSV " => Self::Hsv,
            b"HLS " => Self::Hls,
            b"CMYK" => Self::Cmyk,
            b"CMY " => Self::Cmy,
            [n @ b'2'..=b'9', b'C', b'L', b'R'] => Self::NColor(n - b'0'),
            [n @ b'A'..=b'F', b'C', b'L', b'R'] => Self::NColor(n - b'A' + 10),
            _ => {
                return Err(LutError::UnsupportedColorSpace(format!(
                    "unknown signature 0x{sig:08X}"
                )));
            }
        };
        Ok(space)
    }

    /// ICC color space signature
    pub fn signature(&self) -> u32 {
        let bytes = match self {
            Self::Xyz => *b"XYZ ",
            Self::Lab => *b"Lab ",
            Self::Luv => *b"Luv ",
            Self::YCbCr => *b"YCbr",
            Self::Yxy => *b"Yxy ",
            Self::Rgb => *b"RGB ",
            Self::Gray => *b"GRAY",
            Self::Hsv => *b"HSV ",
            Self::Hls => *b"HLS ",
            Self::Cmyk => *b"CMYK",
            Self::Cmy => *b"CMY ",
            Self::NColor(n) => {
                let digit = if *n < 10 { b'0' + n } else { b'A' + n - 10 };
                [digit, b'C', b'L', b'R']
            }
        };
        u32::from_be_bytes(bytes)
    }

    /// Number of channels for this color space
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Xyz
            | Self::Lab
            | Self::Luv
            | Self::YCbCr
            | Self::Yxy
            | Self::Rgb
            | Self::Hsv
            | Self::Hls
            | Self::Cmy => 3,
            Self::Cmyk => 4,
            Self::NColor(n) => *n as usize,
        }
    }

    /// Profile connection spaces and other non device spaces
    pub fn is_pcs_like(&self) -> bool {
        matches!(self, Self::Xyz | Self::Lab | Self::Luv | Self::YCbCr)
    }

    /// Perceptual lightness/chroma spaces with a neutral axis at a* = b* = 0
    pub fn is_lightness_chroma(&self) -> bool {
        matches!(self, Self::Lab | Self::Luv)
    }

    /// Normalization between full range values and the `[0, 1]` table domain
    pub fn normalization(&self, encoding: Encoding, lab: LabVersion) -> Result<Normalization> {
        if let Self::NColor(n) = self {
            if !(2..=crate::MAX_CHANNELS as u8).contains(n) {
                return Err(LutError::UnsupportedColorSpace(format!(
                    "{n} color device space"
                )));
            }
        }
        if encoding == Encoding::Float32 && self.is_pcs_like() {
            return Err(LutError::UnsupportedColorSpace(format!(
                "{self:?} has no normalized float encoding"
            )));
        }

        let (min, max): (Vec<f64>, Vec<f64>) = match (self, encoding) {
            (Self::Xyz, _) => (vec![0.0; 3], vec![XYZ_MAX; 3]),
            (Self::Lab, Encoding::Bits16) if lab == LabVersion::V2 => (
                vec![0.0, -128.0, -128.0],
                vec![
                    100.0 * LAB_V2_SCALE,
                    255.0 * LAB_V2_SCALE - 128.0,
                    255.0 * LAB_V2_SCALE - 128.0,
                ],
            ),
            (Self::Lab, _) => (vec![0.0, -128.0, -128.0], vec![100.0, 127.0, 127.0]),
            (Self::Luv, _) => (
                vec![0.0, -128.0, -128.0],
                vec![100.0, 127.0 + 255.0 / 256.0, 127.0 + 255.0 / 256.0],
            ),
            (Self::YCbCr, _) => (vec![0.0, -0.5, -0.5], vec![1.0, 0.5, 0.5]),
            _ => (vec![0.0; self.channels()], vec![1.0; self.channels()]),
        };
        Normalization::from_range(&min, &max)
    }
}

/// Per-channel linear map between a full range and `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Normalization {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl Normalization {
    /// Create from per-channel minimum and maximum full range values
    pub fn from_range(min: &[f64], max: &[f64]) -> Result<Self> {
        if min.len() != max.len() {
            return Err(LutError::InvalidRange(format!(
                "{} minimums for {} maximums",
                min.len(),
                max.len()
            )));
        }
        if min.is_empty() || min.len() > crate::MAX_CHANNELS {
            return Err(LutError::UnsupportedChannelCount(min.len()));
        }
        for (ch, (lo, hi)) in min.iter().zip(max).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && hi > lo) {
                return Err(LutError::InvalidRange(format!(
                    "channel {ch}: [{lo}, {hi}]"
                )));
            }
        }
        Ok(Self {
            min: min.to_vec(),
            max: max.to_vec(),
        })
    }

    /// The `[0, 1]` identity for device spaces
    pub fn identity(channels: usize) -> Result<Self> {
        Self::from_range(&vec![0.0; channels], &vec![1.0; channels])
    }

    pub fn channels(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Full range to normalized, in place
    #[inline]
    pub fn normalize(&self, values: &mut [f64]) {
        for ((v, lo), hi) in values.iter_mut().zip(&self.min).zip(&self.max) {
            *v = (*v - lo) / (hi - lo);
        }
    }

    /// Normalized to full range, in place
    #[inline]
    pub fn denormalize(&self, values: &mut [f64]) {
        for ((v, lo), hi) in values.iter_mut().zip(&self.min).zip(&self.max) {
            *v = lo + *v * (hi - lo);
        }
    }

    /// Widen the chroma channels symmetrically so that the neutral value 0
    /// falls exactly on a grid index of a `resolution` point axis.
    ///
    /// Channels whose range does not straddle zero are left alone.
    pub fn align_neutral(&mut self, channels: std::ops::Range<usize>, resolution: usize) {
        if resolution < 3 {
            return;
        }
        for ch in channels {
            let (Some(lo), Some(hi)) = (self.min.get(ch).copied(), self.max.get(ch).copied())
            else {
                continue;
            };
            if !(lo < 0.0 && hi > 0.0) {
                continue;
            }
            let half = hi.max(-lo);
            if resolution % 2 == 1 {
                self.min[ch] = -half;
                self.max[ch] = half;
            } else {
                // Neutral lands on index k, one short of the middle
                let k = (resolution - 2) / 2;
                let step = half / k as f64;
                self.min[ch] = -half;
                self.max[ch] = step * (resolution - 1 - k) as f64;
            }
        }
    }
}
