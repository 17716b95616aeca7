//! Decoded pixel model shared by the classifier, converters and variant generator.

use imgref::ImgVec;
use rgb::RGBA8;

use crate::error::OptimizeError;

/// Largest palette a PNG index byte can address.
pub const MAX_PALETTE_LEN: usize = 256;

/// Whether the color channels of an RGBA buffer are pre-scaled by alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaMode {
    /// Color channels are independent of alpha (what PNG stores).
    Straight,
    /// Color channels were multiplied by alpha / 255.
    Premultiplied,
}

/// A 16-bit (or otherwise unoptimized) image kept as raw codec samples.
///
/// Only ever re-encoded as-is.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub color_type: png::ColorType,
    pub bit_depth: png::BitDepth,
    /// Row-major samples exactly as the decoder produced them (big-endian for 16-bit).
    pub data: Vec<u8>,
    pub palette: Option<Vec<u8>>,
    pub trns: Option<Vec<u8>>,
}

/// Pixel payload of a decoded image, tagged by color model.
#[derive(Debug, Clone)]
pub enum Pixels {
    Rgba { buf: ImgVec<RGBA8>, alpha: AlphaMode },
    Indexed { buf: ImgVec<u8>, palette: Vec<RGBA8> },
    Gray(ImgVec<u8>),
    Unsupported(RawImage),
}

impl Pixels {
    /// Straight-alpha RGBA pixels.
    pub fn rgba(pixels: Vec<RGBA8>, width: usize, height: usize) -> Result<Self, OptimizeError> {
        validate_inputs(pixels.len(), width, height)?;
        Ok(Self::Rgba {
            buf: ImgVec::new(pixels, width, height),
            alpha: AlphaMode::Straight,
        })
    }

    /// Premultiplied RGBA pixels, e.g. from a compositor.
    pub fn premultiplied(
        pixels: Vec<RGBA8>,
        width: usize,
        height: usize,
    ) -> Result<Self, OptimizeError> {
        validate_inputs(pixels.len(), width, height)?;
        Ok(Self::Rgba {
            buf: ImgVec::new(pixels, width, height),
            alpha: AlphaMode::Premultiplied,
        })
    }

    /// 8-bit grayscale samples.
    pub fn gray(samples: Vec<u8>, width: usize, height: usize) -> Result<Self, OptimizeError> {
        validate_inputs(samples.len(), width, height)?;
        Ok(Self::Gray(ImgVec::new(samples, width, height)))
    }

    /// Palette indices plus the palette they point into.
    pub fn indexed(
        indices: Vec<u8>,
        palette: Vec<RGBA8>,
        width: usize,
        height: usize,
    ) -> Result<Self, OptimizeError> {
        validate_inputs(indices.len(), width, height)?;
        if palette.len() > MAX_PALETTE_LEN {
            return Err(OptimizeError::PaletteTooLarge(palette.len()));
        }
        Ok(Self::Indexed {
            buf: ImgVec::new(indices, width, height),
            palette,
        })
    }

    pub fn width(&self) -> usize {
        match self {
            Self::Rgba { buf, .. } => buf.width(),
            Self::Indexed { buf, .. } | Self::Gray(buf) => buf.width(),
            Self::Unsupported(raw) => raw.width as usize,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Rgba { buf, .. } => buf.height(),
            Self::Indexed { buf, .. } | Self::Gray(buf) => buf.height(),
            Self::Unsupported(raw) => raw.height as usize,
        }
    }

    /// Short name of the color model, used in variant labels.
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Rgba {
                alpha: AlphaMode::Straight,
                ..
            } => "rgba",
            Self::Rgba {
                alpha: AlphaMode::Premultiplied,
                ..
            } => "premultiplied rgba",
            Self::Indexed { .. } => "indexed",
            Self::Gray(_) => "gray",
            Self::Unsupported(_) => "raw",
        }
    }
}

/// A decoded image and the size of the file it came from.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: Pixels,
    encoded_len: u64,
    animated: bool,
}

impl DecodedImage {
    pub fn new(pixels: Pixels, encoded_len: u64) -> Self {
        Self {
            pixels,
            encoded_len,
            animated: false,
        }
    }

    /// Mark the source as animated; `pixels` then holds only its default image.
    pub fn with_animation(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    pub fn is_animated(&self) -> bool {
        self.animated
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn into_pixels(self) -> Pixels {
        self.pixels
    }

    /// Byte length of the original encoded file.
    pub fn encoded_len(&self) -> u64 {
        self.encoded_len
    }
}

fn validate_inputs(pixel_count: usize, width: usize, height: usize) -> Result<(), OptimizeError> {
    if width == 0 || height == 0 {
        return Err(OptimizeError::ZeroDimension);
    }
    if pixel_count != width * height {
        return Err(OptimizeError::DimensionMismatch {
            len: pixel_count,
            width,
            height,
        });
    }
    Ok(())
}
