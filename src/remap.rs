//! Pixel-exact conversions between the direct, gray and indexed representations.

use std::collections::HashMap;

use rgb::RGBA8;

use crate::error::OptimizeError;
use crate::histogram::pack_rgba;
use crate::palette::Palette;

/// Recover straight alpha from premultiplied pixels, in place.
///
/// Fully transparent pixels have no recoverable color and become `(0, 0, 0, 0)`.
pub fn unpremultiply(pixels: &mut [RGBA8]) {
    for p in pixels.iter_mut() {
        match p.a {
            0 => *p = RGBA8::new(0, 0, 0, 0),
            255 => {}
            a => {
                let a = a as u32;
                let un = |c: u8| (c as u32 * 255 / a).min(255) as u8;
                *p = RGBA8::new(un(p.r), un(p.g), un(p.b), p.a);
            }
        }
    }
}

/// Take the (equal) red component of each achromatic pixel.
pub fn rgba_to_gray(pixels: &[RGBA8]) -> Vec<u8> {
    pixels
        .iter()
        .map(|p| {
            debug_assert!(p.r == p.g && p.r == p.b);
            p.r
        })
        .collect()
}

/// Map indices through a gray palette to their gray levels.
pub fn indexed_to_gray(indices: &[u8], palette: &[RGBA8]) -> Result<Vec<u8>, OptimizeError> {
    indices
        .iter()
        .map(|&i| {
            palette
                .get(i as usize)
                .map(|c| c.r)
                .ok_or(OptimizeError::IndexOutOfRange {
                    index: i,
                    len: palette.len(),
                })
        })
        .collect()
}

/// Replace every pixel with its exact palette index.
pub fn remap_rgba(pixels: &[RGBA8], palette: &Palette) -> Result<Vec<u8>, OptimizeError> {
    let lookup: HashMap<u32, u8> = palette
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| (pack_rgba(e.color), i as u8))
        .collect();

    pixels
        .iter()
        .map(|&p| {
            let key = pack_rgba(p);
            lookup
                .get(&key)
                .copied()
                .ok_or(OptimizeError::Conversion { color: key })
        })
        .collect()
}

/// Replace every gray sample with its exact palette index.
pub fn remap_gray(samples: &[u8], palette: &Palette) -> Result<Vec<u8>, OptimizeError> {
    let mut lookup = [None; 256];
    for (i, e) in palette.entries().iter().enumerate() {
        lookup[e.color.r as usize] = Some(i as u8);
    }

    samples
        .iter()
        .map(|&v| {
            lookup[v as usize].ok_or(OptimizeError::Conversion {
                color: pack_rgba(RGBA8::new(v, v, v, 255)),
            })
        })
        .collect()
}
