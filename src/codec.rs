//! Adapter between the `png` crate and the engine's pixel model.

use std::io::Cursor;

use imgref::ImgVec;
use rgb::RGBA8;

use crate::error::OptimizeError;
use crate::image::{DecodedImage, Pixels, RawImage};
use crate::palette::alpha_table;
use crate::variants::VariantKind;

/// Compression effort handed to the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Effort {
    Fast,
    Balanced,
    /// Slowest, smallest output.
    #[default]
    Max,
}

impl Effort {
    fn compression(self) -> png::Compression {
        match self {
            Self::Fast => png::Compression::Fast,
            Self::Balanced => png::Compression::Default,
            Self::Max => png::Compression::Best,
        }
    }
}

/// Decode a PNG into the engine's pixel model.
///
/// Only the default image is decoded. Animated files are flagged so the
/// caller can leave them alone instead of dropping their frames.
pub fn decode(data: &[u8]) -> Result<DecodedImage, OptimizeError> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;
    buf.truncate(frame.buffer_size());

    let info = reader.info();
    let (width, height) = (frame.width as usize, frame.height as usize);
    let trns = info.trns.as_deref().map(<[u8]>::to_vec);
    let plte = info.palette.as_deref().map(<[u8]>::to_vec);
    let depth = frame.bit_depth as u8;
    let animated = info.animation_control.is_some();

    let pixels = match (frame.color_type, frame.bit_depth) {
        (_, png::BitDepth::Sixteen) => Pixels::Unsupported(RawImage {
            width: frame.width,
            height: frame.height,
            color_type: frame.color_type,
            bit_depth: frame.bit_depth,
            data: buf,
            palette: plte,
            trns,
        }),
        (png::ColorType::Indexed, _) => {
            let indices = unpack_rows(&buf, width, height, frame.line_size, depth);
            let alphas = trns.unwrap_or_default();
            let palette = plte
                .unwrap_or_default()
                .chunks_exact(3)
                .enumerate()
                .map(|(i, c)| {
                    let a = alphas.get(i).copied().unwrap_or(255);
                    RGBA8::new(c[0], c[1], c[2], a)
                })
                .collect();
            Pixels::indexed(indices, palette, width, height)?
        }
        (png::ColorType::Grayscale, _) => {
            let levels = unpack_rows(&buf, width, height, frame.line_size, depth);
            let scale = 255 / ((1u16 << depth) - 1) as u8;
            match trns.as_deref().and_then(trns_key::<1>) {
                None => Pixels::gray(levels.iter().map(|&v| v * scale).collect(), width, height)?,
                Some([key]) => {
                    let pixels = levels
                        .iter()
                        .map(|&v| {
                            let g = v * scale;
                            let a = if v as u16 == key { 0 } else { 255 };
                            RGBA8::new(g, g, g, a)
                        })
                        .collect();
                    Pixels::rgba(pixels, width, height)?
                }
            }
        }
        (png::ColorType::GrayscaleAlpha, _) => {
            let pixels = buf
                .chunks_exact(2)
                .map(|c| RGBA8::new(c[0], c[0], c[0], c[1]))
                .collect();
            Pixels::rgba(pixels, width, height)?
        }
        (png::ColorType::Rgb, _) => {
            let key = trns.as_deref().and_then(trns_key::<3>);
            let pixels = buf
                .chunks_exact(3)
                .map(|c| {
                    let is_key = key.is_some_and(|k| k == [c[0] as u16, c[1] as u16, c[2] as u16]);
                    RGBA8::new(c[0], c[1], c[2], if is_key { 0 } else { 255 })
                })
                .collect();
            Pixels::rgba(pixels, width, height)?
        }
        (png::ColorType::Rgba, _) => {
            let pixels = buf
                .chunks_exact(4)
                .map(|c| RGBA8::new(c[0], c[1], c[2], c[3]))
                .collect();
            Pixels::rgba(pixels, width, height)?
        }
    };

    Ok(DecodedImage::new(pixels, data.len() as u64).with_animation(animated))
}

/// tRNS color key of a gray (`N = 1`) or RGB (`N = 3`) image, one sample per channel.
///
/// Below 16 bits the decoder keeps one byte per channel; at 16 bits each
/// channel is a big-endian pair. Any other length is not a usable key.
fn trns_key<const N: usize>(trns: &[u8]) -> Option<[u16; N]> {
    let mut key = [0u16; N];
    if trns.len() == N {
        for (k, &b) in key.iter_mut().zip(trns) {
            *k = b as u16;
        }
    } else if trns.len() == 2 * N {
        for (k, b) in key.iter_mut().zip(trns.chunks_exact(2)) {
            *k = u16::from_be_bytes([b[0], b[1]]);
        }
    } else {
        return None;
    }
    Some(key)
}

/// Unpack 1/2/4/8-bit samples, one per byte. Each row starts on a byte boundary.
fn unpack_rows(buf: &[u8], width: usize, height: usize, line_size: usize, depth: u8) -> Vec<u8> {
    if depth == 8 {
        return buf[..width * height].to_vec();
    }

    let depth = depth as usize;
    let mask = (1u8 << depth) - 1;
    let mut out = Vec::with_capacity(width * height);
    for row in buf.chunks(line_size).take(height) {
        for x in 0..width {
            let bit = x * depth;
            let shift = 8 - depth - bit % 8;
            out.push((row[bit / 8] >> shift) & mask);
        }
    }
    out
}

/// Smallest PNG bit depth that addresses `len` palette entries.
pub fn palette_bit_depth(len: usize) -> u8 {
    match len {
        0..=2 => 1,
        3..=4 => 2,
        5..=16 => 4,
        _ => 8,
    }
}

/// Pack one-byte samples into `bits`-wide samples, padding each row to a byte.
pub fn pack_rows(data: &[u8], width: usize, bits: u8) -> Vec<u8> {
    if bits == 8 {
        return data.to_vec();
    }

    let bits = bits as usize;
    let row_bytes = (width * bits).div_ceil(8);
    let mut out = Vec::with_capacity(row_bytes * (data.len() / width.max(1)));
    for row in data.chunks(width) {
        let mut acc = 0u8;
        let mut acc_bits = 0;
        for &v in row {
            acc = (acc << bits) | v;
            acc_bits += bits;
            if acc_bits == 8 {
                out.push(acc);
                acc = 0;
                acc_bits = 0;
            }
        }
        if acc_bits > 0 {
            out.push(acc << (8 - acc_bits));
        }
    }
    out
}

struct PngFrame<'a> {
    width: usize,
    height: usize,
    color: png::ColorType,
    depth: png::BitDepth,
    data: &'a [u8],
    palette: Option<Vec<u8>>,
    trns: Option<Vec<u8>>,
}

fn write_png(frame: PngFrame<'_>, effort: Effort) -> Result<Vec<u8>, png::EncodingError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, frame.width as u32, frame.height as u32);
        encoder.set_color(frame.color);
        encoder.set_depth(frame.depth);
        encoder.set_compression(effort.compression());
        if frame.color == png::ColorType::Indexed {
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_adaptive_filter(png::AdaptiveFilterType::Adaptive);
        }
        if let Some(palette) = frame.palette {
            encoder.set_palette(palette);
        }
        if let Some(trns) = frame.trns {
            encoder.set_trns(trns);
        }
        let mut writer = encoder.write_header()?;
        writer.write_image_data(frame.data)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Encode straight RGBA, dropping the alpha channel when every pixel is opaque.
pub fn encode_rgba(
    img: &ImgVec<RGBA8>,
    opaque: bool,
    effort: Effort,
) -> Result<Vec<u8>, OptimizeError> {
    let (color, data): (_, Vec<u8>) = if opaque {
        let data = img.buf().iter().flat_map(|p| [p.r, p.g, p.b]).collect();
        (png::ColorType::Rgb, data)
    } else {
        let data = img.buf().iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
        (png::ColorType::Rgba, data)
    };

    write_png(
        PngFrame {
            width: img.width(),
            height: img.height(),
            color,
            depth: png::BitDepth::Eight,
            data: &data,
            palette: None,
            trns: None,
        },
        effort,
    )
    .map_err(|source| OptimizeError::Encode {
        variant: VariantKind::Direct,
        source,
    })
}

/// Encode 8-bit gray samples.
pub fn encode_gray(
    img: &ImgVec<u8>,
    variant: VariantKind,
    effort: Effort,
) -> Result<Vec<u8>, OptimizeError> {
    write_png(
        PngFrame {
            width: img.width(),
            height: img.height(),
            color: png::ColorType::Grayscale,
            depth: png::BitDepth::Eight,
            data: img.buf(),
            palette: None,
            trns: None,
        },
        effort,
    )
    .map_err(|source| OptimizeError::Encode { variant, source })
}

/// Encode palette indices at the smallest bit depth the palette allows.
pub fn encode_indexed(
    img: &ImgVec<u8>,
    palette: &[RGBA8],
    variant: VariantKind,
    effort: Effort,
) -> Result<Vec<u8>, OptimizeError> {
    let bits = palette_bit_depth(palette.len());
    let depth = match bits {
        1 => png::BitDepth::One,
        2 => png::BitDepth::Two,
        4 => png::BitDepth::Four,
        _ => png::BitDepth::Eight,
    };
    let data = pack_rows(img.buf(), img.width(), bits);
    let plte: Vec<u8> = palette.iter().flat_map(|c| [c.r, c.g, c.b]).collect();

    write_png(
        PngFrame {
            width: img.width(),
            height: img.height(),
            color: png::ColorType::Indexed,
            depth,
            data: &data,
            palette: Some(plte),
            trns: alpha_table(palette),
        },
        effort,
    )
    .map_err(|source| OptimizeError::Encode { variant, source })
}

/// Re-encode raw samples unchanged.
pub fn encode_raw(raw: &RawImage, effort: Effort) -> Result<Vec<u8>, OptimizeError> {
    write_png(
        PngFrame {
            width: raw.width as usize,
            height: raw.height as usize,
            color: raw.color_type,
            depth: raw.bit_depth,
            data: &raw.data,
            palette: raw.palette.clone(),
            trns: raw.trns.clone(),
        },
        effort,
    )
    .map_err(|source| OptimizeError::Encode {
        variant: VariantKind::Direct,
        source,
    })
}
