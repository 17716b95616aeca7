//! Candidate re-encodings of one image and the choice between them.

use std::fmt;

use imgref::ImgVec;
use log::debug;
use rgb::RGBA8;

use crate::codec::{self, Effort};
use crate::error::OptimizeError;
use crate::histogram::{classify_gray, classify_rgba};
use crate::image::{AlphaMode, Pixels, RawImage};
use crate::palette::{Palette, is_gray_palette};
use crate::remap;

/// Which representation a variant uses, in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VariantKind {
    /// The source color model, re-encoded unchanged.
    Direct,
    /// 8-bit grayscale.
    Gray,
    /// Palette indices with PLTE (and tRNS when needed).
    Indexed,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Gray => "gray",
            Self::Indexed => "indexed",
        })
    }
}

/// One encoded candidate.
#[derive(Debug, Clone)]
pub struct Variant {
    pub kind: VariantKind,
    /// Human-readable description, e.g. `direct (rgba)` or `indexed (12 colors)`.
    pub label: String,
    pub bytes: Vec<u8>,
}

impl Variant {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// All candidates for one image. Never empty: it is created from the direct variant.
#[derive(Debug, Clone)]
pub struct VariantSet {
    variants: Vec<Variant>,
}

impl VariantSet {
    pub fn new(direct: Variant) -> Self {
        let mut variants = Vec::with_capacity(3);
        variants.push(direct);
        Self { variants }
    }

    fn push(&mut self, variant: Variant) {
        debug!("variant {}: {} bytes", variant.label, variant.len());
        self.variants.push(variant);
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn kinds(&self) -> Vec<VariantKind> {
        self.variants.iter().map(|v| v.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The strictly smallest variant; the earliest generated wins ties.
    pub fn best(self) -> Variant {
        let mut iter = self.variants.into_iter();
        let mut best = iter
            .next()
            .unwrap_or_else(|| unreachable!("variant set always holds the direct variant"));
        for v in iter {
            if v.len() < best.len() {
                best = v;
            }
        }
        best
    }
}

/// Build every applicable variant for `pixels`.
pub fn generate(pixels: Pixels, effort: Effort) -> Result<VariantSet, OptimizeError> {
    match pixels {
        Pixels::Rgba {
            mut buf,
            alpha: AlphaMode::Premultiplied,
        } => {
            remap::unpremultiply(buf.buf_mut());
            generate_rgba(&buf, effort)
        }
        Pixels::Rgba {
            buf,
            alpha: AlphaMode::Straight,
        } => generate_rgba(&buf, effort),
        Pixels::Indexed { buf, palette } => generate_indexed(&buf, &palette, effort),
        Pixels::Gray(buf) => generate_gray(&buf, effort),
        Pixels::Unsupported(raw) => generate_raw(&raw, effort),
    }
}

fn generate_rgba(img: &ImgVec<RGBA8>, effort: Effort) -> Result<VariantSet, OptimizeError> {
    let (stats, table) = classify_rgba(img.buf());
    debug!(
        "{} colors, transparent: {}, partial alpha: {}, gray: {}",
        stats.colors, stats.has_transparent, stats.has_partial_alpha, stats.is_gray
    );

    let opaque = !stats.has_alpha();
    let mut set = VariantSet::new(Variant {
        kind: VariantKind::Direct,
        label: if opaque { "direct (rgb)" } else { "direct (rgba)" }.into(),
        bytes: codec::encode_rgba(img, opaque, effort)?,
    });

    if stats.fits_gray() {
        let gray = ImgVec::new(remap::rgba_to_gray(img.buf()), img.width(), img.height());
        set.push(Variant {
            kind: VariantKind::Gray,
            label: "gray".into(),
            bytes: codec::encode_gray(&gray, VariantKind::Gray, effort)?,
        });
    }

    // The codec cannot pair tRNS with a gray/RGB alpha channel, so a
    // translucent image with few colors only gets the indexed form.
    if let Some(palette) = Palette::from_rgba_counts(&table) {
        let indices = remap::remap_rgba(img.buf(), &palette)?;
        set.push(indexed_variant(img, indices, &palette, effort)?);
    }

    Ok(set)
}

fn generate_indexed(
    img: &ImgVec<u8>,
    palette: &[RGBA8],
    effort: Effort,
) -> Result<VariantSet, OptimizeError> {
    let mut set = VariantSet::new(Variant {
        kind: VariantKind::Direct,
        label: "direct (indexed)".into(),
        bytes: codec::encode_indexed(img, palette, VariantKind::Direct, effort)?,
    });

    if is_gray_palette(palette) {
        let gray = remap::indexed_to_gray(img.buf(), palette)?;
        let gray = ImgVec::new(gray, img.width(), img.height());
        set.push(Variant {
            kind: VariantKind::Gray,
            label: "gray".into(),
            bytes: codec::encode_gray(&gray, VariantKind::Gray, effort)?,
        });
    }

    Ok(set)
}

fn generate_gray(img: &ImgVec<u8>, effort: Effort) -> Result<VariantSet, OptimizeError> {
    let mut set = VariantSet::new(Variant {
        kind: VariantKind::Direct,
        label: "direct (gray)".into(),
        bytes: codec::encode_gray(img, VariantKind::Direct, effort)?,
    });

    let (stats, table) = classify_gray(img.buf());
    debug!("{} gray levels", stats.colors);

    if let Some(palette) = Palette::from_gray_counts(&table) {
        let indices = remap::remap_gray(img.buf(), &palette)?;
        set.push(indexed_variant(img, indices, &palette, effort)?);
    }

    Ok(set)
}

/// 16-bit and other forms without a dedicated reduction.
fn generate_raw(raw: &RawImage, effort: Effort) -> Result<VariantSet, OptimizeError> {
    Ok(VariantSet::new(Variant {
        kind: VariantKind::Direct,
        label: format!("direct ({:?} {}-bit)", raw.color_type, raw.bit_depth as u8),
        bytes: codec::encode_raw(raw, effort)?,
    }))
}

fn indexed_variant<T>(
    src: &ImgVec<T>,
    indices: Vec<u8>,
    palette: &Palette,
    effort: Effort,
) -> Result<Variant, OptimizeError> {
    let img = ImgVec::new(indices, src.width(), src.height());
    Ok(Variant {
        kind: VariantKind::Indexed,
        label: format!("indexed ({} colors)", palette.len()),
        bytes: codec::encode_indexed(&img, &palette.colors(), VariantKind::Indexed, effort)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(kind: VariantKind, len: usize) -> Variant {
        Variant {
            kind,
            label: kind.to_string(),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn best_picks_smallest() {
        let mut set = VariantSet::new(variant(VariantKind::Direct, 30));
        set.push(variant(VariantKind::Gray, 20));
        set.push(variant(VariantKind::Indexed, 25));
        assert_eq!(set.best().kind, VariantKind::Gray);
    }

    #[test]
    fn ties_go_to_earliest() {
        let mut set = VariantSet::new(variant(VariantKind::Direct, 10));
        set.push(variant(VariantKind::Gray, 10));
        set.push(variant(VariantKind::Indexed, 10));
        assert_eq!(set.best().kind, VariantKind::Direct);

        let mut set = VariantSet::new(variant(VariantKind::Direct, 11));
        set.push(variant(VariantKind::Gray, 10));
        set.push(variant(VariantKind::Indexed, 10));
        assert_eq!(set.best().kind, VariantKind::Gray);
    }

    #[test]
    fn two_color_opaque_image() {
        let red = RGBA8::new(255, 0, 0, 255);
        let blue = RGBA8::new(0, 0, 255, 255);
        let pixels = Pixels::rgba(vec![red, blue, blue, red], 2, 2).unwrap();
        let set = generate(pixels, Effort::Fast).unwrap();
        assert_eq!(set.kinds(), vec![VariantKind::Direct, VariantKind::Indexed]);
        assert_eq!(set.variants()[1].label, "indexed (2 colors)");
    }

    #[test]
    fn gray_rgba_gets_all_three() {
        let pixels: Vec<RGBA8> = (0..16).map(|i| RGBA8::new(i * 10, i * 10, i * 10, 255)).collect();
        let set = generate(Pixels::rgba(pixels, 4, 4).unwrap(), Effort::Fast).unwrap();
        assert_eq!(
            set.kinds(),
            vec![VariantKind::Direct, VariantKind::Gray, VariantKind::Indexed]
        );
    }

    #[test]
    fn translucent_gray_skips_gray_variant() {
        let pixels = vec![RGBA8::new(5, 5, 5, 255), RGBA8::new(5, 5, 5, 128)];
        let set = generate(Pixels::rgba(pixels, 2, 1).unwrap(), Effort::Fast).unwrap();
        assert_eq!(set.kinds(), vec![VariantKind::Direct, VariantKind::Indexed]);
    }

    #[test]
    fn many_colors_only_direct() {
        let pixels: Vec<RGBA8> = (0..300u32)
            .map(|i| RGBA8::new(i as u8, (i >> 8) as u8, 7, 255))
            .collect();
        let set = generate(Pixels::rgba(pixels, 30, 10).unwrap(), Effort::Fast).unwrap();
        assert_eq!(set.kinds(), vec![VariantKind::Direct]);
    }

    #[test]
    fn gray_palette_source_gets_gray_variant() {
        let palette = vec![RGBA8::new(0, 0, 0, 255), RGBA8::new(200, 200, 200, 255)];
        let pixels = Pixels::indexed(vec![0, 1, 1, 0], palette, 2, 2).unwrap();
        let set = generate(pixels, Effort::Fast).unwrap();
        assert_eq!(set.kinds(), vec![VariantKind::Direct, VariantKind::Gray]);
    }

    #[test]
    fn colored_palette_source_is_direct_only() {
        let palette = vec![RGBA8::new(0, 0, 0, 255), RGBA8::new(200, 0, 0, 255)];
        let pixels = Pixels::indexed(vec![0, 1, 1, 0], palette, 2, 2).unwrap();
        let set = generate(pixels, Effort::Fast).unwrap();
        assert_eq!(set.kinds(), vec![VariantKind::Direct]);
    }

    #[test]
    fn gray_source_gets_indexed_variant() {
        let pixels = Pixels::gray(vec![0, 0, 255, 255], 2, 2).unwrap();
        let set = generate(pixels, Effort::Fast).unwrap();
        assert_eq!(set.kinds(), vec![VariantKind::Direct, VariantKind::Indexed]);
    }

    #[test]
    fn premultiplied_source_is_unpremultiplied_first() {
        let pixels = vec![RGBA8::new(64, 64, 64, 128), RGBA8::new(9, 9, 9, 0)];
        let set = generate(Pixels::premultiplied(pixels, 2, 1).unwrap(), Effort::Fast).unwrap();
        let indexed = &set.variants()[1];
        assert_eq!(indexed.kind, VariantKind::Indexed);

        let decoded = codec::decode(&indexed.bytes).unwrap();
        match decoded.pixels() {
            Pixels::Indexed { palette, .. } => {
                assert_eq!(palette[0], RGBA8::new(0, 0, 0, 0));
                assert_eq!(palette[1], RGBA8::new(127, 127, 127, 128));
            }
            other => panic!("expected indexed, got {}", other.model_name()),
        }
    }
}
