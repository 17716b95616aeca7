use rgb::RGBA8;
use zenshrink::histogram::classify_rgba;
use zenshrink::palette::Palette;
use zenshrink::variants::generate;
use zenshrink::{DecodedImage, Effort, OptimizeConfig, OptimizeError, Pixels, VariantKind};

fn gradient(width: usize, height: usize) -> Vec<RGBA8> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            pixels.push(RGBA8::new(r, g, 128, 255));
        }
    }
    pixels
}

fn sample_images() -> Vec<Pixels> {
    let few: Vec<RGBA8> = (0..64)
        .map(|i| RGBA8::new((i % 4) as u8 * 60, 10, 20, 255))
        .collect();
    let gray: Vec<RGBA8> = (0..64).map(|i| RGBA8::new(i * 3, i * 3, i * 3, 255)).collect();
    let translucent: Vec<RGBA8> = (0..64).map(|i| RGBA8::new(1, 2, 3, i * 4)).collect();

    vec![
        Pixels::rgba(few, 8, 8).unwrap(),
        Pixels::rgba(gray, 8, 8).unwrap(),
        Pixels::rgba(translucent, 8, 8).unwrap(),
        Pixels::rgba(gradient(32, 32), 32, 32).unwrap(),
        Pixels::gray((0..64).collect(), 8, 8).unwrap(),
        Pixels::indexed(vec![0, 1, 2, 1], gray_palette(3), 2, 2).unwrap(),
    ]
}

fn gray_palette(n: u8) -> Vec<RGBA8> {
    (0..n).map(|i| RGBA8::new(i * 50, i * 50, i * 50, 255)).collect()
}

#[test]
fn direct_variant_always_first() {
    for pixels in sample_images() {
        let set = generate(pixels, Effort::Fast).unwrap();
        assert!(!set.is_empty());
        assert_eq!(set.kinds()[0], VariantKind::Direct);
    }
}

#[test]
fn indexed_variant_whenever_palette_fits() {
    for pixels in sample_images() {
        let Pixels::Rgba { buf, .. } = &pixels else {
            continue;
        };
        let (stats, _) = classify_rgba(buf.buf());
        let set = generate(pixels.clone(), Effort::Fast).unwrap();
        assert_eq!(
            set.kinds().contains(&VariantKind::Indexed),
            stats.colors <= 256,
            "{} colors",
            stats.colors
        );
    }
}

#[test]
fn gray_variant_for_opaque_achromatic() {
    let gray: Vec<RGBA8> = (0..300u32)
        .map(|i| {
            let v = (i % 256) as u8;
            RGBA8::new(v, v, v, 255)
        })
        .collect();
    let set = generate(Pixels::rgba(gray, 30, 10).unwrap(), Effort::Fast).unwrap();
    // 256 levels: gray and indexed both apply
    assert_eq!(
        set.kinds(),
        vec![VariantKind::Direct, VariantKind::Gray, VariantKind::Indexed]
    );
}

#[test]
fn two_by_two_two_colors() {
    let a = RGBA8::new(10, 200, 30, 255);
    let b = RGBA8::new(250, 0, 90, 255);
    let pixels = Pixels::rgba(vec![a, b, b, a], 2, 2).unwrap();
    let set = generate(pixels, Effort::Max).unwrap();
    assert_eq!(set.kinds(), vec![VariantKind::Direct, VariantKind::Indexed]);

    let smallest = set.variants().iter().map(|v| v.len()).min().unwrap();
    assert_eq!(set.best().len(), smallest);
}

#[test]
fn transparent_color_takes_index_zero() {
    let mut pixels: Vec<RGBA8> = (0..49u8).map(|i| RGBA8::new(i, 255 - i, 7, 255)).collect();
    pixels.push(RGBA8::new(0, 0, 0, 0));
    let (stats, table) = classify_rgba(&pixels);
    assert_eq!(stats.colors, 50);

    let palette = Palette::from_rgba_counts(&table).unwrap();
    assert_eq!(palette.len(), 50);
    assert_eq!(palette.transparent_index(), Some(0));
}

#[test]
fn optimize_image_from_memory() {
    let pixels = Pixels::rgba(vec![RGBA8::new(9, 9, 9, 255); 256], 16, 16).unwrap();
    // pretend the source file was huge
    let image = DecodedImage::new(pixels, 1 << 20);
    let optimized = zenshrink::optimize_image(image, &OptimizeConfig::new()).unwrap();

    assert!(optimized.replacement.is_some());
    assert!(optimized.outcome.saved() > 0);
    assert_eq!(
        optimized.outcome.new_len,
        optimized.replacement.as_ref().unwrap().len() as u64
    );
}

#[test]
fn optimize_image_noop_when_source_smaller() {
    let pixels = Pixels::rgba(gradient(16, 16), 16, 16).unwrap();
    let image = DecodedImage::new(pixels, 1);
    let optimized = zenshrink::optimize_image(image, &OptimizeConfig::new()).unwrap();

    assert!(optimized.replacement.is_none());
    assert!(optimized.outcome.is_noop());
    assert_eq!(optimized.outcome.saved(), 0);
}

#[test]
fn error_zero_dimension() {
    assert!(matches!(
        Pixels::rgba(Vec::new(), 0, 1),
        Err(OptimizeError::ZeroDimension)
    ));
    assert!(matches!(
        Pixels::gray(Vec::new(), 1, 0),
        Err(OptimizeError::ZeroDimension)
    ));
}

#[test]
fn error_dimension_mismatch() {
    assert!(matches!(
        Pixels::gray(vec![0; 10], 4, 4),
        Err(OptimizeError::DimensionMismatch { .. })
    ));
}
