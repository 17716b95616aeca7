use std::collections::BTreeMap;

use rgb::RGBA8;

/// Exact color occurrence counts, enumerated in ascending key order.
///
/// Built once by the classifier and handed to the palette builder as-is, so
/// both stages see the same counts.
#[derive(Debug, Clone)]
pub struct FrequencyTable<K: Ord> {
    counts: BTreeMap<K, u32>,
}

impl<K: Ord + Copy> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy> FrequencyTable<K> {
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Number of distinct keys seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, key: K) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        self.counts.iter().map(|(&k, &n)| (k, n))
    }
}

/// Summary of a single pass over the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorStats {
    /// Distinct exact colors.
    pub colors: usize,
    /// Some pixel has alpha == 0.
    pub has_transparent: bool,
    /// Some pixel has 0 < alpha < 255.
    pub has_partial_alpha: bool,
    /// Every pixel has r == g == b.
    pub is_gray: bool,
}

impl ColorStats {
    pub fn has_alpha(&self) -> bool {
        self.has_transparent || self.has_partial_alpha
    }

    /// Achromatic and fully opaque: representable as plain 8-bit gray.
    pub fn fits_gray(&self) -> bool {
        self.is_gray && !self.has_alpha()
    }
}

/// Pack an RGBA color into a sortable key.
#[inline]
pub fn pack_rgba(p: RGBA8) -> u32 {
    (p.r as u32) << 24 | (p.g as u32) << 16 | (p.b as u32) << 8 | p.a as u32
}

#[inline]
pub fn unpack_rgba(k: u32) -> RGBA8 {
    RGBA8::new((k >> 24) as u8, (k >> 16) as u8, (k >> 8) as u8, k as u8)
}

/// Scan straight-alpha RGBA pixels once, counting every exact color.
pub fn classify_rgba(pixels: &[RGBA8]) -> (ColorStats, FrequencyTable<u32>) {
    let mut table = FrequencyTable::new();
    let mut is_gray = true;
    let mut has_transparent = false;
    let mut has_partial_alpha = false;

    for &p in pixels {
        table.add(pack_rgba(p));

        if p.r != p.g || p.r != p.b {
            is_gray = false;
        }

        match p.a {
            0 => has_transparent = true,
            255 => {}
            _ => has_partial_alpha = true,
        }
    }

    let stats = ColorStats {
        colors: table.len(),
        has_transparent,
        has_partial_alpha,
        is_gray,
    };
    (stats, table)
}

/// Scan 8-bit gray samples. Gray-native sources skip the achromatic test.
pub fn classify_gray(samples: &[u8]) -> (ColorStats, FrequencyTable<u8>) {
    let mut table = FrequencyTable::new();
    for &v in samples {
        table.add(v);
    }

    let stats = ColorStats {
        colors: table.len(),
        has_transparent: false,
        has_partial_alpha: false,
        is_gray: true,
    };
    (stats, table)
}
