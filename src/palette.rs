use rgb::RGBA8;

use crate::histogram::{FrequencyTable, unpack_rgba};
use crate::image::MAX_PALETTE_LEN;

/// Alpha category used to order palette entries.
///
/// Declaration order is the palette order: transparent first, then
/// translucent, then opaque. A tRNS chunk may stop at the last non-opaque
/// entry, so pushing opaque colors to the back keeps it short, and a single
/// transparent color at index 0 needs a one-byte tRNS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlphaClass {
    Transparent,
    Translucent,
    Opaque,
}

impl AlphaClass {
    #[inline]
    pub fn of(alpha: u8) -> Self {
        match alpha {
            0 => Self::Transparent,
            255 => Self::Opaque,
            _ => Self::Translucent,
        }
    }
}

/// One palette slot: a color and how many pixels use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: RGBA8,
    pub count: u32,
}

/// An exact palette whose entry order is the on-disk index order.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Build a palette from exact RGBA counts.
    ///
    /// Returns `None` when there are more colors than an index byte can address.
    /// Entries are ordered by [`AlphaClass`], then by descending count; ties
    /// keep the table's enumeration order.
    pub fn from_rgba_counts(table: &FrequencyTable<u32>) -> Option<Self> {
        if table.len() > MAX_PALETTE_LEN {
            return None;
        }

        let mut entries: Vec<PaletteEntry> = table
            .iter()
            .map(|(key, count)| PaletteEntry {
                color: unpack_rgba(key),
                count,
            })
            .collect();

        entries.sort_by(|a, b| {
            AlphaClass::of(a.color.a)
                .cmp(&AlphaClass::of(b.color.a))
                .then(b.count.cmp(&a.count))
        });

        Some(Self { entries })
    }

    /// Build a gray palette, most frequent level first.
    pub fn from_gray_counts(table: &FrequencyTable<u8>) -> Option<Self> {
        if table.len() > MAX_PALETTE_LEN {
            return None;
        }

        let mut entries: Vec<PaletteEntry> = table
            .iter()
            .map(|(v, count)| PaletteEntry {
                color: RGBA8::new(v, v, v, 255),
                count,
            })
            .collect();

        entries.sort_by(|a, b| b.count.cmp(&a.count));

        Some(Self { entries })
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn colors(&self) -> Vec<RGBA8> {
        self.entries.iter().map(|e| e.color).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the fully transparent entry, if any.
    pub fn transparent_index(&self) -> Option<u8> {
        self.entries
            .iter()
            .position(|e| e.color.a == 0)
            .map(|i| i as u8)
    }
}

/// Alpha values for a tRNS chunk, truncated after the last non-opaque entry.
///
/// Returns `None` when every entry is opaque (no tRNS needed).
pub fn alpha_table(colors: &[RGBA8]) -> Option<Vec<u8>> {
    let last_non_opaque = colors.iter().rposition(|c| c.a != 255)?;
    Some(colors[..=last_non_opaque].iter().map(|c| c.a).collect())
}

/// Whether every palette entry is opaque and achromatic.
pub fn is_gray_palette(colors: &[RGBA8]) -> bool {
    colors
        .iter()
        .all(|c| c.a == 255 && c.r == c.g && c.r == c.b)
}
