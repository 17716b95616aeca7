//! Lossless PNG shrinking by representation choice.
//!
//! Each image is re-encoded in every color model that can hold it exactly
//! (its own model, 8-bit gray, and an exact palette of at most 256 entries),
//! and the smallest result replaces the file only if it beats the original.
//! Pixel values are never changed.
//!
//! ```rust,no_run
//! use zenshrink::{OptimizeConfig, optimize_bytes};
//!
//! let data = std::fs::read("icon.png").unwrap();
//! let optimized = optimize_bytes(&data, &OptimizeConfig::new()).unwrap();
//! if let Some(bytes) = optimized.replacement {
//!     std::fs::write("icon.png", bytes).unwrap();
//! }
//! ```

#![forbid(unsafe_code)]

pub mod codec;
pub mod commit;
pub mod error;
pub mod histogram;
pub mod image;
pub mod palette;
pub mod registry;
pub mod remap;
pub mod variants;
pub mod walk;

pub use codec::Effort;
pub use commit::{Optimized, Outcome};
pub use error::{IoStage, OptimizeError};
pub use image::{AlphaMode, DecodedImage, Pixels};
pub use registry::{AssetOptimizer, PngOptimizer, Registry};
pub use variants::{Variant, VariantKind, VariantSet};
pub use walk::{ErrorPolicy, FileReport, RunReport, Walker};

/// Configuration for a single optimization.
#[derive(Debug, Clone, Default)]
pub struct OptimizeConfig {
    /// Encoder compression effort for every candidate.
    pub effort: Effort,
}

impl OptimizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effort(mut self, effort: Effort) -> Self {
        self.effort = effort;
        self
    }
}

/// Decode `data`, build its variants and decide whether the best one should replace it.
pub fn optimize_bytes(data: &[u8], config: &OptimizeConfig) -> Result<Optimized, OptimizeError> {
    let image = codec::decode(data)?;
    optimize_image(image, config)
}

/// Like [`optimize_bytes`], for an image that is already decoded.
///
/// Animated images are never replaced.
pub fn optimize_image(
    image: DecodedImage,
    config: &OptimizeConfig,
) -> Result<Optimized, OptimizeError> {
    let original_len = image.encoded_len();
    if image.is_animated() {
        // re-encoding the default image alone would drop every other frame
        return Ok(Optimized {
            outcome: Outcome {
                original_len,
                new_len: original_len,
                chosen: VariantKind::Direct,
                label: "animated (kept)".into(),
            },
            replacement: None,
        });
    }
    let set = variants::generate(image.into_pixels(), config.effort)?;
    Ok(commit::settle(original_len, set.best()))
}
