use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::variants::VariantKind;

/// Which filesystem step an I/O failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStage {
    /// Reading the source file.
    Read,
    /// Writing or flushing the sibling temporary file.
    WriteTemp,
    /// Renaming the temporary file over the target.
    Rename,
    /// Listing a directory during traversal.
    Walk,
}

impl fmt::Display for IoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::WriteTemp => "write temporary file",
            Self::Rename => "rename",
            Self::Walk => "walk directory",
        })
    }
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("decode failed: {0}")]
    Decode(#[from] png::DecodingError),

    #[error("encode of {variant} variant failed: {source}")]
    Encode {
        variant: VariantKind,
        #[source]
        source: png::EncodingError,
    },

    #[error("color {color:#010x} has no palette entry")]
    Conversion { color: u32 },

    #[error("palette index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: u8, len: usize },

    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error("palette must have at most 256 entries, got {0}")]
    PaletteTooLarge(usize),

    #[error("{stage} failed: {source}")]
    Io {
        stage: IoStage,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: Box<OptimizeError>,
    },
}

impl OptimizeError {
    pub(crate) fn io(stage: IoStage) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { stage, source }
    }

    pub(crate) fn in_asset(self, path: impl Into<PathBuf>) -> Self {
        match self {
            already @ Self::Asset { .. } => already,
            source => Self::Asset {
                path: path.into(),
                source: Box::new(source),
            },
        }
    }
}
