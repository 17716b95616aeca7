//! Deciding whether the best variant replaces the original, and replacing it safely.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{IoStage, OptimizeError};
use crate::variants::{Variant, VariantKind};

/// Suffix of the sibling file written before the atomic rename.
pub const TEMP_SUFFIX: &str = ".pngtmp";

/// Result of optimizing one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub original_len: u64,
    /// Size of the best candidate, whether or not it was kept.
    pub new_len: u64,
    pub chosen: VariantKind,
    pub label: String,
}

impl Outcome {
    /// Bytes saved; zero for a no-op.
    pub fn saved(&self) -> u64 {
        self.original_len.saturating_sub(self.new_len)
    }

    /// The original was at least as small as every candidate.
    pub fn is_noop(&self) -> bool {
        self.saved() == 0
    }

    pub fn saved_percent(&self) -> f64 {
        if self.original_len == 0 {
            return 0.0;
        }
        self.saved() as f64 / self.original_len as f64 * 100.0
    }
}

/// Outcome plus the replacement bytes, present only when strictly smaller.
#[derive(Debug, Clone)]
pub struct Optimized {
    pub outcome: Outcome,
    pub replacement: Option<Vec<u8>>,
}

/// Keep the best variant only if it is strictly smaller than the original.
pub fn settle(original_len: u64, best: Variant) -> Optimized {
    let new_len = best.bytes.len() as u64;
    let outcome = Outcome {
        original_len,
        new_len,
        chosen: best.kind,
        label: best.label,
    };
    let replacement = (new_len < original_len).then_some(best.bytes);
    Optimized {
        outcome,
        replacement,
    }
}

/// Deterministic temporary path next to `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Replace `path` with `bytes` via a sibling temporary file and a rename.
///
/// On any failure the original is untouched and the temporary file is removed.
pub fn replace_atomically(path: &Path, bytes: &[u8]) -> Result<(), OptimizeError> {
    replace_with(path, bytes, |from, to| fs::rename(from, to))
}

fn replace_with(
    path: &Path,
    bytes: &[u8],
    rename: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> Result<(), OptimizeError> {
    let tmp = temp_path(path);

    if let Err(e) = write_synced(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(OptimizeError::io(IoStage::WriteTemp)(e));
    }

    if let Err(e) = rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(OptimizeError::io(IoStage::Rename)(e));
    }

    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
