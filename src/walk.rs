//! Recursive traversal that dispatches files to the registry and tallies results.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};

use crate::commit::Outcome;
use crate::error::{IoStage, OptimizeError};
use crate::registry::Registry;

/// What to do when one file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the run at the first error.
    #[default]
    FailFast,
    /// Record the error and move on to the next file.
    KeepGoing,
}

/// Per-file result of a run.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Everything a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<OptimizeError>,
}

impl RunReport {
    /// Files that were replaced with a smaller encoding.
    pub fn files_modified(&self) -> usize {
        self.files.iter().filter(|f| !f.outcome.is_noop()).count()
    }

    pub fn bytes_saved(&self) -> u64 {
        self.files.iter().map(|f| f.outcome.saved()).sum()
    }
}

/// Walks a directory tree and hands every registered file to its optimizer.
#[derive(Debug)]
pub struct Walker<'r> {
    root: PathBuf,
    registry: &'r Registry,
    policy: ErrorPolicy,
}

impl<'r> Walker<'r> {
    pub fn new(root: impl Into<PathBuf>, registry: &'r Registry) -> Self {
        Self {
            root: root.into(),
            registry,
            policy: ErrorPolicy::default(),
        }
    }

    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Visit every file under the root in sorted order.
    pub fn run(&self) -> Result<RunReport, OptimizeError> {
        let started = Instant::now();
        info!("starting optimization of {}", self.root.display());

        let mut report = RunReport::default();
        self.visit(&self.root, &mut report)?;

        info!(
            "finished in {:.2?}: {} files optimized, {} bytes saved",
            started.elapsed(),
            report.files_modified(),
            report.bytes_saved()
        );
        Ok(report)
    }

    fn visit(&self, dir: &Path, report: &mut RunReport) -> Result<(), OptimizeError> {
        let entries = match read_dir_sorted(dir) {
            Ok(entries) => entries,
            Err(e) => return self.fail(e.in_asset(dir), report),
        };

        for path in entries {
            let meta = match fs::symlink_metadata(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    self.fail(OptimizeError::io(IoStage::Walk)(e).in_asset(&path), report)?;
                    continue;
                }
            };

            if meta.is_dir() {
                self.visit(&path, report)?;
                continue;
            }
            // symlinks and special files are skipped
            if !meta.is_file() {
                continue;
            }

            let Some(optimizer) = self.registry.for_path(&path) else {
                continue;
            };

            match optimizer.optimize(&path) {
                Ok(outcome) => report.files.push(FileReport { path, outcome }),
                Err(e) => self.fail(e, report)?,
            }
        }
        Ok(())
    }

    fn fail(&self, err: OptimizeError, report: &mut RunReport) -> Result<(), OptimizeError> {
        match self.policy {
            ErrorPolicy::FailFast => Err(err),
            ErrorPolicy::KeepGoing => {
                warn!("skipping: {err}");
                report.failures.push(err);
                Ok(())
            }
        }
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, OptimizeError> {
    let mut paths = fs::read_dir(dir)
        .and_then(|rd| rd.map(|e| e.map(|e| e.path())).collect::<Result<Vec<_>, _>>())
        .map_err(OptimizeError::io(IoStage::Walk))?;
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VariantKind;
    use crate::registry::AssetOptimizer;

    struct Shrink(u64);

    impl AssetOptimizer for Shrink {
        fn optimize(&self, path: &Path) -> Result<Outcome, OptimizeError> {
            if path.file_stem().is_some_and(|s| s == "bad") {
                return Err(OptimizeError::ZeroDimension.in_asset(path));
            }
            Ok(Outcome {
                original_len: 100,
                new_len: 100 - self.0,
                chosen: VariantKind::Indexed,
                label: "indexed".into(),
            })
        }
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.png"), b"").unwrap();
        fs::write(dir.path().join("b.txt"), b"").unwrap();
        fs::write(dir.path().join("noext"), b"").unwrap();
        fs::write(dir.path().join("sub/c.PNG"), b"").unwrap();
        dir
    }

    #[test]
    fn visits_registered_extensions_recursively() {
        let dir = tree();
        let registry = Registry::new().register("png", Shrink(30));
        let report = Walker::new(dir.path(), &registry).run().unwrap();

        let names: Vec<_> = report
            .files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("a.png"), PathBuf::from("sub/c.PNG")]);
        assert_eq!(report.files_modified(), 2);
        assert_eq!(report.bytes_saved(), 60);
    }

    #[test]
    fn noop_files_are_not_counted_as_modified() {
        let dir = tree();
        let registry = Registry::new().register("png", Shrink(0));
        let report = Walker::new(dir.path(), &registry).run().unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files_modified(), 0);
        assert_eq!(report.bytes_saved(), 0);
    }

    #[test]
    fn fail_fast_stops_at_first_error() {
        let dir = tree();
        fs::write(dir.path().join("bad.png"), b"").unwrap();
        let registry = Registry::new().register("png", Shrink(1));
        let err = Walker::new(dir.path(), &registry).run().unwrap_err();
        assert!(matches!(err, OptimizeError::Asset { .. }));
    }

    #[test]
    fn keep_going_records_and_continues() {
        let dir = tree();
        fs::write(dir.path().join("bad.png"), b"").unwrap();
        let registry = Registry::new().register("png", Shrink(1));
        let report = Walker::new(dir.path(), &registry)
            .policy(ErrorPolicy::KeepGoing)
            .run()
            .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.files.len(), 2);
    }

    #[test]
    fn missing_root_is_a_walk_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new();
        let err = Walker::new(dir.path().join("nope"), &registry).run().unwrap_err();
        match err {
            OptimizeError::Asset { source, .. } => assert!(matches!(
                *source,
                OptimizeError::Io {
                    stage: IoStage::Walk,
                    ..
                }
            )),
            other => panic!("unexpected error: {other}"),
        }
    }
}
