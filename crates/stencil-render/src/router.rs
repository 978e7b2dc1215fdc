//! Routing rendered text to output files.
//!
//! Each record names its output through a column. The [`OutputRouter`]
//! turns that name into a path and decides what to do with the text:
//!
//! | Path state in this run | File on disk, not forced | Action |
//! |------------------------|--------------------------|--------|
//! | unwritten | absent (or forced) | create (truncate) and write |
//! | unwritten | present | skip, keep the existing file |
//! | created / appended | - | append |
//! | skipped | - | skip |
//!
//! So records sharing an output name compose one file in input order, and a
//! file left by an earlier run is never clobbered unless the run is forced.
//! A forced run first removes generated files (see [`GENERATED_EXTENSIONS`])
//! from the output directory, once, before any record is routed.
//!
//! Routing is single-threaded: the per-path state is plain mutable state.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Error;
use crate::summary::RunSummary;
use crate::template::registry::is_contained;

/// Extensions of files a forced run removes from the output directory.
pub const GENERATED_EXTENSIONS: &[&str] = &["txt", "cfg"];

/// Default extension of per-record output files.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "txt";

/// How output names map to files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetLayout {
    /// One file per distinct output name: `<dir>/<name>.<extension>`.
    PerRecord { dir: PathBuf, extension: String },
    /// Every record goes to the same file.
    SingleFile(PathBuf),
}

impl TargetLayout {
    /// Per-record layout with the default extension.
    pub fn per_record(dir: impl Into<PathBuf>) -> Self {
        TargetLayout::PerRecord {
            dir: dir.into(),
            extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
        }
    }

    /// Directory holding the generated files.
    pub fn output_dir(&self) -> &Path {
        match self {
            TargetLayout::PerRecord { dir, .. } => dir,
            TargetLayout::SingleFile(path) => path.parent().unwrap_or_else(|| Path::new(".")),
        }
    }

    /// Resolves an output name to a target.
    ///
    /// In per-record layout an empty name goes to standard output. Names
    /// must be relative and must not contain `..`.
    pub fn target_for(&self, output_name: &str) -> Result<OutputTarget, Error> {
        match self {
            TargetLayout::SingleFile(path) => Ok(OutputTarget::File(path.clone())),
            TargetLayout::PerRecord { dir, extension } => {
                let name = output_name.trim();
                if name.is_empty() {
                    return Ok(OutputTarget::Stdout);
                }
                if !is_contained(Path::new(name)) {
                    return Err(Error::InvalidTarget {
                        name: output_name.to_string(),
                        reason: "must be a relative path inside the output directory".into(),
                    });
                }
                let file_name = if extension.is_empty() {
                    name.to_string()
                } else {
                    format!("{}.{}", name, extension)
                };
                Ok(OutputTarget::File(dir.join(file_name)))
            }
        }
    }

    fn is_generated(&self, path: &Path) -> bool {
        if let TargetLayout::SingleFile(single) = self {
            if path == single {
                return true;
            }
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        GENERATED_EXTENSIONS.contains(&ext)
            || matches!(self, TargetLayout::PerRecord { extension, .. } if extension == ext)
    }
}

/// Where one record's text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

/// Write state of a path within the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    Created,
    Appended,
    Skipped,
}

/// What the router did with one record's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Created(PathBuf),
    Appended(PathBuf),
    Skipped(PathBuf),
    Stdout,
}

/// Owns the per-path write state and the run summary.
pub struct OutputRouter<W: Write = io::Stdout> {
    layout: TargetLayout,
    force_override: bool,
    states: HashMap<PathBuf, TargetState>,
    summary: RunSummary,
    stdout: W,
}

impl OutputRouter<io::Stdout> {
    /// Starts a run writing empty-named outputs to the process stdout.
    ///
    /// See [`OutputRouter::with_writer`].
    pub fn start(layout: TargetLayout, force_override: bool) -> Result<Self, Error> {
        Self::with_writer(layout, force_override, io::stdout())
    }
}

impl<W: Write> OutputRouter<W> {
    /// Starts a run with an explicit writer for empty-named outputs.
    ///
    /// When `force_override` is set, generated files are removed from the
    /// output directory before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if pruning fails.
    pub fn with_writer(
        layout: TargetLayout,
        force_override: bool,
        stdout: W,
    ) -> Result<Self, Error> {
        let mut router = Self {
            layout,
            force_override,
            states: HashMap::new(),
            summary: RunSummary::default(),
            stdout,
        };
        if force_override {
            router.summary.pruned = router.prune()?;
        }
        Ok(router)
    }

    fn prune(&self) -> Result<usize, Error> {
        let dir = self.layout.output_dir();
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let path = entry.path();
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && self.layout.is_generated(&path) {
                fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
                removed += 1;
            }
        }
        log::info!("removed {} generated files from {}", removed, dir.display());
        Ok(removed)
    }

    /// Routes one record's rendered text to its target.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTarget`] for an output name outside the output directory
    /// - [`Error::Io`] if creating or writing the file fails
    pub fn route(&mut self, output_name: &str, text: &str) -> Result<RouteOutcome, Error> {
        let path = match self.layout.target_for(output_name)? {
            OutputTarget::Stdout => {
                log::warn!("couldn't determine output filename for entry, writing to stdout");
                self.stdout
                    .write_all(text.as_bytes())
                    .and_then(|_| self.stdout.flush())
                    .map_err(|e| Error::io("<stdout>", e))?;
                self.summary.stdout_writes += 1;
                return Ok(RouteOutcome::Stdout);
            }
            OutputTarget::File(path) => path,
        };

        match self.states.get(&path).copied() {
            Some(TargetState::Skipped) => {
                log::debug!("{} skipped earlier in this run", path.display());
                Ok(RouteOutcome::Skipped(path))
            }
            Some(TargetState::Created) | Some(TargetState::Appended) => {
                append(&path, text)?;
                self.states.insert(path.clone(), TargetState::Appended);
                self.summary.appended += 1;
                log::debug!("appended to {}", path.display());
                Ok(RouteOutcome::Appended(path))
            }
            None if !self.force_override && path.exists() => {
                log::warn!(
                    "{} already exists, skipping (use force override to replace it)",
                    path.display()
                );
                self.states.insert(path.clone(), TargetState::Skipped);
                self.summary.skipped.push(path.clone());
                Ok(RouteOutcome::Skipped(path))
            }
            None => {
                create(&path, text)?;
                self.states.insert(path.clone(), TargetState::Created);
                self.summary.written.push(path.clone());
                self.summary.created += 1;
                log::info!("created {}", path.display());
                Ok(RouteOutcome::Created(path))
            }
        }
    }

    /// Current state of a path, `None` if the run has not touched it.
    pub fn state(&self, path: &Path) -> Option<TargetState> {
        self.states.get(path).copied()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub(crate) fn summary_mut(&mut self) -> &mut RunSummary {
        &mut self.summary
    }

    /// Ends the run, returning the summary and the stdout writer.
    pub fn finish(self) -> (RunSummary, W) {
        (self.summary, self.stdout)
    }
}

fn create(path: &Path, text: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    fs::write(path, text).map_err(|e| Error::io(path, e))
}

fn append(path: &Path, text: &str) -> Result<(), Error> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(dir: &Path, force: bool) -> OutputRouter<Vec<u8>> {
        OutputRouter::with_writer(TargetLayout::per_record(dir), force, Vec::new()).unwrap()
    }

    #[test]
    fn test_target_for() {
        let layout = TargetLayout::per_record("/out");
        assert_eq!(
            layout.target_for("r1").unwrap(),
            OutputTarget::File(PathBuf::from("/out/r1.txt"))
        );
        assert_eq!(
            layout.target_for("site/r1").unwrap(),
            OutputTarget::File(PathBuf::from("/out/site/r1.txt"))
        );
        assert_eq!(layout.target_for("  ").unwrap(), OutputTarget::Stdout);
        assert!(matches!(
            layout.target_for("../r1"),
            Err(Error::InvalidTarget { .. })
        ));
        assert!(matches!(
            layout.target_for("/etc/r1"),
            Err(Error::InvalidTarget { .. })
        ));

        let single = TargetLayout::SingleFile(PathBuf::from("/out/all.cfg"));
        assert_eq!(
            single.target_for("").unwrap(),
            OutputTarget::File(PathBuf::from("/out/all.cfg"))
        );
        assert_eq!(single.output_dir(), Path::new("/out"));
    }

    #[test]
    fn test_create_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = router(dir.path(), false);
        let path = dir.path().join("r1.txt");

        assert_eq!(router.route("r1", "one\n").unwrap(), RouteOutcome::Created(path.clone()));
        assert_eq!(router.route("r1", "two\n").unwrap(), RouteOutcome::Appended(path.clone()));
        assert_eq!(router.route("r1", "three\n").unwrap(), RouteOutcome::Appended(path.clone()));

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\nthree\n");
        assert_eq!(router.state(&path), Some(TargetState::Appended));

        let (summary, _) = router.finish();
        assert_eq!(summary.written, vec![path]);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.appended, 2);
    }

    #[test]
    fn test_existing_file_skipped_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r2.txt");
        fs::write(&path, "previous run\n").unwrap();

        let mut router = router(dir.path(), false);
        assert_eq!(router.route("r2", "new\n").unwrap(), RouteOutcome::Skipped(path.clone()));
        assert_eq!(router.route("r2", "newer\n").unwrap(), RouteOutcome::Skipped(path.clone()));

        assert_eq!(fs::read_to_string(&path).unwrap(), "previous run\n");
        assert_eq!(router.summary().skipped, vec![path]);
        assert!(router.summary().written.is_empty());
    }

    #[test]
    fn test_force_prunes_generated_files_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.txt"), "x").unwrap();
        fs::write(dir.path().join("old.cfg"), "x").unwrap();
        fs::write(dir.path().join("README.md"), "keep").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let mut router = router(dir.path(), true);
        assert_eq!(router.summary().pruned, 2);
        assert!(!dir.path().join("old.txt").exists());
        assert!(!dir.path().join("old.cfg").exists());
        assert!(dir.path().join("README.md").exists());
        assert!(dir.path().join("nested.txt").is_dir());

        assert!(matches!(router.route("old", "fresh\n").unwrap(), RouteOutcome::Created(_)));
        assert!(matches!(router.route("old", "more\n").unwrap(), RouteOutcome::Appended(_)));
        assert_eq!(
            fs::read_to_string(dir.path().join("old.txt")).unwrap(),
            "fresh\nmore\n"
        );
    }

    #[test]
    fn test_force_prunes_layout_extension() {
        let dir = tempfile::tempdir().unwrap();
        let layout = TargetLayout::PerRecord {
            dir: dir.path().to_path_buf(),
            extension: "conf".into(),
        };
        fs::write(dir.path().join("keep.conf"), "stale").unwrap();
        fs::write(dir.path().join("r1.conf"), "stale").unwrap();

        let mut router = OutputRouter::with_writer(layout, true, Vec::new()).unwrap();
        assert_eq!(router.summary().pruned, 2);
        router.route("r1", "fresh").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("r1.conf")).unwrap(), "fresh");
    }

    #[test]
    fn test_empty_name_goes_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = router(dir.path(), false);
        assert_eq!(router.route("", "to stdout\n").unwrap(), RouteOutcome::Stdout);

        let (summary, out) = router.finish();
        assert_eq!(String::from_utf8(out).unwrap(), "to stdout\n");
        assert_eq!(summary.stdout_writes, 1);
        assert!(summary.written.is_empty());
    }

    #[test]
    fn test_single_file_layout_composes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.cfg");
        let mut router =
            OutputRouter::with_writer(TargetLayout::SingleFile(path.clone()), false, Vec::new())
                .unwrap();

        router.route("r1", "a\n").unwrap();
        router.route("r2", "b\n").unwrap();
        router.route("", "c\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
        assert_eq!(router.summary().written, vec![path]);
    }

    #[test]
    fn test_subdirectories_created() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = router(&dir.path().join("out"), false);
        router.route("site-a/r1", "x").unwrap();
        assert!(dir.path().join("out/site-a/r1.txt").is_file());
    }
}
