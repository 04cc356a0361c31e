//! Where sweep artifacts live.
//!
//! A trial writes its theoretical curve, and the fit engine leaves a fit
//! curve and a log next to it. [`DirectoryWorkspace`] keeps them in
//! per-kind subdirectories of a run directory; [`MemoryWorkspace`] keeps
//! them in a map for engines that never touch the filesystem.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("Workspace state is poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    TheoreticalCurve,
    FitCurve,
    FitLog,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::TheoreticalCurve,
        ArtifactKind::FitCurve,
        ArtifactKind::FitLog,
    ];

    pub fn directory(self) -> &'static str {
        match self {
            ArtifactKind::TheoreticalCurve => "theoretical_int",
            ArtifactKind::FitCurve => "fits",
            ArtifactKind::FitLog => "logs",
        }
    }

    pub fn file_name(self, stem: &str) -> String {
        match self {
            ArtifactKind::TheoreticalCurve => format!("theoretical_{}.int", stem),
            ArtifactKind::FitCurve => format!("fit_{}.fit", stem),
            ArtifactKind::FitLog => format!("oligomer_{}.log", stem),
        }
    }
}

pub trait Workspace: Send + Sync {
    /// Location of the artifact of `kind` for the trial identified by `stem`.
    fn artifact_path(&self, kind: ArtifactKind, stem: &str) -> PathBuf;

    fn write_artifact(&self, path: &Path, contents: &str) -> Result<(), WorkspaceError>;

    fn read_artifact(&self, path: &Path) -> Result<String, WorkspaceError>;
}

#[derive(Debug, Clone)]
pub struct DirectoryWorkspace {
    root: PathBuf,
}

impl DirectoryWorkspace {
    /// Creates the run directory and its artifact subdirectories.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        for kind in ArtifactKind::ALL {
            let dir = root.join(kind.directory());
            fs::create_dir_all(&dir).map_err(|source| WorkspaceError::Io { path: dir, source })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Workspace for DirectoryWorkspace {
    fn artifact_path(&self, kind: ArtifactKind, stem: &str) -> PathBuf {
        self.root.join(kind.directory()).join(kind.file_name(stem))
    }

    fn write_artifact(&self, path: &Path, contents: &str) -> Result<(), WorkspaceError> {
        fs::write(path, contents).map_err(|source| WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_artifact(&self, path: &Path) -> Result<String, WorkspaceError> {
        fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => WorkspaceError::NotFound(path.to_path_buf()),
            _ => WorkspaceError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of every stored artifact, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Workspace for MemoryWorkspace {
    fn artifact_path(&self, kind: ArtifactKind, stem: &str) -> PathBuf {
        Path::new(kind.directory()).join(kind.file_name(stem))
    }

    fn write_artifact(&self, path: &Path, contents: &str) -> Result<(), WorkspaceError> {
        self.files
            .lock()
            .map_err(|_| WorkspaceError::Poisoned)?
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn read_artifact(&self, path: &Path) -> Result<String, WorkspaceError> {
        self.files
            .lock()
            .map_err(|_| WorkspaceError::Poisoned)?
            .get(path)
            .cloned()
            .ok_or_else(|| WorkspaceError::NotFound(path.to_path_buf()))
    }
}
