//! A directory of amplitude checkpoints shared between correlated runs.

use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

/// The amplitude checkpoint name the correlated solver reads and writes in
/// its working directory.
pub const AMPS_FILE: &str = "forte.amps";

#[derive(Debug, PartialEq, Eq)]
pub enum StoreError {
    Io(PathBuf, std::io::ErrorKind),
    /// a harvest found no checkpoint where the run should have written one
    NoAmps(PathBuf),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(path, kind) => {
                write!(f, "{}: {kind}", path.display())
            }
            StoreError::NoAmps(path) => {
                write!(f, "no amplitude checkpoint at {}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// A store of amplitude checkpoints keyed by job name, backed by a directory
/// of `.amps` files. Staging copies a stored checkpoint into a working
/// directory under [AMPS_FILE] for the solver to pick up; harvesting copies
/// the checkpoint a run produced back into the store.
#[derive(Clone, Debug, PartialEq)]
pub struct AmpStore {
    dir: PathBuf,
}

impl AmpStore {
    /// Open the store at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Io(dir.clone(), e.kind()))?;
        Ok(Self { dir })
    }

    /// the file backing `key`, whether or not it exists yet
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(sanitize(key)).with_extension("amps")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path(key).exists()
    }

    /// Copy the checkpoint stored under `key` into `workdir` as [AMPS_FILE].
    /// Returns `Ok(false)` without touching anything when the store has no
    /// entry for `key`.
    pub fn stage(&self, key: &str, workdir: &Path) -> Result<bool, StoreError> {
        let src = self.path(key);
        if !src.exists() {
            return Ok(false);
        }
        let dst = workdir.join(AMPS_FILE);
        fs::copy(&src, &dst)
            .map_err(|e| StoreError::Io(dst.clone(), e.kind()))?;
        log::info!("staged amplitudes for {key} into {}", dst.display());
        Ok(true)
    }

    /// Copy the checkpoint a run left in `workdir` into the store under
    /// `key`, replacing any previous entry.
    pub fn harvest(
        &self,
        key: &str,
        workdir: &Path,
    ) -> Result<(), StoreError> {
        let src = workdir.join(AMPS_FILE);
        if !src.exists() {
            return Err(StoreError::NoAmps(src));
        }
        let dst = self.path(key);
        fs::copy(&src, &dst)
            .map_err(|e| StoreError::Io(dst.clone(), e.kind()))?;
        log::info!("harvested amplitudes for {key} into {}", dst.display());
        Ok(())
    }
}

/// keep keys usable as plain file names
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
