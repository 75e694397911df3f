// src/artifact.rs

//! Artifact handles.
//!
//! An [`Artifact`] is an immutable reference to a file a task produced.
//! It is captured by the executor once the producing process has exited,
//! and from then on is only ever read. The blake3 checksum lets fan-out
//! consumers verify they are looking at the same underlying data.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Immutable handle to a task-produced file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    checksum: String,
}

impl Artifact {
    /// Construct an artifact from known parts.
    ///
    /// Production code uses [`Artifact::capture`]; this is for fake
    /// executors in tests.
    pub fn new(path: PathBuf, checksum: String) -> Self {
        Self { path, checksum }
    }

    /// Capture a produced file as an artifact, computing its content
    /// checksum. Fails if the file cannot be read.
    pub fn capture(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).with_context(|| format!("opening output file {:?}", path))?;

        let mut hasher = blake3::Hasher::new();
        io::copy(&mut file, &mut hasher)
            .with_context(|| format!("hashing output file {:?}", path))?;

        Ok(Self {
            path: path.to_path_buf(),
            checksum: hasher.finalize().to_hex().to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Path as a string for command-template binding.
    pub fn path_string(&self) -> String {
        self.path.display().to_string()
    }
}
