//! Bundled asset access
//!
//! The engine reads two things from the application's bundled assets: the
//! template database copied on first run and the numbered scripts under
//! `migrations/`. Both go through `AssetSource` so the host decides where
//! assets live (a directory on disk, bytes compiled into the binary).

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// Directory, relative to the asset root, holding `<version>.sql` scripts
pub const MIGRATION_PATH: &str = "migrations";

/// Read-only view of the application's bundled assets
pub trait AssetSource {
    /// Open a named asset as a byte stream
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` when the asset does not exist or cannot be read.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>>;

    /// List the file names directly inside an asset directory
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` when the directory is missing or unreadable.
    fn list(&self, dir: &str) -> io::Result<Vec<String>>;
}

/// Assets stored in a directory on disk
#[derive(Debug, Clone)]
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    /// Create an asset source rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The asset root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsAssets {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        let file = File::open(self.root.join(name))?;
        Ok(Box::new(file))
    }

    fn list(&self, dir: &str) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

/// Assets held in memory, keyed by `/`-separated path
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder-style `insert`
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Builder-style helper placing a script under `migrations/`
    pub fn with_migration(self, file: &str, sql: &str) -> Self {
        self.with_file(format!("{}/{}", MIGRATION_PATH, file), sql)
    }
}

impl AssetSource for MemoryAssets {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        self.files
            .get(name)
            .map(|bytes| Box::new(Cursor::new(bytes.as_slice())) as Box<dyn Read + '_>)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("asset not found: {}", name))
            })
    }

    fn list(&self, dir: &str) -> io::Result<Vec<String>> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let mut found_dir = false;
        let mut names = Vec::new();

        for path in self.files.keys() {
            if let Some(rest) = path.strip_prefix(&prefix) {
                found_dir = true;
                if !rest.is_empty() && !rest.contains('/') {
                    names.push(rest.to_string());
                }
            }
        }

        if !found_dir {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("asset directory not found: {}", dir),
            ));
        }
        Ok(names)
    }
}
