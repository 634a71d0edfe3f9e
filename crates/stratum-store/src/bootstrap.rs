//! Bootstrap copier
//!
//! Seeds a missing database file from a template shipped with the
//! application. The copy streams into a sibling temp file which is renamed
//! into place once complete, so an interrupted copy never leaves a
//! half-written database at the target path.

use crate::assets::AssetSource;
use crate::errors::{io_error, Result};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use stratum_core::errors::{ExError, StratumError};
use stratum_core::{log_op_end, log_op_error, log_op_start};
use stratum_core_types::schema::OP_BOOTSTRAP;
use tracing::debug;

/// Size of each chunk streamed from the template into the database file
pub const COPY_CHUNK_SIZE: usize = 1024;

/// What the bootstrap step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The database file already existed; nothing was touched
    AlreadyPresent,
    /// The template was copied
    Copied { bytes: u64 },
    /// The copy failed and was logged; the caller continues without a template
    Failed,
}

/// Copy the bundled template `asset_name` to `target` unless `target` exists
///
/// Never fails: a missing template or an I/O error is logged at error level
/// and reported as `BootstrapOutcome::Failed`, leaving normal schema creation
/// to build the database from scratch.
pub fn copy_bundled_database(
    target: &Path,
    assets: &dyn AssetSource,
    asset_name: &str,
) -> BootstrapOutcome {
    if target.exists() {
        debug!(path = %target.display(), "Database already present, skipping template copy");
        return BootstrapOutcome::AlreadyPresent;
    }

    let start = Instant::now();
    log_op_start!(OP_BOOTSTRAP, asset = asset_name);

    match copy_template(target, assets, asset_name) {
        Ok(bytes) => {
            log_op_end!(
                OP_BOOTSTRAP,
                duration_ms = start.elapsed().as_millis() as u64,
                bytes = bytes
            );
            BootstrapOutcome::Copied { bytes }
        }
        Err(err) => {
            log_op_error!(
                OP_BOOTSTRAP,
                err,
                duration_ms = start.elapsed().as_millis() as u64,
                asset = asset_name
            );
            BootstrapOutcome::Failed
        }
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

fn copy_template(target: &Path, assets: &dyn AssetSource, asset_name: &str) -> Result<u64> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_database_dir", e))?;
    }

    // Open the template first so a missing asset never creates an empty file
    let mut input = assets.open(asset_name).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ExError::from(StratumError::AssetNotFound {
            name: asset_name.to_string(),
        }),
        _ => io_error("open_template", e),
    })?;

    let temp = temp_path(target);
    let copied = stream_copy(&mut input, &temp);
    let bytes = match copied {
        Ok(bytes) => bytes,
        Err(err) => {
            fs::remove_file(&temp).ok();
            return Err(err);
        }
    };

    fs::rename(&temp, target).map_err(|e| {
        fs::remove_file(&temp).ok();
        io_error("rename_template", e)
    })?;

    Ok(bytes)
}

fn stream_copy(input: &mut dyn Read, temp: &Path) -> Result<u64> {
    let mut output = File::create(temp).map_err(|e| io_error("create_database_file", e))?;
    let mut buffer = [0u8; COPY_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let length = input
            .read(&mut buffer)
            .map_err(|e| io_error("read_template", e))?;
        if length == 0 {
            break;
        }
        output
            .write_all(&buffer[..length])
            .map_err(|e| io_error("write_database_file", e))?;
        total += length as u64;
    }

    output.flush().map_err(|e| io_error("flush_database_file", e))?;
    output
        .sync_all()
        .map_err(|e| io_error("sync_database_file", e))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use stratum_core::errors::ExErrorKind;
    use tempfile::TempDir;

    /// Asset source whose template fails halfway through the stream
    struct BrokenAssets;

    struct BrokenReader {
        served: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "device unplugged"));
            }
            self.served = true;
            buf[0] = 42;
            Ok(1)
        }
    }

    impl AssetSource for BrokenAssets {
        fn open(&self, _name: &str) -> io::Result<Box<dyn Read + '_>> {
            Ok(Box::new(BrokenReader { served: false }))
        }

        fn list(&self, _dir: &str) -> io::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_copies_template_larger_than_chunk() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("app.db");
        let template: Vec<u8> = (0..(COPY_CHUNK_SIZE * 3 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        let assets = MemoryAssets::new().with_file("app.db", template.clone());

        let outcome = copy_bundled_database(&target, &assets, "app.db");

        assert_eq!(
            outcome,
            BootstrapOutcome::Copied {
                bytes: template.len() as u64
            }
        );
        assert_eq!(fs::read(&target).unwrap(), template);
        assert!(!temp_path(&target).exists());
    }

    #[test]
    fn test_existing_file_untouched() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("app.db");
        fs::write(&target, b"local data").unwrap();
        let assets = MemoryAssets::new().with_file("app.db", b"template".to_vec());

        let outcome = copy_bundled_database(&target, &assets, "app.db");

        assert_eq!(outcome, BootstrapOutcome::AlreadyPresent);
        assert_eq!(fs::read(&target).unwrap(), b"local data");
    }

    #[test]
    fn test_missing_template_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("app.db");

        let outcome = copy_bundled_database(&target, &MemoryAssets::new(), "app.db");

        assert_eq!(outcome, BootstrapOutcome::Failed);
        assert!(!target.exists());
    }

    #[test]
    fn test_missing_template_reports_asset_name() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("app.db");

        let err = copy_template(&target, &MemoryAssets::new(), "seed.db").unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.file(), Some("seed.db"));
        assert!(!temp_path(&target).exists());
    }

    #[test]
    fn test_failed_stream_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("app.db");

        let outcome = copy_bundled_database(&target, &BrokenAssets, "app.db");

        assert_eq!(outcome, BootstrapOutcome::Failed);
        assert!(!target.exists());
        assert!(!temp_path(&target).exists());
    }
}
