//! Checksums for migration scripts
//!
//! Computes SHA256 checksums of script content so every applied script can
//! be identified in the logs.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Incremental checksum over the lines of a streamed script
///
/// Lines are hashed with a trailing `\n`, so a script hashed line by line
/// matches `compute_checksum` of the same text ending in a newline.
#[derive(Default)]
pub struct LineChecksum {
    hasher: Sha256,
}

impl LineChecksum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_line(&mut self, line: &str) {
        self.hasher.update(line.as_bytes());
        self.hasher.update(b"\n");
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum("SELECT 1");
        assert_eq!(checksum.len(), 64); // SHA256 is 64 hex chars
    }

    #[test]
    fn test_checksum_deterministic() {
        assert_eq!(compute_checksum("SELECT 1"), compute_checksum("SELECT 1"));
    }

    #[test]
    fn test_line_checksum_matches_whole_text() {
        let mut lines = LineChecksum::new();
        lines.update_line("CREATE TABLE a (id INTEGER)");
        lines.update_line("CREATE TABLE b (id INTEGER)");

        assert_eq!(
            lines.finish(),
            compute_checksum("CREATE TABLE a (id INTEGER)\nCREATE TABLE b (id INTEGER)\n")
        );
    }
}
