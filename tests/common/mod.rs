//! Shared utilities for integration tests.

pub mod harness;

use std::io::Write;
use std::path::Path;

use zip::ZipWriter;
use zip::write::FileOptions;

/// Writes a zip archive holding `entries` (name, bytes) to `path`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
#[allow(dead_code)]
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path)
        .unwrap_or_else(|e| panic!("Failed to create {}: {}", path.display(), e));
    let mut zip = ZipWriter::new(file);
    for (name, bytes) in entries {
        zip.start_file(*name, FileOptions::default())
            .expect("Failed to start zip entry");
        zip.write_all(bytes).expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish zip");
}
