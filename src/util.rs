//! Shared filesystem helpers.

use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy a single file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(src, dest)?;
    Ok(())
}

/// Recursively copy the files under `src` into `dest`, keeping relative paths.
///
/// Returns the number of files copied.
pub fn copy_dir(src: &Path, dest: &Path) -> io::Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel_path = entry.path().strip_prefix(src).unwrap_or(entry.path());
        copy_file(entry.path(), &dest.join(rel_path))?;
        copied += 1;
    }
    Ok(copied)
}
