//! Durable file writes.
//!
//! Creating or renaming a file updates its directory entry, and that entry
//! can be lost on power failure unless the directory itself is synced. Every
//! mutation of the queue directory therefore ends with [`fsync_dir`].

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Syncs a directory so entries created, renamed or removed in it survive a crash.
///
/// # Errors
///
/// Returns an error if the directory cannot be opened or synced.
pub fn fsync_dir(dir: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(dir)?.sync_all()
}

/// Writes `contents` to `dir/final_name` so readers never see a partial file.
///
/// 1. Write to `dir/temp_name` (must not exist yet)
/// 2. fsync the temp file
/// 3. Rename over `final_name`
/// 4. fsync the directory
///
/// Once the temp file has been created, a later failure removes it on a
/// best-effort basis.
pub fn write_atomically(
    dir: &Path,
    temp_name: &str,
    final_name: &str,
    contents: &[u8],
) -> io::Result<PathBuf> {
    let temp_path = dir.join(temp_name);
    let final_path = dir.join(final_name);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;

    let result = (|| {
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &final_path)?;
        fsync_dir(dir)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result.map(|()| final_path)
}
