/// Shared filesystem helpers.
pub mod fs {
    use std::fs;
    use std::io;
    use std::path::Path;

    /// Ensure a directory exists, creating it recursively if needed.
    /// Returns `true` when the directory was created by this call.
    pub fn ensure_dir(path: &Path) -> io::Result<bool> {
        if path.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(path)?;
        Ok(true)
    }

    /// Whether `path` is a directory with at least one entry.
    pub fn has_entries(path: &Path) -> io::Result<bool> {
        Ok(fs::read_dir(path)?.next().is_some())
    }
}
