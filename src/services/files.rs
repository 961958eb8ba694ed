//! UTF-8 file access helpers used by every mutating component.
//!
//! All rewrites are whole-file: the new content is assembled in memory and
//! lands on disk through a temp-file-plus-rename step, so a reader never
//! observes a half-written configuration file. Files are always written with
//! the fixed [`LINE_SEPARATOR`] regardless of host platform to keep managed
//! trees diff-stable; reads tolerate `\r\n` input.

use std::fs;
use std::io::Write;

use camino::Utf8Path;
use tempfile::NamedTempFile;

use crate::error::{EngineError, Result};

/// Line terminator written by the engine. Fixed, not the host's native
/// terminator, so rewrites are byte-stable across platforms.
pub const LINE_SEPARATOR: &str = "\n";

/// Reads a configuration file as UTF-8 text.
pub fn read_file(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| EngineError::access(path, source))
}

/// Joins lines with the engine line terminator, terminating the final line.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push_str(LINE_SEPARATOR);
    }
    out
}

/// Rewrites a file atomically: content goes to a temp file in the same
/// directory, which is then renamed over the target. The target's existing
/// permissions are carried over to the replacement.
pub fn write_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| EngineError::access(path, std::io::Error::other("path has no parent")))?;

    let mut temp =
        NamedTempFile::new_in(parent).map_err(|source| EngineError::access(path, source))?;
    temp.write_all(content.as_bytes())
        .map_err(|source| EngineError::access(path, source))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(|source| EngineError::access(path, source))?;
    }

    temp.persist(path)
        .map_err(|err| EngineError::access(path, err.error))?;

    tracing::trace!("Rewrote {} ({} bytes)", path, content.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn temp_conf(dir: &TempDir, name: &str, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn read_missing_file_is_access_error() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nope.conf")).unwrap();
        assert!(matches!(
            read_file(&path),
            Err(EngineError::Access { .. })
        ));
    }

    #[test]
    fn atomic_rewrite_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = temp_conf(&dir, "httpd.conf", "Listen 80\n");

        write_atomic(&path, "Listen 8080\n").unwrap();
        assert_eq!(read_file(&path).unwrap(), "Listen 8080\n");
    }

    #[test]
    fn join_lines_uses_engine_terminator() {
        assert_eq!(join_lines(&["a", "b"]), "a\nb\n");
        assert_eq!(join_lines::<&str>(&[]), "");
    }
}
