//! File-scoped line mutation primitives.
//!
//! Each primitive reads the target once, assembles the new content in
//! memory, and performs a single atomic rewrite. Every primitive returns the
//! pre-mutation file content verbatim; that string is the sole rollback
//! source for [`MutationTransaction`](crate::services::transaction::MutationTransaction).
//! `delete_matching` is a guaranteed no-op on disk when nothing matched.
//!
//! Inserted and replacement lines inherit the leading whitespace of a
//! neighbouring line so mutations blend into the file's existing formatting.

use camino::Utf8Path;
use regex::Regex;

use crate::error::Result;
use crate::models::WhitespaceStyle;
use crate::services::files::{LINE_SEPARATOR, join_lines, read_file, write_atomic};
use crate::services::lines::{is_comment, leading_whitespace, sanitize_line};

/// Inserts `lines` immediately before the 1-based `at_line`, each prefixed
/// with the leading whitespace of the nearest non-blank neighbour chosen by
/// `style`. Returns the pre-mutation content.
///
/// When `at_line` is beyond the end of the file nothing is inserted; use
/// [`append_line`] to extend a file.
pub fn insert_lines<S: AsRef<str>>(
    file: &Utf8Path,
    lines: &[S],
    at_line: usize,
    style: WhitespaceStyle,
) -> Result<String> {
    let original = read_file(file)?;

    let mut out: Vec<String> = Vec::new();
    let mut whitespace = String::new();
    for (index, raw) in original.lines().enumerate() {
        if style == WhitespaceStyle::Following && !raw.trim().is_empty() {
            whitespace = leading_whitespace(raw).to_string();
        }

        if index + 1 == at_line {
            for line in lines {
                out.push(format!("{whitespace}{}", line.as_ref()));
            }
        }

        out.push(raw.to_string());

        if style == WhitespaceStyle::Preceding && !raw.trim().is_empty() {
            whitespace = leading_whitespace(raw).to_string();
        }
    }

    write_atomic(file, &join_lines(&out))?;
    Ok(original)
}

/// Replaces lines `[start_line, end_line]` (1-based, inclusive) with
/// `lines`, each inheriting the leading whitespace of the line originally at
/// `start_line`. Returns the pre-mutation content.
pub fn replace_range<S: AsRef<str>>(
    file: &Utf8Path,
    lines: &[S],
    start_line: usize,
    end_line: usize,
) -> Result<String> {
    let original = read_file(file)?;

    let mut out: Vec<String> = Vec::new();
    for (index, raw) in original.lines().enumerate() {
        let line_number = index + 1;

        if line_number == start_line {
            let whitespace = leading_whitespace(raw);
            for line in lines {
                out.push(format!("{whitespace}{}", line.as_ref()));
            }
        }

        if line_number < start_line || line_number > end_line {
            out.push(raw.to_string());
        }
    }

    write_atomic(file, &join_lines(&out))?;
    Ok(original)
}

/// Removes every line within `[start_line, end_line]` whose sanitized text
/// matches `pattern`, honoring the comment-inclusion rule. Returns the
/// pre-mutation content and whether anything was removed; when nothing
/// matched the file is left byte-identical (no rewrite is performed).
pub fn delete_matching(
    file: &Utf8Path,
    pattern: &Regex,
    start_line: usize,
    end_line: usize,
    include_comments: bool,
) -> Result<(String, bool)> {
    let original = read_file(file)?;

    let mut found = false;
    let mut out: Vec<String> = Vec::new();
    for (index, raw) in original.lines().enumerate() {
        let line_number = index + 1;
        let sanitized = sanitize_line(raw);

        let in_window = line_number >= start_line && line_number <= end_line;
        let comment_ok = include_comments || !is_comment(&sanitized);
        if in_window && comment_ok && pattern.is_match(&sanitized) {
            tracing::trace!("Deleting {} line {}", file, line_number);
            found = true;
        } else {
            out.push(raw.to_string());
        }
    }

    if found {
        write_atomic(file, &join_lines(&out))?;
    }
    Ok((original, found))
}

/// Appends a newline followed by `text` to the end of the file. Returns the
/// pre-mutation content.
pub fn append_line(file: &Utf8Path, text: &str) -> Result<String> {
    let original = read_file(file)?;
    let appended = format!("{original}{LINE_SEPARATOR}{text}");
    write_atomic(file, &appended)?;
    Ok(original)
}

/// Removes every raw line that matches `pattern` in its entirety, comments
/// included. The file is always rewritten. Returns the pre-mutation content.
pub fn remove_full_line_matches(file: &Utf8Path, pattern: &Regex) -> Result<String> {
    let original = read_file(file)?;

    let mut out: Vec<String> = Vec::new();
    for raw in original.lines() {
        if full_match(pattern, raw) {
            tracing::trace!("Removing full-line match from {}", file);
        } else {
            out.push(raw.to_string());
        }
    }

    write_atomic(file, &join_lines(&out))?;
    Ok(original)
}

fn full_match(pattern: &Regex, line: &str) -> bool {
    pattern
        .find(line)
        .is_some_and(|m| m.start() == 0 && m.end() == line.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn read(path: &Utf8Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn insert_inherits_preceding_whitespace() {
        let dir = TempDir::new().unwrap();
        let conf = write(&dir, "a.conf", "<VirtualHost *:80>\n    ServerName a\n</VirtualHost>\n");

        let original =
            insert_lines(&conf, &["ServerAlias b"], 3, WhitespaceStyle::Preceding).unwrap();

        assert_eq!(
            read(&conf),
            "<VirtualHost *:80>\n    ServerName a\n    ServerAlias b\n</VirtualHost>\n"
        );
        assert_eq!(
            original,
            "<VirtualHost *:80>\n    ServerName a\n</VirtualHost>\n"
        );
    }

    #[test]
    fn insert_inherits_following_whitespace() {
        let dir = TempDir::new().unwrap();
        let conf = write(&dir, "a.conf", "Listen 80\n    KeepAlive On\n");

        insert_lines(&conf, &["KeepAliveTimeout 5"], 2, WhitespaceStyle::Following).unwrap();

        assert_eq!(
            read(&conf),
            "Listen 80\n    KeepAliveTimeout 5\n    KeepAlive On\n"
        );
    }

    #[test]
    fn replace_range_inherits_start_line_whitespace() {
        let dir = TempDir::new().unwrap();
        let conf = write(&dir, "a.conf", "Listen 80\n  KeepAlive Off\n  KeepAliveTimeout 15\nServerName a\n");

        let original = replace_range(&conf, &["KeepAlive On"], 2, 3).unwrap();

        assert_eq!(read(&conf), "Listen 80\n  KeepAlive On\nServerName a\n");
        assert!(original.contains("KeepAliveTimeout 15"));
    }

    #[test]
    fn delete_matching_outside_window_is_kept() {
        let dir = TempDir::new().unwrap();
        let conf = write(&dir, "a.conf", "Listen 80\nListen 8080\nListen 443\n");

        let pattern = Regex::new("(?i)^Listen").unwrap();
        let (_, found) = delete_matching(&conf, &pattern, 2, 2, false).unwrap();

        assert!(found);
        assert_eq!(read(&conf), "Listen 80\nListen 443\n");
    }

    #[test]
    fn delete_matching_never_removes_comments_unless_asked() {
        let dir = TempDir::new().unwrap();
        let conf = write(&dir, "a.conf", "# Listen 80\nListen 80\n");

        let pattern = Regex::new("(?i)^Listen").unwrap();
        delete_matching(&conf, &pattern, 1, usize::MAX, false).unwrap();
        assert_eq!(read(&conf), "# Listen 80\n");

        let commented = Regex::new("(?i)Listen").unwrap();
        delete_matching(&conf, &commented, 1, usize::MAX, true).unwrap();
        assert_eq!(read(&conf), "");
    }

    #[test]
    fn delete_matching_without_match_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let content = "Listen 80\r\nKeepAlive On";
        let conf = write(&dir, "a.conf", content);

        let pattern = Regex::new("^ServerName").unwrap();
        let (original, found) = delete_matching(&conf, &pattern, 1, usize::MAX, false).unwrap();

        assert!(!found);
        assert_eq!(original, content);
        // Byte-identical: the rewrite (which would normalize \r\n) never ran.
        assert_eq!(read(&conf), content);
    }

    #[test]
    fn snapshot_round_trip_restores_bytes() {
        let dir = TempDir::new().unwrap();
        let content = "Listen 80\n\tKeepAlive On\n";
        let conf = write(&dir, "a.conf", content);

        let snapshot = replace_range(&conf, &["Listen 8080"], 1, 1).unwrap();
        assert_ne!(read(&conf), content);

        write_atomic(&conf, &snapshot).unwrap();
        assert_eq!(read(&conf), content);
    }

    #[test]
    fn append_line_writes_newline_then_text() {
        let dir = TempDir::new().unwrap();
        let conf = write(&dir, "a.conf", "Listen 80");

        append_line(&conf, "Include extra.conf").unwrap();
        assert_eq!(read(&conf), "Listen 80\nInclude extra.conf");
    }

    #[test]
    fn full_line_removal_requires_whole_line_match() {
        let dir = TempDir::new().unwrap();
        let conf = write(&dir, "a.conf", "Listen 80\nListen 8080\n");

        let pattern = Regex::new("Listen 80").unwrap();
        remove_full_line_matches(&conf, &pattern).unwrap();

        // "Listen 8080" contains the pattern but is not a full-line match.
        assert_eq!(read(&conf), "Listen 8080\n");
    }
}
