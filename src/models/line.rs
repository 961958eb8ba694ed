//! Line-level value types produced by scans over the active file set.

use camino::Utf8PathBuf;
use serde::Serialize;

/// One line of a configuration file as seen during a scan. Ephemeral:
/// produced while walking a file, never stored across requests.
#[derive(Debug, Clone)]
pub struct ConfigLine {
    /// File the line came from, absolute path.
    pub file: Utf8PathBuf,
    /// 1-based line number.
    pub line_number: usize,
    /// The line exactly as it appears on disk.
    pub raw: String,
    /// Whitespace-collapsed form used for matching.
    pub sanitized: String,
}

/// A located directive occurrence.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DirectiveMatch {
    pub file: Utf8PathBuf,
    pub line_number: usize,
    /// The directive's textual value (everything after the name), trimmed.
    pub value: String,
    /// Whether the occurrence is on a commented-out line.
    pub is_comment: bool,
}

/// Which neighbouring line an inserted block inherits its indentation from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitespaceStyle {
    /// Inherit from the nearest non-blank line before the insertion point.
    Preceding,
    /// Inherit from the nearest non-blank line at or after the insertion
    /// point (falling back to earlier lines when the rest are blank).
    Following,
}
