//! Line classification primitives shared by every scanner in the engine.
//!
//! These are pure functions over text. Matching happens on *sanitized* lines
//! (leading/trailing whitespace trimmed, interior runs collapsed to a single
//! space) so that callers' directive patterns never have to care about
//! indentation or alignment. Comment detection is deliberately simple: a line
//! is a comment iff its first non-whitespace character is `#`. The matching
//! dialect is the `regex` crate's; callers never compile patterns themselves,
//! they go through [`directive_pattern`] so malformed input is rejected
//! before any file I/O.

use regex::Regex;

use crate::error::{EngineError, Result};

/// Collapses a raw config line into its canonical matching form: trimmed,
/// with every interior whitespace run reduced to one space.
pub fn sanitize_line(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True iff the line is a comment: after leading-whitespace trim it begins
/// with the `#` marker.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Returns the leading whitespace of a raw line, used to keep inserted lines
/// aligned with their neighbours.
pub fn leading_whitespace(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    &raw[..raw.len() - trimmed.len()]
}

/// Compiles a case-insensitive matcher for `name value` directive lines as
/// they appear after sanitization. An optional leading `# ` is tolerated so
/// commented-out directives can still be located when a caller asks for
/// comments; the comment flag itself comes from [`is_comment`].
///
/// The capture group holds the directive value (everything after the name).
pub fn directive_pattern(name: &str) -> Result<Regex> {
    let pattern = format!(r"(?i)^(?:#\s*)?{}\s+(.+)$", name);
    Regex::new(&pattern).map_err(|source| EngineError::Pattern {
        pattern: name.to_string(),
        source,
    })
}

/// Compiles a free-form search pattern applied to sanitized lines with
/// case-insensitive matching, rejecting malformed input before any file is
/// opened.
pub fn search_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){}", pattern)).map_err(|source| EngineError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Compiles a pattern that must match a raw line in its entirety, used for
/// surgical removal of previously written lines.
pub fn full_line_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| EngineError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
