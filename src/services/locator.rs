//! Directive search over a set of configuration files.
//!
//! Scans files in the given order (typically the active file list) and
//! yields matches in file-then-line order. Matching happens on sanitized
//! text with case-insensitive patterns; commented-out directives are
//! excluded unless the caller asks for them, and lines inside `<IfModule>`
//! blocks whose condition does not hold are invisible, mirroring what the
//! running server would see.

use camino::Utf8Path;

use crate::error::Result;
use crate::models::{ConfigLine, DirectiveMatch, ModuleSet};
use crate::services::files::read_file;
use crate::services::lines::{directive_pattern, is_comment, sanitize_line, search_pattern};
use crate::services::resolver::ModuleGate;

/// Locates directive occurrences across configuration files.
pub struct DirectiveLocator {
    modules: ModuleSet,
}

impl DirectiveLocator {
    /// The module set decides `<IfModule>` visibility during scans; it is
    /// rebuilt per request by the caller, never cached here.
    pub fn new(modules: ModuleSet) -> Self {
        Self { modules }
    }

    /// Finds every occurrence of a directive across `files`.
    ///
    /// `name_pattern` matches the directive name case-insensitively and is
    /// rejected before any file is opened when malformed. With
    /// `include_comments` set, commented-out occurrences are reported too,
    /// flagged through [`DirectiveMatch::is_comment`].
    pub fn find<P: AsRef<Utf8Path>>(
        &self,
        files: &[P],
        name_pattern: &str,
        include_comments: bool,
    ) -> Result<Vec<DirectiveMatch>> {
        let pattern = directive_pattern(name_pattern)?;

        let mut matches = Vec::new();
        for file in files {
            for line in self.visible_lines(file.as_ref())? {
                let commented = is_comment(&line.sanitized);
                if commented && !include_comments {
                    continue;
                }
                if let Some(caps) = pattern.captures(&line.sanitized) {
                    matches.push(DirectiveMatch {
                        file: line.file.clone(),
                        line_number: line.line_number,
                        value: caps[1].trim().to_string(),
                        is_comment: commented,
                    });
                }
            }
        }

        tracing::trace!(
            "Found {} occurrence(s) of {:?} across {} file(s)",
            matches.len(),
            name_pattern,
            files.len()
        );
        Ok(matches)
    }

    /// First match wins: returns the first occurrence, skipping comments
    /// unless `include_comments` is set.
    pub fn find_first<P: AsRef<Utf8Path>>(
        &self,
        files: &[P],
        name_pattern: &str,
        include_comments: bool,
    ) -> Result<Option<DirectiveMatch>> {
        Ok(self
            .find(files, name_pattern, include_comments)?
            .into_iter()
            .next())
    }

    /// Directive-value getter: the first configured value, or the caller's
    /// default when the directive does not appear anywhere.
    pub fn value_or<P: AsRef<Utf8Path>>(
        &self,
        files: &[P],
        name_pattern: &str,
        default: &str,
    ) -> Result<String> {
        Ok(self
            .find_first(files, name_pattern, false)?
            .map(|m| m.value)
            .unwrap_or_else(|| default.to_string()))
    }

    /// Whether any non-comment line across `files` matches the pattern.
    pub fn search<P: AsRef<Utf8Path>>(&self, files: &[P], pattern: &str) -> Result<bool> {
        let pattern = search_pattern(pattern)?;

        for file in files {
            for line in self.visible_lines(file.as_ref())? {
                if is_comment(&line.sanitized) {
                    continue;
                }
                if pattern.is_match(&line.sanitized) {
                    tracing::trace!("Pattern found in {} line {}", line.file, line.line_number);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Reads one file into scan lines, dropping lines hidden by an
    /// unsatisfied `<IfModule>` block. Files that have disappeared since
    /// the active list was computed are skipped.
    fn visible_lines(&self, file: &Utf8Path) -> Result<Vec<ConfigLine>> {
        if !file.is_file() {
            tracing::debug!("Skipping vanished config file {}", file);
            return Ok(Vec::new());
        }

        let content = read_file(file)?;
        let mut gate = ModuleGate::new();
        let mut lines = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let sanitized = sanitize_line(raw);
            if sanitized.is_empty() {
                continue;
            }
            if !is_comment(&sanitized) && gate.observe(&sanitized, &self.modules) {
                continue;
            }
            if !gate.active() {
                continue;
            }
            lines.push(ConfigLine {
                file: file.to_path_buf(),
                line_number: index + 1,
                raw: raw.to_string(),
                sanitized,
            });
        }
        Ok(lines)
    }
}
