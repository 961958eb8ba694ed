//! Active configuration file resolution.
//!
//! Starting from the root config file, follows `Include` and
//! `IncludeOptional` directives the way httpd does: arguments resolve
//! against the server root when relative, wildcard arguments expand through
//! the filesystem, directory arguments load every file under them, and
//! anything inside an `<IfModule>` block only counts when the named module's
//! presence matches the block's polarity. The result is the ordered,
//! de-duplicated list of files the server would actually load.
//!
//! The resolver is re-run whenever the active set is needed; it is never
//! cached, since any mutation can change which files are active.

use std::collections::VecDeque;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use regex::Regex;

use crate::error::{EngineError, Result};
use crate::models::ModuleSet;
use crate::services::files::read_file;
use crate::services::lines::{is_comment, sanitize_line};

/// Tracks nesting of `<IfModule>` blocks while scanning one file.
///
/// Each frame records whether its block condition holds; a line is visible
/// only when every enclosing frame holds (nested blocks compose by logical
/// AND). Blocks never span files, so scanners start a fresh gate per file.
pub struct ModuleGate {
    open: Regex,
    close: Regex,
    stack: Vec<bool>,
}

impl ModuleGate {
    pub fn new() -> Self {
        Self {
            open: Regex::new(r#"(?i)^<\s*IfModule\s+(!)?\s*"?([^">\s]+)"?\s*>"#)
                .expect("Invalid IfModule open regex"),
            close: Regex::new(r"(?i)^</\s*IfModule\s*>").expect("Invalid IfModule close regex"),
            stack: Vec::new(),
        }
    }

    /// Feeds one sanitized, non-comment line to the gate. Returns `true`
    /// when the line was an `<IfModule>` boundary and carries no directive
    /// of its own.
    pub fn observe(&mut self, sanitized: &str, modules: &ModuleSet) -> bool {
        if let Some(caps) = self.open.captures(sanitized) {
            let negated = caps.get(1).is_some();
            let name = &caps[2];
            let holds = modules.contains(name) != negated;
            self.stack.push(holds);
            return true;
        }
        if self.close.is_match(sanitized) {
            self.stack.pop();
            return true;
        }
        false
    }

    /// Whether lines at the current nesting depth are in effect.
    pub fn active(&self) -> bool {
        self.stack.iter().all(|holds| *holds)
    }
}

impl Default for ModuleGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the ordered active file list for a configuration tree.
pub struct IncludeResolver {
    include: Regex,
}

impl IncludeResolver {
    pub fn new() -> Self {
        Self {
            include: Regex::new(r"(?i)^Include(Optional)?\s+(.+)$")
                .expect("Invalid include regex"),
        }
    }

    /// Walks the tree from `root_file` and returns every file httpd would
    /// load, in load order, duplicates removed.
    ///
    /// A missing target of a plain `Include` (including a wildcard with zero
    /// matches) is a hard error; `IncludeOptional` tolerates it.
    pub fn resolve(
        &self,
        root_file: &Utf8Path,
        server_root: &Utf8Path,
        modules: &ModuleSet,
    ) -> Result<Vec<Utf8PathBuf>> {
        let root = root_file
            .canonicalize_utf8()
            .map_err(|source| EngineError::access(root_file, source))?;

        let mut active: IndexSet<Utf8PathBuf> = IndexSet::new();
        let mut queue: VecDeque<Utf8PathBuf> = VecDeque::new();
        active.insert(root.clone());
        queue.push_back(root);

        while let Some(file) = queue.pop_front() {
            tracing::trace!("Resolving includes in {}", file);
            let content = read_file(&file)?;
            let mut gate = ModuleGate::new();

            for raw in content.lines() {
                let sanitized = sanitize_line(raw);
                if sanitized.is_empty() || is_comment(&sanitized) {
                    continue;
                }
                if gate.observe(&sanitized, modules) || !gate.active() {
                    continue;
                }

                let Some(caps) = self.include.captures(&sanitized) else {
                    continue;
                };
                let optional = caps.get(1).is_some();
                let target = unquote(caps[2].trim());

                for resolved in self.expand_target(target, server_root, optional)? {
                    let resolved = resolved
                        .canonicalize_utf8()
                        .map_err(|source| EngineError::access(&resolved, source))?;
                    if active.insert(resolved.clone()) {
                        queue.push_back(resolved);
                    }
                }
            }
        }

        Ok(active.into_iter().collect())
    }

    /// Expands one include argument into concrete existing files: wildcard
    /// patterns through the filesystem (alphabetical order), directories
    /// recursively, plain paths as-is.
    fn expand_target(
        &self,
        target: &str,
        server_root: &Utf8Path,
        optional: bool,
    ) -> Result<Vec<Utf8PathBuf>> {
        let path = Utf8Path::new(target);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            server_root.join(path)
        };

        if has_glob_meta(absolute.as_str()) {
            let matches = self.expand_glob(&absolute)?;
            if matches.is_empty() && !optional {
                return Err(EngineError::MissingInclude(absolute));
            }
            return Ok(matches);
        }

        if absolute.is_dir() {
            let mut files = Vec::new();
            collect_dir_files(&absolute, &mut files)?;
            return Ok(files);
        }

        if absolute.is_file() {
            return Ok(vec![absolute]);
        }

        if optional {
            tracing::debug!("Skipping missing optional include {}", absolute);
            Ok(Vec::new())
        } else {
            Err(EngineError::MissingInclude(absolute))
        }
    }

    fn expand_glob(&self, pattern: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        let entries = match glob::glob(pattern.as_str()) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("Unreadable include pattern {}: {}", pattern, err);
                return Ok(Vec::new());
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    let path = Utf8PathBuf::from_path_buf(path)
                        .map_err(|p| EngineError::MissingInclude(p.display().to_string().into()))?;
                    if path.is_dir() {
                        collect_dir_files(&path, &mut files)?;
                    } else {
                        files.push(path);
                    }
                }
                Err(err) => {
                    tracing::warn!("Skipping unreadable glob match: {}", err);
                }
            }
        }
        Ok(files)
    }
}

impl Default for IncludeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively collects files under a directory in sorted name order, the
/// order httpd uses for directory includes.
fn collect_dir_files(dir: &Utf8Path, out: &mut Vec<Utf8PathBuf>) -> Result<()> {
    let mut entries: Vec<Utf8PathBuf> = Vec::new();
    let read = fs::read_dir(dir).map_err(|source| EngineError::access(dir, source))?;
    for entry in read {
        let entry = entry.map_err(|source| EngineError::access(dir, source))?;
        if let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) {
            entries.push(path);
        }
    }
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_dir_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn has_glob_meta(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 && (s.starts_with('"') && s.ends_with('"')) {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
