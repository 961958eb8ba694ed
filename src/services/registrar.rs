//! Registration of the tool-owned configuration file into the root tree.
//!
//! The engine keeps its own directives in a dedicated file inside the
//! configuration directory rather than editing server-owned files for every
//! change. This module makes sure that file exists and is transitively
//! included by the root config file exactly once. Detection of prior
//! registration goes solely through active-file-list membership; the marker
//! comment written next to the injected `Include` is a human-readable
//! annotation, nothing reads it back.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::{EngineError, Result};
use crate::models::ModuleSet;
use crate::services::lines::full_line_pattern;
use crate::services::mutator;
use crate::services::resolver::IncludeResolver;
use crate::services::transaction::MutationTransaction;
use crate::services::validator::SyntaxValidator;

/// Name of the tool-owned config file inside the configuration directory.
pub const GUI_CONF_FILE: &str = "httpdconf.conf";

/// Annotation written immediately before the injected `Include` line.
pub const MARKER_COMMENT: &str =
    "# The following Include loads the httpdconf managed configuration file.";

/// Ensures the tool-owned file exists and is loaded by the root tree.
pub struct GuiFileRegistrar<'a> {
    resolver: IncludeResolver,
    validator: &'a dyn SyntaxValidator,
}

impl<'a> GuiFileRegistrar<'a> {
    pub fn new(validator: &'a dyn SyntaxValidator) -> Self {
        Self {
            resolver: IncludeResolver::new(),
            validator,
        }
    }

    /// Absolute path of the tool-owned file for a configuration directory.
    pub fn gui_file_path(conf_directory: &Utf8Path) -> Utf8PathBuf {
        conf_directory.join(GUI_CONF_FILE)
    }

    /// Creates the tool-owned file when absent and guarantees the root file
    /// transitively includes it. Idempotent: when the file is already in the
    /// active list nothing is modified beyond the existence check.
    ///
    /// Returns the canonical path of the tool-owned file.
    pub async fn ensure_registered(
        &self,
        root_file: &Utf8Path,
        server_root: &Utf8Path,
        conf_directory: &Utf8Path,
        modules: &ModuleSet,
    ) -> Result<Utf8PathBuf> {
        let gui_file = Self::gui_file_path(conf_directory);
        if !gui_file.exists() {
            create_with_permissions(&gui_file)?;
            tracing::info!("Created managed config file {}", gui_file);
        }
        let gui_file = gui_file
            .canonicalize_utf8()
            .map_err(|source| EngineError::access(&gui_file, source))?;

        let active = self.resolver.resolve(root_file, server_root, modules)?;
        if active.contains(&gui_file) {
            tracing::debug!("Managed config file already included, nothing to do");
            return Ok(gui_file);
        }

        let include_line = include_line_for(&gui_file);
        MutationTransaction::apply_and_validate(root_file, self.validator, |txn| {
            txn.append_line(root_file, MARKER_COMMENT)?;
            txn.append_line(root_file, &include_line)
        })
        .await?;

        tracing::info!("Registered {} in {}", gui_file, root_file);
        Ok(gui_file)
    }

    /// Appends a newline then `message` to the tool-owned file, registering
    /// the file first when needed. Returns the file's pre-append contents.
    pub async fn append_to_gui_file(
        &self,
        root_file: &Utf8Path,
        server_root: &Utf8Path,
        conf_directory: &Utf8Path,
        modules: &ModuleSet,
        message: &str,
    ) -> Result<String> {
        let gui_file = self
            .ensure_registered(root_file, server_root, conf_directory, modules)
            .await?;
        mutator::append_line(&gui_file, message)
    }

    /// Removes every line of the tool-owned file that matches `pattern` in
    /// its entirety, comments included. Returns the pre-removal contents.
    pub fn remove_from_gui_file(
        &self,
        conf_directory: &Utf8Path,
        pattern: &str,
    ) -> Result<String> {
        let gui_file = Self::gui_file_path(conf_directory);
        let pattern = full_line_pattern(pattern)?;
        mutator::remove_full_line_matches(&gui_file, &pattern)
    }
}

/// Builds the `Include` line for the root file, quoting the path on
/// platforms that require it or when it contains whitespace.
fn include_line_for(gui_file: &Utf8Path) -> String {
    if cfg!(windows) || gui_file.as_str().contains(char::is_whitespace) {
        format!("Include \"{}\"", gui_file)
    } else {
        format!("Include {}", gui_file)
    }
}

fn create_with_permissions(path: &Utf8Path) -> Result<()> {
    fs::write(path, "").map_err(|source| EngineError::access(path, source))?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, Permissions::from_mode(0o644))
            .map_err(|source| EngineError::access(path, source))?;
    }

    Ok(())
}
