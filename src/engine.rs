//! Engine facade wiring the collaborators together.
//!
//! [`ConfEngine`] owns the injected settings store, module inventory and
//! syntax validator, and exposes the operations the hosting layer calls.
//! Settings and the module set are re-read on every operation, and the
//! active file list is recomputed whenever it is needed; a mutation can
//! change which files are active, so nothing is cached across calls.
//!
//! Mutating operations are serialized behind a single in-process mutex: two
//! concurrent edits of the same tree would corrupt each other's snapshots.
//! Read-only operations take no lock.

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::{EngineSettings, SettingsProvider};
use crate::error::Result;
use crate::models::{DirectiveMatch, ModuleInventory, ModuleSet};
use crate::services::listing::{ConfNode, TreeLister};
use crate::services::lines::search_pattern;
use crate::services::locator::DirectiveLocator;
use crate::services::mutator;
use crate::services::registrar::GuiFileRegistrar;
use crate::services::resolver::IncludeResolver;
use crate::services::transaction::MutationTransaction;
use crate::services::validator::SyntaxValidator;

/// Entry point for configuration tree operations.
pub struct ConfEngine {
    settings: Box<dyn SettingsProvider>,
    inventory: Box<dyn ModuleInventory>,
    validator: Box<dyn SyntaxValidator>,
    resolver: IncludeResolver,
    mutation_lock: tokio::sync::Mutex<()>,
}

impl ConfEngine {
    pub fn new(
        settings: Box<dyn SettingsProvider>,
        inventory: Box<dyn ModuleInventory>,
        validator: Box<dyn SyntaxValidator>,
    ) -> Self {
        Self {
            settings,
            inventory,
            validator,
            resolver: IncludeResolver::new(),
            mutation_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The ordered active file list for the current tree, recomputed now.
    pub fn active_files(&self) -> Result<Vec<Utf8PathBuf>> {
        let settings = self.settings()?;
        let modules = self.module_set();
        self.resolver
            .resolve(&settings.conf_file, &settings.server_root, &modules)
    }

    /// Whether any active, non-comment line matches `pattern`.
    pub fn search_active(&self, pattern: &str) -> Result<bool> {
        let files = self.active_files()?;
        DirectiveLocator::new(self.module_set()).search(&files, pattern)
    }

    /// Every occurrence of a directive across the active file set.
    pub fn find_directive(
        &self,
        name_pattern: &str,
        include_comments: bool,
    ) -> Result<Vec<DirectiveMatch>> {
        let files = self.active_files()?;
        DirectiveLocator::new(self.module_set()).find(&files, name_pattern, include_comments)
    }

    /// First configured occurrence of a directive, comments skipped unless
    /// requested.
    pub fn first_directive(
        &self,
        name_pattern: &str,
        include_comments: bool,
    ) -> Result<Option<DirectiveMatch>> {
        let files = self.active_files()?;
        DirectiveLocator::new(self.module_set()).find_first(&files, name_pattern, include_comments)
    }

    /// The directive's first configured value, or `default` when it appears
    /// nowhere in the active tree.
    pub fn directive_value(&self, name_pattern: &str, default: &str) -> Result<String> {
        let files = self.active_files()?;
        DirectiveLocator::new(self.module_set()).value_or(&files, name_pattern, default)
    }

    /// Deletes every matching line from every active file, as one validated
    /// transaction: on a reported syntax failure all files are restored.
    pub async fn delete_from_active(&self, pattern: &str, include_comments: bool) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;

        let settings = self.settings()?;
        let files = self.active_files()?;
        let pattern = search_pattern(pattern)?;

        MutationTransaction::apply_and_validate(&settings.conf_file, &*self.validator, |txn| {
            for file in &files {
                if !file.is_file() {
                    continue;
                }
                txn.delete_matching(file, &pattern, 1, usize::MAX, include_comments)?;
            }
            Ok(())
        })
        .await
    }

    /// Appends a newline then `message` to the root config file, returning
    /// the pre-append contents. Low-level: no validation runs; callers that
    /// need the test-then-commit protocol go through a transaction instead.
    pub async fn append_to_root(&self, message: &str) -> Result<String> {
        let _guard = self.mutation_lock.lock().await;
        let settings = self.settings()?;
        mutator::append_line(&settings.conf_file, message)
    }

    /// Makes sure the tool-owned config file exists and is included by the
    /// root tree; see [`GuiFileRegistrar::ensure_registered`].
    pub async fn ensure_gui_registered(&self) -> Result<Utf8PathBuf> {
        let _guard = self.mutation_lock.lock().await;
        let settings = self.settings()?;
        GuiFileRegistrar::new(&*self.validator)
            .ensure_registered(
                &settings.conf_file,
                &settings.server_root,
                &settings.conf_directory,
                &self.module_set(),
            )
            .await
    }

    /// Appends to the tool-owned config file, registering it first when
    /// needed. Returns its pre-append contents.
    pub async fn append_to_gui_file(&self, message: &str) -> Result<String> {
        let _guard = self.mutation_lock.lock().await;
        let settings = self.settings()?;
        GuiFileRegistrar::new(&*self.validator)
            .append_to_gui_file(
                &settings.conf_file,
                &settings.server_root,
                &settings.conf_directory,
                &self.module_set(),
                message,
            )
            .await
    }

    /// Removes full-line matches from the tool-owned config file. Returns
    /// its pre-removal contents.
    pub async fn remove_from_gui_file(&self, pattern: &str) -> Result<String> {
        let _guard = self.mutation_lock.lock().await;
        let settings = self.settings()?;
        GuiFileRegistrar::new(&*self.validator).remove_from_gui_file(&settings.conf_directory, pattern)
    }

    /// One directory node of the configuration tree, for navigation.
    pub fn list_node(&self, path: &Utf8Path) -> Result<ConfNode> {
        self.tree_lister()?.list_node(path)
    }

    /// Every file under the configuration directory, noise filtered.
    pub fn full_file_list(&self) -> Result<Vec<Utf8PathBuf>> {
        self.tree_lister()?.full_file_list()
    }

    fn tree_lister(&self) -> Result<TreeLister> {
        let settings = self.settings()?;
        Ok(TreeLister::new(settings.conf_directory, settings.server_root))
    }

    fn settings(&self) -> Result<EngineSettings> {
        EngineSettings::from_provider(&*self.settings)
    }

    fn module_set(&self) -> ModuleSet {
        ModuleSet::from_inventory(&*self.inventory)
    }
}
