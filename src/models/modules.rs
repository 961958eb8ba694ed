//! Module inventory: which httpd modules are compiled in or currently loaded.
//!
//! The set decides `<IfModule>` gate outcomes during active-file resolution
//! and directive location. It is rebuilt from the inventory collaborator on
//! every request and never persisted; the config tree can change which
//! modules are loaded between requests.

use std::collections::HashSet;

/// Supplies the names of statically compiled and dynamically loaded modules.
///
/// Implemented outside the engine (typically by parsing `httpd -l` output
/// and scanning `LoadModule` lines); injected rather than reached for, so
/// tests can substitute a fixed inventory.
pub trait ModuleInventory: Send + Sync {
    /// Modules compiled into the server binary.
    fn static_modules(&self) -> Vec<String>;

    /// Modules currently activated through `LoadModule`.
    fn shared_modules(&self) -> Vec<String>;
}

/// Case-insensitive set of module names in effect for one request.
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    static_modules: HashSet<String>,
    shared_modules: HashSet<String>,
}

impl ModuleSet {
    /// Builds a set from explicit name lists.
    pub fn new<S: AsRef<str>>(static_modules: &[S], shared_modules: &[S]) -> Self {
        Self {
            static_modules: normalize(static_modules),
            shared_modules: normalize(shared_modules),
        }
    }

    /// Builds the effective set for the current request from the inventory
    /// collaborator.
    pub fn from_inventory(inventory: &dyn ModuleInventory) -> Self {
        Self::new(&inventory.static_modules(), &inventory.shared_modules())
    }

    /// Case-insensitive membership across both the static and shared sets.
    pub fn contains(&self, module: &str) -> bool {
        let name = module.to_ascii_lowercase();
        self.static_modules.contains(&name) || self.shared_modules.contains(&name)
    }
}

fn normalize<S: AsRef<str>>(names: &[S]) -> HashSet<String> {
    names
        .iter()
        .map(|name| name.as_ref().trim().to_ascii_lowercase())
        .collect()
}
