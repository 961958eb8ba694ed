// httpdconf - engine for managing a live Apache HTTP Server configuration tree
//
// This is a library crate: it resolves the set of configuration files the
// server actually loads, locates and mutates directives inside them, and
// commits changes only when the server's own syntax check accepts the
// result. The web UI, directive wrapper types and authentication live in
// separate crates built on top of this one.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{EngineSettings, SettingsProvider, YamlSettingsStore};
pub use engine::ConfEngine;
pub use error::EngineError;
pub use models::{DirectiveMatch, ModuleInventory, ModuleSet, WhitespaceStyle};
pub use services::{
    DirectiveLocator, GuiFileRegistrar, HttpdValidator, IncludeResolver, MutationTransaction,
    SyntaxValidator, TreeLister,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
