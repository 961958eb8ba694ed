//! Services module - the engine's core operations over a configuration tree.
//!
//! Everything here is framework-agnostic business logic with no UI or
//! transport dependencies; collaborators (settings, module inventory, syntax
//! validator) arrive as explicit parameters so every service runs against
//! fake collaborators in tests.
//!
//! # Components
//!
//! - [`lines`]: sanitization, comment classification and pattern compilation
//!   shared by every scanner
//! - [`files`]: UTF-8 reads and atomic whole-file rewrites with a fixed line
//!   terminator
//! - [`IncludeResolver`]: resolves the ordered active file list, following
//!   `Include`/`IncludeOptional` and `<IfModule>` gating
//! - [`DirectiveLocator`]: directive search/extraction across files,
//!   comment- and gate-aware
//! - [`mutator`]: line-level insert / replace / delete primitives returning
//!   rollback snapshots
//! - [`MutationTransaction`]: capture → mutate → validate → commit-or-rollback
//! - [`SyntaxValidator`] / [`HttpdValidator`]: external syntax check with a
//!   bounded subprocess timeout
//! - [`GuiFileRegistrar`]: idempotent registration of the tool-owned config
//!   file into the root tree
//! - [`TreeLister`]: navigable directory listing with noise filtering
//!
//! # Control flow
//!
//! A directive change runs locator → transaction-wrapped mutator calls →
//! validator, committing only when the mutated tree still passes the
//! server's own syntax check. The active file list is recomputed whenever
//! it is needed; mutations can change which files are active.

pub mod files;
pub mod lines;
pub mod listing;
pub mod locator;
pub mod mutator;
pub mod registrar;
pub mod resolver;
pub mod transaction;
pub mod validator;

pub use listing::{ConfNode, ConfNodeRef, TreeLister};
pub use locator::DirectiveLocator;
pub use registrar::{GUI_CONF_FILE, GuiFileRegistrar, MARKER_COMMENT};
pub use resolver::{IncludeResolver, ModuleGate};
pub use transaction::MutationTransaction;
pub use validator::{HttpdValidator, SyntaxValidator, ValidationOutcome};
