//! Data models for the configuration engine.
//!
//! - [`ModuleSet`]: the effective httpd module set deciding `<IfModule>`
//!   gates, rebuilt per request from a [`ModuleInventory`] collaborator
//! - [`ConfigLine`]: one scanned config line (raw plus sanitized form)
//! - [`DirectiveMatch`]: a located directive occurrence
//! - [`WhitespaceStyle`]: indentation inheritance for inserted lines

pub mod line;
pub mod modules;

pub use line::{ConfigLine, DirectiveMatch, WhitespaceStyle};
pub use modules::{ModuleInventory, ModuleSet};
