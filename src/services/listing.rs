//! Navigable listing of the configuration directory.
//!
//! Some httpd installations use the server root itself as the root
//! configuration directory, which drags `logs`, `modules` and `run` into
//! directory listings. When the configuration directory coincides with the
//! server root, entries under those subdirectories are filtered out so the
//! listing only surfaces configuration. Nodes serialize to JSON for the
//! (out-of-scope) UI layer.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::Serialize;

use crate::error::{EngineError, Result};

/// Subdirectories filtered out when the configuration directory doubles as
/// the server root.
pub const NOISE_DIRECTORIES: [&str; 3] = ["logs", "modules", "run"];

/// Display name of the configuration root node.
const ROOT_NODE_NAME: &str = "Configuration";

/// A directory node with its immediate children.
#[derive(Debug, Serialize)]
pub struct ConfNode {
    pub id: String,
    pub name: String,
    pub children: Vec<ConfNodeRef>,
}

/// One child entry: a subdirectory or a file.
#[derive(Debug, Serialize)]
pub struct ConfNodeRef {
    pub id: String,
    pub name: String,
    pub directory: bool,
}

impl ConfNode {
    /// Renders the node for the UI collaborator.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ConfNode serialization cannot fail")
    }
}

/// Lists configuration directory nodes.
pub struct TreeLister {
    conf_directory: Utf8PathBuf,
    server_root: Utf8PathBuf,
    noise: Regex,
}

impl TreeLister {
    pub fn new(conf_directory: impl Into<Utf8PathBuf>, server_root: impl Into<Utf8PathBuf>) -> Self {
        let conf_directory = conf_directory.into();
        let pattern = format!(
            r"^{}[/\\](?:{})(?:[/\\].*)?$",
            regex::escape(conf_directory.as_str()),
            NOISE_DIRECTORIES.join("|"),
        );
        Self {
            noise: Regex::new(&pattern).expect("Invalid noise directory regex"),
            conf_directory,
            server_root: server_root.into(),
        }
    }

    /// Lists one directory node: children sorted by name, directories before
    /// files, noise subdirectories omitted when the configuration directory
    /// is also the server root.
    pub fn list_node(&self, path: &Utf8Path) -> Result<ConfNode> {
        let filter_noise = path == self.conf_directory && self.conf_directory == self.server_root;

        let mut directories: Vec<ConfNodeRef> = Vec::new();
        let mut files: Vec<ConfNodeRef> = Vec::new();

        let entries = fs::read_dir(path).map_err(|source| EngineError::access(path, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| EngineError::access(path, source))?;
            let Ok(child) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if filter_noise && self.noise.is_match(child.as_str()) {
                tracing::trace!("Filtering noise entry {}", child);
                continue;
            }

            let node = ConfNodeRef {
                id: child.as_str().to_string(),
                name: child.file_name().unwrap_or_default().to_string(),
                directory: child.is_dir(),
            };
            if node.directory {
                directories.push(node);
            } else {
                files.push(node);
            }
        }

        directories.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));
        directories.extend(files);

        let name = if path == self.conf_directory {
            ROOT_NODE_NAME.to_string()
        } else {
            path.file_name().unwrap_or_default().to_string()
        };

        Ok(ConfNode {
            id: path.as_str().to_string(),
            name,
            children: directories,
        })
    }

    /// Every file under the configuration directory, recursively, with the
    /// same noise filter applied when the directory is also the server root.
    pub fn full_file_list(&self) -> Result<Vec<Utf8PathBuf>> {
        let filter_noise = self.conf_directory == self.server_root;
        let mut files = Vec::new();
        self.collect_files(&self.conf_directory, filter_noise, &mut files)?;
        Ok(files)
    }

    fn collect_files(
        &self,
        dir: &Utf8Path,
        filter_noise: bool,
        out: &mut Vec<Utf8PathBuf>,
    ) -> Result<()> {
        let mut children: Vec<Utf8PathBuf> = Vec::new();
        let entries = fs::read_dir(dir).map_err(|source| EngineError::access(dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| EngineError::access(dir, source))?;
            if let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) {
                children.push(path);
            }
        }
        children.sort();

        for child in children {
            if filter_noise && self.noise.is_match(child.as_str()) {
                continue;
            }
            if child.is_dir() {
                self.collect_files(&child, filter_noise, out)?;
            } else {
                out.push(child);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> Utf8PathBuf {
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        for sub in ["logs", "modules", "run", "sites"] {
            fs::create_dir(base.join(sub)).unwrap();
        }
        fs::write(base.join("httpd.conf"), "Listen 80\n").unwrap();
        fs::write(base.join("sites/site.conf"), "").unwrap();
        fs::write(base.join("logs/error_log"), "").unwrap();
        base
    }

    #[test]
    fn noise_is_filtered_when_conf_dir_is_server_root() {
        let dir = TempDir::new().unwrap();
        let base = setup(&dir);

        let lister = TreeLister::new(base.clone(), base.clone());
        let node = lister.list_node(&base).unwrap();

        let names: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["sites", "httpd.conf"]);
        assert_eq!(node.name, "Configuration");
    }

    #[test]
    fn noise_is_kept_when_server_root_differs() {
        let dir = TempDir::new().unwrap();
        let base = setup(&dir);

        let lister = TreeLister::new(base.clone(), "/srv/www");
        let node = lister.list_node(&base).unwrap();

        let names: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["logs", "modules", "run", "sites", "httpd.conf"]);
    }

    #[test]
    fn directories_sort_before_files() {
        let dir = TempDir::new().unwrap();
        let base = setup(&dir);

        let lister = TreeLister::new(base.clone(), base.clone());
        let node = lister.list_node(&base).unwrap();

        assert!(node.children[0].directory);
        assert!(!node.children.last().unwrap().directory);
    }

    #[test]
    fn subdirectory_nodes_use_their_own_name() {
        let dir = TempDir::new().unwrap();
        let base = setup(&dir);

        let lister = TreeLister::new(base.clone(), base.clone());
        let node = lister.list_node(&base.join("sites")).unwrap();
        assert_eq!(node.name, "sites");
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn full_file_list_recurses_with_filter() {
        let dir = TempDir::new().unwrap();
        let base = setup(&dir);

        let lister = TreeLister::new(base.clone(), base.clone());
        let files = lister.full_file_list().unwrap();

        assert_eq!(
            files,
            vec![base.join("httpd.conf"), base.join("sites/site.conf")]
        );
    }

    #[test]
    fn node_json_is_renderable() {
        let dir = TempDir::new().unwrap();
        let base = setup(&dir);

        let lister = TreeLister::new(base.clone(), base.clone());
        let json = lister.list_node(&base).unwrap().to_json();
        assert!(json.contains("\"Configuration\""));
        assert!(json.contains("httpd.conf"));
    }
}
