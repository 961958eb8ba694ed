//! Integration tests for active-file resolution over realistic trees.
//!
//! These tests verify:
//! - Load order across nested includes, glob includes and directory includes
//! - `<IfModule>` gating with both polarities and nesting
//! - Optional vs. required include error behavior

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use httpdconf::{EngineError, IncludeResolver, ModuleSet};
use tempfile::TempDir;

fn write(dir: &Utf8Path, name: &str, content: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn server_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap()
        .canonicalize_utf8()
        .unwrap()
}

#[test]
fn realistic_tree_resolves_in_load_order() {
    let dir = TempDir::new().unwrap();
    let root_dir = server_root(&dir);

    let conf_d = root_dir.join("conf.d");
    let extra = root_dir.join("conf/extra");
    fs::create_dir_all(&conf_d).unwrap();
    fs::create_dir_all(&extra).unwrap();

    let ssl = write(&extra, "httpd-ssl.conf", "Listen 443\n");
    let mpm = write(&extra, "httpd-mpm.conf", "");
    let charset = write(&conf_d, "charset.conf", "AddDefaultCharset UTF-8\n");
    let welcome = write(&conf_d, "welcome.conf", "");

    let root = write(
        &root_dir,
        "httpd.conf",
        "ServerRoot \".\"\n\
         Listen 80\n\
         Include conf.d/*.conf\n\
         <IfModule ssl_module>\n\
         \tInclude conf/extra/httpd-ssl.conf\n\
         </IfModule>\n\
         Include conf/extra/httpd-mpm.conf\n\
         IncludeOptional sites-enabled/*.conf\n",
    );

    let modules = ModuleSet::new(&["core_module", "ssl_module"], &[]);
    let files = IncludeResolver::new()
        .resolve(&root, &root_dir, &modules)
        .unwrap();

    assert_eq!(files, vec![root, charset, welcome, ssl, mpm]);
}

#[test]
fn gated_include_drops_out_when_module_is_unloaded() {
    let dir = TempDir::new().unwrap();
    let root_dir = server_root(&dir);
    let extra = root_dir.join("conf/extra");
    fs::create_dir_all(&extra).unwrap();

    write(&extra, "httpd-ssl.conf", "Listen 443\n");
    let mpm = write(&extra, "httpd-mpm.conf", "");
    let root = write(
        &root_dir,
        "httpd.conf",
        "<IfModule ssl_module>\nInclude conf/extra/httpd-ssl.conf\n</IfModule>\n\
         Include conf/extra/httpd-mpm.conf\n",
    );

    let files = IncludeResolver::new()
        .resolve(&root, &root_dir, &ModuleSet::new(&["core_module"], &[]))
        .unwrap();

    assert_eq!(files, vec![root, mpm]);
}

#[test]
fn shared_modules_gate_like_static_ones() {
    let dir = TempDir::new().unwrap();
    let root_dir = server_root(&dir);

    let rewrite = write(&root_dir, "rewrite.conf", "");
    let root = write(
        &root_dir,
        "httpd.conf",
        "<IfModule rewrite_module>\nInclude rewrite.conf\n</IfModule>\n",
    );

    let modules = ModuleSet::new(&[], &["rewrite_module"]);
    let files = IncludeResolver::new()
        .resolve(&root, &root_dir, &modules)
        .unwrap();
    assert_eq!(files, vec![root, rewrite]);
}

#[test]
fn include_cycles_terminate() {
    let dir = TempDir::new().unwrap();
    let root_dir = server_root(&dir);

    // a.conf includes b.conf which includes a.conf again.
    write(&root_dir, "b.conf", "Include a.conf\n");
    let a = write(&root_dir, "a.conf", "Include b.conf\n");

    let files = IncludeResolver::new()
        .resolve(&a, &root_dir, &ModuleSet::default())
        .unwrap();

    assert_eq!(files, vec![a, root_dir.join("b.conf")]);
}

#[test]
fn missing_root_file_is_an_access_error() {
    let dir = TempDir::new().unwrap();
    let root_dir = server_root(&dir);

    let err = IncludeResolver::new()
        .resolve(&root_dir.join("httpd.conf"), &root_dir, &ModuleSet::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::Access { .. }));
}

#[test]
fn required_glob_with_no_matches_fails() {
    let dir = TempDir::new().unwrap();
    let root_dir = server_root(&dir);
    let root = write(&root_dir, "httpd.conf", "Include conf.d/*.conf\n");

    let err = IncludeResolver::new()
        .resolve(&root, &root_dir, &ModuleSet::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::MissingInclude(_)));
}

#[test]
fn optional_glob_with_no_matches_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let root_dir = server_root(&dir);
    let root = write(&root_dir, "httpd.conf", "IncludeOptional conf.d/*.conf\n");

    let files = IncludeResolver::new()
        .resolve(&root, &root_dir, &ModuleSet::default())
        .unwrap();
    assert_eq!(files, vec![root]);
}
