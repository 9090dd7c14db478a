//! Read-only catalog of package/class data used by completion
//!
//! Package data files are JSON documents named `<package>.json`:
//!
//! ```json
//! {
//!   "options": ["draft", "final"],
//!   "macros": [{"name": "includegraphics", "keyvalpos": 0, "keyvals": ["width=${1:len}"]}],
//!   "envs": [{"name": "tabular", "keyvalpos": 0, "keyvals": ["t", "b"]}]
//! }
//! ```
//!
//! Class data uses the `class-<name>` file name; the standard classes share
//! `latex-document`.

use std::path::{Path, PathBuf};

use fxhash::FxHashMap;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::error::{AssistError, AssistResult};

lazy_static! {
    static ref USEPACKAGE: Regex =
        Regex::new(r"\\(?:usepackage|RequirePackage)\s*(?:\[([^\]]*)\])?\s*\{([^}]*)\}")
            .expect("usepackage pattern is valid");
}

/// One command or environment signature with a key-value slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSignature {
    pub name: String,
    /// 0-based argument slot taking `key=value` options
    #[serde(rename = "keyvalpos")]
    pub keyval_position: usize,
    #[serde(default)]
    pub keyvals: Vec<String>,
}

impl CandidateSignature {
    pub fn new<I, S>(name: impl Into<String>, keyval_position: usize, keyvals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keyval_position,
            keyvals: keyvals.into_iter().map(Into::into).collect(),
        }
    }
}

/// Everything the catalog knows about one package or class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageData {
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub macros: Vec<CandidateSignature>,
    #[serde(default)]
    pub envs: Vec<CandidateSignature>,
}

/// Catalog service consumed by the completion matcher
pub trait Catalog: Send + Sync {
    /// Packages in effect for a document of `lang_id`, in lookup order,
    /// mapped to the options they were loaded with.
    fn packages_included(&self, lang_id: &str) -> IndexMap<String, Vec<String>>;

    fn environments_from_package(&self, package: &str) -> Vec<CandidateSignature>;

    fn commands_from_package(&self, package: &str) -> Vec<CandidateSignature>;

    /// Options of a package or class. Call [`Catalog::load_package_data`] first.
    fn package_options(&self, package: &str) -> Vec<String>;

    /// Make `package`'s data available. Unknown packages are not an error.
    fn load_package_data(&self, package: &str) -> AssistResult<()>;
}

/// Data set name for a `\documentclass` argument
pub fn class_data_name(class: &str) -> String {
    match class {
        "article" | "report" | "book" => "latex-document".to_string(),
        other => format!("class-{}", other),
    }
}

/// Packages loaded by `source`, with their options, in order of appearance
pub fn scan_used_packages(source: &str) -> IndexMap<String, Vec<String>> {
    let mut found = IndexMap::new();
    for caps in USEPACKAGE.captures_iter(source) {
        let options: Vec<String> = caps
            .get(1)
            .map(|m| split_list(m.as_str()))
            .unwrap_or_default();
        for name in split_list(&caps[2]) {
            found.insert(name, options.clone());
        }
    }
    found
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// In-memory catalog, optionally backed by a directory of package JSON files
/// that are read on first use.
pub struct PackageCatalog {
    data_dir: Option<PathBuf>,
    packages: RwLock<FxHashMap<String, PackageData>>,
    included: RwLock<IndexMap<String, Vec<String>>>,
    base_packages: FxHashMap<String, Vec<String>>,
}

impl Default for PackageCatalog {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl PackageCatalog {
    /// Catalog holding only what is inserted programmatically
    pub fn in_memory() -> Self {
        let mut base_packages = FxHashMap::default();
        for lang in ["latex", "rsweave", "jlweave", "pweave"] {
            base_packages.insert(lang.to_string(), vec!["latex-document".to_string()]);
        }
        base_packages.insert(
            "latex-expl3".to_string(),
            vec!["latex-document".to_string(), "expl3".to_string()],
        );
        Self {
            data_dir: None,
            packages: RwLock::new(FxHashMap::default()),
            included: RwLock::new(IndexMap::new()),
            base_packages,
        }
    }

    /// Catalog reading `<dir>/<package>.json` on demand
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: Some(dir.as_ref().to_path_buf()),
            ..Self::in_memory()
        }
    }

    /// Register data for a package, replacing what was there
    pub fn insert_package(&self, name: impl Into<String>, data: PackageData) {
        self.packages.write().insert(name.into(), data);
    }

    /// Mark a package as loaded by the current document
    pub fn include(&self, name: impl Into<String>, options: Vec<String>) {
        self.included.write().insert(name.into(), options);
    }

    /// Replace the document's package list with what `source` loads
    pub fn include_from_source(&self, source: &str) {
        *self.included.write() = scan_used_packages(source);
    }

    pub fn is_loaded(&self, package: &str) -> bool {
        self.packages.read().contains_key(package)
    }

    fn with_package<T>(&self, package: &str, f: impl FnOnce(&PackageData) -> T) -> Option<T> {
        self.packages.read().get(package).map(f)
    }
}

impl Catalog for PackageCatalog {
    fn packages_included(&self, lang_id: &str) -> IndexMap<String, Vec<String>> {
        let mut packages = IndexMap::new();
        if let Some(base) = self.base_packages.get(lang_id) {
            for name in base {
                packages.insert(name.clone(), Vec::new());
            }
        }
        for (name, options) in self.included.read().iter() {
            packages.insert(name.clone(), options.clone());
        }
        packages
    }

    fn environments_from_package(&self, package: &str) -> Vec<CandidateSignature> {
        self.with_package(package, |data| data.envs.clone())
            .unwrap_or_default()
    }

    fn commands_from_package(&self, package: &str) -> Vec<CandidateSignature> {
        self.with_package(package, |data| data.macros.clone())
            .unwrap_or_default()
    }

    fn package_options(&self, package: &str) -> Vec<String> {
        self.with_package(package, |data| data.options.clone())
            .unwrap_or_default()
    }

    fn load_package_data(&self, package: &str) -> AssistResult<()> {
        if self.is_loaded(package) {
            return Ok(());
        }
        let Some(dir) = &self.data_dir else {
            return Ok(());
        };
        if package.contains(['/', '\\']) || package.starts_with('.') {
            return Err(AssistError::catalog(package, "not a package name"));
        }
        let path = dir.join(format!("{}.json", package));
        if !path.is_file() {
            tracing::debug!(package, path = %path.display(), "no package data file");
            return Ok(());
        }
        let raw = std::fs::read_to_string(&path)?;
        let data: PackageData = serde_json::from_str(&raw)
            .map_err(|e| AssistError::catalog(package, e.to_string()))?;
        tracing::debug!(
            package,
            macros = data.macros.len(),
            envs = data.envs.len(),
            options = data.options.len(),
            "loaded package data"
        );
        self.insert_package(package, data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_data_name() {
        assert_eq!(class_data_name("article"), "latex-document");
        assert_eq!(class_data_name("book"), "latex-document");
        assert_eq!(class_data_name("beamer"), "class-beamer");
    }

    #[test]
    fn test_scan_used_packages_keeps_order_and_options() {
        let source = "\\documentclass{article}\n\\usepackage[margin=1in]{geometry}\n\\usepackage{amsmath, tikz}\n";
        let found = scan_used_packages(source);
        let names: Vec<&str> = found.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["geometry", "amsmath", "tikz"]);
        assert_eq!(found["geometry"], vec!["margin=1in".to_string()]);
        assert!(found["tikz"].is_empty());
    }

    #[test]
    fn test_packages_included_puts_base_first() {
        let catalog = PackageCatalog::in_memory();
        catalog.include("graphicx", Vec::new());
        let names: Vec<String> = catalog.packages_included("latex").into_keys().collect();
        assert_eq!(names, vec!["latex-document".to_string(), "graphicx".to_string()]);

        let names: Vec<String> = catalog.packages_included("markdown").into_keys().collect();
        assert_eq!(names, vec!["graphicx".to_string()]);
    }

    #[test]
    fn test_package_data_decodes_keyvalpos() {
        let data: PackageData = serde_json::from_str(
            r#"{"macros": [{"name": "includegraphics", "keyvalpos": 0, "keyvals": ["width="]}]}"#,
        )
        .unwrap();
        assert_eq!(data.macros[0].keyval_position, 0);
        assert!(data.options.is_empty());
        assert!(data.envs.is_empty());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tikz.json"),
            r#"{"options": ["draft", "external"]}"#,
        )
        .unwrap();
        let catalog = PackageCatalog::from_dir(dir.path());
        assert!(catalog.package_options("tikz").is_empty());
        catalog.load_package_data("tikz").unwrap();
        assert_eq!(
            catalog.package_options("tikz"),
            vec!["draft".to_string(), "external".to_string()]
        );
        // Missing data is not an error.
        catalog.load_package_data("nosuchpackage").unwrap();
        assert!(!catalog.is_loaded("nosuchpackage"));
    }

    #[test]
    fn test_malformed_data_is_catalog_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        let catalog = PackageCatalog::from_dir(dir.path());
        let err = catalog.load_package_data("broken").unwrap_err();
        assert!(matches!(err, AssistError::Catalog { .. }));
    }

    #[test]
    fn test_path_like_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = PackageCatalog::from_dir(dir.path());
        assert!(catalog.load_package_data("../etc/passwd").is_err());
    }
}
