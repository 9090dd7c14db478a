//! Key-value option completion inside command and environment arguments

use std::sync::Arc;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::argument::{argument_index, ArgumentInvocation};
use super::catalog::{class_data_name, CandidateSignature, Catalog};
use crate::utils::config::CompletionConfig;

lazy_static! {
    static ref USEPACKAGE_NAME: Regex =
        Regex::new(r"\\usepackage.*\{(.*?)\}").expect("usepackage name pattern is valid");
    static ref DOCUMENTCLASS_NAME: Regex =
        Regex::new(r"(?s)\\documentclass.*\{(.*?)\}").expect("documentclass name pattern is valid");
    static ref PLACEHOLDER_HINT: Regex =
        Regex::new(r"\$\{(\d+):[^$}]*\}").expect("placeholder pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionItemKind {
    Constant,
}

/// A single completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    /// Snippet syntax (`${1:hint}` placeholders)
    pub insert_text: String,
}

impl CompletionItem {
    pub fn constant(option: impl Into<String>) -> Self {
        let option = option.into();
        Self {
            label: option.clone(),
            kind: CompletionItemKind::Constant,
            insert_text: option,
        }
    }
}

/// Where completion was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    /// Full text of the cursor's line
    pub line: String,
    /// Cursor column, in chars
    pub character: usize,
    pub lang_id: String,
}

impl CompletionContext {
    pub fn new(line: impl Into<String>, character: usize, lang_id: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            character,
            lang_id: lang_id.into(),
        }
    }

    /// Line text before the cursor
    pub fn prefix(&self) -> String {
        self.line.chars().take(self.character).collect()
    }
}

/// Provides completion items for a specific context.
pub trait CompletionSource {
    fn complete(&self, ctx: &CompletionContext) -> Vec<CompletionItem>;
}

/// Strip hint text from snippet placeholders, `${1:len}` becoming `${1}`
pub fn filter_argument_hint(items: &mut [CompletionItem]) {
    for item in items {
        if PLACEHOLDER_HINT.is_match(&item.insert_text) {
            item.insert_text = PLACEHOLDER_HINT
                .replace_all(&item.insert_text, "$${${1}}")
                .into_owned();
        }
    }
}

/// Key-value options of the first matching signature, empty when no package
/// defines one
pub fn keyval_candidates(
    catalog: &dyn Catalog,
    command: &str,
    environment: Option<&str>,
    index: usize,
    packages: &IndexMap<String, Vec<String>>,
) -> Vec<String> {
    find_keyval_signature(catalog, command, environment, index, packages)
        .map(|sig| sig.keyvals)
        .unwrap_or_default()
}

/// First signature with key-value options for argument `index`.
///
/// With `environment` set, `command` is ignored and environments named
/// `environment` are searched with `index == keyvalpos + 1`, since argument
/// 0 holds the name. Otherwise commands named `command` match with
/// `index == keyvalpos`. Packages are searched in order.
pub fn find_keyval_signature(
    catalog: &dyn Catalog,
    command: &str,
    environment: Option<&str>,
    index: usize,
    packages: &IndexMap<String, Vec<String>>,
) -> Option<CandidateSignature> {
    for package in packages.keys() {
        if let Err(err) = catalog.load_package_data(package) {
            tracing::warn!(package = %package, error = %err, "skipping package data");
            continue;
        }
        let found = match environment {
            Some(env) => catalog
                .environments_from_package(package)
                .into_iter()
                .find(|sig| sig.name == env && index == sig.keyval_position + 1),
            None => catalog
                .commands_from_package(package)
                .into_iter()
                .find(|sig| sig.name == command && index == sig.keyval_position),
        };
        if found.is_some() {
            tracing::trace!(package = %package, command, ?environment, index, "keyval signature");
            return found;
        }
    }
    None
}

/// Completion for option lists inside `\cmd[...]`, `\begin{env}[...]`,
/// `\usepackage[...]` and `\documentclass[...]`
pub struct ArgumentCompleter {
    catalog: Arc<dyn Catalog>,
    config: CompletionConfig,
}

impl ArgumentCompleter {
    pub fn new(catalog: Arc<dyn Catalog>, config: CompletionConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Items for an invocation already pulled out of `line`
    pub fn provide(
        &self,
        invocation: &ArgumentInvocation,
        line: &str,
        lang_id: &str,
    ) -> Vec<CompletionItem> {
        let mut items = match invocation.command.as_str() {
            "usepackage" => self.package_options(line),
            "documentclass" => self.class_options(line),
            _ => self.keyval_items(invocation, lang_id),
        };
        if !self.config.argument_hint {
            filter_argument_hint(&mut items);
        }
        items
    }

    fn keyval_items(&self, invocation: &ArgumentInvocation, lang_id: &str) -> Vec<CompletionItem> {
        let index = match argument_index(&invocation.arguments) {
            Ok(index) => index,
            Err(err) => {
                tracing::debug!(command = %invocation.command, %err, "no argument index");
                return Vec::new();
            }
        };
        let packages = self.catalog.packages_included(lang_id);
        keyval_candidates(
            self.catalog.as_ref(),
            &invocation.command,
            invocation.environment(),
            index,
            &packages,
        )
        .into_iter()
        .map(CompletionItem::constant)
        .collect()
    }

    fn package_options(&self, line: &str) -> Vec<CompletionItem> {
        let Some(caps) = USEPACKAGE_NAME.captures(line) else {
            return Vec::new();
        };
        self.options_of(&caps[1])
    }

    fn class_options(&self, line: &str) -> Vec<CompletionItem> {
        let Some(caps) = DOCUMENTCLASS_NAME.captures(line) else {
            return Vec::new();
        };
        self.options_of(&class_data_name(&caps[1]))
    }

    fn options_of(&self, package: &str) -> Vec<CompletionItem> {
        if let Err(err) = self.catalog.load_package_data(package) {
            tracing::warn!(package, error = %err, "cannot load package data");
            return Vec::new();
        }
        self.catalog
            .package_options(package)
            .into_iter()
            .map(CompletionItem::constant)
            .collect()
    }
}

impl CompletionSource for ArgumentCompleter {
    fn complete(&self, ctx: &CompletionContext) -> Vec<CompletionItem> {
        let prefix = ctx.prefix();
        match ArgumentInvocation::from_line_prefix(&prefix) {
            Some(invocation) => self.provide(&invocation, &ctx.line, &ctx.lang_id),
            None => Vec::new(),
        }
    }
}
