//! Argument completion
//!
//! Works out which argument slot of `\cmd`, `\begin{env}`, `\usepackage` or
//! `\documentclass` the cursor is in and offers the key-value options the
//! package catalog lists for that slot.

pub mod argument;
pub mod catalog;
pub mod matcher;

pub use argument::{argument_index, ArgumentInvocation, ArgumentScanError};
pub use catalog::{CandidateSignature, Catalog, PackageCatalog, PackageData};
pub use matcher::{
    filter_argument_hint, find_keyval_signature, keyval_candidates, ArgumentCompleter,
    CompletionContext, CompletionItem, CompletionItemKind, CompletionSource,
};
