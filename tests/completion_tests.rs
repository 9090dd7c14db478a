//! Integration tests for argument completion

use std::fs;
use std::sync::Arc;

use texassist::core::completion::{keyval_candidates, CompletionItemKind};
use texassist::{
    argument_index, ArgumentCompleter, ArgumentInvocation, Catalog, CompletionConfig,
    CompletionContext, CompletionSource, PackageCatalog,
};

/// Catalog directory with the standard-class data, `graphicx`, `tikz` and
/// the `beamer` class
fn data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("latex-document.json"),
        r#"{
            "options": ["a4paper", "11pt", "twocolumn"],
            "macros": [{"name": "item", "keyvalpos": 0, "keyvals": ["label"]}],
            "envs": [
                {"name": "tabular", "keyvalpos": 0, "keyvals": ["t", "b", "c"]},
                {"name": "minipage", "keyvalpos": 0, "keyvals": ["t", "b"]}
            ]
        }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("graphicx.json"),
        r#"{
            "options": ["draft", "final"],
            "macros": [
                {"name": "includegraphics", "keyvalpos": 0,
                 "keyvals": ["width=${1:length}", "height=${1:length}", "angle=${1:degrees}"]}
            ]
        }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("tikz.json"),
        r#"{"options": ["external"], "envs": [{"name": "tikzpicture", "keyvalpos": 0, "keyvals": ["scale="]}]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("class-beamer.json"),
        r#"{"options": ["handout", "aspectratio=${1:ratio}"]}"#,
    )
    .unwrap();
    dir
}

const DOCUMENT: &str = "\\documentclass{article}\n\\usepackage{graphicx}\n\\usepackage[external]{tikz}\n";

fn completer(dir: &tempfile::TempDir, config: CompletionConfig) -> ArgumentCompleter {
    let catalog = PackageCatalog::from_dir(dir.path());
    catalog.include_from_source(DOCUMENT);
    ArgumentCompleter::new(Arc::new(catalog), config)
}

fn complete_at_end(completer: &ArgumentCompleter, line: &str) -> Vec<String> {
    completer
        .complete(&CompletionContext::new(line, line.chars().count(), "latex"))
        .into_iter()
        .map(|item| item.label)
        .collect()
}

mod argument_index_resolver {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_closed_groups() {
        let cases = [
            ("{", 0),
            ("[", 0),
            ("{a}{", 1),
            ("[t]{c}{", 2),
            ("{outer {inner} still}[", 1),
            (r"{a\}}{", 1),
        ];
        for (text, expected) in cases {
            assert_eq!(argument_index(text), Ok(expected), "argument text {:?}", text);
        }
    }

    #[test]
    fn test_unbalanced_text_is_reported() {
        assert!(argument_index("{a}]").is_err());
        assert!(argument_index("[a]}}").is_err());
    }
}

mod keyval_matching {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_options() {
        let dir = data_dir();
        let completer = completer(&dir, CompletionConfig::default());
        assert_eq!(
            complete_at_end(&completer, r"\includegraphics[wi"),
            vec!["width=${1:length}", "height=${1:length}", "angle=${1:degrees}"]
        );
    }

    #[test]
    fn test_star_variant_matches_base_name() {
        let dir = data_dir();
        let completer = completer(&dir, CompletionConfig::default());
        assert_eq!(complete_at_end(&completer, r"\includegraphics*[").len(), 3);
    }

    #[test]
    fn test_wrong_slot_yields_nothing() {
        let dir = data_dir();
        let completer = completer(&dir, CompletionConfig::default());
        assert!(complete_at_end(&completer, r"\includegraphics[width=1cm]{").is_empty());
    }

    #[test]
    fn test_environment_options_after_name() {
        let dir = data_dir();
        let completer = completer(&dir, CompletionConfig::default());
        assert_eq!(
            complete_at_end(&completer, r"\begin{tabular}["),
            vec!["t", "b", "c"]
        );
        assert_eq!(
            complete_at_end(&completer, r"\begin{tikzpicture}["),
            vec!["scale="]
        );
        // Still typing the environment name.
        assert!(complete_at_end(&completer, r"\begin{tabu").is_empty());
    }

    #[test]
    fn test_package_not_loaded_by_document() {
        let dir = data_dir();
        let catalog = PackageCatalog::from_dir(dir.path());
        let completer = ArgumentCompleter::new(Arc::new(catalog), CompletionConfig::default());
        assert!(complete_at_end(&completer, r"\includegraphics[").is_empty());
    }

    #[test]
    fn test_keyval_candidates_direct() {
        let dir = data_dir();
        let catalog = PackageCatalog::from_dir(dir.path());
        catalog.include_from_source(DOCUMENT);
        let packages = catalog.packages_included("latex");
        assert_eq!(
            keyval_candidates(&catalog, "begin", Some("minipage"), 1, &packages),
            vec!["t", "b"]
        );
        assert!(keyval_candidates(&catalog, "nosuchcmd", None, 0, &packages).is_empty());
    }
}

mod package_and_class_options {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_usepackage_bypasses_argument_index() {
        let dir = data_dir();
        let completer = completer(&dir, CompletionConfig::default());
        let line = r"\usepackage[]{tikz}";
        let items = completer.complete(&CompletionContext::new(line, 12, "latex"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "external");
        assert_eq!(items[0].kind, CompletionItemKind::Constant);
        assert_eq!(items[0].insert_text, "external");
    }

    #[test]
    fn test_standard_classes_share_document_data() {
        let dir = data_dir();
        let completer = completer(&dir, CompletionConfig::default());
        for class in ["article", "report", "book"] {
            let line = format!("\\documentclass[]{{{}}}", class);
            let items = completer.complete(&CompletionContext::new(line, 15, "latex"));
            let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
            assert_eq!(labels, vec!["a4paper", "11pt", "twocolumn"]);
        }
    }

    #[test]
    fn test_other_class_uses_class_data() {
        let dir = data_dir();
        let completer = completer(&dir, CompletionConfig::default());
        let line = r"\documentclass[]{beamer}";
        let items = completer.complete(&CompletionContext::new(line, 15, "latex"));
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["handout", "aspectratio=${1:ratio}"]);
    }

    #[test]
    fn test_argument_hints_can_be_stripped() {
        let dir = data_dir();
        let completer = completer(
            &dir,
            CompletionConfig {
                argument_hint: false,
            },
        );
        let line = r"\documentclass[]{beamer}";
        let items = completer.complete(&CompletionContext::new(line, 15, "latex"));
        assert_eq!(items[1].label, "aspectratio=${1:ratio}");
        assert_eq!(items[1].insert_text, "aspectratio=${1}");
    }
}

mod invocation_parsing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_only_open_groups_produce_invocations() {
        assert!(ArgumentInvocation::from_line_prefix(r"\section{Intro} text").is_none());
        let inv = ArgumentInvocation::from_line_prefix(r"\usepackage[draft,").unwrap();
        assert_eq!(inv.command, "usepackage");
        assert_eq!(inv.arguments, "[draft,");
    }
}
