//! Semantic diff between baseline and current declarations
//!
//! Answers "did the contract change", not "did anything change". A symbol
//! counts as changed when it was removed or its normalized signature
//! differs; body-only edits and brand-new symbols never count — new code
//! cannot have broken an existing caller yet.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::inventory::{extract_signature, DeclKind, Inventory};
use crate::language::BodyOpener;

/// Symbols whose presence or signature actually changed
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ChangeSet {
    /// Changed or removed functions, sorted
    pub functions: BTreeSet<String>,
    /// Changed or removed classes, sorted
    pub classes: BTreeSet<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.classes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.functions.len() + self.classes.len()
    }

    /// All changed symbol names, functions then classes
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .chain(self.classes.iter())
            .map(String::as_str)
    }
}

/// Compute the change set between two versions of one file.
///
/// Signatures are re-extracted from each full text independently rather
/// than trusting the inventories' cached strings, so multiple same-named
/// overload-like definitions compare as a group.
pub fn semantic_diff(
    before_text: &str,
    after_text: &str,
    before: &Inventory,
    after: &Inventory,
) -> ChangeSet {
    // Cheapest and most common outcome: nothing to do
    if before_text == after_text {
        return ChangeSet::default();
    }

    let mut changed = ChangeSet::default();

    for kind in [DeclKind::Function, DeclKind::Class] {
        let before_names: BTreeSet<&str> = names_of(before, kind).collect();
        let after_names: BTreeSet<&str> = names_of(after, kind).collect();

        for &name in &before_names {
            // Removed entirely
            if !after_names.contains(name) {
                insert(&mut changed, kind, name);
                continue;
            }

            let sigs_before = signatures_in_text(before_text, name, kind, before);
            let sigs_after = signatures_in_text(after_text, name, kind, after);
            if sigs_before != sigs_after {
                insert(&mut changed, kind, name);
            }
        }
        // Names only in `after` are deliberately ignored
    }

    changed
}

fn names_of(inv: &Inventory, kind: DeclKind) -> impl Iterator<Item = &str> {
    inv.decls
        .iter()
        .filter(move |d| d.kind == kind)
        .map(|d| d.name.as_str())
}

fn insert(changed: &mut ChangeSet, kind: DeclKind, name: &str) {
    match kind {
        DeclKind::Function => changed.functions.insert(name.to_string()),
        DeclKind::Class => changed.classes.insert(name.to_string()),
    };
}

/// Max lines a declaration head may span when re-extracting from raw text
const MAX_HEAD_LINES: usize = 20;

/// All normalized signatures for `name` in document order, extracted from
/// the raw text. Falls back to the inventory's cached signatures when the
/// textual patterns find nothing (unusual formatting).
fn signatures_in_text(text: &str, name: &str, kind: DeclKind, inv: &Inventory) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut sigs = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let opener = match kind {
            DeclKind::Function => match function_definition_opener(line, name) {
                Some(opener) => opener,
                None => continue,
            },
            DeclKind::Class => {
                if !class_definition_re(name).is_match(line) {
                    continue;
                }
                BodyOpener::Brace
            }
        };
        let head_end = (i + MAX_HEAD_LINES).min(lines.len());
        let head_text = lines[i..head_end].join("\n");
        sigs.push(extract_signature(&head_text, name, opener));
    }

    if sigs.is_empty() {
        sigs = inv
            .named(name)
            .filter(|d| d.kind == kind)
            .map(|d| d.signature.clone())
            .collect();
    }
    sigs
}

static DEF_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdef\s+\w").expect("hardcoded definition regex"));

/// Does this line start a function definition for `name`? Returns the body
/// opener implied by the matching form.
fn function_definition_opener(line: &str, name: &str) -> Option<BodyOpener> {
    if !function_definition_re(name).is_match(line) {
        return None;
    }
    if DEF_KEYWORD.is_match(line) {
        Some(BodyOpener::Colon)
    } else {
        Some(BodyOpener::Brace)
    }
}

fn function_definition_re(name: &str) -> Regex {
    let n = regex::escape(name);
    Regex::new(&format!(
        r"(?:\bfunction\s+{n}\s*[(<])|(?:\b(?:const|let|var)\s+{n}\s*=\s*(?:async\s+)?(?:function\b|\())|(?:\bdef\s+{n}\s*\()|(?:\bfn\s+{n}\s*[(<])"
    ))
    .expect("definition regex from escaped name")
}

fn class_definition_re(name: &str) -> Regex {
    let n = regex::escape(name);
    Regex::new(&format!(
        r"(?:\bclass\s+{n}\b)|(?:\b(?:struct|enum)\s+{n}\b)"
    ))
    .expect("definition regex from escaped name")
}

/// Whether this line is a definition of `name` (any declaration form).
///
/// Used by the dependency scanner to tell a symbol's own definition apart
/// from a reference to it.
pub(crate) fn is_definition_line(line: &str, name: &str) -> bool {
    function_definition_re(name).is_match(line) || class_definition_re(name).is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StructuralInventory;

    fn inv(text: &str) -> Inventory {
        // Heuristic scan keeps these tests independent of grammar features
        StructuralInventory::new().scan(text, None)
    }

    fn diff(before: &str, after: &str) -> ChangeSet {
        semantic_diff(before, after, &inv(before), &inv(after))
    }

    #[test]
    fn test_identical_texts_fast_path() {
        let text = "function add(a: number): number { return a; }\n";
        assert!(diff(text, text).is_empty());
    }

    #[test]
    fn test_body_only_edit_is_not_a_change() {
        let before = "function add(a: number, b: number): number {\n  return a + b;\n}\n";
        let after = "function add(a: number, b: number): number {\n  const sum = a + b;\n  return sum;\n}\n";
        assert!(diff(before, after).is_empty());
    }

    #[test]
    fn test_trailing_blank_line_is_not_a_change() {
        let before = "export function add(a: number, b: number): number {\n  return a + b;\n}\n";
        let after = "export function add(a: number, b: number): number {\n  return a + b;\n\n}\n";
        assert!(diff(before, after).is_empty());
    }

    #[test]
    fn test_param_rename_is_not_a_change() {
        let before = "function f(a: number): number { return a; }\n";
        let after = "function f(x: number): number { return x; }\n";
        assert!(diff(before, after).is_empty());
    }

    #[test]
    fn test_added_param_is_a_change() {
        let before = "function add(a: number, b: number): number { return a + b; }\n";
        let after =
            "function add(a: number, b: number, c: number): number { return a + b + c; }\n";
        let changed = diff(before, after);
        assert!(changed.functions.contains("add"));
    }

    #[test]
    fn test_type_change_is_a_change() {
        let before = "function f(a: number): number { return a; }\n";
        let after = "function f(a: string): number { return 0; }\n";
        assert!(diff(before, after).functions.contains("f"));
    }

    #[test]
    fn test_return_type_change_is_a_change() {
        let before = "function f(a: number): number { return a; }\n";
        let after = "function f(a: number): string { return String(a); }\n";
        assert!(diff(before, after).functions.contains("f"));
    }

    #[test]
    fn test_removed_function_is_a_change() {
        let before = "function gone(a: number): number { return a; }\n";
        let after = "// nothing left\n";
        assert!(diff(before, after).functions.contains("gone"));
    }

    #[test]
    fn test_added_function_is_ignored() {
        let before = "function keep(): void {}\n";
        let after = "function keep(): void {}\nfunction fresh(a: number): number { return a; }\n";
        assert!(diff(before, after).is_empty());
    }

    #[test]
    fn test_class_removal_lands_in_classes() {
        let before = "class Widget {\n}\n";
        let after = "\n";
        let changed = diff(before, after);
        assert!(changed.classes.contains("Widget"));
        assert!(changed.functions.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let before = "function f(a: number): number { return a; }\n";
        let after = "function f(a: number, b: string): number { return a; }\n";
        assert_eq!(diff(before, after), diff(before, after));
    }

    #[test]
    fn test_is_definition_line() {
        assert!(is_definition_line("export function add(a, b) {", "add"));
        assert!(is_definition_line("const add = (a, b) => a + b;", "add"));
        assert!(is_definition_line("def add(a, b):", "add"));
        assert!(is_definition_line("pub fn add(a: i32) -> i32 {", "add"));
        assert!(is_definition_line("class Adder {", "Adder"));
        assert!(!is_definition_line("const total = add(1, 2);", "add"));
        assert!(!is_definition_line("import { add } from './math';", "add"));
    }

    #[test]
    fn test_overloads_compared_as_group() {
        // Two same-named overload-like definitions: changing the second one
        // must register even though the first is untouched
        let before = "\
function pick(a: number): number { return a; }\nfunction pick(a: string): string { return a; }\n";
        let after = "\
function pick(a: number): number { return a; }\nfunction pick(a: boolean): boolean { return a; }\n";
        assert!(diff(before, after).functions.contains("pick"));
    }
}
