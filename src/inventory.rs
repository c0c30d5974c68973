//! Structural inventory — named declarations with normalized signatures
//!
//! Parses a source text into a flat list of functions and classes. Languages
//! with a registered grammar get a tree-sitter AST walk; everything else
//! falls back to line-pattern heuristics. Parse failure is a distinct
//! status, never an empty "no declarations" result.

use std::collections::HashMap;
use std::sync::LazyLock;

use once_cell::sync::OnceCell;
use regex::Regex;
use thiserror::Error;
use tracing::warn;
use tree_sitter::StreamingIterator;

use crate::language::{BodyOpener, Language};

/// Kind of a named declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Function,
    Class,
}

/// A named, located declaration with its normalized signature
#[derive(Debug, Clone, serde::Serialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// 1-based source line of the declaration
    pub line: u32,
    /// Whitespace- and comment-insensitive signature (see [`normalize_signature`])
    pub signature: String,
}

/// How the inventory was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    /// Full grammar parse
    Ast,
    /// Line-pattern fallback (no grammar for the extension)
    Heuristic,
    /// Grammar available but the text could not be parsed.
    /// The declaration list is empty, not fabricated.
    Failed,
}

/// Result of one structural scan
#[derive(Debug, Clone, serde::Serialize)]
pub struct Inventory {
    pub status: ParseStatus,
    pub decls: Vec<Declaration>,
}

impl Inventory {
    /// All declarations with the given name, in document order
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Declaration> + 'a {
        self.decls.iter().filter(move |d| d.name == name)
    }
}

/// Errors from the AST parsing path (absorbed into `ParseStatus::Failed`)
#[derive(Error, Debug)]
enum ParseError {
    #[error("Failed to compile declaration query for {0}: {1}")]
    QueryCompile(Language, String),
    #[error("Failed to load grammar for {0}: {1}")]
    Grammar(Language, String),
    #[error("Parser produced no tree")]
    NoTree,
    #[error("Source did not parse as {0}")]
    Syntax(Language),
}

/// Structural scanner with lazily compiled per-language queries
pub struct StructuralInventory {
    /// Compiled on first use, one per registered language
    queries: HashMap<Language, OnceCell<tree_sitter::Query>>,
}

impl StructuralInventory {
    /// Create a scanner (queries are compiled lazily on first use)
    pub fn new() -> Self {
        let mut queries = HashMap::new();
        #[cfg(feature = "lang-typescript")]
        queries.insert(Language::TypeScript, OnceCell::new());
        #[cfg(feature = "lang-javascript")]
        queries.insert(Language::JavaScript, OnceCell::new());
        #[cfg(feature = "lang-python")]
        queries.insert(Language::Python, OnceCell::new());
        #[cfg(feature = "lang-rust")]
        queries.insert(Language::Rust, OnceCell::new());
        Self { queries }
    }

    /// Scan a source text into an inventory.
    ///
    /// `language` selects the AST path; `None` (unrecognized extension)
    /// selects the heuristic path.
    pub fn scan(&self, text: &str, language: Option<Language>) -> Inventory {
        let Some(language) = language else {
            return Inventory {
                status: ParseStatus::Heuristic,
                decls: scan_heuristic(text),
            };
        };

        match self.scan_ast(text, language) {
            Ok(decls) => Inventory {
                status: ParseStatus::Ast,
                decls,
            },
            Err(e) => {
                warn!(error = %e, language = %language, "Structural parse failed");
                Inventory {
                    status: ParseStatus::Failed,
                    decls: Vec::new(),
                }
            }
        }
    }

    /// Get or compile the declaration query for a language
    fn get_query(&self, language: Language) -> Result<&tree_sitter::Query, ParseError> {
        let cell = self
            .queries
            .get(&language)
            .ok_or_else(|| ParseError::Grammar(language, "not registered".into()))?;

        cell.get_or_try_init(|| {
            let grammar = language.grammar();
            tree_sitter::Query::new(&grammar, language.decl_query())
                .map_err(|e| ParseError::QueryCompile(language, format!("{:?}", e)))
        })
    }

    fn scan_ast(&self, text: &str, language: Language) -> Result<Vec<Declaration>, ParseError> {
        let grammar = language.grammar();
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| ParseError::Grammar(language, format!("{:?}", e)))?;

        let tree = parser.parse(text, None).ok_or(ParseError::NoTree)?;
        let query = self.get_query(language)?;

        let name_idx = query.capture_index_for_name("name");
        let function_idx = query.capture_index_for_name("function");
        let class_idx = query.capture_index_for_name("class");

        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(query, tree.root_node(), text.as_bytes());

        let opener = language.def().body_opener;
        let mut decls = Vec::new();

        while let Some(m) = matches.next() {
            let decl_node = m.captures.iter().find_map(|c| {
                if Some(c.index) == function_idx {
                    Some((c.node, DeclKind::Function))
                } else if Some(c.index) == class_idx {
                    Some((c.node, DeclKind::Class))
                } else {
                    None
                }
            });
            let name_node = m
                .captures
                .iter()
                .find(|c| Some(c.index) == name_idx)
                .map(|c| c.node);

            let (Some((node, kind)), Some(name_node)) = (decl_node, name_node) else {
                continue;
            };

            let name = text[name_node.byte_range()].trim().to_string();
            if name.is_empty() {
                continue;
            }

            let decl_text = &text[node.byte_range()];
            let signature = extract_signature(decl_text, &name, opener);

            decls.push(Declaration {
                name,
                kind,
                line: node.start_position().row as u32 + 1,
                signature,
            });
        }

        // A tree full of errors that produced nothing from non-trivial text
        // is a failed parse, not an empty file.
        if decls.is_empty() && tree.root_node().has_error() && !text.trim().is_empty() {
            return Err(ParseError::Syntax(language));
        }

        Ok(decls)
    }
}

impl Default for StructuralInventory {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Heuristic fallback ──────────────────────────────────────────────────────

struct LinePattern {
    regex: &'static LazyLock<Regex>,
    kind: DeclKind,
    opener: BodyOpener,
}

static FUNCTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s+(\w+)")
        .expect("hardcoded declaration regex")
});
static ASSIGNED_FN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:function\b|\()")
        .expect("hardcoded declaration regex")
});
static CLASS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)")
        .expect("hardcoded declaration regex")
});
static DEF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:async\s+)?def\s+(\w+)").expect("hardcoded declaration regex")
});
static FN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+(\w+)")
        .expect("hardcoded declaration regex")
});
static TYPE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum)\s+(\w+)")
        .expect("hardcoded declaration regex")
});

static LINE_PATTERNS: LazyLock<Vec<LinePattern>> = LazyLock::new(|| {
    vec![
        LinePattern {
            regex: &FUNCTION_LINE,
            kind: DeclKind::Function,
            opener: BodyOpener::Brace,
        },
        LinePattern {
            regex: &ASSIGNED_FN_LINE,
            kind: DeclKind::Function,
            opener: BodyOpener::Brace,
        },
        LinePattern {
            regex: &CLASS_LINE,
            kind: DeclKind::Class,
            opener: BodyOpener::Brace,
        },
        LinePattern {
            regex: &DEF_LINE,
            kind: DeclKind::Function,
            opener: BodyOpener::Colon,
        },
        LinePattern {
            regex: &FN_LINE,
            kind: DeclKind::Function,
            opener: BodyOpener::Brace,
        },
        LinePattern {
            regex: &TYPE_LINE,
            kind: DeclKind::Class,
            opener: BodyOpener::Brace,
        },
    ]
});

/// Max lines a declaration head may span before we give up on its signature
const MAX_HEAD_LINES: usize = 20;

/// Line-pattern scan for languages without a grammar
fn scan_heuristic(text: &str) -> Vec<Declaration> {
    let lines: Vec<&str> = text.lines().collect();
    let mut decls = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        for pattern in LINE_PATTERNS.iter() {
            let Some(caps) = pattern.regex.captures(line) else {
                continue;
            };
            let name = caps[1].to_string();
            let head_end = (i + MAX_HEAD_LINES).min(lines.len());
            let head_text = lines[i..head_end].join("\n");
            let signature = extract_signature(&head_text, &name, pattern.opener);

            decls.push(Declaration {
                name,
                kind: pattern.kind,
                line: i as u32 + 1,
                signature,
            });
            break;
        }
    }

    decls
}

// ─── Signature normalization ─────────────────────────────────────────────────

/// Extract and normalize the signature of a declaration whose text starts
/// at the declaration keyword (or at the assigned function value).
///
/// The signature is the parameter list plus the return type annotation if
/// present. Parameter names are erased for annotated parameters, so a
/// rename without a type change compares equal.
pub fn extract_signature(decl_text: &str, name: &str, opener: BodyOpener) -> String {
    let head = head_of(decl_text, opener);
    let head = after_name(head, name);
    normalize_signature(head)
}

/// Cut the declaration head at its body opener, bracket-depth aware.
///
/// The opener only counts at depth zero, so a `:` inside a parameter list
/// or a `=>` in a default-value closure never ends the head early.
fn head_of(text: &str, opener: BodyOpener) -> &str {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0usize;
    let mut seen_paren = false;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            b'{' => {
                if depth == 0 && opener == BodyOpener::Brace {
                    return &text[..i];
                }
                depth += 1;
            }
            b'}' => depth -= 1,
            b':' => {
                // Python bodies start at `:` outside brackets, but only after
                // the parameter list — `def f(a: int) -> int:` has annotation
                // colons inside parens and the return arrow's colon at depth 0.
                if depth == 0 && opener == BodyOpener::Colon && seen_paren {
                    return &text[..i];
                }
            }
            b'=' => {
                // Arrow bodies: `(a, b) => …` and the paren-less `x => …`
                if depth == 0 && opener == BodyOpener::Brace && bytes.get(i + 1) == Some(&b'>') {
                    return &text[..i];
                }
            }
            _ => {}
        }
        if c == b'(' {
            seen_paren = true;
        }
        i += 1;
    }
    text
}

/// Drop everything up to and including the declared name, when present.
///
/// Arrow and function-expression nodes start at the value, not the name,
/// so the name may legitimately be absent — the head is then already the
/// parameter list.
fn after_name<'a>(head: &'a str, name: &str) -> &'a str {
    let bytes = head.as_bytes();
    let mut search_from = 0usize;
    while let Some(pos) = head[search_from..].find(name) {
        let start = search_from + pos;
        let end = start + name.len();
        let left_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let right_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if left_ok && right_ok {
            return &head[end..];
        }
        search_from = end;
    }
    head
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//[^\n]*|#[^\n]*").expect("hardcoded comment regex"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("hardcoded comment regex"));

/// Reduce a raw signature to a whitespace- and comment-insensitive
/// canonical string for equality comparison.
///
/// `(a: number, b?: string): boolean` becomes `(number, string): boolean`;
/// untyped parameters keep their name since the name is the only identity
/// they have.
pub fn normalize_signature(raw: &str) -> String {
    let no_block = BLOCK_COMMENT.replace_all(raw, " ");
    let no_comments = LINE_COMMENT.replace_all(&no_block, " ");
    let text = no_comments.trim();

    let Some(open) = text.find('(') else {
        // Class heads and other paren-less signatures: collapse whitespace only
        return collapse_ws(text);
    };
    let Some(close) = matching_paren(text, open) else {
        return collapse_ws(text);
    };

    let params: Vec<String> = split_top_level(&text[open + 1..close])
        .into_iter()
        .map(normalize_param)
        .filter(|p| !p.is_empty())
        .collect();

    let ret = text[close + 1..]
        .trim()
        .trim_start_matches("->")
        .trim_start_matches(':')
        .trim();

    // Anything before the parameter list (generics, modifiers) still counts
    let prefix = collapse_ws(&text[..open]);

    let mut out = String::new();
    if !prefix.is_empty() {
        out.push_str(&prefix);
    }
    out.push('(');
    out.push_str(&params.join(", "));
    out.push(')');
    if !ret.is_empty() {
        out.push_str(": ");
        out.push_str(&collapse_ws(ret));
    }
    out
}

/// Reduce one parameter to its type annotation when it has one
fn normalize_param(param: &str) -> String {
    let param = param.trim();
    // Strip default values first: `a: number = 3` → `a: number`
    let no_default = match find_top_level(param, b'=') {
        Some(pos) if param.as_bytes().get(pos + 1) != Some(&b'=') => param[..pos].trim(),
        _ => param,
    };
    match find_top_level(no_default, b':') {
        Some(pos) => collapse_ws(no_default[pos + 1..].trim()),
        None => collapse_ws(no_default),
    }
}

/// Position of the first `needle` byte at bracket depth zero.
///
/// `>` only counts as a closer when it is a generic's — the `=>` and `->`
/// arrows must not unbalance the depth.
fn find_top_level(text: &str, needle: u8) -> Option<usize> {
    let mut depth = 0i32;
    let mut prev = 0u8;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b'>' if prev == b'=' || prev == b'-' => {}
            b')' | b']' | b'}' | b'>' => depth -= 1,
            _ if b == needle && depth == 0 => return Some(i),
            _ => {}
        }
        prev = b;
    }
    None
}

/// Index of the `)` matching the `(` at `open`
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas at bracket depth zero (same arrow-aware depth rules as
/// [`find_top_level`])
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut prev = 0u8;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b'>' if prev == b'=' || prev == b'-' => {}
            b')' | b']' | b'}' | b'>' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        prev = b;
    }
    if start < text.len() || !parts.is_empty() {
        parts.push(&text[start..]);
    } else if !text.trim().is_empty() {
        parts.push(text);
    }
    parts
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_erases_typed_param_names() {
        let a = normalize_signature("(a: number, b: string): boolean");
        let b = normalize_signature("(x: number, y: string): boolean");
        assert_eq!(a, b);
        assert_eq!(a, "(number, string): boolean");
    }

    #[test]
    fn test_normalize_keeps_param_count() {
        let one = normalize_signature("(a: number)");
        let two = normalize_signature("(a: number, b: string)");
        assert_ne!(one, two);
    }

    #[test]
    fn test_normalize_sees_type_changes() {
        assert_ne!(
            normalize_signature("(a: number)"),
            normalize_signature("(a: string)")
        );
    }

    #[test]
    fn test_normalize_sees_return_changes() {
        assert_ne!(
            normalize_signature("(a: number): number"),
            normalize_signature("(a: number): string")
        );
    }

    #[test]
    fn test_normalize_whitespace_insensitive() {
        assert_eq!(
            normalize_signature("(a:number,b:string)"),
            normalize_signature("( a : number , b : string )")
        );
    }

    #[test]
    fn test_normalize_strips_comments() {
        assert_eq!(
            normalize_signature("(a: number /* the count */, b: string)"),
            normalize_signature("(a: number, b: string)")
        );
    }

    #[test]
    fn test_normalize_default_values_ignored() {
        assert_eq!(
            normalize_signature("(a: number = 3)"),
            normalize_signature("(b: number)")
        );
    }

    #[test]
    fn test_normalize_untyped_params_keep_names() {
        assert_ne!(normalize_signature("(a, b)"), normalize_signature("(x, b)"));
    }

    #[test]
    fn test_normalize_rust_arrow_return() {
        assert_eq!(
            normalize_signature("(a: i32) -> Vec<u8>"),
            "(i32): Vec<u8>"
        );
    }

    #[test]
    fn test_normalize_classes_without_parens() {
        assert_eq!(normalize_signature(" extends  Base "), "extends Base");
    }

    #[test]
    fn test_head_of_stops_at_brace() {
        let head = head_of("function add(a: number) { return a; }", BodyOpener::Brace);
        assert_eq!(head.trim(), "function add(a: number)");
    }

    #[test]
    fn test_head_of_python_annotation_colons() {
        let head = head_of("def f(a: int, b: dict) -> int: return 1", BodyOpener::Colon);
        assert_eq!(head.trim(), "def f(a: int, b: dict) -> int");
    }

    #[test]
    fn test_head_of_arrow_function() {
        let head = head_of("(a: number, b: number) => a + b", BodyOpener::Brace);
        assert_eq!(head.trim(), "(a: number, b: number)");
    }

    #[test]
    fn test_head_of_default_value_closure() {
        // The `=>` inside the parens must not end the head
        let head = head_of("function f(cb = () => 1): void {}", BodyOpener::Brace);
        assert_eq!(head.trim(), "function f(cb = () => 1): void");
    }

    #[test]
    fn test_extract_signature_function() {
        let sig = extract_signature(
            "function add(a: number, b: number): number {\n  return a + b;\n}",
            "add",
            BodyOpener::Brace,
        );
        assert_eq!(sig, "(number, number): number");
    }

    #[test]
    fn test_extract_signature_name_not_prefix_matched() {
        // `add` must match as a whole identifier, not inside `madden`
        let sig = extract_signature(
            "function madden(add: number): void {}",
            "madden",
            BodyOpener::Brace,
        );
        assert_eq!(sig, "(number): void");
    }

    #[test]
    fn test_scan_heuristic_finds_declarations() {
        let text = "\
function alpha(a, b) {\n  return a + b;\n}\n\nclass Beta {\n}\n\nconst gamma = (x) => x * 2;\n";
        let decls = scan_heuristic(text);
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Beta", "gamma"]);
        assert_eq!(decls[0].kind, DeclKind::Function);
        assert_eq!(decls[1].kind, DeclKind::Class);
        assert_eq!(decls[0].line, 1);
        assert_eq!(decls[1].line, 5);
    }

    #[test]
    fn test_scan_heuristic_python() {
        let decls = scan_heuristic("def handler(event: dict) -> None:\n    pass\n");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "handler");
        assert_eq!(decls[0].signature, "(dict): None");
    }

    #[cfg(feature = "lang-typescript")]
    mod ast {
        use super::super::*;

        #[test]
        fn test_scan_typescript_declarations() {
            let scanner = StructuralInventory::new();
            let text = "\
export function add(a: number, b: number): number {\n  return a + b;\n}\n\nconst double = (x: number): number => x * 2;\n\nexport class Calculator {\n  total = 0;\n}\n";
            let inv = scanner.scan(text, Some(Language::TypeScript));
            assert_eq!(inv.status, ParseStatus::Ast);

            let names: Vec<&str> = inv.decls.iter().map(|d| d.name.as_str()).collect();
            assert!(names.contains(&"add"));
            assert!(names.contains(&"double"));
            assert!(names.contains(&"Calculator"));

            let add = inv.named("add").next().unwrap();
            assert_eq!(add.kind, DeclKind::Function);
            assert_eq!(add.line, 1);
            assert_eq!(add.signature, "(number, number): number");

            let double = inv.named("double").next().unwrap();
            assert_eq!(double.signature, "(number): number");

            let class = inv.named("Calculator").next().unwrap();
            assert_eq!(class.kind, DeclKind::Class);
        }

        #[test]
        fn test_scan_param_rename_same_signature() {
            let scanner = StructuralInventory::new();
            let before = scanner.scan(
                "function f(a: number): number { return a; }",
                Some(Language::TypeScript),
            );
            let after = scanner.scan(
                "function f(x: number): number { return x; }",
                Some(Language::TypeScript),
            );
            assert_eq!(
                before.named("f").next().unwrap().signature,
                after.named("f").next().unwrap().signature
            );
        }

        #[test]
        fn test_scan_garbage_is_failed_not_empty() {
            let scanner = StructuralInventory::new();
            let inv = scanner.scan("%%%% ((( not typescript ]]]", Some(Language::TypeScript));
            assert_eq!(inv.status, ParseStatus::Failed);
            assert!(inv.decls.is_empty());
        }

        #[test]
        fn test_scan_empty_text_is_ok() {
            let scanner = StructuralInventory::new();
            let inv = scanner.scan("", Some(Language::TypeScript));
            assert_eq!(inv.status, ParseStatus::Ast);
            assert!(inv.decls.is_empty());
        }
    }
}
