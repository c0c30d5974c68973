//! Language registry for structural parsing
//!
//! Each supported language carries a tree-sitter grammar and a declaration
//! query that captures named functions and classes (or their nearest
//! equivalents). Languages are registered at compile time based on
//! feature flags; files with unregistered extensions fall back to the
//! line-pattern heuristics in [`crate::inventory`].
//!
//! # Feature Flags
//!
//! - `lang-typescript` - TypeScript support (enabled by default)
//! - `lang-javascript` - JavaScript support (enabled by default)
//! - `lang-python` - Python support (enabled by default)
//! - `lang-rust` - Rust support (enabled by default)
//! - `lang-all` - All languages

use std::collections::HashMap;
use std::sync::LazyLock;

#[cfg(feature = "lang-javascript")]
mod javascript;
#[cfg(feature = "lang-python")]
mod python;
#[cfg(feature = "lang-rust")]
mod rust;
#[cfg(feature = "lang-typescript")]
mod typescript;

/// A language definition with parsing configuration
pub struct LanguageDef {
    /// Language name (e.g., "typescript", "python")
    pub name: &'static str,
    /// Function to get the tree-sitter grammar
    pub grammar: fn() -> tree_sitter::Language,
    /// File extensions for this language
    pub extensions: &'static [&'static str],
    /// Tree-sitter query capturing named declarations (`@name` + `@function`/`@class`)
    pub decl_query: &'static str,
    /// Where a declaration head ends and its body begins
    pub body_opener: BodyOpener,
}

/// Token that separates a declaration head from its body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyOpener {
    /// Body starts at `{` or `=>` outside parens (TypeScript, JavaScript, Rust)
    #[default]
    Brace,
    /// Body starts at `:` outside parens (Python)
    Colon,
}

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// TypeScript (.ts, .tsx files)
    TypeScript,
    /// JavaScript (.js, .jsx, .mjs, .cjs files)
    JavaScript,
    /// Python (.py, .pyi files)
    Python,
    /// Rust (.rs files)
    Rust,
}

impl Language {
    /// Get the language definition from the registry
    pub fn def(&self) -> &'static LanguageDef {
        REGISTRY
            .get(&self.to_string())
            .expect("language not in registry — check feature flags")
    }

    /// Look up a language by file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        REGISTRY
            .from_extension(ext)
            .and_then(|def| def.name.parse().ok())
    }

    /// Get the tree-sitter grammar for this language
    pub fn grammar(&self) -> tree_sitter::Language {
        (self.def().grammar)()
    }

    /// Get the declaration extraction query pattern
    pub fn decl_query(&self) -> &'static str {
        self.def().decl_query
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::TypeScript => write!(f, "typescript"),
            Language::JavaScript => write!(f, "javascript"),
            Language::Python => write!(f, "python"),
            Language::Rust => write!(f, "rust"),
        }
    }
}

/// Error returned when parsing an invalid Language string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError {
    /// The invalid input string
    pub input: String,
}

impl std::fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unknown language: '{}'. Valid options: typescript, javascript, python, rust",
            self.input
        )
    }
}

impl std::error::Error for ParseLanguageError {}

impl std::str::FromStr for Language {
    type Err = ParseLanguageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "typescript" => Ok(Language::TypeScript),
            "javascript" => Ok(Language::JavaScript),
            "python" => Ok(Language::Python),
            "rust" => Ok(Language::Rust),
            _ => Err(ParseLanguageError {
                input: s.to_string(),
            }),
        }
    }
}

/// Global language registry, built once from enabled feature flags
pub static REGISTRY: LazyLock<LanguageRegistry> = LazyLock::new(LanguageRegistry::new);

/// Registry of all supported languages
pub struct LanguageRegistry {
    /// Languages indexed by name
    by_name: HashMap<&'static str, &'static LanguageDef>,
    /// Languages indexed by extension
    by_extension: HashMap<&'static str, &'static LanguageDef>,
}

impl LanguageRegistry {
    /// Create a new registry with all enabled languages
    fn new() -> Self {
        let mut reg = Self {
            by_name: HashMap::new(),
            by_extension: HashMap::new(),
        };

        #[cfg(feature = "lang-typescript")]
        reg.register(typescript::definition());
        #[cfg(feature = "lang-javascript")]
        reg.register(javascript::definition());
        #[cfg(feature = "lang-python")]
        reg.register(python::definition());
        #[cfg(feature = "lang-rust")]
        reg.register(rust::definition());

        reg
    }

    fn register(&mut self, def: &'static LanguageDef) {
        self.by_name.insert(def.name, def);
        for ext in def.extensions {
            self.by_extension.insert(ext, def);
        }
    }

    /// Look up a language definition by name
    pub fn get(&self, name: &str) -> Option<&'static LanguageDef> {
        self.by_name.get(name).copied()
    }

    /// Look up a language definition by file extension
    pub fn from_extension(&self, ext: &str) -> Option<&'static LanguageDef> {
        self.by_extension.get(ext).copied()
    }

    /// All registered extensions
    pub fn supported_extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_extension.keys().copied()
    }
}

/// Helper to detect language from a file path's extension
pub fn language_from_path(path: &std::path::Path) -> Option<Language> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(Language::from_extension)
}
