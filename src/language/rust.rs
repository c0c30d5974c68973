//! Rust language definition
//!
//! Structs and enums map to the `class` declaration kind — the nearest
//! equivalent of a named type whose shape callers depend on.

use super::{BodyOpener, LanguageDef};

/// Tree-sitter query for extracting named declarations
const DECL_QUERY: &str = r#"
(function_item
  name: (identifier) @name) @function

(struct_item
  name: (type_identifier) @name) @class

(enum_item
  name: (type_identifier) @name) @class
"#;

static DEFINITION: LanguageDef = LanguageDef {
    name: "rust",
    grammar: || tree_sitter_rust::LANGUAGE.into(),
    extensions: &["rs"],
    decl_query: DECL_QUERY,
    body_opener: BodyOpener::Brace,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
