//! JavaScript language definition

use super::{BodyOpener, LanguageDef};

/// Tree-sitter query for extracting named declarations
const DECL_QUERY: &str = r#"
(function_declaration
  name: (identifier) @name) @function

;; Arrow function assigned to variable: const foo = () => {}
(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (arrow_function) @function))

(variable_declaration
  (variable_declarator
    name: (identifier) @name
    value: (arrow_function) @function))

;; Function expression assigned to variable: var foo = function () {}
(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (function_expression) @function))

(variable_declaration
  (variable_declarator
    name: (identifier) @name
    value: (function_expression) @function))

(class_declaration
  name: (identifier) @name) @class
"#;

static DEFINITION: LanguageDef = LanguageDef {
    name: "javascript",
    grammar: || tree_sitter_javascript::LANGUAGE.into(),
    extensions: &["js", "jsx", "mjs", "cjs"],
    decl_query: DECL_QUERY,
    body_opener: BodyOpener::Brace,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
