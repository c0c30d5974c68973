//! TypeScript language definition

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

;; Function expression assigned to variable: const foo = function () {}
(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (function_expression) @function))

(variable_declaration
  (variable_declarator
    name: (identifier) @name
    value: (function_expression) @function))

(class_declaration
  name: (type_identifier) @name) @class
"#;

static DEFINITION: LanguageDef = LanguageDef {
    name: "typescript",
    grammar: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    extensions: &["ts", "tsx"],
    decl_query: DECL_QUERY,
    body_opener: BodyOpener::Brace,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
