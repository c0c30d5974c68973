//! Python language definition

use super::{BodyOpener, LanguageDef};

/// Tree-sitter query for extracting named declarations
const DECL_QUERY: &str = r#"
(function_definition
  name: (identifier) @name) @function

(class_definition
  name: (identifier) @name) @class
"#;

static DEFINITION: LanguageDef = LanguageDef {
    name: "python",
    grammar: || tree_sitter_python::LANGUAGE.into(),
    extensions: &["py", "pyi"],
    decl_query: DECL_QUERY,
    body_opener: BodyOpener::Colon,
};

pub fn definition() -> &'static LanguageDef {
    &DEFINITION
}
