pub mod keywords;
pub mod line_collapser;
pub mod tokenizer;

pub mod ast;
pub mod classifier;
pub mod error;
pub mod term_reducer;

pub mod declarations_block;
pub mod expression_file;

pub use ast::{Arena, Element, ElementId, ElementKind};
pub use error::{CollapseError, ParseError};
pub use expression_file::{DeclarationRegistry, ExpressionFile, parse_file, parse_file_with};
pub use keywords::Keywords;
