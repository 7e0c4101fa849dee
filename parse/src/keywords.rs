/// Keyword tables of the source language.
///
/// Built once and handed to the tokenizer and the classifier, so a caller can
/// teach the compiler extra function names without touching global state.
#[derive(Debug, Clone, PartialEq)]
pub struct Keywords {
    /// Function names that bind the element following them, e.g. `sqrt x`.
    pub unary_functions: Vec<String>,
    /// Symbols that only ever take two operands.
    pub binary_operators: Vec<char>,
    /// Symbols that are binary in infix position and prefix signs otherwise.
    pub dual_purpose_operators: Vec<char>,
}

pub const ASSIGNMENT: char = '=';
pub const OPEN_PARENTHESIS: char = '(';
pub const CLOSE_PARENTHESIS: char = ')';
pub const OPEN_BRACKET: char = '[';
pub const CLOSE_BRACKET: char = ']';
pub const STATEMENT_SEPARATOR: char = ';';
pub const ANONYMOUS_FUNCTION: char = '@';
pub const ARGUMENT_SEPARATOR: char = ',';

const STRUCTURAL: [char; 8] = [
    ASSIGNMENT,
    OPEN_PARENTHESIS,
    CLOSE_PARENTHESIS,
    OPEN_BRACKET,
    CLOSE_BRACKET,
    STATEMENT_SEPARATOR,
    ANONYMOUS_FUNCTION,
    ARGUMENT_SEPARATOR,
];

impl Default for Keywords {
    fn default() -> Self {
        Self {
            unary_functions: [
                "abs", "acos", "sin", "cos", "cot", "tan", "atan", "sqrt", "log", "log10", "log2",
            ]
            .map(String::from)
            .to_vec(),
            binary_operators: vec!['*', '^', '/'],
            dual_purpose_operators: vec!['+', '-'],
        }
    }
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

impl Keywords {
    pub fn is_unary_function(&self, token: &str) -> bool {
        self.unary_functions.iter().any(|name| name == token)
    }

    pub fn is_binary_operator(&self, token: &str) -> bool {
        single_char(token).is_some_and(|c| {
            self.binary_operators.contains(&c) || self.dual_purpose_operators.contains(&c)
        })
    }

    pub fn is_dual_purpose_operator(&self, token: &str) -> bool {
        single_char(token).is_some_and(|c| self.dual_purpose_operators.contains(&c))
    }

    pub fn is_operator(&self, token: &str) -> bool {
        self.is_unary_function(token) || self.is_binary_operator(token)
    }

    /// Whether a lone character survives tokenizing.
    pub fn is_keyword(&self, c: char) -> bool {
        STRUCTURAL.contains(&c)
            || self.binary_operators.contains(&c)
            || self.dual_purpose_operators.contains(&c)
    }

    /// Digits and `.` only. Whether the text is an actual number is decided
    /// by the classifier.
    pub fn is_value(&self, token: &str) -> bool {
        !token.is_empty() && token.chars().all(|c| c.is_ascii_digit() || c == '.')
    }

    pub fn is_variable(&self, token: &str) -> bool {
        !self.is_value(token) && !token.chars().any(|c| self.is_keyword(c))
    }
}
