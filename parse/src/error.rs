use std::fmt::{self, Display};

/// Why a token or a statement could not be turned into an expression.
///
/// These never abort a file: they are stored in `Error` elements next to the
/// elements that could not be reduced.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnrecognizedToken(String),
    UnmatchedParenthesis,
    UnmatchedBracket,
    MissingOperand { operator: String },
    NotReduced { remaining: usize },
    EmptyTerm,
    MissingValue,
    ExpectedParameterList,
    UnexpectedToken(String),
    UnsupportedArrayCell(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnrecognizedToken(token) => write!(f, "could not parse value '{token}'"),
            ParseError::UnmatchedParenthesis => write!(f, "could not find closing parenthesis"),
            ParseError::UnmatchedBracket => write!(f, "could not find closing bracket"),
            ParseError::MissingOperand { operator } => {
                write!(f, "operator '{operator}' is missing an operand")
            }
            ParseError::NotReduced { remaining } => write!(
                f,
                "expression could not be reduced to a single element ({remaining} left)"
            ),
            ParseError::EmptyTerm => write!(f, "expected expression, found nothing"),
            ParseError::MissingValue => write!(f, "expected value after '='"),
            ParseError::ExpectedParameterList => write!(f, "expected '(' after '@'"),
            ParseError::UnexpectedToken(token) => write!(f, "unexpected '{token}'"),
            ParseError::UnsupportedArrayCell(token) => {
                write!(f, "'{token}' is not supported inside an array literal")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Fatal input errors, reported to the caller instead of being recovered.
#[derive(Debug, Clone, PartialEq)]
pub enum CollapseError {
    /// 1-based index of the line that opened the literal.
    UnterminatedArray { line: usize },
}

impl Display for CollapseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollapseError::UnterminatedArray { line } => {
                write!(f, "array literal starting on line {line} is never closed")
            }
        }
    }
}

impl std::error::Error for CollapseError {}
