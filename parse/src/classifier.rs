use crate::{
    ast::{Arena, Delimiter, Element, ElementId, ElementKind, OperatorKind},
    error::ParseError,
    keywords::{self, Keywords},
};

/// Whether an operator following `previous` has nothing to its left to bind.
fn starts_expression(previous: Option<&ElementKind>) -> bool {
    match previous {
        None => true,
        Some(kind) => matches!(
            kind,
            ElementKind::Operator { .. }
                | ElementKind::AssignmentMarker
                | ElementKind::Parenthesis(Delimiter::Open)
                | ElementKind::Bracket(Delimiter::Open)
                | ElementKind::ArgumentSeparator
                | ElementKind::StatementSeparator
        ),
    }
}

fn classify_token(
    token: &str,
    previous: Option<&ElementKind>,
    keywords: &Keywords,
) -> Result<ElementKind, ParseError> {
    if keywords.is_operator(token) {
        let kind = if keywords.is_unary_function(token) {
            OperatorKind::Unary
        } else if starts_expression(previous) {
            OperatorKind::BinaryUsedAsUnary
        } else {
            OperatorKind::Binary
        };
        return Ok(ElementKind::Operator {
            symbol: token.into(),
            kind,
            operand1: None,
            operand2: None,
        });
    }

    if keywords.is_value(token) {
        return match token.parse::<f64>() {
            Ok(_) => Ok(ElementKind::Value(token.into())),
            Err(_) => Err(ParseError::UnrecognizedToken(token.into())),
        };
    }

    if keywords.is_variable(token) {
        return Ok(ElementKind::Variable(token.into()));
    }

    let mut chars = token.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return Err(ParseError::UnrecognizedToken(token.into()));
    };

    Ok(match c {
        keywords::ASSIGNMENT => ElementKind::AssignmentMarker,
        keywords::OPEN_BRACKET => ElementKind::Bracket(Delimiter::Open),
        keywords::CLOSE_BRACKET => ElementKind::Bracket(Delimiter::Close),
        keywords::OPEN_PARENTHESIS => ElementKind::Parenthesis(Delimiter::Open),
        keywords::CLOSE_PARENTHESIS => ElementKind::Parenthesis(Delimiter::Close),
        keywords::STATEMENT_SEPARATOR => ElementKind::StatementSeparator,
        keywords::ANONYMOUS_FUNCTION => ElementKind::AnonymousFunctionMarker,
        keywords::ARGUMENT_SEPARATOR => ElementKind::ArgumentSeparator,
        _ => return Err(ParseError::UnrecognizedToken(token.into())),
    })
}

/// Turns the tokens of one line into elements stored in `arena`.
///
/// A token that cannot be classified becomes an `Error` element in its place
/// and the remaining tokens are still classified.
pub fn classify(
    tokens: &[&str],
    keywords: &Keywords,
    line: usize,
    arena: &mut Arena,
) -> Vec<ElementId> {
    let mut elements: Vec<ElementId> = Vec::with_capacity(tokens.len());

    for &token in tokens {
        let previous = elements.last().map(|&id| &arena[id].kind);
        let kind = classify_token(token, previous, keywords).unwrap_or_else(|error| {
            log::warn!("line {line}: {error}");
            ElementKind::Error {
                error,
                children: vec![],
            }
        });
        elements.push(arena.push_and_get_key(Element::new(kind, token, line)));
    }

    elements
}
