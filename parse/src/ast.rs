use derive_more::{From, Into};
use typed_index_collections::TiVec;

use crate::error::ParseError;

#[derive(Debug, Copy, Clone, From, Into, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Every element of one file. Trees reference their children by id.
pub type Arena = TiVec<ElementId, Element>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Binary,
    /// Function-like operators such as `sqrt`.
    Unary,
    /// A binary symbol in prefix position, e.g. the `-` in `-a`.
    BinaryUsedAsUnary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Unknown,
    ArrayDeclaration,
    AnonymousFunction,
}

/// One cell of an array literal, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayElement {
    pub value: ElementId,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Blank or comment-only line.
    Empty,
    /// Passed through as raw text.
    Unknown,
    Error {
        error: ParseError,
        children: Vec<ElementId>,
    },
    Value(String),
    Variable(String),
    Operator {
        symbol: String,
        kind: OperatorKind,
        operand1: Option<ElementId>,
        operand2: Option<ElementId>,
    },
    AssignmentMarker,
    Parenthesis(Delimiter),
    Bracket(Delimiter),
    StatementSeparator,
    ArgumentSeparator,
    AnonymousFunctionMarker,
    ArrayDeclaration(Vec<ArrayElement>),
    ArrayAccessor {
        name: ElementId,
        indexes: Vec<ElementId>,
    },
    AnonymousFunction {
        parameters: Vec<ElementId>,
        /// `None` only while the body is being reduced.
        body: Option<ElementId>,
    },
    FunctionCall {
        /// The called `AnonymousFunction`. Not a child: it belongs to its
        /// own declaration.
        function: ElementId,
        arguments: Vec<ElementId>,
    },
    VariableDeclaration {
        name: ElementId,
        value: ElementId,
        kind: DeclarationKind,
    },
}

impl ElementKind {
    pub fn children(&self) -> Vec<ElementId> {
        match self {
            ElementKind::Empty
            | ElementKind::Unknown
            | ElementKind::Value(_)
            | ElementKind::Variable(_)
            | ElementKind::AssignmentMarker
            | ElementKind::Parenthesis(_)
            | ElementKind::Bracket(_)
            | ElementKind::StatementSeparator
            | ElementKind::ArgumentSeparator
            | ElementKind::AnonymousFunctionMarker => vec![],
            ElementKind::Error { children, .. } => children.clone(),
            ElementKind::Operator {
                operand1, operand2, ..
            } => operand1.iter().chain(operand2).copied().collect(),
            ElementKind::ArrayDeclaration(elements) => {
                elements.iter().map(|element| element.value).collect()
            }
            ElementKind::ArrayAccessor { name, indexes } => {
                std::iter::once(*name).chain(indexes.iter().copied()).collect()
            }
            ElementKind::AnonymousFunction { parameters, body } => {
                parameters.iter().chain(body).copied().collect()
            }
            ElementKind::FunctionCall { arguments, .. } => arguments.clone(),
            ElementKind::VariableDeclaration { name, value, .. } => vec![*name, *value],
        }
    }

    /// Tokens that only guide reduction and must not survive in a finished tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ElementKind::AssignmentMarker
                | ElementKind::Parenthesis(_)
                | ElementKind::Bracket(_)
                | ElementKind::StatementSeparator
                | ElementKind::ArgumentSeparator
                | ElementKind::AnonymousFunctionMarker
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    /// Source text, kept for pass-through output and diagnostics.
    pub raw: String,
    /// 1-based source line.
    pub line: usize,
    /// Operand slots are final.
    pub sealed: bool,
    /// Parent in the finished tree, written once by [`finalize`].
    pub owner: Option<ElementId>,
}

impl Element {
    pub fn new(kind: ElementKind, raw: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            raw: raw.into(),
            line,
            sealed: false,
            owner: None,
        }
    }

    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }
}

/// Writes the owner link of every node below `root`. A node that already has
/// an owner keeps it, so elements captured twice by an `Error` are not moved.
pub fn finalize(arena: &mut Arena, root: ElementId) {
    let mut stack = vec![root];

    while let Some(parent) = stack.pop() {
        for child in arena[parent].kind.children() {
            if child == root || arena[child].owner.is_some() {
                continue;
            }
            arena[child].owner = Some(parent);
            stack.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn push(arena: &mut Arena, kind: ElementKind) -> ElementId {
        arena.push_and_get_key(Element::new(kind, "", 1))
    }

    #[test]
    fn operator_children_skip_missing_operands() {
        let mut arena = Arena::new();
        let a = push(&mut arena, ElementKind::Variable("a".into()));
        let kind = ElementKind::Operator {
            symbol: "-".into(),
            kind: OperatorKind::BinaryUsedAsUnary,
            operand1: Some(a),
            operand2: None,
        };
        assert_eq!(kind.children(), vec![a]);
    }

    #[test]
    fn function_call_does_not_own_its_function() {
        let mut arena = Arena::new();
        let function = push(
            &mut arena,
            ElementKind::AnonymousFunction {
                parameters: vec![],
                body: None,
            },
        );
        let argument = push(&mut arena, ElementKind::Value("3".into()));
        let kind = ElementKind::FunctionCall {
            function,
            arguments: vec![argument],
        };
        assert_eq!(kind.children(), vec![argument]);
    }

    #[test]
    fn finalize_sets_owners_once() {
        let mut arena = Arena::new();
        let a = push(&mut arena, ElementKind::Variable("a".into()));
        let b = push(&mut arena, ElementKind::Variable("b".into()));
        let plus = push(
            &mut arena,
            ElementKind::Operator {
                symbol: "+".into(),
                kind: OperatorKind::Binary,
                operand1: Some(a),
                operand2: Some(b),
            },
        );
        let error = push(
            &mut arena,
            ElementKind::Error {
                error: ParseError::EmptyTerm,
                children: vec![plus, a],
            },
        );

        finalize(&mut arena, error);

        assert_eq!(arena[error].owner, None);
        assert_eq!(arena[plus].owner, Some(error));
        assert_eq!(arena[b].owner, Some(plus));
        // the first parent to claim a node keeps it
        assert_eq!(arena[a].owner, Some(error));
    }

    #[test]
    fn structural_kinds() {
        assert!(ElementKind::Parenthesis(Delimiter::Open).is_structural());
        assert!(ElementKind::ArgumentSeparator.is_structural());
        assert!(!ElementKind::Unknown.is_structural());
        assert!(!ElementKind::ArrayDeclaration(vec![]).is_structural());
    }
}
