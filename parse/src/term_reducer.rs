//! Reduces a flat run of classified elements into a single expression tree.
//!
//! Reduction happens in three passes over a working list of ids:
//!
//! 1. groups: parentheses, brackets, array accesses and function calls are
//!    collapsed into single nodes, left to right;
//! 2. unary functions take the element after them, left to right;
//! 3. binary operators take their neighbours, right to left.
//!
//! The third pass has no precedence table: the operator closest to the end of
//! the term is always bound first, so `a * b + c` becomes `a * (b + c)`.

use crate::{
    ast::{
        Arena, ArrayElement, DeclarationKind, Delimiter, Element, ElementId, ElementKind,
        OperatorKind,
    },
    error::ParseError,
    expression_file::DeclarationRegistry,
    keywords::Keywords,
};

/// An anonymous function whose body is being reduced. It is not registered
/// yet, but calls to it and to its parameters must already resolve.
#[derive(Debug, Clone)]
struct FunctionContext {
    name: String,
    function: ElementId,
    parameters: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GroupKind {
    Parenthesis,
    Bracket,
}

impl GroupKind {
    fn of(kind: &ElementKind) -> Option<(GroupKind, Delimiter)> {
        match kind {
            ElementKind::Parenthesis(delimiter) => Some((GroupKind::Parenthesis, *delimiter)),
            ElementKind::Bracket(delimiter) => Some((GroupKind::Bracket, *delimiter)),
            _ => None,
        }
    }

    fn unmatched(self) -> ParseError {
        match self {
            GroupKind::Parenthesis => ParseError::UnmatchedParenthesis,
            GroupKind::Bracket => ParseError::UnmatchedBracket,
        }
    }
}

/// What `name(...)` refers to.
enum Callee {
    /// Arrays and parameters of the function being defined are indexed.
    Indexed,
    Function(ElementId),
    Unresolved,
}

pub struct TermReducer<'a> {
    arena: &'a mut Arena,
    declarations: &'a DeclarationRegistry,
    keywords: &'a Keywords,
    line: usize,
    function: Option<FunctionContext>,
}

impl<'a> TermReducer<'a> {
    pub fn new(
        arena: &'a mut Arena,
        declarations: &'a DeclarationRegistry,
        keywords: &'a Keywords,
        line: usize,
    ) -> Self {
        Self {
            arena,
            declarations,
            keywords,
            line,
            function: None,
        }
    }

    fn push(&mut self, kind: ElementKind, raw: impl Into<String>) -> ElementId {
        self.arena
            .push_and_get_key(Element::new(kind, raw, self.line).sealed())
    }

    fn raw_text(&self, elements: &[ElementId], separator: &str) -> String {
        elements
            .iter()
            .map(|&id| self.arena[id].raw.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// An `Error` element capturing `children` as they were before reduction.
    pub fn error_element(&mut self, error: ParseError, children: &[ElementId]) -> ElementId {
        log::warn!("line {}: {error}", self.line);
        let raw = self.raw_text(children, " ");
        self.push(
            ElementKind::Error {
                error,
                children: children.to_vec(),
            },
            raw,
        )
    }

    /// Reduces `term`, or wraps it in an `Error` element when that fails.
    pub fn reduce_or_error(&mut self, term: &[ElementId]) -> ElementId {
        match self.reduce(term) {
            Ok(id) => id,
            Err(error) => self.error_element(error, term),
        }
    }

    pub fn reduce(&mut self, term: &[ElementId]) -> Result<ElementId, ParseError> {
        let result = self.reduce_passes(term);
        if result.is_err() {
            self.unseal_operators(term);
        }
        result
    }

    /// Puts operators back into their classified state after a failed
    /// reduction, so an `Error` holds the elements as they were written.
    fn unseal_operators(&mut self, term: &[ElementId]) {
        for &id in term {
            let element = &mut self.arena[id];
            if let ElementKind::Operator {
                operand1, operand2, ..
            } = &mut element.kind
            {
                *operand1 = None;
                *operand2 = None;
                element.sealed = false;
            }
        }
    }

    fn reduce_passes(&mut self, term: &[ElementId]) -> Result<ElementId, ParseError> {
        if term.is_empty() {
            return Err(ParseError::EmptyTerm);
        }

        let mut work = term.to_vec();
        self.collapse_groups(&mut work)?;
        self.bind_unary(&mut work)?;
        self.bind_binary(&mut work)?;

        let [result] = work.as_slice() else {
            return Err(ParseError::NotReduced {
                remaining: work.len(),
            });
        };
        self.check_finished(*result)?;
        Ok(*result)
    }

    fn collapse_groups(&mut self, work: &mut Vec<ElementId>) -> Result<(), ParseError> {
        let mut i = 0;

        while i < work.len() {
            let Some((group, delimiter)) = GroupKind::of(&self.arena[work[i]].kind) else {
                i += 1;
                continue;
            };
            if delimiter == Delimiter::Close {
                return Err(group.unmatched());
            }

            let close = self.find_closing(work, i)?;
            let inner = work[i + 1..close].to_vec();

            let (start, node) = match group {
                GroupKind::Bracket => (i, self.parse_array_literal(&inner)?),
                GroupKind::Parenthesis => {
                    let callee = i
                        .checked_sub(1)
                        .filter(|&previous| {
                            matches!(self.arena[work[previous]].kind, ElementKind::Variable(_))
                        });
                    match callee {
                        Some(previous) => (previous, self.resolve_call(work[previous], &inner)?),
                        None => (i, self.reduce(&inner)?),
                    }
                }
            };

            work.splice(start..=close, [node]);
            i = start + 1;
        }

        Ok(())
    }

    /// Index of the delimiter closing the group opened at `open`.
    fn find_closing(&self, work: &[ElementId], open: usize) -> Result<usize, ParseError> {
        let Some((group, _)) = GroupKind::of(&self.arena[work[open]].kind) else {
            return Err(ParseError::UnexpectedToken(self.arena[work[open]].raw.clone()));
        };
        let mut depth = 0usize;

        for (index, &id) in work.iter().enumerate().skip(open + 1) {
            match GroupKind::of(&self.arena[id].kind) {
                Some((kind, Delimiter::Open)) if kind == group => depth += 1,
                Some((kind, Delimiter::Close)) if kind == group => {
                    if depth == 0 {
                        return Ok(index);
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }

        Err(group.unmatched())
    }

    fn bind_unary(&mut self, work: &mut Vec<ElementId>) -> Result<(), ParseError> {
        let mut i = 0;

        while i < work.len() {
            if self.unsealed_operator(work[i]) == Some(OperatorKind::Unary) {
                let Some(&operand) = work.get(i + 1) else {
                    return Err(self.missing_operand(work[i]));
                };
                self.seal(work[i], Some(operand), None);
                work.remove(i + 1);
            }
            i += 1;
        }

        Ok(())
    }

    fn bind_binary(&mut self, work: &mut Vec<ElementId>) -> Result<(), ParseError> {
        let mut i = work.len();

        while i > 0 {
            i -= 1;
            let id = work[i];
            match self.unsealed_operator(id) {
                Some(OperatorKind::BinaryUsedAsUnary) => {
                    let Some(&operand) = work.get(i + 1) else {
                        return Err(self.missing_operand(id));
                    };
                    self.seal(id, Some(operand), None);
                    work.remove(i + 1);
                }
                Some(OperatorKind::Binary) => {
                    let (Some(left), Some(&right)) = (i.checked_sub(1), work.get(i + 1)) else {
                        return Err(self.missing_operand(id));
                    };
                    self.seal(id, Some(work[left]), Some(right));
                    work.remove(i + 1);
                    work.remove(left);
                    i = left + 1;
                }
                Some(OperatorKind::Unary) | None => {}
            }
        }

        Ok(())
    }

    fn unsealed_operator(&self, id: ElementId) -> Option<OperatorKind> {
        let element = &self.arena[id];
        match element.kind {
            ElementKind::Operator { kind, .. } if !element.sealed => Some(kind),
            _ => None,
        }
    }

    fn seal(&mut self, id: ElementId, first: Option<ElementId>, second: Option<ElementId>) {
        let element = &mut self.arena[id];
        if let ElementKind::Operator {
            operand1, operand2, ..
        } = &mut element.kind
        {
            *operand1 = first;
            *operand2 = second;
        }
        element.sealed = true;
    }

    /// The element was classified as part of the whole line, so a sign opening
    /// a function body was taken for a binary operator after the `)`.
    fn mark_prefix(&mut self, id: ElementId) {
        let element = &mut self.arena[id];
        if let ElementKind::Operator { kind, .. } = &mut element.kind {
            if *kind == OperatorKind::Binary && !element.sealed {
                *kind = OperatorKind::BinaryUsedAsUnary;
            }
        }
    }

    fn missing_operand(&self, id: ElementId) -> ParseError {
        ParseError::MissingOperand {
            operator: self.arena[id].raw.clone(),
        }
    }

    /// A reduced tree must not contain structural tokens or operators that
    /// never received their operands.
    fn check_finished(&self, root: ElementId) -> Result<(), ParseError> {
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let element = &self.arena[id];
            match &element.kind {
                kind if kind.is_structural() => {
                    return Err(ParseError::UnexpectedToken(element.raw.clone()));
                }
                ElementKind::Operator { .. } if !element.sealed => {
                    return Err(self.missing_operand(id));
                }
                ElementKind::Error { .. } => {}
                kind => stack.extend(kind.children()),
            }
        }

        Ok(())
    }

    /// Declared names come first. Only names nothing is declared under can
    /// refer to the function being defined or to its parameters. Names
    /// declared with a plain value are passed through like unknown names.
    fn resolve(&self, name: &str) -> Callee {
        if let Some(declaration) = self.declarations.get(name) {
            if let ElementKind::VariableDeclaration { value, kind, .. } = &self.arena[declaration].kind
            {
                return match (kind, &self.arena[*value].kind) {
                    (DeclarationKind::AnonymousFunction, ElementKind::AnonymousFunction { .. }) => {
                        Callee::Function(*value)
                    }
                    (DeclarationKind::ArrayDeclaration, _) => Callee::Indexed,
                    _ => Callee::Unresolved,
                };
            }
        }

        match &self.function {
            Some(function) if function.parameters.iter().any(|parameter| parameter == name) => {
                Callee::Indexed
            }
            Some(function) if function.name == name => Callee::Function(function.function),
            _ => Callee::Unresolved,
        }
    }

    /// `name(...)` where `name` is a variable: an array access, a function
    /// call, or, for names nothing is known about, raw pass-through text.
    fn resolve_call(
        &mut self,
        variable: ElementId,
        inner: &[ElementId],
    ) -> Result<ElementId, ParseError> {
        let ElementKind::Variable(name) = &self.arena[variable].kind else {
            return Err(ParseError::UnexpectedToken(self.arena[variable].raw.clone()));
        };
        let name = name.clone();

        match self.resolve(&name) {
            Callee::Indexed => {
                let indexes = self.reduce_arguments(inner)?;
                let raw = format!("{name}({})", self.raw_text(inner, ""));
                Ok(self.push(
                    ElementKind::ArrayAccessor {
                        name: variable,
                        indexes,
                    },
                    raw,
                ))
            }
            Callee::Function(function) => {
                let arguments = self.reduce_arguments(inner)?;
                let raw = format!("{name}({})", self.raw_text(inner, ""));
                log::trace!("line {}: call to '{name}'", self.line);
                Ok(self.push(
                    ElementKind::FunctionCall {
                        function,
                        arguments,
                    },
                    raw,
                ))
            }
            Callee::Unresolved => {
                log::debug!("line {}: '{name}' is not declared, passing it through", self.line);
                let raw = format!("{name}({})", self.raw_text(inner, ""));
                Ok(self.push(ElementKind::Unknown, raw))
            }
        }
    }

    /// The value of `name = rhs` and the kind of declaration it makes.
    pub fn declaration_value(
        &mut self,
        name: &str,
        rhs: &[ElementId],
    ) -> (ElementId, DeclarationKind) {
        let first = rhs.first().map(|&id| &self.arena[id].kind);
        let result = match first {
            None => Err(ParseError::MissingValue),
            Some(ElementKind::AnonymousFunctionMarker) => self
                .parse_anonymous_function(name, &rhs[1..])
                .map(|function| (function, DeclarationKind::AnonymousFunction)),
            Some(ElementKind::Bracket(Delimiter::Open))
                if self.find_closing(rhs, 0).is_ok_and(|close| close == rhs.len() - 1) =>
            {
                self.parse_array_literal(&rhs[1..rhs.len() - 1])
                    .map(|array| (array, DeclarationKind::ArrayDeclaration))
            }
            Some(_) => self
                .reduce(rhs)
                .map(|value| (value, DeclarationKind::Unknown)),
        };

        result.unwrap_or_else(|error| {
            self.unseal_operators(rhs);
            (self.error_element(error, rhs), DeclarationKind::Unknown)
        })
    }

    /// Splits at top-level commas and reduces each argument.
    fn reduce_arguments(&mut self, inner: &[ElementId]) -> Result<Vec<ElementId>, ParseError> {
        if inner.is_empty() {
            return Ok(vec![]);
        }

        let mut arguments = vec![];
        let mut depth = 0usize;
        let mut start = 0;

        for (index, &id) in inner.iter().enumerate() {
            match &self.arena[id].kind {
                ElementKind::Parenthesis(Delimiter::Open) | ElementKind::Bracket(Delimiter::Open) => {
                    depth += 1
                }
                ElementKind::Parenthesis(Delimiter::Close)
                | ElementKind::Bracket(Delimiter::Close) => depth = depth.saturating_sub(1),
                ElementKind::ArgumentSeparator if depth == 0 => {
                    arguments.push(inner[start..index].to_vec());
                    start = index + 1;
                }
                _ => {}
            }
        }
        arguments.push(inner[start..].to_vec());

        arguments
            .iter()
            .map(|argument| self.reduce(argument))
            .collect()
    }

    /// Builds an array from the elements between `[` and `]`.
    ///
    /// `;` ends a row and `,` only separates cells. Cells are not reduced
    /// further, except that a sign directly before a value or variable is
    /// folded into it and nested brackets become nested arrays.
    pub fn parse_array_literal(&mut self, inner: &[ElementId]) -> Result<ElementId, ParseError> {
        let mut cells = vec![];
        let (mut row, mut col) = (0, 0);
        let mut i = 0;

        while i < inner.len() {
            let id = inner[i];
            let value = match &self.arena[id].kind {
                ElementKind::StatementSeparator => {
                    if col > 0 {
                        row += 1;
                        col = 0;
                    }
                    i += 1;
                    continue;
                }
                ElementKind::ArgumentSeparator => {
                    i += 1;
                    continue;
                }
                ElementKind::Bracket(Delimiter::Open) => {
                    let close = self.find_closing(inner, i)?;
                    let nested = self.parse_array_literal(&inner[i + 1..close])?;
                    i = close + 1;
                    nested
                }
                ElementKind::Operator { symbol, .. }
                    if self.keywords.is_dual_purpose_operator(symbol)
                        && inner.get(i + 1).is_some_and(|&next| {
                            matches!(
                                self.arena[next].kind,
                                ElementKind::Value(_) | ElementKind::Variable(_)
                            )
                        }) =>
                {
                    let operand = inner[i + 1];
                    let element = &mut self.arena[id];
                    if let ElementKind::Operator {
                        kind, operand1, ..
                    } = &mut element.kind
                    {
                        *kind = OperatorKind::BinaryUsedAsUnary;
                        *operand1 = Some(operand);
                    }
                    element.sealed = true;
                    i += 2;
                    id
                }
                kind if kind.is_structural() || matches!(kind, ElementKind::Operator { .. }) => {
                    return Err(ParseError::UnsupportedArrayCell(self.arena[id].raw.clone()));
                }
                _ => {
                    i += 1;
                    id
                }
            };

            cells.push(ArrayElement { value, row, col });
            col += 1;
        }

        let raw = format!("[{}]", self.raw_text(inner, " "));
        Ok(self.push(ElementKind::ArrayDeclaration(cells), raw))
    }

    /// `elements` follow the `@` of `name = @(...) body`.
    ///
    /// The function node exists before its body is reduced, so the body can
    /// call the function itself and index its own parameters. A body that
    /// cannot be reduced becomes an `Error`, the function is still returned.
    pub fn parse_anonymous_function(
        &mut self,
        name: &str,
        elements: &[ElementId],
    ) -> Result<ElementId, ParseError> {
        if !matches!(
            elements.first().map(|&id| &self.arena[id].kind),
            Some(ElementKind::Parenthesis(Delimiter::Open))
        ) {
            return Err(ParseError::ExpectedParameterList);
        }
        let close = self.find_closing(elements, 0)?;

        let parameters: Vec<ElementId> = elements[1..close]
            .iter()
            .copied()
            .filter(|&id| matches!(self.arena[id].kind, ElementKind::Variable(_)))
            .collect();
        let parameter_names = parameters
            .iter()
            .filter_map(|&id| match &self.arena[id].kind {
                ElementKind::Variable(name) => Some(name.clone()),
                _ => None,
            })
            .collect::<Vec<_>>();

        let raw = format!("@({})", parameter_names.join(","));
        let function = self.arena.push_and_get_key(Element::new(
            ElementKind::AnonymousFunction {
                parameters,
                body: None,
            },
            raw,
            self.line,
        ));

        let previous = self.function.replace(FunctionContext {
            name: name.into(),
            function,
            parameters: parameter_names,
        });
        let body = &elements[close + 1..];
        if let Some(&first) = body.first() {
            self.mark_prefix(first);
        }
        let body = self.reduce_or_error(body);
        self.function = previous;

        let element = &mut self.arena[function];
        if let ElementKind::AnonymousFunction { body: slot, .. } = &mut element.kind {
            *slot = Some(body);
        }
        element.sealed = true;

        Ok(function)
    }
}
