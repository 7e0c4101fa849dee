use indexmap::IndexMap;

use crate::{
    ast::{Arena, Element, ElementId, ElementKind, finalize},
    classifier::classify,
    error::CollapseError,
    keywords::Keywords,
    line_collapser::{LogicalLine, collapse_lines},
    term_reducer::TermReducer,
    tokenizer::tokenize,
};

/// Declared names in declaration order. The first declaration of a name is
/// the one that stays; later ones are parsed but never replace it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeclarationRegistry {
    declarations: IndexMap<String, ElementId>,
}

impl DeclarationRegistry {
    /// Returns `false` if `name` was already declared.
    pub fn insert(&mut self, name: &str, declaration: ElementId) -> bool {
        if self.declarations.contains_key(name) {
            return false;
        }
        self.declarations.insert(name.into(), declaration);
        true
    }

    /// The `VariableDeclaration` element that declared `name`.
    pub fn get(&self, name: &str) -> Option<ElementId> {
        self.declarations.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ElementId)> {
        self.declarations
            .iter()
            .map(|(name, &declaration)| (name.as_str(), declaration))
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// A parsed script: one root element per logical line.
#[derive(Debug, Default, Clone)]
pub struct ExpressionFile {
    pub arena: Arena,
    pub statements: Vec<ElementId>,
    pub declarations: DeclarationRegistry,
}

impl ExpressionFile {
    pub fn element(&self, id: ElementId) -> &Element {
        &self.arena[id]
    }

    /// The name `function` was declared under, if it is the value of a
    /// declaration.
    pub fn declared_name(&self, function: ElementId) -> Option<&str> {
        let declaration = self.arena[function].owner?;
        let ElementKind::VariableDeclaration { name, .. } = &self.arena[declaration].kind else {
            return None;
        };
        match &self.arena[*name].kind {
            ElementKind::Variable(name) => Some(name),
            _ => None,
        }
    }

    fn push(&mut self, kind: ElementKind, raw: impl Into<String>, line: usize) -> ElementId {
        self.arena
            .push_and_get_key(Element::new(kind, raw, line).sealed())
    }

    fn parse_line(&mut self, line: &LogicalLine, keywords: &Keywords) -> ElementId {
        let number = line.source_index;
        let tokens = tokenize(&line.text, keywords);
        let mut elements = classify(&tokens, keywords, number, &mut self.arena);

        if elements
            .last()
            .is_some_and(|&id| self.arena[id].kind == ElementKind::StatementSeparator)
        {
            elements.pop();
        }

        match elements.as_slice() {
            [] => self.push(ElementKind::Empty, "", number),
            [single] => {
                let raw = self.arena[*single].raw.clone();
                self.push(ElementKind::Unknown, raw, number)
            }
            [name, assignment, rhs @ ..]
                if self.arena[*assignment].kind == ElementKind::AssignmentMarker =>
            {
                let ElementKind::Variable(declared) = self.arena[*name].kind.clone() else {
                    return self.push(ElementKind::Unknown, tokens.join(" "), number);
                };
                let (value, kind) =
                    TermReducer::new(&mut self.arena, &self.declarations, keywords, number)
                        .declaration_value(&declared, rhs);

                let declaration = self.push(
                    ElementKind::VariableDeclaration {
                        name: *name,
                        value,
                        kind,
                    },
                    line.text.trim(),
                    number,
                );
                finalize(&mut self.arena, declaration);

                if !self.declarations.insert(&declared, declaration) {
                    log::debug!("line {number}: '{declared}' is already declared, keeping the first");
                }
                declaration
            }
            _ => self.push(ElementKind::Unknown, tokens.join(" "), number),
        }
    }
}

/// Parses a script with the default keyword tables.
pub fn parse_file(lines: &[impl AsRef<str>]) -> Result<ExpressionFile, CollapseError> {
    parse_file_with(lines, &Keywords::default())
}

pub fn parse_file_with(
    lines: &[impl AsRef<str>],
    keywords: &Keywords,
) -> Result<ExpressionFile, CollapseError> {
    let mut file = ExpressionFile::default();

    for line in collapse_lines(lines)? {
        log::trace!("line {}: {:?}", line.source_index, line.text);
        let statement = file.parse_line(&line, keywords);
        file.statements.push(statement);
    }

    log::debug!(
        "parsed {} statements, {} declarations",
        file.statements.len(),
        file.declarations.len()
    );
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{DeclarationKind, OperatorKind},
        error::ParseError,
    };
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn parse(lines: &[&str]) -> ExpressionFile {
        parse_file(lines).unwrap()
    }

    fn statement(file: &ExpressionFile, index: usize) -> &ElementKind {
        &file.element(file.statements[index]).kind
    }

    fn declaration_value(file: &ExpressionFile, index: usize) -> (ElementId, DeclarationKind) {
        match statement(file, index) {
            ElementKind::VariableDeclaration { value, kind, .. } => (*value, *kind),
            other => panic!("expected a declaration, got {other:?}"),
        }
    }

    #[test]
    fn line_shapes() {
        let file = parse(&["", "% comment", ";", "x", "x = 1;", "disp x y"]);

        assert_eq!(statement(&file, 0), &ElementKind::Empty);
        assert_eq!(statement(&file, 1), &ElementKind::Empty);
        assert_eq!(statement(&file, 2), &ElementKind::Empty);
        assert_eq!(statement(&file, 3), &ElementKind::Unknown);
        assert_matches!(statement(&file, 4), ElementKind::VariableDeclaration { .. });
        assert_eq!(statement(&file, 5), &ElementKind::Unknown);
        assert_eq!(file.element(file.statements[5]).raw, "disp x y");
    }

    #[test]
    fn declaration_kinds() {
        let file = parse(&["a = [1 2; 3 4];", "f = @(x) x ^ 2;", "y = a * 2;"]);

        assert_eq!(declaration_value(&file, 0).1, DeclarationKind::ArrayDeclaration);
        assert_eq!(declaration_value(&file, 1).1, DeclarationKind::AnonymousFunction);
        assert_eq!(declaration_value(&file, 2).1, DeclarationKind::Unknown);
        assert_eq!(
            file.declarations.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            ["a", "f", "y"]
        );
        assert_eq!(file.element(file.statements[1]).raw, "f = @(x) x ^ 2;");
    }

    #[test]
    fn array_with_trailing_operation_is_a_term() {
        let file = parse(&["b = [1 2] * 3"]);
        let (value, kind) = declaration_value(&file, 0);
        assert_eq!(kind, DeclarationKind::Unknown);
        assert_matches!(
            file.element(value).kind,
            ElementKind::Operator {
                kind: OperatorKind::Binary,
                ..
            }
        );
    }

    #[test]
    fn declared_function_is_called() {
        let file = parse(&["f = @(x) x ^ 2;", "y = f(3);"]);
        let (function, _) = declaration_value(&file, 0);
        let (call, _) = declaration_value(&file, 1);

        let ElementKind::FunctionCall {
            function: called,
            arguments,
        } = &file.element(call).kind
        else {
            panic!("expected a call");
        };
        assert_eq!(*called, function);
        assert_eq!(arguments.len(), 1);
        assert_eq!(file.element(arguments[0]).kind, ElementKind::Value("3".into()));
        assert_eq!(file.declared_name(function), Some("f"));
    }

    #[test]
    fn declared_array_is_indexed() {
        let file = parse(&["a = [1 2 3];", "b = a(2);", "c = x(2);"]);

        assert_matches!(
            file.element(declaration_value(&file, 1).0).kind,
            ElementKind::ArrayAccessor { .. }
        );
        let unresolved = file.element(declaration_value(&file, 2).0);
        assert_eq!(unresolved.kind, ElementKind::Unknown);
        assert_eq!(unresolved.raw, "x(2)");
    }

    #[test]
    fn plain_value_is_not_indexed() {
        let file = parse(&["k = 2;", "y = k(1);"]);

        let call = file.element(declaration_value(&file, 1).0);
        assert_eq!(call.kind, ElementKind::Unknown);
        assert_eq!(call.raw, "k(1)");
    }

    #[test]
    fn bare_call_is_passed_through() {
        let file = parse(&["f = @(x) x;", "f(3)"]);

        assert_eq!(statement(&file, 1), &ElementKind::Unknown);
        assert_eq!(file.element(file.statements[1]).raw, "f ( 3 )");
    }

    #[test]
    fn first_declaration_wins() {
        let file = parse(&[
            "f = @(x) x ^ 2;",
            "f = @(x) x + 1;",
            "y = f(2);",
        ]);
        let first = file.statements[0];

        assert_eq!(file.declarations.get("f"), Some(first));
        assert_eq!(file.declarations.len(), 2);
        let (call, _) = declaration_value(&file, 2);
        assert_matches!(
            file.element(call).kind,
            ElementKind::FunctionCall { function, .. } if function == declaration_value(&file, 0).0
        );
    }

    #[test]
    fn failures_stay_on_their_line() {
        let file = parse(&["x = (a + b;", "y = a + b;", "z =", "w = @ x"]);

        let (value, kind) = declaration_value(&file, 0);
        assert_eq!(kind, DeclarationKind::Unknown);
        assert_matches!(
            file.element(value).kind,
            ElementKind::Error {
                error: ParseError::UnmatchedParenthesis,
                ..
            }
        );
        assert_matches!(
            file.element(declaration_value(&file, 1).0).kind,
            ElementKind::Operator { .. }
        );
        assert_matches!(
            file.element(declaration_value(&file, 2).0).kind,
            ElementKind::Error {
                error: ParseError::MissingValue,
                ..
            }
        );
        assert_matches!(
            file.element(declaration_value(&file, 3).0).kind,
            ElementKind::Error {
                error: ParseError::ExpectedParameterList,
                ..
            }
        );
    }

    #[test]
    fn owners_are_linked() {
        let file = parse(&["y = a * b + c"]);
        let declaration = file.statements[0];
        let (value, _) = declaration_value(&file, 0);

        assert_eq!(file.element(declaration).owner, None);
        assert_eq!(file.element(value).owner, Some(declaration));
        let ElementKind::Operator {
            operand2: Some(sum),
            ..
        } = file.element(value).kind
        else {
            panic!("expected a binary operator");
        };
        assert_eq!(file.element(sum).owner, Some(value));
    }

    #[test]
    fn multi_line_arrays_are_one_statement() {
        let file = parse(&["m = [1 2", "3 4];", "n = 1;"]);
        assert_eq!(file.statements.len(), 2);
        assert_eq!(file.element(file.statements[1]).line, 3);
    }

    #[test]
    fn unterminated_array_is_fatal() {
        assert_eq!(
            parse_file(&["m = [1 2", "3 4"]).unwrap_err(),
            CollapseError::UnterminatedArray { line: 1 }
        );
    }
}
