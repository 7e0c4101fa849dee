use std::fmt::Display;

use parse::{
    ElementId, ElementKind, ExpressionFile,
    ast::{ArrayElement, OperatorKind},
};

use crate::style::LatexStyle;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Write calls to anonymous functions as the function body with the
    /// arguments substituted, instead of `f(a, b)`.
    pub inline_anonymous_functions: bool,
    pub style: LatexStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            inline_anonymous_functions: true,
            style: LatexStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    MissingOperand { operator: String },
    MissingBody,
    NotAFunction(String),
    UndeclaredFunction(String),
}

impl Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MissingOperand { operator } => {
                write!(f, "operator '{operator}' is missing an operand")
            }
            RenderError::MissingBody => write!(f, "anonymous function has no body"),
            RenderError::NotAFunction(call) => write!(f, "'{call}' does not call a function"),
            RenderError::UndeclaredFunction(call) => {
                write!(f, "the function called by '{call}' has no name")
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Parameter bindings of a function call being inlined.
struct Scope<'a> {
    function: ElementId,
    bindings: Vec<(&'a str, ElementId)>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    fn contains(&self, function: ElementId) -> bool {
        self.function == function || self.parent.is_some_and(|parent| parent.contains(function))
    }

    /// A parameter appearing as a word of raw pass-through text.
    fn mentioned_in(&self, raw: &str) -> Option<&'a str> {
        raw.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .find_map(|word| {
                self.bindings
                    .iter()
                    .find(|(parameter, _)| *parameter == word)
                    .map(|&(parameter, _)| parameter)
            })
    }

    fn argument(&self, name: &str) -> Option<ElementId> {
        self.bindings
            .iter()
            .find(|(parameter, _)| *parameter == name)
            .map(|&(_, argument)| argument)
    }
}

/// Writes `name` with special symbols as commands and everything after the
/// first `_` as a comma separated subscript.
pub fn format_variable(name: &str, style: &LatexStyle) -> String {
    let mut replaced = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(c) = rest.chars().next() {
        let symbol = style
            .special_symbols
            .iter()
            .filter(|symbol| !symbol.is_empty() && rest.starts_with(symbol.as_str()))
            .max_by_key(|symbol| symbol.len());
        match symbol {
            Some(symbol) => {
                replaced.push('\\');
                replaced.push_str(symbol);
                replaced.push(' ');
                rest = &rest[symbol.len()..];
            }
            None => {
                replaced.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    match replaced.split_once('_') {
        Some((base, subscript)) => format!("{base}_{{{}}}", subscript.replace('_', ",")),
        None => replaced,
    }
}

struct Renderer<'a> {
    file: &'a ExpressionFile,
    options: &'a RenderOptions,
}

impl<'a> Renderer<'a> {
    fn style(&self) -> &'a LatexStyle {
        &self.options.style
    }

    fn join(
        &self,
        ids: impl IntoIterator<Item = ElementId>,
        separator: &str,
        parent: ElementId,
        scope: Option<&Scope>,
    ) -> Result<String, RenderError> {
        Ok(ids
            .into_iter()
            .map(|id| self.render(id, Some(parent), scope))
            .collect::<Result<Vec<_>, _>>()?
            .join(separator))
    }

    /// `parent` is the element this one is written inside of. It differs from
    /// the owner for substituted arguments and inlined bodies.
    fn render(
        &self,
        id: ElementId,
        parent: Option<ElementId>,
        scope: Option<&Scope>,
    ) -> Result<String, RenderError> {
        let element = self.file.element(id);

        Ok(match &element.kind {
            ElementKind::Empty => self.style().medium_skip.clone(),
            ElementKind::Variable(name) => {
                if let Some(scope) = scope {
                    if let Some(argument) = scope.argument(name) {
                        return self.render(argument, parent, scope.parent);
                    }
                }
                format_variable(name, self.style())
            }
            ElementKind::Value(value) => value.clone(),
            ElementKind::Operator {
                symbol,
                kind,
                operand1,
                operand2,
            } => {
                let operand = |operand: &Option<ElementId>| match operand {
                    Some(operand) => self.render(*operand, Some(id), scope).map(Some),
                    None => Ok(None),
                };
                let (first, second) = (operand(operand1)?, operand(operand2)?);

                if symbol == "/" {
                    return Ok(format!(
                        r"\frac{{{}}}{{{}}}",
                        first.unwrap_or_default(),
                        second.unwrap_or_default()
                    ));
                }

                let missing = || RenderError::MissingOperand {
                    operator: symbol.clone(),
                };
                let symbol = self.style().symbol(symbol);
                match kind {
                    OperatorKind::Binary => {
                        let text = format!(
                            "{} {symbol} {}",
                            first.ok_or_else(missing)?,
                            second.ok_or_else(missing)?
                        );
                        if self.is_operator(parent) {
                            format!("({text})")
                        } else {
                            text
                        }
                    }
                    OperatorKind::Unary => format!("{symbol}({})", first.ok_or_else(missing)?),
                    OperatorKind::BinaryUsedAsUnary => {
                        format!("{symbol}{}", first.ok_or_else(missing)?)
                    }
                }
            }
            ElementKind::ArrayDeclaration(cells) => self.render_array(id, cells, scope)?,
            // indexes name array elements, not parameters
            ElementKind::ArrayAccessor { name, indexes } => format!(
                "{}({})",
                self.render(*name, Some(id), None)?,
                self.join(indexes.iter().copied(), ",", id, None)?
            ),
            ElementKind::AnonymousFunction { parameters, body } => {
                let body = body.ok_or(RenderError::MissingBody)?;
                format!(
                    "@({}) {}",
                    self.join(parameters.iter().copied(), ",", id, scope)?,
                    self.render(body, Some(id), scope)?
                )
            }
            ElementKind::FunctionCall {
                function,
                arguments,
            } => self.render_call(id, *function, arguments, parent, scope)?,
            ElementKind::VariableDeclaration { name, value, .. } => format!(
                "{} = {}",
                self.render(*name, Some(id), scope)?,
                self.render(*value, Some(id), scope)?
            ),
            ElementKind::Error { error, .. } => format!("{} -- {error}", element.raw),
            ElementKind::Unknown => {
                if let Some(parameter) = scope.and_then(|scope| scope.mentioned_in(&element.raw)) {
                    log::debug!(
                        "line {}: '{}' is written as is, '{parameter}' is not substituted in it",
                        element.line,
                        element.raw
                    );
                }
                element.raw.clone()
            }
            ElementKind::AssignmentMarker
            | ElementKind::Parenthesis(_)
            | ElementKind::Bracket(_)
            | ElementKind::StatementSeparator
            | ElementKind::ArgumentSeparator
            | ElementKind::AnonymousFunctionMarker => element.raw.clone(),
        })
    }

    fn is_operator(&self, id: Option<ElementId>) -> bool {
        id.is_some_and(|id| matches!(self.file.element(id).kind, ElementKind::Operator { .. }))
    }

    fn render_array(
        &self,
        id: ElementId,
        cells: &[ArrayElement],
        scope: Option<&Scope>,
    ) -> Result<String, RenderError> {
        let rows = cells.iter().map(|cell| cell.row + 1).max().unwrap_or(0);
        let mut lines = Vec::with_capacity(rows);

        for row in 0..rows {
            let mut row_cells = cells.iter().filter(|cell| cell.row == row).collect::<Vec<_>>();
            row_cells.sort_by_key(|cell| cell.col);
            lines.push(self.join(row_cells.iter().map(|cell| cell.value), "&", id, scope)?);
        }

        let environment = self.style().matrix;
        Ok(format!(
            r"\begin{{{environment}}}{}\end{{{environment}}}",
            lines.join(r"\\")
        ))
    }

    fn render_call(
        &self,
        id: ElementId,
        function: ElementId,
        arguments: &[ElementId],
        parent: Option<ElementId>,
        scope: Option<&Scope>,
    ) -> Result<String, RenderError> {
        let call = &self.file.element(id).raw;
        let ElementKind::AnonymousFunction { parameters, body } = &self.file.element(function).kind
        else {
            return Err(RenderError::NotAFunction(call.clone()));
        };

        let recursive = scope.is_some_and(|scope| scope.contains(function));
        if !self.options.inline_anonymous_functions || recursive {
            let name = self
                .file
                .declared_name(function)
                .ok_or_else(|| RenderError::UndeclaredFunction(call.clone()))?;
            return Ok(format!(
                "{name}({})",
                self.join(arguments.iter().copied(), ", ", id, scope)?
            ));
        }

        let body = body.ok_or(RenderError::MissingBody)?;
        let bindings = parameters
            .iter()
            .filter_map(|&parameter| match &self.file.element(parameter).kind {
                ElementKind::Variable(name) => Some(name.as_str()),
                _ => None,
            })
            .zip(arguments.iter().copied())
            .collect();
        let inner = Scope {
            function,
            bindings,
            parent: scope,
        };
        log::trace!("inlining '{call}'");
        self.render(body, parent, Some(&inner))
    }
}

/// Renders one element. Statements, elements without an owner, are written
/// as a line of their own.
pub fn render_element(
    file: &ExpressionFile,
    id: ElementId,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let element = file.element(id);
    let text = Renderer { file, options }.render(id, element.owner, None)?;

    Ok(match (element.owner, &element.kind) {
        (None, ElementKind::Empty) | (Some(_), _) => text,
        (None, _) => options.style.top_level(&text),
    })
}

/// One output line per statement. A statement that cannot be rendered is
/// replaced by the faulty line marker.
pub fn render_all(file: &ExpressionFile, options: &RenderOptions) -> Vec<String> {
    file.statements
        .iter()
        .map(|&statement| {
            render_element(file, statement, options).unwrap_or_else(|error| {
                log::warn!("line {}: {error}", file.element(statement).line);
                options.style.faulty_line.clone()
            })
        })
        .collect()
}
