use parse::{
    Element, ElementKind, ExpressionFile,
    ast::{DeclarationKind, OperatorKind},
    parse_file,
};
use pretty_assertions::assert_eq;
use render::{MatrixEnvironment, RenderOptions, render_all, render_element};
use rstest::rstest;

fn render_lines(lines: &[&str], options: &RenderOptions) -> Vec<String> {
    render_all(&parse_file(lines).unwrap(), options)
}

fn render_last(lines: &[&str]) -> String {
    render_lines(lines, &RenderOptions::default())
        .pop()
        .unwrap()
}

#[rstest]
#[case("y = a * b + c", r"$y = a \cdot (b + c)$ \par")]
#[case("y = (a * b) + c", r"$y = (a \cdot b) + c$ \par")]
#[case("y = a + b", r"$y = a + b$ \par")]
#[case("y = a - b - c", r"$y = a - (b - c)$ \par")]
#[case("x = a / b;", r"$x = \frac{a}{b}$ \par")]
#[case("x = (a + b) / c", r"$x = \frac{(a + b)}{c}$ \par")]
#[case("x = -a", r"$x = -a$ \par")]
#[case("x = -(a + b)", r"$x = -(a + b)$ \par")]
#[case("x = sqrt(2) ^ 2", r"$x = sqrt(2) ^ 2$ \par")]
#[case("alpha_1 = 2", r"$\alpha _{1} = 2$ \par")]
#[case("v_max_0 = 1.5", r"$v_{max,0} = 1.5$ \par")]
#[case("m = [1 2; 3 4]", r"$m = \begin{bmatrix}1&2\\3&4\end{bmatrix}$ \par")]
#[case("v = [1, -2, x]", r"$v = \begin{bmatrix}1&-2&x\end{bmatrix}$ \par")]
#[case("v = [1; 2; 3];", r"$v = \begin{bmatrix}1\\2\\3\end{bmatrix}$ \par")]
#[case("f = @(x) x ^ 2", r"$f = @(x) x ^ 2$ \par")]
#[case("y = 2 * exp(t)", r"$y = 2 \cdot exp(t)$ \par")]
#[case("", r"\medskip")]
#[case("   % a comment", r"\medskip")]
#[case("x", r"$x$ \par")]
#[case("disp x y", r"$disp x y$ \par")]
fn single_line(#[case] line: &str, #[case] expected: &str) {
    assert_eq!(render_last(&[line]), expected);
}

#[rstest]
#[case(
    "x = (a + b",
    r"$x = ( a + b -- could not find closing parenthesis$ \par"
)]
#[case("x = a +", r"$x = a + -- operator '+' is missing an operand$ \par")]
#[case("x = a b", r"$x = a b -- expression could not be reduced to a single element (2 left)$ \par")]
#[case("x =", r"$x =  -- expected value after '='$ \par")]
fn errors_are_written_inline(#[case] line: &str, #[case] expected: &str) {
    assert_eq!(render_last(&[line]), expected);
}

#[rstest]
#[case(&["f = @(x) x ^ 2", "y = f(3)"], r"$y = 3 ^ 2$ \par")]
#[case(&["f = @(x) x ^ 2", "y = 2 * f(a + b)"], r"$y = 2 \cdot ((a + b) ^ 2)$ \par")]
#[case(&["g = @(x, y) x / y", "z = g(1, t)"], r"$z = \frac{1}{t}$ \par")]
#[case(&["g = @(x, y) x + y", "z = g(1)"], r"$z = 1 + y$ \par")]
#[case(&["f = @(n) n * f(n - 1)", "y = f(3)"], r"$y = 3 \cdot f(3 - 1)$ \par")]
#[case(&["f = @(x) x + 1", "g = @(x) 2 * f(x)", "y = g(t)"], r"$y = 2 \cdot (t + 1)$ \par")]
#[case(&["a = [1 2 3]", "b = a(2) + 1"], r"$b = a(2) + 1$ \par")]
#[case(&["f = @(x) x(1) + x", "y = f(v)"], r"$y = x(1) + v$ \par")]
#[case(&["f = @(t) -t"], r"$f = @(t) -t$ \par")]
#[case(&["f = @(t) -t", "y = 2 * f(3)"], r"$y = 2 \cdot -3$ \par")]
#[case(&["g = @(t) -g0 * t", "y = g(2)"], r"$y = -(g0 \cdot 2)$ \par")]
#[case(&["f = @(x) exp(x) + g(x)", "y = f(2)"], r"$y = exp(x) + g(x)$ \par")]
#[case(&["k = 2", "y = k(1) + 1"], r"$y = k(1) + 1$ \par")]
fn declarations_are_resolved(#[case] lines: &[&str], #[case] expected: &str) {
    assert_eq!(render_last(lines), expected);
}

#[test]
fn calls_without_inlining() {
    let options = RenderOptions {
        inline_anonymous_functions: false,
        ..RenderOptions::default()
    };
    assert_eq!(
        render_lines(&["f = @(x, y) x * y", "z = f(2, t + 1)"], &options),
        [r"$f = @(x,y) x \cdot y$ \par", r"$z = f(2, t + 1)$ \par"]
    );
}

#[test]
fn matrix_environment_is_configurable() {
    let mut options = RenderOptions::default();
    options.style.matrix = MatrixEnvironment::Pmatrix;
    assert_eq!(
        render_lines(&["m = [1 2", "3 4]"], &options),
        [r"$m = \begin{pmatrix}1&2&3&4\end{pmatrix}$ \par"]
    );
}

#[test]
fn broken_lines_do_not_affect_others() {
    assert_eq!(
        render_lines(
            &["x = (a + b", "", "y = a * b + c"],
            &RenderOptions::default()
        ),
        [
            r"$x = ( a + b -- could not find closing parenthesis$ \par",
            r"\medskip",
            r"$y = a \cdot (b + c)$ \par",
        ]
    );
}

#[test]
fn nested_elements_are_not_wrapped() {
    let file = parse_file(&["y = a * b + c"]).unwrap();
    let ElementKind::VariableDeclaration { value, kind, .. } =
        &file.element(file.statements[0]).kind
    else {
        panic!("expected a declaration");
    };
    assert_eq!(*kind, DeclarationKind::Unknown);
    assert_eq!(
        render_element(&file, *value, &RenderOptions::default()),
        Ok(r"a \cdot (b + c)".to_string())
    );
}

#[test]
fn faulty_statements_are_replaced() {
    let mut file = ExpressionFile::default();
    let a = file
        .arena
        .push_and_get_key(Element::new(ElementKind::Variable("a".into()), "a", 1));
    let mut broken = Element::new(
        ElementKind::Operator {
            symbol: "+".into(),
            kind: OperatorKind::Binary,
            operand1: Some(a),
            operand2: None,
        },
        "a +",
        1,
    );
    broken.sealed = true;
    let broken = file.arena.push_and_get_key(broken);
    file.arena[a].owner = Some(broken);
    let fine = file
        .arena
        .push_and_get_key(Element::new(ElementKind::Value("2".into()), "2", 2));
    file.statements = vec![broken, fine];

    assert_eq!(
        render_all(&file, &RenderOptions::default()),
        ["faulty line", r"$2$ \par"]
    );
}
