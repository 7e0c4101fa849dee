use strum::{Display, EnumString};

/// The `amsmath` environment arrays are typeset in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MatrixEnvironment {
    /// `[ ]`
    #[default]
    Bmatrix,
    /// `( )`
    Pmatrix,
    /// `| |`
    Vmatrix,
    /// No delimiters.
    Matrix,
}

/// The LaTeX vocabulary used for output.
#[derive(Debug, Clone, PartialEq)]
pub struct LatexStyle {
    pub matrix: MatrixEnvironment,
    pub multiplication: String,
    pub paragraph_break: String,
    /// Output for blank lines.
    pub medium_skip: String,
    /// Names written as commands when they appear in a variable, e.g. the
    /// `alpha` in `alpha_1`.
    pub special_symbols: Vec<String>,
    /// Replaces a statement that could not be rendered.
    pub faulty_line: String,
}

impl Default for LatexStyle {
    fn default() -> Self {
        Self {
            matrix: MatrixEnvironment::default(),
            multiplication: r"\cdot".into(),
            paragraph_break: r"\par".into(),
            medium_skip: r"\medskip".into(),
            special_symbols: [
                "alpha",
                "Alpha",
                "Beta",
                "beta",
                "Gamma",
                "gamma",
                "Delta",
                "delta",
                "Epsilon",
                "epsilon",
                "varepsilon",
                "Lambda",
                "lambda",
                "pi",
                "Pi",
            ]
            .map(String::from)
            .into(),
            faulty_line: "faulty line".into(),
        }
    }
}

impl LatexStyle {
    /// `text` as a standalone line of the document.
    pub fn top_level(&self, text: &str) -> String {
        format!("${text}$ {}", self.paragraph_break)
    }

    pub fn symbol<'a>(&'a self, symbol: &'a str) -> &'a str {
        match symbol {
            "*" => &self.multiplication,
            _ => symbol,
        }
    }
}
