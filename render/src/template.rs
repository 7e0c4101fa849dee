use std::fmt::Display;

/// Rendered lines are inserted above the template line holding this marker.
pub const START_MARKER: &str = "%labtotextstart";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    MissingStartMarker,
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::MissingStartMarker => {
                write!(f, "template has no '{START_MARKER}' line")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Inserts `rendered` before the first marker line of `template`. The marker
/// line itself is kept.
pub fn splice(
    template: &[impl AsRef<str>],
    rendered: &[String],
) -> Result<Vec<String>, TemplateError> {
    let start = template
        .iter()
        .position(|line| line.as_ref().trim().eq_ignore_ascii_case(START_MARKER))
        .ok_or(TemplateError::MissingStartMarker)?;

    let mut lines = Vec::with_capacity(template.len() + rendered.len());
    lines.extend(template[..start].iter().map(|line| line.as_ref().to_string()));
    lines.extend_from_slice(rendered);
    lines.extend(template[start..].iter().map(|line| line.as_ref().to_string()));
    Ok(lines)
}
