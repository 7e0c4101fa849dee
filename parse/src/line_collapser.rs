use crate::error::CollapseError;

/// One statement after multi-line array literals are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    /// 1-based index of the first physical line.
    pub source_index: usize,
}

/// The part of a line before its comment.
fn code_part(line: &str) -> &str {
    line.split('%').next().unwrap_or_default()
}

fn is_unbalanced(line: &str) -> bool {
    let code = code_part(line);
    code.matches('[').count() != code.matches(']').count()
}

pub fn collapse_lines(lines: &[impl AsRef<str>]) -> Result<Vec<LogicalLine>, CollapseError> {
    let mut collapsed = Vec::with_capacity(lines.len());
    let mut index = 0;

    while index < lines.len() {
        let first = lines[index].as_ref();
        let source_index = index + 1;

        if !is_unbalanced(first) {
            collapsed.push(LogicalLine {
                text: first.to_string(),
                source_index,
            });
            index += 1;
            continue;
        }

        let Some(offset) = lines[index + 1..]
            .iter()
            .position(|line| code_part(line.as_ref()).contains(']'))
        else {
            return Err(CollapseError::UnterminatedArray { line: source_index });
        };
        let end = index + 1 + offset;

        log::trace!("collapsing lines {source_index}..={}", end + 1);
        let text = lines[index..=end]
            .iter()
            .map(|line| line.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");
        collapsed.push(LogicalLine { text, source_index });
        index = end + 1;
    }

    Ok(collapsed)
}
