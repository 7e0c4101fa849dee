//! Scripts can keep helper declarations in a block delimited by
//! `% begin - <tag>` and `% end`. The block is cut out of the script so it
//! can be rendered separately.

pub const DEFAULT_TAG: &str = "labtotex";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeclarationsBlock {
    /// Lines of the block, markers included.
    pub declarations: Vec<String>,
    pub remaining: Vec<String>,
}

fn owned(lines: &[impl AsRef<str>]) -> Vec<String> {
    lines.iter().map(|line| line.as_ref().to_string()).collect()
}

/// Splits off the last `% begin - <tag>` … `% end` block of `lines`. Input
/// without a complete block is returned unchanged in `remaining`.
pub fn extract(lines: &[impl AsRef<str>], tag: &str) -> DeclarationsBlock {
    let begin_marker = format!("% begin - {tag}");
    let last_line = |marker: &str| {
        lines
            .iter()
            .rposition(|line| line.as_ref().trim() == marker)
    };

    match (last_line(&begin_marker), last_line("% end")) {
        (Some(begin), Some(end)) if begin <= end => {
            log::debug!("declarations block on lines {}..={}", begin + 1, end + 1);
            let mut remaining = owned(&lines[..begin]);
            remaining.extend(owned(&lines[end + 1..]));
            DeclarationsBlock {
                declarations: owned(&lines[begin..=end]),
                remaining,
            }
        }
        _ => DeclarationsBlock {
            declarations: vec![],
            remaining: owned(lines),
        },
    }
}
