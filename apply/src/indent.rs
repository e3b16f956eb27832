//! Indentation normalization for inserted declarations.
//!
//! Extraction refactors insert a declaration whose indentation comes from
//! the server's own formatter settings, which can disagree with the file's
//! actual style. When that happens the inserted declaration line is
//! re-indented to match the nearest non-blank neighboring line.

const NEIGHBOR_SEARCH_LINES: usize = 3;

const DECLARATION_PREFIXES: &[&str] = &[
    "function ",
    "async function ",
    "const ",
    "let ",
    "var ",
    "export function ",
    "export const ",
];

/// Re-indent the first declaration line in `replacement` to match its
/// surroundings. `lines` is the pre-splice line array; the replacement
/// will occupy `[start_idx, end_idx]`.
pub(crate) fn normalize_inserted_declaration(
    replacement: &mut [String],
    lines: &[String],
    start_idx: usize,
    end_idx: usize,
) {
    let Some(decl_idx) = replacement
        .iter()
        .position(|line| is_declaration_line(line))
    else {
        return;
    };

    let Some(neighbor_ws) = neighbor_indent(replacement, lines, decl_idx, start_idx, end_idx)
    else {
        return;
    };

    let decl_ws = leading_whitespace(&replacement[decl_idx]);
    if neighbor_ws == decl_ws {
        return;
    }

    let body = replacement[decl_idx].trim_start().to_string();
    replacement[decl_idx] = format!("{neighbor_ws}{body}");
}

fn is_declaration_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    DECLARATION_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

/// Indentation of the nearest non-blank line around the declaration in
/// the *updated* file: forward first, then backward, each bounded to a
/// few lines. Forward neighbors start with the rest of the replacement
/// block (the shifted-down suffix lines), then the untouched lines below
/// the span; backward mirrors that.
fn neighbor_indent(
    replacement: &[String],
    lines: &[String],
    decl_idx: usize,
    start_idx: usize,
    end_idx: usize,
) -> Option<String> {
    let forward = replacement[decl_idx + 1..]
        .iter()
        .chain(lines.iter().skip(end_idx + 1))
        .take(NEIGHBOR_SEARCH_LINES)
        .find(|l| !l.trim().is_empty());

    let neighbor = forward.or_else(|| {
        replacement[..decl_idx]
            .iter()
            .rev()
            .chain(lines[..start_idx].iter().rev())
            .take(NEIGHBOR_SEARCH_LINES)
            .find(|l| !l.trim().is_empty())
    })?;

    Some(leading_whitespace(neighbor).to_string())
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(line.len());
    &line[..end]
}
