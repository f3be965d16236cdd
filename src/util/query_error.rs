//! Query compilation diagnostics.
//!
//! Query strings are compiled against grammar versions that move
//! underneath us; when compilation fails, the raw `QueryError` points
//! at a byte offset in a string the user never wrote. This formats the
//! failure with the query text and a caret at the offending position.

use tree_sitter::{QueryError, QueryErrorKind};

/// Render a query compilation failure with source context.
pub fn format_query_error(
    lang_name: &str,
    query_kind: &str,
    query_str: &str,
    error: &QueryError,
) -> String {
    let mut msg = format!(
        "invalid {} query for {} ({}) at line {}, column {}",
        query_kind,
        lang_name,
        describe_kind(&error.kind),
        error.row + 1,
        error.column + 1,
    );
    if !error.message.is_empty() {
        msg.push_str(&format!(": {}", error.message));
    }
    msg.push('\n');

    let lines: Vec<&str> = query_str.lines().collect();
    let first = error.row.saturating_sub(2);
    let last = (error.row + 3).min(lines.len());
    for (idx, line) in lines.iter().enumerate().take(last).skip(first) {
        let marker = if idx == error.row { ">>>" } else { "   " };
        msg.push_str(&format!("{} {:3} | {}\n", marker, idx + 1, line));
        if idx == error.row {
            msg.push_str(&format!("          {}^\n", " ".repeat(error.column)));
        }
    }
    msg
}

fn describe_kind(kind: &QueryErrorKind) -> &'static str {
    match kind {
        QueryErrorKind::Syntax => "syntax error",
        QueryErrorKind::NodeType => "invalid node type",
        QueryErrorKind::Field => "invalid field name",
        QueryErrorKind::Capture => "invalid capture",
        QueryErrorKind::Predicate => "invalid predicate",
        QueryErrorKind::Structure => "structure error",
        QueryErrorKind::Language => "language mismatch",
    }
}
