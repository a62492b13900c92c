//! GitHub Actions workflow-command annotations for formatted failures.

use commitguard_types::FormattedFailure;

use crate::protocol::formatted_message;

/// `::<level> file=<file>[,line=<n>][,col=<n>],title=<title>::<message>`
pub fn render_annotation(failure: &FormattedFailure) -> String {
    let mut out = format!(
        "::{} file={}",
        failure.severity.annotation_level(),
        escape_property(&failure.file)
    );
    if let Some(line) = failure.line {
        out.push_str(&format!(",line={line}"));
    }
    if let Some(col) = failure.column {
        out.push_str(&format!(",col={col}"));
    }
    out.push_str(&format!(
        ",title={}::{}",
        escape_property(&failure.title),
        escape_data(&formatted_message(failure))
    ));
    out
}

pub fn render_annotations(failures: &[FormattedFailure]) -> Vec<String> {
    failures.iter().map(render_annotation).collect()
}

/// Workflow commands end at a newline; encode the characters that would
/// otherwise truncate or corrupt the message.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Property values additionally end at `,` and `:`.
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
