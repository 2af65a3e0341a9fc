use std::io::{self, Write};

use crate::Error;

/// Pretty-print an [`Error`] with the offending source line and a caret
/// under its column.
/// If `program` is `Some("fooked")`, messages are prefixed with "fooked: ...".
pub fn print_error(program: Option<&str>, code: &str, err: &Error) {
    let msg = render_error(program, code, err);
    eprint!("{msg}");
    let _ = io::stderr().flush();
}

/// Build the text [`print_error`] prints.
pub fn render_error(program: Option<&str>, code: &str, err: &Error) -> String {
    let kind = if err.is_parse_error() { "Parse error" } else { "Runtime error" };
    let mut out = match program {
        Some(p) => format!("\n{p}: {kind}: {err}\n"),
        None => format!("\n{kind}: {err}\n"),
    };
    if let Some(context) = context_for(code, err.position().line, err.position().column) {
        out.push_str(&context);
    }
    out
}

/// Show a short window of the given line with a caret under `column`,
/// working with UTF-8 by slicing on char indices.
fn context_for(code: &str, line: usize, column: usize) -> Option<String> {
    const WINDOW_CHARS: usize = 32;

    let text = code.lines().nth(line.checked_sub(1)?)?;
    let total_chars = text.chars().count();
    if total_chars == 0 {
        return None;
    }
    let pos = column.saturating_sub(1).min(total_chars - 1);
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let slice: String = text.chars().skip(start_char).take(end_char - start_char).collect();
    let underline = format!("{}^", " ".repeat(pos - start_char));
    Some(format!("  {slice}\n  {underline}\n"))
}
