//! Markdown rendering of errors for the terminal.

use crate::error::Error;

/// ANSI bold, used for headings.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::DocumentNotFound { id } => render_document_not_found(id),
        Error::InvalidDocumentId { id } => render_invalid_document_id(id),
        Error::InvalidFrontMatter { path, reason } => render_invalid_front_matter(path, reason),
        Error::MissingDirectiveName => render_missing_directive_name(),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Correct `.shortclean.toml`, or delete it to fall back to defaults.
"),
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
    };
}

/// Unknown document id.
fn render_document_not_found(id: &str) -> String {
    return format!("\
# Error: Document Not Found

`{id}` does not exist under the corpus root.

## Fix

Document ids are paths relative to `--root`, using `/` separators. List them with:

    shortclean usage --json
");
}

/// Id rejected before touching the filesystem.
fn render_invalid_document_id(id: &str) -> String {
    return format!("\
# Error: Invalid Document Id

`{id}` is empty, absolute, or leaves the corpus root.
");
}

/// Front matter that is not TOML.
fn render_invalid_front_matter(path: &std::path::Path, reason: &str) -> String {
    return format!("\
# Error: Invalid Front Matter

`{}`: {reason}

## Fix

Front matter is TOML between two `+++` lines at the top of the file:

    +++
    title = \"About\"
    type = \"page\"
    +++
", path.display());
}

/// Blank shortcode name given to `remove` or `strip --name`.
fn render_missing_directive_name() -> String {
    return "\
# Error: No Shortcode Provided

A shortcode name is required, and it cannot be blank.

## Fix

    shortclean remove <NAME>
    shortclean strip --name <NAME>
"
    .to_string();
}
