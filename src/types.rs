//! Core domain types for shortclean documents, directives, and matches.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

/// Immutable snapshot of the directive registry, taken once per operation.
/// Lookups are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredNames(
    /// Registered directive names.
    HashSet<String>,
);

impl RegisteredNames {
    /// Whether `name` is a registered directive.
    pub fn contains(&self, name: &str) -> bool {
        return self.0.contains(name);
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        return self.0.is_empty();
    }

    /// Number of registered directives.
    pub fn len(&self) -> usize {
        return self.0.len();
    }
}

impl<S: Into<String>> FromIterator<S> for RegisteredNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        return Self(iter.into_iter().map(Into::into).collect());
    }
}

/// Stable identifier of a document within its store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct DocumentId(
    /// Store-specific identifier text (a `/`-separated relative path for the filesystem store).
    pub String,
);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Read-only descriptive metadata used for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Content type, e.g. `post` or `page`.
    pub doc_type: String,
    /// Locator to open the document for editing.
    pub edit_link: String,
    /// Publication status, e.g. `publish` or `draft`.
    pub status: String,
    /// Human-readable title.
    pub title: String,
    /// Locator to view the rendered document.
    pub view_link: String,
}

/// A document as fetched from the store. Only `body` is ever rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Text scanned and rewritten by the cleaner.
    pub body: String,
    /// Store identifier.
    pub id: DocumentId,
    /// Reporting metadata.
    pub meta: DocumentMeta,
}

/// One directive occurrence located in a body.
/// `range` starts on a `[` and ends just past the matching `]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan<'a> {
    /// Directive name as written in the opening token.
    pub name: &'a str,
    /// Byte range of the occurrence, including nested content for pairs.
    pub range: Range<usize>,
}

/// A place where an unregistered directive was found.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Location {
    /// Document content type.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Locator to open the document for editing.
    pub edit_link: String,
    /// Document identifier.
    pub id: DocumentId,
    /// Document title.
    pub title: String,
    /// Locator to view the document.
    pub view_link: String,
}

impl Location {
    /// Capture the reporting fields of a document.
    pub fn of(document: &Document) -> Self {
        return Self {
            doc_type: document.meta.doc_type.clone(),
            edit_link: document.meta.edit_link.clone(),
            id: document.id.clone(),
            title: document.meta.title.clone(),
            view_link: document.meta.view_link.clone(),
        };
    }
}

/// True when `name` is a syntactically valid directive name:
/// non-empty, ASCII letters, digits, `_` and `-` only.
pub fn is_directive_name(name: &str) -> bool {
    return !name.is_empty()
        && name.bytes().all(|b| return b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
}
