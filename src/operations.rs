//! Caller-facing operations: clean one document, clean a collection, report usage.

use crate::error::Error;
use crate::indexer::{self, UsageReport};
use crate::matcher::Selector;
use crate::rewriter;
use crate::store::{DocumentFilter, DocumentStore};
use crate::types::{Document, DocumentId, RegisteredNames, is_directive_name};

/// Outcome of a collection-wide clean.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Documents whose body changed and was written back.
    pub cleaned: Vec<DocumentId>,
    /// Documents whose write failed, with the reason.
    pub failed: Vec<(DocumentId, String)>,
    /// Documents examined.
    pub scanned: usize,
}

/// Rewrite one document with `selector` and write it back if it changed.
/// Returns whether a write happened.
///
/// # Errors
///
/// Returns the store's write error.
fn rewrite_document(
    store: &impl DocumentStore,
    document: &Document,
    selector: &Selector<'_>,
) -> Result<bool, Error> {
    let cleaned = rewriter::clean(&document.body, selector);
    if cleaned == document.body {
        tracing::debug!(document = %document.id, "unchanged");
        return Ok(false);
    }
    store.replace_body(&document.id, &cleaned)?;
    tracing::info!(document = %document.id, removed_bytes = document.body.len().saturating_sub(cleaned.len()), "cleaned");
    return Ok(true);
}

/// Rewrite every document, isolating write failures to their own document.
fn rewrite_each<'d>(
    store: &impl DocumentStore,
    documents: impl IntoIterator<Item = &'d Document>,
    selector: &Selector<'_>,
    report: &mut CleanReport,
) {
    for document in documents {
        match rewrite_document(store, document, selector) {
            Ok(true) => report.cleaned.push(document.id.clone()),
            Ok(false) => {},
            Err(e) => {
                tracing::warn!(document = %document.id, error = %e, "write failed");
                report.failed.push((document.id.clone(), e.to_string()));
            },
        }
    }
    return;
}

/// Strip every unregistered shortcode from one document.
/// Returns whether the document changed.
///
/// # Errors
///
/// Returns `Error::DocumentNotFound` for unknown ids, or the store's write error.
pub fn clean_one(
    store: &impl DocumentStore,
    id: &DocumentId,
    registered: &RegisteredNames,
) -> Result<bool, Error> {
    let document = store.get(id)?;
    return rewrite_document(store, &document, &Selector::Unregistered(registered));
}

/// Strip every unregistered shortcode from every document passing `filter`.
///
/// # Errors
///
/// Returns errors from listing documents. Per-document write failures are
/// reported in [`CleanReport::failed`] instead.
pub fn clean_all_unregistered(
    store: &impl DocumentStore,
    registered: &RegisteredNames,
    filter: &DocumentFilter,
) -> Result<CleanReport, Error> {
    let documents = store.list(filter)?;
    let mut report = CleanReport { scanned: documents.len(), ..CleanReport::default() };
    rewrite_each(store, &documents, &Selector::Unregistered(registered), &mut report);
    return Ok(report);
}

/// Strip every occurrence of `name`, registered or not, across documents
/// passing `filter`. Documents that never contain `[name` are skipped
/// without running the matcher.
///
/// # Errors
///
/// Returns `Error::MissingDirectiveName` for a blank name, before any document
/// is read, or errors from listing documents.
pub fn clean_named(
    store: &impl DocumentStore,
    name: &str,
    filter: &DocumentFilter,
) -> Result<CleanReport, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::MissingDirectiveName);
    }
    if !is_directive_name(name) {
        tracing::warn!(name, "not a valid shortcode name, nothing can match it");
    }

    let documents = store.list(filter)?;
    let opening = format!("[{name}");
    let candidates = documents.iter().filter(|d| return d.body.contains(&opening));

    let mut report = CleanReport { scanned: documents.len(), ..CleanReport::default() };
    rewrite_each(store, candidates, &Selector::Named(name), &mut report);
    return Ok(report);
}

/// Index shortcode usage across documents passing `filter`.
///
/// # Errors
///
/// Returns errors from listing documents.
pub fn fetch_usage(
    store: &impl DocumentStore,
    registered: &RegisteredNames,
    filter: &DocumentFilter,
) -> Result<UsageReport, Error> {
    let documents = store.list(filter)?;
    return Ok(indexer::index(&documents, registered));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::MemoryStore;

    fn id(s: &str) -> DocumentId {
        return DocumentId(s.to_string());
    }

    #[test]
    fn clean_one_writes_only_when_changed() {
        let store = MemoryStore::default()
            .with_document("dirty", "post", "keep [gone/] [ok]x[/ok]")
            .with_document("clean", "post", "[ok]x[/ok]");
        let registered: RegisteredNames = ["ok"].into_iter().collect();

        assert!(clean_one(&store, &id("dirty"), &registered).unwrap());
        assert!(!clean_one(&store, &id("clean"), &registered).unwrap());
        assert_eq!(store.body("dirty").unwrap(), "keep  [ok]x[/ok]");
        assert_eq!(store.writes(), vec![id("dirty")]);
    }

    #[test]
    fn trimmed_body_counts_as_a_change() {
        let store = MemoryStore::default().with_document("a", "post", "  [ok/] text\n");
        let registered: RegisteredNames = ["ok"].into_iter().collect();

        assert!(clean_one(&store, &id("a"), &registered).unwrap());
        assert_eq!(store.body("a").unwrap(), "[ok/] text");
        assert_eq!(store.writes(), vec![id("a")]);
    }

    #[test]
    fn clean_all_reports_whitespace_only_changes() {
        let store = MemoryStore::default()
            .with_document("a", "post", "already clean")
            .with_document("b", "post", "\nneeds trimming\n");
        let report = clean_all_unregistered(&store, &RegisteredNames::default(), &DocumentFilter::default()).unwrap();

        assert_eq!(report.cleaned, vec![id("b")]);
        assert_eq!(store.writes(), vec![id("b")]);
    }

    #[test]
    fn clean_one_unknown_document() {
        let store = MemoryStore::default();
        let result = clean_one(&store, &id("missing"), &RegisteredNames::default());
        assert!(matches!(result, Err(Error::DocumentNotFound { .. })));
    }

    #[test]
    fn clean_all_counts_only_changed_documents() {
        let store = MemoryStore::default()
            .with_document("a", "post", "[x]one[/x]")
            .with_document("b", "post", "plain")
            .with_document("c", "page", "[y/] two");
        let report = clean_all_unregistered(&store, &RegisteredNames::default(), &DocumentFilter::default()).unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.cleaned, vec![id("a"), id("c")]);
        assert!(report.failed.is_empty());
        assert_eq!(store.body("a").unwrap(), "");
        assert_eq!(store.body("c").unwrap(), "two");
    }

    #[test]
    fn write_failure_does_not_stop_other_documents() {
        let store = MemoryStore::default()
            .with_document("a", "post", "[x/]a")
            .with_document("b", "post", "[x/]b")
            .with_document("c", "post", "[x/]c")
            .failing_on("b");
        let report = clean_all_unregistered(&store, &RegisteredNames::default(), &DocumentFilter::default()).unwrap();

        assert_eq!(report.cleaned, vec![id("a"), id("c")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, id("b"));
        assert_eq!(store.body("b").unwrap(), "[x/]b");
    }

    #[test]
    fn clean_all_respects_type_filter() {
        let store = MemoryStore::default()
            .with_document("a", "post", "[x/]")
            .with_document("b", "page", "[x/]");
        let filter = DocumentFilter { types: vec!["page".to_string()], ..DocumentFilter::default() };
        let report = clean_all_unregistered(&store, &RegisteredNames::default(), &filter).unwrap();

        assert_eq!(report.scanned, 1);
        assert_eq!(store.writes(), vec![id("b")]);
    }

    #[test]
    fn clean_named_removes_even_registered_names() {
        let store = MemoryStore::default()
            .with_document("a", "post", "[test]content[/test] [test2]x[/test2]")
            .with_document("b", "post", "nothing here");
        let report = clean_named(&store, "test", &DocumentFilter::default()).unwrap();

        assert_eq!(report.cleaned, vec![id("a")]);
        assert_eq!(store.body("a").unwrap(), "[test2]x[/test2]");
    }

    #[test]
    fn clean_named_prefilter_skips_lookalikes_without_writing() {
        let store = MemoryStore::default().with_document("a", "post", "[test2]x[/test2]");
        let report = clean_named(&store, "test", &DocumentFilter::default()).unwrap();

        assert!(report.cleaned.is_empty());
        assert!(store.writes().is_empty());
    }

    #[test]
    fn clean_named_not_found_is_not_an_error() {
        let store = MemoryStore::default().with_document("a", "post", "text");
        let report = clean_named(&store, "absent", &DocumentFilter::default()).unwrap();
        assert_eq!(report, CleanReport { scanned: 1, ..CleanReport::default() });
    }

    #[test]
    fn clean_named_rejects_blank_name_before_touching_documents() {
        let store = MemoryStore::default().with_document("a", "post", "[x/]");
        for name in ["", "   "] {
            let result = clean_named(&store, name, &DocumentFilter::default());
            assert!(matches!(result, Err(Error::MissingDirectiveName)));
        }
        assert!(store.writes().is_empty());
    }

    #[test]
    fn fetch_usage_reports_used_and_unused() {
        let store = MemoryStore::default()
            .with_document("p1", "post", "[a][b]")
            .with_document("p2", "page", "[b x=1/]");
        let registered: RegisteredNames = ["a"].into_iter().collect();
        let usage = fetch_usage(&store, &registered, &DocumentFilter::default()).unwrap();

        assert_eq!(usage.used.iter().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(usage.unused.len(), 1);
        assert_eq!(usage.unused[0].name, "b");
        let ids: Vec<&DocumentId> = usage.unused[0].locations.iter().map(|l| return &l.id).collect();
        assert_eq!(ids, vec![&id("p1"), &id("p2")]);
        assert_eq!(usage.unused[0].locations[1].edit_link, "edit/p2");
        assert_eq!(usage.unused[0].locations[1].view_link, "view/p2");
    }
}
