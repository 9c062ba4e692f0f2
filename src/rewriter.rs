//! Content rewriter: deletes matched shortcode spans until a fixed point.

use crate::matcher::{self, Selector};
use crate::types::MatchSpan;

/// Strip the targeted directives from `body` and trim the result.
///
/// Complete occurrences are removed repeatedly until none remain, then any
/// bare opening or closing token of the targeted set is swept. Deleting a
/// token can splice a new one together (`[[x]y]`), so the two phases repeat
/// until neither finds anything. Every round removes at least one non-empty
/// span, so this always terminates.
///
/// Escaped brackets are neither matched nor unescaped.
pub fn clean(body: &str, selector: &Selector<'_>) -> String {
    let mut current = body.to_string();
    loop {
        current = remove_complete_matches(current, selector);
        let leftovers = matcher::find_leftovers(&current, selector);
        if leftovers.is_empty() {
            break;
        }
        tracing::trace!(count = leftovers.len(), "sweeping leftover tokens");
        current = remove_spans(&current, &leftovers);
    }
    return current.trim().to_string();
}

/// Run the matcher and delete its spans until it comes back empty.
fn remove_complete_matches(mut body: String, selector: &Selector<'_>) -> String {
    loop {
        let spans = matcher::find_matches(&body, selector);
        if spans.is_empty() {
            return body;
        }
        tracing::trace!(count = spans.len(), "removing matched directives");
        body = remove_spans(&body, &spans);
    }
}

/// Copy `body` without the given sorted, disjoint spans.
fn remove_spans(body: &str, spans: &[MatchSpan<'_>]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(body.get(cursor..span.range.start).unwrap_or_default());
        cursor = span.range.end;
    }
    out.push_str(body.get(cursor..).unwrap_or_default());
    return out;
}
