//! Usage indexer: which directive names the corpus references, and where.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::matcher;
use crate::types::{Document, Location, RegisteredNames};

/// An unregistered directive together with every place it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedDirective {
    /// One entry per occurrence, in document scan order.
    pub locations: Vec<Location>,
    /// Directive name.
    pub name: String,
}

/// Referenced directive names split by registration status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    /// Unregistered names in first-seen order.
    #[serde(rename = "unused_shortcodes")]
    pub unused: Vec<UnusedDirective>,
    /// Registered names that appear at least once.
    #[serde(rename = "used_shortcodes")]
    pub used: BTreeSet<String>,
}

/// Scan every document for opening tokens and classify the names found.
///
/// A document that opens the same name twice contributes two locations.
pub fn index(documents: &[Document], registered: &RegisteredNames) -> UsageReport {
    let mut order: Vec<&str> = Vec::new();
    let mut usage: HashMap<&str, Vec<Location>> = HashMap::new();

    for document in documents {
        for opening in matcher::find_openings(&document.body) {
            let locations = usage.entry(opening.name).or_insert_with(|| {
                order.push(opening.name);
                return Vec::new();
            });
            locations.push(Location::of(document));
        }
    }

    let mut report = UsageReport::default();
    for name in order {
        if registered.contains(name) {
            report.used.insert(name.to_string());
            continue;
        }
        let locations = usage.remove(name).unwrap_or_default();
        report.unused.push(UnusedDirective { locations, name: name.to_string() });
    }

    tracing::debug!(
        documents = documents.len(),
        used = report.used.len(),
        unused = report.unused.len(),
        "usage indexed"
    );
    return report;
}
