//! In-memory document store for operation tests.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::error::Error;
use crate::store::{DocumentFilter, DocumentStore};
use crate::types::{Document, DocumentId, DocumentMeta};

/// Records every write and can be told to fail writes for particular ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Stored documents in insertion order.
    documents: RwLock<Vec<Document>>,
    /// Ids whose writes are refused.
    failing: HashSet<String>,
    /// Ids written so far.
    writes: RwLock<Vec<DocumentId>>,
}

impl MemoryStore {
    /// Current body of `id`.
    pub fn body(&self, id: &str) -> Option<String> {
        let documents = self.documents.read().ok()?;
        return documents.iter().find(|d| return d.id.0 == id).map(|d| return d.body.clone());
    }

    /// Make writes to `id` fail.
    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        return self;
    }

    /// Add a document with the given id, type and body.
    pub fn with_document(self, id: &str, doc_type: &str, body: &str) -> Self {
        if let Ok(mut documents) = self.documents.write() {
            documents.push(Document {
                body: body.to_string(),
                id: DocumentId(id.to_string()),
                meta: DocumentMeta {
                    doc_type: doc_type.to_string(),
                    edit_link: format!("edit/{id}"),
                    status: "publish".to_string(),
                    title: id.to_string(),
                    view_link: format!("view/{id}"),
                },
            });
        }
        return self;
    }

    /// Ids written so far, in order.
    pub fn writes(&self) -> Vec<DocumentId> {
        return self.writes.read().map(|w| return w.clone()).unwrap_or_default();
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &DocumentId) -> Result<Document, Error> {
        let documents = self.documents.read().map_err(|_err| return Error::Io(std::io::Error::other("poisoned")))?;
        return documents
            .iter()
            .find(|d| return d.id == *id)
            .cloned()
            .ok_or_else(|| return Error::DocumentNotFound { id: id.0.clone() });
    }

    fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, Error> {
        let documents = self.documents.read().map_err(|_err| return Error::Io(std::io::Error::other("poisoned")))?;
        return Ok(documents.iter().filter(|d| return filter.accepts(&d.meta)).cloned().collect());
    }

    fn replace_body(&self, id: &DocumentId, body: &str) -> Result<(), Error> {
        if self.failing.contains(&id.0) {
            return Err(Error::Io(std::io::Error::other(format!("write refused for {id}"))));
        }
        let mut documents = self.documents.write().map_err(|_err| return Error::Io(std::io::Error::other("poisoned")))?;
        let document = documents
            .iter_mut()
            .find(|d| return d.id == *id)
            .ok_or_else(|| return Error::DocumentNotFound { id: id.0.clone() })?;
        document.body = body.to_string();
        if let Ok(mut writes) = self.writes.write() {
            writes.push(id.clone());
        }
        return Ok(());
    }
}
