//! Document stores: where bodies are listed from and written back to.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;
use crate::types::{Document, DocumentId, DocumentMeta};

/// Front matter delimiter line.
const FRONT_MATTER_FENCE: &str = "+++";

/// Suffix of the sibling file a write is staged in before the rename.
const STAGING_SUFFIX: &str = ".shortclean-tmp";

/// Selects documents by content type and status. Empty lists match anything.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Accepted statuses.
    pub statuses: Vec<String>,
    /// Accepted content types.
    pub types: Vec<String>,
}

impl DocumentFilter {
    /// Whether the document's metadata passes the filter.
    pub fn accepts(&self, meta: &DocumentMeta) -> bool {
        let type_ok = self.types.is_empty() || self.types.iter().any(|t| return *t == meta.doc_type);
        let status_ok = self.statuses.is_empty() || self.statuses.iter().any(|s| return *s == meta.status);
        return type_ok && status_ok;
    }
}

/// Persistence for documents. Implementations decide what an id means.
pub trait DocumentStore {
    /// Fetch one document by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::DocumentNotFound` if no such document exists.
    fn get(&self, id: &DocumentId) -> Result<Document, Error>;

    /// List documents passing `filter`, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns store-specific I/O errors.
    fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, Error>;

    /// Replace a document's body, leaving its metadata untouched.
    ///
    /// # Errors
    ///
    /// Returns store-specific I/O errors.
    fn replace_body(&self, id: &DocumentId, body: &str) -> Result<(), Error>;
}

/// Metadata keys read from a `+++` TOML front matter block.
#[derive(Debug, Default, serde::Deserialize)]
struct FrontMatter {
    /// Content type override.
    #[serde(default, rename = "type")]
    doc_type: Option<String>,
    /// View slug override.
    #[serde(default)]
    slug: Option<String>,
    /// Publication status.
    #[serde(default)]
    status: Option<String>,
    /// Display title.
    #[serde(default)]
    title: Option<String>,
}

/// Documents stored as files under a root directory.
///
/// Files may carry `+++` TOML front matter with `title`, `type`, `status`
/// and `slug`.
#[derive(Debug)]
pub struct FsStore {
    /// File selection and locator settings.
    config: Config,
    /// Corpus root; ids are relative to it.
    root: PathBuf,
}

impl FsStore {
    /// Create a store over `root` using `config` for file selection and locators.
    pub const fn new(root: PathBuf, config: Config) -> Self {
        return Self { config, root };
    }

    /// Build the document for one file's content.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFrontMatter` if the front matter is malformed.
    fn document_from_content(&self, id: &str, content: &str) -> Result<Document, Error> {
        let path = self.root.join(id);
        let (block, body) = split_front_matter(content);
        let front = parse_front_matter(block, &path)?;

        let relative = Path::new(id);
        let title = front.title.unwrap_or_else(|| {
            return relative.file_stem().map(|s| return s.to_string_lossy().into_owned()).unwrap_or_default();
        });
        let doc_type = front.doc_type.unwrap_or_else(|| return default_type(id));
        let slug = front.slug.unwrap_or_else(|| return default_slug(id));
        let slug = slug.trim_start_matches('/');
        let view_link = self
            .config
            .base_url()
            .map_or_else(|| return format!("/{slug}"), |base| return format!("{base}/{slug}"));

        return Ok(Document {
            body: body.to_string(),
            id: DocumentId(id.to_string()),
            meta: DocumentMeta {
                doc_type,
                edit_link: path.display().to_string(),
                status: front.status.unwrap_or_else(|| return "publish".to_string()),
                title,
                view_link,
            },
        });
    }

    /// Map an id to its file, refusing ids that leave the root.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocumentId` for empty, absolute, or `..` ids.
    fn path_for(&self, id: &DocumentId) -> Result<PathBuf, Error> {
        let relative = Path::new(&id.0);
        let stays_inside = !id.0.is_empty() && relative.components().all(|c| return matches!(c, Component::Normal(_)));
        if !stays_inside {
            return Err(Error::InvalidDocumentId { id: id.0.clone() });
        }
        return Ok(self.root.join(relative));
    }
}

impl DocumentStore for FsStore {
    fn get(&self, id: &DocumentId) -> Result<Document, Error> {
        let path = self.path_for(id)?;
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::DocumentNotFound { id: id.0.clone() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return self.document_from_content(&id.0, &content);
    }

    fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, Error> {
        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| {
                return match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!(root = %self.root.display(), error = %e, "skipping unreadable path");
                        None
                    },
                };
            })
            .filter(|e| return e.file_type().is_file())
            .filter(|e| {
                return e.path().extension().and_then(|ext| return ext.to_str()).is_some_and(|ext| return self.config.is_document_extension(ext));
            })
        {
            let path = entry.path();
            let Some(id) = relative_id(&self.root, path) else {
                continue;
            };
            if !self.config.should_scan(&id) {
                continue;
            }

            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable document");
                    continue;
                },
            };
            let document = match self.document_from_content(&id, &content) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping document");
                    continue;
                },
            };

            if filter.accepts(&document.meta) {
                documents.push(document);
            }
        }

        tracing::debug!(root = %self.root.display(), count = documents.len(), "documents listed");
        return Ok(documents);
    }

    fn replace_body(&self, id: &DocumentId, body: &str) -> Result<(), Error> {
        let path = self.path_for(id)?;
        let current = std::fs::read_to_string(&path)?;
        let (front_matter, _) = split_front_matter(&current);

        let mut content = String::with_capacity(front_matter.len().saturating_add(body.len()));
        content.push_str(front_matter);
        content.push_str(body);

        // Rename over the original so readers never see a half-written file.
        let mut staging = path.clone().into_os_string();
        staging.push(STAGING_SUFFIX);
        let staging = PathBuf::from(staging);
        let written = std::fs::write(&staging, content).and_then(|()| return std::fs::rename(&staging, &path));
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&staging) {
                tracing::debug!(path = %staging.display(), error = %cleanup, "staging file not removed");
            }
            return Err(Error::Io(e));
        }
        return Ok(());
    }
}

/// Wraps a store so that writes are logged instead of performed.
#[derive(Debug)]
pub struct DryRunStore<'a, S: DocumentStore> {
    /// Store that serves every read.
    inner: &'a S,
}

impl<'a, S: DocumentStore> DryRunStore<'a, S> {
    /// Forward reads to `inner`, swallow writes.
    pub const fn new(inner: &'a S) -> Self {
        return Self { inner };
    }
}

impl<S: DocumentStore> DocumentStore for DryRunStore<'_, S> {
    fn get(&self, id: &DocumentId) -> Result<Document, Error> {
        return self.inner.get(id);
    }

    fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, Error> {
        return self.inner.list(filter);
    }

    fn replace_body(&self, id: &DocumentId, body: &str) -> Result<(), Error> {
        tracing::info!(document = %id, bytes = body.len(), "dry run: write skipped");
        return Ok(());
    }
}

/// Split file content into its front matter block (fences included) and body.
/// Content without a leading fence has an empty front matter.
fn split_front_matter(content: &str) -> (&str, &str) {
    let Some(after_open) = content.strip_prefix(FRONT_MATTER_FENCE) else {
        return ("", content);
    };
    let Some(after_open) = after_open.strip_prefix('\n').or_else(|| return after_open.strip_prefix("\r\n")) else {
        return ("", content);
    };

    let mut offset = content.len().saturating_sub(after_open.len());
    for line in after_open.split_inclusive('\n') {
        offset = offset.saturating_add(line.len());
        if line.trim_end() == FRONT_MATTER_FENCE {
            return content.split_at_checked(offset).unwrap_or(("", content));
        }
    }
    return ("", content);
}

/// Parse the TOML between the fences of a front matter block.
///
/// # Errors
///
/// Returns `Error::InvalidFrontMatter` if the TOML is malformed.
fn parse_front_matter(block: &str, path: &Path) -> Result<FrontMatter, Error> {
    if block.is_empty() {
        return Ok(FrontMatter::default());
    }
    let inner: String = block
        .lines()
        .skip(1)
        .take_while(|line| return line.trim_end() != FRONT_MATTER_FENCE)
        .map(|line| return format!("{line}\n"))
        .collect();
    return toml::from_str(&inner).map_err(|e| return Error::InvalidFrontMatter {
        path: path.to_path_buf(),
        reason: e.message().to_string(),
    });
}

/// Content type inferred from the first directory under the root.
fn default_type(id: &str) -> String {
    return id.split_once('/').map_or_else(|| return "page".to_string(), |(dir, _)| return dir.to_string());
}

/// View slug: the id without its extension, with a trailing `index` dropped.
fn default_slug(id: &str) -> String {
    let stem = id.rsplit_once('.').map_or(id, |(stem, _)| return stem);
    if stem == "index" {
        return String::new();
    }
    return stem.strip_suffix("/index").unwrap_or(stem).to_string();
}

/// `/`-separated path of `path` relative to `root`.
fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative.components().map(|c| return c.as_os_str().to_string_lossy().into_owned()).collect();
    if parts.is_empty() {
        return None;
    }
    return Some(parts.join("/"));
}
