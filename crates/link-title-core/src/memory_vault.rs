use crate::metadata::{Document, DocumentStore, Metadata, MetadataIndex, DOCUMENT_EXTENSION};
use anyhow::anyhow;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory document store and metadata index.
///
/// Serves as the host for tests and for embedders that already hold their notes
/// in memory. Link resolution follows the host conventions the engine expects:
/// bare names get `.md`, paths relative to the linking note win over absolute
/// ones, and a suffix match (first by sorted path) is the last resort.
#[derive(Default)]
pub struct MemoryVault {
    /// path -> full text
    texts: DashMap<String, String>,
    /// path -> parsed metadata snapshot
    metadata: DashMap<String, Arc<Metadata>>,
    /// path -> number of write_text calls
    writes: DashMap<String, usize>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, text: &str, metadata: Metadata) {
        self.insert_text(path, text);
        self.set_metadata(path, metadata);
    }

    pub fn insert_text(&self, path: &str, text: &str) {
        self.texts.insert(path.to_string(), text.to_string());
    }

    pub fn set_metadata(&self, path: &str, metadata: Metadata) {
        self.metadata.insert(path.to_string(), Arc::new(metadata));
    }

    /// Remove a document's text and metadata.
    pub fn remove(&self, path: &str) {
        self.texts.remove(path);
        self.metadata.remove(path);
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.texts.get(path).map(|t| t.value().clone())
    }

    pub fn write_count(&self, path: &str) -> usize {
        self.writes.get(path).map(|n| *n).unwrap_or(0)
    }

    /// All paths that have metadata, sorted for deterministic suffix matching.
    fn indexed_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.metadata.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    fn resolve(&self, raw: &str, from_path: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }
        let normalized = if raw.contains('.') {
            raw.to_string()
        } else {
            format!("{}.{}", raw, DOCUMENT_EXTENSION)
        };

        let relative = resolve_relative(from_path, &normalized);
        if self.metadata.contains_key(&relative) {
            return Some(relative);
        }
        if self.metadata.contains_key(&normalized) {
            return Some(normalized);
        }

        let suffix = format!("/{}", normalized);
        self.indexed_paths().into_iter().find(|p| p.ends_with(&suffix))
    }
}

/// Resolve `reference` against the directory containing `current_file_path`.
///
/// Example: `resolve_relative("Notes/Source.md", "../Ideas.md")` → `"Ideas.md"`
fn resolve_relative(current_file_path: &str, reference: &str) -> String {
    let dir = current_file_path
        .rfind('/')
        .map(|idx| &current_file_path[..idx])
        .unwrap_or("");
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();

    for part in reference.split('/') {
        if part == ".." {
            segments.pop();
        } else if part != "." && !part.is_empty() {
            segments.push(part);
        }
    }

    segments.join("/")
}

#[async_trait]
impl DocumentStore for MemoryVault {
    fn list_documents(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.texts.iter().map(|e| Document::new(e.key().clone())).collect();
        docs.sort();
        docs
    }

    async fn read_text(&self, doc: &Document) -> anyhow::Result<String> {
        self.text(&doc.path)
            .ok_or_else(|| anyhow!("Document not found: {}", doc.path))
    }

    async fn write_text(&self, doc: &Document, text: &str) -> anyhow::Result<()> {
        self.texts.insert(doc.path.clone(), text.to_string());
        *self.writes.entry(doc.path.clone()).or_insert(0) += 1;
        Ok(())
    }
}

#[async_trait]
impl MetadataIndex for MemoryVault {
    fn metadata_for_path(&self, path: &str) -> Option<Arc<Metadata>> {
        self.metadata.get(path).map(|m| Arc::clone(&m))
    }

    async fn resolve_link_path(&self, raw: &str, from_path: &str) -> Option<Document> {
        self.resolve(raw, from_path).map(Document::new)
    }
}
