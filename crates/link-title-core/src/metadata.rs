use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Extension carried by every document the engine rewrites.
pub const DOCUMENT_EXTENSION: &str = "md";

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// A document in the host's store, identified by its slash-separated path
/// (e.g. `"Notes/Ideas.md"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
}

impl Document {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Last path segment, extension included: `"Ideas.md"`.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Last path segment with its extension removed: `"Ideas"`.
    pub fn basename(&self) -> &str {
        strip_extension(self.name())
    }

    pub fn is_markdown(&self) -> bool {
        has_document_extension(&self.path)
    }
}

/// True if `path` ends in `.md`.
pub fn has_document_extension(path: &str) -> bool {
    path.strip_suffix(DOCUMENT_EXTENSION)
        .is_some_and(|rest| rest.ends_with('.'))
}

/// Drop the last `.ext` of a file name, if there is one.
///
/// A leading dot (`".hidden"`) is part of the name, not an extension.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub heading: String,
    pub level: u8,
}

/// An outgoing link or embed as cached by the metadata index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Raw target reference, e.g. `"note2#Section"` or `"note2.md"`
    pub link: String,
    /// Text as it appears in the document, e.g. `"[[note2#Section|here]]"`
    pub original: String,
}

impl LinkRecord {
    pub fn new(link: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            original: original.into(),
        }
    }
}

/// Immutable snapshot of a document's parsed structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub frontmatter: Option<Map<String, Value>>,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub embeds: Vec<LinkRecord>,
}

impl Metadata {
    /// Raw front-matter value at `key`.
    pub fn frontmatter_value(&self, key: &str) -> Option<&Value> {
        self.frontmatter.as_ref()?.get(key)
    }

    /// Front-matter value at `key` if it is a non-empty string.
    pub fn frontmatter_str(&self, key: &str) -> Option<&str> {
        match self.frontmatter_value(key)? {
            Value::String(s) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn first_heading(&self) -> Option<&str> {
        self.headings.first().map(|h| h.heading.as_str())
    }

    /// Aliases declared in front matter, in declaration order.
    pub fn aliases(&self) -> Vec<String> {
        let value = self
            .frontmatter_value("aliases")
            .or_else(|| self.frontmatter_value("alias"));
        Aliases::from_value(value).into_vec()
    }
}

/// The shapes an `aliases` front-matter field can take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Aliases {
    None,
    Single(String),
    List(Vec<String>),
}

impl Aliases {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Aliases::Single(s.clone()),
            Some(Value::Array(items)) => Aliases::List(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => Aliases::None,
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            Aliases::None => Vec::new(),
            Aliases::Single(s) => vec![s],
            Aliases::List(items) => items,
        }
    }
}

// ---------------------------------------------------------------------------
// Host collaborators
// ---------------------------------------------------------------------------

/// Persistent document storage owned by the host application.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in the store. Order is not significant.
    fn list_documents(&self) -> Vec<Document>;

    async fn read_text(&self, doc: &Document) -> anyhow::Result<String>;

    /// Replace the full contents of `doc`.
    async fn write_text(&self, doc: &Document, text: &str) -> anyhow::Result<()>;
}

/// The host's derived-metadata cache and link resolver.
#[async_trait]
pub trait MetadataIndex: Send + Sync {
    fn metadata_for_path(&self, path: &str) -> Option<Arc<Metadata>>;

    fn metadata_for(&self, doc: &Document) -> Option<Arc<Metadata>> {
        self.metadata_for_path(&doc.path)
    }

    /// Resolve a raw link reference written in the document at `from_path`.
    /// Normalization rules (default extension, relative lookup) belong to the host.
    async fn resolve_link_path(&self, raw: &str, from_path: &str) -> Option<Document>;
}
