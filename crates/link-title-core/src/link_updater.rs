use crate::alias::resolve_alias;
use crate::link_parser::{
    apply_edits, extract_markdown_links, extract_wikilinks, format_markdown_link, format_wikilink,
    LinkOccurrence, TextEdit,
};
use crate::metadata::{strip_extension, Document, DocumentStore, MetadataIndex};
use crate::settings::Settings;
use crate::title::resolve_title;
use std::collections::HashSet;
use std::sync::Arc;

/// What a resolved link target should be called.
struct TargetTitle {
    title: String,
    aliases: Vec<String>,
}

/// Strip a `#subpath` from a cached link reference, leaving the path to resolve.
fn link_path(reference: &str) -> &str {
    match reference.find('#') {
        Some(idx) => &reference[..idx],
        None => reference,
    }
}

/// Rewrites link display text so it tracks the titles of linked documents.
///
/// Stateless between calls apart from the settings fixed at construction.
/// Documents are processed one at a time: read, rewrite, write, then the next.
pub struct LinkUpdater {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn MetadataIndex>,
    settings: Settings,
}

impl LinkUpdater {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn MetadataIndex>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            index,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Single-document rewrite
    // -----------------------------------------------------------------------

    /// Refresh the display text of every link in `doc`.
    ///
    /// Markdown links are rewritten first, then wikilinks are scanned on the
    /// result. The document is written back only if its text changed.
    /// Returns the number of links whose display text changed.
    pub async fn update_links_in_note(&self, doc: &Document) -> anyhow::Result<usize> {
        if self.index.metadata_for(doc).is_none() {
            tracing::debug!("No cached metadata for {}, leaving it alone", doc.path);
            return Ok(0);
        }

        let original = self.store.read_text(doc).await?;

        let markdown_edits = self.markdown_link_edits(&original, &doc.path).await;
        let markdown_count = markdown_edits.len();
        let after_markdown = apply_edits(&original, markdown_edits);

        let wikilink_edits = self.wikilink_edits(&after_markdown, &doc.path).await;
        let wikilink_count = wikilink_edits.len();
        let updated = apply_edits(&after_markdown, wikilink_edits);

        let count = markdown_count + wikilink_count;
        if updated != original {
            self.store.write_text(doc, &updated).await?;
            tracing::info!(
                "{}: updated {} link(s) ({} markdown, {} wikilink)",
                doc.path, count, markdown_count, wikilink_count
            );
        }

        Ok(count)
    }

    /// Resolve a link reference to a markdown document with metadata and work
    /// out its title. `None` leaves the link untouched.
    async fn target_title(&self, reference: &str, from_path: &str) -> Option<TargetTitle> {
        let target = self.index.resolve_link_path(reference, from_path).await?;
        if !target.is_markdown() {
            return None;
        }
        let metadata = self.index.metadata_for(&target)?;

        Some(TargetTitle {
            title: resolve_title(&metadata, target.basename(), &self.settings),
            aliases: metadata.aliases(),
        })
    }

    fn matching_alias(&self, current: &str, target: &TargetTitle) -> Option<String> {
        if !self.settings.use_aliases {
            return None;
        }
        resolve_alias(current, &target.aliases, self.settings.similarity_threshold)
    }

    async fn markdown_link_edits(&self, text: &str, from_path: &str) -> Vec<TextEdit> {
        let mut edits = Vec::new();

        for occ in extract_markdown_links(text) {
            let Some(target) = self.target_title(&occ.target, from_path).await else {
                tracing::debug!("{}: unresolved link target {:?}", from_path, occ.target);
                continue;
            };
            let current = occ.display.as_deref().unwrap_or_default();

            if let Some(new_text) = self.markdown_display(current, &target) {
                tracing::debug!("{}: [{}]({}) -> [{}]", from_path, current, occ.raw_target, new_text);
                edits.push(TextEdit::replace(&occ, format_markdown_link(&new_text, &occ.raw_target)));
            }
        }

        edits
    }

    /// New display text for a markdown link, or `None` to keep it.
    fn markdown_display(&self, current: &str, target: &TargetTitle) -> Option<String> {
        let title = target.title.as_str();
        if current == title {
            return None;
        }
        if current.to_lowercase() == title.to_lowercase() {
            return Some(title.to_string());
        }
        if let Some(alias) = self.matching_alias(current, target) {
            return (alias != current).then_some(alias);
        }
        Some(title.to_string())
    }

    async fn wikilink_edits(&self, text: &str, from_path: &str) -> Vec<TextEdit> {
        let mut edits = Vec::new();

        for occ in extract_wikilinks(text) {
            // Titles are per document; a section or block link keeps its text.
            if occ.has_anchor() {
                tracing::debug!("{}: keeping anchored link [[{}]]", from_path, occ.raw_target);
                continue;
            }
            let Some(target) = self.target_title(&occ.target, from_path).await else {
                tracing::debug!("{}: unresolved wikilink target {:?}", from_path, occ.target);
                continue;
            };

            if let Some(link) = self.wikilink_text(&occ, &target) {
                tracing::debug!("{}: {} -> {}", from_path, &text[occ.start..occ.end], link);
                edits.push(TextEdit::replace(&occ, link));
            }
        }

        edits
    }

    /// Replacement text for a whole wikilink, or `None` to keep it.
    fn wikilink_text(&self, occ: &LinkOccurrence, target: &TargetTitle) -> Option<String> {
        let path = occ.target.as_str();
        let title = target.title.as_str();
        let titled = || {
            if path == title {
                format_wikilink(path, None)
            } else {
                format_wikilink(path, Some(title))
            }
        };

        match occ.display.as_deref() {
            Some(current) if current == title => None,
            Some(current) => {
                if let Some(alias) = self.matching_alias(current, target) {
                    return (alias != current).then(|| format_wikilink(path, Some(&alias)));
                }
                Some(titled())
            }
            None => {
                let name = path.rsplit('/').next().unwrap_or(path);
                if strip_extension(name).to_lowercase() == title.to_lowercase() {
                    None
                } else {
                    Some(titled())
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Backlink discovery
    // -----------------------------------------------------------------------

    /// Documents whose cached links or embeds resolve to `target_path`.
    /// Each referrer appears once; the target itself is never included.
    pub async fn find_referrers(&self, target_path: &str) -> Vec<Document> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut referrers = Vec::new();

        for doc in self.store.list_documents() {
            if doc.path == target_path || seen.contains(&doc.path) {
                continue;
            }
            let Some(metadata) = self.index.metadata_for(&doc) else {
                continue;
            };

            for record in metadata.embeds.iter().chain(metadata.links.iter()) {
                let reference = link_path(&record.link);
                if reference.is_empty() {
                    continue;
                }
                let Some(resolved) = self.index.resolve_link_path(reference, &doc.path).await else {
                    continue;
                };
                if resolved.path == target_path {
                    seen.insert(doc.path.clone());
                    referrers.push(doc.clone());
                    break;
                }
            }
        }

        tracing::debug!("Found {} referrer(s) of {}", referrers.len(), target_path);
        referrers
    }

    // -----------------------------------------------------------------------
    // Orchestration
    // -----------------------------------------------------------------------

    /// Rewrite links in every document referring to `old_path`, then in `doc`.
    ///
    /// Returns `Ok(None)` without doing anything when `old_path` is empty or
    /// `doc` is not a markdown document. Writes already made stay in place if a
    /// later document fails.
    pub async fn update_back_links(
        &self,
        doc: &Document,
        old_path: &str,
        notify: bool,
    ) -> anyhow::Result<Option<usize>> {
        if old_path.is_empty() || !doc.is_markdown() {
            return Ok(None);
        }

        let referrers = self.find_referrers(old_path).await;
        let mut total = 0;
        for referrer in referrers.iter().filter(|r| r.path != doc.path) {
            total += self.update_links_in_note(referrer).await?;
        }
        total += self.update_links_in_note(doc).await?;

        if notify && total > 0 {
            tracing::info!("Updated {} link(s) after change to {}", total, doc.path);
        } else {
            tracing::debug!("Updated {} link(s) after change to {}", total, doc.path);
        }

        Ok(Some(total))
    }

    /// Full rescan: treat every document as changed in place and sum the counts.
    pub async fn update_all_links(&self) -> anyhow::Result<usize> {
        let docs = self.store.list_documents();
        tracing::info!("Rescanning links in {} documents", docs.len());

        let mut total = 0;
        for doc in &docs {
            total += self
                .update_back_links(doc, &doc.path, false)
                .await?
                .unwrap_or(0);
        }

        tracing::info!("Rescan complete: {} link(s) updated", total);
        Ok(total)
    }
}
