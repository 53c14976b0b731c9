use crate::link_parser::strip_link_markup;
use crate::metadata::Metadata;
use crate::settings::Settings;

/// Preferred display title for a document.
///
/// Front-matter title (if enabled and a non-empty string), else the first
/// heading (if enabled and non-empty), else `fallback_stem`. Link markup inside the chosen
/// title is flattened to plain text.
pub fn resolve_title(metadata: &Metadata, fallback_stem: &str, settings: &Settings) -> String {
    let frontmatter_title = settings
        .use_frontmatter_title
        .then(|| metadata.frontmatter_str(&settings.frontmatter_title_property))
        .flatten();
    if let Some(title) = frontmatter_title {
        return strip_link_markup(title).into_owned();
    }

    if settings.use_first_heading {
        if let Some(heading) = metadata.first_heading().filter(|h| !h.is_empty()) {
            return strip_link_markup(heading).into_owned();
        }
    }

    fallback_stem.to_string()
}
