use crate::error::LinkTitleError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options that shape how link text is chosen.
///
/// Field names follow the host's camelCase settings record, so a stored settings
/// blob deserializes directly. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Use the front-matter title field when present.
    pub use_frontmatter_title: bool,
    /// Front-matter key holding the title.
    pub frontmatter_title_property: String,
    /// Fall back to the first heading.
    pub use_first_heading: bool,
    /// Keep link text that deliberately names one of the target's aliases.
    pub use_aliases: bool,
    /// Minimum fuzzy score for an alias match, in `[0, 1]`.
    pub similarity_threshold: f64,
    /// Host-side: re-scan automatically on rename and metadata changes.
    pub auto_update: bool,
    /// Host-side: milliseconds to coalesce change events before a re-scan.
    pub debounce_delay: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_frontmatter_title: true,
            frontmatter_title_property: "title".to_string(),
            use_first_heading: true,
            use_aliases: true,
            similarity_threshold: 0.65,
            auto_update: true,
            debounce_delay: 1000,
        }
    }
}

impl Settings {
    /// Parse a settings record from TOML. The threshold is taken as given.
    pub fn from_toml_str(source: &str) -> Result<Self, LinkTitleError> {
        Ok(toml::from_str(source)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.use_frontmatter_title);
        assert_eq!(settings.frontmatter_title_property, "title");
        assert!(settings.use_first_heading);
        assert!(settings.use_aliases);
        assert_eq!(settings.similarity_threshold, 0.65);
        assert_eq!(settings.debounce(), Duration::from_millis(1000));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            useAliases = false
            frontmatterTitleProperty = "customTitle"
            "#,
        )
        .expect("valid settings");
        assert!(!settings.use_aliases);
        assert_eq!(settings.frontmatter_title_property, "customTitle");
        assert!(settings.use_first_heading);
        assert_eq!(settings.similarity_threshold, 0.65);
    }

    #[test]
    fn out_of_range_threshold_is_trusted() {
        let settings = Settings::from_toml_str("similarityThreshold = 1.5").expect("parses");
        assert_eq!(settings.similarity_threshold, 1.5);
    }

    #[test]
    fn wrong_type_is_an_error() {
        let err = Settings::from_toml_str("useAliases = \"yes\"").unwrap_err();
        assert!(err.to_string().starts_with("invalid settings"), "{err}");
    }

    #[test]
    fn json_round_trips_camel_case() {
        let json = serde_json::to_value(Settings::default()).expect("serializes");
        assert_eq!(json["similarityThreshold"], 0.65);
        assert_eq!(json["debounceDelay"], 1000);
    }
}
