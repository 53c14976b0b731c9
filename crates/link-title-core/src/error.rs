use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkTitleError {
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] toml::de::Error),
}
