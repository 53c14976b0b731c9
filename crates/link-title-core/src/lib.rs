pub mod alias;
pub mod error;
pub mod link_parser;
pub mod link_updater;
pub mod memory_vault;
pub mod metadata;
pub mod settings;
pub mod similarity;
pub mod title;

pub use error::LinkTitleError;
pub use link_updater::LinkUpdater;
pub use memory_vault::MemoryVault;
pub use metadata::{Document, DocumentStore, Metadata, MetadataIndex};
pub use settings::Settings;
