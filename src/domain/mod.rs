//! Core data types for level content

mod catalog;
mod content_type;
mod remote;
mod stage;
mod state;

pub use catalog::{ActiveCatalog, Catalog, CatalogSource, StageDescriptor};
pub use content_type::ContentType;
pub use remote::{RemoteDescriptor, SpecialLevelRule};
pub use stage::{LevelKind, LevelRecord, StagePayload};
pub use state::{ContentTypeState, StageRange};
