pub mod app_config;
pub mod file_store;
pub mod ids;

pub use file_store::{RecordKind, StoreError, StoreHandle, Versioned};
pub use ids::IdKind;
