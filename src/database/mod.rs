pub mod record;
pub mod store;

pub use record::CatalogRecord;
pub use store::{CatalogSource, CatalogStore, StoreError};
