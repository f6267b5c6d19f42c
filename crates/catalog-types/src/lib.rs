pub mod domain;
pub mod error;
pub mod mutation;
pub mod row;
pub mod snapshot;

pub use domain::*;
pub use error::{Error, Result};
pub use mutation::MutationAction;
pub use row::Row;
pub use snapshot::CatalogSnapshot;
