// Runtime module - Orchestration between the pure engine and the group store
// Owns confirmed state, the pending-operation queue and reconciliation

pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod loader;
pub mod operation;
pub mod runtime;
pub mod state;
pub mod store;
pub mod validation;

pub use config::{Config, MutationConfig, resolve_config_path};
pub use error::{Error, Result};
pub use events::{CatalogEvent, EventBus};
pub use executor::{ExecutionReport, StoreCall, execute, plan};
pub use loader::{LoadedCatalog, load};
pub use operation::{Operation, OperationIds};
pub use runtime::{CatalogRuntime, DispatchOutcome};
pub use state::{CatalogState, Completion, FetchTicket, PendingOperation};
pub use store::{GroupStore, MemoryStore, StoreError, StoreResult};
pub use validation::ValidationError;
