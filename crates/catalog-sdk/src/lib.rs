//! catalog-sdk: grouped catalog lists for point-of-sale and inventory UIs.
//!
//! # Overview
//!
//! `catalog-sdk` is the stable surface over the catalog partition engine. A
//! catalog of items is partitioned into user-defined explicit groups plus two
//! derived groups: **Unassigned** (active items in no explicit group and not
//! excluded) and **Discontinued** (inactive items). The SDK renders the groups
//! as a flat list of header and item rows, windows that list for large
//! catalogs, and applies group edits optimistically while the store catches up.
//!
//! # Quickstart
//!
//! ```no_run
//! use catalog_runtime::{Config, MemoryStore};
//! use catalog_sdk::Client;
//! use catalog_types::{CatalogSnapshot, GroupId, ItemId, MutationAction};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let snapshot = CatalogSnapshot::load("catalog.json".as_ref())?;
//! let store = Arc::new(MemoryStore::from_snapshot(snapshot));
//! let mut client = Client::connect(store, Config::load()?).await?;
//!
//! client.on_visible_items_changed(|ids| println!("visible: {:?}", ids));
//!
//! let outcome = client
//!     .dispatch(MutationAction::MoveItems {
//!         from_group_id: GroupId::new(1),
//!         to_group_id: GroupId::new(2),
//!         item_ids: vec![ItemId::new(10)],
//!     })
//!     .await?;
//! println!("committed: {}", outcome.committed());
//!
//! client.scroll_to(ItemId::new(10));
//! for row in client.visible_slice() {
//!     println!("{:?}", row);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! This SDK acts as a facade over:
//! - `catalog-types`: Data model (items, groups, exclusions, divisions, rows)
//! - `catalog-engine`: Pure partition, reducer and window logic
//! - `catalog-runtime`: Store collaborator, pending operations and reconciliation
//!
//! # Usage Patterns
//!
//! ## Event stream
//!
//! ```no_run
//! use catalog_runtime::{Config, MemoryStore};
//! use catalog_sdk::{CatalogEvent, Client};
//! use futures::stream::StreamExt;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = Client::connect(Arc::new(MemoryStore::new()), Config::default()).await?;
//! let mut events = client.subscribe();
//! client.refresh().await?;
//! while let Some(event) = events.next().await {
//!     if let CatalogEvent::GroupsReplaced { revision } = event {
//!         println!("now showing {}", revision);
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod list;

// Public facade
pub use client::Client;
pub use error::{Error, Result};
pub use events::{CatalogEvent, EventStream};
pub use list::{ListView, VisibleItemsListener};

// Re-export the types UI code touches most
pub use catalog_runtime::{Config, DispatchOutcome, GroupStore, MemoryStore, StoreError};
pub use catalog_types::{DivisionId, DivisionScope, GroupId, GroupSelector, ItemId, MutationAction, Row, ViewMode};
