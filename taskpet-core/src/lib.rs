//! Points-ledger and accessory-inventory engine.
//!
//! This crate provides:
//! - Idempotent reconciliation of external task completions into points
//! - A typed accessory catalog with slot-exclusive equipment
//! - Purchase/equip/unequip operations with validate-before-mutate semantics
//! - Durable per-user ledgers behind a pluggable store
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskpet_core::{
//!     AccountService, CompletionRules, JsonFileStore, NotionTaskSource,
//!     ServiceConfig, DEFAULT_CATALOG,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = notion::Notion::from_env()?;
//!     let source = NotionTaskSource::new(client, "database-id", CompletionRules::default());
//!
//!     let service = AccountService::new(
//!         Arc::new(JsonFileStore::new("data/user_state.json")),
//!         Arc::new(source),
//!         Arc::new(DEFAULT_CATALOG.clone()),
//!         ServiceConfig::default(),
//!     );
//!
//!     let view = service.sync_state("default").await?;
//!     println!("balance: {}", view.ledger.points);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod inventory;
pub mod ledger;
pub mod reconcile;
pub mod service;
pub mod tasks;
pub mod testing;

// Primary public API
pub use catalog::{Accessory, Catalog, CatalogError, Slot, DEFAULT_CATALOG};
pub use inventory::InventoryError;
pub use ledger::{JsonFileStore, LedgerSeed, LedgerStore, MemoryStore, StoreError, UserLedger};
pub use reconcile::{reconcile, SyncStats};
pub use service::{AccountService, ServiceConfig, ServiceError, StateView};
pub use tasks::{CompletedTask, CompletionRules, NotionTaskSource, SourceError, TaskSource};
