#![deny(missing_docs)]

//! # DynamoDB Envelope
//!
//! A single-table repository for Amazon DynamoDB built on typed envelopes.
//!
//! ## Overview
//!
//! Application entities are stored as flat envelope records: key attributes derived
//! from the entity (`PK`, `SK`, `SK1`..`SK5`, `GSI1PK`, `GSI1SK`), the JSON payload
//! under `Data`, a schema tag under `TypeName` and creation/update ticks. On top of
//! that the [`repository::Repository`]:
//! - Rejects creates on a taken key and stale updates, through conditional writes
//! - Keeps a bounded, freshness-limited read cache
//! - Supports soft deletes with an optional expiry
//! - Lists ranges over the table or its secondary indexes, paging under a size ceiling
//!   and telling complete results from partial ones
//! - Maps every store failure to a small set of status-coded errors
//!
//! ## Quick Example
//!
//! ```rust
//! use dynamodb_envelope::{
//!     config::{CallerInfo, RepositoryConfig},
//!     envelope::{DataEnvelope, Entity, Envelope, EnvelopeKeys},
//!     query::{KeyField, ListQuery},
//!     repository::Repository,
//!     store::memory::MemoryStore,
//! };
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Deserialize, Serialize)]
//! struct Order {
//!     customer: String,
//!     id: String,
//!     placed: String,
//! }
//!
//! impl Entity for Order {
//!     const TYPE_NAME: &'static str = "Order.v1";
//!
//!     fn keys(&self) -> EnvelopeKeys {
//!         EnvelopeKeys {
//!             sk1: Some(self.placed.clone()),
//!             ..EnvelopeKeys::new(format!("CUSTOMER#{}", self.customer), Some(&self.id))
//!         }
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // `aws_sdk_dynamodb::Client` works the same way as the in-memory store
//! let orders: Repository<DataEnvelope<Order>, _> =
//!     Repository::new(MemoryStore::new(), RepositoryConfig::new("orders"));
//! let caller = CallerInfo::default();
//!
//! let order = Order {
//!     customer: "7".to_string(),
//!     id: "42".to_string(),
//!     placed: "2024-06-15".to_string(),
//! };
//! let mut envelope = orders.create(order, &caller).await?;
//!
//! envelope.entity_mut().placed = "2024-06-16".to_string();
//! let envelope = orders.update(envelope, &caller).await?;
//!
//! let june = ListQuery::between("CUSTOMER#7", KeyField::Sk1, "2024-06-01", "2024-06-30");
//! let listed = orders.list(&june, 0, &caller).await?;
//! assert!(listed.is_complete());
//! assert_eq!(listed.items[0].entity().id, envelope.entity().id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@repository`] - Create, read, update, delete and list operations
//! - [`mod@envelope`] - Entities and their flat envelope records
//! - [`mod@query`] - Index-qualified list queries
//! - [`mod@store`] - The store boundary, over DynamoDB or in memory
//! - [`mod@common`], [`mod@read`], [`mod@write`] - Single DynamoDB requests

/// Bounded read cache of stored records.
pub mod cache;

/// Time in UTC ticks.
pub mod clock;

/// Common utilities for keys, conditions, projections and item sizing.
pub mod common;

/// Repository configuration and per-call overrides.
pub mod config;

/// Typed envelopes around application entities.
pub mod envelope;

/// Errors surfaced by the repository.
pub mod error;

/// List queries over the table and its secondary indexes.
pub mod query;

/// Read requests for retrieving data from DynamoDB tables.
///
/// This module provides operations for:
/// - Getting individual items by primary key
/// - Querying one page of items with key conditions
pub mod read;

/// Conditional CRUD and paged lists over typed envelopes.
pub mod repository;

/// The store boundary consumed by the repository.
pub mod store;

/// Write requests for modifying data in DynamoDB tables.
///
/// This module provides operations for:
/// - Putting items, optionally guarded by a condition
/// - Deleting items by primary key
pub mod write;

pub use envelope::{DataEnvelope, Entity, Envelope, EnvelopeKeys};
pub use error::{RepositoryError, Result};
pub use repository::{ListResult, ListStatus, Repository};
