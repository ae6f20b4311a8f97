//! Store boundary consumed by the repository.
//!
//! The repository talks to a key-value/range-query store through the [`Store`] trait.
//! [`aws_sdk_dynamodb::Client`] implements it against DynamoDB; [`memory::MemoryStore`]
//! implements it in process.

/// `Store` implementation over the DynamoDB client.
pub mod dynamodb;

/// In-process `Store` implementation.
pub mod memory;

use crate::{common, read, write};

use async_trait::async_trait;
use std::sync;
use thiserror::Error;

/// Failure reported by a store.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StoreError {
    /// The condition attached to a write did not hold.
    #[error("conditional check failed")]
    ConditionalCheckFailed,
    /// The request was rejected as malformed.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Transient failure: throttling, network or timeout.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Any other failure.
    #[error("store error: {0}")]
    Other(String),
}

/// One page of query results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryPage {
    /// Items of this page, in index order.
    pub items: Vec<common::Item>,
    /// Key to pass as `exclusive_start_key` to fetch the next page; `None` when exhausted.
    pub last_evaluated_key: Option<common::Item>,
}

/// Key-value/range-query store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Write a whole item, honoring the request's condition.
    async fn put_item(&self, request: write::put_item::PutItem) -> Result<(), StoreError>;

    /// Read an item by primary key.
    async fn get_item(
        &self,
        request: read::get_item::GetItem,
    ) -> Result<Option<common::Item>, StoreError>;

    /// Delete an item by primary key. Deleting a missing key succeeds.
    async fn delete_item(&self, request: write::delete_item::DeleteItem) -> Result<(), StoreError>;

    /// Read one page of a range query.
    async fn query(&self, request: read::query::Query) -> Result<QueryPage, StoreError>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for sync::Arc<S> {
    async fn put_item(&self, request: write::put_item::PutItem) -> Result<(), StoreError> {
        (**self).put_item(request).await
    }

    async fn get_item(
        &self,
        request: read::get_item::GetItem,
    ) -> Result<Option<common::Item>, StoreError> {
        (**self).get_item(request).await
    }

    async fn delete_item(&self, request: write::delete_item::DeleteItem) -> Result<(), StoreError> {
        (**self).delete_item(request).await
    }

    async fn query(&self, request: read::query::Query) -> Result<QueryPage, StoreError> {
        (**self).query(request).await
    }
}
