//! Read requests for retrieving data from DynamoDB tables.
//!
//! This module provides the reads the repository issues:
//! - Getting individual items by primary key
//! - Querying one page of items with key conditions

/// Get item request for retrieving a single item by primary key.
pub mod get_item;

/// Query request for retrieving a page of items with key conditions.
pub mod query;
