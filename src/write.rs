//! Write requests for modifying data in DynamoDB tables.
//!
//! This module provides the single-item writes the repository issues:
//! - Putting items, optionally guarded by a condition
//! - Deleting items by primary key

/// Common utilities and types for write requests.
pub mod common;

/// Delete item request for removing items from tables.
pub mod delete_item;

/// Put item request for creating or replacing items.
pub mod put_item;
