//! Common utilities for DynamoDB requests.
//!
//! This module provides shared types and utilities used across read and write requests,
//! including key handling, condition expressions, projections and item sizing.

/// Condition expression building for key conditions, filters and conditional writes.
pub mod condition;

/// Primary key of an envelope record.
pub mod key;

/// Attribute projection for query results.
pub mod projection;

use aws_sdk_dynamodb::types;
use std::collections;

/// A flat DynamoDB item: attribute name to attribute value.
pub type Item = collections::HashMap<String, types::AttributeValue>;

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

/// expression operation
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    pub(crate) fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            operation
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            operation.expression = get_expression(operation.expression, operator, item.expression);
        }
        operation
    }

    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        match names {
            Some(existing) => existing.extend(self.expression_attribute_names),
            None => *names = Some(self.expression_attribute_names),
        }
        if !self.expression_attribute_values.is_empty() {
            match values {
                Some(existing) => existing.extend(self.expression_attribute_values),
                None => *values = Some(self.expression_attribute_values),
            }
        }
        self.expression
    }
}

/// Approximate stored size of an item in bytes.
///
/// Follows DynamoDB's item size rules: every attribute costs the length of its name
/// plus the size of its value.
pub fn item_size(item: &Item) -> usize {
    item.iter()
        .map(|(name, value)| name.len() + attribute_value_size(value))
        .sum()
}

fn attribute_value_size(value: &types::AttributeValue) -> usize {
    match value {
        types::AttributeValue::S(s) => s.len(),
        types::AttributeValue::N(n) => number_size(n),
        types::AttributeValue::B(b) => b.as_ref().len(),
        types::AttributeValue::Bool(_) | types::AttributeValue::Null(_) => 1,
        types::AttributeValue::Ss(values) => values.iter().map(String::len).sum(),
        types::AttributeValue::Ns(values) => values.iter().map(|n| number_size(n)).sum(),
        types::AttributeValue::Bs(values) => values.iter().map(|b| b.as_ref().len()).sum(),
        types::AttributeValue::L(values) => {
            3 + values
                .iter()
                .map(|value| 1 + attribute_value_size(value))
                .sum::<usize>()
        }
        types::AttributeValue::M(map) => {
            3 + map
                .iter()
                .map(|(name, value)| 1 + name.len() + attribute_value_size(value))
                .sum::<usize>()
        }
        _ => 0,
    }
}

// numbers are stored as up to 38 significant digits, two digits per byte plus one
fn number_size(number: &str) -> usize {
    let digits = number.chars().filter(char::is_ascii_digit).count();
    digits.div_ceil(2) + 1
}
