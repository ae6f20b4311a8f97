use crate::common;

use aws_sdk_dynamodb::types;
use std::collections;

/// Internal representation of write request parameters.
///
/// Holds the resolved condition expression and attribute mappings ready for
/// the DynamoDB API call.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WriteInput {
    pub(crate) condition_expression: Option<String>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) table_name: String,
}

/// Arguments common to all write requests (Put, Delete).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteArgs {
    /// Condition that must hold for the write to succeed.
    ///
    /// If the condition is false, the store rejects the write with a conditional check failure.
    pub condition: Option<common::condition::ConditionExpression>,
    /// The name of the table to write to.
    pub table_name: String,
}

impl From<WriteArgs> for WriteInput {
    fn from(write_args: WriteArgs) -> Self {
        let (condition_expression, expression_attribute_names, expression_attribute_values) =
            match write_args.condition {
                Some(condition) => {
                    let condition_operation: common::ExpressionInput = condition.into();
                    let values = condition_operation.expression_attribute_values;
                    (
                        Some(condition_operation.expression),
                        Some(condition_operation.expression_attribute_names),
                        (!values.is_empty()).then_some(values),
                    )
                }
                None => (None, None, None),
            };
        Self {
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            table_name: write_args.table_name,
        }
    }
}

/// apply common write operation settings to a builder
#[macro_export]
macro_rules! apply_write_operation {
    ($builder:expr, $write_operation:expr) => {
        $builder
            .set_condition_expression($write_operation.condition_expression)
            .set_expression_attribute_names($write_operation.expression_attribute_names)
            .set_expression_attribute_values($write_operation.expression_attribute_values)
            .table_name($write_operation.table_name)
    };
}
