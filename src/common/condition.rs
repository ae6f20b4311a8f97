use crate::common;

use aws_sdk_dynamodb::types;
use std::{cmp, collections, ops};

/// Logical operator for combining conditions.
#[derive(Clone, Debug, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all conditions must be true.
    And,
    /// Logical OR - at least one condition must be true.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Condition applied to a single attribute.
///
/// ```rust
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_envelope::common::condition;
///
/// let eq = condition::Condition::Equals(AttributeValue::S("value".to_string()));
/// let prefix = condition::Condition::BeginsWith("ORDER#".to_string());
/// let missing = condition::Condition::Null;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Checks if a string attribute begins with a specified prefix.
    BeginsWith(String),
    /// Checks if an attribute value is between two values (inclusive).
    Between(types::AttributeValue, types::AttributeValue),
    /// Checks if an attribute value equals a specified value.
    Equals(types::AttributeValue),
    /// Checks if an attribute value is greater than a specified value.
    GreaterThan(types::AttributeValue),
    /// Checks if an attribute value is greater than or equal to a specified value.
    GreaterThanOrEqual(types::AttributeValue),
    /// Checks if an attribute value is less than a specified value.
    LessThan(types::AttributeValue),
    /// Checks if an attribute value is less than or equal to a specified value.
    LessThanOrEqual(types::AttributeValue),
    /// Checks if an attribute value does not equal a specified value.
    NotEqual(types::AttributeValue),
    /// Checks if an attribute exists.
    NotNull,
    /// Checks if an attribute does not exist.
    Null,
}

impl Condition {
    fn get_expression(
        self,
        key: &str,
        key_placeholder: &str,
        index: &mut usize,
    ) -> (String, collections::HashMap<String, types::AttributeValue>) {
        let mut expression_attribute_values = collections::HashMap::new();
        let expression = match self {
            Self::BeginsWith(prefix) => {
                let value_placeholder = format!(":{key}_begins_with{index}");
                *index += 1;
                let expression = format!("begins_with({key_placeholder}, {value_placeholder})");
                expression_attribute_values
                    .insert(value_placeholder, types::AttributeValue::S(prefix));
                expression
            }
            Self::Between(low, high) => {
                let low_placeholder = format!(":{key}_between{index}");
                *index += 1;
                let high_placeholder = format!(":{key}_between{index}");
                *index += 1;
                let expression =
                    format!("{key_placeholder} BETWEEN {low_placeholder} AND {high_placeholder}");
                expression_attribute_values.insert(low_placeholder, low);
                expression_attribute_values.insert(high_placeholder, high);
                expression
            }
            Self::Equals(value) => binary_expression(
                key_placeholder,
                "=",
                format!(":{key}_eq{index}"),
                value,
                index,
                &mut expression_attribute_values,
            ),
            Self::GreaterThan(value) => binary_expression(
                key_placeholder,
                ">",
                format!(":{key}_gt{index}"),
                value,
                index,
                &mut expression_attribute_values,
            ),
            Self::GreaterThanOrEqual(value) => binary_expression(
                key_placeholder,
                ">=",
                format!(":{key}_gte{index}"),
                value,
                index,
                &mut expression_attribute_values,
            ),
            Self::LessThan(value) => binary_expression(
                key_placeholder,
                "<",
                format!(":{key}_lt{index}"),
                value,
                index,
                &mut expression_attribute_values,
            ),
            Self::LessThanOrEqual(value) => binary_expression(
                key_placeholder,
                "<=",
                format!(":{key}_lte{index}"),
                value,
                index,
                &mut expression_attribute_values,
            ),
            Self::NotEqual(value) => binary_expression(
                key_placeholder,
                "<>",
                format!(":{key}_ne{index}"),
                value,
                index,
                &mut expression_attribute_values,
            ),
            Self::NotNull => format!("attribute_exists({key_placeholder})"),
            Self::Null => format!("attribute_not_exists({key_placeholder})"),
        };
        (expression, expression_attribute_values)
    }

    /// Evaluate the condition against an attribute value, `None` meaning the attribute is absent.
    pub fn matches(&self, value: Option<&types::AttributeValue>) -> bool {
        match (self, value) {
            (Self::Null, value) => value.is_none(),
            (Self::NotNull, value) => value.is_some(),
            (Self::NotEqual(expected), Some(actual)) => !values_equal(actual, expected),
            (Self::NotEqual(_), None) => true,
            (_, None) => false,
            (Self::BeginsWith(prefix), Some(actual)) => match actual {
                types::AttributeValue::S(actual) => actual.starts_with(prefix.as_str()),
                _ => false,
            },
            (Self::Between(low, high), Some(actual)) => {
                matches!(
                    compare(actual, low),
                    Some(cmp::Ordering::Greater | cmp::Ordering::Equal)
                ) && matches!(
                    compare(actual, high),
                    Some(cmp::Ordering::Less | cmp::Ordering::Equal)
                )
            }
            (Self::Equals(expected), Some(actual)) => values_equal(actual, expected),
            (Self::GreaterThan(expected), Some(actual)) => {
                compare(actual, expected) == Some(cmp::Ordering::Greater)
            }
            (Self::GreaterThanOrEqual(expected), Some(actual)) => matches!(
                compare(actual, expected),
                Some(cmp::Ordering::Greater | cmp::Ordering::Equal)
            ),
            (Self::LessThan(expected), Some(actual)) => {
                compare(actual, expected) == Some(cmp::Ordering::Less)
            }
            (Self::LessThanOrEqual(expected), Some(actual)) => matches!(
                compare(actual, expected),
                Some(cmp::Ordering::Less | cmp::Ordering::Equal)
            ),
        }
    }
}

fn binary_expression(
    key_placeholder: &str,
    operator: &str,
    value_placeholder: String,
    value: types::AttributeValue,
    index: &mut usize,
    expression_attribute_values: &mut collections::HashMap<String, types::AttributeValue>,
) -> String {
    *index += 1;
    let expression = format!("{key_placeholder} {operator} {value_placeholder}");
    expression_attribute_values.insert(value_placeholder, value);
    expression
}

/// Order two attribute values the way DynamoDB orders key attributes.
///
/// Strings and binaries compare by bytes, numbers by numeric value. Values of
/// different types are unordered.
pub fn compare(
    left: &types::AttributeValue,
    right: &types::AttributeValue,
) -> Option<cmp::Ordering> {
    match (left, right) {
        (types::AttributeValue::S(left), types::AttributeValue::S(right)) => {
            Some(left.as_bytes().cmp(right.as_bytes()))
        }
        (types::AttributeValue::N(left), types::AttributeValue::N(right)) => {
            match (left.parse::<i128>(), right.parse::<i128>()) {
                (Ok(left), Ok(right)) => Some(left.cmp(&right)),
                _ => {
                    let left = left.parse::<f64>().ok()?;
                    let right = right.parse::<f64>().ok()?;
                    left.partial_cmp(&right)
                }
            }
        }
        (types::AttributeValue::B(left), types::AttributeValue::B(right)) => {
            Some(left.as_ref().cmp(right.as_ref()))
        }
        _ => None,
    }
}

fn values_equal(left: &types::AttributeValue, right: &types::AttributeValue) -> bool {
    match (left, right) {
        (types::AttributeValue::N(_), types::AttributeValue::N(_)) => {
            compare(left, right) == Some(cmp::Ordering::Equal)
        }
        _ => left == right,
    }
}

/// Condition applied to a named attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyCondition {
    /// The condition to apply to the attribute.
    pub condition: Condition,
    /// The name of the attribute to apply the condition to.
    pub name: String,
}

impl KeyCondition {
    /// Build a condition on the attribute `name`.
    pub fn new(name: impl Into<String>, condition: Condition) -> Self {
        Self {
            condition,
            name: name.into(),
        }
    }

    /// Evaluate the condition against an item.
    pub fn matches(&self, item: &common::Item) -> bool {
        self.condition.matches(item.get(&self.name))
    }

    fn get_expression_input(self, index: &mut usize) -> common::ExpressionInput {
        let placeholder = format!("#{}", self.name);
        let (expression, expression_attribute_values) =
            self.condition.get_expression(&self.name, &placeholder, index);
        common::ExpressionInput {
            expression,
            expression_attribute_names: collections::HashMap::from([(placeholder, self.name)]),
            expression_attribute_values,
        }
    }

    /// Render a key condition expression: every condition joined with `AND`.
    pub(crate) fn get_expression_operation(
        keys: Vec<Self>,
        index: &mut usize,
    ) -> common::ExpressionInput {
        let operations = keys
            .into_iter()
            .map(|key| key.get_expression_input(index))
            .collect();
        common::ExpressionInput::merge(&LogicalOperator::And, operations)
    }
}

/// Conditions combined with a single logical operator.
///
/// Used for filter expressions and conditional writes.
///
/// ```rust
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_envelope::common::condition;
///
/// let not_deleted = condition::ConditionExpression::any(vec![
///     condition::KeyCondition::new("IsDeleted", condition::Condition::Null),
///     condition::KeyCondition::new(
///         "IsDeleted",
///         condition::Condition::Equals(AttributeValue::Bool(false)),
///     ),
/// ]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionExpression {
    /// The conditions to combine.
    pub conditions: Vec<KeyCondition>,
    /// How the conditions are combined.
    pub operator: LogicalOperator,
}

impl ConditionExpression {
    /// All conditions must hold.
    pub fn all(conditions: Vec<KeyCondition>) -> Self {
        Self {
            conditions,
            operator: LogicalOperator::And,
        }
    }

    /// At least one condition must hold.
    pub fn any(conditions: Vec<KeyCondition>) -> Self {
        Self {
            conditions,
            operator: LogicalOperator::Or,
        }
    }

    /// Evaluate the expression against an item. An empty expression always holds.
    pub fn matches(&self, item: &common::Item) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        match self.operator {
            LogicalOperator::And => self.conditions.iter().all(|c| c.matches(item)),
            LogicalOperator::Or => self.conditions.iter().any(|c| c.matches(item)),
        }
    }

    pub(crate) fn get_expression_input(self, index: &mut usize) -> common::ExpressionInput {
        let is_composite = self.conditions.len() > 1;
        let operations = self
            .conditions
            .into_iter()
            .map(|condition| condition.get_expression_input(index))
            .collect();
        let mut operation = common::ExpressionInput::merge(&self.operator, operations);
        if is_composite {
            operation.expression = format!("({})", operation.expression);
        }
        operation
    }
}

impl From<ConditionExpression> for common::ExpressionInput {
    fn from(condition_expression: ConditionExpression) -> Self {
        condition_expression.get_expression_input(&mut 0)
    }
}
