use crate::{common, write};

use aws_sdk_dynamodb::{Client, error, operation};

/// put item operation
#[derive(Debug, PartialEq)]
struct PutItemInput {
    item: common::Item,
    write_operation: write::common::WriteInput,
}

/// Put item request.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::{Client, types::AttributeValue};
/// use dynamodb_envelope::{common, write};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let put_item = write::put_item::PutItem {
///     item: common::Item::from([
///         ("PK".to_string(), AttributeValue::S("USER#1".to_string())),
///     ]),
///     write_args: write::common::WriteArgs {
///         condition: Some(common::condition::ConditionExpression::all(vec![
///             common::condition::KeyCondition::new("PK", common::condition::Condition::Null),
///         ])),
///         table_name: "users".to_string(),
///     },
/// };
/// put_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PutItem {
    /// The item to put into the table.
    pub item: common::Item,
    /// Additional write arguments (table name, condition).
    pub write_args: write::common::WriteArgs,
}

impl From<PutItem> for PutItemInput {
    fn from(put_item: PutItem) -> Self {
        Self {
            item: put_item.item,
            write_operation: put_item.write_args.into(),
        }
    }
}

impl PutItem {
    /// Execute the put item request.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.put_item",
            skip_all,
            fields(table = %self.write_args.table_name),
            err(Debug)
        )
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::put_item::PutItemOutput,
        error::SdkError<operation::put_item::PutItemError>,
    > {
        let put_item: PutItemInput = self.into();
        let builder = client.put_item().set_item(Some(put_item.item));
        crate::apply_write_operation!(builder, put_item.write_operation)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::collections;

    #[rstest]
    #[case::unconditional(
        PutItem {
            item: common::Item::from(
                [(
                    "PK".to_string(),
                    types::AttributeValue::S(
                        "a".to_string()
                    ),
                )]
            ),
            write_args: write::common::WriteArgs {
                table_name: "b".to_string(),
                ..Default::default()
            },
        },
        PutItemInput {
            item: common::Item::from(
                [(
                    "PK".to_string(),
                    types::AttributeValue::S(
                        "a".to_string()
                    ),
                )]
            ),
            write_operation: write::common::WriteInput {
                table_name: "b".to_string(),
                ..Default::default()
            },
        }
    )]
    #[case::create_only(
        PutItem {
            item: common::Item::from(
                [(
                    "PK".to_string(),
                    types::AttributeValue::S(
                        "a".to_string()
                    ),
                )]
            ),
            write_args: write::common::WriteArgs {
                condition: Some(
                    common::condition::ConditionExpression::all(
                        vec![
                            common::condition::KeyCondition::new(
                                "PK",
                                common::condition::Condition::Null
                            ),
                        ]
                    )
                ),
                table_name: "b".to_string(),
            },
        },
        PutItemInput {
            item: common::Item::from(
                [(
                    "PK".to_string(),
                    types::AttributeValue::S(
                        "a".to_string()
                    ),
                )]
            ),
            write_operation: write::common::WriteInput {
                condition_expression: Some(
                    "attribute_not_exists(#PK)".to_string()
                ),
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#PK".to_string(), "PK".to_string()),
                        ]
                    )
                ),
                expression_attribute_values: None,
                table_name: "b".to_string(),
            },
        }
    )]
    #[case::version_check(
        PutItem {
            item: common::Item::from(
                [(
                    "PK".to_string(),
                    types::AttributeValue::S(
                        "a".to_string()
                    ),
                )]
            ),
            write_args: write::common::WriteArgs {
                condition: Some(
                    common::condition::ConditionExpression::all(
                        vec![
                            common::condition::KeyCondition::new(
                                "UpdateUtcTick",
                                common::condition::Condition::Equals(
                                    types::AttributeValue::N(
                                        "7".to_string()
                                    )
                                )
                            ),
                        ]
                    )
                ),
                table_name: "b".to_string(),
            },
        },
        PutItemInput {
            item: common::Item::from(
                [(
                    "PK".to_string(),
                    types::AttributeValue::S(
                        "a".to_string()
                    ),
                )]
            ),
            write_operation: write::common::WriteInput {
                condition_expression: Some(
                    "#UpdateUtcTick = :UpdateUtcTick_eq0".to_string()
                ),
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#UpdateUtcTick".to_string(), "UpdateUtcTick".to_string()),
                        ]
                    )
                ),
                expression_attribute_values: Some(
                    collections::HashMap::from(
                        [
                            (
                                ":UpdateUtcTick_eq0".to_string(),
                                types::AttributeValue::N(
                                    "7".to_string()
                                )
                            ),
                        ]
                    )
                ),
                table_name: "b".to_string(),
            },
        }
    )]
    fn test_put_item(#[case] args: PutItem, #[case] expected: PutItemInput) {
        let actual: PutItemInput = args.into();
        assert_eq!(actual, expected);
    }
}
