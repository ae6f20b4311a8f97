use crate::common;

use aws_sdk_dynamodb::{Client, error, operation};

/// get item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct GetItemInput {
    consistent_read: Option<bool>,
    keys: common::Item,
    table_name: String,
}

/// Get item request.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_envelope::{common, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let get_item = read::get_item::GetItem {
///     key: common::key::PrimaryKey::new("USER#1", Some("PROFILE")),
///     table_name: "users".to_string(),
///     ..Default::default()
/// };
/// get_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItem {
    /// Whether to use a strongly consistent read.
    ///
    /// `true` for strongly consistent reads, `false` or `None` for eventually consistent reads.
    pub consistent_read: Option<bool>,
    /// The primary key of the item to retrieve.
    pub key: common::key::PrimaryKey,
    /// The name of the table to read from.
    pub table_name: String,
}

impl From<GetItem> for GetItemInput {
    fn from(get_item: GetItem) -> Self {
        Self {
            consistent_read: get_item.consistent_read,
            keys: get_item.key.into(),
            table_name: get_item.table_name,
        }
    }
}

impl GetItem {
    /// Execute the get item request.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.get_item",
            skip_all,
            fields(table = %self.table_name, pk = %self.key.pk),
            err(Debug)
        )
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::get_item::GetItemOutput,
        error::SdkError<operation::get_item::GetItemError>,
    > {
        let get_item: GetItemInput = self.into();
        client
            .get_item()
            .set_consistent_read(get_item.consistent_read)
            .set_key(Some(get_item.keys))
            .table_name(get_item.table_name)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;

    #[rstest]
    #[case::eventually_consistent(
        GetItem {
            key: common::key::PrimaryKey {
                pk: "a".to_string(),
                sk: None,
            },
            table_name: "b".to_string(),
            ..Default::default()
        },
        GetItemInput {
            keys: common::Item::from(
                [
                    (
                        "PK".to_string(),
                        types::AttributeValue::S(
                            "a".to_string()
                        )
                    ),
                ]
            ),
            table_name: "b".to_string(),
            ..Default::default()
        }
    )]
    #[case::consistent(
        GetItem {
            consistent_read: Some(true),
            key: common::key::PrimaryKey {
                pk: "a".to_string(),
                sk: Some(
                    "c".to_string()
                ),
            },
            table_name: "b".to_string(),
        },
        GetItemInput {
            consistent_read: Some(true),
            keys: common::Item::from(
                [
                    (
                        "PK".to_string(),
                        types::AttributeValue::S(
                            "a".to_string()
                        )
                    ),
                    (
                        "SK".to_string(),
                        types::AttributeValue::S(
                            "c".to_string()
                        )
                    ),
                ]
            ),
            table_name: "b".to_string(),
        }
    )]
    fn test_get_item(#[case] args: GetItem, #[case] expected: GetItemInput) {
        let actual: GetItemInput = args.into();
        assert_eq!(actual, expected);
    }
}
