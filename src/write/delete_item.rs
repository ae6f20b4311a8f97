use crate::{common, write};

use aws_sdk_dynamodb::{Client, error, operation};

/// delete item operation
#[derive(Debug, PartialEq)]
struct DeleteItemInput {
    keys: common::Item,
    write_operation: write::common::WriteInput,
}

/// Delete item request.
///
/// Deleting a key that does not exist succeeds unless a condition is given.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_envelope::{common, write};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let delete_item = write::delete_item::DeleteItem {
///     key: common::key::PrimaryKey::new("USER#1", Some("PROFILE")),
///     write_args: write::common::WriteArgs {
///         table_name: "users".to_string(),
///         ..Default::default()
///     },
/// };
/// delete_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteItem {
    /// The primary key of the item to delete.
    pub key: common::key::PrimaryKey,
    /// Additional write arguments (table name, condition).
    pub write_args: write::common::WriteArgs,
}

impl From<DeleteItem> for DeleteItemInput {
    fn from(delete_item: DeleteItem) -> Self {
        Self {
            keys: delete_item.key.into(),
            write_operation: delete_item.write_args.into(),
        }
    }
}

impl DeleteItem {
    /// Execute the delete item request.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.delete_item",
            skip_all,
            fields(table = %self.write_args.table_name, pk = %self.key.pk),
            err(Debug)
        )
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::delete_item::DeleteItemOutput,
        error::SdkError<operation::delete_item::DeleteItemError>,
    > {
        let delete_item: DeleteItemInput = self.into();
        let builder = client.delete_item().set_key(Some(delete_item.keys));
        crate::apply_write_operation!(builder, delete_item.write_operation)
            .send()
            .await
    }
}
