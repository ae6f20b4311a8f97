use crate::common;

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::collections;

/// query operation
#[derive(Clone, Debug, Default, PartialEq)]
struct QueryInput {
    exclusive_start_key: Option<common::Item>,
    expression_attribute_names: Option<collections::HashMap<String, String>>,
    expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    filter_expression: Option<String>,
    index_name: Option<String>,
    key_condition_expression: String,
    limit: Option<i32>,
    projection_expression: Option<String>,
    scan_index_forward: Option<bool>,
    table_name: String,
}

/// Query request for a single page of results.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_envelope::{common, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let query = read::query::Query {
///     partition_key: common::key::Key {
///         name: "PK".to_string(),
///         value: "USER#1".to_string(),
///     },
///     sort_key_condition: Some(common::condition::KeyCondition::new(
///         "SK",
///         common::condition::Condition::BeginsWith("ORDER#".to_string()),
///     )),
///     table_name: "users".to_string(),
///     ..Default::default()
/// };
/// let page = query.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Key of the last item evaluated by a previous page; the query resumes after it.
    pub exclusive_start_key: Option<common::Item>,
    /// Filter applied by the store after the key condition and the limit.
    pub filter: Option<common::condition::ConditionExpression>,
    /// The secondary index to query; `None` queries the table itself.
    pub index_name: Option<String>,
    /// The maximum number of items to evaluate in this page.
    pub limit: Option<i32>,
    /// The partition key value to query for.
    pub partition_key: common::key::Key,
    /// Which attributes to return; `None` returns every attribute.
    pub projection: Option<common::projection::Projection>,
    /// Whether to read the index forward (ascending) or backward (descending).
    pub scan_index_forward: Option<bool>,
    /// Optional condition to apply to the sort key.
    pub sort_key_condition: Option<common::condition::KeyCondition>,
    /// The name of the table to query.
    pub table_name: String,
}

impl From<Query> for QueryInput {
    fn from(query: Query) -> Self {
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let mut index = 0;
        let mut keys = vec![common::condition::KeyCondition::new(
            query.partition_key.name,
            common::condition::Condition::Equals(types::AttributeValue::S(
                query.partition_key.value,
            )),
        )];
        keys.extend(query.sort_key_condition);
        let key_condition_expression =
            common::condition::KeyCondition::get_expression_operation(keys, &mut index)
                .merge_into(
                    &mut expression_attribute_names,
                    &mut expression_attribute_values,
                );
        let filter_expression = query.filter.map(|filter| {
            filter
                .get_expression_input(&mut index)
                .merge_into(&mut expression_attribute_names, &mut expression_attribute_values)
        });
        let projection_expression = query.projection.map(|projection| {
            let operation: common::ExpressionInput = projection.into();
            operation.merge_into(&mut expression_attribute_names, &mut expression_attribute_values)
        });
        Self {
            exclusive_start_key: query.exclusive_start_key,
            expression_attribute_names,
            expression_attribute_values,
            filter_expression,
            index_name: query.index_name,
            key_condition_expression,
            limit: query.limit,
            projection_expression,
            scan_index_forward: query.scan_index_forward,
            table_name: query.table_name,
        }
    }
}

impl Query {
    /// Execute the query request, returning one page.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.query",
            skip_all,
            fields(table = %self.table_name, index = ?self.index_name),
            err(Debug)
        )
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<operation::query::QueryOutput, error::SdkError<operation::query::QueryError>> {
        let query: QueryInput = self.into();
        client
            .query()
            .set_exclusive_start_key(query.exclusive_start_key)
            .set_expression_attribute_names(query.expression_attribute_names)
            .set_expression_attribute_values(query.expression_attribute_values)
            .set_filter_expression(query.filter_expression)
            .set_index_name(query.index_name)
            .key_condition_expression(query.key_condition_expression)
            .set_limit(query.limit)
            .set_projection_expression(query.projection_expression)
            .set_scan_index_forward(query.scan_index_forward)
            .table_name(query.table_name)
            .send()
            .await
    }
}
