//! Index-qualified list queries over envelopes.
//!
//! A [`ListQuery`] names a partition, the key field to range over and an optional
//! condition on it; the repository turns it into paged [`read::query::Query`] requests.

use crate::{common, envelope, read};

use aws_sdk_dynamodb::types;

/// Sort key a list ranges over. Each one but [`KeyField::Sk`] is backed by a secondary index.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum KeyField {
    /// Primary sort key.
    #[default]
    Sk,
    /// `SK1`, on the `PK-SK1-Index` local secondary index.
    Sk1,
    /// `SK2`, on the `PK-SK2-Index` local secondary index.
    Sk2,
    /// `SK3`, on the `PK-SK3-Index` local secondary index.
    Sk3,
    /// `SK4`, on the `PK-SK4-Index` local secondary index.
    Sk4,
    /// `SK5`, on the `PK-SK5-Index` local secondary index.
    Sk5,
    /// `GSI1SK`, on the `GSI1PK-GSI1SK-Index` global secondary index.
    Gsi1Sk,
}

impl KeyField {
    /// Attribute holding the sort key.
    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::Sk => common::key::SORT_KEY,
            Self::Sk1 => "SK1",
            Self::Sk2 => "SK2",
            Self::Sk3 => "SK3",
            Self::Sk4 => "SK4",
            Self::Sk5 => "SK5",
            Self::Gsi1Sk => "GSI1SK",
        }
    }

    /// Attribute holding the partition key of the index.
    pub fn partition_attribute(self) -> &'static str {
        match self {
            Self::Gsi1Sk => "GSI1PK",
            _ => common::key::PARTITION_KEY,
        }
    }

    /// Value of the sort key in a record.
    pub fn value(self, record: &envelope::EnvelopeRecord) -> Option<&str> {
        match self {
            Self::Sk => record.sk.as_deref(),
            Self::Sk1 => record.sk1.as_deref(),
            Self::Sk2 => record.sk2.as_deref(),
            Self::Sk3 => record.sk3.as_deref(),
            Self::Sk4 => record.sk4.as_deref(),
            Self::Sk5 => record.sk5.as_deref(),
            Self::Gsi1Sk => record.gsi1_sk.as_deref(),
        }
    }

    /// Index to query; `None` for the table's own sort key.
    pub fn index_name(self) -> Option<String> {
        match self {
            Self::Sk => None,
            _ => Some(format!(
                "{}-{}-Index",
                self.partition_attribute(),
                self.attribute_name()
            )),
        }
    }
}

/// Range query over one partition.
///
/// ```rust
/// use dynamodb_envelope::query::{KeyField, ListQuery};
///
/// let recent = ListQuery::between("CUSTOMER#7", KeyField::Sk1, "2024-06-01", "2024-06-30")
///     .descending();
/// let orders = ListQuery::begins_with("CUSTOMER#7", KeyField::Sk, "ORDER#");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    exclusive_start_key: Option<common::Item>,
    field: KeyField,
    include_deleted: bool,
    partition: String,
    projection: common::projection::Projection,
    scan_index_forward: bool,
    sort_key_condition: Option<common::condition::Condition>,
}

impl ListQuery {
    fn new(
        partition: impl Into<String>,
        field: KeyField,
        sort_key_condition: Option<common::condition::Condition>,
    ) -> Self {
        Self {
            exclusive_start_key: None,
            field,
            include_deleted: false,
            partition: partition.into(),
            projection: common::projection::Projection::envelope(),
            scan_index_forward: true,
            sort_key_condition,
        }
    }

    /// Every record of a partition of the table.
    pub fn partition(partition: impl Into<String>) -> Self {
        Self::new(partition, KeyField::Sk, None)
    }

    /// Every record of a partition of the index behind `field`. Records lacking `field`
    /// are not in the index.
    pub fn partition_of(partition: impl Into<String>, field: KeyField) -> Self {
        Self::new(partition, field, None)
    }

    /// Records whose `field` equals `value`.
    pub fn equals(partition: impl Into<String>, field: KeyField, value: impl Into<String>) -> Self {
        let value = types::AttributeValue::S(value.into());
        Self::new(
            partition,
            field,
            Some(common::condition::Condition::Equals(value)),
        )
    }

    /// Records whose `field` starts with `prefix`.
    pub fn begins_with(
        partition: impl Into<String>,
        field: KeyField,
        prefix: impl Into<String>,
    ) -> Self {
        Self::new(
            partition,
            field,
            Some(common::condition::Condition::BeginsWith(prefix.into())),
        )
    }

    /// Records whose `field` lies between `low` and `high`, both inclusive.
    pub fn between(
        partition: impl Into<String>,
        field: KeyField,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self::new(
            partition,
            field,
            Some(common::condition::Condition::Between(
                types::AttributeValue::S(low.into()),
                types::AttributeValue::S(high.into()),
            )),
        )
    }

    /// Project other attributes than the envelope payload. `Data` and `TypeName` are
    /// always projected since listed envelopes are hydrated from them.
    pub fn projection(mut self, projection: common::projection::Projection) -> Self {
        self.projection = projection.with_required();
        self
    }

    /// Return records in descending sort key order.
    pub fn descending(mut self) -> Self {
        self.scan_index_forward = false;
        self
    }

    /// Resume after the `last_evaluated_key` of a partial result.
    pub fn starting_after(mut self, last_evaluated_key: common::Item) -> Self {
        self.exclusive_start_key = Some(last_evaluated_key);
        self
    }

    /// Keep records marked `IsDeleted`.
    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Key field the query ranges over.
    pub fn field(&self) -> KeyField {
        self.field
    }

    /// Partition key value.
    pub fn partition_key(&self) -> &str {
        &self.partition
    }

    pub(crate) fn includes_deleted(&self) -> bool {
        self.include_deleted
    }

    pub(crate) fn exclusive_start_key(&self) -> Option<&common::Item> {
        self.exclusive_start_key.as_ref()
    }

    /// Key resuming the query right after `record`: the primary key plus the key
    /// attributes of the queried index.
    pub(crate) fn resume_key(&self, record: &envelope::EnvelopeRecord) -> common::Item {
        let mut key: common::Item = record.primary_key().into();
        let partition = match self.field {
            KeyField::Gsi1Sk => record.gsi1_pk.as_deref(),
            _ => Some(record.pk.as_str()),
        };
        let attributes = [
            (self.field.partition_attribute(), partition),
            (self.field.attribute_name(), self.field.value(record)),
        ];
        for (name, value) in attributes {
            if let Some(value) = value {
                key.insert(name.to_string(), types::AttributeValue::S(value.to_string()));
            }
        }
        key
    }

    /// One page request over `table_name`.
    pub(crate) fn to_request(
        &self,
        table_name: &str,
        limit: Option<i32>,
        exclusive_start_key: Option<common::Item>,
        exclude_deleted: bool,
    ) -> read::query::Query {
        read::query::Query {
            exclusive_start_key,
            filter: exclude_deleted.then(not_deleted),
            index_name: self.field.index_name(),
            limit,
            partition_key: common::key::Key {
                name: self.field.partition_attribute().to_string(),
                value: self.partition.clone(),
            },
            projection: Some(self.projection.clone()),
            scan_index_forward: Some(self.scan_index_forward),
            sort_key_condition: self.sort_key_condition.clone().map(|condition| {
                common::condition::KeyCondition::new(self.field.attribute_name(), condition)
            }),
            table_name: table_name.to_string(),
        }
    }
}

/// `attribute_not_exists(IsDeleted) OR IsDeleted = false`
fn not_deleted() -> common::condition::ConditionExpression {
    common::condition::ConditionExpression::any(vec![
        common::condition::KeyCondition::new("IsDeleted", common::condition::Condition::Null),
        common::condition::KeyCondition::new(
            "IsDeleted",
            common::condition::Condition::Equals(types::AttributeValue::Bool(false)),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::sort_key(KeyField::Sk, "SK", "PK", None)]
    #[case::first_local(KeyField::Sk1, "SK1", "PK", Some("PK-SK1-Index"))]
    #[case::last_local(KeyField::Sk5, "SK5", "PK", Some("PK-SK5-Index"))]
    #[case::global(KeyField::Gsi1Sk, "GSI1SK", "GSI1PK", Some("GSI1PK-GSI1SK-Index"))]
    fn test_key_field(
        #[case] field: KeyField,
        #[case] attribute_name: &str,
        #[case] partition_attribute: &str,
        #[case] index_name: Option<&str>,
    ) {
        assert_eq!(field.attribute_name(), attribute_name);
        assert_eq!(field.partition_attribute(), partition_attribute);
        assert_eq!(field.index_name().as_deref(), index_name);
    }

    #[rstest]
    #[case::partition(ListQuery::partition("P"), None)]
    #[case::equals(
        ListQuery::equals("P", KeyField::Sk2, "x"),
        Some(common::condition::KeyCondition::new(
            "SK2",
            common::condition::Condition::Equals(types::AttributeValue::S("x".to_string())),
        ))
    )]
    #[case::begins_with(
        ListQuery::begins_with("P", KeyField::Sk, "ORDER#"),
        Some(common::condition::KeyCondition::new(
            "SK",
            common::condition::Condition::BeginsWith("ORDER#".to_string()),
        ))
    )]
    #[case::between(
        ListQuery::between("P", KeyField::Sk1, "a", "m"),
        Some(common::condition::KeyCondition::new(
            "SK1",
            common::condition::Condition::Between(
                types::AttributeValue::S("a".to_string()),
                types::AttributeValue::S("m".to_string()),
            ),
        ))
    )]
    fn test_sort_key_condition(
        #[case] query: ListQuery,
        #[case] expected: Option<common::condition::KeyCondition>,
    ) {
        let request = query.to_request("t", None, None, false);
        assert_eq!(request.sort_key_condition, expected);
        assert_eq!(request.partition_key.value, "P");
    }

    #[test]
    fn test_to_request() {
        let start = common::Item::from([(
            "GSI1PK".to_string(),
            types::AttributeValue::S("REGION#eu".to_string()),
        )]);
        let query = ListQuery::partition_of("REGION#eu", KeyField::Gsi1Sk)
            .descending()
            .projection(common::projection::Projection::new(["Data", "TypeName"]));
        let request = query.to_request("orders", Some(10), Some(start.clone()), true);
        assert_eq!(
            request,
            read::query::Query {
                exclusive_start_key: Some(start),
                filter: Some(not_deleted()),
                index_name: Some("GSI1PK-GSI1SK-Index".to_string()),
                limit: Some(10),
                partition_key: common::key::Key {
                    name: "GSI1PK".to_string(),
                    value: "REGION#eu".to_string(),
                },
                projection: Some(common::projection::Projection::new(["Data", "TypeName"])),
                scan_index_forward: Some(false),
                sort_key_condition: None,
                table_name: "orders".to_string(),
            }
        );
    }

    #[test]
    fn test_projection_keeps_required_attributes() {
        let query = ListQuery::partition("P")
            .projection(common::projection::Projection::new(["Status"]));
        let request = query.to_request("t", None, None, false);
        assert_eq!(
            request.projection,
            Some(common::projection::Projection::new(["Status", "Data", "TypeName"]))
        );
    }

    #[rstest]
    #[case::table(
        KeyField::Sk,
        "P",
        &[("PK", "CUSTOMER#7"), ("SK", "01")]
    )]
    #[case::local(
        KeyField::Sk1,
        "P",
        &[("PK", "CUSTOMER#7"), ("SK", "01"), ("SK1", "2024-06-01")]
    )]
    #[case::global(
        KeyField::Gsi1Sk,
        "REGION#eu",
        &[("PK", "CUSTOMER#7"), ("SK", "01"), ("GSI1PK", "REGION#eu"), ("GSI1SK", "o-01")]
    )]
    fn test_resume_key(
        #[case] field: KeyField,
        #[case] partition: &str,
        #[case] expected: &[(&str, &str)],
    ) {
        let record = envelope::EnvelopeRecord {
            pk: "CUSTOMER#7".to_string(),
            sk: Some("01".to_string()),
            sk1: Some("2024-06-01".to_string()),
            gsi1_pk: Some("REGION#eu".to_string()),
            gsi1_sk: Some("o-01".to_string()),
            ..Default::default()
        };
        let expected: common::Item = expected
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    types::AttributeValue::S(value.to_string()),
                )
            })
            .collect();
        let query = ListQuery::partition_of(partition, field);
        assert_eq!(query.resume_key(&record), expected);
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::partition("P").starting_after(common::Item::new());
        assert!(!query.includes_deleted());
        assert!(query.include_deleted().includes_deleted());
        let request = ListQuery::partition("P").to_request("t", None, None, false);
        assert_eq!(request.filter, None);
        assert_eq!(request.scan_index_forward, Some(true));
        assert_eq!(
            request.projection,
            Some(common::projection::Projection::envelope())
        );
    }

    #[test]
    fn test_not_deleted_matches_live_records() {
        let filter = not_deleted();
        let flagged = |value: bool| {
            common::Item::from([(
                "IsDeleted".to_string(),
                types::AttributeValue::Bool(value),
            )])
        };
        assert!(filter.matches(&common::Item::new()));
        assert!(filter.matches(&flagged(false)));
        assert!(!filter.matches(&flagged(true)));
    }
}
