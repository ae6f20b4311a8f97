use crate::common;

use aws_sdk_dynamodb::types;

/// Name of the partition key attribute.
pub const PARTITION_KEY: &str = "PK";

/// Name of the sort key attribute.
pub const SORT_KEY: &str = "SK";

/// Key attribute and its string value.
///
/// ```rust
/// use dynamodb_envelope::common::key;
///
/// let key = key::Key {
///     name: "GSI1PK".to_string(),
///     value: "TENANT#7".to_string(),
/// };
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Key {
    /// The attribute name of the key.
    pub name: String,
    /// The value of the key.
    pub value: String,
}

/// Primary key of a record: partition key and optional sort key.
///
/// ```rust
/// use dynamodb_envelope::common::key;
///
/// let key = key::PrimaryKey::new("USER#1", Some("PROFILE"));
/// assert_eq!(key.cache_key("users"), "users:USER#1PROFILE");
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct PrimaryKey {
    /// The partition key value (required, non-empty).
    pub pk: String,
    /// The sort key value.
    pub sk: Option<String>,
}

impl PrimaryKey {
    /// Build a primary key from its values.
    pub fn new(pk: impl Into<String>, sk: Option<impl Into<String>>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.map(Into::into),
        }
    }

    /// Read the primary key attributes of an item.
    pub fn from_item(item: &common::Item) -> Option<Self> {
        let pk = match item.get(PARTITION_KEY) {
            Some(types::AttributeValue::S(pk)) => pk.clone(),
            _ => return None,
        };
        let sk = match item.get(SORT_KEY) {
            Some(types::AttributeValue::S(sk)) => Some(sk.clone()),
            _ => None,
        };
        Some(Self { pk, sk })
    }

    /// Key under which the record is cached: `{table}:{PK}{SK}`.
    pub fn cache_key(&self, table_name: &str) -> String {
        format!(
            "{table_name}:{}{}",
            self.pk,
            self.sk.as_deref().unwrap_or_default()
        )
    }
}

impl From<PrimaryKey> for common::Item {
    fn from(key: PrimaryKey) -> Self {
        let mut keys = Self::from([(
            PARTITION_KEY.to_string(),
            types::AttributeValue::S(key.pk),
        )]);
        if let Some(sk) = key.sk {
            keys.insert(SORT_KEY.to_string(), types::AttributeValue::S(sk));
        }
        keys
    }
}
