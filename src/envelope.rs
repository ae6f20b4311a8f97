//! Typed envelopes: the flat, storage-ready form of an entity.
//!
//! An [`Entity`] is plain application data that knows how to derive its keys. An
//! [`Envelope`] wraps it with the key attributes, the JSON payload under `Data`, the
//! schema tag under `TypeName` and the concurrency ticks. [`DataEnvelope`] is the
//! standard envelope.

use crate::{common, error};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors raised while sealing or hydrating an envelope.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum EnvelopeError {
    /// The entity derived an empty partition key.
    #[error("envelope has an empty partition key")]
    MissingPartitionKey,
    /// The stored record holds another schema.
    #[error("expected TypeName {expected}, found {found}")]
    TypeMismatch {
        /// Schema tag of the entity type.
        expected: &'static str,
        /// Schema tag found in the record.
        found: String,
    },
    /// The record or its payload could not be decoded.
    #[error("failed to decode record: {0}")]
    Decode(String),
    /// The entity could not be encoded.
    #[error("failed to encode record: {0}")]
    Encode(String),
}

impl From<EnvelopeError> for error::RepositoryError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::MissingPartitionKey => Self::BadRequest(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

/// Key values an entity derives from its own fields.
///
/// ```rust
/// use dynamodb_envelope::envelope::EnvelopeKeys;
///
/// let keys = EnvelopeKeys {
///     sk1: Some("2024-06-15".to_string()),
///     ..EnvelopeKeys::new("CUSTOMER#7", Some("ORDER#42"))
/// };
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct EnvelopeKeys {
    /// Partition key (required, non-empty).
    pub pk: String,
    /// Sort key.
    pub sk: Option<String>,
    /// Sort key of the `PK-SK1-Index` local secondary index.
    pub sk1: Option<String>,
    /// Sort key of the `PK-SK2-Index` local secondary index.
    pub sk2: Option<String>,
    /// Sort key of the `PK-SK3-Index` local secondary index.
    pub sk3: Option<String>,
    /// Sort key of the `PK-SK4-Index` local secondary index.
    pub sk4: Option<String>,
    /// Sort key of the `PK-SK5-Index` local secondary index.
    pub sk5: Option<String>,
    /// Partition key of the global secondary index.
    pub gsi1_pk: Option<String>,
    /// Sort key of the global secondary index.
    pub gsi1_sk: Option<String>,
}

impl EnvelopeKeys {
    /// Primary key only; secondary keys unset.
    pub fn new(pk: impl Into<String>, sk: Option<impl Into<String>>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.map(Into::into),
            ..Default::default()
        }
    }
}

/// Application data stored through an envelope.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Schema tag stored under `TypeName`. Change it when the payload shape changes.
    const TYPE_NAME: &'static str;

    /// Derive the key attributes from the entity's fields. Must be deterministic.
    fn keys(&self) -> EnvelopeKeys;

    /// Value projected under `Status`.
    fn status(&self) -> Option<String> {
        None
    }

    /// Value projected under `General`.
    fn general(&self) -> Option<String> {
        None
    }
}

/// The flat record stored in the table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EnvelopeRecord {
    /// Partition key.
    #[serde(rename = "PK", default)]
    pub pk: String,
    /// Sort key.
    #[serde(rename = "SK", default, skip_serializing_if = "Option::is_none")]
    pub sk: Option<String>,
    /// First local secondary sort key.
    #[serde(rename = "SK1", default, skip_serializing_if = "Option::is_none")]
    pub sk1: Option<String>,
    /// Second local secondary sort key.
    #[serde(rename = "SK2", default, skip_serializing_if = "Option::is_none")]
    pub sk2: Option<String>,
    /// Third local secondary sort key.
    #[serde(rename = "SK3", default, skip_serializing_if = "Option::is_none")]
    pub sk3: Option<String>,
    /// Fourth local secondary sort key.
    #[serde(rename = "SK4", default, skip_serializing_if = "Option::is_none")]
    pub sk4: Option<String>,
    /// Fifth local secondary sort key.
    #[serde(rename = "SK5", default, skip_serializing_if = "Option::is_none")]
    pub sk5: Option<String>,
    /// Global secondary partition key.
    #[serde(rename = "GSI1PK", default, skip_serializing_if = "Option::is_none")]
    pub gsi1_pk: Option<String>,
    /// Global secondary sort key.
    #[serde(rename = "GSI1SK", default, skip_serializing_if = "Option::is_none")]
    pub gsi1_sk: Option<String>,
    /// Schema tag of the payload.
    #[serde(rename = "TypeName", default)]
    pub type_name: String,
    /// JSON payload of the entity.
    #[serde(rename = "Data", default)]
    pub data: String,
    /// Free-form status projection.
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Free-form general projection.
    #[serde(rename = "General", default, skip_serializing_if = "Option::is_none")]
    pub general: Option<String>,
    /// Creation time in UTC ticks.
    #[serde(rename = "CreateUtcTick", default)]
    pub create_utc_tick: i64,
    /// Last update time in UTC ticks; the optimistic concurrency version.
    #[serde(rename = "UpdateUtcTick", default)]
    pub update_utc_tick: i64,
    /// Soft-delete marker.
    #[serde(rename = "IsDeleted", default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    /// Expiry in Unix epoch seconds.
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl EnvelopeRecord {
    /// Primary key of the record.
    pub fn primary_key(&self) -> common::key::PrimaryKey {
        common::key::PrimaryKey {
            pk: self.pk.clone(),
            sk: self.sk.clone(),
        }
    }

    fn apply_keys(&mut self, keys: EnvelopeKeys) {
        self.pk = keys.pk;
        self.sk = keys.sk;
        self.sk1 = keys.sk1;
        self.sk2 = keys.sk2;
        self.sk3 = keys.sk3;
        self.sk4 = keys.sk4;
        self.sk5 = keys.sk5;
        self.gsi1_pk = keys.gsi1_pk;
        self.gsi1_sk = keys.gsi1_sk;
    }
}

/// Flatten/hydrate capability over an [`Entity`].
pub trait Envelope: Sized + Send + Sync + 'static {
    /// The wrapped entity type.
    type Entity: Entity;

    /// Wrap an entity and seal it.
    fn from_entity(entity: Self::Entity) -> Result<Self, EnvelopeError>;

    /// Hydrate an envelope from a stored record.
    ///
    /// Must tolerate records lacking the optional attributes, leaving them unset.
    fn from_record(record: EnvelopeRecord) -> Result<Self, EnvelopeError>;

    /// Derive the key attributes, `TypeName` and `Data` from the entity. Idempotent.
    fn seal(&mut self) -> Result<(), EnvelopeError>;

    /// The flat record.
    fn record(&self) -> &EnvelopeRecord;

    /// The flat record, mutably. Key attributes are rewritten by the next [`Envelope::seal`].
    fn record_mut(&mut self) -> &mut EnvelopeRecord;

    /// The wrapped entity.
    fn entity(&self) -> &Self::Entity;

    /// Hydrate an envelope from a store item.
    fn from_item(item: common::Item) -> Result<Self, EnvelopeError> {
        let record: EnvelopeRecord =
            serde_dynamo::from_item(item).map_err(|err| EnvelopeError::Decode(err.to_string()))?;
        Self::from_record(record)
    }

    /// Flatten the envelope into a store item.
    fn to_item(&self) -> Result<common::Item, EnvelopeError> {
        serde_dynamo::to_item(self.record()).map_err(|err| EnvelopeError::Encode(err.to_string()))
    }

    /// Primary key of the envelope.
    fn primary_key(&self) -> common::key::PrimaryKey {
        self.record().primary_key()
    }

    /// Whether the record carries the soft-delete marker.
    fn is_deleted(&self) -> bool {
        self.record().is_deleted.unwrap_or(false)
    }
}

/// Standard envelope around an entity.
///
/// ```rust
/// use dynamodb_envelope::envelope::{DataEnvelope, Entity, Envelope, EnvelopeKeys};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Deserialize, Serialize)]
/// struct Customer {
///     id: String,
///     name: String,
/// }
///
/// impl Entity for Customer {
///     const TYPE_NAME: &'static str = "Customer";
///
///     fn keys(&self) -> EnvelopeKeys {
///         EnvelopeKeys::new(format!("CUSTOMER#{}", self.id), Some("PROFILE"))
///     }
/// }
///
/// let envelope = DataEnvelope::from_entity(Customer {
///     id: "7".to_string(),
///     name: "Ada".to_string(),
/// })
/// .unwrap();
/// assert_eq!(envelope.record().pk, "CUSTOMER#7");
/// assert_eq!(envelope.record().type_name, "Customer");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DataEnvelope<T> {
    entity: T,
    record: EnvelopeRecord,
}

impl<T: Entity> DataEnvelope<T> {
    /// Replace the entity and reseal.
    pub fn set_entity(&mut self, entity: T) -> Result<(), EnvelopeError> {
        self.entity = entity;
        self.seal()
    }

    /// The wrapped entity, mutably. Changes are sealed on the next write.
    pub fn entity_mut(&mut self) -> &mut T {
        &mut self.entity
    }

    /// Unwrap the entity.
    pub fn into_entity(self) -> T {
        self.entity
    }
}

impl<T: Entity> Envelope for DataEnvelope<T> {
    type Entity = T;

    fn from_entity(entity: T) -> Result<Self, EnvelopeError> {
        let mut envelope = Self {
            entity,
            record: EnvelopeRecord::default(),
        };
        envelope.seal()?;
        Ok(envelope)
    }

    fn from_record(mut record: EnvelopeRecord) -> Result<Self, EnvelopeError> {
        if record.type_name != T::TYPE_NAME {
            return Err(EnvelopeError::TypeMismatch {
                expected: T::TYPE_NAME,
                found: record.type_name,
            });
        }
        let entity: T = serde_json::from_str(&record.data)
            .map_err(|err| EnvelopeError::Decode(err.to_string()))?;
        // projected records carry no key attributes
        if record.pk.is_empty() {
            record.apply_keys(entity.keys());
        }
        Ok(Self { entity, record })
    }

    fn seal(&mut self) -> Result<(), EnvelopeError> {
        let keys = self.entity.keys();
        if keys.pk.is_empty() {
            return Err(EnvelopeError::MissingPartitionKey);
        }
        let data = serde_json::to_string(&self.entity)
            .map_err(|err| EnvelopeError::Encode(err.to_string()))?;
        self.record.apply_keys(keys);
        self.record.type_name = T::TYPE_NAME.to_string();
        self.record.data = data;
        self.record.status = self.entity.status();
        self.record.general = self.entity.general();
        Ok(())
    }

    fn record(&self) -> &EnvelopeRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut EnvelopeRecord {
        &mut self.record
    }

    fn entity(&self) -> &T {
        &self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;

    #[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
    struct Note {
        author: String,
        id: String,
        topic: Option<String>,
        pinned: bool,
    }

    impl Entity for Note {
        const TYPE_NAME: &'static str = "Note.v1";

        fn keys(&self) -> EnvelopeKeys {
            EnvelopeKeys {
                sk2: self.topic.clone(),
                ..EnvelopeKeys::new(format!("AUTHOR#{}", self.author), Some(&self.id))
            }
        }

        fn status(&self) -> Option<String> {
            self.pinned.then(|| "pinned".to_string())
        }
    }

    fn note(topic: Option<&str>) -> Note {
        Note {
            author: "ada".to_string(),
            id: "n1".to_string(),
            topic: topic.map(str::to_string),
            pinned: true,
        }
    }

    #[test]
    fn test_seal_derives_keys_and_payload() {
        let envelope = DataEnvelope::from_entity(note(Some("rust"))).unwrap();
        let record = envelope.record();
        assert_eq!(record.pk, "AUTHOR#ada");
        assert_eq!(record.sk.as_deref(), Some("n1"));
        assert_eq!(record.sk2.as_deref(), Some("rust"));
        assert_eq!(record.sk1, None);
        assert_eq!(record.type_name, "Note.v1");
        assert_eq!(record.status.as_deref(), Some("pinned"));
        assert_eq!(
            serde_json::from_str::<Note>(&record.data).unwrap(),
            note(Some("rust"))
        );
    }

    #[test]
    fn test_seal_is_idempotent() {
        let mut envelope = DataEnvelope::from_entity(note(Some("rust"))).unwrap();
        let first = envelope.record().clone();
        envelope.seal().unwrap();
        assert_eq!(envelope.record(), &first);
    }

    #[test]
    fn test_seal_rejects_empty_partition_key() {
        let result = DataEnvelope::from_entity(Note {
            author: String::new(),
            ..note(None)
        });
        assert!(matches!(result, Err(EnvelopeError::MissingPartitionKey)));
        assert_eq!(
            error::RepositoryError::from(EnvelopeError::MissingPartitionKey).status_code(),
            400
        );
    }

    #[rstest]
    #[case::with_secondary_key(Some("rust"))]
    #[case::without_secondary_key(None)]
    fn test_item_round_trip(#[case] topic: Option<&str>) {
        let mut envelope = DataEnvelope::from_entity(note(topic)).unwrap();
        envelope.record_mut().update_utc_tick = 42;
        let item = envelope.to_item().unwrap();
        for absent in ["SK1", "SK3", "SK4", "SK5", "GSI1PK", "GSI1SK", "IsDeleted", "TTL", "General"] {
            assert!(!item.contains_key(absent), "{absent} should be unset");
        }
        assert_eq!(item.contains_key("SK2"), topic.is_some());
        assert_eq!(
            item.get("UpdateUtcTick"),
            Some(&types::AttributeValue::N("42".to_string()))
        );
        let hydrated = DataEnvelope::<Note>::from_item(item).unwrap();
        assert_eq!(hydrated, envelope);
    }

    #[test]
    fn test_hydrate_projected_record_rekeys_from_entity() {
        let envelope = DataEnvelope::from_entity(note(Some("rust"))).unwrap();
        let item = common::projection::Projection::envelope().apply(envelope.to_item().unwrap());
        let hydrated = DataEnvelope::<Note>::from_item(item).unwrap();
        assert_eq!(hydrated.primary_key(), envelope.primary_key());
        assert_eq!(hydrated.record().sk2.as_deref(), Some("rust"));
        assert!(!hydrated.is_deleted());
    }

    #[rstest]
    #[case::type_mismatch(
        EnvelopeRecord {
            pk: "AUTHOR#ada".to_string(),
            type_name: "Note.v0".to_string(),
            data: "{}".to_string(),
            ..Default::default()
        }
    )]
    #[case::malformed_data(
        EnvelopeRecord {
            pk: "AUTHOR#ada".to_string(),
            type_name: "Note.v1".to_string(),
            data: "{\"author\":".to_string(),
            ..Default::default()
        }
    )]
    fn test_hydrate_rejects_undecodable_records(#[case] record: EnvelopeRecord) {
        let err = DataEnvelope::<Note>::from_record(record).unwrap_err();
        assert_eq!(error::RepositoryError::from(err).status_code(), 500);
    }

    #[test]
    fn test_hydrate_rejects_wrong_attribute_type() {
        let item = common::Item::from([(
            "UpdateUtcTick".to_string(),
            types::AttributeValue::S("soon".to_string()),
        )]);
        assert!(matches!(
            DataEnvelope::<Note>::from_item(item),
            Err(EnvelopeError::Decode(_))
        ));
    }
}
