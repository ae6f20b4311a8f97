use crate::common;

use std::collections;

/// Attributes projected by default when listing envelopes.
///
/// Keeps the soft-delete marker and expiry so that a listed envelope written back
/// by an update does not lose them.
pub const ENVELOPE_ATTRIBUTES: [&str; 8] = [
    "Data",
    "TypeName",
    "Status",
    "UpdateUtcTick",
    "CreateUtcTick",
    "General",
    "IsDeleted",
    "TTL",
];

/// Attributes an envelope cannot be hydrated without.
pub const REQUIRED_ATTRIBUTES: [&str; 2] = ["Data", "TypeName"];

/// Attributes to return from a read (projection expression).
///
/// ```rust
/// use dynamodb_envelope::common::projection;
///
/// let projection = projection::Projection::new(["Data", "TypeName"]);
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Projection(pub Vec<String>);

impl Projection {
    /// Project the given attribute names.
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(attributes.into_iter().map(Into::into).collect())
    }

    /// The envelope payload attributes.
    pub fn envelope() -> Self {
        Self::new(ENVELOPE_ATTRIBUTES)
    }

    /// Add the [`REQUIRED_ATTRIBUTES`] missing from the projection.
    pub fn with_required(mut self) -> Self {
        for attribute in REQUIRED_ATTRIBUTES {
            if !self.0.iter().any(|projected| projected == attribute) {
                self.0.push(attribute.to_string());
            }
        }
        self
    }

    /// Keep only the projected attributes of an item.
    pub fn apply(&self, item: common::Item) -> common::Item {
        item.into_iter()
            .filter(|(name, _)| self.0.iter().any(|attribute| attribute == name))
            .collect()
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::envelope()
    }
}

impl From<Projection> for common::ExpressionInput {
    fn from(projection: Projection) -> Self {
        let operations = projection
            .0
            .into_iter()
            .map(|attribute| {
                let placeholder = format!("#{attribute}");
                common::ExpressionInput {
                    expression: placeholder.clone(),
                    expression_attribute_names: collections::HashMap::from([(
                        placeholder,
                        attribute,
                    )]),
                    ..Default::default()
                }
            })
            .collect();
        common::ExpressionInput::merge(", ", operations)
    }
}
