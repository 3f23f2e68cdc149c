//! Domain identifiers backed by BSON ObjectIds
//!
//! `ObjectEntityId` is the entity key used by domain code. `id_to_object_id`
//! normalises whatever shape an id arrives in (entity id, native ObjectId,
//! hex string or raw BSON) into the native value used in queries.

use std::fmt;
use std::str::FromStr;

use bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};

use crate::schema::is_valid_object_id;
use crate::{BridgeError, Result};

/// Entity identifier wrapping a 12-byte ObjectId
///
/// Equality, ordering, hashing and serialization all delegate to the inner
/// ObjectId. The value never changes once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectEntityId(ObjectId);

impl ObjectEntityId {
    /// Generates a fresh random identifier
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Returns the underlying ObjectId
    pub fn value(&self) -> ObjectId {
        self.0
    }

    /// Returns the 24 character hex representation
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for ObjectEntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for ObjectEntityId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<ObjectEntityId> for ObjectId {
    fn from(id: ObjectEntityId) -> Self {
        id.0
    }
}

impl From<ObjectEntityId> for Bson {
    fn from(id: ObjectEntityId) -> Self {
        Bson::ObjectId(id.0)
    }
}

impl FromStr for ObjectEntityId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        id_to_object_id(s).map(Self)
    }
}

impl fmt::Display for ObjectEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Any of the shapes an identifier may arrive in
#[derive(Debug, Clone, Copy)]
pub enum IdRef<'a> {
    Entity(ObjectEntityId),
    ObjectId(ObjectId),
    Str(&'a str),
    Bson(&'a Bson),
}

impl From<ObjectEntityId> for IdRef<'_> {
    fn from(id: ObjectEntityId) -> Self {
        IdRef::Entity(id)
    }
}

impl From<&ObjectEntityId> for IdRef<'_> {
    fn from(id: &ObjectEntityId) -> Self {
        IdRef::Entity(*id)
    }
}

impl From<ObjectId> for IdRef<'_> {
    fn from(oid: ObjectId) -> Self {
        IdRef::ObjectId(oid)
    }
}

impl From<&ObjectId> for IdRef<'_> {
    fn from(oid: &ObjectId) -> Self {
        IdRef::ObjectId(*oid)
    }
}

impl<'a> From<&'a str> for IdRef<'a> {
    fn from(s: &'a str) -> Self {
        IdRef::Str(s)
    }
}

impl<'a> From<&'a String> for IdRef<'a> {
    fn from(s: &'a String) -> Self {
        IdRef::Str(s.as_str())
    }
}

impl<'a> From<&'a Bson> for IdRef<'a> {
    fn from(value: &'a Bson) -> Self {
        IdRef::Bson(value)
    }
}

/// Converts an identifier to the native ObjectId
///
/// # Errors
/// - `BridgeError::InvalidIdType` if a BSON value is neither an ObjectId nor a string
/// - `BridgeError::InvalidIdFormat` if a string is not 24 hex characters
pub fn id_to_object_id<'a>(id: impl Into<IdRef<'a>>) -> Result<ObjectId> {
    match id.into() {
        IdRef::Entity(entity) => Ok(entity.value()),
        IdRef::ObjectId(oid) => Ok(oid),
        IdRef::Str(s) => parse_object_id(s),
        IdRef::Bson(Bson::ObjectId(oid)) => Ok(*oid),
        IdRef::Bson(Bson::String(s)) => parse_object_id(s),
        IdRef::Bson(_) => Err(BridgeError::InvalidIdType),
    }
}

fn parse_object_id(value: &str) -> Result<ObjectId> {
    if !is_valid_object_id(value) {
        return Err(BridgeError::InvalidIdFormat);
    }
    Ok(ObjectId::parse_str(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_new_ids_are_unique() {
        let a = ObjectEntityId::new();
        let b = ObjectEntityId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_hex().len(), 24);
    }

    #[test]
    fn test_generated_id_round_trips_through_string() {
        let id = ObjectEntityId::new();
        let native = id_to_object_id(id).unwrap();
        let hex = native.to_hex();
        let parsed = id_to_object_id(hex.as_str()).unwrap();
        assert_eq!(parsed, id.value());
    }

    #[test]
    fn test_native_object_id_is_returned_unchanged() {
        let oid = ObjectId::new();
        assert_eq!(id_to_object_id(oid).unwrap(), oid);
        assert_eq!(id_to_object_id(&oid).unwrap(), oid);
    }

    #[test]
    fn test_entity_id_returns_inner_value() {
        let oid = ObjectId::new();
        let id = ObjectEntityId::from(oid);
        assert_eq!(id_to_object_id(&id).unwrap(), oid);
        assert_eq!(ObjectId::from(id), oid);
    }

    #[test]
    fn test_malformed_strings_are_invalid_format() {
        for input in ["", "abc", "507f1f77bcf86cd79943901", "507f1f77bcf86cd79943901g", "507f1f77bcf86cd7994390111"] {
            let err = id_to_object_id(input).unwrap_err();
            assert!(matches!(err, BridgeError::InvalidIdFormat), "input {:?}", input);
        }
    }

    #[test]
    fn test_bson_inputs() {
        let oid = ObjectId::new();
        assert_eq!(id_to_object_id(&Bson::ObjectId(oid)).unwrap(), oid);
        assert_eq!(id_to_object_id(&Bson::String(oid.to_hex())).unwrap(), oid);

        let err = id_to_object_id(&Bson::String("nope".to_string())).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidIdFormat));

        for value in [Bson::Int32(7), Bson::Null, Bson::Boolean(true), Bson::Document(doc! {})] {
            let err = id_to_object_id(&value).unwrap_err();
            assert!(matches!(err, BridgeError::InvalidIdType));
        }
    }

    #[test]
    fn test_from_str_and_display() {
        let hex = "507f1f77bcf86cd799439011";
        let id: ObjectEntityId = hex.parse().unwrap();
        assert_eq!(id.to_string(), hex);
        assert!("not-an-id".parse::<ObjectEntityId>().is_err());
    }

    #[test]
    fn test_serializes_as_object_id() {
        let id = ObjectEntityId::new();
        let bson = bson::to_bson(&id).unwrap();
        assert_eq!(bson, Bson::ObjectId(id.value()));
        assert_eq!(Bson::from(id), bson);

        let back: ObjectEntityId = bson::from_bson(bson).unwrap();
        assert_eq!(back, id);
    }
}
