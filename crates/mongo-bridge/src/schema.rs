//! ObjectId input validation
//!
//! `ObjectIdSchema` is the string → ObjectId step of an input validation
//! pipeline: it rejects anything that is not a well-formed ObjectId with a
//! fixed message and yields the parsed native value otherwise.
//!
//! The [`object_id`] module plugs the same rule into serde:
//!
//! ```rust
//! use bson::oid::ObjectId;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct FetchUser {
//!     #[serde(with = "mongo_bridge::schema::object_id")]
//!     id: ObjectId,
//! }
//!
//! let input: FetchUser = serde_json::from_str(r#"{"id":"507f1f77bcf86cd799439011"}"#).unwrap();
//! assert_eq!(input.id.to_hex(), "507f1f77bcf86cd799439011");
//! ```

use bson::oid::ObjectId;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{BridgeError, Result};

static OBJECT_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{24}$").expect("ObjectId regex is valid")
});

/// Checks if a string has valid ObjectId format (24 hex characters)
pub fn is_valid_object_id(value: &str) -> bool {
    OBJECT_ID_REGEX.is_match(value)
}

/// Validates and transforms strings into ObjectIds
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdSchema;

impl ObjectIdSchema {
    pub const INVALID_MESSAGE: &'static str = "The object id is invalid.";

    /// Returns true if `value` passes validation
    pub fn validate(value: &str) -> bool {
        is_valid_object_id(value)
    }

    /// Validates `value` and transforms it into an ObjectId
    ///
    /// # Errors
    /// Returns `BridgeError::Validation` with [`Self::INVALID_MESSAGE`]
    pub fn parse(value: &str) -> Result<ObjectId> {
        if !Self::validate(value) {
            return Err(BridgeError::Validation(Self::INVALID_MESSAGE.to_string()));
        }
        Ok(ObjectId::parse_str(value)?)
    }
}

/// Serde adapter applying [`ObjectIdSchema`] to a string field
pub mod object_id {
    use bson::oid::ObjectId;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ObjectIdSchema;

    pub fn serialize<S>(value: &ObjectId, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_hex())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<ObjectId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ObjectIdSchema::parse(&raw)
            .map_err(|_| serde::de::Error::custom(ObjectIdSchema::INVALID_MESSAGE))
    }
}
