//! Error types for mongo-bridge

use std::fmt;

use thiserror::Error;

use crate::http::HttpStatus;

/// Result type alias for mongo-bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type for all mongo-bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Identifier input is neither an entity id, an ObjectId nor a string
    #[error("Invalid ID data type.")]
    InvalidIdType,

    /// Identifier string is not a 24 character hex ObjectId
    #[error("Invalid ID format.")]
    InvalidIdFormat,
}

impl BridgeError {
    /// Returns the underlying client error, if this error came from the driver
    pub fn as_mongodb(&self) -> Option<&mongodb::error::Error> {
        match self {
            BridgeError::MongoDB(err) => Some(err),
            _ => None,
        }
    }
}

impl From<bson::oid::Error> for BridgeError {
    fn from(_: bson::oid::Error) -> Self {
        BridgeError::InvalidIdFormat
    }
}

/// Derives the numeric classification code of an error kind.
///
/// The code is the CRC-32 (IEEE) checksum of the kind string. The kind is the
/// stable identity; the code is only a derived convenience.
pub fn classification_code(kind: &str) -> u32 {
    crc32fast::hash(kind.as_bytes())
}

/// Runtime error returned to application code for any failed database request.
///
/// Carries a fixed kind, its derived code, an HTTP-like status and the
/// original failure as `source()`.
pub struct DatabaseError {
    code: u32,
    cause: anyhow::Error,
}

impl DatabaseError {
    pub const KIND: &'static str = "DatabaseError";
    pub const MESSAGE: &'static str = "Database error.";
    pub const DETAILS: &'static str = "An error occurred while processing your database request.";
    pub const STATUS: HttpStatus = HttpStatus::SERVICE_UNAVAILABLE;

    /// Wraps `cause` as a database error
    pub fn new(cause: impl Into<anyhow::Error>) -> Self {
        Self {
            code: classification_code(Self::KIND),
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        Self::KIND
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn message(&self) -> &'static str {
        Self::MESSAGE
    }

    pub fn details(&self) -> &'static str {
        Self::DETAILS
    }

    pub fn status(&self) -> HttpStatus {
        Self::STATUS
    }

    /// The original failure, kept for diagnostics
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Attempts to view the original failure as a concrete error type
    pub fn downcast_cause<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.cause.downcast_ref::<E>()
    }

    pub fn into_cause(self) -> anyhow::Error {
        self.cause
    }
}

impl fmt::Debug for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseError")
            .field("kind", &Self::KIND)
            .field("code", &self.code)
            .field("status", &Self::STATUS.code())
            .field("cause", &self.cause)
            .finish()
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Self::MESSAGE, Self::DETAILS)
    }
}

impl std::error::Error for DatabaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + Send + Sync + 'static) = self.cause.as_ref();
        Some(cause)
    }
}
