use crate::key::RecordKey;

/// Errors from record store operations.
///
/// "Absent", "present but unparseable", "parseable but incomplete" and
/// "of an unknown type" are separate variants so callers can tell a missing
/// record apart from an unreadable one.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record is stored under the key.
    #[error("record not found: {key}")]
    NotFound { key: RecordKey },

    /// Bytes are present but do not parse as the expected structure.
    #[error("cannot decode {key}: {reason}")]
    Decode { key: RecordKey, reason: String },

    /// The envelope parses but lacks one of its required fields.
    #[error("envelope for {key} is missing required field `{field}`")]
    MissingField {
        key: RecordKey,
        field: &'static str,
    },

    /// The envelope names a type the registry does not know.
    #[error("cannot resolve type {type_tag} from {type_location}")]
    TypeResolution {
        type_location: String,
        type_tag: String,
    },

    /// A type tag or key string is not usable as a storage key.
    #[error("invalid record key: {reason}")]
    InvalidKey { reason: String },

    /// A record could not be serialized for writing.
    #[error("cannot encode record: {0}")]
    Encode(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Stable machine-readable code for this error kind.
    ///
    /// Callers that translate store failures into external responses should
    /// key off this rather than the display message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Decode { .. } => "decode",
            Self::MissingField { .. } => "missing_field",
            Self::TypeResolution { .. } => "type_resolution",
            Self::InvalidKey { .. } => "invalid_key",
            Self::Encode(_) => "encode",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    pub fn is_type_resolution(&self) -> bool {
        matches!(self, Self::TypeResolution { .. })
    }

    /// Shorthand for a `Decode` error on `key`.
    pub fn decode(key: &RecordKey, reason: impl Into<String>) -> Self {
        Self::Decode {
            key: key.clone(),
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
