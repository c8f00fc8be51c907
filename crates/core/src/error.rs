// Central Error Type for the data-access layer

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable reason codes attached to every [`AppError`].
///
/// Callers (API layer, batch jobs) translate these into user-visible
/// responses; the strings never change between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    NotFound,
    DuplicateEntry,
    FkFailCreate,
    FkFailDelete,
    PropertyNonExistant,
    UkReferenceFail,
    UkMissing,
    EntityUndefined,
    InvalidOrder,
    QueryFail,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateEntry => "DUPLICATE_ENTRY",
            Self::FkFailCreate => "FK_FAIL_CREATE",
            Self::FkFailDelete => "FK_FAIL_DELETE",
            Self::PropertyNonExistant => "PROPERTY_NON_EXISTANT",
            Self::UkReferenceFail => "UK_REFERENCE_FAIL",
            Self::UkMissing => "UK_MISSING",
            Self::EntityUndefined => "ENTITY_UNDEFINED",
            Self::InvalidOrder => "INVALID_ORDER",
            Self::QueryFail => "QUERY_FAIL",
        }
    }

    /// Human-readable message associated with the reason
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "entity with given id does not exist",
            Self::DuplicateEntry => "unique constraint violation",
            Self::FkFailCreate => "must reference an existing entity",
            Self::FkFailDelete => "constraint prevents cascade deletion",
            Self::PropertyNonExistant => "property does not exist on entity",
            Self::UkReferenceFail => "unique constraint references more than one entity",
            Self::UkMissing => "missing default unique key implementation",
            Self::EntityUndefined => "cannot persist undefined entity",
            Self::InvalidOrder => "order must match <field>:<asc|desc>",
            Self::QueryFail => "failed to execute query statement",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a [`AppError::Conflict`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictDetail {
    pub reason: Reason,
    pub message: String,
    /// Offending value or blocking constraint, when the datastore reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
    /// Unique key that matched more than one entity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<Vec<String>>,
    /// Ids of every entity matched by `unique_key`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<String>,
}

impl fmt::Display for ConflictDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(violation) = &self.violation {
            write!(f, " ({violation})")?;
        }
        if let Some(key) = &self.unique_key {
            write!(f, " [key: {}; matches: {}]", key.join(", "), self.matches.join(", "))?;
        }
        Ok(())
    }
}

/// Payload of a [`AppError::InternalFailure`]
///
/// Unclassified failures keep the raw datastore message and the data that
/// was being written for postmortem diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    pub reason: Reason,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}: {}", self.message, query),
            None => f.write_str(&self.message),
        }
    }
}

/// Application-level error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictDetail),

    #[error("Bad request: {message}")]
    BadRequest { reason: Reason, message: String },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Internal failure: {0}")]
    InternalFailure(QueryFailure),
}

impl AppError {
    pub fn not_found() -> Self {
        AppError::NotFound(Reason::NotFound.message().to_string())
    }

    pub fn bad_request(reason: Reason, subject: impl fmt::Display) -> Self {
        AppError::BadRequest {
            reason,
            message: format!("{} {}", subject, reason.message()),
        }
    }

    pub fn duplicate_entry(violation: Option<String>) -> Self {
        AppError::Conflict(ConflictDetail {
            reason: Reason::DuplicateEntry,
            message: Reason::DuplicateEntry.message().to_string(),
            violation,
            unique_key: None,
            matches: Vec::new(),
        })
    }

    pub fn delete_blocked(constraint: String) -> Self {
        AppError::Conflict(ConflictDetail {
            reason: Reason::FkFailDelete,
            message: format!("{} {}", constraint, Reason::FkFailDelete.message()),
            violation: Some(constraint),
            unique_key: None,
            matches: Vec::new(),
        })
    }

    pub fn ambiguous_unique_key(unique_key: Vec<String>, matches: Vec<String>) -> Self {
        AppError::Conflict(ConflictDetail {
            reason: Reason::UkReferenceFail,
            message: Reason::UkReferenceFail.message().to_string(),
            violation: None,
            unique_key: Some(unique_key),
            matches,
        })
    }

    pub fn unique_key_missing() -> Self {
        AppError::NotImplemented(Reason::UkMissing.message().to_string())
    }

    pub fn entity_undefined() -> Self {
        AppError::InternalFailure(QueryFailure {
            reason: Reason::EntityUndefined,
            message: Reason::EntityUndefined.message().to_string(),
            query: None,
            data: None,
        })
    }

    pub fn query_failed(query: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        AppError::InternalFailure(QueryFailure {
            reason: Reason::QueryFail,
            message: Reason::QueryFail.message().to_string(),
            query: Some(query.into()),
            data,
        })
    }

    /// Stable reason code of this error
    pub fn reason(&self) -> Reason {
        match self {
            AppError::NotFound(_) => Reason::NotFound,
            AppError::Conflict(detail) => detail.reason,
            AppError::BadRequest { reason, .. } => *reason,
            AppError::NotImplemented(_) => Reason::UkMissing,
            AppError::InternalFailure(failure) => failure.reason,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Serialisation faults never leave the layer as their own kind
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::query_failed(format!("serialization error: {err}"), None)
    }
}
