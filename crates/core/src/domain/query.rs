// Read options, ordering and paged responses

use crate::error::{AppError, Reason, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordering applied when the caller gives none
pub const DEFAULT_ORDER: &str = "id:asc";

/// Relation loading instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Populate {
    /// `true` resolves every relation, `false` none
    All(bool),
    /// Resolve only the listed relations
    Fields(Vec<String>),
}

impl Populate {
    pub fn fields(&self) -> &[String] {
        match self {
            Populate::Fields(fields) => fields,
            Populate::All(_) => &[],
        }
    }
}

/// Caller-facing read options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    #[serde(default)]
    pub populate: Option<Populate>,
    /// `field:asc` or `field:desc`
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn populate(mut self, populate: Populate) -> Self {
        self.populate = Some(populate);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Parsed `field:direction` ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl FromStr for OrderBy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field.trim(), direction.trim()),
            None => (s.trim(), "asc"),
        };

        if field.is_empty() {
            return Err(AppError::bad_request(Reason::InvalidOrder, s));
        }

        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => Direction::Asc,
            "desc" => Direction::Desc,
            _ => return Err(AppError::bad_request(Reason::InvalidOrder, s)),
        };

        Ok(OrderBy {
            field: field.to_string(),
            direction,
        })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{}:{}", self.field, direction)
    }
}

/// Normalized options handed to a repository adapter
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub populate: Option<Populate>,
    pub order: OrderBy,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Bypass any adapter-side identity cache
    pub refresh: bool,
}

/// One page of records plus the total matching count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialResponse<E> {
    pub order: String,
    pub limit: u64,
    pub offset: u64,
    /// Total rows matching the criteria, independent of `limit`
    pub count: u64,
    pub records: Vec<E>,
}
