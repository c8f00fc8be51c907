// Business unique key: fields whose combined values identify at most one entity

use super::criteria::Criteria;
use super::entity::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered, non-empty list of field names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct UniqueKey(Vec<String>);

impl UniqueKey {
    /// Returns `None` when no field is given
    pub fn new<I, S>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            None
        } else {
            Some(Self(fields))
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Equality clause restricted to the key fields; absent values match null
    pub fn clause(&self, data: &Record) -> Criteria {
        let mut criteria = Criteria::new();
        for field in &self.0 {
            criteria.insert(field.clone(), data.get(field).cloned().unwrap_or(Value::Null));
        }
        criteria
    }
}

impl TryFrom<Vec<String>> for UniqueKey {
    type Error = String;

    fn try_from(fields: Vec<String>) -> Result<Self, Self::Error> {
        UniqueKey::new(fields).ok_or_else(|| "unique key requires at least one field".to_string())
    }
}

impl From<UniqueKey> for Vec<String> {
    fn from(key: UniqueKey) -> Self {
        key.0
    }
}
