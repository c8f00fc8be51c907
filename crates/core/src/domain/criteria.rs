// Filter criteria: field -> equality value

use super::entity::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Equality filter over entity fields.
///
/// - scalar: field equals value
/// - `null`: field is null
/// - array: field is one of the values
/// - object with an `id` member: relation references that id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(Record);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition (builder style)
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Record> for Criteria {
    fn from(record: Record) -> Self {
        Self(record)
    }
}
