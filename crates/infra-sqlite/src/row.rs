// Row <-> Record conversion driven by the entity's declared fields

use crate::error::map_sqlx_error;
use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};
use tabula_core::domain::{Field, FieldKind, Record};
use tabula_core::port::DatastoreError;

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Owned bind parameter
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Param {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

impl Param {
    /// Convert a record value for a column of the given kind.
    ///
    /// SQLite columns are loosely typed, so values that do not fit the
    /// declared kind are bound as they are rather than rejected.
    pub(crate) fn from_value(kind: FieldKind, value: &Value) -> Self {
        match (kind, value) {
            (_, Value::Null) => Param::Null,
            (FieldKind::Json, other) => Param::Text(other.to_string()),
            (_, Value::Bool(b)) => match kind {
                FieldKind::Integer | FieldKind::Real => Param::Integer(i64::from(*b)),
                _ => Param::Boolean(*b),
            },
            (_, Value::Number(n)) => match n.as_i64() {
                Some(i) if kind != FieldKind::Real => Param::Integer(i),
                _ => n.as_f64().map(Param::Real).unwrap_or(Param::Null),
            },
            (_, Value::String(s)) => Param::Text(s.clone()),
            (_, other) => Param::Text(other.to_string()),
        }
    }

    pub(crate) fn bind<'q>(self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        match self {
            Param::Null => query.bind(None::<String>),
            Param::Text(s) => query.bind(s),
            Param::Integer(i) => query.bind(i),
            Param::Real(f) => query.bind(f),
            Param::Boolean(b) => query.bind(b),
        }
    }
}

pub(crate) fn bind_all<'q>(query: SqliteQuery<'q>, params: Vec<Param>) -> SqliteQuery<'q> {
    params.into_iter().fold(query, |query, param| param.bind(query))
}

/// Read the declared fields of a row into a record
pub(crate) fn decode_row(row: &SqliteRow, fields: &[Field]) -> Result<Record, DatastoreError> {
    let mut record = Record::new();

    for field in fields {
        let name = field.name;
        let value = match field.kind {
            FieldKind::Text => row
                .try_get::<Option<String>, _>(name)
                .map_err(map_sqlx_error)?
                .map(Value::String),
            FieldKind::Integer => row
                .try_get::<Option<i64>, _>(name)
                .map_err(map_sqlx_error)?
                .map(Value::from),
            FieldKind::Real => row
                .try_get::<Option<f64>, _>(name)
                .map_err(map_sqlx_error)?
                .and_then(Number::from_f64)
                .map(Value::Number),
            FieldKind::Boolean => row
                .try_get::<Option<bool>, _>(name)
                .map_err(map_sqlx_error)?
                .map(Value::Bool),
            FieldKind::Json => match row.try_get::<Option<String>, _>(name).map_err(map_sqlx_error)? {
                Some(text) => Some(serde_json::from_str(&text).map_err(|e| {
                    DatastoreError::raw(format!("invalid JSON in column {name}: {e}"))
                })?),
                None => None,
            },
        };
        record.insert(name.to_string(), value.unwrap_or(Value::Null));
    }

    Ok(record)
}

/// Display form of a value inside a constraint message
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_follows_kind() {
        assert_eq!(Param::from_value(FieldKind::Integer, &json!(3)), Param::Integer(3));
        assert_eq!(Param::from_value(FieldKind::Real, &json!(3)), Param::Real(3.0));
        assert_eq!(Param::from_value(FieldKind::Integer, &json!(true)), Param::Integer(1));
        assert_eq!(Param::from_value(FieldKind::Boolean, &json!(false)), Param::Boolean(false));
        assert_eq!(Param::from_value(FieldKind::Text, &Value::Null), Param::Null);
    }

    #[test]
    fn test_json_kind_is_serialized() {
        assert_eq!(
            Param::from_value(FieldKind::Json, &json!({"a": 1})),
            Param::Text(r#"{"a":1}"#.to_string())
        );
        assert_eq!(
            Param::from_value(FieldKind::Json, &json!("x")),
            Param::Text(r#""x""#.to_string())
        );
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("ann@example.com")), "ann@example.com");
        assert_eq!(display_value(&json!(7)), "7");
    }
}
