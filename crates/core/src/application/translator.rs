// Error Translator - datastore failures into the caller-facing taxonomy
//
// Drivers that report a typed code are classified on that code first. The
// message patterns below are the fallback and cover MySQL/MariaDB,
// PostgreSQL and SQLite wording.

use crate::error::{AppError, Reason};
use crate::port::{DatastoreCode, DatastoreError, Operation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const UNDEFINED: &str = "undefined";

static DUPLICATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)duplicate entry|duplicate key value violates unique constraint|unique constraint failed",
    )
    .expect("valid duplicate regex")
});

static DUPLICATE_VALUE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // MySQL: Duplicate entry 'a@b.io' for key 'email'
        Regex::new(r"(?i)entry '(.+?)' for").expect("valid mysql duplicate value regex"),
        // PostgreSQL: Key (email)=(a@b.io) already exists.
        Regex::new(r"(?i)key \(.+?\)=\((.+?)\) already exists")
            .expect("valid postgres duplicate value regex"),
    ]
});

static FK_CREATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)cannot add.+foreign key.+fails|insert or update on table .+ violates foreign key constraint",
    )
    .expect("valid fk create regex")
});

static FK_CREATE_SUBJECT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)references `(.+?)`").expect("valid mysql fk create subject regex"),
        Regex::new(r#"(?i)violates foreign key constraint "(.+?)""#)
            .expect("valid postgres fk create subject regex"),
    ]
});

static FK_DELETE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)cannot delete.+foreign key.+fails|update or delete on table .+ violates foreign key constraint",
    )
    .expect("valid fk delete regex")
});

static FK_DELETE_SUBJECT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\.`(.+?)`, constraint").expect("valid mysql fk delete subject regex"),
        Regex::new(r#"(?i)violates foreign key constraint "(.+?)""#)
            .expect("valid postgres fk delete subject regex"),
    ]
});

// SQLite does not say which side of the relation failed
static FK_UNDIRECTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)foreign key constraint failed").expect("valid fk regex"));

static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)query by not existing property|no such column|unknown column|column ".+?" does not exist"#,
    )
    .expect("valid property regex")
});

static PROPERTY_SUBJECT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)not existing property (?:\S+\.)?(\S+)")
            .expect("valid orm property regex"),
        Regex::new(r"(?i)no such column: (?:\S+\.)?(\S+)").expect("valid sqlite property regex"),
        Regex::new(r"(?i)unknown column '(?:[^']+\.)?([^']+)'")
            .expect("valid mysql property regex"),
        Regex::new(r#"(?i)column "(?:[^"]+\.)?([^"]+)" does not exist"#)
            .expect("valid postgres property regex"),
    ]
});

/// Classify a raw datastore failure.
///
/// Always produces an error: the datastore boundary never yields a value.
/// `data` is the record or entity being written, kept for diagnostics when
/// the failure cannot be classified.
pub fn classify(err: &DatastoreError, operation: Operation, data: Option<Value>) -> AppError {
    if let Some(code) = err.code {
        return classify_code(code, err, operation);
    }

    let message = err.message.as_str();

    if DUPLICATE_RE.is_match(message) {
        return AppError::duplicate_entry(first_capture(&DUPLICATE_VALUE_RES, message));
    }

    if FK_CREATE_RE.is_match(message) {
        let constraint = first_capture(&FK_CREATE_SUBJECT_RES, message);
        return fk_create(constraint);
    }

    if FK_DELETE_RE.is_match(message) {
        let constraint = first_capture(&FK_DELETE_SUBJECT_RES, message);
        return fk_delete(constraint);
    }

    if FK_UNDIRECTED_RE.is_match(message) {
        return match operation {
            Operation::Delete => fk_delete(None),
            _ => fk_create(None),
        };
    }

    if PROPERTY_RE.is_match(message) {
        let property = first_capture(&PROPERTY_SUBJECT_RES, message);
        return AppError::bad_request(
            Reason::PropertyNonExistant,
            property.as_deref().unwrap_or(UNDEFINED),
        );
    }

    AppError::query_failed(message, data)
}

fn classify_code(code: DatastoreCode, err: &DatastoreError, operation: Operation) -> AppError {
    let message = err.message.as_str();
    match code {
        DatastoreCode::UniqueViolation => AppError::duplicate_entry(
            err.detail
                .clone()
                .or_else(|| first_capture(&DUPLICATE_VALUE_RES, message)),
        ),
        DatastoreCode::ForeignKeyViolation => match operation {
            Operation::Delete => fk_delete(
                err.detail
                    .clone()
                    .or_else(|| first_capture(&FK_DELETE_SUBJECT_RES, message)),
            ),
            _ => fk_create(
                err.detail
                    .clone()
                    .or_else(|| first_capture(&FK_CREATE_SUBJECT_RES, message)),
            ),
        },
        DatastoreCode::UnknownProperty => {
            let property = err
                .detail
                .clone()
                .or_else(|| first_capture(&PROPERTY_SUBJECT_RES, message));
            AppError::bad_request(
                Reason::PropertyNonExistant,
                property.as_deref().unwrap_or(UNDEFINED),
            )
        }
    }
}

fn fk_create(constraint: Option<String>) -> AppError {
    AppError::bad_request(
        Reason::FkFailCreate,
        constraint.as_deref().unwrap_or(UNDEFINED),
    )
}

fn fk_delete(constraint: Option<String>) -> AppError {
    AppError::delete_blocked(constraint.unwrap_or_else(|| UNDEFINED.to_string()))
}

fn first_capture(patterns: &[Regex], message: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(message))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConflictDetail, QueryFailure};
    use serde_json::json;

    fn conflict(err: AppError) -> ConflictDetail {
        match err {
            AppError::Conflict(detail) => detail,
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_mysql_duplicate_entry_extracts_value() {
        let err = DatastoreError::raw(
            "insert into `customers` ... - Duplicate entry 'ann@example.com' for key 'customers_email_unique'",
        );
        let detail = conflict(classify(&err, Operation::Write, None));
        assert_eq!(detail.reason, Reason::DuplicateEntry);
        assert_eq!(detail.violation.as_deref(), Some("ann@example.com"));
    }

    #[test]
    fn test_postgres_duplicate_key_extracts_value() {
        let err = DatastoreError::raw(
            "duplicate key value violates unique constraint \"customers_email_key\" \
             Key (email)=(ann@example.com) already exists.",
        );
        let detail = conflict(classify(&err, Operation::Write, None));
        assert_eq!(detail.violation.as_deref(), Some("ann@example.com"));
    }

    #[test]
    fn test_duplicate_without_parseable_value() {
        let err = DatastoreError::raw("UNIQUE constraint failed: customers.email");
        let detail = conflict(classify(&err, Operation::Write, None));
        assert_eq!(detail.reason, Reason::DuplicateEntry);
        assert!(detail.violation.is_none());
    }

    #[test]
    fn test_mysql_fk_create_is_bad_request() {
        let err = DatastoreError::raw(
            "Cannot add or update a child row: a foreign key constraint fails \
             (`shop`.`orders`, CONSTRAINT `orders_customer_foreign` FOREIGN KEY (`customer_id`) \
             REFERENCES `customers` (`id`))",
        );
        let translated = classify(&err, Operation::Write, None);
        assert_eq!(translated.reason(), Reason::FkFailCreate);
        assert_eq!(
            translated.to_string(),
            "Bad request: customers must reference an existing entity"
        );
    }

    #[test]
    fn test_mysql_fk_delete_is_conflict() {
        let err = DatastoreError::raw(
            "Cannot delete or update a parent row: a foreign key constraint fails \
             (`shop`.`orders`, CONSTRAINT `orders_customer_foreign` FOREIGN KEY (`customer_id`) \
             REFERENCES `customers` (`id`))",
        );
        let detail = conflict(classify(&err, Operation::Delete, None));
        assert_eq!(detail.reason, Reason::FkFailDelete);
        assert_eq!(detail.violation.as_deref(), Some("orders"));
        assert_eq!(detail.message, "orders constraint prevents cascade deletion");
    }

    #[test]
    fn test_postgres_fk_delete_names_constraint() {
        let err = DatastoreError::raw(
            "update or delete on table \"customers\" violates foreign key constraint \
             \"orders_customer_id_fkey\" on table \"orders\"",
        );
        let detail = conflict(classify(&err, Operation::Delete, None));
        assert_eq!(detail.violation.as_deref(), Some("orders_customer_id_fkey"));
    }

    #[test]
    fn test_sqlite_fk_direction_follows_operation() {
        let err = DatastoreError::raw("FOREIGN KEY constraint failed");
        assert_eq!(
            classify(&err, Operation::Write, None).reason(),
            Reason::FkFailCreate
        );
        assert_eq!(
            classify(&err, Operation::Delete, None).reason(),
            Reason::FkFailDelete
        );
    }

    #[test]
    fn test_unknown_property_variants() {
        let messages = [
            "Trying to query by not existing property Customer.nickname",
            "no such column: nickname",
            "Unknown column 'c.nickname' in 'where clause'",
            "column \"nickname\" does not exist",
        ];
        for message in messages {
            let translated = classify(&DatastoreError::raw(message), Operation::Read, None);
            assert_eq!(translated.reason(), Reason::PropertyNonExistant, "{message}");
            assert!(translated.to_string().contains("nickname"), "{message}");
        }
    }

    #[test]
    fn test_code_takes_precedence_over_message() {
        let err = DatastoreError::coded(
            DatastoreCode::UniqueViolation,
            Some("ann@example.com".to_string()),
            "constraint violation",
        );
        let detail = conflict(classify(&err, Operation::Write, None));
        assert_eq!(detail.violation.as_deref(), Some("ann@example.com"));
    }

    #[test]
    fn test_coded_fk_uses_detail_as_constraint() {
        let err = DatastoreError::coded(
            DatastoreCode::ForeignKeyViolation,
            Some("orders.customer_id".to_string()),
            "FOREIGN KEY constraint failed",
        );
        let detail = conflict(classify(&err, Operation::Delete, None));
        assert_eq!(detail.violation.as_deref(), Some("orders.customer_id"));
    }

    #[test]
    fn test_unrecognized_keeps_raw_message_and_data() {
        let err = DatastoreError::raw("disk I/O error");
        let data = json!({"email": "ann@example.com"});
        match classify(&err, Operation::Write, Some(data.clone())) {
            AppError::InternalFailure(QueryFailure {
                reason,
                query,
                data: payload,
                ..
            }) => {
                assert_eq!(reason, Reason::QueryFail);
                assert_eq!(query.as_deref(), Some("disk I/O error"));
                assert_eq!(payload, Some(data));
            }
            other => panic!("expected internal failure, got {other:?}"),
        }
    }
}
