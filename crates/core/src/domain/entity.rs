// Entity contract shared by every record type managed by the layer

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Identifier of a persisted entity (UUID text)
pub type EntityId = String;

/// Raw field map used for create/update data and adapter row exchange
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Name of the identifier field on every entity
pub const ID_FIELD: &str = "id";

/// Storage kind of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Real,
    Boolean,
    /// Nested value stored as serialized JSON
    Json,
}

/// Declared field of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn text(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Text }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Integer }
    }

    pub const fn real(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Real }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Boolean }
    }

    pub const fn json(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Json }
    }
}

/// A persisted record type.
///
/// The service never looks at concrete fields beyond `id`; `FIELDS` exists so
/// that adapters can validate criteria and map columns. Implementors must
/// deserialize from a partial [`Record`] (struct-level `#[serde(default)]`),
/// since transient comparison records are built from partial update data.
///
/// # Example
///
/// ```text
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Customer { id: String, created: i64, updated: i64, email: String }
///
/// impl Entity for Customer {
///     const TABLE: &'static str = "customers";
///     const FIELDS: &'static [Field] = &[
///         Field::text("id"), Field::integer("created"),
///         Field::integer("updated"), Field::text("email"),
///     ];
///     fn id(&self) -> &EntityId { &self.id }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Storage name (table, collection)
    const TABLE: &'static str;

    /// Every field the entity carries, `id` included
    const FIELDS: &'static [Field];

    /// Fields assigned at construction or by the adapter on write.
    /// They are never compared when deciding whether an update is needed.
    const DERIVED_FIELDS: &'static [&'static str] = &["created", "updated"];

    fn id(&self) -> &EntityId;

    fn field(name: &str) -> Option<&'static Field> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }

    fn has_field(name: &str) -> bool {
        Self::field(name).is_some()
    }

    fn is_derived(name: &str) -> bool {
        Self::DERIVED_FIELDS.contains(&name)
    }
}
