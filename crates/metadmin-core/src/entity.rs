// ── Entity type descriptors ──
//
// `FieldInfo` describes one field, `EntityInfo` one entity type. Both are
// plain data: the generic views read them, the registry owns them, and
// overrides replace pieces of them before the registry is frozen.

use std::fmt;
use std::sync::Arc;

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::CoreError;
use crate::kind::{self, FieldKind, FieldKindName};
use crate::model::{EntityId, ID_FIELD, Record};

// ── Field descriptors ───────────────────────────────────────────────

/// Extra type information some kinds need.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Sub-fields of a `nested` field.
    Object(TypeInfo),
    /// Allowed values of an `enum` field.
    Enum(EnumInfo),
    /// Target of a `foreign_key` field.
    Entity(EntityRef),
}

/// A named record shape used by nested fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub fields: IndexMap<String, FieldInfo>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = FieldInfo>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumInfo {
    pub name: String,
    pub values: Vec<String>,
}

/// `{service}/{entity}` pointer used by foreign keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub service: String,
    pub entity: String,
}

/// Descriptor of one field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKindName,
    pub label: Option<String>,
    pub required: bool,
    pub read_only: bool,
    pub type_ref: Option<TypeRef>,
    /// Set only on an entity's top-level `id`; nested `id` subfields
    /// are plain fields.
    pub(crate) primary_key: bool,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, kind: FieldKindName) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            required: false,
            read_only: false,
            type_ref: None,
            primary_key: false,
        }
    }

    /// The `id` primary key descriptor injected into every entity.
    pub fn primary_key() -> Self {
        Self::new(ID_FIELD, FieldKindName::Uuid).read_only().as_primary_key()
    }

    fn as_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, type_ref: TypeRef) -> Self {
        self.type_ref = Some(type_ref);
        self
    }

    /// The registered behavior for this field's kind.
    pub fn kind(&self) -> &'static FieldKind {
        kind::kind(self.kind)
    }

    /// Human label: the explicit one, else the kind's default.
    pub fn label(&self) -> String {
        self.kind().label(self)
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.type_ref {
            Some(TypeRef::Enum(e)) => Some(&e.values),
            _ => None,
        }
    }

    pub fn object_type(&self) -> Option<&TypeInfo> {
        match &self.type_ref {
            Some(TypeRef::Object(t)) => Some(t),
            _ => None,
        }
    }

    pub fn entity_ref(&self) -> Option<&EntityRef> {
        match &self.type_ref {
            Some(TypeRef::Entity(r)) => Some(r),
            _ => None,
        }
    }
}

// ── Humanizer ───────────────────────────────────────────────────────

/// Record -> display name.
#[derive(Clone)]
pub struct Humanizer(Arc<dyn Fn(&Record) -> String + Send + Sync>);

impl Humanizer {
    pub fn new(f: impl Fn(&Record) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Use the string value of `field`, falling back to the record id.
    pub fn from_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(move |record| match record.value(&field) {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Null) | None => record.id.to_string(),
            Some(other) => other.to_string(),
        })
    }

    pub fn humanize(&self, record: &Record) -> String {
        (self.0)(record)
    }
}

impl fmt::Debug for Humanizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Humanizer(..)")
    }
}

// ── Entity descriptor ───────────────────────────────────────────────

/// Descriptor of one entity type within a service.
///
/// Always contains an `id` field, and every list column names an existing
/// field. The constructors inject the key; [`EntityInfo::validate`] checks
/// the columns after overrides have run.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    name: String,
    service_name: String,
    fields: IndexMap<String, FieldInfo>,
    list_columns: Vec<String>,
    humanizer: Option<Humanizer>,
}

impl EntityInfo {
    /// Build a descriptor. List columns default to every field.
    pub fn new(
        service_name: impl Into<String>,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldInfo>,
    ) -> Self {
        let mut map: IndexMap<String, FieldInfo> = IndexMap::new();
        map.insert(ID_FIELD.to_owned(), FieldInfo::primary_key());
        for field in fields {
            if field.name == ID_FIELD {
                let mut key = field.as_primary_key();
                key.read_only = true;
                map.insert(ID_FIELD.to_owned(), key);
            } else {
                map.insert(field.name.clone(), field);
            }
        }
        let list_columns = map.keys().cloned().collect();
        Self {
            name: name.into(),
            service_name: service_name.into(),
            fields: map,
            list_columns,
            humanizer: None,
        }
    }

    // ── Names ────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias used by view titles.
    pub fn entity_name(&self) -> &str {
        &self.name
    }

    /// Capital-case entity name, e.g. `"user_group"` -> `"User Group"`.
    pub fn entity_name_formatted(&self) -> String {
        self.name.to_case(Case::Title)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    // ── Fields ───────────────────────────────────────────────────────

    /// Fields in declaration order, `id` first.
    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.values()
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    /// Look up a field, failing on unknown names.
    pub fn field_info(&self, name: &str) -> Result<&FieldInfo, CoreError> {
        self.fields.get(name).ok_or_else(|| CoreError::MissingField {
            entity: self.name.clone(),
            field: name.to_owned(),
        })
    }

    /// Replace or append a field. The primary key may be redefined but
    /// always stays read-only.
    pub fn set_field(&mut self, field: FieldInfo) -> Result<(), CoreError> {
        let field = if field.name == ID_FIELD {
            if !field.read_only {
                return Err(CoreError::PrimaryKey {
                    entity: self.name.clone(),
                    action: "made editable",
                });
            }
            field.as_primary_key()
        } else {
            field
        };
        if !self.fields.contains_key(&field.name) {
            self.list_columns.push(field.name.clone());
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Drop a field and any list column that shows it.
    pub fn remove_field(&mut self, name: &str) -> Result<(), CoreError> {
        if name == ID_FIELD {
            return Err(CoreError::PrimaryKey {
                entity: self.name.clone(),
                action: "removed",
            });
        }
        self.fields.shift_remove(name).ok_or_else(|| CoreError::MissingField {
            entity: self.name.clone(),
            field: name.to_owned(),
        })?;
        self.list_columns.retain(|c| c != name);
        Ok(())
    }

    // ── List columns ─────────────────────────────────────────────────

    pub fn list_columns(&self) -> &[String] {
        &self.list_columns
    }

    /// Replace the list columns. Every column must name a field.
    pub fn set_list_columns(
        &mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), CoreError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.check_columns(&columns)?;
        self.list_columns = columns;
        Ok(())
    }

    fn check_columns(&self, columns: &[String]) -> Result<(), CoreError> {
        match columns.iter().find(|c| !self.fields.contains_key(c.as_str())) {
            Some(column) => Err(CoreError::InvalidColumn {
                entity: self.name.clone(),
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Re-check the descriptor invariants.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.fields.get(ID_FIELD) {
            Some(key) if key.read_only => {}
            Some(_) => {
                return Err(CoreError::PrimaryKey {
                    entity: self.name.clone(),
                    action: "made editable",
                });
            }
            None => {
                return Err(CoreError::PrimaryKey {
                    entity: self.name.clone(),
                    action: "removed",
                });
            }
        }
        self.check_columns(&self.list_columns)
    }

    // ── Display name ─────────────────────────────────────────────────

    pub fn humanizer(&self) -> Option<&Humanizer> {
        self.humanizer.as_ref()
    }

    pub fn set_humanizer(&mut self, humanizer: Humanizer) {
        self.humanizer = Some(humanizer);
    }

    /// Display name of a record; the id when no humanizer is set.
    pub fn human_name(&self, record: &Record) -> String {
        self.humanizer
            .as_ref()
            .map_or_else(|| record.id.to_string(), |h| h.humanize(record))
    }

    // ── Paths ────────────────────────────────────────────────────────

    /// Backend path relative to `/v1/`: `{service}/{entity}`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.service_name, self.name)
    }

    pub fn list_path(&self) -> String {
        format!("/{}/list", self.path())
    }

    pub fn add_path(&self) -> String {
        format!("/{}/add", self.path())
    }

    pub fn detail_path(&self, id: &EntityId) -> String {
        format!("/{}/{id}", self.path())
    }

    pub fn edit_path(&self, id: &EntityId) -> String {
        format!("/{}/{id}/edit", self.path())
    }
}
