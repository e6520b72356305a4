// ── Entity overrides ──
//
// Local customization of generated descriptors. An override only ever
// replaces pieces of a descriptor, so applying the same set twice leaves
// the registry unchanged.

use tracing::debug;

use crate::entity::{FieldInfo, Humanizer};
use crate::error::CoreError;
use crate::registry::AppInfoBuilder;

/// Changes to one entity descriptor.
#[derive(Debug, Clone)]
pub struct EntityOverride {
    pub service: String,
    pub entity: String,
    pub list_columns: Option<Vec<String>>,
    pub humanizer: Option<Humanizer>,
    /// Fields to add, or to replace by name.
    pub fields: Vec<FieldInfo>,
    pub removed_fields: Vec<String>,
}

impl EntityOverride {
    pub fn new(service: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entity: entity.into(),
            list_columns: None,
            humanizer: None,
            fields: Vec::new(),
            removed_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_list_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.list_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_humanizer(mut self, humanizer: Humanizer) -> Self {
        self.humanizer = Some(humanizer);
        self
    }

    /// Shorthand for a humanizer reading one field.
    #[must_use]
    pub fn with_human_name_field(self, field: impl Into<String>) -> Self {
        self.with_humanizer(Humanizer::from_field(field))
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn without_field(mut self, name: impl Into<String>) -> Self {
        self.removed_fields.push(name.into());
        self
    }

    /// Rewrite the target descriptor in `registry`.
    pub fn apply(&self, registry: &mut AppInfoBuilder) -> Result<(), CoreError> {
        let mut info = registry
            .entity_info(&self.service, &self.entity)
            .ok_or_else(|| CoreError::UnknownEntity {
                service: self.service.clone(),
                entity: self.entity.clone(),
            })?;

        for field in &self.fields {
            info.set_field(field.clone())?;
        }
        for name in &self.removed_fields {
            if info.find_field(name).is_some() {
                info.remove_field(name)?;
            }
        }
        if let Some(columns) = &self.list_columns {
            info.set_list_columns(columns.iter().cloned())?;
        }
        if let Some(humanizer) = &self.humanizer {
            info.set_humanizer(humanizer.clone());
        }

        debug!(service = %self.service, entity = %self.entity, "override applied");
        registry.update_entity_info(info)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::EntityInfo;
    use crate::kind::FieldKindName;
    use crate::model::Record;

    fn registry() -> AppInfoBuilder {
        let mut b = AppInfoBuilder::new();
        b.add_entity(EntityInfo::new(
            "users",
            "user",
            [
                FieldInfo::new("email", FieldKindName::Email),
                FieldInfo::new("name", FieldKindName::String),
                FieldInfo::new("legacy_code", FieldKindName::String),
            ],
        ))
        .unwrap();
        b
    }

    fn user_override() -> EntityOverride {
        EntityOverride::new("users", "user")
            .with_list_columns(["id", "email"])
            .with_human_name_field("email")
            .with_field(FieldInfo::new("age", FieldKindName::Integer))
            .without_field("legacy_code")
    }

    fn snapshot(b: &AppInfoBuilder) -> (Vec<String>, Vec<String>, String) {
        let info = b.entity_info("users", "user").unwrap();
        let record = Record::new("u1").with("email", "a@x.com");
        (
            info.fields().map(|f| f.name.clone()).collect(),
            info.list_columns().to_vec(),
            info.human_name(&record),
        )
    }

    #[test]
    fn override_rewrites_descriptor() {
        let mut b = registry();
        user_override().apply(&mut b).unwrap();
        let (fields, columns, human) = snapshot(&b);
        assert_eq!(fields, ["id", "email", "name", "age"]);
        assert_eq!(columns, ["id", "email"]);
        assert_eq!(human, "a@x.com");
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let overrides = [user_override()];
        let mut once = registry();
        once.apply_overrides(&overrides).unwrap();
        let mut twice = registry();
        twice.apply_overrides(&overrides).unwrap();
        twice.apply_overrides(&overrides).unwrap();
        assert_eq!(snapshot(&once), snapshot(&twice));
    }

    #[test]
    fn bad_column_fails_and_leaves_registry_untouched() {
        let mut b = registry();
        let err = EntityOverride::new("users", "user")
            .with_list_columns(["id", "age"])
            .apply(&mut b)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidColumn { .. }));
        assert_eq!(snapshot(&b).1, ["id", "email", "name", "legacy_code"]);
    }

    #[test]
    fn unknown_target_fails() {
        let mut b = registry();
        let err = EntityOverride::new("users", "ghost").apply(&mut b).unwrap_err();
        assert!(matches!(err, CoreError::UnknownEntity { .. }));
    }
}
