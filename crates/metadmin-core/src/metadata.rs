// ── Generated metadata ──
//
// Service and entity descriptors are generated from the backend's type
// definitions and shipped as a JSON or TOML document. Loading resolves
// every kind name against the kind registry, so unknown kinds fail here
// rather than when a view renders.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{EntityInfo, EntityRef, EnumInfo, FieldInfo, Humanizer, TypeInfo, TypeRef};
use crate::error::CoreError;
use crate::kind::{self, FieldKindName};
use crate::registry::{AppInfoBuilder, ServiceInfo};

/// Root of a metadata document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub services: Vec<ServiceMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub entities: Vec<EntityMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldMetadata>,
    /// List columns; all fields when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_name_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Type name of a nested object or enum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Sub-fields of a nested field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldMetadata>>,
    /// Allowed values of an enum field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Target of a foreign key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ReferenceMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceMetadata {
    pub service: String,
    pub entity: String,
}

impl AppMetadata {
    /// Parse a `.json` or `.toml` file, picked by extension.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::Metadata {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(CoreError::Metadata {
                message: format!(
                    "unsupported metadata format {:?} for {}",
                    other.unwrap_or(""),
                    path.display()
                ),
            }),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(text)?)
    }

    /// Build an unfrozen registry from this document.
    pub fn into_builder(self) -> Result<AppInfoBuilder, CoreError> {
        let mut builder = AppInfoBuilder::new();
        for service in self.services {
            let mut info = ServiceInfo::new(&service.name);
            if let Some(icon) = service.icon {
                info = info.with_icon(icon);
            }
            builder.add_service(info)?;

            for entity in service.entities {
                builder.add_entity(entity.into_entity_info(&service.name)?)?;
            }
        }
        Ok(builder)
    }
}

impl EntityMetadata {
    fn into_entity_info(self, service: &str) -> Result<EntityInfo, CoreError> {
        let fields = self
            .fields
            .into_iter()
            .map(|f| f.into_field_info(&self.name))
            .collect::<Result<Vec<_>, _>>()?;
        let mut info = EntityInfo::new(service, &self.name, fields);
        if let Some(columns) = self.columns {
            info.set_list_columns(columns)?;
        }
        if let Some(field) = self.human_name_field {
            info.field_info(&field)?;
            info.set_humanizer(Humanizer::from_field(field));
        }
        debug!(service, entity = %self.name, "entity metadata loaded");
        Ok(info)
    }
}

impl FieldMetadata {
    fn into_field_info(self, owner: &str) -> Result<FieldInfo, CoreError> {
        let kind = kind::resolve(&self.kind)?.name();
        let invalid = |what: &str| CoreError::Metadata {
            message: format!("field '{owner}.{}' of kind {kind} needs {what}", self.name),
        };

        let type_ref = match kind {
            FieldKindName::Nested => {
                let subfields = self.fields.clone().ok_or_else(|| invalid("`fields`"))?;
                let subfields = subfields
                    .into_iter()
                    .map(|f| f.into_field_info(&self.name))
                    .collect::<Result<Vec<_>, _>>()?;
                let name = self.type_name.clone().unwrap_or_else(|| self.name.clone());
                Some(TypeRef::Object(TypeInfo::new(name, subfields)))
            }
            FieldKindName::Enum => {
                let values = self.values.clone().ok_or_else(|| invalid("`values`"))?;
                let name = self.type_name.clone().unwrap_or_else(|| self.name.clone());
                Some(TypeRef::Enum(EnumInfo { name, values }))
            }
            FieldKindName::ForeignKey => {
                let target = self.references.clone().ok_or_else(|| invalid("`references`"))?;
                Some(TypeRef::Entity(EntityRef {
                    service: target.service,
                    entity: target.entity,
                }))
            }
            _ => None,
        };

        Ok(FieldInfo {
            name: self.name,
            kind,
            label: self.label,
            required: self.required,
            read_only: self.read_only,
            type_ref,
            primary_key: false,
        })
    }
}
