// ── Service / app registry ──
//
// Two phases. `AppInfoBuilder` collects services and entities and lets
// overrides rewrite descriptors. `freeze()` validates everything and
// returns an `AppInfo`, which only hands out shared read-only
// descriptors. Views take `&AppInfo`, so no override can run after the
// first render.

use std::sync::Arc;

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::entity::EntityInfo;
use crate::error::CoreError;
use crate::overrides::EntityOverride;

/// One backend service and its entities, in registration order.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    name: String,
    icon: Option<String>,
    entities: IndexMap<String, Arc<EntityInfo>>,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            entities: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_formatted(&self) -> String {
        self.name.to_case(Case::Title)
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn entity_info(&self, name: &str) -> Option<&Arc<EntityInfo>> {
        self.entities.get(name)
    }

    pub fn entity_infos(&self) -> impl Iterator<Item = &Arc<EntityInfo>> {
        self.entities.values()
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Mutable registry used while loading metadata and applying overrides.
#[derive(Debug, Default)]
pub struct AppInfoBuilder {
    services: IndexMap<String, ServiceInfo>,
}

impl AppInfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Names are unique.
    pub fn add_service(&mut self, service: ServiceInfo) -> Result<(), CoreError> {
        if self.services.contains_key(service.name()) {
            return Err(CoreError::DuplicateService {
                name: service.name,
            });
        }
        self.services.insert(service.name.clone(), service);
        Ok(())
    }

    /// Register an entity under its service, creating the service if it
    /// is not registered yet. Names are unique within a service.
    pub fn add_entity(&mut self, entity: EntityInfo) -> Result<(), CoreError> {
        let service = self
            .services
            .entry(entity.service_name().to_owned())
            .or_insert_with(|| ServiceInfo::new(entity.service_name()));
        if service.entities.contains_key(entity.name()) {
            return Err(CoreError::DuplicateEntity {
                service: service.name.clone(),
                entity: entity.name().to_owned(),
            });
        }
        service
            .entities
            .insert(entity.name().to_owned(), Arc::new(entity));
        Ok(())
    }

    /// A copy of a registered descriptor, for editing.
    pub fn entity_info(&self, service: &str, entity: &str) -> Option<EntityInfo> {
        self.services
            .get(service)
            .and_then(|s| s.entities.get(entity))
            .map(|e| EntityInfo::clone(e))
    }

    /// Write an edited descriptor back over the registered one.
    pub fn update_entity_info(&mut self, entity: EntityInfo) -> Result<(), CoreError> {
        let slot = self
            .services
            .get_mut(entity.service_name())
            .and_then(|s| s.entities.get_mut(entity.name()))
            .ok_or_else(|| CoreError::UnknownEntity {
                service: entity.service_name().to_owned(),
                entity: entity.name().to_owned(),
            })?;
        *slot = Arc::new(entity);
        Ok(())
    }

    /// Apply overrides in order.
    pub fn apply_overrides(&mut self, overrides: &[EntityOverride]) -> Result<(), CoreError> {
        for o in overrides {
            o.apply(self)?;
        }
        Ok(())
    }

    /// Validate every descriptor and seal the registry.
    pub fn freeze(self) -> Result<AppInfo, CoreError> {
        for service in self.services.values() {
            for entity in service.entities.values() {
                entity.validate()?;
            }
        }
        debug!(
            services = self.services.len(),
            entities = self.services.values().map(|s| s.entities.len()).sum::<usize>(),
            "registry frozen"
        );
        Ok(AppInfo {
            services: self.services,
        })
    }
}

// ── Frozen registry ─────────────────────────────────────────────────

/// Read-only registry shared by every view.
#[derive(Debug, Clone)]
pub struct AppInfo {
    services: IndexMap<String, ServiceInfo>,
}

/// One service section of the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub service: String,
    pub title: String,
    pub icon: Option<String>,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub entity: String,
    pub title: String,
    pub path: String,
}

impl AppInfo {
    pub fn service_info(&self, name: &str) -> Option<&ServiceInfo> {
        self.services.get(name)
    }

    pub fn service_infos(&self) -> impl Iterator<Item = &ServiceInfo> {
        self.services.values()
    }

    pub fn entity_info(&self, service: &str, entity: &str) -> Option<&Arc<EntityInfo>> {
        self.services.get(service)?.entity_info(entity)
    }

    /// Resolve an entity or fail with [`CoreError::UnknownEntity`].
    pub fn require_entity(&self, service: &str, entity: &str) -> Result<Arc<EntityInfo>, CoreError> {
        self.entity_info(service, entity)
            .cloned()
            .ok_or_else(|| CoreError::UnknownEntity {
                service: service.to_owned(),
                entity: entity.to_owned(),
            })
    }

    /// Navigation: every service with a list link per entity.
    pub fn menu(&self) -> Vec<MenuSection> {
        self.services
            .values()
            .map(|service| MenuSection {
                service: service.name.clone(),
                title: service.name_formatted(),
                icon: service.icon.clone(),
                items: service
                    .entity_infos()
                    .map(|e| MenuItem {
                        entity: e.name().to_owned(),
                        title: e.entity_name_formatted(),
                        path: e.list_path(),
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::FieldInfo;
    use crate::kind::FieldKindName;

    fn builder() -> AppInfoBuilder {
        let mut b = AppInfoBuilder::new();
        b.add_service(ServiceInfo::new("users").with_icon("user")).unwrap();
        b.add_entity(EntityInfo::new(
            "users",
            "user",
            [FieldInfo::new("email", FieldKindName::Email)],
        ))
        .unwrap();
        b.add_entity(EntityInfo::new("users", "user_group", []))
            .unwrap();
        b.add_entity(EntityInfo::new("billing", "invoice", []))
            .unwrap();
        b
    }

    #[test]
    fn lookup_returns_the_same_descriptor() {
        let app = builder().freeze().unwrap();
        for service in app.service_infos() {
            for entity in service.entity_infos() {
                let found = app.entity_info(service.name(), entity.name()).unwrap();
                assert!(Arc::ptr_eq(found, entity));
            }
        }
    }

    #[test]
    fn unknown_names_are_absent() {
        let app = builder().freeze().unwrap();
        assert!(app.service_info("nope").is_none());
        assert!(app.entity_info("users", "nope").is_none());
        assert!(matches!(
            app.require_entity("users", "nope"),
            Err(CoreError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut b = builder();
        assert!(matches!(
            b.add_service(ServiceInfo::new("users")),
            Err(CoreError::DuplicateService { .. })
        ));
        assert!(matches!(
            b.add_entity(EntityInfo::new("users", "user", [])),
            Err(CoreError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn update_replaces_descriptor() {
        let mut b = builder();
        let mut user = b.entity_info("users", "user").unwrap();
        user.set_list_columns(["email"]).unwrap();
        b.update_entity_info(user).unwrap();
        let app = b.freeze().unwrap();
        assert_eq!(app.entity_info("users", "user").unwrap().list_columns(), ["email"]);
    }

    #[test]
    fn update_of_unregistered_entity_fails() {
        let mut b = builder();
        let err = b
            .update_entity_info(EntityInfo::new("users", "ghost", []))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownEntity { .. }));
    }

    #[test]
    fn menu_lists_services_in_order() {
        let menu = builder().freeze().unwrap().menu();
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].title, "Users");
        assert_eq!(menu[0].icon.as_deref(), Some("user"));
        assert_eq!(menu[0].items[1].title, "User Group");
        assert_eq!(menu[0].items[1].path, "/users/user_group/list");
        assert_eq!(menu[1].service, "billing");
    }
}
