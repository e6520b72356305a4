// ── Route resolution ──
//
// Maps an application path onto the view that serves it:
//
//   /                           home
//   /login, /logout             session screens
//   /{svc}/{entity}/list        list view
//   /{svc}/{entity}/add         add form
//   /{svc}/{entity}/{id}        detail view
//   /{svc}/{entity}/{id}/edit   edit form

use std::sync::Arc;

use crate::entity::EntityInfo;
use crate::model::EntityId;
use crate::registry::AppInfo;

#[derive(Debug, Clone)]
pub enum Route {
    Home,
    Login,
    Logout,
    List(Arc<EntityInfo>),
    Add(Arc<EntityInfo>),
    Detail(Arc<EntityInfo>, EntityId),
    Edit(Arc<EntityInfo>, EntityId),
    /// Unknown path; carries the message shown in place of a view.
    NotRecognized(String),
}

impl Route {
    /// Resolve `path` against the registry. Never fails; unknown paths
    /// become [`Route::NotRecognized`].
    pub fn resolve(app: &AppInfo, path: &str) -> Self {
        let segments: Vec<&str> = path
            .split('?')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["login"] => Self::Login,
            ["logout"] => Self::Logout,
            [service, rest @ ..] => {
                let Some(service_info) = app.service_info(service) else {
                    return Self::NotRecognized(format!("Service '{service}' not recognized"));
                };
                let Some((entity, rest)) = rest.split_first() else {
                    return Self::not_found(path);
                };
                let Some(info) = service_info.entity_info(entity) else {
                    return Self::NotRecognized(format!(
                        "Entity '{entity}' not recognized in service '{service}'"
                    ));
                };
                let info = Arc::clone(info);
                match rest {
                    ["list"] => Self::List(info),
                    ["add"] => Self::Add(info),
                    [id] => Self::Detail(info, EntityId::from(*id)),
                    [id, "edit"] => Self::Edit(info, EntityId::from(*id)),
                    _ => Self::not_found(path),
                }
            }
        }
    }

    fn not_found(path: &str) -> Self {
        Self::NotRecognized(format!("Path '{path}' not recognized"))
    }

    /// The entity this route operates on, if any.
    pub fn entity(&self) -> Option<&Arc<EntityInfo>> {
        match self {
            Self::List(e) | Self::Add(e) | Self::Detail(e, _) | Self::Edit(e, _) => Some(e),
            _ => None,
        }
    }

    /// Whether the route needs an authenticated session.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login | Self::NotRecognized(_))
    }
}
