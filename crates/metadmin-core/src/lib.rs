//! Metadata-driven CRUD engine between `metadmin-api` and front ends.
//!
//! - **Field kinds** ([`kind`]): a closed registry mapping each field kind
//!   to its label, display widget, editor widget, and validation rule.
//!
//! - **Descriptors** ([`EntityInfo`], [`FieldInfo`]): per-entity field
//!   lists, list columns, humanizer, and route paths.
//!
//! - **Registry** ([`AppInfoBuilder`] -> [`AppInfo`]): services and their
//!   entities, loaded from [`AppMetadata`], patched by [`EntityOverride`]s,
//!   then frozen read-only.
//!
//! - **Data access** ([`DataAccess`], [`Request`]): request slots with
//!   observable loading / error / data state over the backend contract.
//!
//! - **Views** ([`view`]): list, detail, add, and edit templates producing
//!   view models from a descriptor and a slot.
//!
//! - **Session** ([`SessionContext`]): bearer token in memory, mirrored to
//!   a [`SessionStore`].

pub mod config;
pub mod entity;
pub mod error;
pub mod kind;
pub mod metadata;
pub mod model;
pub mod overrides;
pub mod registry;
pub mod request;
pub mod route;
pub mod session;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::BackendConfig;
pub use entity::{EntityInfo, EntityRef, EnumInfo, FieldInfo, Humanizer, TypeInfo, TypeRef};
pub use error::CoreError;
pub use kind::{DisplayWidget, EditorField, EditorWidget, FieldKind, FieldKindName};
pub use metadata::AppMetadata;
pub use model::{EntityId, FormValues, HasId, ID_FIELD, Record};
pub use overrides::EntityOverride;
pub use registry::{AppInfo, AppInfoBuilder, MenuItem, MenuSection, ServiceInfo};
pub use request::{
    DataAccess, FailureKind, FetchConfig, ListResponse, LogNotifier, Notifier, Request, RequestOptions,
    RequestState, RequestStream,
};
pub use route::Route;
pub use session::{
    FileSessionStore, MemorySessionStore, SessionContext, SessionState, SessionStore,
    StoredSession,
};
pub use view::{
    AddView, DetailView, EditView, FieldError, FormView, ListView, SubmitOutcome, TableView, View,
};

// Re-export the transport types front ends need alongside core.
pub use metadmin_api::{AuthSession, QueryParams};
