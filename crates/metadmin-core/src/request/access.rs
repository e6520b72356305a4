// ── Generic data access ──
//
// Turns an entity descriptor plus an operation kind into a request slot.
// Paths, verbs, and parameter shapes follow the backend contract:
//
//   add            POST {svc}/{entity}                 body: record
//   get            GET  {svc}/{entity}?req={"id":..}
//   list           GET  {svc}/{entity}/list?{filters}
//   query_by_text  GET  {svc}/{entity}/query_by_text?query_text=".."
//   update         PUT  {svc}/{entity}                 body: {"object": record}

use std::sync::Arc;

use metadmin_api::{ApiClient, HttpMethod, QueryParams};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::state::{FetchConfig, LogNotifier, Notifier, RequestOptions};
use super::{Payload, Request};
use crate::config::BackendConfig;
use crate::entity::EntityInfo;
use crate::error::CoreError;
use crate::model::EntityId;
use crate::session::SessionContext;

/// Payload of list and free-text query responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<E> {
    #[serde(default = "Vec::new")]
    pub items: Vec<E>,
}

struct AccessInner {
    client: ApiClient,
    session: SessionContext,
    notifier: Arc<dyn Notifier>,
    notify_on_error: bool,
}

/// Factory for request slots. Cheap to clone; every slot shares the
/// client, the session, and the notifier.
#[derive(Clone)]
pub struct DataAccess {
    inner: Arc<AccessInner>,
}

impl std::fmt::Debug for DataAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccess")
            .field("base_url", &self.inner.client.base_url().as_str())
            .field("notify_on_error", &self.inner.notify_on_error)
            .finish_non_exhaustive()
    }
}

impl DataAccess {
    pub fn new(client: ApiClient, session: SessionContext) -> Self {
        Self {
            inner: Arc::new(AccessInner {
                client,
                session,
                notifier: Arc::new(LogNotifier),
                notify_on_error: true,
            }),
        }
    }

    /// Build from runtime config.
    pub fn from_config(
        config: &BackendConfig,
        session: SessionContext,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            inner: Arc::new(AccessInner {
                client: config.client()?,
                session,
                notifier,
                notify_on_error: config.notify_on_error,
            }),
        })
    }

    /// Same client and session, different notifier.
    #[must_use]
    pub fn with_notifier(self, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(AccessInner {
                client: self.inner.client.clone(),
                session: self.inner.session.clone(),
                notifier,
                notify_on_error: self.inner.notify_on_error,
            }),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    pub(crate) fn notify_on_error(&self) -> bool {
        self.inner.notify_on_error
    }

    /// A slot for an arbitrary backend path.
    pub fn request<T: Payload>(
        &self,
        method: HttpMethod,
        path: impl Into<String>,
        options: RequestOptions,
    ) -> Request<T> {
        Request::new(self.clone(), method, path.into(), options)
    }

    // ── Entity operations ────────────────────────────────────────────

    /// Create. Deferred: fire with [`add_body`] as the fetch body.
    pub fn add<E: Payload>(&self, entity: &EntityInfo) -> Request<E> {
        self.request(
            HttpMethod::Post,
            entity.path(),
            RequestOptions::deferred(FetchConfig::default().with_notify_on_error(true)),
        )
    }

    /// Fetch one record by id. Fires on mount.
    pub fn get<E: Payload>(&self, entity: &EntityInfo, id: &EntityId) -> Request<E> {
        self.request(
            HttpMethod::Get,
            entity.path(),
            RequestOptions::immediate(
                FetchConfig::params(get_params(id)).with_notify_on_error(true),
            ),
        )
    }

    /// List with `filters` as query parameters (`{"req": {}}` when
    /// none). Fires on mount.
    pub fn list<E: Payload>(
        &self,
        entity: &EntityInfo,
        filters: Option<QueryParams>,
    ) -> Request<ListResponse<E>> {
        let params = filters.unwrap_or_else(default_list_params);
        self.request(
            HttpMethod::Get,
            format!("{}/list", entity.path()),
            RequestOptions::immediate(FetchConfig::params(params).with_notify_on_error(true)),
        )
    }

    /// Free-text search. Fires on mount.
    pub fn query_by_text<E: Payload>(
        &self,
        entity: &EntityInfo,
        text: &str,
    ) -> Request<ListResponse<E>> {
        let mut params = QueryParams::new();
        params.insert("query_text".into(), Value::String(text.to_owned()));
        self.request(
            HttpMethod::Get,
            format!("{}/query_by_text", entity.path()),
            RequestOptions::immediate(FetchConfig::params(params).with_notify_on_error(true)),
        )
    }

    /// Update. Deferred: fire with [`update_body`] as the fetch body.
    pub fn update<E: Payload>(&self, entity: &EntityInfo) -> Request<E> {
        self.request(
            HttpMethod::Put,
            entity.path(),
            RequestOptions::deferred(FetchConfig::default().with_notify_on_error(true)),
        )
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Authenticate and make the new session current.
    ///
    /// A rejected login keeps the backend status, so a 401 reaches the
    /// caller as `CoreError::Request { status: Some(401), .. }`.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), CoreError> {
        let session = self.client().authenticate(email, password).await?;
        self.session().login(session)
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        self.session().logout()
    }
}

// ── Parameter and body shapes ───────────────────────────────────────

/// `{"req": {"id": ..}}`
pub(crate) fn get_params(id: &EntityId) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("req".into(), json!({ "id": id }));
    params
}

/// `{"req": {}}`
pub(crate) fn default_list_params() -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("req".into(), json!({}));
    params
}

/// Body of an add call: the record itself.
pub fn add_body(record: impl Serialize) -> Result<Value, CoreError> {
    serde_json::to_value(record).map_err(|e| CoreError::Validation {
        message: format!("cannot encode record: {e}"),
    })
}

/// Body of an update call: `{"object": record}`.
pub fn update_body(record: impl Serialize) -> Result<Value, CoreError> {
    Ok(json!({ "object": add_body(record)? }))
}
