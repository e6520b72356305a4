// ── Request state ──

use std::fmt;
use std::sync::Arc;

use metadmin_api::QueryParams;
use serde_json::Value;
use tracing::error;

/// Coarse class of a failed call, kept next to the message so callers
/// can tell an expired session apart from a missing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    AuthExpired,
    NotFound,
    Transient,
    Other,
}

impl FailureKind {
    pub(crate) fn of(err: &metadmin_api::Error) -> Self {
        if err.is_auth_expired() {
            Self::AuthExpired
        } else if err.is_not_found() {
            Self::NotFound
        } else if err.is_transient() {
            Self::Transient
        } else {
            Self::Other
        }
    }
}

/// Observable state of one request slot.
///
/// `data` and `error` are never both set. A slot that has never fired,
/// or whose last call returned no payload, has neither. `failure` is set
/// exactly when `error` is.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
    pub data: Option<T>,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            failure: None,
            data: None,
        }
    }
}

impl<T> RequestState<T> {
    pub(crate) fn in_flight() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub(crate) fn resolved(data: Option<T>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub(crate) fn failed(message: String, kind: FailureKind) -> Self {
        Self {
            error: Some(message),
            failure: Some(kind),
            ..Self::default()
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

/// Caller hook invoked with the failure message.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Per-fetch options. Fields set on a fetch override the slot's
/// initial options; unset fields fall through.
#[derive(Clone, Default)]
pub struct FetchConfig {
    pub params: Option<QueryParams>,
    pub body: Option<Value>,
    pub notify_on_error: Option<bool>,
    pub error_cb: Option<ErrorCallback>,
}

impl FetchConfig {
    pub fn params(params: QueryParams) -> Self {
        Self {
            params: Some(params),
            ..Self::default()
        }
    }

    pub fn body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_notify_on_error(mut self, notify: bool) -> Self {
        self.notify_on_error = Some(notify);
        self
    }

    #[must_use]
    pub fn with_error_cb(mut self, cb: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.error_cb = Some(Arc::new(cb));
        self
    }

    /// `self` overlaid with every field `over` sets.
    pub(crate) fn merged(&self, over: FetchConfig) -> FetchConfig {
        FetchConfig {
            params: over.params.or_else(|| self.params.clone()),
            body: over.body.or_else(|| self.body.clone()),
            notify_on_error: over.notify_on_error.or(self.notify_on_error),
            error_cb: over.error_cb.or_else(|| self.error_cb.clone()),
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("params", &self.params)
            .field("body", &self.body)
            .field("notify_on_error", &self.notify_on_error)
            .field("error_cb", &self.error_cb.is_some())
            .finish()
    }
}

/// Options fixed when a slot is created.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Do not fire on mount; wait for an explicit fetch.
    pub skip_initial_call: bool,
    pub config: FetchConfig,
}

impl RequestOptions {
    pub fn deferred(config: FetchConfig) -> Self {
        Self {
            skip_initial_call: true,
            config,
        }
    }

    pub fn immediate(config: FetchConfig) -> Self {
        Self {
            skip_initial_call: false,
            config,
        }
    }
}

// ── Notifications ───────────────────────────────────────────────────

/// Transient user notification for failed requests.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_error(&self, message: &str) {
        error!(message, "request failed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fetch_config_overrides_only_set_fields() {
        let mut params = QueryParams::new();
        params.insert("req".into(), json!({}));
        let initial = FetchConfig::params(params).with_notify_on_error(true);

        let merged = initial.merged(FetchConfig::body(json!({"a": 1})));
        assert_eq!(merged.params.unwrap()["req"], json!({}));
        assert_eq!(merged.body, Some(json!({"a": 1})));
        assert_eq!(merged.notify_on_error, Some(true));

        let merged = initial.merged(FetchConfig::default().with_notify_on_error(false));
        assert_eq!(merged.notify_on_error, Some(false));
    }

    #[test]
    fn failures_are_classified() {
        let expired = metadmin_api::Error::HttpStatus {
            status: 401,
            message: Some("token expired".into()),
        };
        assert_eq!(FailureKind::of(&expired), FailureKind::AuthExpired);

        let missing = metadmin_api::Error::HttpStatus {
            status: 404,
            message: Some("no such user".into()),
        };
        assert_eq!(FailureKind::of(&missing), FailureKind::NotFound);

        let gateway = metadmin_api::Error::HttpStatus {
            status: 503,
            message: Some("unavailable".into()),
        };
        assert_eq!(FailureKind::of(&gateway), FailureKind::Transient);

        let state = RequestState::<()>::failed("x".into(), FailureKind::Other);
        assert_eq!(state.failure, Some(FailureKind::Other));
    }

    #[test]
    fn default_state_is_idle() {
        let state = RequestState::<()>::default();
        assert!(state.is_settled());
        assert!(state.error.is_none() && state.data.is_none());
    }
}
