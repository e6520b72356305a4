// ── Request slots ──
//
// A `Request<T>` is one logical call site: a fixed method and path, a
// set of initial options, and an observable `RequestState<T>`. Fetches
// are never cancelled or deduplicated; whichever call resolves last
// writes the final state.

mod access;
mod state;

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use metadmin_api::HttpMethod;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

pub use access::{DataAccess, ListResponse, add_body, update_body};
pub use state::{
    ErrorCallback, FailureKind, FetchConfig, LogNotifier, Notifier, RequestOptions, RequestState,
};

/// Payload types a slot can hold.
pub trait Payload: DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: DeserializeOwned + Clone + Send + Sync + 'static {}

/// One request slot.
pub struct Request<T: Payload> {
    access: DataAccess,
    method: HttpMethod,
    path: String,
    options: RequestOptions,
    state: watch::Sender<RequestState<T>>,
}

impl<T: Payload> Request<T> {
    pub(crate) fn new(
        access: DataAccess,
        method: HttpMethod,
        path: String,
        options: RequestOptions,
    ) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            access,
            method,
            path,
            options,
            state,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Backend path relative to `/v1/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fire with the initial options unless the slot was created
    /// deferred. Returns the state afterwards.
    pub async fn mount(&self) -> RequestState<T> {
        if self.options.skip_initial_call {
            return self.state();
        }
        self.fetch(FetchConfig::default()).await
    }

    /// Issue the call, with `config` overriding the initial options.
    ///
    /// Never fails: every failure kind ends up as `state.error`.
    pub async fn fetch(&self, config: FetchConfig) -> RequestState<T> {
        let config = self.options.config.merged(config);
        self.state.send_replace(RequestState::in_flight());

        let session = self.access.session().current();
        let params = config.params.unwrap_or_default();
        debug!(method = ?self.method, path = %self.path, "request slot fetching");

        let result = self
            .access
            .client()
            .request::<T, Value>(
                self.method,
                &self.path,
                &params,
                config.body.as_ref(),
                session.as_deref(),
            )
            .await;

        let next = match result {
            Ok(data) => RequestState::resolved(data),
            Err(err) => {
                let message = err.user_message();
                let kind = FailureKind::of(&err);
                warn!(
                    path = %self.path,
                    error = %message,
                    ?kind,
                    "request failed"
                );
                if config
                    .notify_on_error
                    .unwrap_or_else(|| self.access.notify_on_error())
                {
                    self.access.notifier().notify_error(&message);
                }
                if let Some(cb) = &config.error_cb {
                    cb(&message);
                }
                RequestState::failed(message, kind)
            }
        };

        self.state.send_replace(next.clone());
        next
    }

    /// Current state snapshot.
    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    /// `Stream` of state snapshots, starting with the current one.
    pub fn stream(&self) -> RequestStream<T> {
        RequestStream {
            inner: WatchStream::new(self.state.subscribe()),
        }
    }
}

impl<T: Payload> std::fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// `Stream` adapter backed by the slot's `watch` channel.
pub struct RequestStream<T: Payload> {
    inner: WatchStream<RequestState<T>>,
}

impl<T: Payload> Stream for RequestStream<T> {
    type Item = RequestState<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
