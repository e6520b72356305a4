// ── Generic view templates ──
//
// Each template is built from an entity descriptor and a `DataAccess`,
// drives its request slots, and produces a view model: loading, an
// error panel, an empty state, or content. Rendering the model is the
// front end's job.

mod detail;
mod form;
mod list;

use serde::Serialize;

use crate::request::RequestState;

pub use detail::{DetailCard, DetailRow, DetailView};
pub use form::{AddView, EditView, FieldError, FormInput, FormView, SubmitOutcome, validate_form};
pub use list::{Column, ListView, TableRow, TableView};

/// Message shown when a call succeeds without a payload.
pub const NO_DATA_MESSAGE: &str = "No entity data returned";

/// Three-state lifecycle of a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "content", rename_all = "snake_case")]
pub enum View<C> {
    Loading,
    Error(String),
    Empty,
    Ready(C),
}

impl<C> View<C> {
    /// Map a slot state onto the lifecycle, building content from data.
    pub fn from_state<T, E>(
        state: &RequestState<T>,
        build: impl FnOnce(&T) -> Result<C, E>,
    ) -> Result<Self, E> {
        if state.loading {
            return Ok(Self::Loading);
        }
        if let Some(message) = &state.error {
            return Ok(Self::Error(message.clone()));
        }
        match &state.data {
            Some(data) => build(data).map(Self::Ready),
            None => Ok(Self::Empty),
        }
    }

    pub fn content(&self) -> Option<&C> {
        match self {
            Self::Ready(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_content(self) -> Option<C> {
        match self {
            Self::Ready(c) => Some(c),
            _ => None,
        }
    }
}
