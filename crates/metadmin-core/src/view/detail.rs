// Detail template: every field of one record, labelled.

use std::sync::Arc;

use serde::Serialize;

use super::View;
use crate::entity::EntityInfo;
use crate::error::CoreError;
use crate::model::{EntityId, Record};
use crate::request::{DataAccess, Request};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub field: String,
    pub label: String,
    pub value: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailCard {
    pub title: String,
    pub edit_path: String,
    pub rows: Vec<DetailRow>,
}

/// One record of one entity.
#[derive(Debug)]
pub struct DetailView {
    entity: Arc<EntityInfo>,
    id: EntityId,
    request: Request<Record>,
}

impl DetailView {
    pub fn new(access: &DataAccess, entity: Arc<EntityInfo>, id: EntityId) -> Self {
        let request = access.get(&entity, &id);
        Self {
            entity,
            id,
            request,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn request(&self) -> &Request<Record> {
        &self.request
    }

    pub async fn load(&self) -> View<DetailCard> {
        self.request.mount().await;
        self.render()
    }

    pub fn render(&self) -> View<DetailCard> {
        let built: Result<_, CoreError> =
            View::from_state(&self.request.state(), |record| Ok(self.card(record)));
        built.unwrap_or_else(|e| View::Error(e.user_message()))
    }

    fn card(&self, record: &Record) -> DetailCard {
        let rows = self
            .entity
            .fields()
            .map(|field| {
                let widget = field.kind().display_component(field, &self.entity);
                let value = record.value(&field.name);
                DetailRow {
                    field: field.name.clone(),
                    label: field.label(),
                    value: widget.render(value.as_ref()),
                    link: widget
                        .link_path(value.as_ref())
                        .filter(|_| !field.is_primary_key()),
                }
            })
            .collect();

        DetailCard {
            title: format!(
                "{} Details: {}",
                self.entity.entity_name_formatted(),
                self.entity.human_name(record)
            ),
            edit_path: self.entity.edit_path(&record.id),
            rows,
        }
    }
}
