// List template: one column per list column, one row per record.

use std::sync::Arc;

use metadmin_api::QueryParams;
use serde::Serialize;

use super::View;
use crate::entity::EntityInfo;
use crate::error::CoreError;
use crate::kind::DisplayWidget;
use crate::model::{EntityId, Record};
use crate::request::{DataAccess, FetchConfig, ListResponse, Request};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub field: String,
    pub title: String,
    pub widget: DisplayWidget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub id: EntityId,
    pub detail_path: String,
    /// Rendered cell text, one per column.
    pub cells: Vec<String>,
    /// Link target per cell, for link widgets.
    pub links: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub title: String,
    pub add_label: String,
    pub add_path: String,
    pub columns: Vec<Column>,
    pub rows: Vec<TableRow>,
}

/// List of records of one entity.
#[derive(Debug)]
pub struct ListView {
    entity: Arc<EntityInfo>,
    request: Request<ListResponse<Record>>,
}

impl ListView {
    /// List with optional filters (`{"req": {}}` by default).
    pub fn new(access: &DataAccess, entity: Arc<EntityInfo>, filters: Option<QueryParams>) -> Self {
        let request = access.list(&entity, filters);
        Self { entity, request }
    }

    /// List driven by a free-text query instead of filters.
    pub fn query_by_text(access: &DataAccess, entity: Arc<EntityInfo>, text: &str) -> Self {
        let request = access.query_by_text(&entity, text);
        Self { entity, request }
    }

    pub fn entity(&self) -> &Arc<EntityInfo> {
        &self.entity
    }

    pub fn request(&self) -> &Request<ListResponse<Record>> {
        &self.request
    }

    /// Build columns from the descriptor's list columns.
    ///
    /// A column naming an unknown field is a metadata defect and fails.
    pub fn columns(entity: &EntityInfo) -> Result<Vec<Column>, CoreError> {
        entity
            .list_columns()
            .iter()
            .map(|name| {
                let field = entity.field_info(name)?;
                Ok(Column {
                    field: name.clone(),
                    title: field.label(),
                    widget: field.kind().display_component(field, entity),
                })
            })
            .collect()
    }

    /// Fire the list call and render.
    pub async fn load(&self) -> Result<View<TableView>, CoreError> {
        self.request.mount().await;
        self.render()
    }

    /// Re-fire, optionally with new filters.
    pub async fn refresh(&self, filters: Option<QueryParams>) -> Result<View<TableView>, CoreError> {
        let config = filters.map(FetchConfig::params).unwrap_or_default();
        self.request.fetch(config).await;
        self.render()
    }

    /// Render the slot's current state.
    pub fn render(&self) -> Result<View<TableView>, CoreError> {
        View::from_state(&self.request.state(), |data| self.table(&data.items))
    }

    fn table(&self, records: &[Record]) -> Result<TableView, CoreError> {
        let columns = Self::columns(&self.entity)?;
        let rows = records
            .iter()
            .map(|record| {
                let values: Vec<_> = columns.iter().map(|c| record.value(&c.field)).collect();
                TableRow {
                    id: record.id.clone(),
                    detail_path: self.entity.detail_path(&record.id),
                    cells: columns
                        .iter()
                        .zip(&values)
                        .map(|(c, v)| c.widget.render(v.as_ref()))
                        .collect(),
                    links: columns
                        .iter()
                        .zip(&values)
                        .map(|(c, v)| c.widget.link_path(v.as_ref()))
                        .collect(),
                }
            })
            .collect();

        let formatted = self.entity.entity_name_formatted();
        Ok(TableView {
            title: format!("List {formatted}"),
            add_label: format!("Add {formatted}"),
            add_path: self.entity.add_path(),
            columns,
            rows,
        })
    }
}
