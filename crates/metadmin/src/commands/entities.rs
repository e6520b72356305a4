//! Entity command handlers: list, get, add, edit, fields, open.
//!
//! Each handler drives one generic view template and renders its view
//! model. A view's error panel becomes a `CliError`; its empty state is a
//! message on stderr.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use metadmin_core::view::{DetailCard, NO_DATA_MESSAGE};
use metadmin_core::{
    AddView, AppInfo, DataAccess, DetailView, EditView, EditorWidget, EntityId,
    EntityInfo, FailureKind, FieldInfo, FormView, ListView, Record, Route, SubmitOutcome,
    TableView, View,
};

use crate::cli::{AddArgs, EditArgs, EntityTarget, GetArgs, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Context, services, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Clone, Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Required")]
    required: bool,
    #[tabled(rename = "Read-only")]
    read_only: bool,
    #[tabled(rename = "Column")]
    column: bool,
}

impl FieldRow {
    fn new(entity: &EntityInfo, field: &FieldInfo) -> Self {
        Self {
            name: field.name.clone(),
            label: field.label(),
            kind: field.kind.to_string(),
            required: field.required,
            read_only: field.read_only,
            column: entity.list_columns().contains(&field.name),
        }
    }
}

#[derive(Tabled)]
struct InputRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "Required")]
    required: bool,
    #[tabled(rename = "Value")]
    value: String,
}

/// Short description of an editor for the form table.
fn describe_widget(widget: &EditorWidget) -> String {
    match widget {
        EditorWidget::TextInput => "text".into(),
        EditorWidget::EmailInput => "email".into(),
        EditorWidget::UuidInput => "uuid".into(),
        EditorWidget::ReferencePicker { service, entity } => format!("reference to {service}/{entity}"),
        EditorWidget::IntegerInput => "integer".into(),
        EditorWidget::NumberInput => "number".into(),
        EditorWidget::Checkbox => "yes/no".into(),
        EditorWidget::DatePicker => "date (YYYY-MM-DD)".into(),
        EditorWidget::DateTimePicker => "timestamp (RFC 3339)".into(),
        EditorWidget::Select { options } => format!("one of: {}", options.join(", ")),
        EditorWidget::Group { fields } => format!(
            "object ({})",
            fields
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

// ── Metadata-only handlers ──────────────────────────────────────────

/// Describe an entity's fields.
pub fn fields(app: &AppInfo, target: &EntityTarget, ctx: &Context) -> Result<(), CliError> {
    let entity = app.require_entity(&target.service, &target.entity)?;
    let rows: Vec<FieldRow> = entity.fields().map(|f| FieldRow::new(&entity, f)).collect();
    let out = output::render_list(ctx.format, &rows, FieldRow::clone, |r| r.name.clone());
    output::print_output(&out, ctx.quiet);
    Ok(())
}

// ── View handlers ───────────────────────────────────────────────────

/// Everything an entity view needs.
pub struct Views<'a> {
    pub app: &'a AppInfo,
    pub access: &'a DataAccess,
    pub profile: &'a str,
    pub ctx: &'a Context,
}

impl Views<'_> {
    fn ensure_signed_in(&self) -> Result<(), CliError> {
        if self.access.session().is_authenticated() {
            Ok(())
        } else {
            Err(CliError::NotAuthenticated {
                profile: self.profile.to_owned(),
            })
        }
    }

    fn entity(&self, target: &EntityTarget) -> Result<Arc<EntityInfo>, CliError> {
        Ok(self.app.require_entity(&target.service, &target.entity)?)
    }

    pub async fn list(&self, args: ListArgs) -> Result<(), CliError> {
        let entity = self.entity(&args.target)?;
        self.ensure_signed_in()?;

        let view = match args.query {
            Some(ref text) => ListView::query_by_text(self.access, entity, text),
            None => ListView::new(self.access, entity, util::parse_params(&args.params)?),
        };
        self.show_list(&view).await
    }

    pub async fn get(&self, args: GetArgs) -> Result<(), CliError> {
        let entity = self.entity(&args.target)?;
        self.ensure_signed_in()?;
        self.show_detail(entity, EntityId::from(args.id)).await
    }

    pub async fn add(&self, args: AddArgs) -> Result<(), CliError> {
        let entity = self.entity(&args.target)?;
        self.ensure_signed_in()?;

        let view = AddView::new(self.access, Arc::clone(&entity));
        if !util::has_values(&args.values) {
            self.print_form(&view.form());
            return Ok(());
        }

        let values = util::collect_values(&entity, &args.values)?;
        let label = format!("Creating {}…", entity.entity_name_formatted());
        let outcome = output::with_spinner(&label, self.ctx.quiet, view.submit(values)).await;
        let state = view.request().state();
        self.finish(&entity, outcome, state.data, state.failure, "created")
    }

    pub async fn edit(&self, args: EditArgs) -> Result<(), CliError> {
        let entity = self.entity(&args.target)?;
        self.ensure_signed_in()?;

        let id = EntityId::from(args.id);
        let view = EditView::new(self.access, Arc::clone(&entity), id.clone());
        let label = format!("Loading {} {id}…", entity.entity_name_formatted());
        let loaded = output::with_spinner(&label, self.ctx.quiet, view.load()).await;

        let form = self.ready(&entity, &id, loaded, view.request().state().failure)?;
        if !util::has_values(&args.values) {
            self.print_form(&form);
            return Ok(());
        }

        // Fields not named on the command line keep their loaded values
        let mut values = form.values();
        values.extend(util::collect_values(&entity, &args.values)?);
        let label = format!("Saving {} {id}…", entity.entity_name_formatted());
        let outcome = output::with_spinner(&label, self.ctx.quiet, view.submit(values)).await;
        let state = view.save_request().state();
        self.finish(&entity, outcome, state.data, state.failure, "saved")
    }

    /// Serve a console path the way the browser front end would.
    pub async fn open(&self, path: &str) -> Result<(), CliError> {
        let route = Route::resolve(self.app, path);
        if route.requires_auth() && !matches!(route, Route::Logout) {
            self.ensure_signed_in()?;
        }

        match route {
            Route::Home => services::handle(self.app, self.ctx),
            Route::Login => {
                if !self.ctx.quiet {
                    eprintln!("Sign in with: metadmin login");
                }
                Ok(())
            }
            Route::Logout => super::session::logout(self.access, self.ctx),
            Route::List(entity) => self.show_list(&ListView::new(self.access, entity, None)).await,
            Route::Add(entity) => {
                self.print_form(&AddView::new(self.access, entity).form());
                Ok(())
            }
            Route::Detail(entity, id) => self.show_detail(entity, id).await,
            Route::Edit(entity, id) => {
                let view = EditView::new(self.access, Arc::clone(&entity), id.clone());
                let loaded = output::with_spinner("Loading…", self.ctx.quiet, view.load()).await;
                let form = self.ready(&entity, &id, loaded, view.request().state().failure)?;
                self.print_form(&form);
                Ok(())
            }
            Route::NotRecognized(message) => Err(CliError::NotRecognized { message }),
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    async fn show_list(&self, view: &ListView) -> Result<(), CliError> {
        let label = format!("Loading {}…", view.entity().entity_name_formatted());
        let rendered = output::with_spinner(&label, self.ctx.quiet, view.load()).await?;

        match rendered {
            View::Ready(table) => {
                let records = view
                    .request()
                    .state()
                    .data
                    .map(|d| d.items)
                    .unwrap_or_default();
                self.print_table(&table, &records);
                Ok(())
            }
            View::Error(message) => Err(CliError::request_failed(
                message,
                view.request().state().failure,
            )),
            View::Empty | View::Loading => {
                self.empty_state();
                Ok(())
            }
        }
    }

    async fn show_detail(&self, entity: Arc<EntityInfo>, id: EntityId) -> Result<(), CliError> {
        let view = DetailView::new(self.access, Arc::clone(&entity), id.clone());
        let label = format!("Loading {} {id}…", entity.entity_name_formatted());
        let rendered = output::with_spinner(&label, self.ctx.quiet, view.load()).await;

        let state = view.request().state();
        let card = self.ready(&entity, &id, rendered, state.failure)?;
        self.print_card(&card, state.data.as_ref());
        Ok(())
    }

    /// Unwrap a loaded view or turn its other states into errors.
    fn ready<C>(
        &self,
        entity: &EntityInfo,
        id: &EntityId,
        view: View<C>,
        failure: Option<FailureKind>,
    ) -> Result<C, CliError> {
        match view {
            View::Ready(content) => Ok(content),
            View::Error(message) => Err(CliError::request_failed(message, failure)),
            View::Empty | View::Loading => {
                self.empty_state();
                Err(CliError::NotFound {
                    entity: entity.entity_name_formatted(),
                    service: entity.service_name().to_owned(),
                    entity_name: entity.name().to_owned(),
                    id: id.to_string(),
                })
            }
        }
    }

    fn finish(
        &self,
        entity: &EntityInfo,
        outcome: SubmitOutcome,
        saved: Option<Record>,
        failure: Option<FailureKind>,
        verb: &str,
    ) -> Result<(), CliError> {
        match outcome {
            SubmitOutcome::Redirect(path) => {
                let formatted = entity.entity_name_formatted();
                let out = match saved {
                    Some(record) => output::render_single(
                        self.ctx.format,
                        &record,
                        |_| format!("✓ {formatted} {verb}: {path}"),
                        |r| r.id.to_string(),
                    ),
                    None => format!("✓ {formatted} {verb}: {path}"),
                };
                output::print_output(&out, self.ctx.quiet);
                Ok(())
            }
            SubmitOutcome::Invalid(errors) => Err(CliError::invalid_form(
                entity.service_name(),
                entity.name(),
                &errors,
            )),
            SubmitOutcome::Failed(message) => Err(CliError::request_failed(message, failure)),
        }
    }

    fn empty_state(&self) {
        if !self.ctx.quiet {
            eprintln!("{NO_DATA_MESSAGE}");
        }
    }

    fn print_table(&self, table: &TableView, records: &[Record]) {
        let headers: Vec<String> = table.columns.iter().map(|c| c.title.clone()).collect();
        let rows: Vec<Vec<String>> = table.rows.iter().map(|r| r.cells.clone()).collect();
        let ids: Vec<String> = table.rows.iter().map(|r| r.id.to_string()).collect();
        let out = output::render_dynamic(self.ctx.format, records, &table.title, &headers, &rows, &ids);
        output::print_output(&out, self.ctx.quiet);

        if self.ctx.format == OutputFormat::Table && !self.ctx.quiet {
            eprintln!("{}: metadmin open {}", table.add_label, table.add_path);
        }
    }

    fn print_card(&self, card: &DetailCard, record: Option<&Record>) {
        let pairs: Vec<(String, String)> = card
            .rows
            .iter()
            .map(|r| (r.label.clone(), r.value.clone()))
            .collect();
        let table = output::key_value_table(&card.title, &pairs);
        let out = match record {
            Some(record) => output::render_single(
                self.ctx.format,
                record,
                |_| table.clone(),
                |r| r.id.to_string(),
            ),
            None => table,
        };
        output::print_output(&out, self.ctx.quiet);
    }

    fn print_form(&self, form: &FormView) {
        let rows: Vec<InputRow> = form
            .inputs
            .iter()
            .map(|input| InputRow {
                field: input.editor.name.clone(),
                label: input.editor.label.clone(),
                input: describe_widget(&input.editor.widget),
                required: input.editor.required,
                value: util::value_text(input.value.as_ref()),
            })
            .collect();

        let out = output::render_single(
            self.ctx.format,
            form,
            |f| {
                let table = tabled::Table::new(&rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                format!("{}\n{table}\n{}: metadmin add/edit --set FIELD=VALUE", f.title, f.submit_label)
            },
            |f| {
                f.inputs
                    .iter()
                    .map(|i| i.editor.name.clone())
                    .collect::<Vec<_>>()
                    .join("\n")
            },
        );
        output::print_output(&out, self.ctx.quiet);
    }
}
