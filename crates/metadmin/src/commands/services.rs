//! Navigation menu: services and their entities.

use tabled::Tabled;

use metadmin_core::{AppInfo, MenuSection};

use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct MenuRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Path")]
    path: String,
}

fn menu_rows(section: &MenuSection) -> Vec<MenuRow> {
    section
        .items
        .iter()
        .map(|item| MenuRow {
            service: section.title.clone(),
            entity: item.title.clone(),
            path: item.path.clone(),
        })
        .collect()
}

pub fn handle(app: &AppInfo, ctx: &Context) -> Result<(), CliError> {
    let menu = app.menu();
    let out = output::render_single(
        ctx.format,
        &menu,
        |sections| {
            let rows: Vec<MenuRow> = sections.iter().flat_map(menu_rows).collect();
            tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string()
        },
        |sections| {
            sections
                .iter()
                .flat_map(|s| s.items.iter().map(|i| i.path.clone()))
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, ctx.quiet);
    Ok(())
}
