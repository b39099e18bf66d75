use comfy_table::{Cell, Table};

use crate::api::AccountApi;
use crate::error::Result;
use crate::models::COLUMNS;
use crate::view::{LoadOutcome, MapperView};

pub struct LookupOptions<'a> {
    pub gst_no: &'a str,
    pub search: Option<&'a str>,
    pub page: usize,
    pub per_page: usize,
    pub json: bool,
}

pub fn run(api: &dyn AccountApi, opts: &LookupOptions) -> Result<()> {
    let out = render(api, opts)?;
    println!("{out}");
    Ok(())
}

/// Fetch, filter and paginate exactly as the screen does, then format.
pub fn render(api: &dyn AccountApi, opts: &LookupOptions) -> Result<String> {
    let mut view = MapperView::new(opts.per_page);
    let Some(ticket) = view.begin_load(opts.gst_no) else {
        return Ok("GST number is required.".to_string());
    };
    let records = api.fetch_by_gst_no(&ticket.gst_no)?;
    if view.finish_load(&ticket, Ok(records)) == LoadOutcome::Empty {
        return Ok(if opts.json {
            "[]".to_string()
        } else {
            format!("No Account Found for {}. Please add the account.", ticket.gst_no)
        });
    }

    if let Some(term) = opts.search {
        view.set_search(term);
    }
    view.set_page(opts.page);
    let rows = view.rows();

    if opts.json {
        return Ok(serde_json::to_string_pretty(&rows)?);
    }

    let mut table = Table::new();
    table.set_header(COLUMNS.iter().map(|(label, _)| *label).collect::<Vec<_>>());
    for record in &rows {
        table.add_row(record.cells().into_iter().map(Cell::new).collect::<Vec<_>>());
    }
    Ok(format!(
        "Accounts for {}\n{table}\nPage {} of {} ({} records)",
        ticket.gst_no,
        view.page(),
        view.page_count(),
        view.filtered().len(),
    ))
}
