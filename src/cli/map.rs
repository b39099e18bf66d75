use crate::api::AccountApi;
use crate::error::{AcmapError, Result};
use crate::models::AccountCode;
use crate::settings::RoutePaths;
use crate::view::{LoadOutcome, MapperView, Route};

/// Look up `gst_no`, map the record with `code`, and return the route to follow.
pub fn map_code(api: &dyn AccountApi, gst_no: &str, code: &str) -> Result<Route> {
    let mut view = MapperView::default();
    let ticket = view
        .begin_load(gst_no)
        .ok_or_else(|| AcmapError::Other("GST number is required".into()))?;
    let records = api.fetch_by_gst_no(&ticket.gst_no)?;
    if view.finish_load(&ticket, Ok(records)) == LoadOutcome::Empty {
        tracing::warn!(gst_no, "no account found");
        return Ok(view.decline_create());
    }

    let wanted = AccountCode::new(code.trim());
    let record = view
        .filtered()
        .into_iter()
        .find(|r| r.code() == wanted)
        .cloned()
        .ok_or_else(|| AcmapError::RecordNotFound(wanted.to_string()))?;

    api.insert_account_master(&record)?;
    Ok(Route::UserUtility)
}

pub fn run(api: &dyn AccountApi, paths: &RoutePaths, gst_no: &str, code: &str) -> Result<()> {
    let route = map_code(api, gst_no, code)?;
    match route {
        Route::UserUtility => println!("Mapped account {code}."),
        _ => eprintln!("No Account Found for {gst_no}. Please add the account."),
    }
    println!("{}", route.path(paths));
    Ok(())
}
