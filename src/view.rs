//! State of the account mapping screen, independent of any terminal.
//!
//! The view owns the fetched records and the user's controls. Everything
//! shown on screen (filtered list, page count, current rows) is derived on
//! demand from that state.

use std::collections::BTreeSet;

use crate::error::AcmapError;
use crate::models::AccountRecord;
use crate::settings::{RoutePaths, DEFAULT_PER_PAGE};

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZES: &[usize] = &[5, 10, 15, 25, 50, 100];

/// Navigation targets the screen can hand back to its launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    AccountMasterCreate,
    Fallback,
    UserUtility,
}

impl Route {
    pub fn path(self, paths: &RoutePaths) -> &str {
        match self {
            Route::Dashboard => &paths.dashboard,
            Route::AccountMasterCreate => &paths.account_master,
            Route::Fallback => &paths.fallback,
            Route::UserUtility => &paths.user_utility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Populated,
    Empty,
    Failed(String),
}

/// Issued by [`MapperView::begin_load`]; hand it back with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub seq: u64,
    pub gst_no: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Populated(usize),
    Empty,
    Failed,
    /// A newer load was started; the response was dropped.
    Stale,
}

/// Position of a record in the list returned by the latest load.
/// Account codes are not unique (or may be missing), so exclusion uses this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RowId(usize);

/// Entries whose record contains `term` in any field, ignoring case. Order is kept.
fn filter_records<'a, I>(entries: I, term: &str) -> Vec<(RowId, &'a AccountRecord)>
where
    I: IntoIterator<Item = (RowId, &'a AccountRecord)>,
{
    let needle = term.to_lowercase();
    entries
        .into_iter()
        .filter(|(_, r)| needle.is_empty() || r.matches_lowercase(&needle))
        .collect()
}

/// Ceiling division. An empty list has zero pages; page size 0 counts as 1.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// The 1-based `page` of `items`. Pages past the end are empty.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(size);
    if page == 0 || start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalChoice {
    #[default]
    Yes,
    No,
}

pub struct MapperView {
    records: Vec<AccountRecord>,
    mapped: BTreeSet<RowId>,
    search: String,
    per_page: usize,
    page: usize,
    selected: usize,
    modal: Option<ModalChoice>,
    phase: Phase,
    gst_no: String,
    load_seq: u64,
}

impl Default for MapperView {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl MapperView {
    pub fn new(per_page: usize) -> Self {
        Self {
            records: Vec::new(),
            mapped: BTreeSet::new(),
            search: String::new(),
            per_page: per_page.max(1),
            page: 1,
            selected: 0,
            modal: None,
            phase: Phase::Idle,
            gst_no: String::new(),
            load_seq: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn gst_no(&self) -> &str {
        &self.gst_no
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn modal(&self) -> Option<ModalChoice> {
        self.modal
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal.is_some()
    }

    // -- loading ------------------------------------------------------------

    /// Start a lookup. Returns `None` for a blank tax id, which issues no request.
    pub fn begin_load(&mut self, gst_no: &str) -> Option<LoadTicket> {
        let gst_no = gst_no.trim();
        if gst_no.is_empty() {
            return None;
        }
        self.load_seq += 1;
        self.gst_no = gst_no.to_string();
        self.phase = Phase::Loading;
        self.modal = None;
        Some(LoadTicket {
            seq: self.load_seq,
            gst_no: self.gst_no.clone(),
        })
    }

    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Vec<AccountRecord>, AcmapError>,
    ) -> LoadOutcome {
        if ticket.seq != self.load_seq {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.load_seq,
                gst_no = ticket.gst_no.as_str(),
                "dropping stale lookup response"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(records) if records.is_empty() => {
                self.records.clear();
                self.mapped.clear();
                self.reset_page();
                self.phase = Phase::Empty;
                self.modal = Some(ModalChoice::Yes);
                LoadOutcome::Empty
            }
            Ok(records) => {
                let count = records.len();
                self.records = records;
                self.mapped.clear();
                self.reset_page();
                self.phase = Phase::Populated;
                LoadOutcome::Populated(count)
            }
            Err(e) => {
                tracing::error!(
                    gst_no = ticket.gst_no.as_str(),
                    "error fetching accounts: {e}"
                );
                self.phase = Phase::Failed(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    // -- derived ------------------------------------------------------------

    fn entries(&self) -> Vec<(RowId, &AccountRecord)> {
        let visible = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (RowId(i), r))
            .filter(|(id, _)| !self.mapped.contains(id));
        filter_records(visible, &self.search)
    }

    fn page_entries(&self) -> Vec<(RowId, &AccountRecord)> {
        let entries = self.entries();
        page_slice(&entries, self.page, self.per_page).to_vec()
    }

    /// Unmapped records matching the search term.
    pub fn filtered(&self) -> Vec<&AccountRecord> {
        self.entries().into_iter().map(|(_, r)| r).collect()
    }

    pub fn page_count(&self) -> usize {
        page_count(self.entries().len(), self.per_page)
    }

    /// Rows on the current page.
    pub fn rows(&self) -> Vec<&AccountRecord> {
        self.page_entries().into_iter().map(|(_, r)| r).collect()
    }

    pub fn selected_entry(&self) -> Option<(RowId, &AccountRecord)> {
        self.page_entries().get(self.selected).copied()
    }

    pub fn selected_record(&self) -> Option<&AccountRecord> {
        self.selected_entry().map(|(_, r)| r)
    }

    // -- controls -----------------------------------------------------------

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.reset_page();
    }

    pub fn push_search(&mut self, c: char) {
        let mut term = std::mem::take(&mut self.search);
        term.push(c);
        self.set_search(&term);
    }

    pub fn pop_search(&mut self) {
        let mut term = std::mem::take(&mut self.search);
        term.pop();
        self.set_search(&term);
    }

    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.reset_page();
    }

    /// Step through [`PAGE_SIZES`]; `forward` picks the next larger size.
    pub fn cycle_per_page(&mut self, forward: bool) {
        let next = if forward {
            PAGE_SIZES.iter().copied().find(|&s| s > self.per_page)
        } else {
            PAGE_SIZES.iter().rev().copied().find(|&s| s < self.per_page)
        };
        if let Some(size) = next {
            self.set_per_page(size);
        }
    }

    /// Jump to a page, clamped to the valid range.
    pub fn set_page(&mut self, page: usize) {
        let last = self.page_count().max(1);
        self.page = page.clamp(1, last);
        self.clamp_selection();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    pub fn last_page(&mut self) {
        self.set_page(self.page_count());
    }

    pub fn select_next(&mut self) {
        let rows = self.rows().len();
        if rows > 0 {
            self.selected = (self.selected + 1).min(rows - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Exclude a record from every derived view after a successful insert.
    pub fn mark_mapped(&mut self, id: RowId) {
        self.mapped.insert(id);
        self.reset_page();
    }

    // -- modal --------------------------------------------------------------

    pub fn toggle_modal_choice(&mut self) {
        self.modal = match self.modal {
            Some(ModalChoice::Yes) => Some(ModalChoice::No),
            Some(ModalChoice::No) => Some(ModalChoice::Yes),
            None => None,
        };
    }

    pub fn confirm_create(&mut self) -> Route {
        self.modal = None;
        Route::AccountMasterCreate
    }

    pub fn decline_create(&mut self) -> Route {
        self.modal = None;
        Route::Fallback
    }

    /// Resolve the focused modal button.
    pub fn choose_modal(&mut self) -> Option<Route> {
        match self.modal? {
            ModalChoice::Yes => Some(self.confirm_create()),
            ModalChoice::No => Some(self.decline_create()),
        }
    }

    fn reset_page(&mut self) {
        self.page = 1;
        self.selected = 0;
    }

    fn clamp_selection(&mut self) {
        let rows = self.rows().len();
        self.selected = self.selected.min(rows.saturating_sub(1));
    }
}
