use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::api::AccountApi;
use crate::error::Result;
use crate::models::{AccountRecord, COLUMNS};
use crate::settings::Settings;
use crate::tui::{
    self, BORDER_STYLE, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE, STATUS_STYLE,
};
use crate::view::{LoadOutcome, LoadTicket, MapperView, ModalChoice, Phase, Route};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

type LoadResult = (LoadTicket, Result<Vec<AccountRecord>>);

pub enum MapperAction {
    Continue,
    Quit,
    /// Caller should show a progress line, redraw, then call `map_selected`.
    Map,
    Navigate(Route),
}

enum Mode {
    Table,
    Search,
    GstInput(String),
}

pub struct AccountMapper {
    view: MapperView,
    api: Arc<dyn AccountApi>,
    mode: Mode,
    status_message: Option<String>,
    /// Remaining keypresses before the status message is cleared.
    status_ttl: u8,
    load_tx: Sender<LoadResult>,
    load_rx: Receiver<LoadResult>,
    table_state: TableState,
}

impl AccountMapper {
    pub fn new(api: Arc<dyn AccountApi>, per_page: usize) -> Self {
        let (load_tx, load_rx) = mpsc::channel();
        Self {
            view: MapperView::new(per_page),
            api,
            mode: Mode::Table,
            status_message: None,
            status_ttl: 0,
            load_tx,
            load_rx,
            table_state: TableState::default(),
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> &MapperView {
        &self.view
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
        self.status_ttl = 3;
    }

    /// Kick off a lookup on a worker thread. A blank GST number prompts for one.
    pub fn start_load(&mut self, gst_no: &str) {
        let Some(ticket) = self.view.begin_load(gst_no) else {
            self.mode = Mode::GstInput(String::new());
            return;
        };
        let api = Arc::clone(&self.api);
        let tx = self.load_tx.clone();
        std::thread::spawn(move || {
            let result = api.fetch_by_gst_no(&ticket.gst_no);
            // The screen may already be gone.
            let _ = tx.send((ticket, result));
        });
    }

    /// Apply any finished lookups. Returns true when the view changed.
    pub fn poll_loads(&mut self) -> bool {
        let mut changed = false;
        while let Ok((ticket, result)) = self.load_rx.try_recv() {
            match self.view.finish_load(&ticket, result) {
                LoadOutcome::Stale => {}
                LoadOutcome::Populated(n) => {
                    self.set_status(format!("Loaded {n} accounts"));
                    changed = true;
                }
                LoadOutcome::Empty | LoadOutcome::Failed => changed = true,
            }
        }
        changed
    }

    /// Map the highlighted record. Returns the route to follow on success.
    pub fn map_selected(&mut self) -> Option<Route> {
        if let Some(reason) = self.map_blocked() {
            self.set_status(reason.into());
            return None;
        }
        let (id, record) = self.view.selected_entry().map(|(id, r)| (id, r.clone()))?;
        let code = record.code();
        match self.api.insert_account_master(&record) {
            Ok(()) => {
                tracing::info!(
                    code = code.as_str(),
                    gst_no = self.view.gst_no(),
                    "account mapped"
                );
                self.view.mark_mapped(id);
                Some(Route::UserUtility)
            }
            Err(e) => {
                tracing::error!(code = code.as_str(), "error mapping account: {e}");
                self.set_status(format!("Map failed for {code}: {e}"));
                None
            }
        }
    }

    /// Why the map action is unavailable right now, if it is.
    fn map_blocked(&self) -> Option<&'static str> {
        match self.view.phase() {
            Phase::Populated if self.view.selected_record().is_some() => None,
            Phase::Populated => Some("No account selected"),
            Phase::Loading => Some("Accounts are still loading"),
            _ => Some("No accounts to map"),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> MapperAction {
        if self.status_ttl > 0 {
            self.status_ttl -= 1;
            if self.status_ttl == 0 {
                self.status_message = None;
            }
        }

        if self.view.is_modal_open() {
            return self.handle_modal_key(code);
        }

        match &mut self.mode {
            Mode::Table => self.handle_table_key(code),
            Mode::Search => {
                match code {
                    KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Table,
                    KeyCode::Backspace => self.view.pop_search(),
                    KeyCode::Char(c) => self.view.push_search(c),
                    _ => {}
                }
                MapperAction::Continue
            }
            Mode::GstInput(input) => {
                match code {
                    KeyCode::Esc => self.mode = Mode::Table,
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Char(c) => input.push(c.to_ascii_uppercase()),
                    KeyCode::Enter => {
                        let gst_no = std::mem::take(input);
                        if gst_no.trim().is_empty() {
                            self.set_status("GST number is required".into());
                        } else {
                            self.mode = Mode::Table;
                            self.start_load(&gst_no);
                        }
                    }
                    _ => {}
                }
                MapperAction::Continue
            }
        }
    }

    fn handle_table_key(&mut self, code: KeyCode) -> MapperAction {
        match code {
            KeyCode::Up => self.view.select_prev(),
            KeyCode::Down => self.view.select_next(),
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => self.view.next_page(),
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => self.view.prev_page(),
            KeyCode::Home => self.view.set_page(1),
            KeyCode::End => self.view.last_page(),
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('+') => self.view.cycle_per_page(true),
            KeyCode::Char('-') => self.view.cycle_per_page(false),
            KeyCode::Char('g') => self.mode = Mode::GstInput(String::new()),
            KeyCode::Char('r') => {
                let gst_no = self.view.gst_no().to_string();
                self.start_load(&gst_no);
            }
            KeyCode::Char('m') | KeyCode::Enter => match self.map_blocked() {
                None => return MapperAction::Map,
                Some(reason) => self.set_status(reason.into()),
            },
            KeyCode::Char('b') | KeyCode::Esc => return MapperAction::Navigate(Route::Dashboard),
            KeyCode::Char('q') => return MapperAction::Quit,
            _ => {}
        }
        MapperAction::Continue
    }

    fn handle_modal_key(&mut self, code: KeyCode) -> MapperAction {
        let route = match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(self.view.confirm_create()),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                Some(self.view.decline_create())
            }
            KeyCode::Enter => self.view.choose_modal(),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.view.toggle_modal_choice();
                None
            }
            _ => None,
        };
        match route {
            Some(route) => MapperAction::Navigate(route),
            None => MapperAction::Continue,
        }
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let [header_area, sep, controls_area, content_area, pager_area, status_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        tui::render_header(frame, "eBuySugar Account Master", header_area, sep);

        let gst_line = match &self.mode {
            Mode::GstInput(input) => tui::input_line(" GST No", input, true),
            _ => tui::input_line(" GST No", self.view.gst_no(), false),
        };
        let search_active = matches!(self.mode, Mode::Search);
        let mut controls = tui::input_line("   Search", self.view.search(), search_active);
        controls.spans.insert(
            0,
            Span::styled(
                format!(" Per page: < {} >", self.view.per_page()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        );
        frame.render_widget(Paragraph::new(vec![gst_line, controls]), controls_area);

        match self.view.phase().clone() {
            Phase::Idle => {
                frame.render_widget(
                    Paragraph::new("\n   Press 'g' to enter a GST number.").style(FOOTER_STYLE),
                    content_area,
                );
            }
            Phase::Loading => {
                frame.render_widget(
                    Paragraph::new(format!("\n   Loading accounts for {}...", self.view.gst_no())),
                    content_area,
                );
            }
            Phase::Failed(msg) => {
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::from(""),
                        Line::from(Span::styled(
                            format!("   Could not load accounts: {msg}"),
                            ERROR_STYLE,
                        )),
                        Line::from(Span::styled("   Press 'r' to retry.", FOOTER_STYLE)),
                    ]),
                    content_area,
                );
            }
            Phase::Empty | Phase::Populated => self.draw_table(frame, content_area),
        }

        let pages = self.view.page_count();
        let pager = if pages == 0 {
            " No pages".to_string()
        } else {
            format!(
                " \u{2039} Prev  Page {} of {}  Next \u{203a}   ({} of {} accounts)",
                self.view.page(),
                pages,
                self.view.filtered().len(),
                self.view.record_count(),
            )
        };
        frame.render_widget(Paragraph::new(pager).style(FOOTER_STYLE), pager_area);

        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(STATUS_STYLE),
                status_area,
            );
        }

        let hints = match self.mode {
            Mode::Table => {
                " \u{2191}/\u{2193}=select  \u{2190}/\u{2192}=page  /=search  +/-=per page  m=map  g=GST  r=reload  b=back  q=quit"
            }
            Mode::Search => " Type to filter  Enter/Esc=done",
            Mode::GstInput(_) => " Enter=look up  Esc=cancel",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);

        if let Some(choice) = self.view.modal() {
            draw_modal(frame, choice);
        }
    }

    fn draw_table(&mut self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let rows: Vec<Row> = self
            .view
            .rows()
            .iter()
            .map(|record| {
                let mut cells: Vec<Cell> = record.cells().into_iter().map(Cell::from).collect();
                cells.push(Cell::from(Span::styled("Map", STATUS_STYLE)));
                Row::new(cells)
            })
            .collect();

        if rows.is_empty() {
            let msg = if self.view.record_count() == 0 {
                "   No accounts."
            } else {
                "   No matching accounts."
            };
            frame.render_widget(Paragraph::new(format!("\n{msg}")).style(FOOTER_STYLE), area);
            return;
        }

        let widths = [
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Fill(2),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Fill(2),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(11),
            Constraint::Length(15),
            Constraint::Length(13),
            Constraint::Length(11),
            Constraint::Length(7),
            Constraint::Length(6),
        ];
        let header: Vec<&str> = COLUMNS
            .iter()
            .map(|(label, _)| *label)
            .chain(std::iter::once("Action"))
            .collect();

        self.table_state.select(Some(self.view.selected()));
        let table = Table::new(rows, widths)
            .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }
}

fn draw_modal(frame: &mut Frame, choice: ModalChoice) {
    let rect = tui::centered(frame.area(), 46, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(BORDER_STYLE)
        .title(
            Line::from(Span::styled(" No Account Found ", HEADER_STYLE))
                .alignment(Alignment::Center),
        );

    let lines = vec![
        Line::from(""),
        Line::from("No Account Found... Please Add Account"),
        Line::from(""),
        Line::from(vec![
            tui::button("Yes", choice == ModalChoice::Yes),
            Span::raw("   "),
            tui::button("No", choice == ModalChoice::No),
        ]),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(block),
        rect,
    );
}

/// Run the mapping screen until the user quits or navigates.
/// Returns the route to follow, or `None` on quit.
pub fn run(
    api: Arc<dyn AccountApi>,
    per_page: usize,
    gst_no: Option<&str>,
) -> Result<Option<Route>> {
    let mut mapper = AccountMapper::new(api, per_page);
    mapper.start_load(gst_no.unwrap_or(""));

    tui::install_panic_hook();
    let mut terminal = ratatui::init();

    let result: Result<Option<Route>> = loop {
        mapper.poll_loads();
        if let Err(e) = terminal.draw(|frame| mapper.draw(frame)) {
            break Err(e.into());
        }

        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => break Err(e.into()),
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(None);
                }
                match mapper.handle_key(key.code) {
                    MapperAction::Continue => {}
                    MapperAction::Quit => break Ok(None),
                    MapperAction::Navigate(route) => break Ok(Some(route)),
                    MapperAction::Map => {
                        mapper.set_status("Mapping...".into());
                        if let Err(e) = terminal.draw(|frame| mapper.draw(frame)) {
                            break Err(e.into());
                        }
                        if let Some(route) = mapper.map_selected() {
                            break Ok(Some(route));
                        }
                    }
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

/// Open the screen and print the chosen route's path for the launcher.
pub fn launch(settings: &Settings, api: Arc<dyn AccountApi>, gst_no: Option<&str>) -> Result<()> {
    if let Some(route) = run(api, settings.per_page, gst_no)? {
        let path = route.path(&settings.routes);
        tracing::info!(?route, path, "navigating");
        println!("{path}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::error::AcmapError;
    use crate::models::fixtures::record;
    use crate::models::AccountCode;

    #[derive(Default)]
    struct FakeApi {
        records: Vec<AccountRecord>,
        fail_fetch: bool,
        insert_status: Option<u16>,
        inserted: Mutex<Vec<AccountCode>>,
    }

    impl AccountApi for FakeApi {
        fn fetch_by_gst_no(&self, _gst_no: &str) -> Result<Vec<AccountRecord>> {
            if self.fail_fetch {
                return Err(AcmapError::MalformedResponse("accountMasterData is missing".into()));
            }
            Ok(self.records.clone())
        }

        fn insert_account_master(&self, record: &AccountRecord) -> Result<()> {
            match self.insert_status {
                Some(201) | None => {
                    self.inserted.lock().unwrap().push(record.code());
                    Ok(())
                }
                Some(other) => Err(AcmapError::InsertRejected(
                    reqwest::StatusCode::from_u16(other).unwrap(),
                    "rejected".into(),
                )),
            }
        }
    }

    fn three_records() -> Vec<AccountRecord> {
        vec![
            record(1, "Shree Traders", "27AAACS1234F1Z5"),
            record(2, "Om Sugars", "27AAACS1234F1Z5"),
            record(3, "Laxmi Agro", "27AAACS1234F1Z5"),
        ]
    }

    fn loaded(api: FakeApi) -> (AccountMapper, Arc<FakeApi>) {
        let api = Arc::new(api);
        let mut mapper = AccountMapper::new(api.clone(), 15);
        mapper.start_load("27AAACS1234F1Z5");
        let deadline = Instant::now() + Duration::from_secs(5);
        while mapper.view().phase() == &Phase::Loading {
            assert!(Instant::now() < deadline, "load never finished");
            mapper.poll_loads();
            std::thread::sleep(Duration::from_millis(5));
        }
        (mapper, api)
    }

    fn type_text(mapper: &mut AccountMapper, text: &str) {
        for c in text.chars() {
            mapper.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_search_and_map_scenario() {
        let (mut mapper, api) = loaded(FakeApi {
            records: three_records(),
            ..Default::default()
        });
        assert_eq!(mapper.view().rows().len(), 3);

        mapper.handle_key(KeyCode::Char('/'));
        type_text(&mut mapper, "laxmi");
        mapper.handle_key(KeyCode::Enter);
        assert_eq!(mapper.view().page_count(), 1);
        assert_eq!(mapper.view().rows().len(), 1);

        assert!(matches!(mapper.handle_key(KeyCode::Char('m')), MapperAction::Map));
        assert_eq!(mapper.map_selected(), Some(Route::UserUtility));
        assert_eq!(api.inserted.lock().unwrap().as_slice(), &[AccountCode::new("3")]);
        assert!(mapper.view().rows().is_empty());
    }

    #[test]
    fn test_map_while_loading_is_refused() {
        let (mut mapper, api) = loaded(FakeApi {
            records: three_records(),
            ..Default::default()
        });
        mapper.handle_key(KeyCode::Char('r'));
        assert_eq!(mapper.view().phase(), &Phase::Loading);
        assert!(mapper.view().selected_record().is_some());

        assert!(matches!(mapper.handle_key(KeyCode::Char('m')), MapperAction::Continue));
        assert_eq!(mapper.status_message.as_deref(), Some("Accounts are still loading"));
        assert_eq!(mapper.map_selected(), None);
        assert!(api.inserted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_map_after_failed_reload_is_refused() {
        let (mut mapper, api) = loaded(FakeApi {
            records: three_records(),
            ..Default::default()
        });
        let ticket = mapper.view.begin_load("27AAACS1234F1Z5").unwrap();
        mapper.view.finish_load(
            &ticket,
            Err(AcmapError::MalformedResponse("accountMasterData is missing".into())),
        );
        assert!(matches!(mapper.handle_key(KeyCode::Enter), MapperAction::Continue));
        assert_eq!(mapper.status_message.as_deref(), Some("No accounts to map"));
        assert!(api.inserted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_map_leaves_rows() {
        let (mut mapper, _api) = loaded(FakeApi {
            records: three_records(),
            insert_status: Some(409),
            ..Default::default()
        });
        assert_eq!(mapper.map_selected(), None);
        assert_eq!(mapper.view().rows().len(), 3);
        assert!(mapper.status_message.as_deref().unwrap().contains("Map failed"));
    }

    #[test]
    fn test_empty_lookup_shows_prompt() {
        let (mut mapper, _api) = loaded(FakeApi::default());
        assert!(mapper.view().is_modal_open());
        assert!(matches!(
            mapper.handle_key(KeyCode::Char('y')),
            MapperAction::Navigate(Route::AccountMasterCreate)
        ));
        assert!(!mapper.view().is_modal_open());
    }

    #[test]
    fn test_prompt_decline_with_focus() {
        let (mut mapper, _api) = loaded(FakeApi::default());
        mapper.handle_key(KeyCode::Right);
        assert!(matches!(
            mapper.handle_key(KeyCode::Enter),
            MapperAction::Navigate(Route::Fallback)
        ));
    }

    #[test]
    fn test_failed_lookup_is_visible() {
        let (mut mapper, _api) = loaded(FakeApi {
            fail_fetch: true,
            ..Default::default()
        });
        assert!(matches!(mapper.view().phase(), Phase::Failed(_)));
        assert!(!mapper.view().is_modal_open());

        let backend = TestBackend::new(120, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| mapper.draw(frame)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Could not load accounts"));
    }

    #[test]
    fn test_back_and_quit() {
        let (mut mapper, _api) = loaded(FakeApi {
            records: three_records(),
            ..Default::default()
        });
        assert!(matches!(
            mapper.handle_key(KeyCode::Esc),
            MapperAction::Navigate(Route::Dashboard)
        ));
        assert!(matches!(mapper.handle_key(KeyCode::Char('q')), MapperAction::Quit));
    }

    #[test]
    fn test_gst_prompt_when_missing() {
        let api = Arc::new(FakeApi {
            records: three_records(),
            ..Default::default()
        });
        let mut mapper = AccountMapper::new(api, 15);
        mapper.start_load("");
        assert_eq!(mapper.view().phase(), &Phase::Idle);
        assert!(matches!(mapper.mode, Mode::GstInput(_)));
        type_text(&mut mapper, "27aaa");
        mapper.handle_key(KeyCode::Enter);
        assert_eq!(mapper.view().gst_no(), "27AAA");
        assert_eq!(mapper.view().phase(), &Phase::Loading);
    }

    #[test]
    fn test_draws_table_and_prompt() {
        let (mut mapper, _api) = loaded(FakeApi {
            records: three_records(),
            ..Default::default()
        });
        let backend = TestBackend::new(200, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| mapper.draw(frame)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Om Sugars"));
        assert!(text.contains("Page 1 of 1"));

        let (mut empty, _api) = loaded(FakeApi::default());
        terminal.draw(|frame| empty.draw(frame)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Please Add Account"));
    }
}
