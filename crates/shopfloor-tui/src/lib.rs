// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use shopfloor_app::{
    AppCommand, AppEvent, AppMode, AppState, CellValue, Column, ColumnFilter, DashboardSnapshot,
    FormKind, FormPayload, ListControls, ListView, Machine, MachineFault, NoticeKind, Order,
    PRODUCTION_STATUS_COLUMN, PageSize, Person, ProductionInstruction, QualityControl, Resource,
    RoutingStatus, SCREEN_CHANNEL, Screen, ShellBridge, SortDirection, SortSpec, Station,
    StoreItem, TableRecord, TagColor, TransitionRequest, WRITE_CHANNEL, Work,
};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_COLUMN_WIDTH: usize = 28;

/// Runs `$body` with `$view` bound to the payload of whichever per-screen
/// variant `$value` holds. Both row enums share variant names.
macro_rules! on_screen {
    ($kind:ident, $value:expr, $view:ident => $body:expr) => {
        match $value {
            $kind::Production($view) => $body,
            $kind::Machines($view) => $body,
            $kind::Faults($view) => $body,
            $kind::Stations($view) => $body,
            $kind::QualityControl($view) => $body,
            $kind::Orders($view) => $body,
            $kind::Works($view) => $body,
            $kind::Persons($view) => $body,
            $kind::Store($view) => $body,
        }
    };
}

/// Fetches one collection. Returns the decoded rows and how many rows were
/// dropped because they failed to decode.
pub trait RecordSource {
    fn fetch<R: Resource>(&mut self, filters: &[ColumnFilter]) -> Result<(Vec<R>, usize)>;

    /// Production rows for the routing screen. Sources that can see the
    /// machine list override this to name steps the server left blank.
    fn fetch_production(
        &mut self,
        filters: &[ColumnFilter],
    ) -> Result<(Vec<ProductionInstruction>, usize)> {
        self.fetch(filters)
    }
}

pub trait AppRuntime: RecordSource {
    fn load_dashboard(&mut self) -> Result<DashboardSnapshot>;
    fn delete_row(&mut self, screen: Screen, row_id: i64) -> Result<()>;
    fn submit_transition(&mut self, request: &TransitionRequest) -> Result<()>;
    fn create_record(&mut self, payload: &FormPayload) -> Result<()>;
    fn update_record(&mut self, row_id: i64, payload: &FormPayload) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenRows {
    Production(Vec<ProductionInstruction>),
    Machines(Vec<Machine>),
    Faults(Vec<MachineFault>),
    Stations(Vec<Station>),
    QualityControl(Vec<QualityControl>),
    Orders(Vec<Order>),
    Works(Vec<Work>),
    Persons(Vec<Person>),
    Store(Vec<StoreItem>),
}

impl ScreenRows {
    pub fn len(&self) -> usize {
        on_screen!(ScreenRows, self, rows => rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSnapshot {
    pub rows: ScreenRows,
    pub rejected: usize,
}

impl ScreenSnapshot {
    /// `None` for the dashboard, which has no rows of its own.
    pub fn load<S: RecordSource>(
        source: &mut S,
        screen: Screen,
        filters: &[ColumnFilter],
    ) -> Result<Option<Self>> {
        let snapshot = match screen {
            Screen::Dashboard => return Ok(None),
            Screen::Production => {
                let (rows, rejected) = source.fetch_production(filters)?;
                ScreenSnapshot {
                    rows: ScreenRows::Production(rows),
                    rejected,
                }
            }
            Screen::Machines => fetch_rows(source, filters, ScreenRows::Machines)?,
            Screen::Faults => fetch_rows(source, filters, ScreenRows::Faults)?,
            Screen::Stations => fetch_rows(source, filters, ScreenRows::Stations)?,
            Screen::QualityControl => fetch_rows(source, filters, ScreenRows::QualityControl)?,
            Screen::Orders => fetch_rows(source, filters, ScreenRows::Orders)?,
            Screen::Works => fetch_rows(source, filters, ScreenRows::Works)?,
            Screen::Persons => fetch_rows(source, filters, ScreenRows::Persons)?,
            Screen::Store => fetch_rows(source, filters, ScreenRows::Store)?,
        };
        Ok(Some(snapshot))
    }
}

fn fetch_rows<S: RecordSource, R: Resource>(
    source: &mut S,
    filters: &[ColumnFilter],
    wrap: fn(Vec<R>) -> ScreenRows,
) -> Result<ScreenSnapshot> {
    let (rows, rejected) = source.fetch::<R>(filters)?;
    Ok(ScreenSnapshot {
        rows: wrap(rows),
        rejected,
    })
}

#[derive(Debug, Clone, Default)]
pub struct TuiOptions {
    pub page_size: PageSize,
    pub bridge: Arc<ShellBridge>,
}

#[derive(Debug, Clone, PartialEq)]
enum ScreenTable {
    Production(ListView<ProductionInstruction>),
    Machines(ListView<Machine>),
    Faults(ListView<MachineFault>),
    Stations(ListView<Station>),
    QualityControl(ListView<QualityControl>),
    Orders(ListView<Order>),
    Works(ListView<Work>),
    Persons(ListView<Person>),
    Store(ListView<StoreItem>),
}

impl ScreenTable {
    fn build(rows: ScreenRows, controls: ListControls) -> Self {
        match rows {
            ScreenRows::Production(rows) => {
                Self::Production(ListView::with_controls(rows, controls))
            }
            ScreenRows::Machines(rows) => Self::Machines(ListView::with_controls(rows, controls)),
            ScreenRows::Faults(rows) => Self::Faults(ListView::with_controls(rows, controls)),
            ScreenRows::Stations(rows) => Self::Stations(ListView::with_controls(rows, controls)),
            ScreenRows::QualityControl(rows) => {
                Self::QualityControl(ListView::with_controls(rows, controls))
            }
            ScreenRows::Orders(rows) => Self::Orders(ListView::with_controls(rows, controls)),
            ScreenRows::Works(rows) => Self::Works(ListView::with_controls(rows, controls)),
            ScreenRows::Persons(rows) => Self::Persons(ListView::with_controls(rows, controls)),
            ScreenRows::Store(rows) => Self::Store(ListView::with_controls(rows, controls)),
        }
    }

    fn controls(&self) -> ListControls {
        on_screen!(ScreenTable, self, view => view.controls().clone())
    }

    fn columns(&self) -> &'static [Column] {
        on_screen!(ScreenTable, self, view => columns_of(view))
    }

    fn projection(&self) -> TableProjection {
        on_screen!(ScreenTable, self, view => project(view))
    }

    fn visible_len(&self) -> usize {
        on_screen!(ScreenTable, self, view => view.visible().rows.len())
    }

    fn row_id(&self, row: usize) -> Option<i64> {
        on_screen!(ScreenTable, self, view => {
            view.visible().rows.get(row).map(|record| record.record_id())
        })
    }

    fn field_values(&self, row: usize, kind: FormKind) -> Option<Result<Vec<String>>> {
        on_screen!(ScreenTable, self, view => {
            view.visible()
                .rows
                .get(row)
                .map(|record| FormPayload::field_values(kind, *record))
        })
    }

    fn instruction(&self, row: usize) -> Option<ProductionInstruction> {
        match self {
            Self::Production(view) => view.visible().rows.get(row).map(|record| (*record).clone()),
            _ => None,
        }
    }

    fn set_query(&mut self, query: &str) {
        on_screen!(ScreenTable, self, view => view.set_query(query))
    }

    fn cycle_sort(&mut self, column: usize) -> Option<SortSpec> {
        on_screen!(ScreenTable, self, view => view.cycle_sort(column))
    }

    fn next_page(&mut self) -> usize {
        on_screen!(ScreenTable, self, view => view.next_page())
    }

    fn prev_page(&mut self) -> usize {
        on_screen!(ScreenTable, self, view => view.prev_page())
    }

    fn set_page_size(&mut self, page_size: PageSize) {
        on_screen!(ScreenTable, self, view => view.set_page_size(page_size))
    }
}

fn columns_of<R: TableRecord>(_view: &ListView<R>) -> &'static [Column] {
    R::columns()
}

/// Display strings for the visible page of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableProjection {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    page: usize,
    page_count: usize,
    matched: usize,
    total: usize,
}

fn project<R: TableRecord>(view: &ListView<R>) -> TableProjection {
    let slice = view.visible();
    let sort = view.controls().sort;
    let headers = R::columns()
        .iter()
        .enumerate()
        .map(|(index, column)| header_label(column.label, index, sort))
        .collect();
    let rows = slice
        .rows
        .iter()
        .map(|record| record.cells().iter().map(CellValue::display).collect())
        .collect();
    TableProjection {
        headers,
        rows,
        page: slice.page,
        page_count: slice.page_count,
        matched: slice.matched,
        total: slice.total,
    }
}

fn header_label(label: &str, index: usize, sort: Option<SortSpec>) -> String {
    match sort {
        Some(spec) if spec.column == index => match spec.direction {
            SortDirection::Asc => format!("{label} ▲"),
            SortDirection::Desc => format!("{label} ▼"),
        },
        _ => label.to_owned(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptTarget {
    Search,
    Column(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Prompt {
    target: PromptTarget,
    buffer: String,
    previous: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormDraft {
    kind: FormKind,
    target: Option<i64>,
    values: Vec<String>,
    cursor: usize,
}

#[derive(Debug, Default)]
struct ViewData {
    table: Option<ScreenTable>,
    dashboard: Option<DashboardSnapshot>,
    rejected: usize,
    selected_row: usize,
    selected_col: usize,
    filters: Vec<ColumnFilter>,
    stashed: Vec<(Screen, ListControls)>,
    prompt: Option<Prompt>,
    form: Option<FormDraft>,
    page_size: PageSize,
    status_token: u64,
    bridge: Arc<ShellBridge>,
}

impl ViewData {
    fn new(options: TuiOptions) -> Self {
        Self {
            page_size: options.page_size,
            bridge: options.bridge,
            ..Self::default()
        }
    }

    fn leave_screen(&mut self, screen: Screen) {
        if let Some(table) = self.table.take() {
            self.stashed.retain(|(stashed, _)| *stashed != screen);
            self.stashed.push((screen, table.controls()));
        }
        self.dashboard = None;
        self.rejected = 0;
        self.selected_row = 0;
        self.selected_col = 0;
        self.filters.clear();
        self.prompt = None;
        self.form = None;
    }

    fn take_stashed(&mut self, screen: Screen) -> Option<ListControls> {
        let index = self
            .stashed
            .iter()
            .position(|(stashed, _)| *stashed == screen)?;
        Some(self.stashed.remove(index).1)
    }

    fn controls_for(&mut self, screen: Screen) -> ListControls {
        if let Some(table) = &self.table {
            return table.controls();
        }
        self.take_stashed(screen).unwrap_or_else(|| ListControls {
            page_size: self.page_size,
            ..ListControls::default()
        })
    }

    fn clamp_selection(&mut self) {
        let Some(table) = &self.table else {
            self.selected_row = 0;
            self.selected_col = 0;
            return;
        };
        self.selected_row = self
            .selected_row
            .min(table.visible_len().saturating_sub(1));
        self.selected_col = self
            .selected_col
            .min(table.columns().len().saturating_sub(1));
    }

    fn move_row(&mut self, delta: isize) {
        self.selected_row = self.selected_row.saturating_add_signed(delta);
        self.clamp_selection();
    }

    fn move_col(&mut self, delta: isize) {
        self.selected_col = self.selected_col.saturating_add_signed(delta);
        self.clamp_selection();
    }

    fn selected_id(&self) -> Option<i64> {
        self.table.as_ref()?.row_id(self.selected_row)
    }

    fn selected_instruction(&self) -> Option<ProductionInstruction> {
        self.table.as_ref()?.instruction(self.selected_row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InternalEvent {
    ClearStatus { token: u64 },
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: TuiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    view_data
        .bridge
        .send(SCREEN_CHANNEL, state.active_screen.label());
    load_active_screen(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearNotice);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let previous = state.active_screen;
    for event in state.dispatch(command) {
        match event {
            AppEvent::NoticeShown(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(internal_tx, view_data.status_token);
            }
            AppEvent::ScreenChanged(screen) => {
                view_data.leave_screen(previous);
                view_data.bridge.send(SCREEN_CHANNEL, screen.label());
                debug!(screen = screen.label(), "screen changed");
                load_active_screen(state, runtime, view_data, internal_tx);
            }
            AppEvent::RefetchRequested(screen) if screen == state.active_screen => {
                load_active_screen(state, runtime, view_data, internal_tx);
            }
            AppEvent::RefetchRequested(_)
            | AppEvent::ModeChanged(_)
            | AppEvent::NoticeCleared => {}
        }
    }
}

fn inform<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::Inform(message.into()),
    );
}

fn fail<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::OperationFailed(message.into()),
    );
}

fn write_succeeded<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: String,
) {
    view_data.bridge.send(WRITE_CHANNEL, &message);
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::WriteSucceeded(message),
    );
}

/// Fetches the active screen. The page and sort survive; a shorter result
/// clamps the page to the new last page. A failed fetch keeps the rows
/// already on screen and returns false.
fn load_active_screen<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> bool {
    let screen = state.active_screen;
    if screen == Screen::Dashboard {
        return match runtime.load_dashboard() {
            Ok(snapshot) => {
                if !snapshot.failures.is_empty() {
                    warn!(failures = ?snapshot.failures, "dashboard tiles failed");
                }
                let loaded = snapshot.has_tiles();
                view_data.dashboard = Some(snapshot);
                if !loaded {
                    fail(
                        state,
                        runtime,
                        view_data,
                        internal_tx,
                        "every dashboard request failed -- check [api] in the config".to_owned(),
                    );
                }
                loaded
            }
            Err(error) => {
                fail(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    format!("load dashboard: {error}"),
                );
                false
            }
        };
    }

    let controls = view_data.controls_for(screen);
    match ScreenSnapshot::load(runtime, screen, &view_data.filters) {
        Ok(Some(snapshot)) => {
            if snapshot.rejected > 0 {
                warn!(
                    screen = screen.label(),
                    rejected = snapshot.rejected,
                    "rows rejected while decoding"
                );
            }
            view_data.rejected = snapshot.rejected;
            view_data.table = Some(ScreenTable::build(snapshot.rows, controls));
            view_data.clamp_selection();
            true
        }
        Ok(None) => {
            view_data.table = None;
            true
        }
        Err(error) => {
            if view_data.table.is_none() {
                view_data.stashed.push((screen, controls));
            }
            fail(
                state,
                runtime,
                view_data,
                internal_tx,
                format!("load {}: {error}", screen.label()),
            );
            false
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match state.mode {
        AppMode::Nav => return handle_nav_key(state, runtime, view_data, internal_tx, key),
        AppMode::Search => handle_prompt_key(state, runtime, view_data, internal_tx, key),
        AppMode::Form(_) => handle_form_key(state, runtime, view_data, internal_tx, key),
        AppMode::ConfirmDelete => {
            handle_confirm_delete_key(state, runtime, view_data, internal_tx, key);
        }
        AppMode::Help => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    AppCommand::ExitToNav,
                );
            }
        }
    }
    false
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => {
            dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::NextScreen);
        }
        KeyCode::BackTab => {
            dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::PrevScreen);
        }
        KeyCode::Char('j') | KeyCode::Down => view_data.move_row(1),
        KeyCode::Char('k') | KeyCode::Up => view_data.move_row(-1),
        KeyCode::Char('l') | KeyCode::Right => view_data.move_col(1),
        KeyCode::Char('h') | KeyCode::Left => view_data.move_col(-1),
        KeyCode::Char('?') => {
            dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::OpenHelp);
        }
        KeyCode::Char('r') => {
            if load_active_screen(state, runtime, view_data, internal_tx) {
                let message = match &view_data.table {
                    Some(table) => format!("{} rows loaded", table.projection().total),
                    None => "dashboard refreshed".to_owned(),
                };
                inform(state, runtime, view_data, internal_tx, message);
            }
        }
        KeyCode::Char('/') => open_prompt(state, runtime, view_data, internal_tx, false),
        KeyCode::Char('f') => open_prompt(state, runtime, view_data, internal_tx, true),
        KeyCode::Char('s') => {
            let column = view_data.selected_col;
            let Some(table) = view_data.table.as_mut() else {
                return false;
            };
            let label = table.columns().get(column).map_or("", |column| column.label);
            let message = match table.cycle_sort(column) {
                Some(SortSpec {
                    direction: SortDirection::Asc,
                    ..
                }) => format!("sorted by {label} ascending"),
                Some(SortSpec {
                    direction: SortDirection::Desc,
                    ..
                }) => format!("sorted by {label} descending"),
                None => "sort cleared".to_owned(),
            };
            view_data.clamp_selection();
            inform(state, runtime, view_data, internal_tx, message);
        }
        KeyCode::Char('n') => {
            if let Some(table) = view_data.table.as_mut() {
                table.next_page();
                view_data.selected_row = 0;
            }
        }
        KeyCode::Char('p') => {
            if let Some(table) = view_data.table.as_mut() {
                table.prev_page();
                view_data.selected_row = 0;
            }
        }
        KeyCode::Char(']') | KeyCode::Char('[') => {
            let Some(table) = view_data.table.as_mut() else {
                return false;
            };
            let current = table.controls().page_size;
            let size = if key.code == KeyCode::Char(']') {
                current.next()
            } else {
                current.prev()
            };
            table.set_page_size(size);
            view_data.clamp_selection();
            inform(
                state,
                runtime,
                view_data,
                internal_tx,
                format!("{} rows per page", size.get()),
            );
        }
        KeyCode::Char('d') => {
            if state.active_screen != Screen::Dashboard && view_data.selected_id().is_none() {
                inform(state, runtime, view_data, internal_tx, "no row selected");
            } else {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    AppCommand::RequestDelete,
                );
            }
        }
        KeyCode::Char('a') => open_form(state, runtime, view_data, internal_tx, false),
        KeyCode::Char('i') => open_form(state, runtime, view_data, internal_tx, true),
        KeyCode::Char('e') => {
            send_transition(state, runtime, view_data, internal_tx, TransitionRequest::enter_next);
        }
        KeyCode::Char('x') => {
            send_transition(state, runtime, view_data, internal_tx, TransitionRequest::exit_current);
        }
        KeyCode::Char('c') => {
            send_transition(state, runtime, view_data, internal_tx, TransitionRequest::complete);
        }
        KeyCode::Char('t') => {
            send_transition(state, runtime, view_data, internal_tx, TransitionRequest::for_next_step);
        }
        _ => {}
    }
    false
}

fn open_prompt<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    column_filter: bool,
) {
    let screen = state.active_screen;
    let Some(table) = view_data.table.as_ref() else {
        inform(state, runtime, view_data, internal_tx, "nothing to search here");
        return;
    };

    let prompt = if column_filter {
        if !screen.filters_server_side() {
            inform(
                state,
                runtime,
                view_data,
                internal_tx,
                format!("{} filters locally -- use / to search", screen.label()),
            );
            return;
        }
        let Some(column) = table.columns().get(view_data.selected_col) else {
            return;
        };
        let previous = view_data
            .filters
            .iter()
            .find(|filter| filter.field == column.field)
            .map(|filter| filter.needle.clone())
            .unwrap_or_default();
        Prompt {
            target: PromptTarget::Column(column.field),
            buffer: previous.clone(),
            previous,
        }
    } else {
        let previous = table.controls().query;
        Prompt {
            target: PromptTarget::Search,
            buffer: previous.clone(),
            previous,
        }
    };

    view_data.prompt = Some(prompt);
    dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::OpenSearch);
}

fn handle_prompt_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(mut prompt) = view_data.prompt.take() else {
        dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::ExitToNav);
        return;
    };

    match key.code {
        KeyCode::Esc => {
            if prompt.target == PromptTarget::Search
                && let Some(table) = view_data.table.as_mut()
            {
                table.set_query(&prompt.previous);
                view_data.clamp_selection();
            }
            dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::ExitToNav);
            return;
        }
        KeyCode::Enter => {
            dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::ExitToNav);
            if let PromptTarget::Column(field) = prompt.target {
                apply_column_filter(state, runtime, view_data, internal_tx, field, &prompt.buffer);
            }
            return;
        }
        KeyCode::Backspace => {
            prompt.buffer.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.buffer.push(ch);
        }
        _ => {}
    }

    if prompt.target == PromptTarget::Search
        && let Some(table) = view_data.table.as_mut()
    {
        table.set_query(&prompt.buffer);
        view_data.selected_row = 0;
    }
    view_data.prompt = Some(prompt);
}

fn apply_column_filter<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    field: &str,
    needle: &str,
) {
    let needle = needle.trim();
    view_data.filters.retain(|filter| filter.field != field);
    if !needle.is_empty() {
        view_data.filters.push(ColumnFilter::new(field, needle));
    }
    if !load_active_screen(state, runtime, view_data, internal_tx) {
        return;
    }
    let message = if needle.is_empty() {
        format!("{field} filter cleared")
    } else {
        format!("filtered {field} by {needle:?}")
    };
    inform(state, runtime, view_data, internal_tx, message);
}

fn handle_confirm_delete_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if key.code != KeyCode::Char('y') {
        dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::ExitToNav);
        inform(state, runtime, view_data, internal_tx, "delete cancelled");
        return;
    }

    let screen = state.active_screen;
    let Some(row_id) = view_data.selected_id() else {
        fail(state, runtime, view_data, internal_tx, "no row selected");
        return;
    };
    match runtime.delete_row(screen, row_id) {
        Ok(()) => {
            let noun = FormKind::for_screen(screen).map_or("row", FormKind::label);
            write_succeeded(
                state,
                runtime,
                view_data,
                internal_tx,
                format!("{noun} {row_id} deleted"),
            );
        }
        Err(error) => fail(state, runtime, view_data, internal_tx, error.to_string()),
    }
}

fn send_transition<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    build: fn(&ProductionInstruction) -> Result<TransitionRequest>,
) {
    if state.active_screen != Screen::Production {
        return;
    }
    let Some(instruction) = view_data.selected_instruction() else {
        inform(state, runtime, view_data, internal_tx, "no instruction selected");
        return;
    };

    let outcome = build(&instruction).and_then(|request| {
        runtime.submit_transition(&request)?;
        Ok(request)
    });
    match outcome {
        Ok(request) => write_succeeded(
            state,
            runtime,
            view_data,
            internal_tx,
            format!("{} sent for instruction {}", request.label(), request.instruction()),
        ),
        Err(error) => fail(state, runtime, view_data, internal_tx, error.to_string()),
    }
}

fn open_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    edit: bool,
) {
    let Some(kind) = FormKind::for_screen(state.active_screen) else {
        inform(state, runtime, view_data, internal_tx, "nothing to edit on the dashboard");
        return;
    };

    let draft = if edit {
        if !kind.supports_edit() {
            inform(
                state,
                runtime,
                view_data,
                internal_tx,
                format!("{}s cannot be edited -- use the routing keys", kind.label()),
            );
            return;
        }
        let row = view_data.selected_row;
        let prefill = view_data
            .table
            .as_ref()
            .and_then(|table| Some((table.row_id(row)?, table.field_values(row, kind)?)));
        let Some((row_id, values)) = prefill else {
            inform(state, runtime, view_data, internal_tx, "no row selected");
            return;
        };
        match values {
            Ok(values) => FormDraft {
                kind,
                target: Some(row_id),
                values,
                cursor: 0,
            },
            Err(error) => {
                fail(state, runtime, view_data, internal_tx, error.to_string());
                return;
            }
        }
    } else {
        match FormPayload::field_values(kind, &FormPayload::blank_for(kind)) {
            Ok(values) => FormDraft {
                kind,
                target: None,
                values,
                cursor: 0,
            },
            Err(error) => {
                fail(state, runtime, view_data, internal_tx, error.to_string());
                return;
            }
        }
    };

    view_data.form = Some(draft);
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::OpenForm(kind),
    );
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(draft) = view_data.form.as_mut() else {
        dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::ExitToNav);
        return;
    };
    let len = draft.values.len().max(1);

    match key.code {
        KeyCode::Esc => {
            view_data.form = None;
            dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::ExitToNav);
        }
        KeyCode::Tab | KeyCode::Down => draft.cursor = (draft.cursor + 1) % len,
        KeyCode::BackTab | KeyCode::Up => draft.cursor = (draft.cursor + len - 1) % len,
        KeyCode::Backspace => {
            if let Some(value) = draft.values.get_mut(draft.cursor) {
                value.pop();
            }
        }
        KeyCode::Enter => submit_form(state, runtime, view_data, internal_tx),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(value) = draft.values.get_mut(draft.cursor) {
                value.push(ch);
            }
        }
        _ => {}
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(draft) = view_data.form.clone() else {
        return;
    };

    let outcome = FormPayload::from_fields(draft.kind, &draft.values).and_then(|payload| {
        payload.validate()?;
        match draft.target {
            Some(row_id) => runtime.update_record(row_id, &payload),
            None => runtime.create_record(&payload),
        }
    });

    match outcome {
        Ok(()) => {
            view_data.form = None;
            let message = match draft.target {
                Some(row_id) => format!("{} {row_id} updated", draft.kind.label()),
                None => format!("{} created", draft.kind.label()),
            };
            write_succeeded(state, runtime, view_data, internal_tx, message);
        }
        Err(error) => {
            fail(state, runtime, view_data, internal_tx, error.to_string());
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::OpenForm(draft.kind),
            );
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = Screen::ALL
        .iter()
        .position(|screen| *screen == state.active_screen)
        .unwrap_or(0);
    let titles = Screen::ALL
        .iter()
        .map(|screen| screen.label().to_owned())
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("shopfloor").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.active_screen {
        Screen::Dashboard => {
            let body = Paragraph::new(render_dashboard_text(view_data.dashboard.as_ref()))
                .block(Block::default().borders(Borders::ALL).title("dashboard"));
            frame.render_widget(body, layout[1]);
        }
        Screen::Production => {
            let body = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(3)])
                .split(layout[1]);
            render_table(frame, body[0], state, view_data);
            render_routing(frame, body[1], view_data);
        }
        _ => render_table(frame, layout[1], state, view_data),
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(status_color(state)))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if state.mode == AppMode::Help {
        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_text()).block(
            Block::default()
                .title("help")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(help, area);
    }

    if let (AppMode::Form(_), Some(draft)) = (state.mode, view_data.form.as_ref()) {
        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);
        let form = Paragraph::new(form_lines(draft))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(form_title(draft))
                    .borders(Borders::ALL),
            );
        frame.render_widget(form, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let Some(table) = view_data.table.as_ref() else {
        let empty = Paragraph::new("no rows loaded -- press r to retry").block(
            Block::default()
                .borders(Borders::ALL)
                .title(state.active_screen.label()),
        );
        frame.render_widget(empty, area);
        return;
    };

    let projection = table.projection();
    let header = Row::new(projection.headers.iter().enumerate().map(|(index, label)| {
        let style = if index == view_data.selected_col {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        };
        Cell::from(label.clone()).style(style)
    }));

    let rows = projection.rows.iter().enumerate().map(|(row_index, cells)| {
        let row_selected = row_index == view_data.selected_row;
        let cells = cells
            .iter()
            .enumerate()
            .map(|(column, text)| {
                let mut style = cell_color(state.active_screen, column, text)
                    .map_or_else(Style::default, |color| Style::default().fg(color));
                if row_selected && column == view_data.selected_col {
                    style = Style::default().fg(Color::Black).bg(Color::Cyan);
                }
                Cell::from(text.clone()).style(style)
            })
            .collect::<Vec<_>>();
        let row = Row::new(cells);
        if row_selected {
            row.style(Style::default().bg(Color::DarkGray))
        } else {
            row
        }
    });

    let widget = Table::new(rows, column_widths(&projection))
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(table_title(
            state.active_screen,
            &projection,
            &table.controls(),
            &view_data.filters,
            view_data.rejected,
        )));
    frame.render_widget(widget, area);
}

fn render_routing(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let (title, line) = match view_data.selected_instruction() {
        Some(instruction) => (
            format!(
                "routing {} ({})",
                instruction.id,
                instruction.progress().summary()
            ),
            routing_line(&instruction),
        ),
        None => ("routing".to_owned(), Line::from("no instruction selected")),
    };
    let widget = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, area);
}

fn routing_line(instruction: &ProductionInstruction) -> Line<'static> {
    if instruction.production_to_machines.is_empty() {
        return Line::from("no routing");
    }
    let mut spans = Vec::new();
    for (index, step) in instruction.production_to_machines.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw(" -> "));
        }
        let name = if step.machine_name.trim().is_empty() {
            format!("machine {}", step.machine_id)
        } else {
            step.machine_name.clone()
        };
        spans.push(Span::styled(
            format!("{name} [{}]", step.status.label()),
            Style::default().fg(tag_color(step.status.tag_color())),
        ));
    }
    Line::from(spans)
}

fn column_widths(projection: &TableProjection) -> Vec<Constraint> {
    projection
        .headers
        .iter()
        .enumerate()
        .map(|(column, header)| {
            let widest = projection
                .rows
                .iter()
                .filter_map(|row| row.get(column))
                .map(|text| text.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count())
                .min(MAX_COLUMN_WIDTH);
            Constraint::Length(widest as u16)
        })
        .collect()
}

fn table_title(
    screen: Screen,
    projection: &TableProjection,
    controls: &ListControls,
    filters: &[ColumnFilter],
    rejected: usize,
) -> String {
    let mut title = format!(
        "{} | page {}/{} | {} of {} rows | {} per page",
        screen.label(),
        projection.page,
        projection.page_count,
        projection.matched,
        projection.total,
        controls.page_size.get()
    );
    if !controls.query.is_empty() {
        title.push_str(&format!(" | search {:?}", controls.query));
    }
    for filter in filters {
        title.push_str(&format!(" | {}={}", filter.field, filter.needle));
    }
    if rejected > 0 {
        title.push_str(&format!(" | {rejected} rejected"));
    }
    title
}

fn cell_color(screen: Screen, column: usize, text: &str) -> Option<Color> {
    if screen != Screen::Production || column != PRODUCTION_STATUS_COLUMN {
        return None;
    }
    RoutingStatus::parse(text).map(|status| tag_color(status.tag_color()))
}

fn tag_color(color: TagColor) -> Color {
    match color {
        TagColor::Red => Color::Red,
        TagColor::Green => Color::Green,
        TagColor::Blue => Color::Blue,
        TagColor::Gray => Color::Gray,
    }
}

fn status_color(state: &AppState) -> Color {
    match state.notice.as_ref().map(|notice| notice.kind) {
        Some(NoticeKind::Failure) => Color::Red,
        Some(NoticeKind::Success) => Color::Green,
        Some(NoticeKind::Info) | None => Color::Yellow,
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    match state.mode {
        AppMode::Search => match view_data.prompt.as_ref() {
            Some(Prompt {
                target: PromptTarget::Column(field),
                buffer,
                ..
            }) => format!("filter {field}: {buffer}"),
            Some(prompt) => format!("/{}", prompt.buffer),
            None => "/".to_owned(),
        },
        AppMode::Form(_) => match state.notice.as_ref() {
            Some(notice) => notice.message.clone(),
            None => "tab next field | enter save | esc cancel".to_owned(),
        },
        AppMode::Help => "esc close help".to_owned(),
        AppMode::ConfirmDelete | AppMode::Nav => match state.notice.as_ref() {
            Some(notice) => notice.message.clone(),
            None => nav_hint(state.active_screen),
        },
    }
}

fn nav_hint(screen: Screen) -> String {
    match screen {
        Screen::Dashboard => "tab screens | r refresh | ? help | q quit".to_owned(),
        Screen::Production => {
            "e enter | x exit | c complete | t next step | / search | s sort | n/p page | ? help"
                .to_owned()
        }
        _ => "/ search | s sort | n/p page | a add | i edit | d delete | ? help".to_owned(),
    }
}

fn render_dashboard_text(snapshot: Option<&DashboardSnapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return "dashboard not loaded -- press r to retry".to_owned();
    };
    let count = |value: Option<usize>| value.map_or_else(|| "unavailable".to_owned(), |value| value.to_string());
    let production = snapshot.production.as_ref().map_or_else(
        || "unavailable".to_owned(),
        |breakdown| {
            RoutingStatus::ALL
                .iter()
                .map(|status| format!("{} {}", status.label(), breakdown.count(*status)))
                .collect::<Vec<_>>()
                .join(" | ")
        },
    );

    let mut lines = vec![
        format!("active machines   {}", count(snapshot.active_machines)),
        format!("open faults       {}", count(snapshot.open_faults)),
        format!("production        {production}"),
        format!("low stock items   {}", count(snapshot.low_stock_items)),
        format!("open orders       {}", count(snapshot.open_orders)),
    ];
    if !snapshot.failures.is_empty() {
        lines.push(String::new());
        lines.push("failed tiles:".to_owned());
        lines.extend(
            snapshot
                .failures
                .iter()
                .map(|failure| format!("  {failure}")),
        );
    }
    lines.join("\n")
}

fn form_title(draft: &FormDraft) -> String {
    match draft.target {
        Some(row_id) => format!("edit {} {row_id}", draft.kind.label()),
        None => format!("new {}", draft.kind.label()),
    }
}

fn form_lines(draft: &FormDraft) -> Vec<Line<'static>> {
    draft
        .kind
        .fields()
        .iter()
        .zip(&draft.values)
        .enumerate()
        .map(|(index, (field, value))| {
            if index == draft.cursor {
                Line::styled(
                    format!("{:<20} {value}_", field.label),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Line::from(format!("{:<20} {value}", field.label))
            }
        })
        .collect()
}

fn help_text() -> String {
    [
        "tab / shift-tab   switch screen",
        "j k h l           move row / column",
        "/                 search all columns",
        "f                 filter selected column on the server",
        "s                 sort selected column",
        "n p               next / previous page",
        "] [               larger / smaller pages",
        "r                 refresh, keeping the page",
        "a i d             add / edit / delete row",
        "e x c t           enter / exit / complete / next step",
        "?                 close help",
        "q                 quit",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
