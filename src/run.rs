pub(crate) mod cli;

pub(crate) use cli::as_cli;

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::models::MonthKey;
use crate::session::{self, FetchRequest, SessionEvent};
use crate::store::{self, ExpenseStore, MonthSnapshot, StoreResult};
use crate::ui::app::{App, InputMode, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

/// How long the loop waits for a key press before checking for completed
/// fetches. Keeps the UI responsive while requests are in flight.
const INPUT_POLL: Duration = Duration::from_millis(150);

pub(crate) fn as_tui(store: Arc<dyn ExpenseStore>) -> Result<()> {
    let mut app = App::new(MonthKey::current());
    let month = app.session.month();
    if let Some(request) = app.session.select_month(month) {
        app.queue_fetch(request);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &store);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e:?}");
    }

    result
}

/// A fetch completion handed back from a worker thread. The tagged request
/// rides along so the session can discard stale results.
struct FetchDone {
    request: FetchRequest,
    result: StoreResult<MonthSnapshot>,
}

fn spawn_fetch(store: Arc<dyn ExpenseStore>, request: FetchRequest, tx: Sender<FetchDone>) {
    std::thread::spawn(move || {
        let result = store::fetch_month(store.as_ref(), request.month);
        if tx.send(FetchDone { request, result }).is_err() {
            debug!("fetch receiver gone; dropping result for {}", request.month);
        }
    });
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    store: &Arc<dyn ExpenseStore>,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    while app.running {
        for request in app.take_fetches() {
            spawn_fetch(Arc::clone(store), request, tx.clone());
        }

        terminal.draw(|f| {
            // Tab, status, command bars + table borders/header
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if app.show_help {
                    app.show_help = false;
                    continue;
                }
                match app.input_mode {
                    InputMode::Normal => handle_normal_input(key, app, store.as_ref())?,
                    InputMode::Command => handle_command_input(key, app, store.as_ref())?,
                    InputMode::Search => handle_search_input(key, app),
                    InputMode::Confirm => handle_confirm_input(key, app, store.as_ref()),
                }
            }
        }

        drain_completions(app, &rx);
    }
    Ok(())
}

fn drain_completions(app: &mut App, rx: &Receiver<FetchDone>) {
    while let Ok(done) = rx.try_recv() {
        match app.session.complete_fetch(done.request, done.result) {
            SessionEvent::Published => app.clamp_expense_cursor(),
            SessionEvent::DiscardedStale => {}
            SessionEvent::FailedKeptLastGood => {
                let msg = app.session.error().unwrap_or("fetch failed").to_string();
                app.set_status(format!("{msg} (showing last good data)"));
            }
            SessionEvent::Failed => {}
        }
    }
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(
    key: event::KeyEvent,
    app: &mut App,
    store: &dyn ExpenseStore,
) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('/') if app.screen == Screen::Dashboard => {
            app.input_mode = InputMode::Search;
            app.search_input.clear();
        }
        KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
        }
        KeyCode::Char('j') | KeyCode::Down if app.screen == Screen::Dashboard => {
            let len = app.visible_expenses().len();
            scroll_down(
                &mut app.expense_index,
                &mut app.expense_scroll,
                len,
                app.visible_rows.max(1),
            );
        }
        KeyCode::Char('k') | KeyCode::Up if app.screen == Screen::Dashboard => {
            scroll_up(&mut app.expense_index, &mut app.expense_scroll);
        }
        KeyCode::Char('1') => app.screen = Screen::Dashboard,
        KeyCode::Char('2') => app.screen = Screen::Analytics,
        KeyCode::Tab | KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let next = if key.code == KeyCode::Tab {
                (idx + 1) % screens.len()
            } else if idx == 0 {
                screens.len() - 1
            } else {
                idx - 1
            };
            app.screen = screens[next];
        }
        KeyCode::Char('H') => {
            commands::handle_command("prev-month", app, store)?;
        }
        KeyCode::Char('L') => {
            commands::handle_command("next-month", app, store)?;
        }
        KeyCode::Char('D') if app.screen == Screen::Dashboard => {
            commands::handle_command("delete", app, store)?;
        }
        KeyCode::Char('e') if app.screen == Screen::Dashboard => {
            let prefill = app.selected_expense().map(|e| {
                let note = e.note.clone().unwrap_or_default();
                let sep = if note.is_empty() { "" } else { " " };
                format!(
                    "edit {} {} {}{sep}{note}",
                    e.occurred_on, e.category, e.amount
                )
            });
            match prefill {
                Some(input) => {
                    app.command_input = input;
                    app.input_mode = InputMode::Command;
                }
                None => app.set_status("No expense selected"),
            }
        }
        KeyCode::Char('g') => {
            scroll_to_top(&mut app.expense_index, &mut app.expense_scroll);
        }
        KeyCode::Char('G') => {
            let len = app.visible_expenses().len();
            scroll_to_bottom(
                &mut app.expense_index,
                &mut app.expense_scroll,
                len,
                app.visible_rows.max(1),
            );
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.visible_rows / 2;
            let len = app.visible_expenses().len();
            for _ in 0..half_page {
                scroll_down(
                    &mut app.expense_index,
                    &mut app.expense_scroll,
                    len,
                    app.visible_rows.max(1),
                );
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.visible_rows / 2;
            for _ in 0..half_page {
                scroll_up(&mut app.expense_index, &mut app.expense_scroll);
            }
        }
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Esc => {
            app.status_message.clear();
            app.search_input.clear();
            app.clamp_expense_cursor();
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(
    key: event::KeyEvent,
    app: &mut App,
    store: &dyn ExpenseStore,
) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, store)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_search_input(key: event::KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_input.clear();
            app.clamp_expense_cursor();
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            app.expense_index = 0;
            app.expense_scroll = 0;
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            app.expense_index = 0;
            app.expense_scroll = 0;
        }
        _ => {}
    }
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, store: &dyn ExpenseStore) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(action) = app.pending_action.take() {
                match action {
                    PendingAction::DeleteExpense { id, label } => {
                        match session::delete_expense(store, &mut app.session, &id) {
                            Ok(request) => {
                                app.queue_fetch(request);
                                app.clamp_expense_cursor();
                                app.set_status(format!("Deleted: {label}"));
                            }
                            Err(e) => app.set_status(format!("Delete failed: {e}")),
                        }
                    }
                }
            }
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
        }
        _ => {
            // Any other key = cancel
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
    }
}
