use crate::models::{Expense, MonthKey};
use crate::session::{FetchRequest, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Analytics,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Analytics]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Analytics => write!(f, "Analytics"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Search,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Search => write!(f, "SEARCH"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone)]
pub(crate) enum PendingAction {
    DeleteExpense { id: String, label: String },
}

/// All TUI state. Deliberately thin: the session owns every number the
/// screens show; the app only adds view state (cursor, modes, inputs).
pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) search_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,

    pub(crate) session: Session,
    pub(crate) pending_fetches: Vec<FetchRequest>,

    // Expense table cursor (Dashboard)
    pub(crate) expense_index: usize,
    pub(crate) expense_scroll: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(month: MonthKey) -> App {
        App {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            search_input: String::new(),
            status_message: String::new(),
            show_help: false,

            session: Session::new(month),
            pending_fetches: Vec::new(),

            expense_index: 0,
            expense_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    /// Current month's expenses after the live `/` filter.
    pub(crate) fn visible_expenses(&self) -> Vec<&Expense> {
        let filter = self.search_input.to_lowercase();
        self.session
            .expenses()
            .iter()
            .filter(|e| {
                if filter.is_empty() {
                    return true;
                }
                e.category.as_str().to_lowercase().contains(&filter)
                    || e.note
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&filter))
                    || e.occurred_on.to_string().contains(&filter)
            })
            .collect()
    }

    pub(crate) fn selected_expense(&self) -> Option<&Expense> {
        self.visible_expenses().get(self.expense_index).copied()
    }

    pub(crate) fn queue_fetch(&mut self, request: FetchRequest) {
        self.pending_fetches.push(request);
    }

    pub(crate) fn take_fetches(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.pending_fetches)
    }

    /// Keep the cursor inside the (possibly shrunk) expense list.
    pub(crate) fn clamp_expense_cursor(&mut self) {
        let len = self.visible_expenses().len();
        if self.expense_index >= len {
            self.expense_index = len.saturating_sub(1);
        }
        if self.expense_scroll > self.expense_index {
            self.expense_scroll = self.expense_index;
        }
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}
