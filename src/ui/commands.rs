use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::app::{App, InputMode, PendingAction, Screen};
use crate::models::{Category, ExpenseDraft, MonthKey};
use crate::session;
use crate::store::ExpenseStore;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &dyn ExpenseStore) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit ExpenseFlow", cmd_quit, r);
    register_command!("quit", "Quit ExpenseFlow", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("a", "Go to Analytics", cmd_analytics, r);
    register_command!("analytics", "Go to Analytics", cmd_analytics, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("month", "Switch month (e.g. :month 2024-01)", cmd_month, r);
    register_command!("m", "Switch month (e.g. :m 2024-01)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "add",
        "Add expense (e.g. :add 2024-01-15 Food 12.50 lunch; date defaults to today)",
        cmd_add,
        r
    );
    register_command!(
        "edit",
        "Replace selected expense (e.g. :edit 2024-01-15 Food 14.00 lunch)",
        cmd_edit,
        r
    );
    register_command!("delete", "Delete selected expense", cmd_delete, r);
    register_command!(
        "budget",
        "Set monthly budget; 0 disables tracking (e.g. :budget 2000)",
        cmd_budget,
        r
    );
    register_command!("refresh", "Re-fetch the current month", cmd_refresh, r);
    register_command!(
        "export",
        "Export this month's expenses to CSV (e.g. :export ~/expenses.csv)",
        cmd_export,
        r
    );

    r
});

pub(crate) fn handle_command(
    input: &str,
    app: &mut App,
    store: &dyn ExpenseStore,
) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, store)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Parse `[date] <category> <amount> [note...]` into a draft. The date
/// defaults to today when the first token isn't one.
pub(crate) fn parse_expense_args(args: &str, today: NaiveDate) -> Result<ExpenseDraft, String> {
    let mut tokens = args.split_whitespace().peekable();

    let occurred_on = match tokens
        .peek()
        .and_then(|t| NaiveDate::parse_from_str(t, "%Y-%m-%d").ok())
    {
        Some(date) => {
            tokens.next();
            date
        }
        None => today,
    };

    let category_token = tokens
        .next()
        .ok_or_else(|| "Usage: [YYYY-MM-DD] <category> <amount> [note]".to_string())?;
    let category = Category::from_input(category_token).ok_or_else(|| {
        let names: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();
        format!("Unknown category '{category_token}'. One of: {}", names.join(", "))
    })?;

    let amount_token = tokens
        .next()
        .ok_or_else(|| "Missing amount".to_string())?;
    let amount = Decimal::from_str(amount_token)
        .map_err(|_| format!("Bad amount '{amount_token}'"))?;

    let note: String = tokens.collect::<Vec<_>>().join(" ");
    let note = if note.is_empty() { None } else { Some(note) };

    ExpenseDraft::new(category, amount, occurred_on, note)
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    Ok(())
}

fn cmd_analytics(_args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    app.screen = Screen::Analytics;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    match MonthKey::parse(args) {
        Some(month) => switch_month(app, month),
        None => app.set_status(format!("Not a month: '{args}' (expected YYYY-MM)")),
    }
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    let month = app.session.month().next();
    switch_month(app, month);
    Ok(())
}

fn cmd_prev_month(_args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    let month = app.session.month().prev();
    switch_month(app, month);
    Ok(())
}

fn cmd_add(args: &str, app: &mut App, store: &dyn ExpenseStore) -> anyhow::Result<()> {
    let today = chrono::Local::now().date_naive();
    let draft = match parse_expense_args(args, today) {
        Ok(draft) => draft,
        Err(msg) => {
            app.set_status(msg);
            return Ok(());
        }
    };
    match session::create_expense(store, &mut app.session, &draft) {
        Ok(request) => {
            app.queue_fetch(request);
            app.set_status(format!(
                "Added {} {}",
                draft.category,
                super::util::format_amount(draft.amount)
            ));
        }
        Err(e) => app.set_status(format!("Add failed: {e}")),
    }
    Ok(())
}

fn cmd_edit(args: &str, app: &mut App, store: &dyn ExpenseStore) -> anyhow::Result<()> {
    let Some((id, occurred_on)) = app
        .selected_expense()
        .map(|e| (e.id.clone(), e.occurred_on))
    else {
        app.set_status("No expense selected");
        return Ok(());
    };
    let draft = match parse_expense_args(args, occurred_on) {
        Ok(draft) => draft,
        Err(msg) => {
            app.set_status(msg);
            return Ok(());
        }
    };
    match session::update_expense(store, &mut app.session, &id, &draft) {
        Ok(request) => {
            app.queue_fetch(request);
            app.set_status("Expense updated");
        }
        Err(e) => app.set_status(format!("Edit failed: {e}")),
    }
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    let Some((id, label)) = app.selected_expense().map(|e| {
        (
            e.id.clone(),
            format!(
                "{} {} ({})",
                e.category,
                super::util::format_amount(e.amount),
                e.occurred_on
            ),
        )
    }) else {
        app.set_status("No expense selected");
        return Ok(());
    };
    app.confirm_message = format!("Delete {label}?");
    app.pending_action = Some(PendingAction::DeleteExpense { id, label });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, store: &dyn ExpenseStore) -> anyhow::Result<()> {
    let Ok(amount) = Decimal::from_str(args.trim()) else {
        app.set_status(format!("Bad budget amount '{args}'"));
        return Ok(());
    };
    match session::set_budget(store, &mut app.session, amount) {
        Ok(()) => {
            if amount > Decimal::ZERO {
                app.set_status(format!(
                    "Budget set to {}",
                    super::util::format_amount(amount)
                ));
            } else {
                app.set_status("Budget tracking disabled");
            }
        }
        Err(e) => app.set_status(format!("Budget not saved: {e}")),
    }
    Ok(())
}

fn cmd_refresh(_args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    let request = app.session.invalidate_current();
    app.queue_fetch(request);
    app.set_status("Refreshing…");
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, _store: &dyn ExpenseStore) -> anyhow::Result<()> {
    let month = app.session.month();
    let path = if args.is_empty() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/expenseflow-export-{month}.csv")
    } else {
        crate::run::cli::shellexpand(args)
    };

    let expenses: Vec<_> = app.session.expenses().to_vec();
    if expenses.is_empty() {
        app.set_status(format!("No expenses for {month}"));
        return Ok(());
    }
    match crate::run::cli::write_csv(&path, &expenses) {
        Ok(count) => app.set_status(format!("Exported {count} expenses to {path}")),
        Err(e) => app.set_status(format!("Export failed: {e}")),
    }
    Ok(())
}

fn switch_month(app: &mut App, month: MonthKey) {
    if let Some(request) = app.session.select_month(month) {
        app.queue_fetch(request);
    }
    app.expense_index = 0;
    app.expense_scroll = 0;
    app.set_status(format!("Month: {month}"));
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rust_decimal_macros::dec;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn test_parse_full_form() {
        let draft = parse_expense_args("2024-06-01 Food 12.50 lunch with sam", today()).unwrap();
        assert_eq!(draft.occurred_on.to_string(), "2024-06-01");
        assert_eq!(draft.category, Category::Food);
        assert_eq!(draft.amount, dec!(12.50));
        assert_eq!(draft.note.as_deref(), Some("lunch with sam"));
    }

    #[test]
    fn test_parse_date_defaults_to_today() {
        let draft = parse_expense_args("transport 3.20", today()).unwrap();
        assert_eq!(draft.occurred_on, today());
        assert_eq!(draft.category, Category::Transport);
        assert!(draft.note.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_category() {
        let err = parse_expense_args("Groceries 10", today()).unwrap_err();
        assert!(err.contains("Unknown category"));
    }

    #[test]
    fn test_parse_rejects_bad_amount() {
        assert!(parse_expense_args("Food abc", today()).is_err());
        assert!(parse_expense_args("Food", today()).is_err());
    }

    #[test]
    fn test_parse_rejects_non_positive_amount() {
        assert!(parse_expense_args("Food 0", today()).is_err());
        assert!(parse_expense_args("Food -5", today()).is_err());
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_expense_args("", today()).is_err());
    }
}
