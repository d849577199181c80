mod http;

pub(crate) use http::HttpStore;

use rust_decimal::Decimal;

use crate::models::{CategorySummaryRow, Expense, ExpenseDraft, MonthKey, OverviewPayload};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    /// Rejected locally, before any network call.
    #[error("{0}")]
    Validation(String),
    /// Network-level failure. Never retried automatically: a blind retry on
    /// create/update could duplicate the write.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a failure status.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// The server answered but with a shape we could not interpret.
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("session expired; set EXPENSEFLOW_TOKEN to a fresh API token")]
    Unauthorized,
}

pub(crate) type StoreResult<T> = Result<T, StoreError>;

/// The remote expense store, specified at its interface only. Everything the
/// client knows about persistence goes through here, which is also what lets
/// the session and its tests run against an in-memory fake.
pub(crate) trait ExpenseStore: Send + Sync {
    fn list_expenses(&self, month: MonthKey) -> StoreResult<Vec<Expense>>;
    fn category_summary(&self, month: MonthKey) -> StoreResult<Vec<CategorySummaryRow>>;
    fn budget_overview(&self, month: MonthKey) -> StoreResult<OverviewPayload>;
    fn create_expense(&self, draft: &ExpenseDraft) -> StoreResult<()>;
    /// Full replace of category/amount/date/note.
    fn update_expense(&self, id: &str, draft: &ExpenseDraft) -> StoreResult<()>;
    fn delete_expense(&self, id: &str) -> StoreResult<()>;
    fn set_user_budget(&self, amount: Decimal) -> StoreResult<()>;
}

/// Everything one month's views need, fetched as a unit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthSnapshot {
    pub(crate) expenses: Vec<Expense>,
    pub(crate) summary: Vec<CategorySummaryRow>,
    pub(crate) payload: Option<OverviewPayload>,
}

/// Fetch the full snapshot for a month. A failing overview endpoint is
/// tolerated; the aggregation engine recomputes from the raw rows instead.
pub(crate) fn fetch_month(store: &dyn ExpenseStore, month: MonthKey) -> StoreResult<MonthSnapshot> {
    let mut expenses = store.list_expenses(month)?;
    // One snapshot never mixes months; a server that leaks rows from a
    // neighboring month must not corrupt the aggregate.
    let before = expenses.len();
    expenses.retain(|e| month.contains(e.occurred_on));
    if expenses.len() != before {
        log::warn!(
            "dropped {} expense row(s) outside {month}",
            before - expenses.len()
        );
    }
    let summary = store.category_summary(month)?;
    let payload = match store.budget_overview(month) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::warn!("overview endpoint failed for {month}, recomputing locally: {e}");
            None
        }
    };
    Ok(MonthSnapshot {
        expenses,
        summary,
        payload,
    })
}
