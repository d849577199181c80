use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::Category;

/// An expense row as held by the client: an immutable snapshot of what the
/// store returned. Mutation happens only through explicit edit (full replace)
/// or delete against the store.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expense {
    pub(crate) id: String,
    pub(crate) category: Category,
    pub(crate) amount: Decimal,
    pub(crate) occurred_on: NaiveDate,
    pub(crate) note: Option<String>,
}

/// User-entered expense data for create and edit. Validated before any
/// network call is made.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExpenseDraft {
    pub(crate) category: Category,
    pub(crate) amount: Decimal,
    pub(crate) occurred_on: NaiveDate,
    pub(crate) note: Option<String>,
}

impl ExpenseDraft {
    /// Amount must be strictly positive; an empty note collapses to None.
    pub(crate) fn new(
        category: Category,
        amount: Decimal,
        occurred_on: NaiveDate,
        note: Option<String>,
    ) -> Result<ExpenseDraft, String> {
        if amount <= Decimal::ZERO {
            return Err(format!("Amount must be a positive number, got {amount}"));
        }
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(ExpenseDraft {
            category,
            amount,
            occurred_on,
            note,
        })
    }
}

/// One row of the store's pre-aggregated per-category summary for a month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategorySummaryRow {
    pub(crate) category: Category,
    pub(crate) total: Decimal,
}

/// The server-precomputed slice of the monthly overview. Only the figures we
/// treat as authoritative are kept; derived fields are recomputed locally.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OverviewPayload {
    pub(crate) total: Decimal,
    pub(crate) budget: Decimal,
}
