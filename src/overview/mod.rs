use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Category, CategorySummaryRow, Expense, MonthKey, OverviewPayload};

/// Coarse budget-health classification driving UI urgency cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AlertLevel {
    None,
    Warning,
    OverLimit,
}

impl AlertLevel {
    /// Fixed policy: 100% of budget and above is over-limit, 80% and above
    /// is a warning.
    pub(crate) fn for_percentage(percentage: u32) -> AlertLevel {
        if percentage >= 100 {
            AlertLevel::OverLimit
        } else if percentage >= 80 {
            AlertLevel::Warning
        } else {
            AlertLevel::None
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Warning => "WARNING",
            Self::OverLimit => "OVERLIMIT",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One category's slice of the month, with its share of the total to one
/// decimal place.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryShare {
    pub(crate) category: Category,
    pub(crate) total: Decimal,
    pub(crate) percentage: Decimal,
}

/// The derived monthly aggregate every view consumes. Never persisted;
/// rebuilt from a fresh input snapshot on every publication.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OverviewModel {
    pub(crate) month: MonthKey,
    pub(crate) total: Decimal,
    pub(crate) budget: Decimal,
    /// budget - total; may be negative. Meaningful only when budget > 0.
    pub(crate) remaining: Decimal,
    /// Whole-percent budget gauge, unbounded above 100. 0 when budget is 0.
    pub(crate) percentage: u32,
    pub(crate) alert: AlertLevel,
    /// Sorted by descending total, ties by category name ascending.
    pub(crate) categories: Vec<CategoryShare>,
    /// Set when the store's precomputed total disagrees with the total
    /// derived from rows beyond one minor currency unit. Non-fatal: the
    /// store stays authoritative, this records the gap.
    pub(crate) integrity_gap: Option<Decimal>,
}

/// One minor currency unit: totals agreeing within this are considered equal.
fn tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Build the monthly overview from one consistent snapshot.
///
/// The store-provided summary is authoritative when non-empty; raw expense
/// rows are the fallback so the two sources are never double-counted. The
/// caller guarantees every expense falls within `month`. Total over its
/// input space: zero totals and zero budgets take defined branches, nothing
/// here can fail at runtime.
pub(crate) fn aggregate(
    month: MonthKey,
    expenses: &[Expense],
    summary: &[CategorySummaryRow],
    budget: Decimal,
) -> OverviewModel {
    let rows = category_totals(expenses, summary);
    let total: Decimal = rows.iter().map(|(_, amount)| *amount).sum();

    let mut categories: Vec<CategoryShare> = rows
        .into_iter()
        .map(|(category, cat_total)| CategoryShare {
            category,
            total: cat_total,
            percentage: if total > Decimal::ZERO {
                (cat_total / total * Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            } else {
                Decimal::ZERO
            },
        })
        .collect();
    categories.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });

    let (remaining, percentage, alert) = budget_gauge(total, budget);

    OverviewModel {
        month,
        total,
        budget,
        remaining,
        percentage,
        alert,
        categories,
        integrity_gap: None,
    }
}

/// Cross-check a derived model against the store's precomputed payload.
///
/// The store total wins whenever the two disagree; a gap beyond one minor
/// currency unit is flagged as an integrity signal (it usually means the
/// rows and the summary came from racing snapshots). Category shares keep
/// their derived denominators.
pub(crate) fn reconcile(mut model: OverviewModel, payload: &OverviewPayload) -> OverviewModel {
    let gap = (payload.total - model.total).abs();
    if gap > tolerance() {
        model.integrity_gap = Some(gap);
    }
    if payload.total != model.total {
        model.total = payload.total;
        let (remaining, percentage, alert) = budget_gauge(model.total, model.budget);
        model.remaining = remaining;
        model.percentage = percentage;
        model.alert = alert;
    }
    model
}

/// Per-category totals from whichever source drives: the store summary when
/// present, otherwise the raw rows.
fn category_totals(
    expenses: &[Expense],
    summary: &[CategorySummaryRow],
) -> Vec<(Category, Decimal)> {
    let mut totals: BTreeMap<Category, Decimal> = BTreeMap::new();
    if summary.is_empty() {
        for expense in expenses {
            *totals.entry(expense.category).or_insert(Decimal::ZERO) += expense.amount;
        }
    } else {
        for row in summary {
            *totals.entry(row.category).or_insert(Decimal::ZERO) += row.total;
        }
    }
    totals
        .into_iter()
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .collect()
}

fn budget_gauge(total: Decimal, budget: Decimal) -> (Decimal, u32, AlertLevel) {
    if budget <= Decimal::ZERO {
        // Tracking disabled: not "0% used", simply no gauge at all.
        return (Decimal::ZERO, 0, AlertLevel::None);
    }
    let remaining = budget - total;
    let percentage = (total / budget * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX);
    (remaining, percentage, AlertLevel::for_percentage(percentage))
}

#[cfg(test)]
mod tests;
