#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::models::{Category, CategorySummaryRow, Expense, MonthKey, OverviewPayload};

fn month() -> MonthKey {
    MonthKey::parse("2024-01").unwrap()
}

fn expense(category: Category, amount: Decimal) -> Expense {
    Expense {
        id: format!("{category}-{amount}"),
        category,
        amount,
        occurred_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        note: None,
    }
}

fn row(category: Category, total: Decimal) -> CategorySummaryRow {
    CategorySummaryRow { category, total }
}

// ── Concrete scenario ─────────────────────────────────────────

#[test]
fn test_concrete_scenario() {
    let expenses = [
        expense(Category::Food, dec!(40)),
        expense(Category::Food, dec!(10)),
        expense(Category::Transport, dec!(25)),
    ];
    let model = aggregate(month(), &expenses, &[], dec!(100));

    assert_eq!(model.total, dec!(75));
    assert_eq!(model.percentage, 75);
    assert_eq!(model.remaining, dec!(25));
    assert_eq!(model.alert, AlertLevel::None);
    assert_eq!(model.categories.len(), 2);
    assert_eq!(model.categories[0].category, Category::Food);
    assert_eq!(model.categories[0].total, dec!(50));
    assert_eq!(model.categories[0].percentage, dec!(66.7));
    assert_eq!(model.categories[1].category, Category::Transport);
    assert_eq!(model.categories[1].total, dec!(25));
    assert_eq!(model.categories[1].percentage, dec!(33.3));
}

#[test]
fn test_concrete_scenario_lowered_budget_goes_over_limit() {
    let expenses = [
        expense(Category::Food, dec!(40)),
        expense(Category::Food, dec!(10)),
        expense(Category::Transport, dec!(25)),
    ];
    let model = aggregate(month(), &expenses, &[], dec!(70));

    assert_eq!(model.percentage, 107);
    assert_eq!(model.remaining, dec!(-5));
    assert_eq!(model.alert, AlertLevel::OverLimit);
}

// ── Invariants ────────────────────────────────────────────────

#[test]
fn test_category_totals_sum_to_total() {
    let expenses = [
        expense(Category::Food, dec!(33.33)),
        expense(Category::Bills, dec!(0.01)),
        expense(Category::Health, dec!(199.99)),
        expense(Category::Food, dec!(7.41)),
    ];
    let model = aggregate(month(), &expenses, &[], dec!(500));
    let sum: Decimal = model.categories.iter().map(|c| c.total).sum();
    assert!((sum - model.total).abs() <= dec!(0.01));
}

#[test]
fn test_zero_budget_disables_tracking() {
    let expenses = [expense(Category::Food, dec!(9999))];
    let model = aggregate(month(), &expenses, &[], Decimal::ZERO);
    assert_eq!(model.percentage, 0);
    assert_eq!(model.alert, AlertLevel::None);
    assert_eq!(model.remaining, Decimal::ZERO);
    // Category shares are unaffected by the missing budget.
    assert_eq!(model.categories[0].percentage, dec!(100.0));
}

#[test]
fn test_empty_month_with_budget() {
    let model = aggregate(month(), &[], &[], dec!(300));
    assert_eq!(model.total, Decimal::ZERO);
    assert_eq!(model.percentage, 0);
    assert_eq!(model.alert, AlertLevel::None);
    assert_eq!(model.remaining, dec!(300));
    assert!(model.categories.is_empty());
}

#[test]
fn test_monotonicity_raising_one_category() {
    let base = [
        expense(Category::Food, dec!(40)),
        expense(Category::Transport, dec!(60)),
    ];
    let bumped = [
        expense(Category::Food, dec!(55)),
        expense(Category::Transport, dec!(60)),
    ];
    let before = aggregate(month(), &base, &[], dec!(200));
    let after = aggregate(month(), &bumped, &[], dec!(200));

    assert!(after.total >= before.total);
    let share = |m: &OverviewModel| {
        m.categories
            .iter()
            .find(|c| c.category == Category::Food)
            .map(|c| c.percentage)
            .unwrap()
    };
    assert!(share(&after) >= share(&before));
}

#[test]
fn test_edit_shifts_total_by_exact_delta() {
    let before = [
        expense(Category::Food, dec!(40)),
        expense(Category::Shopping, dec!(120)),
    ];
    let after = [
        expense(Category::Food, dec!(52.25)),
        expense(Category::Shopping, dec!(120)),
    ];
    let m1 = aggregate(month(), &before, &[], dec!(500));
    let m2 = aggregate(month(), &after, &[], dec!(500));

    assert_eq!(m2.total - m1.total, dec!(12.25));
    let shopping = |m: &OverviewModel| {
        m.categories
            .iter()
            .find(|c| c.category == Category::Shopping)
            .map(|c| c.total)
            .unwrap()
    };
    assert_eq!(shopping(&m1), shopping(&m2));
}

// ── Alert thresholds ──────────────────────────────────────────

#[test]
fn test_threshold_boundaries() {
    let cases = [
        (dec!(79), 79, AlertLevel::None),
        (dec!(80), 80, AlertLevel::Warning),
        (dec!(99), 99, AlertLevel::Warning),
        (dec!(100), 100, AlertLevel::OverLimit),
        (dec!(150), 150, AlertLevel::OverLimit),
    ];
    for (spent, percentage, expected) in cases {
        let expenses = [expense(Category::Bills, spent)];
        let model = aggregate(month(), &expenses, &[], dec!(100));
        assert_eq!(model.percentage, percentage);
        assert_eq!(model.alert, expected, "spent {spent} of 100");
    }
}

#[test]
fn test_percentage_rounds_half_away_from_zero() {
    // 107.5% rounds up to 108, not to even.
    let expenses = [expense(Category::Food, dec!(107.5))];
    let model = aggregate(month(), &expenses, &[], dec!(100));
    assert_eq!(model.percentage, 108);
}

// ── Source selection ──────────────────────────────────────────

#[test]
fn test_summary_is_authoritative_when_present() {
    // Raw rows disagree on purpose; the summary must drive, not both.
    let expenses = [expense(Category::Food, dec!(10))];
    let summary = [row(Category::Food, dec!(30)), row(Category::Health, dec!(20))];
    let model = aggregate(month(), &expenses, &summary, dec!(100));

    assert_eq!(model.total, dec!(50));
    assert_eq!(model.categories.len(), 2);
    assert_eq!(model.categories[0].total, dec!(30));
}

#[test]
fn test_raw_rows_are_the_fallback() {
    let expenses = [
        expense(Category::Food, dec!(10)),
        expense(Category::Food, dec!(5)),
    ];
    let model = aggregate(month(), &expenses, &[], dec!(0));
    assert_eq!(model.total, dec!(15));
    assert_eq!(model.categories.len(), 1);
}

#[test]
fn test_zero_total_summary_rows_are_dropped() {
    let summary = [row(Category::Food, dec!(25)), row(Category::Bills, Decimal::ZERO)];
    let model = aggregate(month(), &[], &summary, dec!(0));
    assert_eq!(model.categories.len(), 1);
    assert_eq!(model.categories[0].category, Category::Food);
}

// ── Ordering ──────────────────────────────────────────────────

#[test]
fn test_categories_sorted_descending_with_name_tiebreak() {
    let summary = [
        row(Category::Transport, dec!(20)),
        row(Category::Food, dec!(20)),
        row(Category::Shopping, dec!(80)),
    ];
    let model = aggregate(month(), &[], &summary, dec!(0));
    let order: Vec<_> = model.categories.iter().map(|c| c.category).collect();
    assert_eq!(
        order,
        vec![Category::Shopping, Category::Food, Category::Transport]
    );
}

// ── Reconciliation ────────────────────────────────────────────

#[test]
fn test_reconcile_agreeing_totals_sets_no_gap() {
    let expenses = [expense(Category::Food, dec!(75))];
    let model = aggregate(month(), &expenses, &[], dec!(100));
    let payload = OverviewPayload {
        total: dec!(75),
        budget: dec!(100),
    };
    let model = reconcile(model, &payload);
    assert!(model.integrity_gap.is_none());
    assert_eq!(model.total, dec!(75));
}

#[test]
fn test_reconcile_store_total_wins_and_flags_gap() {
    let expenses = [expense(Category::Food, dec!(75))];
    let model = aggregate(month(), &expenses, &[], dec!(100));
    let payload = OverviewPayload {
        total: dec!(90),
        budget: dec!(100),
    };
    let model = reconcile(model, &payload);
    assert_eq!(model.integrity_gap, Some(dec!(15)));
    assert_eq!(model.total, dec!(90));
    assert_eq!(model.remaining, dec!(10));
    assert_eq!(model.percentage, 90);
    assert_eq!(model.alert, AlertLevel::Warning);
}

#[test]
fn test_reconcile_sub_cent_drift_is_not_flagged() {
    let expenses = [expense(Category::Food, dec!(75))];
    let model = aggregate(month(), &expenses, &[], dec!(100));
    let payload = OverviewPayload {
        total: dec!(75.005),
        budget: dec!(100),
    };
    let model = reconcile(model, &payload);
    assert!(model.integrity_gap.is_none());
    // Store value still adopted, just not treated as an integrity signal.
    assert_eq!(model.total, dec!(75.005));
}

#[test]
fn test_alert_level_policy() {
    assert_eq!(AlertLevel::for_percentage(0), AlertLevel::None);
    assert_eq!(AlertLevel::for_percentage(79), AlertLevel::None);
    assert_eq!(AlertLevel::for_percentage(80), AlertLevel::Warning);
    assert_eq!(AlertLevel::for_percentage(99), AlertLevel::Warning);
    assert_eq!(AlertLevel::for_percentage(100), AlertLevel::OverLimit);
    assert_eq!(AlertLevel::for_percentage(400), AlertLevel::OverLimit);
}
