use std::str::FromStr;

use anyhow::Result;
use rust_decimal::Decimal;

use crate::models::{Budget, Expense, MonthKey};
use crate::overview;
use crate::store::{self, ExpenseStore};
use crate::ui::commands::parse_expense_args;
use crate::ui::util::{format_amount, format_percent};

pub(crate) fn as_cli(args: &[String], store: &dyn ExpenseStore) -> Result<()> {
    match args[1].as_str() {
        "summary" | "s" => cli_summary(&args[2..], store),
        "add" => cli_add(&args[2..], store),
        "budget" => cli_budget(&args[2..], store),
        "export" => cli_export(&args[2..], store),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("expenseflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("ExpenseFlow — terminal client for the ExpenseFlow API");
    println!();
    println!("Usage: expenseflow [command]");
    println!();
    println!("Commands:");
    println!("  (none)                          Launch interactive TUI");
    println!("  summary [YYYY-MM]               Print monthly overview (default: current month)");
    println!("  add [date] <category> <amount> [note]");
    println!("                                  Record an expense (date defaults to today)");
    println!("  budget <amount>                 Set monthly budget; 0 disables tracking");
    println!("  export [path]                   Export expenses to CSV");
    println!("    --month <YYYY-MM>             Month to export (default: current)");
    println!("  --help, -h                      Show this help");
    println!("  --version, -V                   Show version");
    println!();
    println!("Configuration: EXPENSEFLOW_API_URL and EXPENSEFLOW_TOKEN override the config file.");
}

fn cli_summary(args: &[String], store: &dyn ExpenseStore) -> Result<()> {
    let month = parse_month_arg(args.first())?;

    let snapshot = store::fetch_month(store, month)?;
    let budget = snapshot
        .payload
        .as_ref()
        .map(|p| p.budget)
        .unwrap_or_default();
    let mut model = overview::aggregate(month, &snapshot.expenses, &snapshot.summary, budget);
    if let Some(payload) = &snapshot.payload {
        model = overview::reconcile(model, payload);
    }

    println!("ExpenseFlow — {month}");
    println!("{}", "─".repeat(44));
    println!("  Total Spent: {:>12}", format_amount(model.total));
    if model.budget > Decimal::ZERO {
        println!(
            "  Budget:      {:>12}  ({}% used, {})",
            format_amount(model.budget),
            model.percentage,
            model.alert
        );
        if model.remaining < Decimal::ZERO {
            println!("  Over by:     {:>12}", format_amount(model.remaining.abs()));
        } else {
            println!("  Remaining:   {:>12}", format_amount(model.remaining));
        }
    } else {
        println!("  Budget:      not set");
    }
    println!("  Expenses:    {:>12}", snapshot.expenses.len());
    if let Some(gap) = model.integrity_gap {
        println!();
        println!(
            "  Warning: store summary differs from records by {}",
            format_amount(gap)
        );
    }

    if !model.categories.is_empty() {
        println!();
        println!("Spending by Category:");
        for share in &model.categories {
            println!(
                "  {:<16} {:>12}  {:>6}",
                share.category.as_str(),
                format_amount(share.total),
                format_percent(share.percentage)
            );
        }
    }

    Ok(())
}

fn cli_add(args: &[String], store: &dyn ExpenseStore) -> Result<()> {
    if args.is_empty() {
        anyhow::bail!("Usage: expenseflow add [YYYY-MM-DD] <category> <amount> [note]");
    }
    let today = chrono::Local::now().date_naive();
    let draft = parse_expense_args(&args.join(" "), today).map_err(anyhow::Error::msg)?;
    store.create_expense(&draft)?;
    println!(
        "Added {} {} on {}",
        draft.category,
        format_amount(draft.amount),
        draft.occurred_on
    );
    Ok(())
}

fn cli_budget(args: &[String], store: &dyn ExpenseStore) -> Result<()> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("Usage: expenseflow budget <amount>"))?;
    let amount =
        Decimal::from_str(raw).map_err(|_| anyhow::anyhow!("Bad budget amount '{raw}'"))?;
    let budget = Budget::new(amount).map_err(anyhow::Error::msg)?;
    store.set_user_budget(budget.amount())?;
    if budget.is_enabled() {
        println!("Budget set to {}", format_amount(budget.amount()));
    } else {
        println!("Budget tracking disabled");
    }
    Ok(())
}

fn cli_export(args: &[String], store: &dyn ExpenseStore) -> Result<()> {
    let month = match args.windows(2).find(|w| w[0] == "--month").map(|w| &w[1]) {
        Some(raw) => MonthKey::parse(raw)
            .ok_or_else(|| anyhow::anyhow!("Not a month: '{raw}' (expected YYYY-MM)"))?,
        None => MonthKey::current(),
    };

    // Output path is the first non-flag argument
    let output_path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/expenseflow-export-{month}.csv")
        });

    let expenses = store.list_expenses(month)?;
    if expenses.is_empty() {
        println!("No expenses for {month}");
        return Ok(());
    }
    let count = write_csv(&output_path, &expenses)?;
    println!("Exported {count} expenses to {output_path}");
    Ok(())
}

pub(crate) fn write_csv(path: &str, expenses: &[Expense]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["date", "category", "amount", "note"])?;
    for expense in expenses {
        writer.write_record([
            expense.occurred_on.to_string(),
            expense.category.as_str().to_string(),
            expense.amount.to_string(),
            expense.note.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(expenses.len())
}

fn parse_month_arg(arg: Option<&String>) -> Result<MonthKey> {
    match arg.filter(|a| !a.starts_with('-')) {
        Some(raw) => MonthKey::parse(raw)
            .ok_or_else(|| anyhow::anyhow!("Not a month: '{raw}' (expected YYYY-MM)")),
        None => Ok(MonthKey::current()),
    }
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::Category;

    fn sample_expenses() -> Vec<Expense> {
        vec![
            Expense {
                id: "1".into(),
                category: Category::Food,
                amount: dec!(12.50),
                occurred_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                note: Some("lunch".into()),
            },
            Expense {
                id: "2".into(),
                category: Category::Transport,
                amount: dec!(3.20),
                occurred_on: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
                note: None,
            },
        ]
    }

    #[test]
    fn test_write_csv_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let path_str = path.to_str().unwrap();

        let count = write_csv(path_str, &sample_expenses()).unwrap();
        assert_eq!(count, 2);

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert_eq!(lines.next().unwrap(), "date,category,amount,note");
        assert_eq!(lines.next().unwrap(), "2024-01-15,Food,12.50,lunch");
        assert_eq!(lines.next().unwrap(), "2024-01-16,Transport,3.20,");
    }

    #[test]
    fn test_shellexpand_home_prefix() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(shellexpand("~/out.csv"), "/home/tester/out.csv");
        assert_eq!(shellexpand("/tmp/out.csv"), "/tmp/out.csv");
    }
}
