use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ExpenseStore, StoreError, StoreResult};
use crate::models::{Category, CategorySummaryRow, Expense, ExpenseDraft, MonthKey, OverviewPayload};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for the ExpenseFlow HTTP API. One method per endpoint,
/// bearer-token auth, JSON in and out.
pub(crate) struct HttpStore {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpStore {
    pub(crate) fn new(base_url: &str, token: &str) -> StoreResult<HttpStore> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(HttpStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn execute(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(StoreError::Unauthorized);
        }
        let message = response
            .json::<ErrorBody>()
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| "Request failed".to_string());
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl ExpenseStore for HttpStore {
    fn list_expenses(&self, month: MonthKey) -> StoreResult<Vec<Expense>> {
        debug!("GET /expenses?month={month}");
        let response = self.execute(
            self.client
                .get(self.url(&format!("/expenses?month={month}"))),
        )?;
        let body: ExpenseListWire = response.json()?;
        body.expenses.into_iter().map(ExpenseWire::into_model).collect()
    }

    fn category_summary(&self, month: MonthKey) -> StoreResult<Vec<CategorySummaryRow>> {
        debug!("GET /expenses/summary?month={month}");
        let response = self.execute(
            self.client
                .get(self.url(&format!("/expenses/summary?month={month}"))),
        )?;
        let body: SummaryWire = response.json()?;
        Ok(body.summary.into_iter().map(SummaryRowWire::into_model).collect())
    }

    fn budget_overview(&self, month: MonthKey) -> StoreResult<OverviewPayload> {
        debug!("GET /expenses/summary/overview?month={month}");
        let response = self.execute(
            self.client
                .get(self.url(&format!("/expenses/summary/overview?month={month}"))),
        )?;
        let body: OverviewWire = response.json()?;
        Ok(OverviewPayload {
            total: body.total,
            budget: body.budget,
        })
    }

    fn create_expense(&self, draft: &ExpenseDraft) -> StoreResult<()> {
        debug!("POST /expenses ({}, {})", draft.category, draft.amount);
        self.execute(
            self.client
                .post(self.url("/expenses"))
                .json(&ExpensePayload::from(draft)),
        )?;
        Ok(())
    }

    fn update_expense(&self, id: &str, draft: &ExpenseDraft) -> StoreResult<()> {
        debug!("PATCH /expenses/{id}");
        self.execute(
            self.client
                .patch(self.url(&format!("/expenses/{id}")))
                .json(&ExpensePayload::from(draft)),
        )?;
        Ok(())
    }

    fn delete_expense(&self, id: &str) -> StoreResult<()> {
        debug!("DELETE /expenses/{id}");
        self.execute(self.client.delete(self.url(&format!("/expenses/{id}"))))?;
        Ok(())
    }

    fn set_user_budget(&self, amount: Decimal) -> StoreResult<()> {
        debug!("PATCH /auth/me (monthlyBudget={amount})");
        self.execute(
            self.client
                .patch(self.url("/auth/me"))
                .json(&BudgetPayload {
                    monthly_budget: amount,
                }),
        )?;
        Ok(())
    }
}

// ── Wire shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpenseListWire {
    #[serde(default)]
    expenses: Vec<ExpenseWire>,
}

/// The server emits Mongo-style `_id` on some deployments and `id` on
/// others; both are tolerated, `_id` wins when present.
#[derive(Debug, Deserialize)]
struct ExpenseWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    raw_id: Option<String>,
    category: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(rename = "occurredOn")]
    occurred_on: String,
    #[serde(default)]
    note: Option<String>,
}

impl ExpenseWire {
    fn into_model(self) -> StoreResult<Expense> {
        let id = self
            .raw_id
            .or(self.id)
            .ok_or_else(|| StoreError::Decode("expense row without an id".into()))?;
        Ok(Expense {
            id,
            category: Category::parse(&self.category),
            amount: self.amount,
            occurred_on: parse_wire_date(&self.occurred_on)?,
            note: self.note.filter(|n| !n.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SummaryWire {
    #[serde(default)]
    summary: Vec<SummaryRowWire>,
}

#[derive(Debug, Deserialize)]
struct SummaryRowWire {
    #[serde(default)]
    category: Option<String>,
    #[serde(default, rename = "_id")]
    raw_id: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
}

impl SummaryRowWire {
    fn into_model(self) -> CategorySummaryRow {
        let name = self.category.or(self.raw_id).unwrap_or_default();
        CategorySummaryRow {
            category: Category::parse(&name),
            total: self.total,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OverviewWire {
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    budget: Decimal,
}

#[derive(Debug, Serialize)]
struct ExpensePayload<'a> {
    category: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(rename = "occurredOn")]
    occurred_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

impl<'a> From<&'a ExpenseDraft> for ExpensePayload<'a> {
    fn from(draft: &'a ExpenseDraft) -> Self {
        ExpensePayload {
            category: draft.category.as_str(),
            amount: draft.amount,
            occurred_on: draft.occurred_on.format("%Y-%m-%d").to_string(),
            note: draft.note.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BudgetPayload {
    #[serde(rename = "monthlyBudget", with = "rust_decimal::serde::float")]
    monthly_budget: Decimal,
}

/// Dates arrive either bare ("2024-01-15") or as a full ISO timestamp
/// ("2024-01-15T00:00:00.000Z"); only the calendar date matters.
fn parse_wire_date(s: &str) -> StoreResult<NaiveDate> {
    let prefix = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|_| StoreError::Decode(format!("bad date: {s}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_expense_wire_prefers_underscore_id() {
        let wire: ExpenseWire = serde_json::from_str(
            r#"{"_id":"abc123","id":"other","category":"Food","amount":12.5,"occurredOn":"2024-01-15"}"#,
        )
        .unwrap();
        let expense = wire.into_model().unwrap();
        assert_eq!(expense.id, "abc123");
        assert_eq!(expense.category, Category::Food);
        assert_eq!(expense.amount, dec!(12.5));
        assert_eq!(expense.occurred_on.to_string(), "2024-01-15");
        assert!(expense.note.is_none());
    }

    #[test]
    fn test_expense_wire_accepts_iso_timestamp() {
        let wire: ExpenseWire = serde_json::from_str(
            r#"{"id":"x","category":"Transport","amount":7,"occurredOn":"2024-02-29T00:00:00.000Z","note":"bus"}"#,
        )
        .unwrap();
        let expense = wire.into_model().unwrap();
        assert_eq!(expense.occurred_on.to_string(), "2024-02-29");
        assert_eq!(expense.note.as_deref(), Some("bus"));
    }

    #[test]
    fn test_expense_wire_without_any_id_is_rejected() {
        let wire: ExpenseWire = serde_json::from_str(
            r#"{"category":"Food","amount":1,"occurredOn":"2024-01-01"}"#,
        )
        .unwrap();
        assert!(matches!(wire.into_model(), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_expense_wire_bad_date_is_rejected() {
        let wire: ExpenseWire = serde_json::from_str(
            r#"{"id":"x","category":"Food","amount":1,"occurredOn":"15/01/2024"}"#,
        )
        .unwrap();
        assert!(matches!(wire.into_model(), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_summary_row_wire_category_with_id_fallback() {
        let row: SummaryRowWire =
            serde_json::from_str(r#"{"_id":"Health","total":42}"#).unwrap();
        assert_eq!(row.into_model().category, Category::Health);

        let row: SummaryRowWire =
            serde_json::from_str(r#"{"category":"Shopping","total":10.01}"#).unwrap();
        let model = row.into_model();
        assert_eq!(model.category, Category::Shopping);
        assert_eq!(model.total, dec!(10.01));
    }

    #[test]
    fn test_summary_row_unknown_category_maps_to_other() {
        let row: SummaryRowWire =
            serde_json::from_str(r#"{"category":"Groceries","total":5}"#).unwrap();
        assert_eq!(row.into_model().category, Category::Other);
    }

    #[test]
    fn test_overview_wire_ignores_derived_fields() {
        let wire: OverviewWire = serde_json::from_str(
            r#"{"total":75,"budget":100,"remaining":25,"percentage":75,"alert":null}"#,
        )
        .unwrap();
        assert_eq!(wire.total, dec!(75));
        assert_eq!(wire.budget, dec!(100));
    }

    #[test]
    fn test_overview_wire_missing_budget_defaults_to_zero() {
        let wire: OverviewWire = serde_json::from_str(r#"{"total":0}"#).unwrap();
        assert_eq!(wire.budget, Decimal::ZERO);
    }

    #[test]
    fn test_expense_payload_wire_shape() {
        let draft = ExpenseDraft::new(
            Category::Bills,
            dec!(99.99),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Some("rent".into()),
        )
        .unwrap();
        let value = serde_json::to_value(ExpensePayload::from(&draft)).unwrap();
        assert_eq!(value["category"], "Bills");
        assert_eq!(value["occurredOn"], "2024-03-01");
        assert_eq!(value["note"], "rent");
        assert!((value["amount"].as_f64().unwrap() - 99.99).abs() < 1e-9);
    }

    #[test]
    fn test_expense_payload_omits_empty_note() {
        let draft = ExpenseDraft::new(
            Category::Food,
            dec!(1),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            None,
        )
        .unwrap();
        let value = serde_json::to_value(ExpensePayload::from(&draft)).unwrap();
        assert!(value.get("note").is_none());
    }

    #[test]
    fn test_budget_payload_wire_shape() {
        let value = serde_json::to_value(BudgetPayload {
            monthly_budget: dec!(500),
        })
        .unwrap();
        assert!(value.get("monthlyBudget").is_some());
    }
}
