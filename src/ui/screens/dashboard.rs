use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::overview::OverviewModel;
use crate::session::LoadState;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_percent, progress_bar, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(model) = app.session.model() else {
        render_placeholder(f, area, app);
        return;
    };

    let breakdown_height = (model.categories.len() as u16).clamp(1, 8) + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),                // Summary cards
            Constraint::Length(breakdown_height), // Category breakdown
            Constraint::Min(6),                   // Expense table
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app, model);
    render_breakdown(f, chunks[1], model);
    render_expense_table(f, chunks[2], app);
}

fn render_placeholder(f: &mut Frame, area: Rect, app: &App) {
    let month = app.session.month();
    let lines = if app.session.state() == LoadState::Failed {
        vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Failed to load {month}"),
                Style::default().fg(theme::RED).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                app.session.error().unwrap_or("unknown error").to_string(),
                theme::dim_style(),
            )),
            Line::from(""),
            Line::from(Span::styled(":refresh to retry", theme::dim_style())),
        ]
    } else {
        vec![
            Line::from(""),
            Line::from(Span::styled(format!("Loading {month}…"), theme::dim_style())),
        ]
    };
    let msg = Paragraph::new(lines).centered().block(bordered(" Dashboard "));
    f.render_widget(msg, area);
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App, model: &OverviewModel) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_total_card(f, cards[0], model);
    render_count_card(f, cards[1], app, model);
}

fn render_total_card(f: &mut Frame, area: Rect, model: &OverviewModel) {
    let alert_color = theme::alert_color(model.alert);
    let amount_color = if model.budget > Decimal::ZERO {
        alert_color
    } else {
        theme::TEXT
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format_amount(model.total),
            Style::default()
                .fg(amount_color)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    if model.budget > Decimal::ZERO {
        let remaining = if model.remaining < Decimal::ZERO {
            Span::styled(
                format!("Over by {}", format_amount(model.remaining.abs())),
                Style::default().fg(theme::RED).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                format!("Left: {}", format_amount(model.remaining)),
                theme::dim_style(),
            )
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(
                    "{}% of {} budget  ",
                    model.percentage,
                    format_amount(model.budget)
                ),
                theme::dim_style(),
            ),
            remaining,
        ]));
        let ratio = f64::from(model.percentage) / 100.0;
        lines.push(Line::from(Span::styled(
            progress_bar(ratio, 28),
            Style::default().fg(alert_color),
        )));
    } else {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "No budget set. Use :budget <amount> to track limits.",
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let card = Paragraph::new(lines)
        .centered()
        .block(bordered(" Total Spent "));
    f.render_widget(card, area);
}

fn render_count_card(f: &mut Frame, area: Rect, app: &App, model: &OverviewModel) {
    let count = app.session.expenses().len();
    let noun = if count == 1 { "expense" } else { "expenses" };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            count.to_string(),
            Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!("{noun} recorded"), theme::dim_style())),
    ];
    if let Some(gap) = model.integrity_gap {
        lines.push(Line::from(Span::styled(
            format!("store summary off by {}", format_amount(gap)),
            Style::default().fg(theme::YELLOW),
        )));
    }

    let card = Paragraph::new(lines)
        .centered()
        .block(bordered(" Transactions "));
    f.render_widget(card, area);
}

fn render_breakdown(f: &mut Frame, area: Rect, model: &OverviewModel) {
    if model.categories.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No data for this month",
            theme::dim_style(),
        )))
        .centered()
        .block(bordered(" Category Breakdown "));
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = model
        .categories
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|share| {
            let ratio = (share.percentage / Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0);
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<15}", share.category.as_str()), theme::normal_style()),
                Span::styled(format!("{:>12}  ", format_amount(share.total)), theme::dim_style()),
                Span::styled(progress_bar(ratio, 20), Style::default().fg(theme::ACCENT)),
                Span::styled(
                    format!(" {:>6}", format_percent(share.percentage)),
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(bordered(" Category Breakdown "));
    f.render_widget(list, area);
}

fn render_expense_table(f: &mut Frame, area: Rect, app: &App) {
    let expenses = app.visible_expenses();
    let title = if app.search_input.is_empty() {
        format!(" Expenses — {} ({}) ", app.session.month(), expenses.len())
    } else {
        format!(
            " Expenses — {} ({} matching '{}') ",
            app.session.month(),
            expenses.len(),
            app.search_input
        )
    };

    if expenses.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses found",
            theme::dim_style(),
        )))
        .centered()
        .block(bordered(&title));
        f.render_widget(msg, area);
        return;
    }

    let page = area.height.saturating_sub(3) as usize;
    let mut lines = vec![ListItem::new(Line::from(Span::styled(
        format!("{:<8} {:<15} {:<32} {:>12}", "Date", "Category", "Note", "Amount"),
        theme::dim_style(),
    )))];
    lines.extend(
        expenses
            .iter()
            .enumerate()
            .skip(app.expense_scroll)
            .take(page.max(1))
            .map(|(i, expense)| {
                let style = if i == app.expense_index {
                    theme::selected_style()
                } else if i % 2 == 0 {
                    theme::alt_row_style()
                } else {
                    theme::normal_style()
                };
                let note = expense.note.as_deref().unwrap_or("—");
                let date = expense.occurred_on.format("%b %d").to_string();
                ListItem::new(Line::from(Span::styled(
                    format!(
                        "{:<8} {:<15} {:<32} {:>12}",
                        date,
                        expense.category.as_str(),
                        truncate(note, 30),
                        format_amount(expense.amount),
                    ),
                    style,
                )))
            }),
    );

    let list = List::new(lines).block(bordered(&title));
    f.render_widget(list, area);
}

fn bordered(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(title.to_string(), theme::title_style()))
}
