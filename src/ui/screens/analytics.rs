use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;

use crate::overview::OverviewModel;
use crate::session::LoadState;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_percent, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(model) = app.session.model() else {
        render_placeholder(f, area, app);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Month summary header
            Constraint::Min(8),    // Share list + chart
        ])
        .split(area);

    render_header(f, chunks[0], model);

    if model.categories.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No spending data for this month yet.",
            theme::dim_style(),
        )))
        .centered()
        .block(bordered(" Spending by Category "));
        f.render_widget(msg, chunks[1]);
        return;
    }

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    render_share_list(f, halves[0], model);
    render_share_chart(f, halves[1], model);
}

fn render_placeholder(f: &mut Frame, area: Rect, app: &App) {
    let month = app.session.month();
    let text = if app.session.state() == LoadState::Failed {
        Span::styled(
            format!("Failed to load analytics for {month}."),
            Style::default().fg(theme::RED),
        )
    } else {
        Span::styled(format!("Loading analytics for {month}…"), theme::dim_style())
    };
    let msg = Paragraph::new(vec![Line::from(""), Line::from(text)])
        .centered()
        .block(bordered(" Analytics "));
    f.render_widget(msg, area);
}

fn render_header(f: &mut Frame, area: Rect, model: &OverviewModel) {
    let mut spending = vec![
        Span::styled("Total spending: ", theme::dim_style()),
        Span::styled(
            format_amount(model.total),
            Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
        ),
    ];
    if model.budget > rust_decimal::Decimal::ZERO {
        spending.push(Span::styled(
            format!(
                "   {}% of {} budget ({})",
                model.percentage,
                format_amount(model.budget),
                model.alert
            ),
            Style::default().fg(theme::alert_color(model.alert)),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spending)]).block(bordered(&format!(
        " Summary for {} ",
        model.month
    )));
    f.render_widget(header, area);
}

fn render_share_list(f: &mut Frame, area: Rect, model: &OverviewModel) {
    let items: Vec<ListItem> = model
        .categories
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|share| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<15}", share.category.as_str()), theme::normal_style()),
                Span::styled(
                    format!("{:>12} ", format_amount(share.total)),
                    theme::normal_style(),
                ),
                Span::styled(
                    format!("({})", format_percent(share.percentage)),
                    theme::dim_style(),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(bordered(" Spending by Category "));
    f.render_widget(list, area);
}

fn render_share_chart(f: &mut Frame, area: Rect, model: &OverviewModel) {
    let bars: Vec<Bar> = model
        .categories
        .iter()
        .take(12)
        .map(|share| {
            let val = share.total.to_u64().unwrap_or(0);
            Bar::default()
                .value(val)
                .label(Line::from(truncate(share.category.as_str(), 10)))
                .style(Style::default().fg(theme::ACCENT))
                .value_style(
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(bordered(" Category Distribution "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(Style::default().fg(theme::TEXT));

    f.render_widget(chart, area);
}

fn bordered(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(title.to_string(), theme::title_style()))
}
