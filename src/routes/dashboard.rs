//! Server-rendered dashboard over the same advisor as the JSON API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::advice::Advisor;
use crate::error::ApiError;
use crate::models::{
    parse_cycle_length, CycleInput, Notification, DEFAULT_CYCLE_LENGTH, MAX_CYCLE_LENGTH,
    MIN_CYCLE_LENGTH,
};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub last_period_start: Option<String>,
    // kept as text so a cleared number field reaches the handler
    pub cycle_length: Option<String>,
}

pub fn routes(advisor: Advisor) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .with_state(advisor)
}

pub async fn dashboard(
    State(advisor): State<Advisor>,
    Query(query): Query<DashboardQuery>,
) -> (StatusCode, Html<String>) {
    let raw_length = query.cycle_length.as_deref();
    let length_field = match raw_length.map(str::trim) {
        None | Some("") => DEFAULT_CYCLE_LENGTH.to_string(),
        Some(value) => value.to_string(),
    };

    let Some(start) = query.last_period_start.filter(|s| !s.trim().is_empty()) else {
        let default_start = first_of_month(advisor.today());
        let form = render_form(&default_start.to_string(), &length_field);
        return (StatusCode::OK, page(&form));
    };

    let form = render_form(&start, &length_field);
    match advise(&advisor, &start, raw_length).await {
        Ok(notification) => (
            StatusCode::OK,
            page(&format!("{form}{}", render_notification(&notification))),
        ),
        Err(e) => {
            e.log();
            let message = match &e {
                ApiError::Internal(_) => "Something went wrong on our side.".to_string(),
                _ => e.to_string(),
            };
            (
                e.status(),
                page(&format!(
                    "{form}<p class=\"error\">{}</p>",
                    escape_html(&message)
                )),
            )
        }
    }
}

async fn advise(
    advisor: &Advisor,
    start: &str,
    cycle_length: Option<&str>,
) -> Result<Notification, ApiError> {
    let input = CycleInput::parse(start, parse_cycle_length(cycle_length)?)?;
    Ok(advisor.notify(&input).await?)
}

fn first_of_month(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

fn page(body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>🍃 Cycle-Aware Wellness</title></head>\n<body>\n<h1>🍃 Cycle-Aware Wellness</h1>\n{body}\n</body>\n</html>\n"
    ))
}

fn render_form(start: &str, cycle_length: &str) -> String {
    format!(
        r#"<form method="get" action="/dashboard">
<h2>Your Cycle Info</h2>
<label>Last period start <input type="date" name="last_period_start" value="{}"></label>
<label>Cycle length <input type="number" name="cycle_length" min="{MIN_CYCLE_LENGTH}" max="{MAX_CYCLE_LENGTH}" value="{}"></label>
<button type="submit">Get My Advice</button>
</form>
"#,
        escape_html(start),
        escape_html(cycle_length)
    )
}

fn render_notification(n: &Notification) -> String {
    let mut out = format!(
        "<h2>📆 Day {} — {} Phase</h2>\n<div class=\"advice\">{}</div>\n",
        n.day_of_cycle,
        n.phase,
        render_text(&n.advice)
    );

    match &n.prep_tips {
        Some(tips) => out.push_str(&format!(
            "<p class=\"warning\">🔔 Upcoming: <strong>{}</strong> in <strong>{} days</strong></p>\n<div class=\"prep\">{}</div>\n",
            n.upcoming_phase,
            n.days_until_next,
            render_text(tips)
        )),
        None => out.push_str(&format!(
            "<p class=\"info\">Next phase <strong>{}</strong> in <strong>{} days</strong>. No prep-tips yet.</p>\n",
            n.upcoming_phase, n.days_until_next
        )),
    }

    out
}

fn render_text(text: &str) -> String {
    text.lines()
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
