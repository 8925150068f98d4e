//! Server-rendered form page at `/`, `/predict_power` and `/future`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::debug;

use super::error::ApiError;
use crate::domain::{ForecastResult, Horizon, ReadingForm};
use crate::forecast::PowerEstimation;
use crate::state::AppState;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// `/future` form body.
#[derive(Debug, Default, Deserialize)]
pub struct FutureForm {
    pub future_month: Option<String>,
}

/// Blocks substituted into the page template. Each is already HTML.
#[derive(Debug, Default)]
struct Page {
    error: Option<String>,
    result: Option<String>,
    future: Option<String>,
}

impl Page {
    fn render(&self) -> String {
        INDEX_TEMPLATE
            .replace("{{ error }}", self.error.as_deref().unwrap_or(""))
            .replace("{{ result }}", self.result.as_deref().unwrap_or(""))
            .replace("{{ future }}", self.future.as_deref().unwrap_or(""))
    }

    fn failed(error: ApiError) -> Response {
        let status = error.status_code();
        let page = Page {
            error: Some(format!(
                r#"<div class="error">{}</div>"#,
                escape_html(&error.client_message())
            )),
            ..Page::default()
        };
        (status, Html(page.render())).into_response()
    }
}

/// GET / - Empty form
pub async fn index() -> Html<String> {
    Html(Page::default().render())
}

/// POST /predict_power - Estimate power, usage and bill for one reading
pub async fn predict_power(
    State(state): State<AppState>,
    Form(form): Form<ReadingForm>,
) -> Response {
    let estimation = form
        .parse()
        .map_err(ApiError::from)
        .and_then(|reading| state.power.estimate(&reading).map_err(ApiError::from));

    match estimation {
        Ok(estimation) => {
            debug!(power_kw = estimation.power_kw, "power estimated");
            let page = Page {
                result: Some(power_block(&estimation)),
                ..Page::default()
            };
            (StatusCode::OK, Html(page.render())).into_response()
        }
        Err(e) => Page::failed(e),
    }
}

/// POST /future - Forecast consumption and bill for month N ahead
pub async fn future(State(state): State<AppState>, Form(form): Form<FutureForm>) -> Response {
    let forecast = Horizon::parse(
        form.future_month.as_deref(),
        state.cfg.models.max_horizon_months,
    )
    .map_err(ApiError::from)
    .and_then(|horizon| state.consumption.forecast(horizon).map_err(ApiError::from));

    match forecast {
        Ok(forecast) => {
            debug!(
                months = forecast.horizon_months,
                kwh = forecast.predicted_consumption_kwh,
                "consumption forecast"
            );
            let page = Page {
                future: Some(future_block(&forecast)),
                ..Page::default()
            };
            (StatusCode::OK, Html(page.render())).into_response()
        }
        Err(e) => Page::failed(e),
    }
}

fn power_block(estimation: &PowerEstimation) -> String {
    format!(
        concat!(
            r#"<div class="result">"#,
            "Predicted Power: {:.3} kW<br>\n",
            "Estimated Daily Usage: {} kWh<br>\n",
            "Estimated Monthly Usage: {} kWh<br>\n",
            "Estimated Monthly Bill: €{}<br><br>\n",
            "Recommendation: {}",
            "</div>"
        ),
        estimation.power_kw,
        plain_number(estimation.usage.daily_kwh),
        plain_number(estimation.usage.monthly_kwh),
        plain_number(estimation.usage.monthly_bill_eur),
        escape_html(estimation.recommendation.message()),
    )
}

fn future_block(forecast: &ForecastResult) -> String {
    format!(
        concat!(
            r#"<div class="result">"#,
            "Predicted Consumption for Month {}: {} kWh<br>\n",
            "Estimated Bill: €{}",
            "</div>"
        ),
        forecast.horizon_months,
        plain_number(forecast.predicted_consumption_kwh),
        plain_number(forecast.predicted_bill_eur),
    )
}

/// Shortest form of an already-rounded value, keeping one decimal on whole
/// numbers (`14.4`, `432.0`).
fn plain_number(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
