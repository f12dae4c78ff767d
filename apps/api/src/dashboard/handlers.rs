//! Axum route handlers for the Dashboard API.

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::dashboard::filters::FilterState;
use crate::dashboard::pipeline::{Activation, DashboardView, SessionKey};
use crate::dashboard::routing::{
    current_step_target, lead_history_target, navigate_to_current, open_case, NavigationTarget,
    Navigator,
};
use crate::errors::{AppError, ErrorBody};
use crate::models::user::User;
use crate::models::valuation::{Valuation, WorkflowStep, STATUS_OPTIONS};
use crate::session::auth_client::bearer_token;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub date: Option<String>,
    pub status: Option<String>,
    pub tz_offset_minutes: Option<i32>,
}

/// Filters asked for by one request, applied once the view has loaded.
#[derive(Debug, PartialEq)]
struct RequestedFilters {
    offset: FixedOffset,
    date: Option<NaiveDate>,
    status: Option<String>,
}

impl DashboardQuery {
    fn into_requested(self, default_offset: FixedOffset) -> Result<RequestedFilters, AppError> {
        let offset = match self.tz_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    AppError::Validation(format!("tzOffsetMinutes out of range: {minutes}"))
                })?,
            None => default_offset,
        };

        let date = match self.date.as_deref().filter(|d| !d.is_empty()) {
            Some(raw) => {
                let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    AppError::Validation(format!("date must be YYYY-MM-DD, got '{raw}'"))
                })?;
                Some(day)
            }
            None => None,
        };

        Ok(RequestedFilters {
            offset,
            date,
            status: self.status.filter(|s| !s.is_empty()),
        })
    }
}

impl RequestedFilters {
    fn apply_to(self, view: &mut DashboardView) {
        view.set_date_filter(self.date);
        if let Some(status) = self.status {
            view.set_status_filter(&status);
        }
    }
}

/// One table row: the case plus values derived from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    #[serde(flatten)]
    pub valuation: Valuation,
    pub current_step: WorkflowStep,
    pub age_in_days: i64,
    pub row_key: String,
    pub open_href: String,
    pub history_href: String,
}

impl DashboardRow {
    fn new(valuation: Valuation, now: DateTime<Utc>) -> Self {
        Self {
            current_step: valuation.current_step(),
            age_in_days: valuation.age_in_days(now),
            row_key: valuation.row_key(),
            open_href: current_step_target(&valuation).href(),
            history_href: lead_history_target(&valuation).href(),
            valuation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub claims: Vec<DashboardRow>,
    pub total_visible: usize,
    pub current_user: Option<User>,
    pub filters: FilterState,
    pub statuses: [&'static str; 4],
    pub error: Option<ErrorBody>,
}

impl From<DashboardView> for DashboardResponse {
    fn from(view: DashboardView) -> Self {
        let now = view.now;
        Self {
            total_visible: view.claims.len(),
            claims: view
                .filtered_claims
                .into_iter()
                .map(|v| DashboardRow::new(v, now))
                .collect(),
            current_user: view.current_user,
            filters: view.filters,
            statuses: STATUS_OPTIONS,
            error: view.error.map(|e| e.to_body()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    CurrentStep,
    LeadHistory,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub valuation: Valuation,
    pub destination: Destination,
}

#[derive(Debug, Serialize)]
pub struct NavigateResponse {
    pub path: String,
    pub url: String,
    pub target: NavigationTarget,
}

/// Navigator that hands the target back to the HTTP caller.
#[derive(Default)]
struct ResponseNavigator(std::sync::Mutex<Option<NavigationTarget>>);

impl Navigator for ResponseNavigator {
    fn navigate(&self, target: NavigationTarget) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(target);
        }
    }
}

impl ResponseNavigator {
    fn into_target(self) -> Option<NavigationTarget> {
        self.0.into_inner().ok().flatten()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/dashboard
///
/// Runs one dashboard activation for the bearer's session. Failures of the
/// pipeline are reported inside the view (`error`), not as HTTP errors.
pub async fn handle_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    let requested = params.into_requested(state.config.local_offset())?;
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let bearer = bearer_token(header);

    // Dropped when this request ends, which also cancels an abandoned pipeline.
    let activation = match bearer {
        Some(token) => state.views.begin(SessionKey::from_bearer(token)),
        None => Activation::detached(),
    };

    let filters = FilterState::with_offset(requested.offset);
    let cancel = activation.token();
    let view = DashboardView::activate(&state.collaborators, bearer, filters, cancel).await;

    match view {
        Some(mut view) => {
            requested.apply_to(&mut view);
            Ok(Json(DashboardResponse::from(view)).into_response())
        }
        None => {
            info!("Dashboard request superseded by a newer one for the same session");
            Ok((
                StatusCode::CONFLICT,
                Json(json!({
                    "error": {
                        "code": "SUPERSEDED",
                        "message": "A newer dashboard request replaced this one"
                    }
                })),
            )
                .into_response())
        }
    }
}

/// POST /api/v1/dashboard/navigate
///
/// Builds the route for "open this case" from a dashboard row.
pub async fn handle_navigate(
    Json(request): Json<NavigateRequest>,
) -> Result<Json<NavigateResponse>, AppError> {
    if request.valuation.valuation_id.trim().is_empty() {
        return Err(AppError::Validation("valuationId is required".to_string()));
    }

    let navigator = ResponseNavigator::default();
    match request.destination {
        Destination::CurrentStep => navigate_to_current(&request.valuation, &navigator),
        Destination::LeadHistory => open_case(&request.valuation, &navigator),
    }
    let target = navigator
        .into_target()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("navigator produced no target")))?;

    Ok(Json(NavigateResponse {
        path: target.path(),
        url: target.href(),
        target,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    #[test]
    fn test_query_into_requested_filters() {
        let query = DashboardQuery {
            date: Some("2024-06-09".to_string()),
            status: Some("Open".to_string()),
            tz_offset_minutes: Some(330),
        };
        let requested = query.into_requested(Utc.fix()).unwrap();
        assert_eq!(requested.date, NaiveDate::from_ymd_opt(2024, 6, 9));
        assert_eq!(requested.status.as_deref(), Some("Open"));
        assert_eq!(requested.offset.local_minus_utc(), 330 * 60);
    }

    #[test]
    fn test_blank_query_values_mean_no_filter() {
        let query = DashboardQuery {
            date: Some(String::new()),
            status: Some(String::new()),
            tz_offset_minutes: None,
        };
        let requested = query.into_requested(Utc.fix()).unwrap();
        let expected = RequestedFilters {
            offset: Utc.fix(),
            date: None,
            status: None,
        };
        assert_eq!(requested, expected);
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let query = DashboardQuery {
            date: Some("09/06/2024".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            query.into_requested(Utc.fix()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_out_of_range_offset_is_rejected() {
        let query = DashboardQuery {
            tz_offset_minutes: Some(24 * 60),
            ..Default::default()
        };
        assert!(query.into_requested(Utc.fix()).is_err());
    }
}
