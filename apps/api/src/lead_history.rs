//! Lead History — per-case timeline view.
//!
//! The timeline is placeholder data: two fixed events stamped at request
//! time, with the customer name taken from the applicant contact passed in
//! the query string.

use axum::{
    extract::{Path, Query},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dashboard::routing::NavigationTarget;
use crate::errors::AppError;

const PLACEHOLDER_CUSTOMER_NAME: &str = "Customer Name";
const PLACEHOLDER_CUSTOMER_PHONE: &str = "Phone Number";
const PLACEHOLDER_CLIENT_NAME: &str = "Client Name";

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadHistoryParams {
    pub vehicle_number: Option<String>,
    pub applicant_contact: Option<String>,
    pub valuation_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub action: String,
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub customer_name: String,
    pub customer_phone: String,
    pub client_name: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadHistory {
    pub valuation_id: String,
    pub vehicle_number: Option<String>,
    pub applicant_contact: Option<String>,
    pub valuation_type: Option<String>,
    pub lead: Lead,
}

impl LeadHistory {
    pub fn from_params(valuation_id: &str, params: LeadHistoryParams, now: DateTime<Utc>) -> Self {
        let customer_name = params
            .applicant_contact
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_CUSTOMER_NAME.to_string());

        Self {
            valuation_id: valuation_id.to_string(),
            vehicle_number: params.vehicle_number,
            applicant_contact: params.applicant_contact,
            valuation_type: params.valuation_type,
            lead: Lead {
                customer_name,
                customer_phone: PLACEHOLDER_CUSTOMER_PHONE.to_string(),
                client_name: PLACEHOLDER_CLIENT_NAME.to_string(),
                history: vec![
                    HistoryEntry {
                        date: now,
                        action: "Lead Created".to_string(),
                        remarks: "Lead created through API".to_string(),
                    },
                    HistoryEntry {
                        date: now,
                        action: "Assigned".to_string(),
                        remarks: "Lead assigned to user".to_string(),
                    },
                ],
            },
        }
    }
}

/// Where "back" leads from the history view.
pub fn back_target() -> NavigationTarget {
    NavigationTarget::new(["dashboard"])
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadHistoryResponse {
    #[serde(flatten)]
    pub history: LeadHistory,
    pub back_to: String,
}

/// GET /api/v1/valuations/:id/lead-history
pub async fn handle_lead_history(
    Path(valuation_id): Path<String>,
    Query(params): Query<LeadHistoryParams>,
) -> Result<Json<LeadHistoryResponse>, AppError> {
    if valuation_id.trim().is_empty() {
        return Err(AppError::Validation("missing valuation id".to_string()));
    }
    Ok(Json(LeadHistoryResponse {
        history: LeadHistory::from_params(&valuation_id, params, Utc::now()),
        back_to: back_target().path(),
    }))
}
