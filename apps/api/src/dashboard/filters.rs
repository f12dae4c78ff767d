use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use crate::models::valuation::Valuation;

/// Date and status filters chosen on the dashboard.
///
/// `offset` is the "local time" in which a case's creation day is read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub filter_date: Option<NaiveDate>,
    pub selected_status: Option<String>,
    #[serde(skip)]
    pub offset: FixedOffset,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            filter_date: None,
            selected_status: None,
            offset: Utc.fix(),
        }
    }
}

impl FilterState {
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Selecting the active status again clears it.
    pub fn toggle_status(&mut self, status: &str) {
        if self.selected_status.as_deref() == Some(status) {
            self.selected_status = None;
        } else {
            self.selected_status = Some(status.to_string());
        }
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.filter_date = date;
    }

    pub fn matches(&self, valuation: &Valuation, now: DateTime<Utc>) -> bool {
        let matches_date = self
            .filter_date
            .map_or(true, |day| self.local_day(valuation, now) == day);
        let matches_status = self
            .selected_status
            .as_deref()
            .map_or(true, |status| valuation.status == status);
        matches_date && matches_status
    }

    /// Calendar day the case was created on, read in `offset`.
    fn local_day(&self, valuation: &Valuation, now: DateTime<Utc>) -> NaiveDate {
        let created = valuation.created_at_or(now);
        created.with_timezone(&self.offset).date_naive()
    }

    /// Re-derives the visible subset; input order is preserved.
    pub fn apply(&self, claims: &[Valuation], now: DateTime<Utc>) -> Vec<Valuation> {
        claims
            .iter()
            .filter(|v| self.matches(v, now))
            .cloned()
            .collect()
    }
}
