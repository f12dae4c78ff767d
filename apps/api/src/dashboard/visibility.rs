//! Visibility engine — drops cases whose current step the user may not touch
//! and orders the rest newest first.

use chrono::{DateTime, Utc};

use crate::models::valuation::{Valuation, WorkflowStep};
use crate::session::PermissionChecker;

pub fn can_view_step(step: WorkflowStep, permissions: &dyn PermissionChecker) -> bool {
    permissions.has_any_permission(&step.required_permissions())
}

/// Applies the step-permission filter, then sorts by `createdAt` descending.
/// A missing timestamp sorts as `now`. The sort is stable.
pub fn visible_claims(
    raw: Vec<Valuation>,
    permissions: &dyn PermissionChecker,
    now: DateTime<Utc>,
) -> Vec<Valuation> {
    let mut kept: Vec<Valuation> = raw
        .into_iter()
        .filter(|v| can_view_step(v.current_step(), permissions))
        .collect();
    kept.sort_by(|a, b| b.created_at_or(now).cmp(&a.created_at_or(now)));
    kept
}
