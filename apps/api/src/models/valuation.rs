use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status values the dashboard offers as filter chips.
pub const STATUS_OPTIONS: [&str; 4] = ["Open", "InProgress", "Inspection Completed", "Rejected"];

/// A vehicle-valuation case. Written by the claim service; only read here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub valuation_id: String,
    #[serde(default)]
    pub vehicle_number: Option<String>,
    #[serde(default)]
    pub applicant_contact: Option<String>,
    #[serde(default)]
    pub valuation_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub workflow_step_order: Option<i32>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub adjuster_phone: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Valuation {
    /// Step the case currently sits at. Recomputed on every call.
    pub fn current_step(&self) -> WorkflowStep {
        WorkflowStep::from_order(self.workflow_step_order)
    }

    /// Creation time, with a missing timestamp read as `now`.
    pub fn created_at_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.created_at.unwrap_or(now)
    }

    /// Whole days since creation; 0 when the timestamp is missing.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at_or(now)).num_days()
    }

    pub fn row_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.valuation_id,
            self.vehicle_number.as_deref().unwrap_or_default(),
            self.applicant_contact.as_deref().unwrap_or_default()
        )
    }
}

/// The fixed five-step valuation workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStep {
    Stakeholder,
    BackEnd,
    #[serde(rename = "AVO")]
    Avo,
    #[serde(rename = "QC")]
    Qc,
    FinalReport,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 5] = [
        WorkflowStep::Stakeholder,
        WorkflowStep::BackEnd,
        WorkflowStep::Avo,
        WorkflowStep::Qc,
        WorkflowStep::FinalReport,
    ];

    /// Zero-based step index for a 1-based `workflowStepOrder`, clamped into
    /// the workflow. A missing order counts as the first step.
    pub fn index_for_order(order: Option<i32>) -> usize {
        let idx = i64::from(order.unwrap_or(1)) - 1;
        idx.clamp(0, (Self::ALL.len() - 1) as i64) as usize
    }

    pub fn from_order(order: Option<i32>) -> Self {
        Self::ALL[Self::index_for_order(order)]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::Stakeholder => "Stakeholder",
            WorkflowStep::BackEnd => "BackEnd",
            WorkflowStep::Avo => "AVO",
            WorkflowStep::Qc => "QC",
            WorkflowStep::FinalReport => "FinalReport",
        }
    }

    /// Route segment of the screen that works this step.
    pub fn path_segment(self) -> &'static str {
        match self {
            WorkflowStep::Stakeholder => "stakeholder",
            WorkflowStep::BackEnd => "vehicle-details",
            WorkflowStep::Avo => "inspection",
            WorkflowStep::Qc => "quality-control",
            WorkflowStep::FinalReport => "final-report",
        }
    }

    /// View/create/edit permissions for the step's domain. Holding any one
    /// of them makes cases at this step visible.
    pub fn required_permissions(self) -> [&'static str; 3] {
        match self {
            WorkflowStep::Stakeholder => [
                "CanViewStakeholder",
                "CanCreateStakeholder",
                "CanEditStakeholder",
            ],
            WorkflowStep::BackEnd => [
                "CanViewVehicleDetails",
                "CanCreateVehicleDetails",
                "CanEditVehicleDetails",
            ],
            WorkflowStep::Avo => [
                "CanViewInspection",
                "CanCreateInspection",
                "CanEditInspection",
            ],
            WorkflowStep::Qc => [
                "CanViewQualityControl",
                "CanCreateQualityControl",
                "CanEditQualityControl",
            ],
            WorkflowStep::FinalReport => [
                "CanViewFinalReport",
                "CanCreateFinalReport",
                "CanEditFinalReport",
            ],
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_step_index_clamps() {
        assert_eq!(WorkflowStep::index_for_order(Some(0)), 0);
        assert_eq!(WorkflowStep::index_for_order(Some(1)), 0);
        assert_eq!(WorkflowStep::index_for_order(Some(5)), 4);
        assert_eq!(WorkflowStep::index_for_order(Some(99)), 4);
        assert_eq!(WorkflowStep::index_for_order(Some(-7)), 0);
        assert_eq!(WorkflowStep::index_for_order(Some(i32::MIN)), 0);
        assert_eq!(WorkflowStep::index_for_order(None), 0);
    }

    #[test]
    fn test_step_index_is_idempotent() {
        for order in [-3, 0, 1, 2, 3, 4, 5, 6, 99] {
            let idx = WorkflowStep::index_for_order(Some(order));
            let again = WorkflowStep::index_for_order(Some(idx as i32 + 1));
            assert_eq!(idx, again);
        }
    }

    #[test]
    fn test_order_three_is_avo_step() {
        assert_eq!(WorkflowStep::from_order(Some(3)), WorkflowStep::Avo);
        assert_eq!(WorkflowStep::from_order(Some(4)), WorkflowStep::Qc);
    }

    #[test]
    fn test_step_names_match_serialized_form() {
        for step in WorkflowStep::ALL {
            let json = serde_json::to_value(step).unwrap();
            assert_eq!(json, step.as_str());
            assert_eq!(step.to_string(), step.as_str());
        }
    }

    #[test]
    fn test_every_step_has_distinct_permissions() {
        let mut seen = std::collections::HashSet::new();
        for step in WorkflowStep::ALL {
            for perm in step.required_permissions() {
                assert!(seen.insert(perm), "duplicate permission {perm}");
            }
        }
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn test_age_in_days_defaults_to_zero() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let mut v = fixtures::valuation("V1", Some(1), None);
        assert_eq!(v.age_in_days(now), 0);
        v.created_at = Some(Utc.with_ymd_and_hms(2024, 3, 7, 13, 0, 0).unwrap());
        assert_eq!(v.age_in_days(now), 2);
    }

    #[test]
    fn test_row_key_tolerates_missing_fields() {
        let mut v = fixtures::valuation("V9", None, None);
        v.vehicle_number = None;
        assert_eq!(v.row_key(), "V9::9000000001");
    }

    #[test]
    fn test_valuation_deserializes_sparse_record() {
        let json = serde_json::json!({ "valuationId": "V1" });
        let v: Valuation = serde_json::from_value(json).unwrap();
        assert_eq!(v.current_step(), WorkflowStep::Stakeholder);
        assert!(v.created_at.is_none());
        assert_eq!(v.status, "");
    }
}
