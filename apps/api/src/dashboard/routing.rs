//! Route construction for "open this case".
//!
//! Two targets per valuation: the screen for its current workflow step, and
//! the lead-history view (independent of step).

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::models::valuation::Valuation;

const VALUATION_ROOT: &str = "valuation";
const LEAD_HISTORY_SEGMENT: &str = "lead-history";
// Encoding scratchpad only; the host never appears in a target.
const ENCODING_BASE: &str = "http://app.invalid/";

/// An in-app navigation target: path segments plus ordered query pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationTarget {
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
}

impl NavigationTarget {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    /// Adds a query pair; absent values are skipped.
    pub fn with_param(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// `/a/b/c`, each segment percent-encoded.
    pub fn path(&self) -> String {
        match self.to_url() {
            Some(url) => url.path().to_string(),
            None => String::new(),
        }
    }

    /// Path plus encoded query string.
    pub fn href(&self) -> String {
        match self.to_url() {
            Some(url) => match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            },
            None => String::new(),
        }
    }

    fn to_url(&self) -> Option<Url> {
        let mut url = Url::parse(ENCODING_BASE).ok()?;
        if let Ok(mut path) = url.path_segments_mut() {
            path.clear().extend(self.segments.iter());
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Some(url)
    }
}

/// Side of the app that performs navigation. Fire-and-forget.
pub trait Navigator {
    fn navigate(&self, target: NavigationTarget);
}

fn with_case_params(target: NavigationTarget, valuation: &Valuation) -> NavigationTarget {
    target
        .with_param("vehicleNumber", valuation.vehicle_number.as_deref())
        .with_param("applicantContact", valuation.applicant_contact.as_deref())
        .with_param("valuationType", valuation.valuation_type.as_deref())
}

/// Screen for the case's current step, e.g. `/valuation/V1/inspection`.
pub fn current_step_target(valuation: &Valuation) -> NavigationTarget {
    let segment = valuation.current_step().path_segment();
    with_case_params(
        NavigationTarget::new([VALUATION_ROOT, valuation.valuation_id.as_str(), segment]),
        valuation,
    )
}

/// Lead history for the case, whatever step it is at.
pub fn lead_history_target(valuation: &Valuation) -> NavigationTarget {
    with_case_params(
        NavigationTarget::new([
            VALUATION_ROOT,
            valuation.valuation_id.as_str(),
            LEAD_HISTORY_SEGMENT,
        ]),
        valuation,
    )
    .with_param("valuationId", Some(valuation.valuation_id.as_str()))
}

pub fn navigate_to_current(valuation: &Valuation, navigator: &dyn Navigator) {
    navigator.navigate(current_step_target(valuation));
}

pub fn open_case(valuation: &Valuation, navigator: &dyn Navigator) {
    navigator.navigate(lead_history_target(valuation));
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::valuation::fixtures::valuation;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<NavigationTarget>>);

    impl Navigator for Recorder {
        fn navigate(&self, target: NavigationTarget) {
            self.0.lock().unwrap().push(target);
        }
    }

    #[test]
    fn test_each_step_maps_to_its_screen() {
        let expected = [
            "stakeholder",
            "vehicle-details",
            "inspection",
            "quality-control",
            "final-report",
        ];
        for (idx, segment) in expected.into_iter().enumerate() {
            let v = valuation("V1", Some(idx as i32 + 1), None);
            let path = current_step_target(&v).path();
            assert_eq!(path, format!("/valuation/V1/{segment}"));
        }
    }

    #[test]
    fn test_current_step_carries_passthrough_fields() {
        let v = valuation("V1", Some(3), None);
        let target = current_step_target(&v);
        assert_eq!(
            target.query,
            vec![
                ("vehicleNumber".to_string(), "KA01V1".to_string()),
                ("applicantContact".to_string(), "9000000001".to_string()),
                ("valuationType".to_string(), "Retail".to_string()),
            ]
        );
        let expected = concat!(
            "/valuation/V1/inspection",
            "?vehicleNumber=KA01V1&applicantContact=9000000001&valuationType=Retail"
        );
        assert_eq!(target.href(), expected);
    }

    #[test]
    fn test_history_target_ignores_step() {
        for order in [1, 3, 5, 42] {
            let v = valuation("V7", Some(order), None);
            let target = lead_history_target(&v);
            assert_eq!(target.path(), "/valuation/V7/lead-history");
            let id_param = ("valuationId".to_string(), "V7".to_string());
            assert!(target.query.contains(&id_param));
        }
    }

    #[test]
    fn test_href_percent_encodes() {
        let mut v = valuation("V 1/x", Some(1), None);
        v.valuation_type = Some("Bank & Retail".to_string());
        v.vehicle_number = None;
        let href = current_step_target(&v).href();
        assert!(
            href.starts_with("/valuation/V%201%2Fx/stakeholder?"),
            "{href}"
        );
        assert!(href.contains("valuationType=Bank+%26+Retail"), "{href}");
        assert!(!href.contains("vehicleNumber"), "{href}");
    }

    #[test]
    fn test_navigate_invokes_navigator_once() {
        let recorder = Recorder::default();
        let v = valuation("V1", Some(4), None);
        navigate_to_current(&v, &recorder);
        open_case(&v, &recorder);
        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].path(), "/valuation/V1/quality-control");
        assert_eq!(seen[1].path(), "/valuation/V1/lead-history");
    }
}
