//! Query Selector — picks which valuation query a user's role entitles them to.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::CollaboratorError;
use crate::models::user::{Role, User};
use crate::models::valuation::Valuation;

pub type FetchResult = Result<Vec<Valuation>, CollaboratorError>;

#[async_trait]
pub trait ValuationSource: Send + Sync {
    async fn by_adjuster(&self, adjuster_id: &str) -> FetchResult;
    async fn open_unassigned(&self) -> FetchResult;
    async fn by_districts(&self, districts: &[String]) -> FetchResult;
    async fn by_states(&self, states: &[String]) -> FetchResult;
}

/// The single query a user's dashboard is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    ByAdjuster(String),
    OpenUnassigned,
    ByDistricts(Vec<String>),
    ByStates(Vec<String>),
    Empty,
}

impl QueryIntent {
    pub fn label(&self) -> &'static str {
        match self {
            QueryIntent::ByAdjuster(_) => "by_adjuster",
            QueryIntent::OpenUnassigned => "open_unassigned",
            QueryIntent::ByDistricts(_) => "by_districts",
            QueryIntent::ByStates(_) => "by_states",
            QueryIntent::Empty => "empty",
        }
    }
}

/// Role check comes first; assignments only matter for regional roles, and
/// districts win over states.
pub fn select_query(user: &User) -> QueryIntent {
    match &user.role_id {
        Role::Avo => QueryIntent::ByAdjuster(user.user_id.clone()),
        Role::Admin | Role::StateAdmin | Role::SuperAdmin => QueryIntent::OpenUnassigned,
        Role::Regional(_) => {
            let districts = decode_assignments(user.assigned_districts.as_ref());
            if !districts.is_empty() {
                return QueryIntent::ByDistricts(districts);
            }
            let states = decode_assignments(user.assigned_states.as_ref());
            if !states.is_empty() {
                return QueryIntent::ByStates(states);
            }
            QueryIntent::Empty
        }
    }
}

/// Normalises an assignment field to a list of codes. Never fails: anything
/// that is not an array (directly or JSON-encoded in a string) is empty.
pub fn decode_assignments(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => codes_from(items),
        Some(Value::String(raw)) if !raw.is_empty() => decode_encoded(raw),
        _ => Vec::new(),
    }
}

fn decode_encoded(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => codes_from(&items),
        _ => Vec::new(),
    }
}

fn codes_from(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| match item {
            Value::String(code) => code.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// Runs the selected query. `Empty` performs no call.
pub async fn fetch_for_intent(source: &dyn ValuationSource, intent: &QueryIntent) -> FetchResult {
    info!("Fetching valuations via {}", intent.label());
    let valuations = match intent {
        QueryIntent::ByAdjuster(id) => source.by_adjuster(id).await?,
        QueryIntent::OpenUnassigned => source.open_unassigned().await?,
        QueryIntent::ByDistricts(districts) => source.by_districts(districts).await?,
        QueryIntent::ByStates(states) => source.by_states(states).await?,
        QueryIntent::Empty => Vec::new(),
    };
    debug!(
        "{} returned {} valuations",
        intent.label(),
        valuations.len()
    );
    Ok(valuations)
}
