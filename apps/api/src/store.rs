//! PostgreSQL-backed user directory and valuation source.
//!
//! Read-only: the claim service owns these tables and is the only writer.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::dashboard::query::{FetchResult, ValuationSource};
use crate::errors::CollaboratorError;
use crate::models::user::{User, UserRow};
use crate::models::valuation::Valuation;
use crate::session::UserDirectory;

const VALUATION_COLUMNS: &str = r#"
    valuation_id, vehicle_number, applicant_contact, valuation_type, created_at,
    status, workflow_step_order, assigned_to, location, adjuster_phone, district, state
"#;

/// Status of cases that have not been picked up yet.
const OPEN_STATUS: &str = "Open";

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, CollaboratorError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT user_id, role_id, name, assigned_states, assigned_districts
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from)
            .ok_or_else(|| CollaboratorError::NotFound(format!("User {user_id} not found")))
    }
}

#[derive(Clone)]
pub struct PgValuationSource {
    pool: PgPool,
}

impl PgValuationSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str, bind: Binding<'_>) -> FetchResult {
        let query = sqlx::query_as::<_, Valuation>(sql);
        let query = match bind {
            Binding::Text(value) => query.bind(value.to_string()),
            Binding::TextArray(values) => query.bind(values.to_vec()),
        };
        Ok(query.fetch_all(&self.pool).await?)
    }
}

enum Binding<'a> {
    Text(&'a str),
    TextArray(&'a [String]),
}

fn select_where(predicate: &str) -> String {
    format!("SELECT {VALUATION_COLUMNS} FROM valuations WHERE {predicate}")
}

#[async_trait]
impl ValuationSource for PgValuationSource {
    async fn by_adjuster(&self, adjuster_id: &str) -> FetchResult {
        let sql = select_where("adjuster_phone = $1");
        self.fetch(&sql, Binding::Text(adjuster_id)).await
    }

    async fn open_unassigned(&self) -> FetchResult {
        let sql = select_where("status = $1");
        self.fetch(&sql, Binding::Text(OPEN_STATUS)).await
    }

    async fn by_districts(&self, districts: &[String]) -> FetchResult {
        let sql = select_where("district = ANY($1)");
        self.fetch(&sql, Binding::TextArray(districts)).await
    }

    async fn by_states(&self, states: &[String]) -> FetchResult {
        let sql = select_where("state = ANY($1)");
        self.fetch(&sql, Binding::TextArray(states)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_where_lists_every_row_column() {
        let sql = select_where("district = ANY($1)");
        for column in [
            "valuation_id",
            "workflow_step_order",
            "created_at",
            "adjuster_phone",
            "district",
            "state",
        ] {
            assert!(sql.contains(column), "missing {column}");
        }
        assert!(sql.trim_end().ends_with("WHERE district = ANY($1)"));
    }
}
