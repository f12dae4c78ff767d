// Dashboard: role-scoped valuation list, step permissions, filters, routing.
// All collaborator I/O goes through the traits in session/ and query.rs.

pub mod filters;
pub mod handlers;
pub mod pipeline;
pub mod query;
pub mod routing;
pub mod visibility;
