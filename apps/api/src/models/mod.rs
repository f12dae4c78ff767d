pub mod user;
pub mod valuation;
