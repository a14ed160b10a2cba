pub mod lifecycle;
pub mod query;
