pub mod cost;
pub mod dividend;
pub mod holding;
pub mod market;
pub mod summary;
pub mod trade;
