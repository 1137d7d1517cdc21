pub mod fetch;
pub mod provider;
pub mod yahoo;
