pub mod extract;
pub mod fetch;
pub mod shared;
