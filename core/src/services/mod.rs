pub mod documents;
pub mod files;
pub mod holdings;
pub mod importers;
pub mod instruments;
pub mod market_data;
pub mod parsers;
pub mod shared;
