// src/extractors/mod.rs
pub mod listing;

// Re-export key extraction types for convenience
pub use listing::{scrape_search_results, ListingExtractor};
