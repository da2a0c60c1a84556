//! Listing Search - search and ranking engine for the gig marketplace
//!
//! This library turns a loosely specified filter request into a store query,
//! attaches review counts to the candidates, orders them and returns one page.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{SearchEngine, Criteria, SortMode, normalize, compile};
pub use error::{SearchError, StoreError, ValidationError};
pub use models::{Listing, EnrichedListing, Review, RawFilter, ScoreWeights};
pub use services::{ListingStore, InMemoryStore, PostgresStore, ReviewFilter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let criteria = normalize(&RawFilter::new());
        assert!(compile(&criteria).is_match_all());
    }
}
