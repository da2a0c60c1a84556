// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Listing, Owner, GigMessage, EnrichedListing, Review, UserRef, ScoreWeights};
pub use requests::{RawFilter, ReviewsQuery, raw_filter_from_pairs};
pub use responses::{SearchResponse, HealthResponse, ErrorResponse};
