use serde::{Deserialize, Serialize};
use crate::models::domain::EnrichedListing;

/// Response for the listing search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub gigs: Vec<EnrichedListing>,
    pub count: usize,
    #[serde(rename = "pageIdx")]
    pub page_idx: Option<usize>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
