use serde::{Deserialize, Serialize};

/// Seller attached to a listing
///
/// Reputation fields are optional; anything missing counts as zero when ranking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub level: Option<u32>,
}

impl Owner {
    /// Seller rating, defaulting to 0
    pub fn rate(&self) -> f64 {
        self.rate.unwrap_or(0.0)
    }

    /// Seller level, defaulting to 0
    pub fn level(&self) -> f64 {
        self.level.map(f64::from).unwrap_or(0.0)
    }
}

/// Message left on a listing's thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GigMessage {
    pub id: String,
    #[serde(default)]
    pub txt: String,
    #[serde(default)]
    pub by: Option<String>,
}

/// A sellable service offering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: f64,
    #[serde(rename = "daysToMake")]
    pub days_to_make: u32,
    pub owner: Owner,
    #[serde(rename = "sales", default)]
    pub sales_count: u64,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub msgs: Vec<GigMessage>,
}

impl AsRef<Listing> for Listing {
    fn as_ref(&self) -> &Listing {
        self
    }
}

/// Listing as returned by a search, carrying its derived review count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedListing {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(rename = "reviewCount", default)]
    pub review_count: u64,
}

impl EnrichedListing {
    pub fn new(listing: Listing, review_count: u64) -> Self {
        Self {
            listing,
            review_count,
        }
    }

    pub fn id(&self) -> &str {
        &self.listing.id
    }
}

impl AsRef<Listing> for EnrichedListing {
    fn as_ref(&self) -> &Listing {
        &self.listing
    }
}

/// Embedded reference to a user (review author or reviewed seller)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub fullname: Option<String>,
}

/// Review of a listing
///
/// `gig_id` is free text; it is compared to `Listing::id` only after both sides
/// have been brought into the same canonical form. `about_user` is the seller
/// the review is about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "gigId")]
    pub gig_id: String,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub txt: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub by: UserRef,
    #[serde(rename = "aboutUser", default, skip_serializing_if = "Option::is_none")]
    pub about_user: Option<UserRef>,
}

/// Weights for the recommended composite score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub rate: f64,
    pub level: f64,
    pub reviews: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            rate: 200.0,
            level: 100.0,
            reviews: 0.1,
        }
    }
}
