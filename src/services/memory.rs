use async_trait::async_trait;

use crate::core::enrichment::enrich;
use crate::core::paginate::paginate;
use crate::core::predicate::Predicate;
use crate::core::ranking::{sort_by_spec, SortSpec};
use crate::error::StoreError;
use crate::models::{EnrichedListing, Listing, Review};
use crate::services::store::{ListingStore, Pipeline, ReviewFilter};

/// Snapshot store held entirely in memory
///
/// Natural order is insertion order. Used by the test suite and benchmarks,
/// and handy for seeding a local instance from a JSON dump.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    listings: Vec<Listing>,
    reviews: Vec<Review>,
}

impl InMemoryStore {
    pub fn new(listings: Vec<Listing>, reviews: Vec<Review>) -> Self {
        Self { listings, reviews }
    }

    /// Load `{ "gigs": [...], "reviews": [...] }`
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        #[derive(serde::Deserialize)]
        struct Snapshot {
            #[serde(default)]
            gigs: Vec<Listing>,
            #[serde(default)]
            reviews: Vec<Review>,
        }

        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot.gigs, snapshot.reviews))
    }

    fn matching(&self, predicate: &Predicate) -> Vec<Listing> {
        self.listings
            .iter()
            .filter(|listing| predicate.matches(listing))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ListingStore for InMemoryStore {
    async fn find(
        &self,
        predicate: &Predicate,
        sort: Option<SortSpec>,
    ) -> Result<Vec<Listing>, StoreError> {
        let mut listings = self.matching(predicate);
        if let Some(spec) = sort {
            sort_by_spec(&mut listings, spec);
        }
        Ok(listings)
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<EnrichedListing>, StoreError> {
        let mut enriched = enrich(self.matching(&pipeline.predicate), &self.reviews);
        if let Some(spec) = pipeline.sort {
            sort_by_spec(&mut enriched, spec);
        }
        Ok(paginate(enriched, pipeline.page))
    }

    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .iter()
            .filter(|review| filter.matches(review))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
