use std::sync::Arc;

use crate::core::criteria::{normalize, Criteria};
use crate::core::paginate::{paginate, Page};
use crate::core::predicate::{compile, Field, Predicate};
use crate::core::ranking::{apply_ordering, sort_reviews, Ordering, ReviewSort};
use crate::error::SearchError;
use crate::models::{EnrichedListing, Listing, RawFilter, Review, ScoreWeights};
use crate::services::store::{ListingStore, Pipeline, ReviewFilter};

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: usize = 3;

/// Listing search orchestrator
///
/// # Pipeline Stages
/// 1. Normalize the raw filter into `Criteria`
/// 2. Compile the criteria into a predicate
/// 3. Query the store, joining review counts in the same round trip
/// 4. Order: store-level sort, or the recommended score in memory
/// 5. Paginate (in the store when the ordering allows it)
///
/// Stateless apart from the shared store handle; safe to clone and call
/// concurrently.
#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn ListingStore>,
    page_size: usize,
    weights: ScoreWeights,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn ListingStore>, page_size: usize, weights: ScoreWeights) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            weights,
        }
    }

    pub fn with_defaults(store: Arc<dyn ListingStore>) -> Self {
        Self::new(store, DEFAULT_PAGE_SIZE, ScoreWeights::default())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn store(&self) -> &Arc<dyn ListingStore> {
        &self.store
    }

    /// Search listings from raw, possibly sparse filter input
    pub async fn search(&self, raw: &RawFilter) -> Result<Vec<EnrichedListing>, SearchError> {
        let criteria = normalize(raw);
        self.search_criteria(&criteria).await
    }

    /// Search listings from already-normalized criteria
    pub async fn search_criteria(
        &self,
        criteria: &Criteria,
    ) -> Result<Vec<EnrichedListing>, SearchError> {
        let ordering = Ordering::for_mode(criteria.sort_mode, self.weights);
        let page = criteria.page_index.map(|index| Page::new(index, self.page_size));

        // The recommended score needs every candidate's review count, so
        // paging waits until after scoring.
        let store_page = if ordering.pages_in_store() { page } else { None };

        let pipeline = Pipeline::new(compile(criteria))
            .sorted(ordering.store_sort())
            .paged(store_page);

        tracing::debug!(
            "Searching listings: sort={:?}, page={:?}, store_page={:?}",
            criteria.sort_mode,
            page,
            store_page
        );

        let candidates = self.store.aggregate(&pipeline).await.map_err(|e| {
            tracing::error!("Store failure in search (criteria={:?}): {}", criteria, e);
            SearchError::store("search", e)
        })?;

        let total_candidates = candidates.len();
        let ordered = apply_ordering(candidates, &ordering);
        let results = if store_page.is_some() {
            ordered
        } else {
            paginate(ordered, page)
        };

        tracing::info!(
            "Returning {} listings (from {} candidates)",
            results.len(),
            total_candidates
        );

        Ok(results)
    }

    /// Look up one listing by id
    pub async fn get_by_id(&self, id: &str) -> Result<Listing, SearchError> {
        let predicate = Predicate::Equals(Field::Id, id.to_string());

        let listings = self.store.find(&predicate, None).await.map_err(|e| {
            tracing::error!("Store failure while finding gig {}: {}", id, e);
            SearchError::store("get_by_id", e)
        })?;

        listings
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::NotFound(id.to_string()))
    }

    /// Reviews of a listing or of a seller, in the requested order
    pub async fn reviews_for(
        &self,
        filter: &ReviewFilter,
        sort: ReviewSort,
    ) -> Result<Vec<Review>, SearchError> {
        let mut reviews = self.store.find_reviews(filter).await.map_err(|e| {
            tracing::error!("Store failure while querying reviews ({:?}): {}", filter, e);
            SearchError::store("reviews_for", e)
        })?;

        sort_reviews(&mut reviews, sort);
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::criteria::SortMode;
    use crate::models::Owner;
    use crate::services::InMemoryStore;

    fn listing(id: &str, price: f64, rate: f64) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Gig {}", id),
            description: String::new(),
            category: "design".to_string(),
            tags: vec![],
            price,
            days_to_make: 2,
            owner: Owner {
                id: "owner".to_string(),
                fullname: None,
                rate: Some(rate),
                level: None,
            },
            sales_count: 0,
            created_at: None,
            msgs: vec![],
        }
    }

    fn engine(listings: Vec<Listing>) -> SearchEngine {
        SearchEngine::with_defaults(Arc::new(InMemoryStore::new(listings, vec![])))
    }

    #[test]
    fn test_recommended_pages_after_scoring() {
        let engine = engine(vec![
            listing("a", 10.0, 1.0),
            listing("b", 10.0, 2.0),
            listing("c", 10.0, 3.0),
            listing("d", 10.0, 4.0),
        ]);

        let criteria = Criteria {
            sort_mode: Some(SortMode::Recommended),
            page_index: Some(0),
            ..Criteria::default()
        };

        let page = tokio_test::block_on(engine.search_criteria(&criteria)).unwrap();
        let ids: Vec<&str> = page.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["d", "c", "b"]);
    }

    #[test]
    fn test_get_by_id_not_found() {
        let engine = engine(vec![listing("a", 10.0, 1.0)]);
        let result = tokio_test::block_on(engine.get_by_id("missing"));
        assert!(matches!(result, Err(SearchError::NotFound(id)) if id == "missing"));
    }

    #[test]
    fn test_zero_page_size_clamped() {
        let engine = SearchEngine::new(
            Arc::new(InMemoryStore::default()),
            0,
            ScoreWeights::default(),
        );
        assert_eq!(engine.page_size(), 1);
    }
}
