use async_trait::async_trait;

use crate::core::enrichment::canonical_key;
use crate::core::paginate::Page;
use crate::core::predicate::Predicate;
use crate::core::ranking::SortSpec;
use crate::error::StoreError;
use crate::models::{EnrichedListing, Listing, Review};

/// Aggregation handed to a store in one round trip
///
/// Stages run in order: match `predicate`, join reviews on the canonical gig
/// key, add `review_count`, drop the joined reviews, then the optional sort and
/// skip/limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub predicate: Predicate,
    pub sort: Option<SortSpec>,
    pub page: Option<Page>,
}

impl Pipeline {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            sort: None,
            page: None,
        }
    }

    pub fn sorted(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn paged(mut self, page: Option<Page>) -> Self {
        self.page = page;
        self
    }
}

/// Which reviews to list
///
/// Ids on both sides are compared by canonical key, like the enrichment join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewFilter {
    /// Reviews of one listing
    Gig(String),
    /// Reviews about one seller, across all of their listings
    AboutUser(String),
    /// Every review
    All,
}

impl ReviewFilter {
    /// `gig_id` wins over `user_id`; blank values count as absent
    pub fn from_ids(gig_id: Option<&str>, user_id: Option<&str>) -> Self {
        fn present(id: Option<&str>) -> Option<&str> {
            id.map(str::trim).filter(|id| !id.is_empty())
        }

        match (present(gig_id), present(user_id)) {
            (Some(gig_id), _) => ReviewFilter::Gig(gig_id.to_string()),
            (None, Some(user_id)) => ReviewFilter::AboutUser(user_id.to_string()),
            (None, None) => ReviewFilter::All,
        }
    }

    pub fn matches(&self, review: &Review) -> bool {
        match self {
            ReviewFilter::Gig(gig_id) => canonical_key(&review.gig_id) == canonical_key(gig_id),
            ReviewFilter::AboutUser(user_id) => review
                .about_user
                .as_ref()
                .is_some_and(|user| canonical_key(&user.id) == canonical_key(user_id)),
            ReviewFilter::All => true,
        }
    }
}

/// Read-only view of the listing and review collections
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Listings matching `predicate`, in store order unless a sort is given
    async fn find(
        &self,
        predicate: &Predicate,
        sort: Option<SortSpec>,
    ) -> Result<Vec<Listing>, StoreError>;

    /// Run the enrichment pipeline
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<EnrichedListing>, StoreError>;

    /// Reviews selected by `filter`, in store order
    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>, StoreError>;

    /// Connectivity check
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRef;

    fn review(gig_id: &str, seller: Option<&str>) -> Review {
        Review {
            id: "r".to_string(),
            gig_id: gig_id.to_string(),
            rate: 5.0,
            txt: String::new(),
            created_at: None,
            by: UserRef {
                id: "buyer".to_string(),
                fullname: None,
            },
            about_user: seller.map(|id| UserRef {
                id: id.to_string(),
                fullname: None,
            }),
        }
    }

    #[test]
    fn test_gig_id_takes_precedence() {
        assert_eq!(
            ReviewFilter::from_ids(Some("g1"), Some("u1")),
            ReviewFilter::Gig("g1".to_string())
        );
        assert_eq!(
            ReviewFilter::from_ids(Some("  "), Some("u1")),
            ReviewFilter::AboutUser("u1".to_string())
        );
        assert_eq!(ReviewFilter::from_ids(None, None), ReviewFilter::All);
    }

    #[test]
    fn test_review_filter_matching() {
        let r = review("G1", Some("Seller7"));

        assert!(ReviewFilter::Gig("g1".to_string()).matches(&r));
        assert!(ReviewFilter::AboutUser("seller7".to_string()).matches(&r));
        assert!(!ReviewFilter::AboutUser("seller8".to_string()).matches(&r));
        assert!(!ReviewFilter::AboutUser("seller7".to_string()).matches(&review("g1", None)));
        assert!(ReviewFilter::All.matches(&r));
    }
}
