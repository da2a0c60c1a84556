use crate::core::criteria::SortMode;
use crate::models::{EnrichedListing, Listing, Review, ScoreWeights};

/// Listing attribute the store can sort on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    SalesCount,
    CreatedAt,
    DaysToMake,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field sort executed by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: Direction,
}

impl SortSpec {
    pub const fn new(field: SortField, direction: Direction) -> Self {
        Self { field, direction }
    }
}

/// How a result set gets ordered
///
/// `StoreSort` is pushed down to the store before fetch; `ComputedScore` runs in
/// memory after enrichment because it depends on `review_count`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ordering {
    Natural,
    StoreSort(SortSpec),
    ComputedScore(ScoreWeights),
}

impl Ordering {
    pub fn for_mode(mode: Option<SortMode>, weights: ScoreWeights) -> Self {
        use Direction::*;
        use SortField::*;

        match mode {
            None => Ordering::Natural,
            Some(SortMode::BestSelling) => Ordering::StoreSort(SortSpec::new(SalesCount, Descending)),
            Some(SortMode::NewestArrivals) => Ordering::StoreSort(SortSpec::new(CreatedAt, Descending)),
            Some(SortMode::FastestDelivery) => Ordering::StoreSort(SortSpec::new(DaysToMake, Ascending)),
            Some(SortMode::PriceLowToHigh) => Ordering::StoreSort(SortSpec::new(Price, Ascending)),
            Some(SortMode::PriceHighToLow) => Ordering::StoreSort(SortSpec::new(Price, Descending)),
            Some(SortMode::Recommended) => Ordering::ComputedScore(weights),
        }
    }

    /// Sort the store should apply, if any
    pub fn store_sort(&self) -> Option<SortSpec> {
        match self {
            Ordering::StoreSort(spec) => Some(*spec),
            _ => None,
        }
    }

    /// Whether skip/limit can be handed to the store
    pub fn pages_in_store(&self) -> bool {
        !matches!(self, Ordering::ComputedScore(_))
    }
}

/// Recommended score: seller reputation blended with review volume
///
/// Missing rate or level count as zero.
#[inline]
pub fn recommended_score(candidate: &EnrichedListing, weights: &ScoreWeights) -> f64 {
    let owner = &candidate.listing.owner;
    owner.rate() * weights.rate
        + owner.level() * weights.level
        + candidate.review_count as f64 * weights.reviews
}

/// Order fetched candidates according to `ordering`
///
/// Store-level orderings arrive already sorted and are returned unchanged.
/// The computed score uses a stable sort, so ties keep the store's order.
pub fn apply_ordering(mut candidates: Vec<EnrichedListing>, ordering: &Ordering) -> Vec<EnrichedListing> {
    if let Ordering::ComputedScore(weights) = ordering {
        let mut scored: Vec<(f64, EnrichedListing)> = candidates
            .into_iter()
            .map(|c| (recommended_score(&c, weights), c))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates = scored.into_iter().map(|(_, c)| c).collect();
    }

    candidates
}

/// Stable in-memory single-field sort, for stores without a native sorter
pub fn sort_by_spec<T: AsRef<Listing>>(candidates: &mut [T], spec: SortSpec) {
    candidates.sort_by(|a, b| {
        let (a, b) = (a.as_ref(), b.as_ref());
        let ord = match spec.field {
            SortField::SalesCount => a.sales_count.cmp(&b.sales_count),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::DaysToMake => a.days_to_make.cmp(&b.days_to_make),
            SortField::Price => a.price.total_cmp(&b.price),
        };

        match spec.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
}

/// Ordering for a gig's review list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    MostRecent,
    #[default]
    MostRelevant,
}

impl ReviewSort {
    /// Anything other than `most-recent` ranks by relevance
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("most-recent") => ReviewSort::MostRecent,
            _ => ReviewSort::MostRelevant,
        }
    }
}

pub fn sort_reviews(reviews: &mut [Review], sort: ReviewSort) {
    match sort {
        ReviewSort::MostRecent => reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ReviewSort::MostRelevant => reviews.sort_by(|a, b| b.rate.total_cmp(&a.rate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Owner, UserRef};

    fn candidate(id: &str, rate: Option<f64>, level: Option<u32>, reviews: u64) -> EnrichedListing {
        EnrichedListing::new(
            Listing {
                id: id.to_string(),
                title: id.to_string(),
                description: String::new(),
                category: String::new(),
                tags: vec![],
                price: 10.0,
                days_to_make: 1,
                owner: Owner {
                    id: "o".to_string(),
                    fullname: None,
                    rate,
                    level,
                },
                sales_count: 0,
                created_at: None,
                msgs: vec![],
            },
            reviews,
        )
    }

    fn ids(candidates: &[EnrichedListing]) -> Vec<&str> {
        candidates.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_recommended_score_formula() {
        let weights = ScoreWeights::default();
        let a = candidate("A", Some(4.0), Some(2), 10);
        let b = candidate("B", Some(5.0), Some(1), 0);

        assert!((recommended_score(&a, &weights) - 1001.0).abs() < 1e-9);
        assert!((recommended_score(&b, &weights) - 1100.0).abs() < 1e-9);

        let ordered = apply_ordering(vec![a, b], &Ordering::ComputedScore(weights));
        assert_eq!(ids(&ordered), vec!["B", "A"]);
    }

    #[test]
    fn test_missing_reputation_is_zero() {
        let c = candidate("C", None, None, 0);
        assert_eq!(recommended_score(&c, &ScoreWeights::default()), 0.0);
    }

    #[test]
    fn test_recommended_is_stable() {
        let ordered = apply_ordering(
            vec![
                candidate("first", Some(3.0), None, 0),
                candidate("top", Some(5.0), None, 0),
                candidate("second", Some(3.0), None, 0),
            ],
            &Ordering::ComputedScore(ScoreWeights::default()),
        );
        assert_eq!(ids(&ordered), vec!["top", "first", "second"]);
    }

    #[test]
    fn test_store_sort_left_untouched() {
        let input = vec![candidate("x", Some(1.0), None, 0), candidate("y", Some(5.0), None, 0)];
        let spec = SortSpec::new(SortField::Price, Direction::Ascending);
        let ordered = apply_ordering(input, &Ordering::StoreSort(spec));
        assert_eq!(ids(&ordered), vec!["x", "y"]);
    }

    #[test]
    fn test_sort_by_spec_best_selling() {
        let mut listings: Vec<EnrichedListing> = [5u64, 20, 1]
            .iter()
            .map(|sales| {
                let mut c = candidate(&sales.to_string(), None, None, 0);
                c.listing.sales_count = *sales;
                c
            })
            .collect();

        sort_by_spec(&mut listings, SortSpec::new(SortField::SalesCount, Direction::Descending));
        assert_eq!(ids(&listings), vec!["20", "5", "1"]);
    }

    #[test]
    fn test_mode_table() {
        let w = ScoreWeights::default();
        assert_eq!(Ordering::for_mode(None, w), Ordering::Natural);
        assert_eq!(
            Ordering::for_mode(Some(SortMode::BestSelling), w).store_sort(),
            Some(SortSpec::new(SortField::SalesCount, Direction::Descending))
        );
        assert_eq!(
            Ordering::for_mode(Some(SortMode::FastestDelivery), w).store_sort(),
            Some(SortSpec::new(SortField::DaysToMake, Direction::Ascending))
        );
        assert!(!Ordering::for_mode(Some(SortMode::Recommended), w).pages_in_store());
    }

    #[test]
    fn test_most_relevant_with_unrated_review() {
        let review = |id: &str, rate: f64| Review {
            id: id.to_string(),
            gig_id: "g".to_string(),
            rate,
            txt: String::new(),
            created_at: None,
            by: UserRef {
                id: "u".to_string(),
                fullname: None,
            },
            about_user: None,
        };
        let mut reviews = vec![review("low", 1.0), review("nan", f64::NAN), review("high", 4.0)];

        sort_reviews(&mut reviews, ReviewSort::MostRelevant);

        let order: Vec<&str> = reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["nan", "high", "low"]);
    }

    #[test]
    fn test_review_sort_parse() {
        assert_eq!(ReviewSort::parse(Some("most-recent")), ReviewSort::MostRecent);
        assert_eq!(ReviewSort::parse(Some("whatever")), ReviewSort::MostRelevant);
        assert_eq!(ReviewSort::parse(None), ReviewSort::MostRelevant);
    }
}
