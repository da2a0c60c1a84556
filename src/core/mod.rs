// Core search pipeline exports
pub mod criteria;
pub mod engine;
pub mod enrichment;
pub mod paginate;
pub mod predicate;
pub mod ranking;

pub use criteria::{normalize, Criteria, SortMode};
pub use engine::{SearchEngine, DEFAULT_PAGE_SIZE};
pub use enrichment::{canonical_key, enrich, review_counts};
pub use paginate::{paginate, Page};
pub use predicate::{compile, Field, Predicate};
pub use ranking::{apply_ordering, recommended_score, Ordering, ReviewSort, SortSpec};
