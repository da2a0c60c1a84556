use crate::core::criteria::Criteria;
use crate::core::enrichment::canonical_key;
use crate::models::Listing;

/// Listing attribute a predicate clause can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Title,
    Description,
    Category,
    Tags,
    Price,
    DaysToMake,
    OwnerId,
}

impl Field {
    fn text<'a>(&self, listing: &'a Listing) -> Option<&'a str> {
        match self {
            Field::Id => Some(&listing.id),
            Field::Title => Some(&listing.title),
            Field::Description => Some(&listing.description),
            Field::Category => Some(&listing.category),
            Field::OwnerId => Some(&listing.owner.id),
            Field::Tags | Field::Price | Field::DaysToMake => None,
        }
    }

    fn number(&self, listing: &Listing) -> Option<f64> {
        match self {
            Field::Price => Some(listing.price),
            Field::DaysToMake => Some(f64::from(listing.days_to_make)),
            _ => None,
        }
    }
}

/// Store-agnostic predicate tree
///
/// `And(vec![])` matches everything, `Or(vec![])` matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    /// Exact equality on a textual field. `Field::Id` compares canonical keys.
    Equals(Field, String),
    /// The value is one of the listing's tags
    HasTag(String),
    /// The listing's tags share at least one element with the set
    TagsIntersect(Vec<String>),
    AtLeast(Field, f64),
    AtMost(Field, f64),
    /// Case-insensitive substring; on `Field::Tags` any single tag may match
    ContainsText(Field, String),
}

impl Predicate {
    pub fn match_all() -> Self {
        Predicate::And(Vec::new())
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::And(clauses) if clauses.is_empty())
    }

    /// Evaluate the predicate against a listing held in memory
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Predicate::And(clauses) => clauses.iter().all(|c| c.matches(listing)),
            Predicate::Or(clauses) => clauses.iter().any(|c| c.matches(listing)),
            Predicate::Equals(Field::Id, value) => canonical_key(&listing.id) == canonical_key(value),
            Predicate::Equals(field, value) => field.text(listing) == Some(value.as_str()),
            Predicate::HasTag(tag) => listing.tags.iter().any(|t| t == tag),
            Predicate::TagsIntersect(tags) => listing.tags.iter().any(|t| tags.contains(t)),
            Predicate::AtLeast(field, bound) => field.number(listing).is_some_and(|n| n >= *bound),
            Predicate::AtMost(field, bound) => field.number(listing).is_some_and(|n| n <= *bound),
            Predicate::ContainsText(Field::Tags, needle) => {
                let needle = needle.to_lowercase();
                listing.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            }
            Predicate::ContainsText(field, needle) => field
                .text(listing)
                .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

/// Compile criteria into a single conjunction of the clauses that are present
///
/// The category group and the free-text group are merged into one OR group, so
/// a listing satisfying a clause from either group passes.
pub fn compile(criteria: &Criteria) -> Predicate {
    let mut clauses = Vec::new();
    let mut any_of = Vec::new();

    if let Some(category) = &criteria.category {
        any_of.push(Predicate::Equals(Field::Category, category.clone()));
        any_of.push(Predicate::HasTag(category.clone()));
    }

    if !criteria.tags.is_empty() {
        clauses.push(Predicate::TagsIntersect(criteria.tags.clone()));
    }

    if let Some(min) = criteria.min_price {
        clauses.push(Predicate::AtLeast(Field::Price, min));
    }
    if let Some(max) = criteria.max_price {
        clauses.push(Predicate::AtMost(Field::Price, max));
    }

    if let Some(days) = criteria.max_days_to_make {
        clauses.push(Predicate::AtMost(Field::DaysToMake, days));
    }

    if let Some(owner_id) = &criteria.owner_id {
        clauses.push(Predicate::Equals(Field::OwnerId, owner_id.clone()));
    }

    if let Some(text) = &criteria.text {
        for field in [Field::Title, Field::Description, Field::Category, Field::Tags] {
            any_of.push(Predicate::ContainsText(field, text.clone()));
        }
    }

    if !any_of.is_empty() {
        clauses.push(Predicate::Or(any_of));
    }

    Predicate::And(clauses)
}
