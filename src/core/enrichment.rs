use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{EnrichedListing, Listing, Review};

/// Canonical textual form of an entity id
///
/// Listing ids and `Review::gig_id` may arrive in different native shapes
/// (simple, hyphenated, braced or `urn:uuid:` UUIDs, upper- or lower-case hex,
/// stray whitespace). Both sides of the review join go through this before
/// being compared.
///
/// Must agree with the `canonical_key()` SQL function in `migrations/`: ASCII
/// whitespace is trimmed, UUID spellings become lowercase hyphenated, anything
/// else is lowercased.
pub fn canonical_key(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace());
    match Uuid::try_parse(trimmed) {
        Ok(uuid) => uuid.hyphenated().to_string(),
        Err(_) => trimmed.to_lowercase(),
    }
}

/// Count reviews per canonical listing key in a single pass
pub fn review_counts<'a, I>(reviews: I) -> HashMap<String, u64>
where
    I: IntoIterator<Item = &'a Review>,
{
    let mut counts = HashMap::new();
    for review in reviews {
        *counts.entry(canonical_key(&review.gig_id)).or_insert(0) += 1;
    }
    counts
}

/// Attach `review_count` to every candidate with one bulk hash join
///
/// Listings without reviews get an explicit zero.
pub fn enrich<'a, I>(candidates: Vec<Listing>, reviews: I) -> Vec<EnrichedListing>
where
    I: IntoIterator<Item = &'a Review>,
{
    let counts = review_counts(reviews);

    candidates
        .into_iter()
        .map(|listing| {
            let count = counts.get(&canonical_key(&listing.id)).copied().unwrap_or(0);
            EnrichedListing::new(listing, count)
        })
        .collect()
}
