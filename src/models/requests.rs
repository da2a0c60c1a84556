use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw, possibly sparse filter input as received from a caller
///
/// Nothing about its shape is trusted; `core::criteria::normalize` turns it into
/// a `Criteria`.
pub type RawFilter = Map<String, Value>;

/// Build a raw filter from query-string pairs
///
/// A key repeated more than once (`tags=a&tags=b`) becomes a JSON array.
pub fn raw_filter_from_pairs<I>(pairs: I) -> RawFilter
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut raw = RawFilter::new();

    for (key, value) in pairs {
        match raw.remove(&key) {
            None => {
                raw.insert(key, Value::String(value));
            }
            Some(Value::Array(mut values)) => {
                values.push(Value::String(value));
                raw.insert(key, Value::Array(values));
            }
            Some(existing) => {
                raw.insert(key, Value::Array(vec![existing, Value::String(value)]));
            }
        }
    }

    raw
}

/// Query parameters for listing reviews
///
/// `gigId` takes precedence over `userId` (the reviewed seller).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewsQuery {
    #[serde(rename = "gigId", default)]
    pub gig_id: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "sortBy", default)]
    pub sort_by: Option<String>,
}
