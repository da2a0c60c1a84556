use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;

use crate::core::paginate::Page;
use crate::core::predicate::{Field, Predicate};
use crate::core::ranking::{Direction, SortField, SortSpec};
use crate::error::StoreError;
use crate::models::{EnrichedListing, GigMessage, Listing, Owner, Review, UserRef};
use crate::services::store::{ListingStore, Pipeline, ReviewFilter};

const LISTING_COLUMNS: &str = "g.id::text AS id, g.title, g.description, g.category, g.tags, \
     g.price, g.days_to_make, g.owner_id, g.owner_fullname, g.owner_rate, g.owner_level, \
     g.sales, g.msgs, g.created_at";

const REVIEW_COLUMNS: &str = "id::text AS id, gig_id, rate, txt, by_id, by_fullname, \
     about_user_id, about_user_fullname, created_at";

/// Order used when the caller asks for none; also the tie-breaker for every
/// store sort, so LIMIT/OFFSET pages never overlap
const NATURAL_ORDER: &str = "g.created_at ASC, g.id ASC";

/// PostgreSQL-backed listing store
///
/// Predicates are compiled to a parameterized WHERE clause. The review
/// enrichment is a single `LEFT JOIN ... GROUP BY` keyed on the
/// `canonical_key()` SQL function installed by the migrations.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn find_query(predicate: &Predicate, sort: Option<SortSpec>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(LISTING_COLUMNS).push(" FROM gigs g WHERE ");
    push_predicate(&mut qb, predicate);
    push_sort(&mut qb, sort);
    qb
}

fn aggregate_query(pipeline: &Pipeline) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(LISTING_COLUMNS)
        .push(", COUNT(r.id) AS review_count")
        .push(" FROM gigs g")
        .push(" LEFT JOIN reviews r ON canonical_key(r.gig_id) = g.id::text")
        .push(" WHERE ");
    push_predicate(&mut qb, &pipeline.predicate);
    qb.push(" GROUP BY g.id");
    push_sort(&mut qb, pipeline.sort);
    push_page(&mut qb, pipeline.page);
    qb
}

fn reviews_query(filter: &ReviewFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(REVIEW_COLUMNS).push(" FROM reviews");
    match filter {
        ReviewFilter::Gig(gig_id) => {
            qb.push(" WHERE canonical_key(gig_id) = canonical_key(")
                .push_bind(gig_id.clone())
                .push(")");
        }
        ReviewFilter::AboutUser(user_id) => {
            qb.push(" WHERE canonical_key(about_user_id) = canonical_key(")
                .push_bind(user_id.clone())
                .push(")");
        }
        ReviewFilter::All => {}
    }
    qb.push(" ORDER BY created_at ASC, id ASC");
    qb
}

#[async_trait]
impl ListingStore for PostgresStore {
    async fn find(
        &self,
        predicate: &Predicate,
        sort: Option<SortSpec>,
    ) -> Result<Vec<Listing>, StoreError> {
        let mut qb = find_query(predicate, sort);
        tracing::debug!("find: {}", qb.sql());

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(listing_from_row).collect()
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<EnrichedListing>, StoreError> {
        let mut qb = aggregate_query(pipeline);
        tracing::debug!("aggregate: {}", qb.sql());

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<EnrichedListing, StoreError> {
                let count: i64 = row.try_get("review_count")?;
                Ok(EnrichedListing::new(listing_from_row(row)?, count.max(0) as u64))
            })
            .collect()
    }

    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>, StoreError> {
        let mut qb = reviews_query(filter);
        tracing::debug!("find_reviews: {}", qb.sql());

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(review_from_row).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

fn column(field: Field) -> &'static str {
    match field {
        Field::Id => "g.id",
        Field::Title => "g.title",
        Field::Description => "g.description",
        Field::Category => "g.category",
        Field::Tags => "g.tags",
        Field::Price => "g.price",
        Field::DaysToMake => "g.days_to_make",
        Field::OwnerId => "g.owner_id",
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::SalesCount => "g.sales",
        SortField::CreatedAt => "g.created_at",
        SortField::DaysToMake => "g.days_to_make",
        SortField::Price => "g.price",
    }
}

/// Append `predicate` as SQL, binding every value
fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::And(clauses) if clauses.is_empty() => {
            qb.push("TRUE");
        }
        Predicate::Or(clauses) if clauses.is_empty() => {
            qb.push("FALSE");
        }
        Predicate::And(clauses) => push_group(qb, clauses, " AND "),
        Predicate::Or(clauses) => push_group(qb, clauses, " OR "),
        Predicate::Equals(Field::Id, value) => {
            qb.push("g.id::text = canonical_key(")
                .push_bind(value.clone())
                .push(")");
        }
        Predicate::Equals(field, value) => {
            qb.push(column(*field)).push(" = ").push_bind(value.clone());
        }
        Predicate::HasTag(tag) => {
            qb.push_bind(tag.clone()).push(" = ANY(g.tags)");
        }
        Predicate::TagsIntersect(tags) => {
            qb.push("g.tags && ").push_bind(tags.clone()).push("::text[]");
        }
        Predicate::AtLeast(field, bound) => {
            qb.push(column(*field)).push(" >= ").push_bind(*bound);
        }
        Predicate::AtMost(field, bound) => {
            qb.push(column(*field)).push(" <= ").push_bind(*bound);
        }
        Predicate::ContainsText(Field::Tags, needle) => {
            qb.push("EXISTS (SELECT 1 FROM unnest(g.tags) AS t(tag) WHERE strpos(lower(t.tag), lower(")
                .push_bind(needle.clone())
                .push(")) > 0)");
        }
        Predicate::ContainsText(field, needle) => {
            qb.push("strpos(lower(")
                .push(column(*field))
                .push("), lower(")
                .push_bind(needle.clone())
                .push(")) > 0");
        }
    }
}

fn push_group(qb: &mut QueryBuilder<'_, Postgres>, clauses: &[Predicate], separator: &str) {
    qb.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        push_predicate(qb, clause);
    }
    qb.push(")");
}

/// Always emits an ORDER BY: without one, GROUP BY output order shifts with
/// LIMIT/OFFSET
fn push_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: Option<SortSpec>) {
    qb.push(" ORDER BY ");
    if let Some(spec) = sort {
        let direction = match spec.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        qb.push(sort_column(spec.field)).push(" ").push(direction).push(", ");
    }
    qb.push(NATURAL_ORDER);
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Option<Page>) {
    if let Some(page) = page {
        let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        qb.push(" LIMIT ").push_bind(limit).push(" OFFSET ").push_bind(offset);
    }
}

fn listing_from_row(row: &PgRow) -> Result<Listing, StoreError> {
    let days_to_make: i32 = row.try_get("days_to_make")?;
    let owner_level: Option<i32> = row.try_get("owner_level")?;
    let sales: i64 = row.try_get("sales")?;
    let Json(msgs): Json<Vec<GigMessage>> = row.try_get("msgs")?;

    Ok(Listing {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        tags: row.try_get("tags")?,
        price: row.try_get("price")?,
        days_to_make: days_to_make.max(0) as u32,
        owner: Owner {
            id: row.try_get("owner_id")?,
            fullname: row.try_get("owner_fullname")?,
            rate: row.try_get("owner_rate")?,
            level: owner_level.and_then(|level| u32::try_from(level).ok()),
        },
        sales_count: sales.max(0) as u64,
        created_at: row.try_get("created_at")?,
        msgs,
    })
}

fn review_from_row(row: &PgRow) -> Result<Review, StoreError> {
    let about_user_id: Option<String> = row.try_get("about_user_id")?;
    let about_user_fullname: Option<String> = row.try_get("about_user_fullname")?;

    Ok(Review {
        id: row.try_get("id")?,
        gig_id: row.try_get("gig_id")?,
        rate: row.try_get("rate")?,
        txt: row.try_get("txt")?,
        created_at: row.try_get("created_at")?,
        by: UserRef {
            id: row.try_get("by_id")?,
            fullname: row.try_get("by_fullname")?,
        },
        about_user: about_user_id.map(|id| UserRef {
            id,
            fullname: about_user_fullname,
        }),
    })
}
