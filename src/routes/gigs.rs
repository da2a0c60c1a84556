use actix_web::{web, HttpResponse, Responder};

use crate::core::criteria::normalize;
use crate::core::ranking::ReviewSort;
use crate::core::SearchEngine;
use crate::error::SearchError;
use crate::models::{raw_filter_from_pairs, ErrorResponse, HealthResponse, RawFilter, ReviewsQuery, SearchResponse};
use crate::services::ReviewFilter;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: SearchEngine,
}

/// Configure all listing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/gigs", web::get().to(search_gigs))
        .route("/gigs/search", web::post().to(search_gigs_json))
        .route("/gigs/{id}", web::get().to(get_gig))
        .route("/gigs/{id}/reviews", web::get().to(get_gig_reviews))
        .route("/reviews", web::get().to(list_reviews));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.engine.store().ping().await.is_ok();

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Search listings from query-string filters
///
/// GET /api/v1/gigs?txt=logo&tags=design&tags=web&minPrice=10&sortBy=recommended&pageIdx=0
async fn search_gigs(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> impl Responder {
    let raw = raw_filter_from_pairs(query.into_inner());
    run_search(&state.engine, &raw).await
}

/// Search listings from a JSON filter body
///
/// POST /api/v1/gigs/search
///
/// Request body:
/// ```json
/// {
///   "text": "chair",
///   "tags": ["furniture", "wood"],
///   "maxPrice": 120,
///   "sortMode": "recommended",
///   "pageIndex": 0
/// }
/// ```
async fn search_gigs_json(
    state: web::Data<AppState>,
    body: web::Json<RawFilter>,
) -> impl Responder {
    run_search(&state.engine, &body).await
}

async fn run_search(engine: &SearchEngine, raw: &RawFilter) -> HttpResponse {
    let criteria = normalize(raw);

    match engine.search_criteria(&criteria).await {
        Ok(gigs) => HttpResponse::Ok().json(SearchResponse {
            count: gigs.len(),
            page_idx: criteria.page_index,
            gigs,
        }),
        Err(e) => error_response(&e),
    }
}

/// Fetch a single listing
///
/// GET /api/v1/gigs/{id}
async fn get_gig(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.engine.get_by_id(&path).await {
        Ok(gig) => HttpResponse::Ok().json(gig),
        Err(e) => error_response(&e),
    }
}

/// Reviews for a listing
///
/// GET /api/v1/gigs/{id}/reviews?sortBy=most-recent
async fn get_gig_reviews(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ReviewsQuery>,
) -> impl Responder {
    let filter = ReviewFilter::Gig(path.into_inner());
    run_reviews(&state.engine, &filter, query.sort_by.as_deref()).await
}

/// Reviews by listing or by reviewed seller
///
/// GET /api/v1/reviews?gigId=...&sortBy=most-relevant
/// GET /api/v1/reviews?userId=...&sortBy=most-recent
async fn list_reviews(state: web::Data<AppState>, query: web::Query<ReviewsQuery>) -> impl Responder {
    let filter = ReviewFilter::from_ids(query.gig_id.as_deref(), query.user_id.as_deref());
    run_reviews(&state.engine, &filter, query.sort_by.as_deref()).await
}

async fn run_reviews(engine: &SearchEngine, filter: &ReviewFilter, sort_by: Option<&str>) -> HttpResponse {
    match engine.reviews_for(filter, ReviewSort::parse(sort_by)).await {
        Ok(reviews) => HttpResponse::Ok().json(reviews),
        Err(e) => error_response(&e),
    }
}

/// Map engine errors to HTTP without exposing store detail
fn error_response(err: &SearchError) -> HttpResponse {
    match err {
        SearchError::NotFound(id) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Not found".to_string(),
            message: format!("No gig with id {}", id),
            status_code: 404,
        }),
        SearchError::StoreUnavailable { operation, .. } => {
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Store unavailable".to_string(),
                message: format!("{} could not be completed, try again later", operation),
                status_code: 503,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Listing, Owner, Review, UserRef};
    use crate::services::InMemoryStore;
    use actix_web::{test, App};
    use std::sync::Arc;

    fn app_state() -> AppState {
        let gigs = (0..5)
            .map(|i| Listing {
                id: format!("g{}", i),
                title: format!("Chair design {}", i),
                description: String::new(),
                category: "furniture".to_string(),
                tags: vec!["wood".to_string()],
                price: 10.0 * (i + 1) as f64,
                days_to_make: 3,
                owner: Owner::default(),
                sales_count: i as u64,
                created_at: None,
                msgs: vec![],
            })
            .collect();

        let reviews = (0..3)
            .map(|i| Review {
                id: format!("r{}", i),
                gig_id: format!("g{}", i),
                rate: i as f64,
                txt: String::new(),
                created_at: None,
                by: UserRef {
                    id: "buyer".to_string(),
                    fullname: None,
                },
                about_user: Some(UserRef {
                    id: if i < 2 { "maker" } else { "other" }.to_string(),
                    fullname: None,
                }),
            })
            .collect();

        AppState {
            engine: SearchEngine::with_defaults(Arc::new(InMemoryStore::new(gigs, reviews))),
        }
    }

    #[actix_web::test]
    async fn test_search_query_string() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/gigs?txt=chair&maxPrice=30&sortBy=price-high-to-low")
            .to_request();
        let resp: SearchResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.count, 3);
        assert_eq!(resp.gigs[0].listing.price, 30.0);
    }

    #[actix_web::test]
    async fn test_missing_gig_is_404() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/gigs/nope").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_reviews_about_seller() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/reviews?userId=maker&sortBy=most-relevant")
            .to_request();
        let reviews: Vec<Review> = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<&str> = reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r0"]);
    }
}
