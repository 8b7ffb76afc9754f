use axum::{
    Router,
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
    routing::get,
};
use common_errors::AppError;
use memory_cache::MemoryCache;
use serde::{Deserialize, Serialize};
use sql_connection::SqlConnect;
use tag_models::{
    HeatmapCell, TagFeedEntry, TagImpactMetrics, TagLifecycle, TagUsage,
};
use tag_queries::{
    FeedQuery, FeedQueryHandler, HeatmapQueryHandler, ImpactError,
    ImpactQuery, ImpactQueryHandler, LifecycleError, LifecycleQuery,
    LifecycleQueryHandler, TopTagsError, TopTagsQuery, TopTagsQueryHandler,
};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::AuthService;

#[derive(Clone)]
pub struct TagServices {
    pub top_tags: TopTagsQueryHandler,
    pub heatmap: HeatmapQueryHandler,
    pub impact: ImpactQueryHandler,
    pub lifecycle: LifecycleQueryHandler,
    pub feed: FeedQueryHandler,
    pub auth: AuthService,
}

impl TagServices {
    pub fn new(db: SqlConnect, cache: MemoryCache) -> Self {
        Self {
            top_tags: TopTagsQueryHandler::new(db.clone(), cache.clone()),
            heatmap: HeatmapQueryHandler::new(db.clone(), cache),
            impact: ImpactQueryHandler::new(db.clone()),
            lifecycle: LifecycleQueryHandler::new(db.clone()),
            feed: FeedQueryHandler::new(db.clone()),
            auth: AuthService::new(db),
        }
    }

    pub fn with_components(
        top_tags: TopTagsQueryHandler, heatmap: HeatmapQueryHandler,
        impact: ImpactQueryHandler, lifecycle: LifecycleQueryHandler,
        feed: FeedQueryHandler, auth: AuthService,
    ) -> Self {
        Self {
            top_tags,
            heatmap,
            impact,
            lifecycle,
            feed,
            auth,
        }
    }
}

pub struct TagHandlers;

impl TagHandlers {
    pub fn routes() -> Router<TagServices> {
        Router::new()
            .route("/tags/top", get(get_top_tags))
            .route("/tags/analytics/heatmap", get(get_heatmap))
            .route("/tags/analytics/impact", get(get_impact))
            .route("/tags/analytics/lifecycle", get(get_lifecycle))
            .route("/tags/feed", get(get_feed))
    }
}

// ============================================================================
// Query Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct TopTagsParams {
    /// Restrict the ranking to one entity type
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ImpactParams {
    pub tag_id: Option<Uuid>,
    pub days_back: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleParams {
    pub tag_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct FeedParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================================
// Response Structs
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct TopTagsResponse {
    pub tags: Vec<TagUsage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HeatmapResponse {
    pub heatmap: Vec<HeatmapCell>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImpactResponse {
    pub metrics: TagImpactMetrics,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LifecycleResponse {
    pub lifecycle: TagLifecycle,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedResponse {
    pub feed: Vec<TagFeedEntry>,
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/tags/top",
    params(TopTagsParams),
    responses(
        (status = 200, description = "Top tags ranked by usage", body = TopTagsResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "tags"
)]
#[instrument(skip_all)]
pub async fn get_top_tags(
    State(services): State<TagServices>, Query(params): Query<TopTagsParams>,
) -> Result<Json<TopTagsResponse>, AppError> {
    let tags = services
        .top_tags
        .execute(TopTagsQuery {
            entity_type: params.entity_type,
            limit: params.limit,
        })
        .await
        .map_err(|TopTagsError::Store(e)| AppError::from_error(e))?;

    Ok(Json(TopTagsResponse { tags }))
}

#[utoipa::path(
    get,
    path = "/tags/analytics/heatmap",
    responses(
        (status = 200, description = "Tag usage density per entity type", body = HeatmapResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "tag-analytics"
)]
#[instrument(skip_all)]
pub async fn get_heatmap(
    State(services): State<TagServices>,
) -> Result<Json<HeatmapResponse>, AppError> {
    let heatmap = services
        .heatmap
        .execute()
        .await
        .map_err(|tag_queries::HeatmapError::Store(e)| {
            AppError::from_error(e)
        })?;

    Ok(Json(HeatmapResponse { heatmap }))
}

#[utoipa::path(
    get,
    path = "/tags/analytics/impact",
    params(ImpactParams),
    responses(
        (status = 200, description = "Engagement impact metrics for a tag", body = ImpactResponse),
        (status = 400, description = "tagId missing"),
        (status = 404, description = "Tag not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tag-analytics"
)]
#[instrument(skip_all)]
pub async fn get_impact(
    State(services): State<TagServices>, Query(params): Query<ImpactParams>,
) -> Result<Json<ImpactResponse>, AppError> {
    let tag_id = params.tag_id.ok_or_else(|| {
        AppError::bad_request(
            "MISSING_TAG_ID",
            "tagId query parameter is required",
        )
    })?;

    let metrics = services
        .impact
        .execute(ImpactQuery {
            tag_id,
            days_back: params.days_back,
        })
        .await
        .map_err(|e| {
            match e {
                ImpactError::TagNotFound { tag_id } => {
                    AppError::not_found(
                        "TAG_NOT_FOUND",
                        &format!("Tag {tag_id} does not exist"),
                    )
                }
                ImpactError::Store(e) => AppError::from_error(e),
            }
        })?;

    Ok(Json(ImpactResponse { metrics }))
}

#[utoipa::path(
    get,
    path = "/tags/analytics/lifecycle",
    params(LifecycleParams),
    responses(
        (status = 200, description = "Usage history of a tag from creation to present", body = LifecycleResponse),
        (status = 400, description = "tagId missing"),
        (status = 404, description = "Tag not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tag-analytics"
)]
#[instrument(skip_all)]
pub async fn get_lifecycle(
    State(services): State<TagServices>,
    Query(params): Query<LifecycleParams>,
) -> Result<Json<LifecycleResponse>, AppError> {
    let tag_id = params.tag_id.ok_or_else(|| {
        AppError::bad_request(
            "MISSING_TAG_ID",
            "tagId query parameter is required",
        )
    })?;

    let lifecycle = services
        .lifecycle
        .execute(LifecycleQuery { tag_id })
        .await
        .map_err(|e| {
            match e {
                LifecycleError::TagNotFound { tag_id } => {
                    AppError::not_found(
                        "TAG_NOT_FOUND",
                        &format!("Tag {tag_id} does not exist"),
                    )
                }
                LifecycleError::Store(e) => AppError::from_error(e),
            }
        })?;

    Ok(Json(LifecycleResponse { lifecycle }))
}

#[utoipa::path(
    get,
    path = "/tags/feed",
    params(FeedParams),
    responses(
        (status = 200, description = "Recently tagged entities for the caller's subscribed tags", body = FeedResponse),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "tag-feed"
)]
#[instrument(skip_all)]
pub async fn get_feed(
    State(services): State<TagServices>, headers: HeaderMap,
    Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>, AppError> {
    // Authentication is settled before any feed data is touched.
    let user_id = services.auth.authenticate(&headers).await?;

    let feed = services
        .feed
        .execute(FeedQuery {
            user_id,
            limit: params.limit,
            offset: params.offset,
        })
        .await
        .map_err(|tag_queries::FeedError::Store(e)| AppError::from_error(e))?;

    Ok(Json(FeedResponse { feed }))
}
