use crate::config::AppConfig;
use crate::processing::scale_markers;
use crate::types::{Marker, Observation, Region};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

// Wrapper for RTree indexing
pub struct RegionIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for RegionIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub observations: Vec<Observation>,
    pub regions: Vec<Region>,
    pub tree: RTree<RegionIndex>,
    pub overlay_raw: Option<Vec<u8>>,
    pub config: AppConfig,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid marker request: {0}")]
    BadRequest(String),
    #[error("no overlay configured")]
    NoOverlay,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NoOverlay => StatusCode::NOT_FOUND,
        };
        let body = Json(HashMap::from([("error", self.to_string())]));
        (status, body).into_response()
    }
}

#[derive(Deserialize)]
pub struct MarkerParams {
    zoom: Option<u8>,
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct RegionResponse {
    id: String,
}

pub async fn start_server(
    config: AppConfig,
    observations: Vec<Observation>,
    overlay: Option<(Vec<u8>, Vec<Region>)>,
) -> Result<()> {
    let (overlay_raw, regions) = match overlay {
        Some((raw, regions)) => (Some(raw), regions),
        None => (None, Vec::new()),
    };

    // Build Spatial Index
    tracing::info!("Building spatial index for {} regions...", regions.len());
    let tree_items: Vec<RegionIndex> = regions
        .iter()
        .enumerate()
        .filter_map(|(i, region)| {
            let rect = region.geometry.bounding_rect()?;
            Some(RegionIndex {
                index: i,
                aabb: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    let tree = RTree::bulk_load(tree_items);

    let port = config.server.port;
    let static_dir = config.server.static_dir.clone();

    let state = Arc::new(AppState {
        observations,
        regions,
        tree,
        overlay_raw,
        config,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/api/markers", get(markers_handler))
        .route("/api/query", get(query_handler))
        .route("/geojson", get(geojson_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn markers_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MarkerParams>,
) -> Result<Json<Vec<Marker>>, ApiError> {
    // Zoom defaults to 1, the widget's initial zoom level.
    let zoom = params.zoom.unwrap_or(1);
    let markers = scale_markers(
        &state.observations,
        zoom,
        state.config.markers.default_radius,
    )
    .map_err(|e| ApiError::BadRequest(format!("{e:#}")))?;
    Ok(Json(markers))
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<RegionResponse>> {
    let point = Point::new(params.lon, params.lat);
    let envelope = AABB::from_point([params.lon, params.lat]);

    let candidates = state.tree.locate_in_envelope_intersecting(&envelope);

    for candidate in candidates {
        if let Some(region) = state.regions.get(candidate.index) {
            if region.geometry.contains(&point) {
                return Json(Some(RegionResponse {
                    id: region.id.clone(),
                }));
            }
        }
    }

    Json(None)
}

async fn geojson_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let raw = state.overlay_raw.clone().ok_or(ApiError::NoOverlay)?;
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        raw,
    )
        .into_response())
}
