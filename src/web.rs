//! HTTP endpoints for submitting, viewing and removing listings.
use crate::assets::HttpAssetHost;
use crate::cache::{ListingCache, ViewCache};
use crate::errors::PulseError;
use crate::form::FormData;
use crate::identity::{self, IdentityResolver, SessionIdentityResolver};
use crate::listing::{self, CreateContext};
use crate::settings::Settings;
use crate::storage::{DbPropertyRepository, Property, PropertyRepository, PropertySummary};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub create: CreateContext,
    pub repository: Arc<dyn PropertyRepository>,
    pub identity: Arc<dyn IdentityResolver>,
    pub listings: ListingCache,
}

impl AppState {
    /// Wire the production collaborators for `settings`.
    pub fn new(settings: Settings, db: DatabaseConnection) -> Result<Self, PulseError> {
        let repository: Arc<dyn PropertyRepository> = Arc::new(DbPropertyRepository::new(db.clone()));
        let identity: Arc<dyn IdentityResolver> = Arc::new(SessionIdentityResolver::new(db));
        let assets = Arc::new(HttpAssetHost::new(&settings.assets)?);
        let listings = ListingCache::new(
            settings.cache.max_entries,
            Duration::from_secs(settings.cache.ttl_secs),
        );

        let create = CreateContext {
            identity: identity.clone(),
            repository: repository.clone(),
            assets,
            cache: Arc::new(listings.clone()),
            asset_folder: settings.assets.folder.clone(),
            upload_policy: settings.upload_policy(),
            coercion: settings.coercion_policy(),
        };

        Ok(Self {
            settings: Arc::new(settings),
            create,
            repository,
            identity,
            listings,
        })
    }
}

// Security headers middleware
async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.settings.server.max_upload_bytes;

    Router::new()
        .route("/properties", post(create_property))
        .route(
            "/properties/{id}",
            get(get_property).delete(delete_property),
        )
        .route("/profile/properties", get(profile_properties))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, db: DatabaseConnection) -> miette::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let state = AppState::new(settings, db)?;
    let app = router(state);

    tracing::info!(%addr, "Listing API listening");
    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}

/// POST /properties
/// Create a listing from a multipart form and redirect to it
async fn create_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Redirect, PulseError> {
    let form = FormData::from_multipart(multipart).await?;

    // Dropping the handler (client went away) cancels pending uploads
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let created = listing::create_property(&state.create, &headers, &form, &cancel).await?;
    Ok(Redirect::to(&created.redirect_to))
}

/// GET /properties/{id}
async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Property>, PulseError> {
    let found = state.repository.find_by_id(&id).await?;
    let property = found.ok_or(PulseError::NotFound(id))?;
    Ok(Json(property))
}

/// DELETE /properties/{id}
/// Only the owner may delete a listing
async fn delete_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, PulseError> {
    let owner = identity::require_identity(state.identity.as_ref(), &headers).await?;

    state.repository.delete_by_id(&id, &owner.id).await?;
    state.listings.invalidate(&owner.id).await;

    tracing::info!(property_id = %id, owner = %owner.id, "Deleted property");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /profile/properties
/// The caller's own listings
async fn profile_properties(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PropertySummary>>, PulseError> {
    let owner = identity::require_identity(state.identity.as_ref(), &headers).await?;

    if let Some(cached) = state.listings.get(&owner.id).await {
        return Ok(Json(cached.as_ref().clone()));
    }

    let loaded_at = state.listings.epoch();
    let summaries: Vec<PropertySummary> = state
        .repository
        .find_by_owner(&owner.id)
        .await?
        .iter()
        .map(Property::summary)
        .collect();

    state
        .listings
        .insert_loaded(&owner.id, summaries.clone(), loaded_at)
        .await;
    Ok(Json(summaries))
}
