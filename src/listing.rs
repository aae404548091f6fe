//! Listing creation: one form submission in, one stored property out.
use crate::assets::{self, AssetHost, UploadPolicy};
use crate::cache::{ViewCache, LAYOUT_SCOPE};
use crate::errors::PulseError;
use crate::form::{self, CoercionPolicy, FormData};
use crate::identity::{self, IdentityResolver};
use crate::storage::{NewProperty, Property, PropertyRepository};
use axum::http::HeaderMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Form field carrying image attachments.
pub const IMAGES_FIELD: &str = "images";

/// Collaborators and policies for the creation flow.
#[derive(Clone)]
pub struct CreateContext {
    pub identity: Arc<dyn IdentityResolver>,
    pub repository: Arc<dyn PropertyRepository>,
    pub assets: Arc<dyn AssetHost>,
    pub cache: Arc<dyn ViewCache>,
    pub asset_folder: String,
    pub upload_policy: UploadPolicy,
    pub coercion: CoercionPolicy,
}

#[derive(Debug, Clone)]
pub struct CreatedProperty {
    pub property: Property,
    /// Where the caller should be sent next.
    pub redirect_to: String,
}

pub fn property_path(id: &str) -> String {
    format!("/properties/{id}")
}

pub async fn create_property(
    ctx: &CreateContext,
    headers: &HeaderMap,
    form: &FormData,
    cancel: &CancellationToken,
) -> Result<CreatedProperty, PulseError> {
    ctx.repository.ensure_ready().await?;

    let owner = identity::require_identity(ctx.identity.as_ref(), headers).await?;

    // Validate before uploading so a rejected submission leaves nothing on the host
    let fields = form::property_fields(form, ctx.coercion).map_err(PulseError::Validation)?;

    let images = form.files(IMAGES_FIELD);
    let image_urls = assets::upload_images(
        ctx.assets.clone(),
        images,
        &ctx.asset_folder,
        ctx.upload_policy,
        cancel,
    )
    .await?;

    let input = NewProperty {
        owner: owner.id.clone(),
        fields,
        images: image_urls,
    };

    let property = match ctx.repository.create(input.clone()).await {
        Ok(property) => property,
        Err(e) => {
            if !input.images.is_empty() {
                tracing::warn!(
                    owner = %input.owner,
                    orphaned = ?input.images,
                    "Property was not saved; uploaded images remain on the asset host"
                );
            }
            return Err(e);
        }
    };

    ctx.cache.invalidate(LAYOUT_SCOPE).await;

    tracing::info!(
        property_id = %property.id,
        owner = %property.owner,
        images = property.images.len(),
        "Created property"
    );

    Ok(CreatedProperty {
        redirect_to: property_path(&property.id),
        property,
    })
}
