//! Image upload to the external asset host.
//!
//! Each attached file is read fully into memory, wrapped in a base64 data URI
//! tagged with its content type and posted to the host under a fixed folder.
//! The host answers with a stable `secure_url` that is stored on the listing.
use crate::form::FilePayload;
use crate::settings::Assets as AssetsCfg;
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, Diagnostic)]
pub enum AssetError {
    #[error("asset host request failed: {0}")]
    #[diagnostic(code(propertypulse::asset::http))]
    Http(#[from] reqwest::Error),

    #[error("asset host rejected upload ({status}): {body}")]
    #[diagnostic(
        code(propertypulse::asset::rejected),
        help("Check assets.cloud_name, assets.api_key and assets.api_secret")
    )]
    Rejected { status: u16, body: String },

    #[error("asset host response did not contain a secure_url")]
    #[diagnostic(code(propertypulse::asset::missing_url))]
    MissingUrl,

    #[error("upload cancelled")]
    #[diagnostic(code(propertypulse::asset::cancelled))]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub secure_url: String,
    #[serde(default)]
    pub public_id: Option<String>,
}

/// Remote service that stores images and hands back public URLs.
#[async_trait]
pub trait AssetHost: Send + Sync {
    async fn upload(
        &self,
        payload: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<UploadedAsset, AssetError>;
}

/// How many uploads of one submission may be in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPolicy {
    /// One at a time, in submission order.
    #[default]
    Sequential,
    /// Up to `n` concurrent uploads; results keep submission order.
    Bounded(usize),
}

impl UploadPolicy {
    pub fn from_limit(max_concurrent: usize) -> Self {
        if max_concurrent <= 1 {
            UploadPolicy::Sequential
        } else {
            UploadPolicy::Bounded(max_concurrent)
        }
    }

    fn width(self) -> usize {
        match self {
            UploadPolicy::Sequential => 1,
            UploadPolicy::Bounded(n) => n.max(1),
        }
    }
}

pub fn content_type_or_default(content_type: &str) -> &str {
    if content_type.trim().is_empty() {
        "application/octet-stream"
    } else {
        content_type
    }
}

/// `data:<type>;base64,<payload>` for one file.
pub fn to_data_uri(file: &FilePayload) -> String {
    format!(
        "data:{};base64,{}",
        content_type_or_default(&file.content_type),
        Base64::encode_string(&file.bytes)
    )
}

async fn upload_one(
    host: &dyn AssetHost,
    file: &FilePayload,
    folder: &str,
) -> Result<String, AssetError> {
    let content_type = content_type_or_default(&file.content_type);
    let payload = to_data_uri(file);
    let uploaded = host.upload(&payload, content_type, folder).await?;
    tracing::debug!(
        file = %file.name,
        bytes = file.bytes.len(),
        url = %uploaded.secure_url,
        "Uploaded image"
    );
    Ok(uploaded.secure_url)
}

/// Upload every file and return the hosted URLs in the order the files were
/// given. The first failure stops the batch; URLs uploaded before it are
/// not removed from the host.
pub async fn upload_images(
    host: Arc<dyn AssetHost>,
    files: Vec<FilePayload>,
    folder: &str,
    policy: UploadPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<String>, AssetError> {
    // Each upload owns its inputs so the batch stays Send across handlers
    let uploads: Vec<BoxFuture<'static, Result<String, AssetError>>> = files
        .into_iter()
        .map(|file| {
            let host = host.clone();
            let folder = folder.to_string();
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(AssetError::Cancelled),
                    result = upload_one(host.as_ref(), &file, &folder) => result,
                }
            }
            .boxed()
        })
        .collect();

    stream::iter(uploads)
        .buffered(policy.width())
        .try_collect()
        .await
}

/// Cloudinary-compatible upload client.
#[derive(Clone)]
pub struct HttpAssetHost {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
}

impl HttpAssetHost {
    pub fn new(cfg: &AssetsCfg) -> Result<Self, AssetError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1_1/{}/image/upload",
                cfg.base_url.trim_end_matches('/'),
                cfg.cloud_name
            ),
            api_key: cfg.api_key.clone(),
            api_secret: cfg.api_secret.clone(),
        })
    }
}

/// Signed parameters sorted by name, joined as a query string, then suffixed
/// with the API secret.
pub fn sign_upload(folder: &str, timestamp: i64, api_secret: &str) -> String {
    let to_sign = format!("folder={folder}&timestamp={timestamp}{api_secret}");
    format!("{:x}", Sha256::digest(to_sign.as_bytes()))
}

#[async_trait]
impl AssetHost for HttpAssetHost {
    async fn upload(
        &self,
        payload: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<UploadedAsset, AssetError> {
        let timestamp = Utc::now().timestamp();
        let signature = sign_upload(folder, timestamp, &self.api_secret);
        let timestamp = timestamp.to_string();

        let params = [
            ("file", payload),
            ("folder", folder),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        tracing::debug!(%content_type, %folder, "Posting image to asset host");
        let response = self.client.post(&self.endpoint).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssetError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response.json().await?;
        match parsed.secure_url {
            Some(secure_url) if !secure_url.is_empty() => Ok(UploadedAsset {
                secure_url,
                public_id: parsed.public_id,
            }),
            _ => Err(AssetError::MissingUrl),
        }
    }
}
