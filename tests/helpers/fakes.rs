//! In-memory stand-ins for the collaborators of the listing flows.
use async_trait::async_trait;
use axum::http::HeaderMap;
use base64ct::{Base64, Encoding};
use propertypulse::assets::{AssetError, AssetHost, UploadedAsset};
use propertypulse::cache::ViewCache;
use propertypulse::errors::PulseError;
use propertypulse::identity::{Identity, IdentityResolver};
use propertypulse::storage::{NewProperty, Property, PropertyRepository};
use sea_orm::{DbErr, RuntimeErr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

pub struct FakeIdentity {
    identity: Option<Identity>,
    pub calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn signed_in(id: &str) -> Self {
        Self {
            identity: Some(Identity { id: id.to_string() }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            identity: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityResolver for FakeIdentity {
    async fn current_identity(&self, _headers: &HeaderMap) -> Result<Option<Identity>, PulseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.identity.clone())
    }
}

/// Asset host that names each URL after the first byte of the uploaded file.
/// Files with a lower tag answer more slowly, so concurrent uploads finish
/// in reverse order.
pub struct FakeAssetHost {
    pub uploads: Mutex<Vec<(String, String)>>,
    fail_on_tag: Option<u8>,
}

impl FakeAssetHost {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_on_tag: None,
        }
    }

    pub fn failing_on(tag: u8) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_on_tag: Some(tag),
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn url_for(tag: u8) -> String {
        format!("https://assets.test/propertypulse/{tag}")
    }
}

#[async_trait]
impl AssetHost for FakeAssetHost {
    async fn upload(
        &self,
        payload: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<UploadedAsset, AssetError> {
        assert!(payload.starts_with(&format!("data:{content_type};base64,")));
        let encoded = payload.split(";base64,").nth(1).unwrap();
        let tag = Base64::decode_vec(encoded).unwrap()[0];

        self.uploads
            .lock()
            .unwrap()
            .push((folder.to_string(), content_type.to_string()));

        tokio::time::sleep(Duration::from_millis(u64::from(10u8.saturating_sub(tag)) * 5)).await;

        if Some(tag) == self.fail_on_tag {
            return Err(AssetError::Rejected {
                status: 503,
                body: "host unavailable".to_string(),
            });
        }

        Ok(UploadedAsset {
            secure_url: Self::url_for(tag),
            public_id: Some(format!("{folder}/{tag}")),
        })
    }
}

#[derive(Default)]
pub struct FakeRepository {
    pub records: Mutex<Vec<Property>>,
    pub creates: AtomicUsize,
    pub fail_create: bool,
    pub unreachable: bool,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    /// Store whose readiness check fails.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PropertyRepository for FakeRepository {
    async fn ensure_ready(&self) -> Result<(), PulseError> {
        if self.unreachable {
            return Err(PulseError::Db(DbErr::Conn(RuntimeErr::Internal(
                "connection refused".to_string(),
            ))));
        }
        Ok(())
    }

    async fn create(&self, input: NewProperty) -> Result<Property, PulseError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(PulseError::Other("store unavailable".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        let property = Property {
            id: format!("prop-{}", records.len() + 1),
            owner: input.owner,
            fields: input.fields,
            images: input.images,
            created_at: 0,
            updated_at: 0,
        };
        records.push(property.clone());
        Ok(property)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, PulseError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Property>, PulseError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|p| p.owner == owner).cloned().collect())
    }

    async fn delete_by_id(&self, id: &str, owner: &str) -> Result<(), PulseError> {
        let mut records = self.records.lock().unwrap();
        let idx = records
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PulseError::NotFound(id.to_string()))?;
        if records[idx].owner != owner {
            return Err(PulseError::Forbidden(id.to_string()));
        }
        records.remove(idx);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCache {
    pub scopes: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn scopes(&self) -> Vec<String> {
        self.scopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ViewCache for RecordingCache {
    async fn invalidate(&self, scope: &str) {
        self.scopes.lock().unwrap().push(scope.to_string());
    }
}

/// Wraps a real repository and, once armed, holds the next owner listing
/// after it has been read until `release` is notified.
pub struct StallingRepository {
    inner: Arc<dyn PropertyRepository>,
    armed: AtomicBool,
    pub loaded: Notify,
    pub release: Notify,
}

impl StallingRepository {
    pub fn new(inner: Arc<dyn PropertyRepository>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            loaded: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn stall_next_listing(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PropertyRepository for StallingRepository {
    async fn ensure_ready(&self) -> Result<(), PulseError> {
        self.inner.ensure_ready().await
    }

    async fn create(&self, input: NewProperty) -> Result<Property, PulseError> {
        self.inner.create(input).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, PulseError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Property>, PulseError> {
        let listed = self.inner.find_by_owner(owner).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.loaded.notify_one();
            self.release.notified().await;
        }
        listed
    }

    async fn delete_by_id(&self, id: &str, owner: &str) -> Result<(), PulseError> {
        self.inner.delete_by_id(id, owner).await
    }
}
