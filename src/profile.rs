//! Client side of the profile page: the owner's listings and their removal.
//!
//! `ProfileListings` owns its copy of the list. Deleting walks
//! Idle → Confirming → Deleting → Idle; the list is reconciled locally after
//! the remote call so the page never has to reload.
use crate::session::SessionCookie;
use crate::storage::PropertySummary;
use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this property?";

#[derive(Debug, Error, Diagnostic)]
pub enum DeleteError {
    #[error("delete request failed: {0}")]
    #[diagnostic(code(propertypulse::profile::http))]
    Http(#[from] reqwest::Error),

    #[error("server refused delete ({status}): {message}")]
    #[diagnostic(code(propertypulse::profile::refused))]
    Refused { status: u16, message: String },
}

/// Remote side of a delete.
#[async_trait]
pub trait PropertyDeleter: Send + Sync {
    async fn delete(&self, id: &str) -> Result<(), DeleteError>;
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionState {
    Idle,
    Confirming(String),
    Deleting(String),
}

/// When the local list drops a deleted item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Only after the server confirmed the delete.
    #[default]
    ConfirmedOnly,
    /// As soon as the remote call returns, whatever its outcome.
    Optimistic,
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Declined,
    Deleted,
    Failed(DeleteError),
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted)
    }
}

#[derive(Debug)]
pub struct ProfileListings {
    listings: Vec<PropertySummary>,
    state: DeletionState,
    policy: ReconcilePolicy,
}

impl ProfileListings {
    pub fn new(listings: Vec<PropertySummary>) -> Self {
        Self::with_policy(listings, ReconcilePolicy::default())
    }

    pub fn with_policy(listings: Vec<PropertySummary>, policy: ReconcilePolicy) -> Self {
        Self {
            listings,
            state: DeletionState::Idle,
            policy,
        }
    }

    pub fn listings(&self) -> &[PropertySummary] {
        &self.listings
    }

    pub fn state(&self) -> &DeletionState {
        &self.state
    }

    /// Drop `id` from the local list. Unknown ids leave the list untouched.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.listings.len();
        self.listings.retain(|p| p.id != id);
        self.listings.len() != before
    }

    pub async fn request_delete(
        &mut self,
        id: &str,
        confirm: &mut dyn Confirm,
        deleter: &dyn PropertyDeleter,
    ) -> DeleteOutcome {
        self.state = DeletionState::Confirming(id.to_string());
        if !confirm.confirm(DELETE_PROMPT) {
            self.state = DeletionState::Idle;
            return DeleteOutcome::Declined;
        }

        self.state = DeletionState::Deleting(id.to_string());
        let result = deleter.delete(id).await;

        let outcome = match result {
            Ok(()) => {
                self.remove(id);
                DeleteOutcome::Deleted
            }
            Err(e) => {
                tracing::warn!(property_id = %id, error = %e, "Failed to delete property");
                if self.policy == ReconcilePolicy::Optimistic {
                    self.remove(id);
                }
                DeleteOutcome::Failed(e)
            }
        };

        self.state = DeletionState::Idle;
        outcome
    }
}

/// Calls `DELETE /properties/{id}` on the listing service with the user's session.
#[derive(Clone)]
pub struct HttpPropertyDeleter {
    client: reqwest::Client,
    base_url: String,
    session: SessionCookie,
}

impl HttpPropertyDeleter {
    pub fn new(base_url: &str, session: SessionCookie) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    /// Load the caller's current listings from the service.
    pub async fn fetch_listings(&self) -> Result<Vec<PropertySummary>, DeleteError> {
        let response = self
            .client
            .get(format!("{}/profile/properties", self.base_url))
            .header(reqwest::header::COOKIE, self.session.to_request_header())
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DeleteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(DeleteError::Refused {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PropertyDeleter for HttpPropertyDeleter {
    async fn delete(&self, id: &str) -> Result<(), DeleteError> {
        let response = self
            .client
            .delete(format!("{}/properties/{}", self.base_url, id))
            .header(reqwest::header::COOKIE, self.session.to_request_header())
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
