//! Entry point to every tracking API resource.

use std::sync::Arc;

use crate::domain::entities::{
    Bag, Batch, Form, FormField, RequestDescriptor, Submission, SubmissionQuery, UserProfile,
};
use crate::domain::errors::ApiError;
use crate::infrastructure::http::{AuthenticatedClient, ME_PATH};

use super::resource::ResourceApi;

/// Batches collection.
pub const BATCHES_PATH: &str = "/batches/";
/// Bags collection.
pub const BAGS_PATH: &str = "/bags/";
/// Forms collection.
pub const FORMS_PATH: &str = "/forms/";
/// Form fields collection.
pub const FORM_FIELDS_PATH: &str = "/formfields/";
/// Submissions collection.
pub const SUBMISSIONS_PATH: &str = "/submissions/";

/// Typed resource APIs sharing one authenticated client.
#[derive(Clone)]
pub struct TrackerApi {
    client: Arc<AuthenticatedClient>,
}

impl TrackerApi {
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    #[must_use]
    pub const fn client(&self) -> &Arc<AuthenticatedClient> {
        &self.client
    }

    #[must_use]
    pub fn batches(&self) -> ResourceApi<Batch> {
        ResourceApi::new(Arc::clone(&self.client), BATCHES_PATH)
    }

    #[must_use]
    pub fn bags(&self) -> ResourceApi<Bag> {
        ResourceApi::new(Arc::clone(&self.client), BAGS_PATH)
    }

    #[must_use]
    pub fn forms(&self) -> ResourceApi<Form> {
        ResourceApi::new(Arc::clone(&self.client), FORMS_PATH)
    }

    #[must_use]
    pub fn form_fields(&self) -> ResourceApi<FormField> {
        ResourceApi::new(Arc::clone(&self.client), FORM_FIELDS_PATH)
    }

    #[must_use]
    pub fn submissions(&self) -> ResourceApi<Submission> {
        ResourceApi::new(Arc::clone(&self.client), SUBMISSIONS_PATH)
    }

    /// Lists submissions, optionally filtered by form and association.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_submissions(
        &self,
        query: &SubmissionQuery,
    ) -> Result<Vec<Submission>, ApiError> {
        self.submissions().list_filtered(query.to_pairs()).await
    }

    /// Fetches the profile of the logged-in user.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.client.request_json(RequestDescriptor::get(ME_PATH)).await
    }
}
