//! Generic CRUD access to one collection endpoint.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::entities::{Bag, Batch, RecordStatus, RequestDescriptor};
use crate::domain::errors::ApiError;
use crate::infrastructure::http::AuthenticatedClient;

/// Records carrying a workflow status.
pub trait StatusRecord {
    /// Current workflow status.
    fn status(&self) -> RecordStatus;

    /// Batch whose completion also locks this record.
    fn parent_batch(&self) -> Option<u64> {
        None
    }
}

impl StatusRecord for Batch {
    fn status(&self) -> RecordStatus {
        self.status
    }
}

impl StatusRecord for Bag {
    fn status(&self) -> RecordStatus {
        self.status
    }

    fn parent_batch(&self) -> Option<u64> {
        Some(self.batch)
    }
}

/// Typed access to a collection such as `/batches/`.
pub struct ResourceApi<T> {
    client: Arc<AuthenticatedClient>,
    collection: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceApi<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            collection: self.collection,
            _record: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> ResourceApi<T> {
    /// Creates API for the collection at `collection`, e.g. `/bags/`.
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>, collection: &'static str) -> Self {
        Self {
            client,
            collection,
            _record: PhantomData,
        }
    }

    /// Returns the collection path.
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        self.collection
    }

    fn item_path(&self, id: u64) -> String {
        format!("{}{id}/", self.collection)
    }

    /// Lists every record.
    ///
    /// # Errors
    /// Returns error if the request fails or the body is not a record list.
    pub async fn list(&self) -> Result<Vec<T>, ApiError> {
        self.client
            .request_json(RequestDescriptor::get(self.collection))
            .await
    }

    /// Lists records matching `filters`.
    ///
    /// # Errors
    /// Returns error if the request fails or the body is not a record list.
    pub async fn list_filtered(&self, filters: Vec<(String, String)>) -> Result<Vec<T>, ApiError> {
        let request = filters
            .into_iter()
            .fold(RequestDescriptor::get(self.collection), |request, (key, value)| {
                request.with_query(key, value)
            });
        self.client.request_json(request).await
    }

    /// Fetches one record.
    ///
    /// # Errors
    /// Returns error if the request fails or the record does not exist.
    pub async fn get(&self, id: u64) -> Result<T, ApiError> {
        self.client
            .request_json(RequestDescriptor::get(self.item_path(id)))
            .await
    }

    /// Creates a record.
    ///
    /// # Errors
    /// Returns error if the backend rejects the payload.
    pub async fn create<D: Serialize + ?Sized>(&self, draft: &D) -> Result<T, ApiError> {
        debug!(collection = self.collection, "Creating record");
        let request = RequestDescriptor::post(self.collection)
            .with_json(draft)
            .map_err(|e| ApiError::unexpected(e.to_string()))?;
        self.client.request_json(request).await
    }

    /// Replaces a record.
    ///
    /// # Errors
    /// Returns error if the backend rejects the payload.
    pub async fn update<D: Serialize + ?Sized>(&self, id: u64, draft: &D) -> Result<T, ApiError> {
        let request = RequestDescriptor::put(self.item_path(id))
            .with_json(draft)
            .map_err(|e| ApiError::unexpected(e.to_string()))?;
        self.client.request_json(request).await
    }

    /// Changes selected attributes of a record.
    ///
    /// # Errors
    /// Returns error if the backend rejects the payload.
    pub async fn partial_update(&self, id: u64, changes: Value) -> Result<T, ApiError> {
        self.client
            .request_json(RequestDescriptor::patch(self.item_path(id)).with_body(changes))
            .await
    }

    /// Deletes a record.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        debug!(collection = self.collection, id, "Deleting record");
        self.client
            .request(RequestDescriptor::delete(self.item_path(id)))
            .await
            .map(drop)
    }
}

impl<T: DeserializeOwned + StatusRecord> ResourceApi<T> {
    /// Moves a record to `status`.
    ///
    /// # Errors
    /// Returns error if the backend refuses the transition.
    pub async fn set_status(&self, id: u64, status: RecordStatus) -> Result<T, ApiError> {
        self.partial_update(id, json!({ "status": status })).await
    }
}
