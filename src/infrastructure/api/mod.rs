//! Typed tracking API resources.

mod resource;
mod tracker_api;

pub use resource::{ResourceApi, StatusRecord};
pub use tracker_api::{
    BAGS_PATH, BATCHES_PATH, FORM_FIELDS_PATH, FORMS_PATH, SUBMISSIONS_PATH, TrackerApi,
};
