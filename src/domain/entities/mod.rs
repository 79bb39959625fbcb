//! Domain entity definitions.

mod bag;
mod batch;
mod credentials;
mod form;
mod record;
mod request;
mod submission;
mod token;

pub use bag::{Bag, BagDraft};
pub use batch::{Batch, BatchDraft};
pub use credentials::{
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, REMEMBER_KEY, SESSION_KEYS, SessionCredentials,
    StorageScope, USER_PROFILE_KEY, UserProfile,
};
pub use form::{FieldType, Form, FormDraft, FormField, ValidationRules};
pub use record::{AssociationType, RecordStatus};
pub use request::{AUTHORIZATION, ApiResponse, HttpMethod, RequestDescriptor};
pub use submission::{Submission, SubmissionDraft, SubmissionQuery};
pub use token::{AccessToken, RefreshToken, TokenPair};
