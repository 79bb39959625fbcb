//! HTTP access to the tracking API.

mod authenticated_client;
mod dto;
mod reqwest_transport;
mod token_api;

pub use authenticated_client::AuthenticatedClient;
pub use reqwest_transport::{DEFAULT_TIMEOUT, ReqwestTransport};
pub use token_api::{ME_PATH, REFRESH_PATH, TOKEN_PATH, TokenApi};
