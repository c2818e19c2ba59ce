//! Client for the remote AQMS REST API.
//!
//! `normalize` owns the envelope rules, `client` the transport, `service`
//! the endpoint catalogue.

mod client;
mod error;
pub mod normalize;
mod service;

pub use client::{ApiClient, Params};
pub use error::{ApiError, DECODE_ERROR, NETWORK_ERROR};
pub use normalize::{decode, error_from_response, normalize, read_body, Shape, METADATA_KEYS};
pub use service::{AqmsService, SettingsRemote};

/// Default deployment of the AQMS backend.
pub const DEFAULT_BASE_URL: &str = "https://kalibarasi-biru-langit.vercel.app";
