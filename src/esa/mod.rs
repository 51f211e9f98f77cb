pub mod certificates;
pub mod client;
pub mod error;
pub mod signer;

pub use certificates::{CertificateRecord, SetCertificateRequest, SetCertificateResponse};
pub use client::EsaClient;
pub use error::{translate, ApiError, ServiceError};

use reqwest::Client;

/// ESA OpenAPI version the plugin speaks.
pub const API_VERSION: &str = "2024-09-10";

/// Create a standardized HTTP client with security best practices
pub fn create_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .use_rustls_tls() // Use rustls with system certificate store
        .build()
}
