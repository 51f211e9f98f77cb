pub mod auth;
pub mod cert;
pub mod cli;
pub mod esa;
pub mod plugin;
pub mod utils;

pub use auth::{CredentialSource, Credentials};
pub use cert::{CertificateParser, CertificateSummary};
pub use esa::{CertificateRecord, EsaClient, SetCertificateRequest, SetCertificateResponse};
pub use plugin::{CertificateApi, CertificateRotator, Failure, PluginConfig, RotationReport, Stage};
pub use utils::errors::{Result, RotatorError};
