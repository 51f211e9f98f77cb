use super::config::PluginConfig;
use crate::cert::CertificateParser;
use crate::esa::{translate, CertificateRecord, SetCertificateRequest, SetCertificateResponse};
use crate::utils::errors::{Result, RotatorError};
use async_trait::async_trait;
use std::fmt;

/// Keyword sent with `ListCertificates`. This is the literal string, not the
/// configured domain name.
pub const LIST_KEYWORD: &str = "domain";

/// The three remote operations a rotation needs.
#[async_trait]
pub trait CertificateApi {
    async fn list_certificates(
        &self,
        site_id: i64,
        keyword: &str,
    ) -> Result<Vec<CertificateRecord>>;

    async fn delete_certificate(&self, site_id: i64, id: &str) -> Result<()>;

    async fn set_certificate(
        &self,
        request: &SetCertificateRequest,
    ) -> Result<SetCertificateResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    CreateClient,
    List,
    Delete,
    Upload,
}

impl Stage {
    fn context(self) -> Option<&'static str> {
        match self {
            Stage::Configure => None,
            Stage::CreateClient => Some("create client failed"),
            Stage::List => Some("get ssl list failed"),
            Stage::Delete => Some("delete ssl failed"),
            Stage::Upload => Some("upload certificate failed"),
        }
    }
}

/// A rotation step that failed. Every failure ends the run; only a failed
/// upload makes the process exit non-zero.
#[derive(Debug)]
pub struct Failure {
    pub stage: Stage,
    pub error: RotatorError,
}

impl Failure {
    pub fn new(stage: Stage, error: RotatorError) -> Self {
        Self { stage, error }
    }

    pub fn is_fatal(&self) -> bool {
        self.stage == Stage::Upload
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage.context() {
            Some(context) => write!(f, "{context}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationReport {
    /// Id of the certificate removed before the upload, if any matched.
    pub deleted: Option<String>,
    pub request_id: String,
}

pub struct CertificateRotator<'a, A> {
    api: &'a A,
    config: &'a PluginConfig,
}

impl<'a, A: CertificateApi> CertificateRotator<'a, A> {
    pub fn new(api: &'a A, config: &'a PluginConfig) -> Self {
        Self { api, config }
    }

    /// List, delete the first match, upload. Stops at the first failure.
    pub async fn rotate(&self) -> std::result::Result<RotationReport, Failure> {
        let site_id = self.config.site_id;
        tracing::info!(
            "Rotating certificate for {} on site {site_id}",
            self.config.domain_name
        );

        let records = self
            .api
            .list_certificates(site_id, LIST_KEYWORD)
            .await
            .map_err(|e| Failure::new(Stage::List, translate(e)))?;
        tracing::info!(
            "Found {} certificate(s) matching '{LIST_KEYWORD}'",
            records.len()
        );

        let deleted = match records.first() {
            Some(record) => {
                self.api
                    .delete_certificate(site_id, &record.id)
                    .await
                    .map_err(|e| Failure::new(Stage::Delete, e))?;
                tracing::info!("Deleted certificate {record}");
                Some(record.id.clone())
            }
            None => None,
        };

        CertificateParser::log_summary(&self.config.public_key);

        let request = SetCertificateRequest {
            site_id,
            cert_type: self.config.cert_type.clone(),
            certificate: self.config.public_key.clone(),
            private_key: self.config.private_key.clone(),
        };
        let response = self
            .api
            .set_certificate(&request)
            .await
            .map_err(|e| Failure::new(Stage::Upload, translate(e)))?;

        tracing::info!("Certificate uploaded successfully: {}", response.request_id);

        Ok(RotationReport {
            deleted,
            request_id: response.request_id,
        })
    }
}
