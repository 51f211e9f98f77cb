use super::client::{EsaClient, RpcRequest};
use crate::plugin::CertificateApi;
use crate::utils::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Certificate entry as returned by `ListCertificates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CertificateRecord {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub cert_type: Option<String>,
    pub common_name: Option<String>,
    #[serde(rename = "SAN")]
    pub san: Option<String>,
    pub status: Option<String>,
    pub issuer: Option<String>,
    pub not_before: Option<String>,
    pub not_after: Option<String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub region: Option<String>,
}

impl fmt::Display for CertificateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        if let Some(not_after) = &self.not_after {
            write!(f, ", expires {not_after}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListCertificatesResponse {
    request_id: Option<String>,
    total_count: Option<i64>,
    result: Option<Vec<CertificateRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteCertificateResponse {
    request_id: Option<String>,
}

#[derive(Clone, PartialEq)]
pub struct SetCertificateRequest {
    pub site_id: i64,
    pub cert_type: String,
    pub certificate: String,
    pub private_key: String,
}

impl fmt::Debug for SetCertificateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetCertificateRequest")
            .field("site_id", &self.site_id)
            .field("cert_type", &self.cert_type)
            .field("certificate", &format!("{} bytes", self.certificate.len()))
            .field("private_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetCertificateResponse {
    #[serde(default)]
    pub request_id: String,
    pub id: Option<String>,
}

#[async_trait]
impl CertificateApi for EsaClient {
    async fn list_certificates(
        &self,
        site_id: i64,
        keyword: &str,
    ) -> Result<Vec<CertificateRecord>> {
        let request = RpcRequest::get("ListCertificates")
            .query("SiteId", site_id)
            .query("Keyword", keyword);

        let response: ListCertificatesResponse = self.call(request).await?;
        tracing::debug!(
            "ListCertificates request {}: {} total",
            response.request_id.as_deref().unwrap_or("-"),
            response.total_count.unwrap_or_default()
        );

        Ok(response.result.unwrap_or_default())
    }

    async fn delete_certificate(&self, site_id: i64, id: &str) -> Result<()> {
        let request = RpcRequest::get("DeleteCertificate")
            .query("SiteId", site_id)
            .query("Id", id);

        let response: DeleteCertificateResponse = self.call(request).await?;
        tracing::debug!(
            "DeleteCertificate request {}",
            response.request_id.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    async fn set_certificate(
        &self,
        request: &SetCertificateRequest,
    ) -> Result<SetCertificateResponse> {
        let rpc = RpcRequest::post("SetCertificate")
            .form("SiteId", request.site_id)
            .form("Type", &request.cert_type)
            .form("Certificate", &request.certificate)
            .form("PrivateKey", &request.private_key);

        self.call(rpc).await
    }
}
