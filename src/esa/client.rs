use super::error::{ApiError, ServiceError};
use super::signer;
use crate::auth::{CredentialSource, Credentials};
use crate::utils::errors::{Result, RotatorError};
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tokio::sync::OnceCell;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One RPC-style OpenAPI call.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    action: &'static str,
    method: Method,
    query: BTreeMap<String, String>,
    form: BTreeMap<String, String>,
}

impl RpcRequest {
    pub fn get(action: &'static str) -> Self {
        Self::new(action, Method::GET)
    }

    pub fn post(action: &'static str) -> Self {
        Self::new(action, Method::POST)
    }

    fn new(action: &'static str, method: Method) -> Self {
        Self {
            action,
            method,
            query: BTreeMap::new(),
            form: BTreeMap::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    pub fn form(mut self, key: &str, value: impl ToString) -> Self {
        self.form.insert(key.to_string(), value.to_string());
        self
    }
}

/// Request ready to send: everything the signature covers, plus the signature.
#[derive(Debug)]
struct SignedRequest {
    url: Url,
    headers: BTreeMap<String, String>,
    body: String,
}

pub struct EsaClient {
    client: Client,
    base_url: Url,
    host: String,
    credentials: CredentialSource,
    resolved: OnceCell<Credentials>,
}

impl EsaClient {
    pub fn new(endpoint: &str, credentials: CredentialSource) -> Result<Self> {
        let client = super::create_http_client()?;
        let base_url = parse_endpoint(endpoint)?;
        let host = match (base_url.host_str(), base_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(RotatorError::Config(format!(
                    "endpoint has no host: {endpoint}"
                )))
            }
        };

        tracing::debug!(
            "ESA client for {} ({} credentials)",
            base_url,
            if credentials.is_static() { "static" } else { "default chain" }
        );

        Ok(Self {
            client,
            base_url,
            host,
            credentials,
            resolved: OnceCell::new(),
        })
    }

    /// Get endpoint URL
    pub fn endpoint(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn credential_source(&self) -> &CredentialSource {
        &self.credentials
    }

    /// Resolve credentials up front so a missing credential fails before any API call.
    pub async fn authenticate(&self) -> Result<()> {
        let credentials = self.credentials().await?;
        tracing::debug!("Authenticated as {}", credentials.access_key_id);
        Ok(())
    }

    /// Credentials are resolved once and reused for every call.
    async fn credentials(&self) -> Result<&Credentials> {
        self.resolved
            .get_or_try_init(|| self.credentials.resolve(&self.client))
            .await
    }

    /// Sign and send an RPC call, decoding the JSON body on success.
    pub async fn call<T: DeserializeOwned>(&self, request: RpcRequest) -> Result<T> {
        let credentials = self.credentials().await?;
        let date = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = hex::encode(rand::random::<[u8; 16]>());
        let signed = self.sign(&request, credentials, &date, &nonce)?;

        tracing::debug!("{} {} {}", request.method, request.action, signed.url);

        let mut builder = self
            .client
            .request(request.method.clone(), signed.url)
            .header(ACCEPT, "application/json");
        for (name, value) in &signed.headers {
            // reqwest derives Host from the URL
            if name != "host" {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if !signed.body.is_empty() {
            builder = builder.body(signed.body);
        }

        let response = builder.send().await?;
        self.handle_response(request.action, response).await
    }

    fn sign(
        &self,
        request: &RpcRequest,
        credentials: &Credentials,
        date: &str,
        nonce: &str,
    ) -> Result<SignedRequest> {
        let body = signer::canonical_query(&request.form);
        let payload_hash = signer::hash_payload(body.as_bytes());

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), self.host.clone());
        headers.insert("x-acs-action".to_string(), request.action.to_string());
        headers.insert("x-acs-version".to_string(), super::API_VERSION.to_string());
        headers.insert("x-acs-date".to_string(), date.to_string());
        headers.insert("x-acs-signature-nonce".to_string(), nonce.to_string());
        headers.insert("x-acs-content-sha256".to_string(), payload_hash.clone());
        if !body.is_empty() {
            headers.insert("content-type".to_string(), FORM_CONTENT_TYPE.to_string());
        }
        if let Some(token) = &credentials.security_token {
            headers.insert("x-acs-security-token".to_string(), token.clone());
        }

        let authorization = signer::authorization(
            &credentials.access_key_id,
            &credentials.access_key_secret,
            request.method.as_str(),
            &request.query,
            &headers,
            &payload_hash,
        )?;
        headers.insert(AUTHORIZATION.as_str().to_string(), authorization);

        let mut url = self.base_url.clone();
        if request.query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&signer::canonical_query(&request.query)));
        }

        Ok(SignedRequest { url, headers, body })
    }

    /// Handle HTTP response from ESA
    async fn handle_response<T: DeserializeOwned>(
        &self,
        action: &str,
        response: Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            tracing::debug!("{action} returned {status}");
            Ok(serde_json::from_str(&body)?)
        } else {
            tracing::debug!("{action} failed with {status}: {body}");
            Err(ApiError::Service(ServiceError::from_response(status.as_u16(), &body)).into())
        }
    }
}

/// Accept a bare host (`esa.cn-hangzhou.aliyuncs.com`) or a full URL.
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    };

    Url::parse(&url)
        .map_err(|e| RotatorError::Config(format!("invalid endpoint '{endpoint}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> EsaClient {
        let source = CredentialSource::from_access_key("AKID", "secret").unwrap();
        EsaClient::new(endpoint, source).unwrap()
    }

    #[test]
    fn test_parse_endpoint_bare_host() {
        let url = parse_endpoint("esa.cn-hangzhou.aliyuncs.com").unwrap();
        assert_eq!(url.as_str(), "https://esa.cn-hangzhou.aliyuncs.com/");
    }

    #[test]
    fn test_parse_endpoint_with_scheme_and_port() {
        let url = parse_endpoint("http://127.0.0.1:8080/").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/");

        let client = client("http://127.0.0.1:8080");
        assert_eq!(client.host, "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_endpoint_invalid() {
        assert!(matches!(
            parse_endpoint("https://esa example.com"),
            Err(RotatorError::Config(_))
        ));
    }

    #[test]
    fn test_sign_get_request() {
        let client = client("esa.cn-hangzhou.aliyuncs.com");
        let request = RpcRequest::get("ListCertificates")
            .query("SiteId", 123)
            .query("Keyword", "domain");
        let credentials = Credentials::new("AKID", "secret");

        let signed = client
            .sign(&request, &credentials, "2024-01-01T00:00:00Z", "abc")
            .unwrap();

        assert_eq!(
            signed.url.as_str(),
            "https://esa.cn-hangzhou.aliyuncs.com/?Keyword=domain&SiteId=123"
        );
        assert!(signed.body.is_empty());
        assert_eq!(signed.headers["host"], "esa.cn-hangzhou.aliyuncs.com");
        assert_eq!(signed.headers["x-acs-action"], "ListCertificates");
        assert_eq!(signed.headers["x-acs-version"], "2024-09-10");
        assert_eq!(
            signed.headers["x-acs-content-sha256"],
            signer::hash_payload(b"")
        );
        assert!(!signed.headers.contains_key("content-type"));
        assert!(!signed.headers.contains_key("x-acs-security-token"));
        assert!(signed.headers["authorization"].starts_with(
            "ACS3-HMAC-SHA256 Credential=AKID,SignedHeaders=host;x-acs-action;\
             x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version,Signature="
        ));
    }

    #[test]
    fn test_sign_form_request_with_security_token() {
        let client = client("esa.cn-hangzhou.aliyuncs.com");
        let request = RpcRequest::post("SetCertificate")
            .form("SiteId", 123)
            .form("Certificate", "-----BEGIN CERTIFICATE-----\nMII=");
        let mut credentials = Credentials::new("STS.id", "secret");
        credentials.security_token = Some("token".to_string());

        let signed = client
            .sign(&request, &credentials, "2024-01-01T00:00:00Z", "abc")
            .unwrap();

        assert_eq!(signed.url.query(), None);
        assert_eq!(
            signed.body,
            "Certificate=-----BEGIN%20CERTIFICATE-----%0AMII%3D&SiteId=123"
        );
        assert_eq!(signed.headers["content-type"], FORM_CONTENT_TYPE);
        assert_eq!(signed.headers["x-acs-security-token"], "token");
        assert_eq!(
            signed.headers["x-acs-content-sha256"],
            signer::hash_payload(signed.body.as_bytes())
        );
        assert!(signed.headers["authorization"].contains("content-type;host;"));
        assert!(signed.headers["authorization"].contains("x-acs-security-token"));
    }

    #[test]
    fn test_static_client_reports_source() {
        let client = client("esa.cn-hangzhou.aliyuncs.com");
        assert!(client.credential_source().is_static());
        assert_eq!(client.endpoint(), "https://esa.cn-hangzhou.aliyuncs.com/");
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_error() {
        // nothing listens on the discard port
        let client = client("http://127.0.0.1:9");
        let err = client
            .call::<serde_json::Value>(RpcRequest::get("ListCertificates"))
            .await
            .unwrap_err();
        assert!(matches!(err, RotatorError::Http(_)));
    }
}
