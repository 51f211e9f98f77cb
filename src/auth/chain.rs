use super::credentials::Credentials;
use super::profile::{self, ProfileCredentials};
use crate::utils::errors::{Result, RotatorError};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_ACCESS_KEY_ID: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ENV_ACCESS_KEY_SECRET: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const ENV_SECURITY_TOKEN: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";
pub const ENV_ROLE_ARN: &str = "ALIBABA_CLOUD_ROLE_ARN";
pub const ENV_OIDC_PROVIDER_ARN: &str = "ALIBABA_CLOUD_OIDC_PROVIDER_ARN";
pub const ENV_OIDC_TOKEN_FILE: &str = "ALIBABA_CLOUD_OIDC_TOKEN_FILE";
pub const ENV_ROLE_SESSION_NAME: &str = "ALIBABA_CLOUD_ROLE_SESSION_NAME";
pub const ENV_STS_REGION: &str = "ALIBABA_CLOUD_STS_REGION";
pub const ENV_VPC_ENDPOINT_ENABLED: &str = "ALIBABA_CLOUD_VPC_ENDPOINT_ENABLED";
pub const ENV_CLI_PROFILE_DISABLED: &str = "ALIBABA_CLOUD_CLI_PROFILE_DISABLED";
pub const ENV_PROFILE: &str = "ALIBABA_CLOUD_PROFILE";
pub const ENV_CREDENTIALS_FILE: &str = "ALIBABA_CLOUD_CREDENTIALS_FILE";
pub const ENV_ECS_METADATA: &str = "ALIBABA_CLOUD_ECS_METADATA";
pub const ENV_CREDENTIALS_URI: &str = "ALIBABA_CLOUD_CREDENTIALS_URI";

const ECS_METADATA_HOST: &str = "http://100.100.100.200";
const ECS_METADATA_TOKEN_TTL: &str = "21600";
const STS_API_VERSION: &str = "2015-04-01";
const STS_SESSION_SECONDS: &str = "3600";
const DEFAULT_INI_PROFILE: &str = "default";

/// Role assumed with the OIDC token mounted by RRSA.
#[derive(Debug, Clone, PartialEq)]
struct OidcRole {
    role_arn: String,
    provider_arn: String,
    token_file: PathBuf,
    session_name: String,
}

/// INI credentials file and whether the user pointed at it explicitly.
#[derive(Debug, Clone, PartialEq)]
struct CredentialsFile {
    path: PathBuf,
    explicit: bool,
}

/// Ambient credential discovery, tried in this order:
///
/// 1. `ALIBABA_CLOUD_ACCESS_KEY_ID` / `ALIBABA_CLOUD_ACCESS_KEY_SECRET`
/// 2. OIDC role (RRSA)
/// 3. `aliyun` CLI profile in `~/.aliyun/config.json`
/// 4. INI profile in `~/.alibabacloud/credentials`
/// 5. ECS RAM role from instance metadata
/// 6. `ALIBABA_CLOUD_CREDENTIALS_URI`
///
/// A source that is configured but fails does not stop the chain; its error
/// is reported only if no later source succeeds.
#[derive(Debug, Clone)]
pub struct DefaultCredentialChain {
    environment: Option<Credentials>,
    oidc: Option<OidcRole>,
    cli_config: Option<PathBuf>,
    credentials_file: Option<CredentialsFile>,
    profile: Option<String>,
    ecs_role: Option<String>,
    credentials_uri: Option<String>,
    sts_endpoint: String,
    metadata_host: String,
}

/// Body returned by the credentials URI and the ECS metadata service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteCredentials {
    code: Option<String>,
    #[serde(default)]
    access_key_id: String,
    #[serde(default)]
    access_key_secret: String,
    security_token: Option<String>,
    expiration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    credentials: AssumedCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumedCredentials {
    access_key_id: String,
    access_key_secret: String,
    security_token: String,
    expiration: Option<String>,
}

impl DefaultCredentialChain {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok(), dirs::home_dir())
    }

    /// Build the chain from an arbitrary variable lookup and home directory.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let enabled = |name: &str| var(name).is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let environment = match (var(ENV_ACCESS_KEY_ID), var(ENV_ACCESS_KEY_SECRET)) {
            (Some(id), Some(secret)) => Some(Credentials {
                access_key_id: id,
                access_key_secret: secret,
                security_token: var(ENV_SECURITY_TOKEN),
            }),
            _ => None,
        };

        let oidc = match (
            var(ENV_ROLE_ARN),
            var(ENV_OIDC_PROVIDER_ARN),
            var(ENV_OIDC_TOKEN_FILE),
        ) {
            (Some(role_arn), Some(provider_arn), Some(token_file)) => Some(OidcRole {
                role_arn,
                provider_arn,
                token_file: PathBuf::from(token_file),
                session_name: var(ENV_ROLE_SESSION_NAME)
                    .unwrap_or_else(|| format!("esa-cert-rotator-{}", Utc::now().timestamp())),
            }),
            _ => None,
        };

        let cli_config = if enabled(ENV_CLI_PROFILE_DISABLED) {
            None
        } else {
            home.as_ref().map(|h| h.join(".aliyun").join("config.json"))
        };

        let credentials_file = match var(ENV_CREDENTIALS_FILE) {
            Some(path) => Some(CredentialsFile {
                path: PathBuf::from(path),
                explicit: true,
            }),
            None => home.as_ref().map(|h| CredentialsFile {
                path: h.join(".alibabacloud").join("credentials"),
                explicit: false,
            }),
        };

        let sts_endpoint = match var(ENV_STS_REGION) {
            Some(region) if enabled(ENV_VPC_ENDPOINT_ENABLED) => {
                format!("https://sts-vpc.{region}.aliyuncs.com")
            }
            Some(region) => format!("https://sts.{region}.aliyuncs.com"),
            None => "https://sts.aliyuncs.com".to_string(),
        };

        Self {
            environment,
            oidc,
            cli_config,
            credentials_file,
            profile: var(ENV_PROFILE),
            ecs_role: var(ENV_ECS_METADATA),
            credentials_uri: var(ENV_CREDENTIALS_URI),
            sts_endpoint,
            metadata_host: ECS_METADATA_HOST.to_string(),
        }
    }

    pub async fn resolve(&self, http: &Client) -> Result<Credentials> {
        let mut errors = Vec::new();

        if let Some(credentials) = &self.environment {
            tracing::debug!("Using credentials from {ENV_ACCESS_KEY_ID}");
            return Ok(credentials.clone());
        }

        if let Some(role) = &self.oidc {
            tracing::debug!("Assuming role {} with OIDC token", role.role_arn);
            match self.assume_role_with_oidc(http, role).await {
                Ok(credentials) => return Ok(credentials),
                Err(e) => errors.push(e.to_string()),
            }
        }

        match self.cli_profile(http).await {
            Ok(Some(credentials)) => return Ok(credentials),
            Ok(None) => {}
            Err(e) => errors.push(e.to_string()),
        }

        match self.profile_file(http).await {
            Ok(Some(credentials)) => return Ok(credentials),
            Ok(None) => {}
            Err(e) => errors.push(e.to_string()),
        }

        if let Some(role) = &self.ecs_role {
            tracing::debug!("Fetching credentials for ECS RAM role: {role}");
            match self.fetch_ecs_role(http, role).await {
                Ok(credentials) => return Ok(credentials),
                Err(e) => errors.push(e.to_string()),
            }
        }

        if let Some(uri) = &self.credentials_uri {
            tracing::debug!("Fetching credentials from {ENV_CREDENTIALS_URI}");
            match self.fetch_credentials_uri(http, uri).await {
                Ok(credentials) => return Ok(credentials),
                Err(e) => errors.push(e.to_string()),
            }
        }

        if errors.is_empty() {
            Err(RotatorError::Credential(format!(
                "no credential found: set PLUGIN_ACCESS_KEY_ID/PLUGIN_ACCESS_KEY_SECRET, \
                 {ENV_ACCESS_KEY_ID}/{ENV_ACCESS_KEY_SECRET}, an OIDC role, a credentials \
                 profile, {ENV_ECS_METADATA} or {ENV_CREDENTIALS_URI}"
            )))
        } else {
            Err(RotatorError::Credential(format!(
                "unable to get credentials from the default chain: {}",
                errors.join("; ")
            )))
        }
    }

    async fn assume_role_with_oidc(&self, http: &Client, role: &OidcRole) -> Result<Credentials> {
        let token = fs::read_to_string(&role.token_file).map_err(|e| {
            RotatorError::Credential(format!(
                "read OIDC token file '{}': {e}",
                role.token_file.display()
            ))
        })?;
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let response = http
            .post(format!("{}/", self.sts_endpoint))
            .query(&[
                ("Action", "AssumeRoleWithOIDC"),
                ("Format", "JSON"),
                ("Version", STS_API_VERSION),
                ("Timestamp", timestamp.as_str()),
            ])
            .form(&[
                ("RoleArn", role.role_arn.as_str()),
                ("OIDCProviderArn", role.provider_arn.as_str()),
                ("OIDCToken", token.trim()),
                ("RoleSessionName", role.session_name.as_str()),
                ("DurationSeconds", STS_SESSION_SECONDS),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RotatorError::Credential(format!(
                "AssumeRoleWithOIDC failed: HTTP {status}: {body}"
            )));
        }

        let assumed: AssumeRoleResponse = serde_json::from_str(&body)?;
        if let Some(expiration) = &assumed.credentials.expiration {
            tracing::debug!("OIDC role credentials expire at {expiration}");
        }

        Ok(Credentials {
            access_key_id: assumed.credentials.access_key_id,
            access_key_secret: assumed.credentials.access_key_secret,
            security_token: Some(assumed.credentials.security_token),
        })
    }

    async fn cli_profile(&self, http: &Client) -> Result<Option<Credentials>> {
        let Some(path) = &self.cli_config else {
            return Ok(None);
        };
        let Some(content) = read_optional(path)? else {
            return Ok(None);
        };

        tracing::debug!("Using CLI profile from {}", path.display());
        let resolved = profile::parse_cli_config(&content, self.profile.as_deref())?;
        self.resolve_profile(http, resolved).await.map(Some)
    }

    async fn profile_file(&self, http: &Client) -> Result<Option<Credentials>> {
        let Some(file) = &self.credentials_file else {
            return Ok(None);
        };

        let content = if file.explicit {
            fs::read_to_string(&file.path).map_err(|e| {
                RotatorError::Credential(format!(
                    "read credentials file '{}': {e}",
                    file.path.display()
                ))
            })?
        } else {
            match read_optional(&file.path)? {
                Some(content) => content,
                None => return Ok(None),
            }
        };

        let name = self.profile.as_deref().unwrap_or(DEFAULT_INI_PROFILE);
        tracing::debug!("Using profile '{name}' from {}", file.path.display());
        let resolved = profile::parse_credentials_file(&content, name)?;
        self.resolve_profile(http, resolved).await.map(Some)
    }

    async fn resolve_profile(
        &self,
        http: &Client,
        resolved: ProfileCredentials,
    ) -> Result<Credentials> {
        match resolved {
            ProfileCredentials::Static(credentials) => Ok(credentials),
            ProfileCredentials::EcsRole(role) => self.fetch_ecs_role(http, &role).await,
        }
    }

    async fn fetch_credentials_uri(&self, http: &Client, uri: &str) -> Result<Credentials> {
        let response = http.get(uri).send().await?;
        Self::parse_remote(response, "credentials URI").await
    }

    async fn fetch_ecs_role(&self, http: &Client, role: &str) -> Result<Credentials> {
        let url = format!(
            "{}/latest/meta-data/ram/security-credentials/{role}",
            self.metadata_host
        );
        let mut request = http.get(&url);

        // IMDSv2 token; older instances still answer without it
        match self.fetch_metadata_token(http).await {
            Ok(token) => request = request.header("X-aliyun-ecs-metadata-token", token),
            Err(e) => tracing::debug!("ECS metadata token unavailable: {e}"),
        }

        let response = request.send().await?;
        Self::parse_remote(response, "ECS metadata").await
    }

    async fn fetch_metadata_token(&self, http: &Client) -> Result<String> {
        let response = http
            .put(format!("{}/latest/api/token", self.metadata_host))
            .header("X-aliyun-ecs-metadata-token-ttl-seconds", ECS_METADATA_TOKEN_TTL)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    async fn parse_remote(response: reqwest::Response, source: &str) -> Result<Credentials> {
        let status = response.status();
        if !status.is_success() {
            return Err(RotatorError::Credential(format!(
                "failed to get credentials from {source}: HTTP {status}"
            )));
        }

        let body: RemoteCredentials = response.json().await?;
        Self::into_credentials(body, source)
    }

    fn into_credentials(body: RemoteCredentials, source: &str) -> Result<Credentials> {
        if let Some(code) = body.code.as_deref() {
            if code != "Success" {
                return Err(RotatorError::Credential(format!(
                    "failed to get credentials from {source}: {code}"
                )));
            }
        }

        if let Some(expiration) = &body.expiration {
            tracing::debug!("Credentials from {source} expire at {expiration}");
        }

        Ok(Credentials {
            access_key_id: body.access_key_id,
            access_key_secret: body.access_key_secret,
            security_token: body.security_token,
        })
    }
}

/// Read a file that may legitimately be absent.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RotatorError::Credential(format!(
            "read '{}': {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chain(vars: &[(&str, &str)], home: Option<PathBuf>) -> DefaultCredentialChain {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DefaultCredentialChain::from_lookup(|name| vars.get(name).cloned(), home)
    }

    fn write_file(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_from_lookup_reads_every_source() {
        let home = PathBuf::from("/home/ci");
        let chain = chain(
            &[
                (ENV_ROLE_ARN, "acs:ram::1:role/ci"),
                (ENV_OIDC_PROVIDER_ARN, "acs:ram::1:oidc-provider/ack"),
                (ENV_OIDC_TOKEN_FILE, "/var/run/token"),
                (ENV_ROLE_SESSION_NAME, "deploy"),
                (ENV_STS_REGION, "cn-shanghai"),
                (ENV_PROFILE, "ci"),
                (ENV_ECS_METADATA, "cert-role"),
                (ENV_CREDENTIALS_URI, "http://localhost/creds"),
            ],
            Some(home.clone()),
        );

        assert_eq!(chain.environment, None);
        let oidc = chain.oidc.unwrap();
        assert_eq!(oidc.role_arn, "acs:ram::1:role/ci");
        assert_eq!(oidc.session_name, "deploy");
        assert_eq!(chain.cli_config, Some(home.join(".aliyun/config.json")));
        assert_eq!(
            chain.credentials_file,
            Some(CredentialsFile {
                path: home.join(".alibabacloud/credentials"),
                explicit: false,
            })
        );
        assert_eq!(chain.profile.as_deref(), Some("ci"));
        assert_eq!(chain.sts_endpoint, "https://sts.cn-shanghai.aliyuncs.com");
        assert_eq!(chain.ecs_role.as_deref(), Some("cert-role"));
        assert_eq!(chain.credentials_uri.as_deref(), Some("http://localhost/creds"));
    }

    #[test]
    fn test_from_lookup_switches_and_partial_values() {
        let chain = chain(
            &[
                (ENV_ACCESS_KEY_ID, "AKID"),
                (ENV_ACCESS_KEY_SECRET, ""),
                (ENV_ROLE_ARN, "acs:ram::1:role/ci"),
                (ENV_STS_REGION, "cn-beijing"),
                (ENV_VPC_ENDPOINT_ENABLED, "true"),
                (ENV_CLI_PROFILE_DISABLED, "true"),
                (ENV_CREDENTIALS_FILE, "/etc/alibabacloud/credentials"),
            ],
            Some(PathBuf::from("/home/ci")),
        );

        assert_eq!(chain.environment, None);
        assert_eq!(chain.oidc, None);
        assert_eq!(chain.cli_config, None);
        assert_eq!(
            chain.credentials_file,
            Some(CredentialsFile {
                path: PathBuf::from("/etc/alibabacloud/credentials"),
                explicit: true,
            })
        );
        assert_eq!(chain.sts_endpoint, "https://sts-vpc.cn-beijing.aliyuncs.com");
    }

    #[tokio::test]
    async fn test_environment_wins() {
        let chain = chain(
            &[
                (ENV_ACCESS_KEY_ID, "ENV_AKID"),
                (ENV_ACCESS_KEY_SECRET, "env-secret"),
                (ENV_SECURITY_TOKEN, "token"),
                (ENV_CREDENTIALS_URI, "http://127.0.0.1:9/creds"),
            ],
            None,
        );

        let resolved = chain.resolve(&Client::new()).await.unwrap();
        assert_eq!(resolved.access_key_id, "ENV_AKID");
        assert_eq!(resolved.security_token.as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let dir = tempfile::tempdir().unwrap();
        let chain = chain(&[], Some(dir.path().to_path_buf()));

        let err = chain.resolve(&Client::new()).await.unwrap_err();
        assert!(matches!(err, RotatorError::Credential(_)));
        assert!(err.to_string().starts_with("no credential found"));
    }

    #[tokio::test]
    async fn test_credentials_uri_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/creds"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Code":"Success","AccessKeyId":"STS.uri","AccessKeySecret":"uri-secret",
                    "SecurityToken":"uri-token","Expiration":"2030-01-01T00:00:00Z"}"#,
            ))
            .mount(&server)
            .await;

        let uri = format!("{}/creds", server.uri());
        let chain = chain(&[(ENV_CREDENTIALS_URI, uri.as_str())], None);

        let resolved = chain.resolve(&Client::new()).await.unwrap();
        assert_eq!(resolved.access_key_id, "STS.uri");
        assert_eq!(resolved.access_key_secret, "uri-secret");
        assert_eq!(resolved.security_token.as_deref(), Some("uri-token"));
    }

    #[tokio::test]
    async fn test_credentials_uri_failure_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/creds"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Code":"Failed"}"#))
            .mount(&server)
            .await;

        let uri = format!("{}/creds", server.uri());
        let chain = chain(&[(ENV_CREDENTIALS_URI, uri.as_str())], None);

        let err = chain.resolve(&Client::new()).await.unwrap_err();
        assert!(matches!(err, RotatorError::Credential(_)));
        assert!(err
            .to_string()
            .contains("failed to get credentials from credentials URI: Failed"));
    }

    #[tokio::test]
    async fn test_credentials_uri_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/creds"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let uri = format!("{}/creds", server.uri());
        let chain = chain(&[(ENV_CREDENTIALS_URI, uri.as_str())], None);

        let err = chain.resolve(&Client::new()).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("failed to get credentials from credentials URI: HTTP 500"));
    }

    #[tokio::test]
    async fn test_oidc_role_assumed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(query_param("Action", "AssumeRoleWithOIDC"))
            .and(query_param("Version", STS_API_VERSION))
            .and(body_string_contains("OIDCToken=oidc-jwt"))
            .and(body_string_contains("RoleSessionName=deploy"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"RequestId":"R1","Credentials":{"AccessKeyId":"STS.oidc",
                    "AccessKeySecret":"oidc-secret","SecurityToken":"oidc-token",
                    "Expiration":"2030-01-01T00:00:00Z"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let token = write_file(dir.path(), "token", "oidc-jwt\n");
        let mut chain = chain(
            &[
                (ENV_ROLE_ARN, "acs:ram::1:role/ci"),
                (ENV_OIDC_PROVIDER_ARN, "acs:ram::1:oidc-provider/ack"),
                (ENV_OIDC_TOKEN_FILE, token.to_str().unwrap()),
                (ENV_ROLE_SESSION_NAME, "deploy"),
            ],
            None,
        );
        chain.sts_endpoint = server.uri();

        let resolved = chain.resolve(&Client::new()).await.unwrap();
        assert_eq!(resolved.access_key_id, "STS.oidc");
        assert_eq!(resolved.security_token.as_deref(), Some("oidc-token"));
    }

    #[tokio::test]
    async fn test_oidc_failure_falls_through_to_later_sources() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("InvalidParameter"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/creds"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Code":"Success","AccessKeyId":"STS.uri","AccessKeySecret":"s"}"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let token = write_file(dir.path(), "token", "oidc-jwt");
        let uri = format!("{}/creds", server.uri());
        let mut chain = chain(
            &[
                (ENV_ROLE_ARN, "acs:ram::1:role/ci"),
                (ENV_OIDC_PROVIDER_ARN, "acs:ram::1:oidc-provider/ack"),
                (ENV_OIDC_TOKEN_FILE, token.to_str().unwrap()),
                (ENV_CREDENTIALS_URI, uri.as_str()),
            ],
            None,
        );
        chain.sts_endpoint = server.uri();

        let resolved = chain.resolve(&Client::new()).await.unwrap();
        assert_eq!(resolved.access_key_id, "STS.uri");
    }

    #[tokio::test]
    async fn test_cli_config_before_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            ".aliyun/config.json",
            r#"{"current":"default","profiles":[{"name":"default","mode":"AK",
                "access_key_id":"CLI_AKID","access_key_secret":"cli-secret"}]}"#,
        );
        write_file(
            dir.path(),
            ".alibabacloud/credentials",
            "[default]\ntype = access_key\naccess_key_id = FILE_AKID\naccess_key_secret = s\n",
        );

        let chain = chain(&[], Some(dir.path().to_path_buf()));
        let resolved = chain.resolve(&Client::new()).await.unwrap();
        assert_eq!(resolved.access_key_id, "CLI_AKID");
    }

    #[tokio::test]
    async fn test_credentials_file_default_location() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            ".alibabacloud/credentials",
            "[default]\ntype = access_key\naccess_key_id = FILE_AKID\naccess_key_secret = s\n\n\
             [ci]\ntype = access_key\naccess_key_id = CI_AKID\naccess_key_secret = s\n",
        );

        let resolved = chain(&[], Some(dir.path().to_path_buf()))
            .resolve(&Client::new())
            .await
            .unwrap();
        assert_eq!(resolved.access_key_id, "FILE_AKID");

        let resolved = chain(&[(ENV_PROFILE, "ci")], Some(dir.path().to_path_buf()))
            .resolve(&Client::new())
            .await
            .unwrap();
        assert_eq!(resolved.access_key_id, "CI_AKID");
    }

    #[tokio::test]
    async fn test_explicit_credentials_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let chain = chain(&[(ENV_CREDENTIALS_FILE, missing.to_str().unwrap())], None);

        let err = chain.resolve(&Client::new()).await.unwrap_err();
        assert!(err.to_string().contains("read credentials file"));
    }

    #[tokio::test]
    async fn test_ecs_role_uses_metadata_token() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/latest/api/token"))
            .and(header("X-aliyun-ecs-metadata-token-ttl-seconds", ECS_METADATA_TOKEN_TTL))
            .respond_with(ResponseTemplate::new(200).set_body_string("imds-token"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/ram/security-credentials/cert-role"))
            .and(header("X-aliyun-ecs-metadata-token", "imds-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Code":"Success","AccessKeyId":"STS.ecs","AccessKeySecret":"ecs-secret",
                    "SecurityToken":"ecs-token"}"#,
            ))
            .mount(&server)
            .await;

        let mut chain = chain(&[(ENV_ECS_METADATA, "cert-role")], None);
        chain.metadata_host = server.uri();

        let resolved = chain.resolve(&Client::new()).await.unwrap();
        assert_eq!(resolved.access_key_id, "STS.ecs");
        assert_eq!(resolved.security_token.as_deref(), Some("ecs-token"));
    }

    #[tokio::test]
    async fn test_profile_ecs_role_reaches_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/ram/security-credentials/file-role"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Code":"Success","AccessKeyId":"STS.file","AccessKeySecret":"s"}"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            ".alibabacloud/credentials",
            "[default]\ntype = ecs_ram_role\nrole_name = file-role\n",
        );
        let mut chain = chain(&[], Some(dir.path().to_path_buf()));
        chain.metadata_host = server.uri();

        let resolved = chain.resolve(&Client::new()).await.unwrap();
        assert_eq!(resolved.access_key_id, "STS.file");
    }

    #[test]
    fn test_remote_credentials_parsing() {
        let body: RemoteCredentials = serde_json::from_str(
            r#"{"Code":"Success","AccessKeyId":"STS.x","AccessKeySecret":"s",
                "SecurityToken":"t","Expiration":"2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let credentials = DefaultCredentialChain::into_credentials(body, "test").unwrap();
        assert_eq!(credentials.access_key_id, "STS.x");
        assert_eq!(credentials.security_token.as_deref(), Some("t"));
    }
}
