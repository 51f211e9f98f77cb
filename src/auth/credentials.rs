use super::chain::DefaultCredentialChain;
use crate::utils::errors::{Result, RotatorError};
use reqwest::Client;
use std::fmt;

/// Resolved key material used to sign requests.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: &str, access_key_secret: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            access_key_secret: access_key_secret.to_string(),
            security_token: None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field("security_token", &self.security_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Where the client gets its credentials from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Access key given explicitly by the plugin configuration.
    AccessKey(Credentials),
    /// Ambient credentials discovered at first use.
    DefaultChain(DefaultCredentialChain),
}

impl CredentialSource {
    /// Pick the credential source for an optional access key pair.
    ///
    /// Both empty selects the default chain, both set selects a static
    /// access key, anything else is a configuration error.
    pub fn from_access_key(access_key_id: &str, access_key_secret: &str) -> Result<Self> {
        match (access_key_id.is_empty(), access_key_secret.is_empty()) {
            (true, true) => Ok(Self::DefaultChain(DefaultCredentialChain::from_env())),
            (false, false) => Ok(Self::AccessKey(Credentials::new(
                access_key_id,
                access_key_secret,
            ))),
            _ => Err(RotatorError::Credential(
                "both access key id and secret are required".to_string(),
            )),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::AccessKey(_))
    }

    pub async fn resolve(&self, http: &Client) -> Result<Credentials> {
        match self {
            Self::AccessKey(credentials) => Ok(credentials.clone()),
            Self::DefaultChain(chain) => chain.resolve(http).await,
        }
    }
}
