use crate::cert::load_certificate_file;
use crate::cli::args::Cli;
use crate::utils::errors::{Result, RotatorError};
use std::fmt;

pub const DEFAULT_ENDPOINT: &str = "esa.cn-hangzhou.aliyuncs.com";
pub const DEFAULT_CERT_TYPE: &str = "upload";

/// Validated plugin inputs. Built once, read-only afterwards.
#[derive(Clone, PartialEq)]
pub struct PluginConfig {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub endpoint: String,
    pub cert_type: String,
    pub domain_name: String,
    pub site_id: i64,
    pub public_key: String,
    pub private_key: String,
}

impl PluginConfig {
    /// Validate the raw inputs and load both PEM files.
    ///
    /// Unreadable files only produce a warning and empty content.
    pub fn from_args(cli: &Cli) -> Result<Self> {
        if cli.domain_name.is_empty() {
            return Err(RotatorError::Config("ssl domain name is empty".to_string()));
        }

        let public_key = load_certificate_file(&cli.public_key, "public key");
        let private_key = load_certificate_file(&cli.private_key, "private key");

        let site_id = parse_site_id(&cli.site_id)?;

        Ok(Self {
            access_key_id: cli.access_key_id.clone(),
            access_key_secret: cli.access_key_secret.clone(),
            endpoint: or_default(&cli.endpoint, DEFAULT_ENDPOINT),
            cert_type: or_default(&cli.cert_type, DEFAULT_CERT_TYPE),
            domain_name: cli.domain_name.clone(),
            site_id,
            public_key,
            private_key,
        })
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

pub fn parse_site_id(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|e| RotatorError::Config(format!("parse site id: {e}")))
}

impl fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginConfig")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field("endpoint", &self.endpoint)
            .field("cert_type", &self.cert_type)
            .field("domain_name", &self.domain_name)
            .field("site_id", &self.site_id)
            .field("public_key", &format!("{} bytes", self.public_key.len()))
            .field("private_key", &format!("{} bytes", self.private_key.len()))
            .finish()
    }
}
